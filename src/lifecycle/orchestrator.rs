//! Startup and shutdown orchestration.
//!
//! ```text
//! Starting ──ready──▶ Running ──manager stop──▶ StoppingByManager ──▶ Stopped
//!    │                   └────engine finished──▶ StoppingSpontaneously ──▶ Stopped
//!    └──engine finished before ready───────────────────────────────────▶ Stopped
//! ```
//!
//! Every path produces exactly one [`Outcome`]. When the manager's stop
//! request and the engine's own completion are both ready, completion
//! wins, so the engine is never asked to stop after it has finished.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinError;

use crate::config::EffectiveConfig;

use super::engine::{Engine, EngineHandle, ServiceManager};
use super::error::{EngineError, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Starting,
    Running,
    StoppingByManager,
    StoppingSpontaneously,
    Stopped,
}

/// Which path led to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// The engine finished before reporting ready.
    PrematureExit,
    /// Dropping privileges failed; the engine was stopped.
    PrivilegeDrop,
    /// The manager asked us to stop.
    ManagerStop,
    /// The engine finished on its own while running.
    Spontaneous,
}

/// The single terminal result of a run.
#[derive(Debug)]
pub struct Outcome {
    pub cause: StopCause,
    pub result: Result<(), ServiceError>,
}

impl Outcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self.result {
            Ok(()) => 0,
            Err(_) => 1,
        }
    }
}

/// Drives an [`Engine`] under a [`ServiceManager`].
pub struct ServiceOrchestrator<M> {
    manager: M,
    state: ServiceState,
}

impl<M: ServiceManager> ServiceOrchestrator<M> {
    pub fn new(manager: M) -> Self {
        Self {
            manager,
            state: ServiceState::Starting,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// Start `engine`, wait for it to become ready, then run until the
    /// manager asks for a stop or the engine finishes.
    pub async fn run<E: Engine>(&mut self, engine: E, config: Arc<EffectiveConfig>) -> Outcome {
        self.transition(ServiceState::Starting);

        let (ready_tx, ready_rx) = oneshot::channel();
        let mut task = tokio::spawn(engine.run(config, ready_tx));

        let handle = tokio::select! {
            biased;

            ready = ready_rx => match ready {
                Ok(handle) => handle,
                // Sender dropped without a handle: the engine is finishing.
                Err(_) => {
                    let result = task.await;
                    return self.finish(StopCause::PrematureExit, completion(result, ServiceError::Start));
                }
            },
            result = &mut task => {
                return self.finish(StopCause::PrematureExit, completion(result, ServiceError::Start));
            }
        };

        self.transition(ServiceState::Running);

        if let Err(e) = self.manager.drop_privileges() {
            tracing::error!(error = %e, "Privilege drop failed, stopping engine");
            self.transition(ServiceState::StoppingByManager);
            handle.stop();
            if let Err(join_err) = task.await {
                tracing::error!(error = %join_err, "Engine task failed during stop");
            }
            return self.finish(StopCause::PrivilegeDrop, Err(e));
        }
        self.manager.set_started();

        tokio::select! {
            biased;

            result = &mut task => {
                self.transition(ServiceState::StoppingSpontaneously);
                self.finish(StopCause::Spontaneous, completion(result, ServiceError::Runtime))
            }
            _ = self.manager.stop_requested() => {
                self.transition(ServiceState::StoppingByManager);
                handle.stop();
                let result = task.await;
                self.finish(StopCause::ManagerStop, completion(result, ServiceError::Runtime))
            }
        }
    }

    fn transition(&mut self, to: ServiceState) {
        tracing::debug!(from = ?self.state, to = ?to, "Service state transition");
        self.state = to;
    }

    fn finish(&mut self, cause: StopCause, result: Result<(), ServiceError>) -> Outcome {
        self.transition(ServiceState::Stopped);
        match &result {
            Ok(()) => tracing::info!(?cause, "Service stopped"),
            Err(e) => tracing::error!(?cause, error = %e, "Service stopped with error"),
        }
        Outcome { cause, result }
    }
}

/// Map an engine task's join result, wrapping engine errors with `wrap`.
fn completion(
    joined: Result<Result<(), EngineError>, JoinError>,
    wrap: fn(EngineError) -> ServiceError,
) -> Result<(), ServiceError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(wrap(e)),
        Err(e) => Err(ServiceError::Panicked(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code() {
        let ok = Outcome {
            cause: StopCause::ManagerStop,
            result: Ok(()),
        };
        assert_eq!(ok.exit_code(), 0);

        let failed = Outcome {
            cause: StopCause::Spontaneous,
            result: Err(ServiceError::Runtime("boom".into())),
        };
        assert_eq!(failed.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_completion_maps_panics() {
        let joined = tokio::spawn(async {
            panic!("engine exploded");
            #[allow(unreachable_code)]
            Ok::<(), EngineError>(())
        })
        .await;

        let mapped = completion(joined, ServiceError::Runtime);
        assert!(matches!(mapped, Err(ServiceError::Panicked(_))));
    }

    #[test]
    fn test_completion_wraps_engine_error() {
        let mapped = completion(Ok(Err("locked".into())), ServiceError::Start);
        match mapped {
            Err(ServiceError::Start(e)) => assert_eq!(e.to_string(), "locked"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
