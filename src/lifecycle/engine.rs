//! Boundaries the orchestrator consumes: the engine it runs and the
//! service manager hosting the process.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::config::EffectiveConfig;

use super::error::{EngineError, ServiceError};

/// Stop control for a running engine.
pub trait EngineHandle: Send + Sync + 'static {
    /// Ask the engine to stop. Returns immediately; completion is observed
    /// through the future returned by [`Engine::run`].
    fn stop(&self);
}

/// A daemon engine driven from start to completion.
pub trait Engine: Send + 'static {
    type Handle: EngineHandle;

    /// Run until stopped or failed.
    ///
    /// Once startup is done the engine sends its handle through `ready`.
    /// Finishing without sending it is a premature exit. Storage opened
    /// here must be closed before the future resolves.
    fn run(
        self,
        config: Arc<EffectiveConfig>,
        ready: oneshot::Sender<Self::Handle>,
    ) -> impl Future<Output = Result<(), EngineError>> + Send + 'static;
}

/// The process host: a service control manager or a plain console.
pub trait ServiceManager: Send {
    /// Give up elevated privileges after the engine has bound its sockets.
    fn drop_privileges(&mut self) -> Result<(), ServiceError>;

    /// Report that startup is complete.
    fn set_started(&mut self);

    /// Resolves when the host asks the daemon to stop.
    fn stop_requested(&mut self) -> impl Future<Output = ()> + Send;
}
