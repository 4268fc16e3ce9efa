use thiserror::Error;

/// Error produced by an engine's run-to-completion.
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Terminal failures of the service lifecycle.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The engine finished before reporting ready.
    #[error("engine failed to start: {0}")]
    Start(#[source] EngineError),

    /// The engine finished with an error after reporting ready.
    #[error("engine stopped with error: {0}")]
    Runtime(#[source] EngineError),

    #[error("failed to drop privileges: {0}")]
    Privileges(#[source] std::io::Error),

    #[error("engine task panicked: {0}")]
    Panicked(String),
}
