//! Console host for the daemon.

use super::engine::ServiceManager;
use super::error::ServiceError;
use super::signals;

/// Runs the daemon as an ordinary foreground process.
///
/// There are no privileges to drop, and a stop is requested by SIGINT or
/// SIGTERM.
#[derive(Debug, Default)]
pub struct ProcessManager {
    started: bool,
}

impl ProcessManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl ServiceManager for ProcessManager {
    fn drop_privileges(&mut self) -> Result<(), ServiceError> {
        tracing::debug!("Running as console process, keeping current privileges");
        Ok(())
    }

    fn set_started(&mut self) {
        self.started = true;
        tracing::info!(pid = std::process::id(), "nmcd started");
    }

    async fn stop_requested(&mut self) {
        signals::stop_signal().await;
    }
}
