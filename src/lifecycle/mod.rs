//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (orchestrator.rs):
//!     Spawn engine → wait for ready handle or premature exit
//!     → drop privileges → mark started
//!
//! Running (orchestrator.rs):
//!     race: manager stop request (service.rs, signals.rs)
//!           vs engine finishing on its own
//!
//! Shutdown (shutdown.rs):
//!     engine stop → broadcast to engine tasks → engine closes storage
//!     → completion result becomes the process outcome
//! ```

pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod service;
pub mod shutdown;
pub mod signals;

pub use engine::{Engine, EngineHandle, ServiceManager};
pub use error::{EngineError, ServiceError};
pub use orchestrator::{Outcome, ServiceOrchestrator, ServiceState, StopCause};
pub use service::ProcessManager;
pub use shutdown::Shutdown;
