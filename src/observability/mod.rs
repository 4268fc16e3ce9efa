//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit tracing events with structured fields
//!     → logging.rs (EnvFilter from RUST_LOG or --debuglevel)
//!     → stderr
//! ```

pub mod logging;
