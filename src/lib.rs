//! nmcd: Namecoin full node daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv ─┐
//!         ├─▶ config ──▶ EffectiveConfig ──▶ lifecycle ──▶ node
//!   file ─┘   (resolver)   (Arc, read-only)   (orchestrator)  (engine)
//!                 │                                 │            │
//!                 ├── chain (profiles, addresses)   │            ├── storage
//!                 └── net (normalize, dial/lookup) ◀┼────────────┘
//!                                                   └── signals / service manager
//! ```

// Core subsystems
pub mod chain;
pub mod config;
pub mod net;
pub mod node;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{ConfigResolver, Defaults, EffectiveConfig};
pub use lifecycle::{ProcessManager, ServiceOrchestrator};
pub use node::Node;

/// Daemon version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
