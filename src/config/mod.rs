//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! Defaults (paths.rs, from the home directory)
//!     → config file (loader.rs, TOML, optional)
//!     → command line (schema.rs OptionLayer via clap)
//!     → validation.rs (ordered checks, implied settings)
//!     → EffectiveConfig (immutable)
//!     → shared via Arc with the engine
//! ```
//!
//! Precedence is defaults < config file < command line. `resolver.rs`
//! drives the whole pipeline.

pub mod error;
pub mod loader;
pub mod paths;
pub mod resolver;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigWarning};
pub use paths::Defaults;
pub use resolver::{ConfigResolver, EarlyExit, Resolution, Resolved};
pub use schema::{DbType, EffectiveConfig, MiningConfig, OptionLayer, PeerConfig, RpcConfig};

/// Hint printed after every configuration error.
pub const USAGE_HINT: &str = "Use nmcd -h to show usage";
