//! Network plumbing used by configuration and the node engine.
//!
//! # Data Flow
//! ```text
//! Raw address lists (listen, addpeer, connect, rpclisten)
//!     → addr.rs (default port, de-duplication)
//!
//! Proxy options (proxy, onion, noonion)
//!     → dial.rs (clear + onion DialStrategy / LookupStrategy)
//!     → socks.rs (SOCKS5 CONNECT, Tor RESOLVE)
//!
//! Inbound peers
//!     → listener.rs (bind, accept, maxpeers limit)
//! ```

pub mod addr;
pub mod dial;
pub mod error;
pub mod listener;
pub mod socks;

pub use addr::{join_host_port, normalize_addresses, split_host_port};
pub use dial::{DialStrategy, LookupStrategy, NetStrategies, ProxySettings};
pub use error::{NetError, SocksError};
pub use socks::Proxy;
