//! Chain parameters consumed by configuration resolution.
//!
//! # Data Flow
//! ```text
//! --testnet / --regtest / --simnet
//!     → params.rs (active NetworkProfile: ports, seeding, version bytes)
//!     → address.rs (decode --miningaddr / --getworkkey, check network)
//! ```
//!
//! Consensus rules, block validation and the wire protocol live in the
//! node engine, not here.

pub mod address;
pub mod params;

pub use address::{Address, AddressError, AddressKind};
pub use params::{NetworkProfile, MAX_BLOCK_PAYLOAD};
