//! Configuration errors and warnings.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::chain::{AddressError, NetworkProfile};

/// Fatal configuration failure. Every variant ends the process non-zero.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command line rejected by the strict parse (unknown flag, bad value).
    #[error("{0}")]
    Usage(String),

    #[error("failed to create home directory {}: {source}", path.display())]
    HomeDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("the testnet, regtest, and simnet params can't be used together -- choose one of the three")]
    MultipleNetworks,

    #[error("invalid debug level {level:?}: {reason}")]
    InvalidDebugLevel { level: String, reason: String },

    #[error("the specified database type [{db_type}] is invalid -- supported types {supported:?}")]
    InvalidDbType {
        db_type: String,
        supported: &'static [&'static str],
    },

    #[error("the profile port must be between 1024 and 65535")]
    InvalidProfilePort,

    #[error("the banduration option may not be less than 1s -- parsed [{0:?}]")]
    BanDurationTooShort(Duration),

    #[error("the --addpeer and --connect options can not be mixed")]
    ConflictingPeerOptions,

    #[error("unable to resolve localhost for the default RPC listeners: {0}")]
    LocalhostLookup(#[source] std::io::Error),

    #[error("the blockmaxsize option must be in between {min} and {max} -- parsed [{size}]")]
    BlockMaxSizeOutOfRange { size: u32, min: u32, max: u32 },

    #[error("{option} '{addr}' failed to decode: {source}")]
    AddressDecode {
        option: &'static str,
        addr: String,
        #[source]
        source: AddressError,
    },

    #[error("{option} '{addr}' is on the wrong network (active network is {network})")]
    WrongNetwork {
        option: &'static str,
        addr: String,
        network: NetworkProfile,
    },

    #[error("the generate flag is set, but there are no mining addresses specified")]
    NoMiningAddresses,
}

/// Non-fatal condition noticed during resolution, reported once the
/// effective configuration is known to be good.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("config file {} not found, continuing with defaults and command line", .0.display())]
    MissingConfigFile(PathBuf),
}
