//! Errors for outbound dialing and name resolution.

use thiserror::Error;

/// Failure of a dial or lookup strategy.
#[derive(Debug, Error)]
pub enum NetError {
    /// Onion routing was switched off with `--noonion`.
    #[error("tor has been disabled")]
    TorDisabled,

    /// Target is not a usable `host:port` string.
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    /// Plain socket or resolver failure.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Proxy answered with something we could not use.
    #[error("SOCKS5 error: {0}")]
    Socks(#[from] SocksError),

    /// Resolver returned nothing for the host.
    #[error("no addresses found for {0}")]
    NoAddresses(String),
}

impl NetError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// SOCKS5 protocol failures (RFC 1928, RFC 1929 and the Tor extensions).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocksError {
    #[error("invalid SOCKS version: expected {expected}, got {actual}")]
    InvalidVersion { expected: u8, actual: u8 },

    #[error("no acceptable authentication method")]
    NoAcceptableMethod,

    #[error("authentication failed")]
    AuthFailed,

    #[error("server error (code {code:#04x}): {message}")]
    ServerReply { code: u8, message: &'static str },

    #[error("invalid address type: {0:#04x}")]
    InvalidAddressType(u8),

    #[error("protocol error: {0}")]
    Protocol(String),
}
