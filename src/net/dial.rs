//! Outbound connection and name-resolution strategies.
//!
//! The engine never sees proxy settings directly. It holds a clear pair
//! (for ordinary peers) and an onion pair (for `.onion` peers) and calls
//! `dial` / `lookup` on whichever applies.
//!
//! # Provisioning
//! ```text
//! no --proxy            → clear: Direct / System
//! --proxy               → clear: Proxied / Tor        (System with --noonion)
//! --onion               → onion: Proxied / Tor via the onion proxy
//! otherwise             → onion: same as clear
//! --noonion             → onion: Disabled / Disabled  (always errors)
//! ```

use std::net::IpAddr;

use tokio::net::TcpStream;

use super::error::NetError;
use super::socks::{self, Proxy};

/// How to open an outbound TCP connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialStrategy {
    /// Plain TCP connect.
    Direct,
    /// CONNECT through a SOCKS5 proxy.
    Proxied(Proxy),
    /// Always fails with [`NetError::TorDisabled`].
    Disabled,
}

impl DialStrategy {
    /// Connect to `addr` (`host:port`).
    pub async fn dial(&self, addr: &str) -> Result<TcpStream, NetError> {
        match self {
            Self::Direct => TcpStream::connect(addr)
                .await
                .map_err(|e| NetError::io(format!("dial {addr}"), e)),
            Self::Proxied(proxy) => proxy.connect(addr).await,
            Self::Disabled => Err(NetError::TorDisabled),
        }
    }
}

/// How to turn a hostname into IP addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStrategy {
    /// The operating system resolver.
    System,
    /// Tor's RESOLVE extension through the SOCKS5 proxy at this address.
    Tor(String),
    /// Always fails with [`NetError::TorDisabled`].
    Disabled,
}

impl LookupStrategy {
    /// Resolve `host` to one or more IP addresses.
    pub async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, NetError> {
        match self {
            Self::System => {
                let addrs = tokio::net::lookup_host((host, 0))
                    .await
                    .map_err(|e| NetError::io(format!("lookup {host}"), e))?;
                let ips: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
                if ips.is_empty() {
                    return Err(NetError::NoAddresses(host.to_string()));
                }
                Ok(ips)
            }
            Self::Tor(proxy_addr) => socks::tor_resolve(proxy_addr, host).await,
            Self::Disabled => Err(NetError::TorDisabled),
        }
    }
}

/// Proxy-related options, as resolved from defaults, file and CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    pub proxy: String,
    pub proxy_user: String,
    pub proxy_pass: String,
    pub onion_proxy: String,
    pub onion_proxy_user: String,
    pub onion_proxy_pass: String,
    pub no_onion: bool,
}

/// The four bound strategies handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetStrategies {
    pub dial: DialStrategy,
    pub lookup: LookupStrategy,
    pub onion_dial: DialStrategy,
    pub onion_lookup: LookupStrategy,
}

impl NetStrategies {
    /// Derive the clear and onion strategy pairs from proxy settings.
    pub fn provision(settings: &ProxySettings) -> Self {
        let mut dial = DialStrategy::Direct;
        let mut lookup = LookupStrategy::System;
        if !settings.proxy.is_empty() {
            dial = DialStrategy::Proxied(Proxy::new(
                &settings.proxy,
                &settings.proxy_user,
                &settings.proxy_pass,
            ));
            if !settings.no_onion {
                lookup = LookupStrategy::Tor(settings.proxy.clone());
            }
        }

        let (onion_dial, onion_lookup) = if settings.no_onion {
            (DialStrategy::Disabled, LookupStrategy::Disabled)
        } else if !settings.onion_proxy.is_empty() {
            (
                DialStrategy::Proxied(Proxy::new(
                    &settings.onion_proxy,
                    &settings.onion_proxy_user,
                    &settings.onion_proxy_pass,
                )),
                LookupStrategy::Tor(settings.onion_proxy.clone()),
            )
        } else {
            (dial.clone(), lookup.clone())
        };

        Self {
            dial,
            lookup,
            onion_dial,
            onion_lookup,
        }
    }

    /// Dial strategy appropriate for `host`.
    pub fn dial_for(&self, host: &str) -> &DialStrategy {
        if is_onion_host(host) {
            &self.onion_dial
        } else {
            &self.dial
        }
    }

    /// Lookup strategy appropriate for `host`.
    pub fn lookup_for(&self, host: &str) -> &LookupStrategy {
        if is_onion_host(host) {
            &self.onion_lookup
        } else {
            &self.lookup
        }
    }
}

impl Default for NetStrategies {
    fn default() -> Self {
        Self::provision(&ProxySettings::default())
    }
}

/// Whether `host` is a Tor hidden-service name.
pub fn is_onion_host(host: &str) -> bool {
    host.trim_end_matches('.').to_ascii_lowercase().ends_with(".onion")
}
