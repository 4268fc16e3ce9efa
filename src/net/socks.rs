//! Minimal SOCKS5 client (RFC 1928, RFC 1929) with Tor's RESOLVE extension.
//!
//! # Responsibilities
//! - CONNECT through a proxy, optionally with username/password auth
//! - Resolve hostnames through Tor (`RESOLVE`, command 0xF0) so DNS queries
//!   never leave the anonymity network
//!
//! Streams are plain `tokio` TCP streams; after a successful CONNECT the
//! returned stream carries the tunnelled connection.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;

use super::addr::split_host_port;
use super::error::{NetError, SocksError};

// ============================================================================
// Protocol constants
// ============================================================================

pub const SOCKS5_VERSION: u8 = 0x05;

pub const AUTH_METHOD_NONE: u8 = 0x00;
pub const AUTH_METHOD_PASSWORD: u8 = 0x02;
pub const AUTH_METHOD_NO_ACCEPTABLE: u8 = 0xFF;
pub const AUTH_PASSWORD_VERSION: u8 = 0x01;

pub const CMD_CONNECT: u8 = 0x01;
/// Tor extension: resolve a hostname, reply carries the address.
pub const CMD_TOR_RESOLVE: u8 = 0xF0;

pub const ATYP_IPV4: u8 = 0x01;
pub const ATYP_DOMAIN: u8 = 0x03;
pub const ATYP_IPV6: u8 = 0x04;

pub const REPLY_SUCCEEDED: u8 = 0x00;

/// Human-readable text for a reply code.
pub const fn reply_message(code: u8) -> &'static str {
    match code {
        0x00 => "succeeded",
        0x01 => "general SOCKS server failure",
        0x02 => "connection not allowed by ruleset",
        0x03 => "network unreachable",
        0x04 => "host unreachable",
        0x05 => "connection refused",
        0x06 => "TTL expired",
        0x07 => "command not supported",
        0x08 => "address type not supported",
        _ => "unknown error",
    }
}

// ============================================================================
// Proxy endpoint
// ============================================================================

/// A SOCKS5 proxy and the credentials to present to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    pub addr: String,
    pub username: String,
    pub password: String,
}

impl Proxy {
    pub fn new(
        addr: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            addr: addr.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    fn has_auth(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }

    /// Open a tunnelled TCP connection to `target` (`host:port`).
    pub async fn connect(&self, target: &str) -> Result<TcpStream, NetError> {
        let (host, port) = split_host_port(target)
            .ok_or_else(|| NetError::InvalidAddress(target.to_string()))?;
        let port: u16 = port
            .parse()
            .map_err(|_| NetError::InvalidAddress(target.to_string()))?;

        let mut stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| NetError::io(format!("connect to proxy {}", self.addr), e))?;

        self.handshake(&mut stream).await?;

        let request = build_request(CMD_CONNECT, host, port)?;
        write_all(&mut stream, &request, "write connect request").await?;
        read_reply(&mut stream).await?;

        trace!(proxy = %self.addr, target, "SOCKS5 tunnel established");
        Ok(stream)
    }

    /// Version/method negotiation, followed by RFC 1929 auth when requested.
    async fn handshake(&self, stream: &mut TcpStream) -> Result<(), NetError> {
        let methods: &[u8] = if self.has_auth() {
            &[SOCKS5_VERSION, 2, AUTH_METHOD_NONE, AUTH_METHOD_PASSWORD]
        } else {
            &[SOCKS5_VERSION, 1, AUTH_METHOD_NONE]
        };
        write_all(stream, methods, "write methods").await?;

        let mut response = [0u8; 2];
        read_exact(stream, &mut response, "read method response").await?;
        check_version(response[0])?;

        match response[1] {
            AUTH_METHOD_NONE => Ok(()),
            AUTH_METHOD_PASSWORD if self.has_auth() => self.authenticate(stream).await,
            AUTH_METHOD_NO_ACCEPTABLE => Err(SocksError::NoAcceptableMethod.into()),
            other => Err(SocksError::Protocol(format!("unsupported auth method: {other:#04x}")).into()),
        }
    }

    async fn authenticate(&self, stream: &mut TcpStream) -> Result<(), NetError> {
        if self.username.len() > 255 || self.password.len() > 255 {
            return Err(SocksError::Protocol("credentials too long (max 255)".into()).into());
        }

        // VER | ULEN | USERNAME | PLEN | PASSWORD
        let mut request = Vec::with_capacity(3 + self.username.len() + self.password.len());
        request.push(AUTH_PASSWORD_VERSION);
        request.push(self.username.len() as u8);
        request.extend_from_slice(self.username.as_bytes());
        request.push(self.password.len() as u8);
        request.extend_from_slice(self.password.as_bytes());
        write_all(stream, &request, "write auth request").await?;

        let mut response = [0u8; 2];
        read_exact(stream, &mut response, "read auth response").await?;
        if response[0] != AUTH_PASSWORD_VERSION {
            return Err(SocksError::Protocol(format!("invalid auth version: {:#04x}", response[0])).into());
        }
        if response[1] != 0x00 {
            return Err(SocksError::AuthFailed.into());
        }
        Ok(())
    }
}

/// Resolve `host` through the Tor SOCKS port at `proxy_addr`.
///
/// Tor's RESOLVE never carries credentials.
pub async fn tor_resolve(proxy_addr: &str, host: &str) -> Result<Vec<IpAddr>, NetError> {
    let mut stream = TcpStream::connect(proxy_addr)
        .await
        .map_err(|e| NetError::io(format!("connect to proxy {proxy_addr}"), e))?;

    Proxy::new(proxy_addr, "", "").handshake(&mut stream).await?;

    let request = build_request(CMD_TOR_RESOLVE, host, 0)?;
    write_all(&mut stream, &request, "write resolve request").await?;

    match read_reply(&mut stream).await? {
        BoundAddr::Ip(ip) => {
            trace!(host, %ip, "resolved through tor");
            Ok(vec![ip])
        }
        BoundAddr::Domain => Err(SocksError::InvalidAddressType(ATYP_DOMAIN).into()),
    }
}

// ============================================================================
// Wire helpers
// ============================================================================

enum BoundAddr {
    Ip(IpAddr),
    Domain,
}

/// VER | CMD | RSV | ATYP | DST.ADDR | DST.PORT
fn build_request(cmd: u8, host: &str, port: u16) -> Result<Vec<u8>, NetError> {
    let mut request = Vec::with_capacity(7 + host.len());
    request.extend_from_slice(&[SOCKS5_VERSION, cmd, 0x00]);

    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            request.push(ATYP_IPV4);
            request.extend_from_slice(&v4.octets());
        }
        Ok(IpAddr::V6(v6)) => {
            request.push(ATYP_IPV6);
            request.extend_from_slice(&v6.octets());
        }
        Err(_) => {
            if host.is_empty() || host.len() > 255 {
                return Err(NetError::InvalidAddress(host.to_string()));
            }
            request.push(ATYP_DOMAIN);
            request.push(host.len() as u8);
            request.extend_from_slice(host.as_bytes());
        }
    }

    request.extend_from_slice(&port.to_be_bytes());
    Ok(request)
}

async fn read_reply(stream: &mut TcpStream) -> Result<BoundAddr, NetError> {
    // VER | REP | RSV | ATYP
    let mut header = [0u8; 4];
    read_exact(stream, &mut header, "read reply header").await?;
    check_version(header[0])?;

    if header[1] != REPLY_SUCCEEDED {
        return Err(SocksError::ServerReply {
            code: header[1],
            message: reply_message(header[1]),
        }
        .into());
    }

    let bound = match header[3] {
        ATYP_IPV4 => {
            let mut octets = [0u8; 4];
            read_exact(stream, &mut octets, "read IPv4 address").await?;
            BoundAddr::Ip(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        ATYP_IPV6 => {
            let mut octets = [0u8; 16];
            read_exact(stream, &mut octets, "read IPv6 address").await?;
            BoundAddr::Ip(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        ATYP_DOMAIN => {
            let mut len = [0u8; 1];
            read_exact(stream, &mut len, "read domain length").await?;
            let mut domain = vec![0u8; len[0] as usize];
            read_exact(stream, &mut domain, "read domain").await?;
            BoundAddr::Domain
        }
        other => return Err(SocksError::InvalidAddressType(other).into()),
    };

    let mut port = [0u8; 2];
    read_exact(stream, &mut port, "read bound port").await?;
    Ok(bound)
}

fn check_version(actual: u8) -> Result<(), NetError> {
    if actual != SOCKS5_VERSION {
        return Err(SocksError::InvalidVersion {
            expected: SOCKS5_VERSION,
            actual,
        }
        .into());
    }
    Ok(())
}

async fn write_all(stream: &mut TcpStream, buf: &[u8], context: &str) -> Result<(), NetError> {
    stream.write_all(buf).await.map_err(|e| NetError::io(context, e))
}

async fn read_exact(stream: &mut TcpStream, buf: &mut [u8], context: &str) -> Result<(), NetError> {
    stream
        .read_exact(buf)
        .await
        .map(|_| ())
        .map_err(|e| NetError::io(context, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_message() {
        assert_eq!(reply_message(REPLY_SUCCEEDED), "succeeded");
        assert_eq!(reply_message(0x04), "host unreachable");
        assert_eq!(reply_message(0x99), "unknown error");
    }

    #[test]
    fn test_build_request_domain() {
        let req = build_request(CMD_CONNECT, "example.onion", 8334).unwrap();
        assert_eq!(&req[..5], &[SOCKS5_VERSION, CMD_CONNECT, 0x00, ATYP_DOMAIN, 13]);
        assert_eq!(&req[5..18], b"example.onion");
        assert_eq!(&req[18..], &8334u16.to_be_bytes());
    }

    #[test]
    fn test_build_request_ip() {
        let req = build_request(CMD_CONNECT, "10.1.2.3", 80).unwrap();
        assert_eq!(req, vec![5, 1, 0, ATYP_IPV4, 10, 1, 2, 3, 0, 80]);

        let req = build_request(CMD_TOR_RESOLVE, "::1", 0).unwrap();
        assert_eq!(req[3], ATYP_IPV6);
        assert_eq!(req.len(), 4 + 16 + 2);
    }

    #[test]
    fn test_build_request_rejects_long_domain() {
        let host = "a".repeat(256);
        assert!(matches!(
            build_request(CMD_CONNECT, &host, 1),
            Err(NetError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_rejects_portless_target() {
        let proxy = Proxy::new("127.0.0.1:1", "", "");
        let err = proxy.connect("no-port.example").await.unwrap_err();
        assert!(matches!(err, NetError::InvalidAddress(_)));
    }
}
