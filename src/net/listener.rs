//! Inbound peer listener with backpressure.
//!
//! # Responsibilities
//! - Bind to a normalized `host:port` listen address
//! - Accept incoming TCP connections
//! - Enforce the `maxpeers` limit via semaphore

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use super::addr::{join_host_port, split_host_port};

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(String, std::io::Error),
    /// Failed to accept connection.
    Accept(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(addr, e) => write!(f, "Failed to bind {}: {}", addr, e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Turn a listen address into something the OS can bind.
///
/// An empty host (`":8334"`) means every IPv4 interface.
pub fn bind_address(listen: &str) -> String {
    match split_host_port(listen) {
        Some(("", port)) => join_host_port("0.0.0.0", port),
        _ => listen.to_string(),
    }
}

/// A bounded TCP listener for inbound peers.
///
/// When `max_peers` connections are held, accepting waits until a
/// [`PeerPermit`] is dropped.
pub struct PeerListener {
    inner: TcpListener,
    peer_limit: Arc<Semaphore>,
}

impl PeerListener {
    /// Bind to `listen` with room for `max_peers` inbound connections.
    pub async fn bind(listen: &str, max_peers: usize) -> Result<Self, ListenerError> {
        let addr = bind_address(listen);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ListenerError::Bind(addr.clone(), e))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| ListenerError::Bind(addr.clone(), e))?;

        tracing::info!(
            address = %local_addr,
            max_peers,
            "Peer listener bound"
        );

        Ok(Self {
            inner: listener,
            peer_limit: Arc::new(Semaphore::new(max_peers)),
        })
    }

    /// Accept a new connection, respecting the peer limit.
    ///
    /// The returned permit must be held for the connection's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, PeerPermit), ListenerError> {
        // The semaphore is never closed, so acquire only fails on a bug.
        let permit = self
            .peer_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ListenerError::Accept(std::io::Error::other(e)))?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_slots = self.peer_limit.available_permits(),
            "Inbound peer accepted"
        );

        Ok((stream, addr, PeerPermit { _permit: permit }))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Get current available peer slots.
    pub fn available_slots(&self) -> usize {
        self.peer_limit.available_permits()
    }
}

/// A held inbound peer slot, released on drop.
#[derive(Debug)]
pub struct PeerPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
