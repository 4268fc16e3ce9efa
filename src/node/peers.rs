//! Peer connection tasks.
//!
//! # Responsibilities
//! - Accept inbound peers on each listener, within `maxpeers`
//! - Keep configured outbound peers connected, reconnecting with backoff
//! - Hold connections open until the peer leaves or shutdown fires

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time;

use crate::config::EffectiveConfig;
use crate::net::listener::PeerListener;
use crate::net::split_host_port;

use super::backoff::{reconnect_delay, RETRY_BASE, RETRY_MAX};

/// Accept inbound peers until shutdown, then drop every inbound
/// connection.
pub async fn accept_loop(listener: PeerListener, mut shutdown: broadcast::Receiver<()>) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr, permit)) => {
                    tracing::info!(peer = %addr, "Inbound peer connected");
                    connections.spawn(async move {
                        drain(stream).await;
                        tracing::info!(peer = %addr, "Inbound peer disconnected");
                        drop(permit);
                    });
                }
                Err(e) => tracing::warn!(error = %e, "Inbound accept failed"),
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = shutdown.recv() => {
                tracing::debug!(
                    open = connections.len(),
                    "Peer listener received shutdown signal, exiting loop"
                );
                break;
            }
        }
    }
    connections.shutdown().await;
}

/// Keep one configured outbound peer connected until shutdown.
///
/// The dial strategy is chosen per host, so `.onion` peers go through the
/// onion proxy (or fail with `tor has been disabled`).
pub async fn maintain_outbound(
    config: Arc<EffectiveConfig>,
    addr: String,
    mut shutdown: broadcast::Receiver<()>,
) {
    let host = split_host_port(&addr).map(|(h, _)| h).unwrap_or(addr.as_str()).to_string();
    let mut attempt = 0u32;

    loop {
        let delay = reconnect_delay(attempt, RETRY_BASE, RETRY_MAX);
        tokio::select! {
            _ = time::sleep(delay) => {}
            _ = shutdown.recv() => return,
        }

        let dialed = tokio::select! {
            dialed = config.dial_for(&host).dial(&addr) => dialed,
            _ = shutdown.recv() => return,
        };

        match dialed {
            Ok(stream) => {
                tracing::info!(peer = %addr, "Outbound peer connected");
                attempt = 0;
                if hold_connection(stream, &mut shutdown).await {
                    return;
                }
                tracing::info!(peer = %addr, "Outbound peer disconnected");
            }
            Err(e) => {
                attempt = attempt.saturating_add(1);
                tracing::warn!(peer = %addr, attempt, error = %e, "Failed to connect to peer");
            }
        }
        attempt = attempt.max(1);
    }
}

/// Read and discard until the peer closes the connection.
async fn drain(mut stream: TcpStream) {
    let mut buf = [0u8; 4096];
    while let Ok(n) = stream.read(&mut buf).await {
        if n == 0 {
            break;
        }
    }
}

/// Drain the stream until EOF or shutdown. Returns true on shutdown.
async fn hold_connection(stream: TcpStream, shutdown: &mut broadcast::Receiver<()>) -> bool {
    tokio::select! {
        _ = drain(stream) => false,
        _ = shutdown.recv() => true,
    }
}
