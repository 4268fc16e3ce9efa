//! The node engine.
//!
//! # Data Flow
//! ```text
//! EffectiveConfig
//!     → storage.rs (open blocks_<dbtype>, exclusive lock)
//!     → net::listener (bind P2P listeners unless --nolisten)
//!     → peers.rs (inbound accept loops, outbound add/connect peers)
//!     → ready handle to the orchestrator
//!     → wait for stop
//!     → peers shut down → storage rolled back and closed
//! ```

pub mod backoff;
pub mod peers;
pub mod storage;

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinSet;

use crate::config::EffectiveConfig;
use crate::lifecycle::{Engine, EngineError, EngineHandle, Shutdown};
use crate::net::listener::PeerListener;

pub use storage::{BlockStore, StorageError};

/// Full node engine.
#[derive(Debug, Default)]
pub struct Node;

impl Node {
    pub fn new() -> Self {
        Self
    }
}

/// Stop control for a running [`Node`].
#[derive(Debug, Clone)]
pub struct NodeHandle {
    shutdown: Shutdown,
}

impl EngineHandle for NodeHandle {
    fn stop(&self) {
        tracing::info!("Node stop requested");
        self.shutdown.trigger();
    }
}

impl Engine for Node {
    type Handle = NodeHandle;

    async fn run(
        self,
        config: Arc<EffectiveConfig>,
        ready: oneshot::Sender<NodeHandle>,
    ) -> Result<(), EngineError> {
        let store = BlockStore::open(&config.data_dir, config.db_type)?;

        let shutdown = Shutdown::new();
        let mut stop = shutdown.subscribe();
        let mut tasks = JoinSet::new();

        if config.peers.disable_listen {
            tracing::info!("Listening for inbound peers is disabled");
        } else {
            for listen in &config.peers.listeners {
                match PeerListener::bind(listen, config.peers.max_peers).await {
                    Ok(listener) => {
                        tasks.spawn(peers::accept_loop(listener, shutdown.subscribe()));
                    }
                    Err(e) => {
                        tracing::error!(listen = %listen, error = %e, "Unable to start server");
                        shutdown.trigger();
                        while tasks.join_next().await.is_some() {}
                        store.rollback_close()?;
                        return Err(e.into());
                    }
                }
            }
        }

        let listening = tasks.len();
        let outbound = config
            .peers
            .connect_peers
            .iter()
            .chain(&config.peers.add_peers);
        for addr in outbound {
            tasks.spawn(peers::maintain_outbound(
                config.clone(),
                addr.clone(),
                shutdown.subscribe(),
            ));
        }

        tracing::info!(
            network = %config.network,
            data_dir = %config.data_dir.display(),
            db_type = %config.db_type,
            listeners = listening,
            outbound_peers = tasks.len() - listening,
            dns_seeding = config.dns_seeding(),
            rpc_enabled = !config.rpc.disabled,
            "Node started"
        );

        if ready.send(NodeHandle { shutdown: shutdown.clone() }).is_err() {
            tracing::warn!("Nobody is waiting for the node handle, stopping");
            shutdown.trigger();
        }

        let _ = stop.recv().await;

        shutdown.trigger();
        while tasks.join_next().await.is_some() {}
        tracing::info!("Server shutdown complete");

        tracing::info!("Gracefully shutting down the database...");
        store.rollback_close()?;
        tracing::info!("Shutdown complete");
        Ok(())
    }
}
