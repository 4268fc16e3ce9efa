//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Notify};

use nmcd::chain::{Address, NetworkProfile};
use nmcd::config::{ConfigResolver, Defaults, EffectiveConfig, Resolution, Resolved};
use nmcd::lifecycle::{Engine, EngineError, EngineHandle, ServiceError, ServiceManager};

// ============================================================================
// Configuration helpers
// ============================================================================

/// A resolver whose home directory lives in a fresh temp dir.
pub fn temp_resolver() -> (tempfile::TempDir, ConfigResolver) {
    let dir = tempfile::tempdir().unwrap();
    let resolver = ConfigResolver::new(Defaults::from_home(dir.path().join("home")));
    (dir, resolver)
}

/// Write `content` to `name` inside `dir` and return the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Resolve `args` (without the program name) and expect a runnable config.
pub fn resolve_ok(resolver: &ConfigResolver, args: &[&str]) -> Resolved {
    let argv = std::iter::once("nmcd").chain(args.iter().copied());
    match resolver.resolve(argv) {
        Ok(Resolution::Run(resolved)) => resolved,
        Ok(Resolution::Exit(exit)) => panic!("unexpected early exit: {exit:?}"),
        Err(e) => panic!("resolution failed: {e}"),
    }
}

/// Resolve `args` and expect an error.
pub fn resolve_err(resolver: &ConfigResolver, args: &[&str]) -> nmcd::config::ConfigError {
    let argv = std::iter::once("nmcd").chain(args.iter().copied());
    match resolver.resolve(argv) {
        Ok(other) => panic!("expected an error, got {other:?}"),
        Err(e) => e,
    }
}

/// A simnet configuration rooted in a temp dir, with listening off.
pub fn simnet_config(extra: &[&str]) -> (tempfile::TempDir, Arc<EffectiveConfig>) {
    let (dir, resolver) = temp_resolver();
    let mut args = vec!["--simnet", "--nolisten", "--dbtype", "memdb"];
    args.extend_from_slice(extra);
    let resolved = resolve_ok(&resolver, &args);
    (dir, Arc::new(resolved.config))
}

/// An encoded pay-to-pubkey-hash address for `net`.
pub fn address_for(net: NetworkProfile, seed: u8) -> String {
    Address::pubkey_hash([seed; 20], net).encode()
}

// ============================================================================
// Mock SOCKS5 / Tor server
// ============================================================================

/// One request the mock proxy received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocksRequest {
    pub cmd: u8,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
}

pub struct MockSocksServer {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<SocksRequest>>>,
}

impl MockSocksServer {
    pub fn requests(&self) -> Vec<SocksRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a SOCKS5 server on an ephemeral port.
///
/// With `credentials`, only username/password auth is offered and checked.
/// CONNECT succeeds and then echoes everything back. RESOLVE (0xF0) answers
/// from `names`, or replies "host unreachable".
pub async fn start_mock_socks(
    credentials: Option<(&'static str, &'static str)>,
    names: HashMap<String, IpAddr>,
) -> MockSocksServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let names = Arc::new(names);

    let recorded = requests.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let recorded = recorded.clone();
            let names = names.clone();
            tokio::spawn(async move {
                let _ = serve_socks(socket, credentials, &names, &recorded).await;
            });
        }
    });

    MockSocksServer { addr, requests }
}

async fn serve_socks(
    mut socket: TcpStream,
    credentials: Option<(&'static str, &'static str)>,
    names: &HashMap<String, IpAddr>,
    recorded: &Mutex<Vec<SocksRequest>>,
) -> std::io::Result<()> {
    let mut head = [0u8; 2];
    socket.read_exact(&mut head).await?;
    let mut methods = vec![0u8; head[1] as usize];
    socket.read_exact(&mut methods).await?;

    let mut username = None;
    match credentials {
        None => socket.write_all(&[0x05, 0x00]).await?,
        Some((user, pass)) => {
            if !methods.contains(&0x02) {
                socket.write_all(&[0x05, 0xFF]).await?;
                return Ok(());
            }
            socket.write_all(&[0x05, 0x02]).await?;

            let mut ver_len = [0u8; 2];
            socket.read_exact(&mut ver_len).await?;
            let mut u = vec![0u8; ver_len[1] as usize];
            socket.read_exact(&mut u).await?;
            let mut plen = [0u8; 1];
            socket.read_exact(&mut plen).await?;
            let mut p = vec![0u8; plen[0] as usize];
            socket.read_exact(&mut p).await?;

            let ok = u == user.as_bytes() && p == pass.as_bytes();
            socket.write_all(&[0x01, if ok { 0x00 } else { 0x01 }]).await?;
            if !ok {
                return Ok(());
            }
            username = Some(String::from_utf8_lossy(&u).into_owned());
        }
    }

    let mut req = [0u8; 4];
    socket.read_exact(&mut req).await?;
    let host = match req[3] {
        0x01 => {
            let mut o = [0u8; 4];
            socket.read_exact(&mut o).await?;
            IpAddr::from(o).to_string()
        }
        0x04 => {
            let mut o = [0u8; 16];
            socket.read_exact(&mut o).await?;
            IpAddr::from(o).to_string()
        }
        _ => {
            let mut len = [0u8; 1];
            socket.read_exact(&mut len).await?;
            let mut name = vec![0u8; len[0] as usize];
            socket.read_exact(&mut name).await?;
            String::from_utf8_lossy(&name).into_owned()
        }
    };
    let mut port = [0u8; 2];
    socket.read_exact(&mut port).await?;

    recorded.lock().unwrap().push(SocksRequest {
        cmd: req[1],
        host: host.clone(),
        port: u16::from_be_bytes(port),
        username,
    });

    match req[1] {
        0x01 => {
            socket
                .write_all(&[0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0])
                .await?;
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await?;
                if n == 0 {
                    return Ok(());
                }
                socket.write_all(&buf[..n]).await?;
            }
        }
        0xF0 => match names.get(&host) {
            Some(IpAddr::V4(v4)) => {
                let mut reply = vec![0x05, 0x00, 0x00, 0x01];
                reply.extend_from_slice(&v4.octets());
                reply.extend_from_slice(&[0, 0]);
                socket.write_all(&reply).await
            }
            Some(IpAddr::V6(v6)) => {
                let mut reply = vec![0x05, 0x00, 0x00, 0x04];
                reply.extend_from_slice(&v6.octets());
                reply.extend_from_slice(&[0, 0]);
                socket.write_all(&reply).await
            }
            None => {
                socket
                    .write_all(&[0x05, 0x04, 0x00, 0x01, 0, 0, 0, 0, 0, 0])
                    .await
            }
        },
        _ => {
            socket
                .write_all(&[0x05, 0x07, 0x00, 0x01, 0, 0, 0, 0, 0, 0])
                .await
        }
    }
}

// ============================================================================
// Mock engine
// ============================================================================

#[derive(Debug, Clone)]
pub enum Behavior {
    /// Fail before reporting ready.
    FailStart(&'static str),
    /// Finish cleanly without ever reporting ready.
    ExitWithoutReady,
    /// Report ready, then finish at once with this error (or cleanly).
    ExitAfterReady(Option<&'static str>),
    /// Report ready, then wait for stop and finish with this error (or cleanly).
    RunUntilStopped(Option<&'static str>),
}

pub struct MockEngine {
    pub behavior: Behavior,
    pub stops: Arc<AtomicUsize>,
}

impl MockEngine {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            stops: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn stop_counter(&self) -> Arc<AtomicUsize> {
        self.stops.clone()
    }
}

pub struct MockHandle {
    stopped: Arc<Notify>,
    stops: Arc<AtomicUsize>,
}

impl EngineHandle for MockHandle {
    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.stopped.notify_one();
    }
}

fn finish(result: Option<&'static str>) -> Result<(), EngineError> {
    match result {
        Some(msg) => Err(msg.into()),
        None => Ok(()),
    }
}

impl Engine for MockEngine {
    type Handle = MockHandle;

    async fn run(
        self,
        _config: Arc<EffectiveConfig>,
        ready: oneshot::Sender<MockHandle>,
    ) -> Result<(), EngineError> {
        let stopped = Arc::new(Notify::new());
        let handle = MockHandle {
            stopped: stopped.clone(),
            stops: self.stops.clone(),
        };

        match self.behavior {
            Behavior::FailStart(msg) => Err(msg.into()),
            Behavior::ExitWithoutReady => Ok(()),
            Behavior::ExitAfterReady(result) => {
                let _ = ready.send(handle);
                finish(result)
            }
            Behavior::RunUntilStopped(result) => {
                let _ = ready.send(handle);
                stopped.notified().await;
                finish(result)
            }
        }
    }
}

// ============================================================================
// Mock service manager
// ============================================================================

pub struct MockManager {
    pub calls: Arc<Mutex<Vec<&'static str>>>,
    pub fail_privilege_drop: bool,
    stop: Option<oneshot::Receiver<()>>,
    stop_delay: Option<Duration>,
}

impl MockManager {
    /// A manager whose stop request fires when the returned sender is used
    /// or dropped.
    pub fn new() -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let manager = Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_privilege_drop: false,
            stop: Some(rx),
            stop_delay: None,
        };
        (manager, tx)
    }

    /// A manager that never requests a stop.
    pub fn never_stops() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_privilege_drop: false,
            stop: None,
            stop_delay: None,
        }
    }

    /// A manager that requests a stop `delay` after being asked.
    pub fn stops_after(delay: Duration) -> Self {
        Self {
            stop_delay: Some(delay),
            ..Self::never_stops()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl ServiceManager for MockManager {
    fn drop_privileges(&mut self) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push("drop_privileges");
        if self.fail_privilege_drop {
            return Err(ServiceError::Privileges(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "setuid refused",
            )));
        }
        Ok(())
    }

    fn set_started(&mut self) {
        self.calls.lock().unwrap().push("set_started");
    }

    async fn stop_requested(&mut self) {
        if let Some(delay) = self.stop_delay {
            tokio::time::sleep(delay).await;
            return;
        }
        match self.stop.take() {
            Some(rx) => {
                let _ = rx.await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
