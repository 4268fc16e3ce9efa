//! Configuration schema definitions.
//!
//! Three shapes, one per resolution stage:
//! - [`OptionLayer`]: one source of options (command line or config file),
//!   every field optional. Parsed by clap and by serde from the same struct.
//! - [`RawOptions`]: defaults with layers applied, still untyped strings.
//! - [`EffectiveConfig`]: the validated, immutable result.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::chain::{Address, NetworkProfile};
use crate::net::{DialStrategy, LookupStrategy, NetStrategies, ProxySettings};

use super::paths::Defaults;

pub const DEFAULT_MAX_PEERS: usize = 125;
pub const DEFAULT_BAN_DURATION: Duration = Duration::from_secs(60 * 60 * 24);
pub const DEFAULT_MAX_RPC_CLIENTS: usize = 10;
pub const DEFAULT_MAX_RPC_WEBSOCKETS: usize = 25;
pub const DEFAULT_DEBUG_LEVEL: &str = "info";
pub const DEFAULT_FREE_TX_RELAY_LIMIT: f64 = 15.0;
pub const DEFAULT_BLOCK_MIN_SIZE: u32 = 0;
pub const DEFAULT_BLOCK_MAX_SIZE: u32 = 750_000;
pub const DEFAULT_BLOCK_PRIORITY_SIZE: u32 = 50_000;
pub const BLOCK_MAX_SIZE_MIN: u32 = 1000;
pub const BLOCK_MAX_SIZE_MAX: u32 = crate::chain::MAX_BLOCK_PAYLOAD - 1000;

/// Block storage backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DbType {
    #[default]
    LevelDb,
    MemDb,
}

impl DbType {
    pub const SUPPORTED: &'static [&'static str] = &["leveldb", "memdb"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "leveldb" => Some(Self::LevelDb),
            "memdb" => Some(Self::MemDb),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LevelDb => "leveldb",
            Self::MemDb => "memdb",
        }
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_duration(s: &str) -> Result<Duration, humantime_serde::re::humantime::DurationError> {
    humantime_serde::re::humantime::parse_duration(s)
}

/// One layer of options.
///
/// Command-line flags and config-file keys share their names: `--addpeer`
/// on the command line is `addpeer = [...]` in the file. Unset means the
/// layer leaves the value alone. Lists given by a layer replace the list
/// below it.
#[derive(Debug, Clone, Default, PartialEq, Parser, Deserialize)]
#[command(
    name = "nmcd",
    about = "Namecoin full node daemon",
    disable_version_flag = true,
    args_override_self = true
)]
#[serde(default)]
pub struct OptionLayer {
    /// Display version information and exit
    #[arg(short = 'V', long = "version")]
    #[serde(skip)]
    pub show_version: bool,

    /// Path to configuration file
    #[arg(short = 'C', long = "configfile", value_name = "PATH")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Directory to store data
    #[arg(short = 'b', long = "datadir", value_name = "DIR")]
    #[serde(rename = "datadir")]
    pub data_dir: Option<String>,

    /// Directory to log output
    #[arg(long = "logdir", value_name = "DIR")]
    #[serde(rename = "logdir")]
    pub log_dir: Option<String>,

    /// Add a peer to connect with at startup
    #[arg(short = 'a', long = "addpeer", value_name = "ADDR")]
    #[serde(rename = "addpeer")]
    pub add_peers: Vec<String>,

    /// Connect only to the specified peers at startup
    #[arg(long = "connect", value_name = "ADDR")]
    #[serde(rename = "connect")]
    pub connect_peers: Vec<String>,

    /// Disable listening for incoming connections
    #[arg(long = "nolisten")]
    #[serde(rename = "nolisten")]
    pub disable_listen: bool,

    /// Add an interface/port to listen for connections
    #[arg(long = "listen", value_name = "ADDR")]
    #[serde(rename = "listen")]
    pub listeners: Vec<String>,

    /// Max number of inbound and outbound peers
    #[arg(long = "maxpeers", value_name = "N")]
    #[serde(rename = "maxpeers")]
    pub max_peers: Option<usize>,

    /// How long to ban misbehaving peers (e.g. 24h, 90m)
    #[arg(long = "banduration", value_name = "DURATION", value_parser = parse_duration)]
    #[serde(rename = "banduration", with = "humantime_serde")]
    pub ban_duration: Option<Duration>,

    /// Username for RPC connections
    #[arg(short = 'u', long = "rpcuser", value_name = "USER")]
    #[serde(rename = "rpcuser")]
    pub rpc_user: Option<String>,

    /// Password for RPC connections
    #[arg(short = 'P', long = "rpcpass", value_name = "PASS")]
    #[serde(rename = "rpcpass")]
    pub rpc_pass: Option<String>,

    /// Add an interface/port to listen for RPC connections
    #[arg(long = "rpclisten", value_name = "ADDR")]
    #[serde(rename = "rpclisten")]
    pub rpc_listeners: Vec<String>,

    /// File containing the certificate file
    #[arg(long = "rpccert", value_name = "PATH")]
    #[serde(rename = "rpccert")]
    pub rpc_cert: Option<String>,

    /// File containing the certificate key
    #[arg(long = "rpckey", value_name = "PATH")]
    #[serde(rename = "rpckey")]
    pub rpc_key: Option<String>,

    /// Max number of RPC clients for standard connections
    #[arg(long = "rpcmaxclients", value_name = "N")]
    #[serde(rename = "rpcmaxclients")]
    pub rpc_max_clients: Option<usize>,

    /// Max number of RPC websocket connections
    #[arg(long = "rpcmaxwebsockets", value_name = "N")]
    #[serde(rename = "rpcmaxwebsockets")]
    pub rpc_max_websockets: Option<usize>,

    /// Disable built-in RPC server
    #[arg(long = "norpc")]
    #[serde(rename = "norpc")]
    pub disable_rpc: bool,

    /// Disable TLS for the RPC server
    #[arg(long = "notls")]
    #[serde(rename = "notls")]
    pub disable_tls: bool,

    /// Disable DNS seeding for peers
    #[arg(long = "nodnsseed")]
    #[serde(rename = "nodnsseed")]
    pub disable_dns_seed: bool,

    /// Add an ip to the list of local addresses we claim to listen on
    #[arg(long = "externalip", value_name = "IP")]
    #[serde(rename = "externalip")]
    pub external_ips: Vec<String>,

    /// Connect via SOCKS5 proxy (eg. 127.0.0.1:9050)
    #[arg(long = "proxy", value_name = "ADDR")]
    #[serde(rename = "proxy")]
    pub proxy: Option<String>,

    /// Username for proxy server
    #[arg(long = "proxyuser", value_name = "USER")]
    #[serde(rename = "proxyuser")]
    pub proxy_user: Option<String>,

    /// Password for proxy server
    #[arg(long = "proxypass", value_name = "PASS")]
    #[serde(rename = "proxypass")]
    pub proxy_pass: Option<String>,

    /// Connect to tor hidden services via SOCKS5 proxy (eg. 127.0.0.1:9050)
    #[arg(long = "onion", value_name = "ADDR")]
    #[serde(rename = "onion")]
    pub onion_proxy: Option<String>,

    /// Username for onion proxy server
    #[arg(long = "onionuser", value_name = "USER")]
    #[serde(rename = "onionuser")]
    pub onion_proxy_user: Option<String>,

    /// Password for onion proxy server
    #[arg(long = "onionpass", value_name = "PASS")]
    #[serde(rename = "onionpass")]
    pub onion_proxy_pass: Option<String>,

    /// Disable connecting to tor hidden services
    #[arg(long = "noonion")]
    #[serde(rename = "noonion")]
    pub no_onion: bool,

    /// Use the test network
    #[arg(long = "testnet")]
    #[serde(rename = "testnet")]
    pub testnet: bool,

    /// Use the regression test network
    #[arg(long = "regtest")]
    #[serde(rename = "regtest")]
    pub regtest: bool,

    /// Use the simulation test network
    #[arg(long = "simnet")]
    #[serde(rename = "simnet")]
    pub simnet: bool,

    /// Disable built-in checkpoints
    #[arg(long = "nocheckpoints")]
    #[serde(rename = "nocheckpoints")]
    pub disable_checkpoints: bool,

    /// Database backend to use for the block chain
    #[arg(long = "dbtype", value_name = "TYPE")]
    #[serde(rename = "dbtype")]
    pub db_type: Option<String>,

    /// Enable HTTP profiling on given port (1024-65535)
    #[arg(long = "profile", value_name = "PORT")]
    #[serde(rename = "profile")]
    pub profile: Option<String>,

    /// Write CPU profile to the specified file
    #[arg(long = "cpuprofile", value_name = "PATH")]
    #[serde(rename = "cpuprofile")]
    pub cpu_profile: Option<String>,

    /// Logging level: a level for everything, or subsystem=level pairs
    #[arg(short = 'd', long = "debuglevel", value_name = "LEVEL")]
    #[serde(rename = "debuglevel")]
    pub debug_level: Option<String>,

    /// Use UPnP to map our listening port outside of NAT
    #[arg(long = "upnp")]
    #[serde(rename = "upnp")]
    pub upnp: bool,

    /// Limit relay of transactions with no transaction fee (KB/min)
    #[arg(long = "limitfreerelay", value_name = "KB")]
    #[serde(rename = "limitfreerelay")]
    pub free_tx_relay_limit: Option<f64>,

    /// Mininum block size in bytes to be used when creating a block
    #[arg(long = "blockminsize", value_name = "BYTES")]
    #[serde(rename = "blockminsize")]
    pub block_min_size: Option<u32>,

    /// Maximum block size in bytes to be used when creating a block
    #[arg(long = "blockmaxsize", value_name = "BYTES")]
    #[serde(rename = "blockmaxsize")]
    pub block_max_size: Option<u32>,

    /// Size in bytes for high-priority/low-fee transactions in a block
    #[arg(long = "blockprioritysize", value_name = "BYTES")]
    #[serde(rename = "blockprioritysize")]
    pub block_priority_size: Option<u32>,

    /// Allow address for getwork requests
    #[arg(long = "getworkkey", value_name = "ADDR")]
    #[serde(rename = "getworkkey")]
    pub getwork_keys: Vec<String>,

    /// Generate (mine) coins using the CPU
    #[arg(long = "generate")]
    #[serde(rename = "generate")]
    pub generate: bool,

    /// Add the specified payment address to the list of mining addresses
    #[arg(long = "miningaddr", value_name = "ADDR")]
    #[serde(rename = "miningaddr")]
    pub mining_addrs: Vec<String>,

    /// Service command {install, remove, start, stop}
    #[arg(short = 's', long = "service", value_name = "CMD")]
    #[serde(skip)]
    pub service: Option<String>,

    /// Remaining non-flag arguments
    #[arg(value_name = "ARGS", hide = true)]
    #[serde(skip)]
    pub args: Vec<String>,
}

impl OptionLayer {
    /// Overlay every value this layer sets onto `raw`.
    pub fn apply_to(self, raw: &mut RawOptions) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        fn replace(slot: &mut Vec<String>, values: Vec<String>) {
            if !values.is_empty() {
                *slot = values;
            }
        }
        fn flag(slot: &mut bool, value: bool) {
            *slot |= value;
        }

        set(&mut raw.data_dir, self.data_dir);
        set(&mut raw.log_dir, self.log_dir);
        replace(&mut raw.add_peers, self.add_peers);
        replace(&mut raw.connect_peers, self.connect_peers);
        flag(&mut raw.disable_listen, self.disable_listen);
        replace(&mut raw.listeners, self.listeners);
        set(&mut raw.max_peers, self.max_peers);
        set(&mut raw.ban_duration, self.ban_duration);
        set(&mut raw.rpc_user, self.rpc_user);
        set(&mut raw.rpc_pass, self.rpc_pass);
        replace(&mut raw.rpc_listeners, self.rpc_listeners);
        set(&mut raw.rpc_cert, self.rpc_cert);
        set(&mut raw.rpc_key, self.rpc_key);
        set(&mut raw.rpc_max_clients, self.rpc_max_clients);
        set(&mut raw.rpc_max_websockets, self.rpc_max_websockets);
        flag(&mut raw.disable_rpc, self.disable_rpc);
        flag(&mut raw.disable_tls, self.disable_tls);
        flag(&mut raw.disable_dns_seed, self.disable_dns_seed);
        replace(&mut raw.external_ips, self.external_ips);
        set(&mut raw.proxy.proxy, self.proxy);
        set(&mut raw.proxy.proxy_user, self.proxy_user);
        set(&mut raw.proxy.proxy_pass, self.proxy_pass);
        set(&mut raw.proxy.onion_proxy, self.onion_proxy);
        set(&mut raw.proxy.onion_proxy_user, self.onion_proxy_user);
        set(&mut raw.proxy.onion_proxy_pass, self.onion_proxy_pass);
        flag(&mut raw.proxy.no_onion, self.no_onion);
        flag(&mut raw.testnet, self.testnet);
        flag(&mut raw.regtest, self.regtest);
        flag(&mut raw.simnet, self.simnet);
        flag(&mut raw.disable_checkpoints, self.disable_checkpoints);
        set(&mut raw.db_type, self.db_type);
        set(&mut raw.profile, self.profile);
        set(&mut raw.cpu_profile, self.cpu_profile);
        set(&mut raw.debug_level, self.debug_level);
        flag(&mut raw.upnp, self.upnp);
        set(&mut raw.free_tx_relay_limit, self.free_tx_relay_limit);
        set(&mut raw.block_min_size, self.block_min_size);
        set(&mut raw.block_max_size, self.block_max_size);
        set(&mut raw.block_priority_size, self.block_priority_size);
        replace(&mut raw.getwork_keys, self.getwork_keys);
        flag(&mut raw.generate, self.generate);
        replace(&mut raw.mining_addrs, self.mining_addrs);
    }
}

/// Options after layering, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOptions {
    pub data_dir: String,
    pub log_dir: String,
    pub add_peers: Vec<String>,
    pub connect_peers: Vec<String>,
    pub disable_listen: bool,
    pub listeners: Vec<String>,
    pub max_peers: usize,
    pub ban_duration: Duration,
    pub rpc_user: String,
    pub rpc_pass: String,
    pub rpc_listeners: Vec<String>,
    pub rpc_cert: String,
    pub rpc_key: String,
    pub rpc_max_clients: usize,
    pub rpc_max_websockets: usize,
    pub disable_rpc: bool,
    pub disable_tls: bool,
    pub disable_dns_seed: bool,
    pub external_ips: Vec<String>,
    pub proxy: ProxySettings,
    pub testnet: bool,
    pub regtest: bool,
    pub simnet: bool,
    pub disable_checkpoints: bool,
    pub db_type: String,
    pub profile: String,
    pub cpu_profile: String,
    pub debug_level: String,
    pub upnp: bool,
    pub free_tx_relay_limit: f64,
    pub block_min_size: u32,
    pub block_max_size: u32,
    pub block_priority_size: u32,
    pub getwork_keys: Vec<String>,
    pub generate: bool,
    pub mining_addrs: Vec<String>,
}

impl RawOptions {
    /// Built-in defaults, with paths taken from `defaults`.
    pub fn from_defaults(defaults: &Defaults) -> Self {
        Self {
            data_dir: defaults.data_dir.to_string_lossy().into_owned(),
            log_dir: defaults.log_dir.to_string_lossy().into_owned(),
            add_peers: Vec::new(),
            connect_peers: Vec::new(),
            disable_listen: false,
            listeners: Vec::new(),
            max_peers: DEFAULT_MAX_PEERS,
            ban_duration: DEFAULT_BAN_DURATION,
            rpc_user: String::new(),
            rpc_pass: String::new(),
            rpc_listeners: Vec::new(),
            rpc_cert: defaults.rpc_cert.to_string_lossy().into_owned(),
            rpc_key: defaults.rpc_key.to_string_lossy().into_owned(),
            rpc_max_clients: DEFAULT_MAX_RPC_CLIENTS,
            rpc_max_websockets: DEFAULT_MAX_RPC_WEBSOCKETS,
            disable_rpc: false,
            disable_tls: false,
            disable_dns_seed: false,
            external_ips: Vec::new(),
            proxy: ProxySettings::default(),
            testnet: false,
            regtest: false,
            simnet: false,
            disable_checkpoints: false,
            db_type: DbType::default().name().to_string(),
            profile: String::new(),
            cpu_profile: String::new(),
            debug_level: DEFAULT_DEBUG_LEVEL.to_string(),
            upnp: false,
            free_tx_relay_limit: DEFAULT_FREE_TX_RELAY_LIMIT,
            block_min_size: DEFAULT_BLOCK_MIN_SIZE,
            block_max_size: DEFAULT_BLOCK_MAX_SIZE,
            block_priority_size: DEFAULT_BLOCK_PRIORITY_SIZE,
            getwork_keys: Vec::new(),
            generate: false,
            mining_addrs: Vec::new(),
        }
    }
}

/// Peer-to-peer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerConfig {
    pub add_peers: Vec<String>,
    pub connect_peers: Vec<String>,
    pub listeners: Vec<String>,
    pub disable_listen: bool,
    pub max_peers: usize,
    pub ban_duration: Duration,
    pub external_ips: Vec<String>,
    pub disable_dns_seed: bool,
    pub upnp: bool,
}

/// RPC server settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcConfig {
    pub disabled: bool,
    pub user: String,
    pub pass: String,
    pub listeners: Vec<String>,
    pub cert: PathBuf,
    pub key: PathBuf,
    pub max_clients: usize,
    pub max_websockets: usize,
    pub disable_tls: bool,
}

/// Block template and mining settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningConfig {
    pub generate: bool,
    /// Decoded getwork keys followed by decoded mining addresses.
    pub addresses: Vec<Address>,
    pub block_min_size: u32,
    pub block_max_size: u32,
    pub block_priority_size: u32,
    pub free_tx_relay_limit: f64,
}

/// Fully resolved configuration. Built once, then shared read-only.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub network: NetworkProfile,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub debug_level: String,
    pub db_type: DbType,
    pub profile_port: Option<u16>,
    pub cpu_profile: Option<PathBuf>,
    pub disable_checkpoints: bool,
    pub peers: PeerConfig,
    pub rpc: RpcConfig,
    pub mining: MiningConfig,
    pub net: NetStrategies,
}

impl EffectiveConfig {
    /// Dial strategy for `host`; `.onion` hosts use the onion pair.
    pub fn dial_for(&self, host: &str) -> &DialStrategy {
        self.net.dial_for(host)
    }

    /// Lookup strategy for `host`; `.onion` hosts use the onion pair.
    pub fn lookup_for(&self, host: &str) -> &LookupStrategy {
        self.net.lookup_for(host)
    }

    /// Whether DNS seeding should run: the network has seeds and it was
    /// not turned off.
    pub fn dns_seeding(&self) -> bool {
        self.network.has_dns_seeds() && !self.peers.disable_dns_seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_layer_uses_long_names() {
        let layer: OptionLayer = toml::from_str(
            r#"
            datadir = "/tmp/chain"
            addpeer = ["1.2.3.4", "5.6.7.8:9"]
            maxpeers = 8
            banduration = "90m"
            simnet = true
            blockmaxsize = 5000
            somethingelse = "ignored"
            "#,
        )
        .unwrap();

        assert_eq!(layer.data_dir.as_deref(), Some("/tmp/chain"));
        assert_eq!(layer.add_peers, vec!["1.2.3.4", "5.6.7.8:9"]);
        assert_eq!(layer.max_peers, Some(8));
        assert_eq!(layer.ban_duration, Some(Duration::from_secs(90 * 60)));
        assert!(layer.simnet);
        assert_eq!(layer.block_max_size, Some(5000));
        assert!(layer.rpc_user.is_none());
    }

    #[test]
    fn test_cli_layer() {
        let layer = OptionLayer::try_parse_from([
            "nmcd",
            "-a",
            "1.2.3.4",
            "--addpeer",
            "5.6.7.8",
            "--banduration",
            "2h",
            "-u",
            "alice",
            "-V",
        ])
        .unwrap();
        assert_eq!(layer.add_peers, vec!["1.2.3.4", "5.6.7.8"]);
        assert_eq!(layer.ban_duration, Some(Duration::from_secs(7200)));
        assert_eq!(layer.rpc_user.as_deref(), Some("alice"));
        assert!(layer.show_version);
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        assert!(OptionLayer::try_parse_from(["nmcd", "--bogus"]).is_err());
        assert!(OptionLayer::try_parse_from(["nmcd", "--maxpeers", "many"]).is_err());
    }

    #[test]
    fn test_apply_layers() {
        let defaults = Defaults::from_home("/h");
        let mut raw = RawOptions::from_defaults(&defaults);
        assert_eq!(raw.max_peers, DEFAULT_MAX_PEERS);
        assert_eq!(raw.data_dir, "/h/data");

        OptionLayer {
            add_peers: vec!["a".into(), "b".into()],
            max_peers: Some(3),
            ..Default::default()
        }
        .apply_to(&mut raw);
        OptionLayer {
            add_peers: vec!["c".into()],
            ..Default::default()
        }
        .apply_to(&mut raw);

        assert_eq!(raw.add_peers, vec!["c"]);
        assert_eq!(raw.max_peers, 3);
        assert_eq!(raw.block_max_size, DEFAULT_BLOCK_MAX_SIZE);
    }

    #[test]
    fn test_db_type_names() {
        assert_eq!(DbType::parse("memdb"), Some(DbType::MemDb));
        assert_eq!(DbType::parse("LevelDB"), None);
        for name in DbType::SUPPORTED {
            assert_eq!(DbType::parse(name).unwrap().name(), *name);
        }
    }
}
