//! Configuration resolution pipeline.
//!
//! ```text
//! home dir created
//!   → lenient pre-parse of argv (help, version, service, configfile)
//!   → defaults
//!   → config file layer (skipped for regtest/simnet on the default file)
//!   → strict parse of argv, layered on top
//!   → network selection, per-network data/log dirs
//!   → ordered validation and implied settings
//!   → address normalization
//!   → dial/lookup provisioning
//!   → EffectiveConfig
//! ```

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{CommandFactory, FromArgMatches, Parser};

use crate::chain::NetworkProfile;
use crate::net::{normalize_addresses, NetStrategies};

use super::error::{ConfigError, ConfigWarning};
use super::loader::load_file;
use super::paths::Defaults;
use super::schema::{
    EffectiveConfig, MiningConfig, OptionLayer, PeerConfig, RawOptions, RpcConfig,
};
use super::validation;

/// Requests that end the process successfully before any work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EarlyExit {
    /// `-V/--version`
    Version,
    /// `-h/--help`, with the rendered help text.
    Help(String),
    /// `-s/--service <cmd>`
    Service(String),
}

/// A configuration ready to run with.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub config: EffectiveConfig,
    /// Positional arguments left after option parsing.
    pub remaining_args: Vec<String>,
    /// To be logged once logging is up.
    pub warnings: Vec<ConfigWarning>,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    Run(Resolved),
    Exit(EarlyExit),
}

/// Turns defaults, the config file and the command line into an
/// [`EffectiveConfig`].
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    defaults: Defaults,
}

impl ConfigResolver {
    pub fn new(defaults: Defaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Resolve `argv` (program name first) into a configuration or an
    /// early exit.
    pub fn resolve<I, T>(&self, argv: I) -> Result<Resolution, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();

        create_home_dir(&self.defaults.home_dir)?;

        let pre = match pre_parse(&argv) {
            Ok(layer) => layer,
            Err(exit) => return Ok(Resolution::Exit(exit)),
        };
        if pre.show_version {
            return Ok(Resolution::Exit(EarlyExit::Version));
        }
        if let Some(cmd) = pre.service {
            return Ok(Resolution::Exit(EarlyExit::Service(cmd)));
        }

        let mut raw = RawOptions::from_defaults(&self.defaults);
        let mut warnings = Vec::new();

        // Test networks start clean unless a file was named explicitly.
        let config_file = pre
            .config_file
            .unwrap_or_else(|| self.defaults.config_file.clone());
        let skip_file =
            (pre.regtest || pre.simnet) && config_file == self.defaults.config_file;
        if !skip_file {
            match load_file(&config_file)? {
                Some(layer) => layer.apply_to(&mut raw),
                None => warnings.push(ConfigWarning::MissingConfigFile(config_file.clone())),
            }
        }

        if pre.regtest && !raw.add_peers.is_empty() {
            raw.add_peers.clear();
        }

        let mut cli =
            OptionLayer::try_parse_from(&argv).map_err(|e| ConfigError::Usage(e.to_string()))?;
        let remaining_args = std::mem::take(&mut cli.args);
        cli.apply_to(&mut raw);

        let network = validation::select_network(&raw)?;
        if network == NetworkProfile::SimNet {
            raw.disable_dns_seed = true;
        }

        let data_dir = self.defaults.expand_path(&raw.data_dir).join(network.name());
        let log_dir = self.defaults.expand_path(&raw.log_dir).join(network.name());

        validation::validate_debug_level(&raw.debug_level)?;
        let db_type = validation::validate_db_type(&raw.db_type)?;
        let profile_port = validation::validate_profile_port(&raw.profile)?;
        validation::validate_ban_duration(raw.ban_duration)?;
        validation::check_peer_options(&raw)?;
        validation::apply_implied_settings(&mut raw, network);
        validation::default_rpc_listeners(&mut raw, network)?;
        validation::check_block_sizes(&mut raw)?;

        let mut addresses = validation::decode_addresses("getworkkey", &raw.getwork_keys, network)?;
        addresses.extend(validation::decode_addresses(
            "mining address",
            &raw.mining_addrs,
            network,
        )?);
        if raw.generate && addresses.is_empty() {
            return Err(ConfigError::NoMiningAddresses);
        }

        let p2p_port = network.default_port();
        let listeners = normalize_addresses(&raw.listeners, p2p_port);
        let rpc_listeners = normalize_addresses(&raw.rpc_listeners, network.rpc_port());
        let add_peers = normalize_addresses(&raw.add_peers, p2p_port);
        let connect_peers = normalize_addresses(&raw.connect_peers, p2p_port);

        let net = NetStrategies::provision(&raw.proxy);

        let config = EffectiveConfig {
            network,
            config_file,
            data_dir,
            log_dir,
            debug_level: raw.debug_level,
            db_type,
            profile_port,
            cpu_profile: (!raw.cpu_profile.is_empty()).then(|| PathBuf::from(raw.cpu_profile)),
            disable_checkpoints: raw.disable_checkpoints,
            peers: PeerConfig {
                add_peers,
                connect_peers,
                listeners,
                disable_listen: raw.disable_listen,
                max_peers: raw.max_peers,
                ban_duration: raw.ban_duration,
                external_ips: raw.external_ips,
                disable_dns_seed: raw.disable_dns_seed,
                upnp: raw.upnp,
            },
            rpc: RpcConfig {
                disabled: raw.disable_rpc,
                user: raw.rpc_user,
                pass: raw.rpc_pass,
                listeners: rpc_listeners,
                cert: PathBuf::from(raw.rpc_cert),
                key: PathBuf::from(raw.rpc_key),
                max_clients: raw.rpc_max_clients,
                max_websockets: raw.rpc_max_websockets,
                disable_tls: raw.disable_tls,
            },
            mining: MiningConfig {
                generate: raw.generate,
                addresses,
                block_min_size: raw.block_min_size,
                block_max_size: raw.block_max_size,
                block_priority_size: raw.block_priority_size,
                free_tx_relay_limit: raw.free_tx_relay_limit,
            },
            net,
        };

        Ok(Resolution::Run(Resolved {
            config,
            remaining_args,
            warnings,
        }))
    }
}

/// Parse only what is needed before the config file is read. Tokens clap
/// rejects are dropped one at a time and the rest is parsed again, so an
/// unknown flag does not hide a later `-V` or `-C`. The strict parse
/// reports them.
fn pre_parse(argv: &[OsString]) -> Result<OptionLayer, EarlyExit> {
    let mut argv = argv.to_vec();
    loop {
        let matches = OptionLayer::command()
            .ignore_errors(true)
            .try_get_matches_from(&argv);

        match matches {
            Ok(matches) => return Ok(OptionLayer::from_arg_matches(&matches).unwrap_or_default()),
            Err(e) if e.kind() == ErrorKind::DisplayHelp => {
                return Err(EarlyExit::Help(e.render().to_string()))
            }
            Err(e) => match rejected_token(&e, &argv) {
                Some(index) => {
                    argv.remove(index);
                }
                None => return Ok(OptionLayer::default()),
            },
        }
    }
}

/// Index in `argv` of the token a parse error complains about.
fn rejected_token(err: &clap::Error, argv: &[OsString]) -> Option<usize> {
    [ContextKind::InvalidArg, ContextKind::InvalidValue]
        .into_iter()
        .filter_map(|kind| match err.get(kind) {
            Some(ContextValue::String(bad)) if !bad.is_empty() => Some(bad.as_str()),
            _ => None,
        })
        .find_map(|bad| {
            let with_value = format!("{bad}=");
            argv.iter()
                .skip(1)
                .position(|token| {
                    token
                        .to_str()
                        .is_some_and(|t| t == bad || t.starts_with(&with_value))
                })
                .map(|i| i + 1)
        })
}

fn create_home_dir(path: &std::path::Path) -> Result<(), ConfigError> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path).map_err(|source| ConfigError::HomeDir {
        path: path.to_path_buf(),
        source,
    })
}
