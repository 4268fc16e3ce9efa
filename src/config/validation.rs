//! Configuration validation.
//!
//! # Responsibilities
//! - Pick exactly one network profile
//! - Check value ranges (profile port, ban duration, block sizes)
//! - Detect conflicting options (`--addpeer` with `--connect`)
//! - Derive implied settings (listening, DNS seeding, RPC)
//! - Decode mining addresses against the active network
//!
//! Checks run in a fixed order and stop at the first failure. Some of them
//! also adjust [`RawOptions`], so later checks see the adjusted values.

use std::net::ToSocketAddrs;
use std::str::FromStr;
use std::time::Duration;

use tracing::level_filters::LevelFilter;

use crate::chain::{Address, NetworkProfile};
use crate::net::join_host_port;

use super::error::ConfigError;
use super::schema::{DbType, RawOptions, BLOCK_MAX_SIZE_MAX, BLOCK_MAX_SIZE_MIN};

/// Choose the network profile from the testnet/regtest/simnet flags.
///
/// More than one flag is an error; none selects mainnet.
pub fn select_network(raw: &RawOptions) -> Result<NetworkProfile, ConfigError> {
    let mut selected = NetworkProfile::MainNet;
    let mut count = 0;
    for (set, profile) in [
        (raw.testnet, NetworkProfile::TestNet),
        (raw.regtest, NetworkProfile::RegressionNet),
        (raw.simnet, NetworkProfile::SimNet),
    ] {
        if set {
            count += 1;
            selected = profile;
        }
    }

    if count > 1 {
        return Err(ConfigError::MultipleNetworks);
    }
    Ok(selected)
}

/// Accept either a single level (`debug`) or `subsystem=level` pairs
/// separated by commas (`PEER=debug,RPCS=warn`).
pub fn validate_debug_level(level: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidDebugLevel {
        level: level.to_string(),
        reason,
    };

    if !level.contains(',') && !level.contains('=') {
        return LevelFilter::from_str(level)
            .map(|_| ())
            .map_err(|_| invalid(format!("unknown level {level:?}")));
    }

    for pair in level.split(',') {
        let (subsystem, lvl) = pair
            .split_once('=')
            .ok_or_else(|| invalid(format!("{pair:?} is not a subsystem=level pair")))?;
        if subsystem.is_empty() {
            return Err(invalid(format!("{pair:?} names no subsystem")));
        }
        LevelFilter::from_str(lvl).map_err(|_| invalid(format!("unknown level {lvl:?}")))?;
    }
    Ok(())
}

pub fn validate_db_type(db_type: &str) -> Result<DbType, ConfigError> {
    DbType::parse(db_type).ok_or_else(|| ConfigError::InvalidDbType {
        db_type: db_type.to_string(),
        supported: DbType::SUPPORTED,
    })
}

/// An empty profile disables profiling; otherwise it is a port in
/// `[1024, 65535]`.
pub fn validate_profile_port(profile: &str) -> Result<Option<u16>, ConfigError> {
    if profile.is_empty() {
        return Ok(None);
    }
    match profile.parse::<u16>() {
        Ok(port) if port >= 1024 => Ok(Some(port)),
        _ => Err(ConfigError::InvalidProfilePort),
    }
}

pub fn validate_ban_duration(ban: Duration) -> Result<(), ConfigError> {
    if ban < Duration::from_secs(1) {
        return Err(ConfigError::BanDurationTooShort(ban));
    }
    Ok(())
}

pub fn check_peer_options(raw: &RawOptions) -> Result<(), ConfigError> {
    if !raw.add_peers.is_empty() && !raw.connect_peers.is_empty() {
        return Err(ConfigError::ConflictingPeerOptions);
    }
    Ok(())
}

/// Settings implied by other settings.
///
/// - `--proxy` or `--connect` without `--listen` turns listening off.
/// - `--connect` turns DNS seeding off.
/// - With no listeners, listen on every interface at the network port.
/// - A missing RPC user or password turns the RPC server off.
pub fn apply_implied_settings(raw: &mut RawOptions, network: NetworkProfile) {
    if (!raw.proxy.proxy.is_empty() || !raw.connect_peers.is_empty()) && raw.listeners.is_empty() {
        raw.disable_listen = true;
    }

    if !raw.connect_peers.is_empty() {
        raw.disable_dns_seed = true;
    }

    if raw.listeners.is_empty() {
        raw.listeners = vec![join_host_port("", network.default_port())];
    }

    if raw.rpc_user.is_empty() || raw.rpc_pass.is_empty() {
        raw.disable_rpc = true;
    }
}

/// With RPC enabled and no RPC listeners given, listen on every address
/// `localhost` resolves to at the network's RPC port.
pub fn default_rpc_listeners(raw: &mut RawOptions, network: NetworkProfile) -> Result<(), ConfigError> {
    if raw.disable_rpc || !raw.rpc_listeners.is_empty() {
        return Ok(());
    }

    let addrs = ("localhost", 0)
        .to_socket_addrs()
        .map_err(ConfigError::LocalhostLookup)?;
    raw.rpc_listeners = addrs
        .map(|addr| join_host_port(&addr.ip().to_string(), network.rpc_port()))
        .collect();
    Ok(())
}

/// Reject an out-of-range `blockmaxsize`, then clamp the priority and
/// minimum sizes to it.
pub fn check_block_sizes(raw: &mut RawOptions) -> Result<(), ConfigError> {
    if !(BLOCK_MAX_SIZE_MIN..=BLOCK_MAX_SIZE_MAX).contains(&raw.block_max_size) {
        return Err(ConfigError::BlockMaxSizeOutOfRange {
            size: raw.block_max_size,
            min: BLOCK_MAX_SIZE_MIN,
            max: BLOCK_MAX_SIZE_MAX,
        });
    }

    raw.block_priority_size = raw.block_priority_size.min(raw.block_max_size);
    raw.block_min_size = raw.block_min_size.min(raw.block_max_size);
    Ok(())
}

/// Decode each address and require it to belong to `network`.
///
/// `option` names the source in error messages (`getworkkey`,
/// `mining address`).
pub fn decode_addresses(
    option: &'static str,
    addrs: &[String],
    network: NetworkProfile,
) -> Result<Vec<Address>, ConfigError> {
    addrs
        .iter()
        .map(|s| {
            let addr = Address::decode(s).map_err(|source| ConfigError::AddressDecode {
                option,
                addr: s.clone(),
                source,
            })?;
            if !addr.is_for_net(network) {
                return Err(ConfigError::WrongNetwork {
                    option,
                    addr: s.clone(),
                    network,
                });
            }
            Ok(addr)
        })
        .collect()
}
