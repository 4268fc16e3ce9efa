//! Network parameter sets.
//!
//! Exactly one profile is active for a daemon run. Selecting it fixes the
//! default P2P and RPC ports, whether DNS seeding is available, the address
//! version bytes, and the directory namespace segment.

use std::fmt;

/// Largest block payload the wire protocol allows.
pub const MAX_BLOCK_PAYLOAD: u32 = 1_000_000;

/// The logical network the daemon joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NetworkProfile {
    #[default]
    MainNet,
    TestNet,
    RegressionNet,
    SimNet,
}

impl NetworkProfile {
    /// All profiles, main network first.
    pub const ALL: [NetworkProfile; 4] = [
        NetworkProfile::MainNet,
        NetworkProfile::TestNet,
        NetworkProfile::RegressionNet,
        NetworkProfile::SimNet,
    ];

    /// Namespace segment appended to the data and log directories.
    pub const fn name(self) -> &'static str {
        match self {
            Self::MainNet => "mainnet",
            Self::TestNet => "testnet",
            Self::RegressionNet => "regtest",
            Self::SimNet => "simnet",
        }
    }

    /// Default peer-to-peer listen port.
    pub const fn default_port(self) -> &'static str {
        match self {
            Self::MainNet => "8334",
            Self::TestNet => "18334",
            Self::RegressionNet => "18444",
            Self::SimNet => "18555",
        }
    }

    /// Default RPC listen port.
    pub const fn rpc_port(self) -> &'static str {
        match self {
            Self::MainNet => "8336",
            Self::TestNet => "18336",
            Self::RegressionNet => "18334",
            Self::SimNet => "18556",
        }
    }

    /// Version byte for pay-to-pubkey-hash addresses.
    pub const fn pubkey_hash_addr_id(self) -> u8 {
        match self {
            Self::MainNet => 0x34,
            Self::TestNet | Self::RegressionNet => 0x6f,
            Self::SimNet => 0x3f,
        }
    }

    /// Version byte for pay-to-script-hash addresses.
    pub const fn script_hash_addr_id(self) -> u8 {
        match self {
            Self::MainNet => 0x0d,
            Self::TestNet | Self::RegressionNet => 0xc4,
            Self::SimNet => 0x7b,
        }
    }

    /// Whether the profile ships DNS seeds at all.
    pub const fn has_dns_seeds(self) -> bool {
        matches!(self, Self::MainNet | Self::TestNet)
    }
}

impl fmt::Display for NetworkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
