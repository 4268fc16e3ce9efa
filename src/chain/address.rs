//! Base58Check payment addresses.
//!
//! An address is `version || hash160 || checksum` where the checksum is the
//! first four bytes of SHA-256(SHA-256(version || hash160)). The version byte
//! tells which network (and which script template) the address belongs to.

use std::fmt;

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::params::NetworkProfile;

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const HASH_LEN: usize = 20;
const CHECKSUM_LEN: usize = 4;
const DECODED_LEN: usize = 1 + HASH_LEN + CHECKSUM_LEN;

/// Errors produced while decoding an address string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid base58 character {0:?}")]
    InvalidCharacter(char),

    #[error("decoded address is of unknown size {0}")]
    InvalidLength(usize),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("unknown address type")]
    UnknownVersion(u8),
}

/// Script template an address pays to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    PubKeyHash,
    ScriptHash,
}

/// A decoded payment address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    version: u8,
    kind: AddressKind,
    hash: [u8; HASH_LEN],
}

impl Address {
    /// Build a pay-to-pubkey-hash address for `net`.
    pub fn pubkey_hash(hash: [u8; HASH_LEN], net: NetworkProfile) -> Self {
        Self {
            version: net.pubkey_hash_addr_id(),
            kind: AddressKind::PubKeyHash,
            hash,
        }
    }

    /// Build a pay-to-script-hash address for `net`.
    pub fn script_hash(hash: [u8; HASH_LEN], net: NetworkProfile) -> Self {
        Self {
            version: net.script_hash_addr_id(),
            kind: AddressKind::ScriptHash,
            hash,
        }
    }

    /// Decode a Base58Check string.
    ///
    /// Succeeds for any version byte some known network uses; whether the
    /// address belongs to a particular network is answered by
    /// [`Address::is_for_net`].
    pub fn decode(s: &str) -> Result<Self, AddressError> {
        let raw = base58_decode(s)?;
        if raw.len() != DECODED_LEN {
            return Err(AddressError::InvalidLength(raw.len()));
        }

        let (payload, checksum) = raw.split_at(1 + HASH_LEN);
        if checksum != &double_sha256(payload)[..CHECKSUM_LEN] {
            return Err(AddressError::ChecksumMismatch);
        }

        let version = payload[0];
        let kind = NetworkProfile::ALL
            .iter()
            .find_map(|net| {
                if net.pubkey_hash_addr_id() == version {
                    Some(AddressKind::PubKeyHash)
                } else if net.script_hash_addr_id() == version {
                    Some(AddressKind::ScriptHash)
                } else {
                    None
                }
            })
            .ok_or(AddressError::UnknownVersion(version))?;

        let mut hash = [0u8; HASH_LEN];
        hash.copy_from_slice(&payload[1..]);
        Ok(Self { version, kind, hash })
    }

    /// Whether this address is valid on `net`.
    pub fn is_for_net(&self, net: NetworkProfile) -> bool {
        match self.kind {
            AddressKind::PubKeyHash => self.version == net.pubkey_hash_addr_id(),
            AddressKind::ScriptHash => self.version == net.script_hash_addr_id(),
        }
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn hash160(&self) -> &[u8; HASH_LEN] {
        &self.hash
    }

    /// Encode back to the Base58Check string form.
    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(DECODED_LEN);
        raw.push(self.version);
        raw.extend_from_slice(&self.hash);
        let checksum = double_sha256(&raw);
        raw.extend_from_slice(&checksum[..CHECKSUM_LEN]);
        base58_encode(&raw)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

fn base58_encode(data: &[u8]) -> String {
    // Big-endian base-58 digits, least significant first while building.
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 138 / 100 + 1);
    for &byte in data {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let zeros = data.iter().take_while(|&&b| b == 0).count();
    let mut out = String::with_capacity(zeros + digits.len());
    out.extend(std::iter::repeat('1').take(zeros));
    out.extend(digits.iter().rev().map(|&d| ALPHABET[d as usize] as char));
    out
}

fn base58_decode(s: &str) -> Result<Vec<u8>, AddressError> {
    let mut bytes: Vec<u8> = Vec::with_capacity(s.len());
    for c in s.chars() {
        let value = ALPHABET
            .iter()
            .position(|&a| a as char == c)
            .ok_or(AddressError::InvalidCharacter(c))? as u32;

        let mut carry = value;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let zeros = s.chars().take_while(|&c| c == '1').count();
    let mut out = vec![0u8; zeros];
    out.extend(bytes.iter().rev());
    Ok(out)
}
