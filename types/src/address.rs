//! Solana wallet address type.
//!
//! A wallet address is the Base58 encoding of a 32-byte Ed25519 public key.
//! Construction always validates, so any `WalletAddress` in the system is
//! known to decode to exactly 32 bytes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// A validated Base58 wallet address.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress {
    text: String,
    bytes: [u8; 32],
}

impl WalletAddress {
    /// Length of the decoded public key.
    pub const KEY_LEN: usize = 32;

    /// Parse and validate an address string.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TypeError::InvalidAddress("empty address".into()));
        }
        let decoded = bs58::decode(raw)
            .into_vec()
            .map_err(|e| TypeError::InvalidAddress(format!("base58 decode failed: {e}")))?;
        let bytes: [u8; 32] = decoded.try_into().map_err(|v: Vec<u8>| {
            TypeError::InvalidAddress(format!("expected {} bytes, got {}", Self::KEY_LEN, v.len()))
        })?;
        Ok(Self {
            text: raw.to_string(),
            bytes,
        })
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            text: bs58::encode(bytes).into_string(),
            bytes: *bytes,
        }
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The decoded 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl FromStr for WalletAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<WalletAddress> for String {
    fn from(addr: WalletAddress) -> Self {
        addr.text
    }
}
