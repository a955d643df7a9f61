//! Transaction signature type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// A Base58 transaction signature (64 bytes when decoded).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxSignature(String);

impl TxSignature {
    pub const SIG_LEN: usize = 64;

    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let raw = raw.trim();
        let bytes = bs58::decode(raw)
            .into_vec()
            .map_err(|e| TypeError::InvalidSignature(format!("base58 decode failed: {e}")))?;
        if bytes.len() != Self::SIG_LEN {
            return Err(TypeError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                Self::SIG_LEN,
                bytes.len()
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(bs58::encode(bytes).into_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TxSignature {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TxSignature {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TxSignature> for String {
    fn from(sig: TxSignature) -> Self {
        sig.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_64_byte_signatures() {
        let sig = TxSignature::from_bytes(&[7u8; 64]);
        assert_eq!(TxSignature::parse(sig.as_str()).unwrap(), sig);
    }

    #[test]
    fn rejects_public_keys_and_garbage() {
        assert!(TxSignature::parse("11111111111111111111111111111111").is_err());
        assert!(TxSignature::parse("").is_err());
        assert!(TxSignature::parse("tx-1").is_err());
    }
}
