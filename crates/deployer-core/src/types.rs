use crate::error::{DeployerError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();

fn address_re() -> &'static Regex {
    ADDRESS_RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap())
}

/// A 20-byte account address in `0x`-prefixed hex.
///
/// The spelling as given (including checksum casing) is kept for output;
/// equality and hashing ignore case.
#[derive(Debug, Clone, Eq)]
pub struct Address(String);

impl Address {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if !address_re().is_match(s) {
            return Err(DeployerError::InvalidAddress(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn from_bytes(bytes: &[u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex digits without the `0x` prefix, lowercased.
    pub fn hex_digits(&self) -> String {
        self.0[2..].to_ascii_lowercase()
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = DeployerError;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// An unbounded non-negative integer kept in decimal form.
///
/// Token amounts routinely exceed `u64`, so they are carried as digit strings
/// and handed to the executor unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = s.trim_start_matches('0');
        Some(Self(if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }))
    }

    /// Accepts a JSON integer or a digit string. Floats are rejected: they
    /// have already lost precision by the time they reach us.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_u64().map(|v| Self(v.to_string())),
            serde_json::Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == "0"
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Receipt / DeploymentResult
// ---------------------------------------------------------------------------

/// Opaque metadata returned by the execution client for a deploy or call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub address: Address,
    pub receipt: Receipt,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn valid_addresses() {
        Address::parse(CHECKSUMMED).unwrap();
        Address::parse("0x0000000000000000000000000000000000000001").unwrap();
    }

    #[test]
    fn invalid_addresses() {
        for s in [
            "",
            "0x",
            "5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAe",
            "0xZZAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        ] {
            assert!(Address::parse(s).is_err(), "expected invalid: {s}");
        }
    }

    #[test]
    fn address_equality_ignores_case_but_keeps_spelling() {
        let a = Address::parse(CHECKSUMMED).unwrap();
        let b = Address::parse(&CHECKSUMMED.to_ascii_lowercase()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), CHECKSUMMED);
        assert_eq!(a.hex_digits(), &CHECKSUMMED.to_ascii_lowercase()[2..]);
    }

    #[test]
    fn address_from_bytes() {
        let mut bytes = [0u8; 20];
        bytes[19] = 0xab;
        assert_eq!(
            Address::from_bytes(&bytes).as_str(),
            "0x00000000000000000000000000000000000000ab"
        );
    }

    #[test]
    fn amount_accepts_large_digit_strings() {
        let big = "1000000000000000000000000";
        let amount = Amount::from_value(&serde_json::json!(big)).unwrap();
        assert_eq!(amount.as_str(), big);
        assert_eq!(Amount::parse("0007").unwrap().as_str(), "7");
        assert!(Amount::parse("000").unwrap().is_zero());
    }

    #[test]
    fn amount_rejects_non_integers() {
        assert!(Amount::from_value(&serde_json::json!(1.5)).is_none());
        assert!(Amount::from_value(&serde_json::json!(-3)).is_none());
        assert!(Amount::from_value(&serde_json::json!("12abc")).is_none());
        assert!(Amount::from_value(&serde_json::json!(true)).is_none());
    }
}
