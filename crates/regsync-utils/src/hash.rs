use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::{HashError, HashResult};

/// A lowercase hex-encoded SHA-256 digest.
///
/// Construction validates that the value is exactly 64 hex characters; uppercase input
/// is normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    pub fn parse(value: &str) -> HashResult<Self> {
        let value = value.trim();
        if value.len() != 64 {
            return Err(HashError::InvalidDigest {
                value: value.to_string(),
                reason: format!("expected 64 hex characters, found {}", value.len()),
            });
        }
        if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(HashError::InvalidDigest {
                value: value.to_string(),
                reason: "contains non-hex characters".to_string(),
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Sha256Digest {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Sha256Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Computes the SHA-256 digest of `data`.
///
/// # Example
///
/// ```
/// use regsync_utils::hash::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b"").as_str(),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn sha256_hex(data: &[u8]) -> Sha256Digest {
    Sha256Digest(hex::encode(Sha256::digest(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let upper = "A".repeat(64);
        let digest = Sha256Digest::parse(&upper).unwrap();
        assert_eq!(digest.as_str(), "a".repeat(64));
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(Sha256Digest::parse("abc").is_err());
        assert!(Sha256Digest::parse(&"g".repeat(64)).is_err());
        assert!(Sha256Digest::parse(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"hello").to_string(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_serde() {
        let digest = sha256_hex(b"hello");
        let json = serde_json::to_string(&digest).unwrap();
        let back: Sha256Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
        assert!(serde_json::from_str::<Sha256Digest>("\"nope\"").is_err());
    }
}
