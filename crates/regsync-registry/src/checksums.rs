use std::collections::HashMap;

use regsync_utils::hash::Sha256Digest;

use crate::error::{RegistryError, Result};

/// Parses a `SHA256SUMS` file into `filename -> digest`.
///
/// Lines are whitespace separated `<digest> <filename>`; lines with any other number of
/// fields are ignored. A digest that is not 64 hex characters is an error.
///
/// # Examples
///
/// ```
/// use regsync_registry::checksums::parse_checksums;
///
/// let sums = format!("{}  provider_1.0.0_linux_amd64.zip\n", "ab".repeat(32));
/// let map = parse_checksums(sums.as_bytes()).unwrap();
/// assert_eq!(map["provider_1.0.0_linux_amd64.zip"].as_str(), "ab".repeat(32));
/// ```
pub fn parse_checksums(contents: &[u8]) -> Result<HashMap<String, Sha256Digest>> {
    let text = String::from_utf8_lossy(contents);
    let mut result = HashMap::new();

    for (idx, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [digest, filename] = fields.as_slice() else {
            continue;
        };
        let digest = Sha256Digest::parse(digest).map_err(|source| {
            RegistryError::InvalidChecksums {
                line: idx + 1,
                source,
            }
        })?;
        result.insert(filename.to_string(), digest);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checksums() {
        let a = "a".repeat(64);
        let b = "B".repeat(64);
        let contents = format!(
            "{a}  p_1.0.0_darwin_amd64.zip\n\n{b}\tp_1.0.0_linux_amd64.zip\nonly-one-field\nthree fields here\n"
        );
        let map = parse_checksums(contents.as_bytes()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["p_1.0.0_darwin_amd64.zip"].as_str(), a);
        assert_eq!(map["p_1.0.0_linux_amd64.zip"].as_str(), "b".repeat(64));
    }

    #[test]
    fn test_invalid_digest() {
        let err = parse_checksums(b"\nnothex  p.zip\n").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidChecksums { line: 2, .. }));
    }

    #[test]
    fn test_empty() {
        assert!(parse_checksums(b"").unwrap().is_empty());
    }
}
