//! OpenPGP key inspection and detached signature checks.

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use chrono::{DateTime, Utc};
use pgp::{
    types::{KeyId, KeyTrait, PublicKeyTrait},
    Deserializable, SignedPublicKey, StandaloneSignature,
};
use regex::Regex;
use regsync_utils::fs::walk_files;
use tracing::{debug, trace};

use crate::error::{OperationError, Result};

static IDENTITY_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^<]*?)\s*<(?P<email>[^>]*)>\s*$").expect("valid identity regex")
});
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s<>]+@[^@\s<>]+\.[^@\s<>]+$").expect("valid email regex"));

pub fn key_id_hex(id: &KeyId) -> String {
    hex::encode_upper(id.as_ref())
}

/// Outcome of the identity check. Missing emails are tolerated with a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityCheck {
    Valid,
    Warning(String),
    Invalid(String),
}

/// A parsed public key with the checks a submitted signing key goes through.
#[derive(Debug, Clone)]
pub struct PublicKey {
    key: SignedPublicKey,
}

impl PublicKey {
    /// Parses an ASCII-armored public key.
    pub fn from_armored(armored: &str) -> Result<Self> {
        let (key, _) = SignedPublicKey::from_string(armored)
            .map_err(|err| OperationError::InvalidKey(err.to_string()))?;
        trace!(key_id = %key_id_hex(&key.key_id()), "parsed key");
        Ok(Self { key })
    }

    pub fn key_id(&self) -> String {
        key_id_hex(&self.key.key_id())
    }

    pub fn fingerprint(&self) -> String {
        hex::encode_upper(self.key.fingerprint())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.key.expires_at()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expiry| expiry <= now)
    }

    pub fn is_revoked(&self) -> bool {
        !self.key.details.revocation_signatures.is_empty()
    }

    /// Whether the primary key or any subkey can make signatures.
    pub fn can_sign(&self) -> bool {
        self.key.is_signing_key() || self.key.public_subkeys.iter().any(|k| k.is_signing_key())
    }

    pub fn identities(&self) -> Vec<&str> {
        self.key.details.users.iter().map(|user| user.id.id()).collect()
    }

    pub fn check_identities(&self) -> IdentityCheck {
        if self.fingerprint().is_empty() {
            return IdentityCheck::Invalid("key has no fingerprint".into());
        }

        let identities = self.identities();
        if identities.is_empty() {
            return IdentityCheck::Invalid("key has no identities".into());
        }

        let mut warning = None;
        for identity in identities {
            if identity.trim().is_empty() {
                return IdentityCheck::Invalid("key identity has no name".into());
            }
            let Some(caps) = IDENTITY_EMAIL.captures(identity) else {
                warning.get_or_insert_with(|| format!("key identity {identity} has no email"));
                continue;
            };
            if caps["name"].trim().is_empty() {
                return IdentityCheck::Invalid(format!("key identity {identity} has no name"));
            }
            if !EMAIL.is_match(&caps["email"]) {
                warning.get_or_insert_with(|| {
                    format!("key identity {identity} has an invalid email")
                });
            }
        }

        match warning {
            Some(message) => IdentityCheck::Warning(message),
            None => IdentityCheck::Valid,
        }
    }

    pub fn keyring(&self) -> Keyring {
        Keyring {
            key: self.key.clone(),
        }
    }
}

/// Result of checking one detached signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureCheck {
    /// Made by the key (or subkey) with this id.
    Valid(String),
    /// Made by some other key.
    UnknownIssuer,
}

/// The primary key and its subkeys, matched against signature issuers.
#[derive(Debug, Clone)]
pub struct Keyring {
    key: SignedPublicKey,
}

impl Keyring {
    pub fn key_ids(&self) -> Vec<String> {
        std::iter::once(self.key.key_id())
            .chain(self.key.public_subkeys.iter().map(|k| k.key_id()))
            .map(|id| key_id_hex(&id))
            .collect()
    }

    /// Checks a binary or armored detached `signature` over `data`.
    ///
    /// A signature by a key outside the ring is [`SignatureCheck::UnknownIssuer`]. A
    /// signature by a key in the ring that does not verify is an error. Key expiry is not
    /// considered.
    pub fn verify_detached(&self, data: &[u8], signature: &[u8]) -> Result<SignatureCheck> {
        let signature = parse_signature(signature)?;
        let issuers: Vec<KeyId> = signature.signature.issuer().into_iter().cloned().collect();

        let mut result = check_key(&signature, &self.key, &issuers, data);
        for subkey in &self.key.public_subkeys {
            if matches!(result, Some(Ok(_))) {
                break;
            }
            result = check_key(&signature, subkey, &issuers, data).or(result);
        }

        match result {
            Some(Ok(id)) => Ok(SignatureCheck::Valid(id)),
            Some(Err(err)) if !issuers.is_empty() => Err(OperationError::BadSignature(err)),
            _ => Ok(SignatureCheck::UnknownIssuer),
        }
    }
}

/// `None` when `key` is not a candidate issuer, otherwise the verification result.
fn check_key<K>(
    signature: &StandaloneSignature,
    key: &K,
    issuers: &[KeyId],
    data: &[u8],
) -> Option<std::result::Result<String, String>>
where
    K: KeyTrait + PublicKeyTrait,
{
    let id = key.key_id();
    if !issuers.is_empty() && !issuers.contains(&id) {
        return None;
    }
    Some(
        signature
            .verify(key, data)
            .map(|_| key_id_hex(&id))
            .map_err(|err| err.to_string()),
    )
}

fn parse_signature(bytes: &[u8]) -> Result<StandaloneSignature> {
    let armored = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .is_some_and(|start| bytes[start..].starts_with(b"-----BEGIN"));

    if armored {
        let text = std::str::from_utf8(bytes)
            .map_err(|err| OperationError::InvalidSignature(err.to_string()))?;
        StandaloneSignature::from_string(text)
            .map(|(sig, _)| sig)
            .map_err(|err| OperationError::InvalidSignature(err.to_string()))
    } else {
        StandaloneSignature::from_bytes(bytes)
            .map_err(|err| OperationError::InvalidSignature(err.to_string()))
    }
}

/// Key files for a namespace, and for one of its providers when `provider` is given.
///
/// Keys live at `<root>/<shard>/<namespace>/*.asc` and
/// `<root>/<shard>/<namespace>/<provider>/*.asc`.
pub fn key_files(root: &Path, namespace: &str, provider: Option<&str>) -> Result<Vec<PathBuf>> {
    let shard: String = namespace
        .chars()
        .next()
        .map(|c| c.to_lowercase().collect())
        .unwrap_or_default();
    let namespace_dir = root.join(shard).join(namespace);

    let files = walk_files(&namespace_dir).map_err(|err| OperationError::Custom(err.to_string()))?;
    let keys: Vec<PathBuf> = files
        .into_iter()
        .filter(|path| path.extension().is_some_and(|ext| ext == "asc"))
        .filter(|path| {
            let Ok(relative) = path.strip_prefix(&namespace_dir) else {
                return false;
            };
            match relative.components().count() {
                1 => true,
                2 => provider.is_some_and(|p| relative.starts_with(p)),
                _ => false,
            }
        })
        .collect();

    debug!(namespace, count = keys.len(), "found key files");
    Ok(keys)
}
