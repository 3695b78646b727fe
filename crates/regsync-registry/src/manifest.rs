use serde::Deserialize;

/// Protocols assumed when a release has no usable manifest.
pub const DEFAULT_PROTOCOLS: &[&str] = &["5.0"];

#[derive(Debug, Deserialize)]
struct Manifest {
    metadata: ManifestMetadata,
}

#[derive(Debug, Deserialize)]
struct ManifestMetadata {
    #[serde(default)]
    protocol_versions: Vec<String>,
}

pub fn default_protocols() -> Vec<String> {
    DEFAULT_PROTOCOLS.iter().map(|p| p.to_string()).collect()
}

/// Reads `metadata.protocol_versions` from a provider manifest.
///
/// Returns `None` when the manifest cannot be parsed or declares no protocols.
pub fn parse_protocols(contents: &[u8]) -> Option<Vec<String>> {
    let manifest: Manifest = serde_json::from_slice(contents).ok()?;
    let protocols = manifest.metadata.protocol_versions;
    (!protocols.is_empty()).then_some(protocols)
}
