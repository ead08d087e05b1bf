use serde::Deserialize;

use crate::shared::error::ScanError;
use crate::shared::Result;

/// Reference to one layer in the saved image, in chain order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRef {
    /// Content digest, derived from the layer path in the archive
    pub digest: String,
    /// Digest of the preceding layer in the chain, if any
    pub parent_digest: Option<String>,
    /// Path of the layer tar inside the outer archive
    pub archive_path: String,
}

/// The archive's top-level description of layer identities and ordering.
///
/// Invariant: the layers form a single linear chain, root-most first,
/// matching the saved image's declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub layers: Vec<LayerRef>,
    /// Repository tags the saved image was labeled with, possibly empty
    pub repo_tags: Vec<String>,
}

impl Manifest {
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Human-facing image label: the first repo tag when present
    pub fn image_label(&self) -> Option<&str> {
        self.repo_tags.first().map(String::as_str)
    }

    /// Chain-order index for a layer path inside the outer archive
    pub fn index_of_path(&self, path: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.archive_path == path)
    }
}

/// Saved-image manifest.json schema: an array of image descriptors.
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    #[serde(rename = "Config")]
    #[allow(dead_code)]
    config: Option<String>,

    #[serde(rename = "RepoTags")]
    repo_tags: Option<Vec<String>>,

    #[serde(rename = "Layers")]
    layers: Option<Vec<String>>,
}

/// Parses manifest.json into an ordered layer chain.
///
/// # Errors
/// - `MalformedArchive` when the bytes are not JSON, the manifest array
///   is empty, the layer list is empty, or two layers share a digest
///   (the chain would branch);
/// - `UnsupportedFormat` when the JSON is valid but does not carry the
///   known schema (no `Layers` key).
pub fn parse_manifest(bytes: &[u8]) -> Result<Manifest> {
    let json: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| {
        ScanError::MalformedArchive {
            details: format!("manifest.json is not valid JSON: {}", e),
        }
    })?;

    let entries: Vec<ManifestEntry> =
        serde_json::from_value(json).map_err(|e| ScanError::UnsupportedFormat {
            details: format!("manifest.json does not match the known schema: {}", e),
        })?;

    // The first entry describes the image; multi-image archives are rare
    // and the additional entries reuse the same layer blobs
    let entry = entries.into_iter().next().ok_or_else(|| {
        ScanError::MalformedArchive {
            details: "manifest.json contains no image entries".to_string(),
        }
    })?;

    let repo_tags = entry.repo_tags.unwrap_or_default();
    let layer_paths = entry.layers.ok_or_else(|| ScanError::UnsupportedFormat {
        details: "manifest entry carries no Layers field".to_string(),
    })?;

    if layer_paths.is_empty() {
        return Err(ScanError::MalformedArchive {
            details: "image declares zero layers".to_string(),
        }
        .into());
    }

    let mut layers: Vec<LayerRef> = Vec::with_capacity(layer_paths.len());
    for path in layer_paths {
        let digest = digest_from_path(&path);
        if layers.iter().any(|l| l.digest == digest) {
            return Err(ScanError::MalformedArchive {
                details: format!("layer digest {} appears twice in the chain", digest),
            }
            .into());
        }
        let parent_digest = layers.last().map(|l| l.digest.clone());
        layers.push(LayerRef {
            digest,
            parent_digest,
            archive_path: path,
        });
    }

    Ok(Manifest { layers, repo_tags })
}

/// Derives the layer digest from its archive path.
///
/// Classic saved images store layers as `<digest>/layer.tar`; newer ones
/// as `blobs/sha256/<digest>`. Either way the digest is the informative
/// path component.
fn digest_from_path(path: &str) -> String {
    let trimmed = path.strip_suffix("/layer.tar").unwrap_or(path);
    match trimmed.rsplit('/').next() {
        Some(component) if !component.is_empty() => component.to_string(),
        _ => trimmed.to_string(),
    }
}
