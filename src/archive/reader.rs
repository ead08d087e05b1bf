use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::archive::manifest::{parse_manifest, Manifest};
use crate::image_analysis::domain::normalize_path;
use crate::shared::error::ScanError;
use crate::shared::Result;

const MANIFEST_PATH: &str = "manifest.json";
const OCI_INDEX_PATH: &str = "index.json";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Reads a saved container image archive from disk.
///
/// The outer archive is a single sequential tar stream, so reading is
/// two passes over the file: one to locate and parse the manifest, one
/// to stream every referenced layer through a caller-supplied visitor.
/// No layer is ever held in memory whole; individual layer streams are
/// transparently gunzipped when the content starts with the gzip magic.
pub struct ArchiveReader {
    path: PathBuf,
}

impl ArchiveReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First pass: finds and parses `manifest.json`.
    ///
    /// # Errors
    /// - `UnsupportedFormat` when the archive carries an OCI layout
    ///   (`index.json` present, `manifest.json` absent);
    /// - `MalformedArchive` when neither manifest is present or the
    ///   outer stream is not a tar archive.
    pub fn read_manifest(&self) -> Result<Manifest> {
        let mut archive = tar::Archive::new(self.open()?);
        let mut saw_oci_index = false;

        let members = archive.entries().map_err(|e| self.malformed(&e))?;
        for member in members {
            let mut member = member.map_err(|e| self.malformed(&e))?;
            let Some(path) = entry_path(&member) else {
                continue;
            };

            if path == MANIFEST_PATH {
                let mut bytes = Vec::new();
                member
                    .read_to_end(&mut bytes)
                    .map_err(|e| self.malformed(&e))?;
                return parse_manifest(&bytes);
            }
            if path == OCI_INDEX_PATH {
                saw_oci_index = true;
            }
        }

        if saw_oci_index {
            Err(ScanError::UnsupportedFormat {
                details: "OCI layout archive (index.json without manifest.json)".to_string(),
            }
            .into())
        } else {
            Err(ScanError::MalformedArchive {
                details: "archive carries no manifest.json".to_string(),
            }
            .into())
        }
    }

    /// Second pass: streams each layer the manifest references to the
    /// visitor, tagged with its chain-order index.
    ///
    /// Layers arrive in archive order, which is not necessarily chain
    /// order; callers index their results by the supplied position. A
    /// layer named by the manifest but absent from the archive is a
    /// `MalformedArchive` error.
    pub fn visit_layers<F>(&self, manifest: &Manifest, mut visit: F) -> Result<()>
    where
        F: FnMut(usize, &mut dyn Read) -> Result<()>,
    {
        let mut archive = tar::Archive::new(self.open()?);
        let mut seen = vec![false; manifest.layer_count()];

        let members = archive.entries().map_err(|e| self.malformed(&e))?;
        for member in members {
            let mut member = member.map_err(|e| self.malformed(&e))?;
            let Some(path) = entry_path(&member) else {
                continue;
            };
            let Some(index) = manifest.index_of_path(&path) else {
                continue;
            };
            seen[index] = true;

            // Sniff the first two bytes to decide on gunzip, then hand
            // the visitor a stream that replays them
            let mut head = [0u8; 2];
            let sniffed = read_up_to(&mut member, &mut head)
                .map_err(|e| self.malformed(&e))?;
            let replay = std::io::Cursor::new(head[..sniffed].to_vec());
            let chained = replay.chain(&mut member);

            if sniffed == 2 && head == GZIP_MAGIC {
                let mut decoded = GzDecoder::new(chained);
                visit(index, &mut decoded)?;
            } else {
                let mut plain = chained;
                visit(index, &mut plain)?;
            }
        }

        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(ScanError::MalformedArchive {
                details: format!(
                    "manifest references layer {} which is absent from the archive",
                    manifest.layers[missing].archive_path
                ),
            }
            .into());
        }
        Ok(())
    }

    fn open(&self) -> Result<File> {
        File::open(&self.path).map_err(|e| {
            ScanError::FileReadError {
                path: self.path.clone(),
                details: e.to_string(),
            }
            .into()
        })
    }

    fn malformed(&self, error: &dyn std::fmt::Display) -> anyhow::Error {
        ScanError::MalformedArchive {
            details: format!("{}: {}", self.path.display(), error),
        }
        .into()
    }
}

/// Normalized path of a tar member, `None` when it cannot be decoded.
fn entry_path<R: Read>(member: &tar::Entry<'_, R>) -> Option<String> {
    let raw = member.path_bytes();
    normalize_path(&String::from_utf8_lossy(&raw))
}

/// Fills as much of `buf` as the stream yields, tolerating short reads.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
