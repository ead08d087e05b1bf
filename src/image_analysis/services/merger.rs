use std::collections::BTreeMap;

use crate::image_analysis::domain::{FileEntry, FileKind};

/// The effective top-level filesystem view after folding all layers.
///
/// Maps normalized path → surviving entry. Built solely by
/// [`FilesystemMerger`]; downstream detectors consume it read-only.
#[derive(Debug, Default)]
pub struct EffectiveFilesystemView {
    entries: BTreeMap<String, FileEntry>,
}

impl EffectiveFilesystemView {
    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries whose path starts with the given directory prefix
    pub fn under_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a FileEntry)> {
        self.entries
            .iter()
            .filter(move |(path, _)| is_under(path, prefix))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Returns true if `path` equals `prefix` or lies under it as a directory.
/// Plain prefix comparison would wrongly match `usr/libexec` for `usr/lib`.
fn is_under(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Folds filtered per-layer file sets into one effective view.
///
/// Layers are applied oldest→newest, mirroring what reading the final
/// state of a real layered mount would produce, without materializing any
/// file content for paths the filter did not capture:
///
/// - regular/directory entries insert or replace by normalized path;
/// - a whiteout deletes the path and, when it names a directory, every
///   accumulated path beneath it (a no-op when absent, since the filter
///   may not have captured the deleted file in the first place);
/// - an opaque-directory marker removes every accumulated path under the
///   directory before the current layer's own entries for it apply.
///
/// The fold is deliberately single-threaded: the overwrite/whiteout
/// invariant only holds when entries are applied in chain order.
pub struct FilesystemMerger;

impl FilesystemMerger {
    /// Merges per-layer entry sets, ordered root-most layer first.
    ///
    /// Within one layer, markers are applied before content entries so
    /// that a layer may both hide a directory's prior contents and
    /// repopulate it.
    pub fn merge(layers: Vec<Vec<FileEntry>>) -> EffectiveFilesystemView {
        let mut view = EffectiveFilesystemView::default();

        for layer in layers {
            let (markers, contents): (Vec<FileEntry>, Vec<FileEntry>) = layer
                .into_iter()
                .partition(|e| matches!(e.kind, FileKind::Whiteout | FileKind::OpaqueWhiteout));

            for marker in markers {
                match marker.kind {
                    // A whiteout may name a directory, hiding everything
                    // beneath it along with the path itself
                    FileKind::Whiteout => {
                        let target = marker.path.clone();
                        view.entries.retain(|path, _| !is_under(path, &target));
                    }
                    FileKind::OpaqueWhiteout => {
                        let prefix = marker.path.clone();
                        view.entries.retain(|path, _| !is_under(path, &prefix));
                    }
                    _ => unreachable!(),
                }
            }

            for entry in contents {
                view.entries.insert(entry.path.clone(), entry);
            }
        }

        view
    }
}
