use std::io::Read;

use crate::image_analysis::domain::{classify_whiteout, normalize_path, FileEntry};
use crate::shared::error::ScanError;
use crate::shared::Result;

/// Largest control file the filter will materialize (a full rpm Packages
/// database on a large image runs to a couple hundred MB)
const MAX_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// What a path rule is for; new package managers or identity formats are
/// added here without touching merge or parse logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulePurpose {
    OsIdentity,
    Dpkg,
    Apk,
    Rpm,
}

/// A single declarative path rule.
#[derive(Debug)]
enum PathRule {
    Exact(&'static str),
    /// Directory prefix; matches any file below it
    Prefix(&'static str),
    /// Directory prefix plus file-name suffix, no deeper nesting
    PrefixSuffix(&'static str, &'static str),
}

impl PathRule {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathRule::Exact(exact) => path == *exact,
            PathRule::Prefix(prefix) => path.starts_with(prefix) && path.len() > prefix.len(),
            PathRule::PrefixSuffix(prefix, suffix) => path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.ends_with(suffix) && !rest.contains('/')),
        }
    }
}

/// The static rule table: every path the scan can ever need, tried
/// unconditionally for every layer since the package manager is not yet
/// known at filter time.
const RULES: &[(PathRule, RulePurpose)] = &[
    (PathRule::Exact("etc/os-release"), RulePurpose::OsIdentity),
    (PathRule::Exact("usr/lib/os-release"), RulePurpose::OsIdentity),
    (PathRule::PrefixSuffix("etc/", "-release"), RulePurpose::OsIdentity),
    (PathRule::Exact("etc/issue"), RulePurpose::OsIdentity),
    (PathRule::Exact("etc/debian_version"), RulePurpose::OsIdentity),
    (PathRule::Exact("var/lib/dpkg/status"), RulePurpose::Dpkg),
    (
        PathRule::PrefixSuffix("var/lib/apt/lists/", "_Packages"),
        RulePurpose::Dpkg,
    ),
    (PathRule::Exact("lib/apk/db/installed"), RulePurpose::Apk),
    (PathRule::Prefix("var/lib/rpm/"), RulePurpose::Rpm),
    (PathRule::Prefix("usr/lib/sysimage/rpm/"), RulePurpose::Rpm),
];

/// Entries surviving the filter, plus rule-matched paths skipped for
/// exceeding the size cap. Skips surface as diagnostics in the report
/// so a database never silently vanishes from the inventory.
#[derive(Debug, Default)]
pub struct FilteredLayer {
    pub entries: Vec<FileEntry>,
    pub oversized: Vec<String>,
}

/// Selects, per layer, only the files relevant to OS identification and
/// package-manager state.
///
/// This bounds per-layer memory to the union of small control files
/// rather than the full layer content, which may be arbitrarily large.
/// Whiteout and opaque-directory markers always pass through, whether or
/// not the deleted path matches a rule: merge correctness depends on
/// knowing what was removed.
pub struct LayerFilter;

impl LayerFilter {
    /// Returns the purpose of the first rule matching a normalized path.
    pub fn rule_for(path: &str) -> Option<RulePurpose> {
        RULES
            .iter()
            .find(|(rule, _)| rule.matches(path))
            .map(|(_, purpose)| *purpose)
    }

    /// Streams one layer's tar content, emitting the filtered entries.
    pub fn filter_layer<R: Read>(reader: R, layer_index: usize) -> Result<FilteredLayer> {
        Self::filter_layer_with_cap(reader, layer_index, MAX_FILE_SIZE)
    }

    fn filter_layer_with_cap<R: Read>(
        reader: R,
        layer_index: usize,
        size_cap: u64,
    ) -> Result<FilteredLayer> {
        let mut archive = tar::Archive::new(reader);
        let mut filtered = FilteredLayer::default();

        let members = archive.entries().map_err(|e| ScanError::MalformedArchive {
            details: format!("layer {} is not a tar stream: {}", layer_index, e),
        })?;

        for member in members {
            let mut member = member.map_err(|e| ScanError::MalformedArchive {
                details: format!("layer {} entry unreadable: {}", layer_index, e),
            })?;

            let raw_path = member.path_bytes();
            let raw_path = String::from_utf8_lossy(&raw_path).into_owned();
            let Some(path) = normalize_path(&raw_path) else {
                continue;
            };
            if path.is_empty() {
                continue;
            }

            // Deletion information is never discarded by filtering
            if let Some(marker) = classify_whiteout(&path, layer_index) {
                filtered.entries.push(marker);
                continue;
            }

            let header_type = member.header().entry_type();
            if header_type.is_dir() {
                if Self::rule_for(&path).is_some() {
                    filtered.entries.push(FileEntry::directory(path, layer_index));
                }
                continue;
            }
            if !header_type.is_file() {
                continue;
            }
            if Self::rule_for(&path).is_none() {
                continue;
            }

            let size = member.header().size().unwrap_or(0);
            if size > size_cap {
                filtered.oversized.push(path);
                continue;
            }

            let mut content = Vec::with_capacity(size as usize);
            member
                .read_to_end(&mut content)
                .map_err(|e| ScanError::MalformedArchive {
                    details: format!("layer {} file {} unreadable: {}", layer_index, path, e),
                })?;
            filtered.entries.push(FileEntry::regular(path, content, layer_index));
        }

        Ok(filtered)
    }
}
