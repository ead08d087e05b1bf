use serde::Serialize;
use std::collections::HashSet;

use super::{OsIdentity, Package};

/// Non-fatal condition encountered during a scan.
///
/// Diagnostics are carried in the output document rather than only logged:
/// the caller is typically unattended automation, and a scan that reports
/// "packages identified, some CVEs unknown" is strictly more useful than
/// no output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No supported package manager state file was found in the image
    NoPackageManagerDetected,
    /// A package database was present but its container format was not
    /// recognized (e.g. an rpm database generation we do not decode)
    UnsupportedDatabaseFormat { details: String },
    /// A correlation batch exhausted its retries; the named subjects have
    /// no vulnerability data in this report
    VulnerabilityLookupFailed { subjects: Vec<String> },
    /// The scan deadline expired during correlation; results are partial
    Timeout,
}

/// The normalized OS-identity + package-list document produced by the
/// inventory stage.
///
/// This is the sole artifact crossing the boundary to the correlator and
/// to the JSON writer. Packages are deduplicated on their normalized
/// `(name, version, architecture)` tuple and sorted, so serializing the
/// same archive twice yields byte-identical output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub os: OsIdentity,
    pub packages: Vec<Package>,
}

impl Inventory {
    pub fn new(os: OsIdentity, packages: Vec<Package>) -> Self {
        let mut seen: HashSet<(String, String, String)> = HashSet::new();
        let mut unique: Vec<Package> = Vec::with_capacity(packages.len());
        for pkg in packages {
            let key = (
                pkg.name().to_string(),
                pkg.version().to_string(),
                pkg.architecture().to_string(),
            );
            if seen.insert(key) {
                unique.push(pkg);
            }
        }
        unique.sort_by(|a, b| a.identity().cmp(&b.identity()));

        Self { os, packages: unique }
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Distinct package names, in sorted order, for correlation batching
    pub fn distinct_package_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .packages
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        names.dedup();
        names
    }
}
