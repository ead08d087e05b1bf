//! Self-contained rpm database decoder.
//!
//! The rpm database is a binary key-value store of serialized package
//! header records. Decoding it directly (instead of shelling out to a
//! host `rpm` binary) keeps the scan portable across hosts that may not
//! have a compatible rpm installed, and makes results deterministic.
//!
//! Two container generations are supported:
//! - the BerkeleyDB hash database (`Packages`, see [`bdb`]): fixed-size
//!   pages with an entry index and overflow chains;
//! - the sequential-record package database (`Packages.db`, see [`ndb`]):
//!   a file magic followed by length-prefixed, aligned blob records.
//!
//! Unrecognized container headers (for example a SQLite-generation
//! database) fail with `UnsupportedDatabaseFormat` rather than guessing.

mod bdb;
mod header;
mod ndb;

use crate::image_analysis::domain::{Package, PackageManager};
use crate::image_analysis::services::EffectiveFilesystemView;
use crate::parsers::PackageListParser;
use crate::shared::error::ScanError;
use crate::shared::Result;

pub use header::parse_header_blob;

/// Candidate rpm database locations, preferred generation first per root
const RPM_DB_PATHS: [&str; 4] = [
    "var/lib/rpm/Packages.db",
    "var/lib/rpm/Packages",
    "usr/lib/sysimage/rpm/Packages.db",
    "usr/lib/sysimage/rpm/Packages",
];

/// SQLite database file magic; a known rpm database generation we do not
/// decode, reported distinctly from arbitrary garbage
const SQLITE_MAGIC: &[u8] = b"SQLite format 3\0";

/// Parser for the rpm package database.
pub struct RpmParser;

impl PackageListParser for RpmParser {
    fn manager(&self) -> PackageManager {
        PackageManager::Rpm
    }

    fn is_present(&self, view: &EffectiveFilesystemView) -> bool {
        RPM_DB_PATHS.iter().any(|path| view.contains(path))
    }

    fn parse(&self, view: &EffectiveFilesystemView) -> Result<Vec<Package>> {
        let mut packages = Vec::new();
        let mut first_error: Option<anyhow::Error> = None;

        for path in RPM_DB_PATHS {
            let Some(entry) = view.get(path) else {
                continue;
            };
            let Some(data) = entry.content.as_deref() else {
                continue;
            };

            match decode_database(data) {
                Ok(decoded) => packages.extend(decoded),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if packages.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        Ok(packages)
    }
}

/// Dispatches on the container magic and decodes every header blob.
fn decode_database(data: &[u8]) -> Result<Vec<Package>> {
    if data.starts_with(SQLITE_MAGIC) {
        return Err(ScanError::UnsupportedDatabaseFormat {
            details: "SQLite-generation rpm database is not supported".to_string(),
        }
        .into());
    }

    let blobs = if ndb::is_ndb(data) {
        ndb::read_package_blobs(data)?
    } else if bdb::is_bdb_hash(data) {
        bdb::read_package_blobs(data)?
    } else {
        return Err(ScanError::UnsupportedDatabaseFormat {
            details: "unrecognized rpm database container header".to_string(),
        }
        .into());
    };

    let mut packages = Vec::new();
    for blob in &blobs {
        // A blob that fails header decoding is skipped rather than failing
        // the database: rpmdb files carry auxiliary records too
        if let Ok(Some(pkg)) = parse_header_blob(blob) {
            packages.push(pkg);
        }
    }

    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_analysis::domain::FileEntry;
    use crate::image_analysis::services::FilesystemMerger;
    use super::header::tests_support::build_header_blob;

    fn view_with(path: &str, data: Vec<u8>) -> EffectiveFilesystemView {
        FilesystemMerger::merge(vec![vec![FileEntry::regular(path.to_string(), data, 0)]])
    }

    #[test]
    fn test_sqlite_database_unsupported() {
        let mut data = SQLITE_MAGIC.to_vec();
        data.extend_from_slice(&[0u8; 100]);
        let view = view_with("var/lib/rpm/Packages", data);
        let err = RpmParser.parse(&view).unwrap_err();
        assert!(err.to_string().contains("SQLite"));
    }

    #[test]
    fn test_garbage_database_unsupported() {
        let view = view_with("var/lib/rpm/Packages", vec![0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 0]);
        let err = RpmParser.parse(&view).unwrap_err();
        assert!(err.to_string().contains("unrecognized"));
    }

    #[test]
    fn test_ndb_database_round_trip() {
        let blob = build_header_blob("foo", "1.2", "9", "amd64");
        let data = ndb::tests_support::build_ndb(&[blob]);
        let view = view_with("var/lib/rpm/Packages.db", data);

        let packages = RpmParser.parse(&view).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name(), "foo");
        assert_eq!(packages[0].version(), "1.2");
        assert_eq!(packages[0].architecture(), "amd64");
        assert_eq!(packages[0].manager(), PackageManager::Rpm);
    }

    #[test]
    fn test_bdb_database_round_trip() {
        let blob = build_header_blob("foo", "1.2", "9", "amd64");
        let data = bdb::tests_support::build_bdb_hash(&[blob]);
        let view = view_with("var/lib/rpm/Packages", data);

        let packages = RpmParser.parse(&view).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name(), "foo");
        assert_eq!(packages[0].version(), "1.2");
        assert_eq!(packages[0].architecture(), "amd64");
    }

    #[test]
    fn test_sysimage_path_also_detected() {
        let blob = build_header_blob("bash", "5.2.15", "3", "x86_64");
        let data = ndb::tests_support::build_ndb(&[blob]);
        let view = view_with("usr/lib/sysimage/rpm/Packages.db", data);

        assert!(RpmParser.is_present(&view));
        let packages = RpmParser.parse(&view).unwrap();
        assert_eq!(packages[0].name(), "bash");
    }

    #[test]
    fn test_not_present_in_empty_view() {
        let view = FilesystemMerger::merge(vec![]);
        assert!(!RpmParser.is_present(&view));
    }
}
