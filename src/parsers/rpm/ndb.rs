//! Sequential-record rpm package database reader (`Packages.db`).
//!
//! This newer database generation drops the page/bucket machinery: after
//! a small file header, package header blobs are laid out sequentially as
//! 16-byte-aligned records, each preceded by a record header carrying a
//! magic, the package index and the blob length. Recovery is a forward
//! scan over aligned record headers, which also survives slot-area
//! details this reader deliberately does not interpret.

use crate::shared::error::ScanError;
use crate::shared::Result;

/// File magic, "RpmP" as the first four bytes
const FILE_MAGIC: &[u8; 4] = b"RpmP";

/// Record header magic, "BlbS"
const BLOB_MAGIC: &[u8; 4] = b"BlbS";

/// Records are aligned to this boundary
const RECORD_ALIGNMENT: usize = 16;

/// Size of the fixed file header (magic, version, generation, slot count)
const FILE_HEADER_SIZE: usize = 16;

/// Size of a record header (magic, package index, generation, blob length)
const RECORD_HEADER_SIZE: usize = 16;

/// Upper bound on a single blob; a record claiming more is corrupt
const MAX_BLOB_LEN: usize = 256 * 1024 * 1024;

/// Sniffs the sequential-record database magic.
pub fn is_ndb(data: &[u8]) -> bool {
    data.len() >= FILE_HEADER_SIZE && &data[..4] == FILE_MAGIC
}

/// Scans the record area and returns every package header blob.
pub fn read_package_blobs(data: &[u8]) -> Result<Vec<Vec<u8>>> {
    if !is_ndb(data) {
        return Err(malformed("missing file magic"));
    }

    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version == 0 || version > 2 {
        return Err(malformed(&format!("unknown database version {}", version)));
    }

    let mut blobs = Vec::new();
    let mut offset = FILE_HEADER_SIZE;

    while offset + RECORD_HEADER_SIZE <= data.len() {
        if &data[offset..offset + 4] != BLOB_MAGIC {
            offset += RECORD_ALIGNMENT;
            continue;
        }

        let blob_len = u32::from_le_bytes([
            data[offset + 12],
            data[offset + 13],
            data[offset + 14],
            data[offset + 15],
        ]) as usize;
        if blob_len > MAX_BLOB_LEN {
            return Err(malformed("record length out of range"));
        }

        let blob_start = offset + RECORD_HEADER_SIZE;
        let blob_end = blob_start
            .checked_add(blob_len)
            .ok_or_else(|| malformed("record length overflow"))?;
        if blob_end > data.len() {
            return Err(malformed("record truncated at end of file"));
        }

        blobs.push(data[blob_start..blob_end].to_vec());

        // Next record starts at the following alignment boundary
        offset = blob_end.div_ceil(RECORD_ALIGNMENT) * RECORD_ALIGNMENT;
    }

    Ok(blobs)
}

fn malformed(details: &str) -> anyhow::Error {
    ScanError::UnsupportedDatabaseFormat {
        details: format!("ndb: {}", details),
    }
    .into()
}


#[cfg(test)]
mod tests {
    use super::tests_support::build_ndb;
    use super::*;

    #[test]
    fn test_magic_detection() {
        assert!(is_ndb(&build_ndb(&[])));
        assert!(!is_ndb(b"RpmQ\0\0\0\0\0\0\0\0\0\0\0\0"));
        assert!(!is_ndb(b"Rpm"));
    }

    #[test]
    fn test_reads_single_record() {
        let blob = b"header blob bytes".to_vec();
        let file = build_ndb(&[blob.clone()]);
        assert_eq!(read_package_blobs(&file).unwrap(), vec![blob]);
    }

    #[test]
    fn test_reads_multiple_records_with_alignment() {
        let blobs: Vec<Vec<u8>> = vec![
            b"a".to_vec(),
            b"a longer record crossing one alignment boundary".to_vec(),
            vec![0u8; 1000],
        ];
        let file = build_ndb(&blobs);
        assert_eq!(read_package_blobs(&file).unwrap(), blobs);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut file = build_ndb(&[]);
        file[4..8].copy_from_slice(&99u32.to_le_bytes());
        assert!(read_package_blobs(&file).is_err());
    }

    #[test]
    fn test_truncated_record_rejected() {
        let file = build_ndb(&[vec![0u8; 64]]);
        assert!(read_package_blobs(&file[..file.len() - 32]).is_err());
    }

    #[test]
    fn test_empty_database() {
        assert!(read_package_blobs(&build_ndb(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_slack_between_records_skipped() {
        // A zeroed gap between the header and the first record is walked
        // over by the aligned scan
        let blob = b"record".to_vec();
        let mut file = Vec::new();
        file.extend_from_slice(FILE_MAGIC);
        file.extend_from_slice(&1u32.to_le_bytes());
        file.extend_from_slice(&1u32.to_le_bytes());
        file.extend_from_slice(&1u32.to_le_bytes());
        file.extend_from_slice(&[0u8; 64]);
        file.extend_from_slice(BLOB_MAGIC);
        file.extend_from_slice(&1u32.to_le_bytes());
        file.extend_from_slice(&1u32.to_le_bytes());
        file.extend_from_slice(&(blob.len() as u32).to_le_bytes());
        file.extend_from_slice(&blob);
        assert_eq!(read_package_blobs(&file).unwrap(), vec![blob]);
    }
}
