//! rpm header blob decoding.
//!
//! A header blob is an index of typed, tag-numbered entries followed by a
//! data store: `il` (entry count) and `dl` (store size) as big-endian
//! u32, then `il` 16-byte entries `{tag, type, offset, count}`, then `dl`
//! bytes of data. Entry offsets point into the store. The well-known
//! numeric tags NAME, VERSION, RELEASE and ARCH are all that the
//! inventory needs.

use crate::image_analysis::domain::{Package, PackageManager};
use crate::shared::error::ScanError;
use crate::shared::Result;

const RPMTAG_NAME: u32 = 1000;
const RPMTAG_VERSION: u32 = 1001;
const RPMTAG_RELEASE: u32 = 1002;
const RPMTAG_ARCH: u32 = 1022;

const RPM_STRING_TYPE: u32 = 6;
const RPM_STRING_ARRAY_TYPE: u32 = 8;
const RPM_I18NSTRING_TYPE: u32 = 9;

/// Eight-byte header lead some blobs carry before the entry counts
const HEADER_MAGIC: [u8; 4] = [0x8e, 0xad, 0xe8, 0x01];

/// Sanity bounds on the declared entry count and store size; a blob
/// exceeding them is corrupt, not merely large
const MAX_ENTRIES: u32 = 65_536;
const MAX_STORE_SIZE: u32 = 256 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    tag: u32,
    typ: u32,
    offset: u32,
}

/// Decodes one header blob into a package record.
///
/// Returns `Ok(None)` when the blob is a well-formed header that does not
/// describe a package (no NAME tag); auxiliary rpmdb records look like
/// this.
///
/// # Errors
/// Fails with `UnsupportedDatabaseFormat` when the blob's structure is
/// inconsistent with the header encoding.
pub fn parse_header_blob(blob: &[u8]) -> Result<Option<Package>> {
    // Skip the optional 8-byte lead (magic + reserved)
    let blob = if blob.len() >= 8 && blob[..4] == HEADER_MAGIC {
        &blob[8..]
    } else {
        blob
    };

    if blob.len() < 8 {
        return Err(malformed("blob shorter than the entry counts"));
    }

    let il = read_u32_be(blob, 0);
    let dl = read_u32_be(blob, 4);
    if il == 0 || il > MAX_ENTRIES || dl > MAX_STORE_SIZE {
        return Err(malformed("entry count or store size out of range"));
    }

    let index_len = (il as usize) * 16;
    let store_start = 8 + index_len;
    let store_end = store_start
        .checked_add(dl as usize)
        .ok_or_else(|| malformed("store size overflow"))?;
    if blob.len() < store_end {
        return Err(malformed("blob truncated before the end of the store"));
    }
    let store = &blob[store_start..store_end];

    let mut name = None;
    let mut version = None;
    let mut release = None;
    let mut arch = None;

    for i in 0..il as usize {
        let base = 8 + i * 16;
        let entry = IndexEntry {
            tag: read_u32_be(blob, base),
            typ: read_u32_be(blob, base + 4),
            offset: read_u32_be(blob, base + 8),
        };

        let target = match entry.tag {
            RPMTAG_NAME => &mut name,
            RPMTAG_VERSION => &mut version,
            RPMTAG_RELEASE => &mut release,
            RPMTAG_ARCH => &mut arch,
            _ => continue,
        };
        *target = Some(read_string_entry(store, &entry)?);
    }

    let Some(name) = name else {
        return Ok(None);
    };

    // RELEASE is decoded for validation but the normalized version field
    // carries VERSION alone, matching what the upstream inventory emitted
    let _ = release;

    let pkg = Package::new(
        &name,
        version.as_deref().unwrap_or(""),
        arch.as_deref().unwrap_or(""),
        PackageManager::Rpm,
    )?;
    Ok(Some(pkg))
}

/// Reads the (first) NUL-terminated string of a string-typed entry.
fn read_string_entry(store: &[u8], entry: &IndexEntry) -> Result<String> {
    match entry.typ {
        RPM_STRING_TYPE | RPM_STRING_ARRAY_TYPE | RPM_I18NSTRING_TYPE => {}
        other => {
            return Err(malformed(&format!(
                "tag {} has non-string type {}",
                entry.tag, other
            )));
        }
    }

    let offset = entry.offset as usize;
    if offset >= store.len() {
        return Err(malformed("string entry offset beyond the store"));
    }

    let tail = &store[offset..];
    let end = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| malformed("unterminated string in store"))?;

    Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
}

fn read_u32_be(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn malformed(details: &str) -> anyhow::Error {
    ScanError::UnsupportedDatabaseFormat {
        details: format!("rpm header: {}", details),
    }
    .into()
}
