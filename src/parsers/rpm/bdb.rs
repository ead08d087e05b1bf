//! Minimal BerkeleyDB hash database reader.
//!
//! The classic rpm `Packages` file is a BerkeleyDB hash database: a meta
//! page declaring the page size and last page number, then fixed-size
//! pages. Hash pages carry a descending offset index of items; key and
//! value items alternate (even index = key, odd = value). Values are the
//! rpm header blobs, stored either inline (`H_KEYDATA`) or on a chain of
//! overflow pages (`H_OFFPAGE`). Only as much of the format as package
//! discovery needs is implemented; anything structurally off fails with
//! `UnsupportedDatabaseFormat`.

use crate::shared::error::ScanError;
use crate::shared::Result;

/// Hash database magic, at byte offset 12 of the meta page
const HASH_MAGIC: u32 = 0x0006_1561;

/// Page types (byte offset 25 of each page)
const P_OVERFLOW: u8 = 7;
const P_HASH_UNSORTED: u8 = 2;
const P_HASH: u8 = 13;

/// Hash item types (first byte of an item)
const H_KEYDATA: u8 = 1;
const H_OFFPAGE: u8 = 3;

/// Size of the common page header
const PAGE_HEADER_SIZE: usize = 26;

/// Byte order of the database file; BerkeleyDB writes native-endian and
/// flags it through the magic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

impl Endian {
    fn read_u32(self, data: &[u8], offset: usize) -> u32 {
        let bytes = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        match self {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        }
    }

    fn read_u16(self, data: &[u8], offset: usize) -> u16 {
        let bytes = [data[offset], data[offset + 1]];
        match self {
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        }
    }
}

/// Sniffs the hash database magic in either byte order.
pub fn is_bdb_hash(data: &[u8]) -> bool {
    detect_endian(data).is_some()
}

fn detect_endian(data: &[u8]) -> Option<Endian> {
    if data.len() < 16 {
        return None;
    }
    if Endian::Little.read_u32(data, 12) == HASH_MAGIC {
        Some(Endian::Little)
    } else if Endian::Big.read_u32(data, 12) == HASH_MAGIC {
        Some(Endian::Big)
    } else {
        None
    }
}

/// Extracts every value blob from the hash pages of the database.
pub fn read_package_blobs(data: &[u8]) -> Result<Vec<Vec<u8>>> {
    let endian = detect_endian(data)
        .ok_or_else(|| malformed("missing hash database magic"))?;

    if data.len() < 40 {
        return Err(malformed("meta page truncated"));
    }
    let pagesize = endian.read_u32(data, 20) as usize;
    if !(512..=65536).contains(&pagesize) || !pagesize.is_power_of_two() {
        return Err(malformed("implausible page size"));
    }
    let last_pgno = endian.read_u32(data, 32) as usize;
    let available_pages = data.len() / pagesize;
    if available_pages == 0 {
        return Err(malformed("file smaller than one page"));
    }
    // Tolerate a truncated trailing page but not a wildly wrong meta page
    let page_count = last_pgno.saturating_add(1).min(available_pages);

    let mut blobs = Vec::new();

    for pgno in 1..page_count {
        let page = &data[pgno * pagesize..(pgno + 1) * pagesize];
        let page_type = page[25];
        if page_type != P_HASH && page_type != P_HASH_UNSORTED {
            continue;
        }

        let entries = endian.read_u16(page, 20) as usize;
        for index in 0..entries {
            // Odd indexes are data items; even ones are their keys
            if index % 2 == 0 {
                continue;
            }
            let blob = read_item(data, page, pagesize, endian, entries, index)?;
            if let Some(blob) = blob {
                blobs.push(blob);
            }
        }
    }

    Ok(blobs)
}

/// Reads the item at `index` of a hash page, following an overflow chain
/// when the value is stored off-page. Item length is derived from the
/// descending offset index: item `i` ends where item `i-1` begins (or at
/// the page end for the first item).
fn read_item(
    data: &[u8],
    page: &[u8],
    pagesize: usize,
    endian: Endian,
    entries: usize,
    index: usize,
) -> Result<Option<Vec<u8>>> {
    let inp_base = PAGE_HEADER_SIZE;
    if inp_base + entries * 2 > pagesize {
        return Err(malformed("entry index overruns the page"));
    }

    let offset = endian.read_u16(page, inp_base + index * 2) as usize;
    let prev_end = if index == 0 {
        pagesize
    } else {
        endian.read_u16(page, inp_base + (index - 1) * 2) as usize
    };
    if offset >= prev_end || prev_end > pagesize {
        return Err(malformed("item offsets out of order"));
    }

    let item = &page[offset..prev_end];
    match item[0] {
        H_KEYDATA => Ok(Some(item[1..].to_vec())),
        H_OFFPAGE => {
            if item.len() < 12 {
                return Err(malformed("off-page reference truncated"));
            }
            let pgno = endian.read_u32(item, 4) as usize;
            let total_len = endian.read_u32(item, 8) as usize;
            read_overflow_chain(data, pagesize, endian, pgno, total_len).map(Some)
        }
        // Duplicate sets and other item types never hold package headers
        _ => Ok(None),
    }
}

/// Follows `next_pgno` links through overflow pages, concatenating their
/// payloads until `total_len` bytes are collected. A chain that revisits
/// a page can never complete and is rejected.
fn read_overflow_chain(
    data: &[u8],
    pagesize: usize,
    endian: Endian,
    first_pgno: usize,
    total_len: usize,
) -> Result<Vec<u8>> {
    let mut blob = Vec::with_capacity(total_len);
    let mut pgno = first_pgno;
    let max_pages = data.len() / pagesize;
    let mut visited = vec![false; max_pages];

    while blob.len() < total_len {
        if pgno == 0 || pgno >= max_pages {
            return Err(malformed("overflow chain points outside the file"));
        }
        if visited[pgno] {
            return Err(malformed("overflow chain loops"));
        }
        visited[pgno] = true;
        let page = &data[pgno * pagesize..(pgno + 1) * pagesize];
        if page[25] != P_OVERFLOW {
            return Err(malformed("overflow chain reached a non-overflow page"));
        }

        let used = endian.read_u16(page, 22) as usize;
        if PAGE_HEADER_SIZE + used > pagesize {
            return Err(malformed("overflow page payload overruns the page"));
        }
        let take = used.min(total_len - blob.len());
        blob.extend_from_slice(&page[PAGE_HEADER_SIZE..PAGE_HEADER_SIZE + take]);

        pgno = endian.read_u32(page, 16) as usize;
        if pgno == 0 && blob.len() < total_len {
            return Err(malformed("overflow chain ended early"));
        }
    }

    Ok(blob)
}

fn malformed(details: &str) -> anyhow::Error {
    ScanError::UnsupportedDatabaseFormat {
        details: format!("bdb: {}", details),
    }
    .into()
}
