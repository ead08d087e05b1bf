/// AUFS whiteout file prefix used in saved-image layers
pub const WHITEOUT_PREFIX: &str = ".wh.";

/// Marker file name signaling that the containing directory hides all
/// content contributed by earlier layers
pub const OPAQUE_MARKER: &str = ".wh..wh..opq";

/// Kind of a filtered layer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    /// Deletion marker for a sibling path in earlier layers
    Whiteout,
    /// Opaque-directory marker: hides every earlier path under its directory
    OpaqueWhiteout,
}

/// One file surviving the layer filter, with enough context for the merge.
///
/// The path is normalized before construction (see [`normalize_path`]) so
/// that entries from different layers compare equal when they refer to the
/// same location. For whiteout kinds, `path` is the path being deleted (or
/// the directory being made opaque), not the marker file itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub kind: FileKind,
    /// Raw content for regular files; `None` for directories and markers
    pub content: Option<Vec<u8>>,
    /// Index of the layer this entry came from, in manifest chain order
    pub source_layer: usize,
}

impl FileEntry {
    pub fn regular(path: String, content: Vec<u8>, source_layer: usize) -> Self {
        Self {
            path,
            kind: FileKind::Regular,
            content: Some(content),
            source_layer,
        }
    }

    pub fn directory(path: String, source_layer: usize) -> Self {
        Self {
            path,
            kind: FileKind::Directory,
            content: None,
            source_layer,
        }
    }

    pub fn whiteout(deleted_path: String, source_layer: usize) -> Self {
        Self {
            path: deleted_path,
            kind: FileKind::Whiteout,
            content: None,
            source_layer,
        }
    }

    pub fn opaque(dir_path: String, source_layer: usize) -> Self {
        Self {
            path: dir_path,
            kind: FileKind::OpaqueWhiteout,
            content: None,
            source_layer,
        }
    }

    /// Content decoded as UTF-8 with invalid sequences replaced.
    ///
    /// Package state files are nominally text but occasionally carry stray
    /// bytes; lossy decoding mirrors how the package managers themselves
    /// read them.
    pub fn content_as_text(&self) -> Option<String> {
        self.content
            .as_ref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Normalizes a tar member path for merge comparison.
///
/// Strips a leading `./` or `/`, drops `.` segments and resolves `..`
/// segments so that `usr/lib/../lib/os-release` and `./usr/lib/os-release`
/// compare equal. Returns `None` for paths that escape the filesystem root
/// (more `..` segments than parents), which a well-formed layer never
/// contains.
pub fn normalize_path(raw: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// Interprets a normalized layer path as a whiteout or opaque marker.
///
/// Returns the entry to feed into the merge: the deleted sibling path for
/// `.wh.<name>` files, the directory path for `.wh..wh..opq` markers, or
/// `None` when the path is not a marker at all.
pub fn classify_whiteout(path: &str, source_layer: usize) -> Option<FileEntry> {
    let (dir, file_name) = match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    };

    if file_name == OPAQUE_MARKER {
        return Some(FileEntry::opaque(dir.to_string(), source_layer));
    }

    if let Some(deleted) = file_name.strip_prefix(WHITEOUT_PREFIX) {
        let deleted_path = if dir.is_empty() {
            deleted.to_string()
        } else {
            format!("{}/{}", dir, deleted)
        };
        return Some(FileEntry::whiteout(deleted_path, source_layer));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_strips_leading_dot_slash() {
        assert_eq!(
            normalize_path("./etc/os-release"),
            Some("etc/os-release".to_string())
        );
    }

    #[test]
    fn test_normalize_path_strips_leading_slash() {
        assert_eq!(
            normalize_path("/var/lib/dpkg/status"),
            Some("var/lib/dpkg/status".to_string())
        );
    }

    #[test]
    fn test_normalize_path_resolves_dotdot() {
        assert_eq!(
            normalize_path("usr/lib/../lib/os-release"),
            Some("usr/lib/os-release".to_string())
        );
    }

    #[test]
    fn test_normalize_path_rejects_escape() {
        assert_eq!(normalize_path("../../etc/passwd"), None);
    }

    #[test]
    fn test_classify_whiteout_file() {
        let entry = classify_whiteout("etc/.wh.hostname", 2).unwrap();
        assert_eq!(entry.kind, FileKind::Whiteout);
        assert_eq!(entry.path, "etc/hostname");
        assert_eq!(entry.source_layer, 2);
    }

    #[test]
    fn test_classify_whiteout_at_root() {
        let entry = classify_whiteout(".wh.somefile", 0).unwrap();
        assert_eq!(entry.kind, FileKind::Whiteout);
        assert_eq!(entry.path, "somefile");
    }

    #[test]
    fn test_classify_opaque_marker() {
        let entry = classify_whiteout("var/lib/dpkg/.wh..wh..opq", 1).unwrap();
        assert_eq!(entry.kind, FileKind::OpaqueWhiteout);
        assert_eq!(entry.path, "var/lib/dpkg");
    }

    #[test]
    fn test_classify_regular_path_is_not_a_marker() {
        assert!(classify_whiteout("etc/os-release", 0).is_none());
        // ".wh." must be a file-name prefix, not an infix
        assert!(classify_whiteout("etc/file.wh.bak", 0).is_none());
    }

    #[test]
    fn test_content_as_text_lossy() {
        let entry = FileEntry::regular("f".to_string(), vec![0x61, 0xff, 0x62], 0);
        assert_eq!(entry.content_as_text().unwrap(), "a\u{fffd}b");
    }
}
