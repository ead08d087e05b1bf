//! Builders for synthetic saved-image archives.

#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

/// Appends a regular file entry to a tar builder.
pub fn append_file(builder: &mut tar::Builder<Vec<u8>>, path: &str, content: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, path, content).unwrap();
}

/// Builds an inner layer tar from (path, content) pairs.
pub fn layer_tar(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, content) in files {
        append_file(&mut builder, path, content);
    }
    builder.into_inner().unwrap()
}

/// Gzips a byte stream the way compressed layers are stored.
pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Writes a complete saved-image archive to a temp file.
///
/// `layers` maps archive-internal paths (e.g. "aa/layer.tar") to layer
/// tar bytes; `manifest_json` is stored as `manifest.json`.
pub fn write_image(manifest_json: &str, layers: &[(&str, &[u8])]) -> NamedTempFile {
    let mut builder = tar::Builder::new(Vec::new());
    append_file(&mut builder, "manifest.json", manifest_json.as_bytes());
    for (path, content) in layers {
        append_file(&mut builder, path, content);
    }
    let bytes = builder.into_inner().unwrap();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();
    file
}

/// A ready-made single-layer alpine-style image with two apk packages.
pub fn alpine_image() -> NamedTempFile {
    let layer = layer_tar(&[
        ("etc/os-release", b"ID=alpine\nVERSION_ID=3.14.2\n"),
        (
            "lib/apk/db/installed",
            b"P:musl\nV:1.2.2-r3\nA:x86_64\n\nP:busybox\nV:1.33.1-r3\nA:x86_64\n",
        ),
    ]);
    write_image(
        r#"[{"Config": "c.json", "RepoTags": ["alpine:3.14"], "Layers": ["aa/layer.tar"]}]"#,
        &[("aa/layer.tar", &layer)],
    )
}
