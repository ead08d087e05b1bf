use std::collections::HashMap;

use crate::image_analysis::domain::{Package, PackageManager};
use crate::image_analysis::services::EffectiveFilesystemView;
use crate::parsers::PackageListParser;
use crate::shared::Result;

/// dpkg installed-package state file
pub const DPKG_STATUS_PATH: &str = "var/lib/dpkg/status";

/// Directory of downloaded apt package indexes
const APT_LISTS_PREFIX: &str = "var/lib/apt/lists";

/// Parser for the dpkg/apt status format.
///
/// The status file is a sequence of paragraphs separated by blank lines,
/// each paragraph a set of `Field: value` lines. Lines beginning with
/// whitespace continue the previous field's value. A paragraph yields a
/// package iff it has both `Package` and `Version` and its `Status` field
/// reports the package as actually installed - paragraphs for removed
/// packages whose config files remain ("deinstall ok config-files") stay
/// in the status file and must not be inventoried.
///
/// Apt list indexes (`var/lib/apt/lists/*_Packages`) use the same
/// paragraph syntax without a `Status` field and are parsed as well.
pub struct DpkgParser;

impl PackageListParser for DpkgParser {
    fn manager(&self) -> PackageManager {
        PackageManager::Dpkg
    }

    fn is_present(&self, view: &EffectiveFilesystemView) -> bool {
        view.contains(DPKG_STATUS_PATH)
    }

    fn parse(&self, view: &EffectiveFilesystemView) -> Result<Vec<Package>> {
        let mut packages = Vec::new();

        if let Some(entry) = view.get(DPKG_STATUS_PATH) {
            if let Some(text) = entry.content_as_text() {
                packages.extend(parse_paragraphs(&text, true)?);
            }
        }

        for (path, entry) in view.under_prefix(APT_LISTS_PREFIX) {
            if !path.ends_with("_Packages") {
                continue;
            }
            if let Some(text) = entry.content_as_text() {
                packages.extend(parse_paragraphs(&text, false)?);
            }
        }

        Ok(packages)
    }
}

/// Parses a sequence of RFC-822-style paragraphs into packages.
///
/// `require_installed_status` distinguishes the status file (which tracks
/// removal states) from apt list indexes (which only describe available
/// packages and carry no `Status` field).
fn parse_paragraphs(content: &str, require_installed_status: bool) -> Result<Vec<Package>> {
    let mut packages = Vec::new();

    for paragraph in content.split("\n\n") {
        if paragraph.trim().is_empty() {
            continue;
        }

        let fields = parse_fields(paragraph);

        let (Some(name), Some(version)) = (fields.get("Package"), fields.get("Version")) else {
            continue;
        };

        if require_installed_status && !status_is_installed(fields.get("Status")) {
            continue;
        }

        let architecture = fields.get("Architecture").map(String::as_str).unwrap_or("");
        if let Ok(pkg) = Package::new(name, version, architecture, PackageManager::Dpkg) {
            packages.push(pkg);
        }
    }

    Ok(packages)
}

/// Folds `Field: value` lines into a map, joining continuation lines
/// (those beginning with whitespace) onto the previous field's value.
fn parse_fields(paragraph: &str) -> HashMap<String, String> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut current_field: Option<String> = None;

    for line in paragraph.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(field) = &current_field {
                if let Some(value) = fields.get_mut(field) {
                    value.push('\n');
                    value.push_str(line.trim_start());
                }
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_string();
        fields.insert(key.clone(), value.trim().to_string());
        current_field = Some(key);
    }

    fields
}

/// The dpkg `Status` field is "<want> <flag> <state>"; a package is
/// installed iff the state component is `installed`.
fn status_is_installed(status: Option<&String>) -> bool {
    let Some(status) = status else {
        return false;
    };
    status
        .split_whitespace()
        .nth(2)
        .is_some_and(|state| state == "installed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_analysis::domain::FileEntry;
    use crate::image_analysis::services::FilesystemMerger;

    const STATUS_CONTENT: &str = "\
Package: curl
Status: install ok installed
Version: 7.74.0-1.3+deb11u7
Architecture: amd64
Description: command line tool for transferring data
 with URL syntax, supporting HTTP, HTTPS, FTP and more.

Package: old-tool
Status: deinstall ok config-files
Version: 1.0-1
Architecture: amd64

Package: libssl1.1
Status: install ok installed
Version: 1.1.1n-0+deb11u5
Architecture: amd64
";

    fn status_view(content: &str) -> EffectiveFilesystemView {
        FilesystemMerger::merge(vec![vec![FileEntry::regular(
            DPKG_STATUS_PATH.to_string(),
            content.as_bytes().to_vec(),
            0,
        )]])
    }

    #[test]
    fn test_parse_installed_packages() {
        let view = status_view(STATUS_CONTENT);
        let packages = DpkgParser.parse(&view).unwrap();
        let names: Vec<&str> = packages.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["curl", "libssl1.1"]);
        assert_eq!(packages[0].version(), "7.74.0-1.3+deb11u7");
        assert_eq!(packages[0].architecture(), "amd64");
    }

    #[test]
    fn test_deinstalled_package_not_yielded() {
        let view = status_view(STATUS_CONTENT);
        let packages = DpkgParser.parse(&view).unwrap();
        assert!(!packages.iter().any(|p| p.name() == "old-tool"));
    }

    #[test]
    fn test_half_installed_state_not_yielded() {
        let view = status_view(
            "Package: broken\nStatus: install reinstreq half-installed\nVersion: 1.0\n",
        );
        assert!(DpkgParser.parse(&view).unwrap().is_empty());
    }

    #[test]
    fn test_paragraph_without_version_skipped() {
        let view = status_view("Package: incomplete\nStatus: install ok installed\n");
        assert!(DpkgParser.parse(&view).unwrap().is_empty());
    }

    #[test]
    fn test_continuation_lines_fold_into_previous_field() {
        let fields = parse_fields(
            "Package: curl\nDescription: first line\n continued line\n\tanother continuation",
        );
        let desc = fields.get("Description").unwrap();
        assert!(desc.contains("first line"));
        assert!(desc.contains("continued line"));
        assert!(desc.contains("another continuation"));
    }

    #[test]
    fn test_apt_list_index_parsed_without_status() {
        let list_content = "Package: nginx\nVersion: 1.18.0-6.1\nArchitecture: amd64\n";
        let view = FilesystemMerger::merge(vec![vec![
            FileEntry::regular(
                DPKG_STATUS_PATH.to_string(),
                STATUS_CONTENT.as_bytes().to_vec(),
                0,
            ),
            FileEntry::regular(
                "var/lib/apt/lists/deb.debian.org_debian_dists_bullseye_main_binary-amd64_Packages"
                    .to_string(),
                list_content.as_bytes().to_vec(),
                0,
            ),
        ]]);
        let packages = DpkgParser.parse(&view).unwrap();
        assert!(packages.iter().any(|p| p.name() == "nginx"));
    }

    #[test]
    fn test_is_present() {
        assert!(DpkgParser.is_present(&status_view("")));
        assert!(!DpkgParser.is_present(&FilesystemMerger::merge(vec![])));
    }

    #[test]
    fn test_status_is_installed() {
        assert!(status_is_installed(Some(&"install ok installed".to_string())));
        assert!(!status_is_installed(Some(
            &"deinstall ok config-files".to_string()
        )));
        assert!(!status_is_installed(Some(&"purge ok not-installed".to_string())));
        assert!(!status_is_installed(None));
    }
}
