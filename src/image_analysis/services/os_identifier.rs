use crate::image_analysis::domain::OsIdentity;
use crate::image_analysis::services::EffectiveFilesystemView;

/// Release-identity paths, in lookup order
const OS_RELEASE_PATHS: [&str; 2] = ["etc/os-release", "usr/lib/os-release"];

/// Extracts the distribution identity from the merged filesystem view.
///
/// Reads `os-release` key=value lines (`ID`, `VERSION_ID`), falling back
/// to the distribution-specific single-line release files some minimal
/// images carry instead. A missing release file is a valid state, not an
/// error: the identifier then returns [`OsIdentity::unknown`].
pub struct OsIdentifier;

impl OsIdentifier {
    pub fn identify(view: &EffectiveFilesystemView) -> OsIdentity {
        for path in OS_RELEASE_PATHS {
            if let Some(entry) = view.get(path) {
                if let Some(text) = entry.content_as_text() {
                    let identity = parse_os_release(&text);
                    if !identity.is_unknown() {
                        return identity;
                    }
                }
            }
        }

        // Fallbacks for images that predate or omit os-release
        if let Some(version) = single_line(view, "etc/debian_version") {
            return OsIdentity::new("debian".to_string(), version);
        }
        if let Some(version) = single_line(view, "etc/alpine-release") {
            return OsIdentity::new("alpine".to_string(), version);
        }

        OsIdentity::unknown()
    }
}

fn single_line(view: &EffectiveFilesystemView, path: &str) -> Option<String> {
    let text = view.get(path)?.content_as_text()?;
    let line = text.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

/// Parses os-release `KEY=value` lines, stripping surrounding quotes.
fn parse_os_release(content: &str) -> OsIdentity {
    let mut distribution = String::new();
    let mut version = String::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        match key.trim() {
            "ID" => distribution = value.to_lowercase(),
            "VERSION_ID" => version = value.to_string(),
            _ => {}
        }
    }

    OsIdentity::new(distribution, version)
}
