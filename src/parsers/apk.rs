use crate::image_analysis::domain::{Package, PackageManager};
use crate::image_analysis::services::EffectiveFilesystemView;
use crate::parsers::PackageListParser;
use crate::shared::Result;

/// apk installed-package database
pub const APK_INSTALLED_PATH: &str = "lib/apk/db/installed";

/// Parser for the Alpine apk installed database.
///
/// The database is a sequence of paragraphs separated by blank lines,
/// each paragraph made of short single-letter tagged lines (`P:name`,
/// `V:version`, `A:arch`, ...). Every paragraph carrying a `P` tag
/// yields one package.
pub struct ApkParser;

impl PackageListParser for ApkParser {
    fn manager(&self) -> PackageManager {
        PackageManager::Apk
    }

    fn is_present(&self, view: &EffectiveFilesystemView) -> bool {
        view.contains(APK_INSTALLED_PATH)
    }

    fn parse(&self, view: &EffectiveFilesystemView) -> Result<Vec<Package>> {
        let Some(entry) = view.get(APK_INSTALLED_PATH) else {
            return Ok(Vec::new());
        };
        let Some(text) = entry.content_as_text() else {
            return Ok(Vec::new());
        };

        let mut packages = Vec::new();

        for paragraph in text.split("\n\n") {
            if paragraph.trim().is_empty() {
                continue;
            }

            let mut name = None;
            let mut version = "";
            let mut architecture = "";

            for line in paragraph.lines() {
                let Some((tag, value)) = line.split_once(':') else {
                    continue;
                };
                match tag {
                    "P" => name = Some(value),
                    "V" => version = value,
                    "A" => architecture = value,
                    _ => {}
                }
            }

            if let Some(name) = name {
                if let Ok(pkg) = Package::new(name, version, architecture, PackageManager::Apk) {
                    packages.push(pkg);
                }
            }
        }

        Ok(packages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_analysis::domain::FileEntry;
    use crate::image_analysis::services::FilesystemMerger;

    const INSTALLED_CONTENT: &str = "\
C:Q1pxZ0uUxJxcnbVDLc+...
P:musl
V:1.2.2-r3
A:x86_64
T:the musl c library (libc) implementation

C:Q1Wdtr1nTuxMDdfWYrmT...
P:busybox
V:1.33.0-r5
A:x86_64
T:Size optimized toolbox of many common UNIX utilities
";

    fn installed_view(content: &str) -> EffectiveFilesystemView {
        FilesystemMerger::merge(vec![vec![FileEntry::regular(
            APK_INSTALLED_PATH.to_string(),
            content.as_bytes().to_vec(),
            0,
        )]])
    }

    #[test]
    fn test_parse_installed_database() {
        let view = installed_view(INSTALLED_CONTENT);
        let packages = ApkParser.parse(&view).unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name(), "musl");
        assert_eq!(packages[0].version(), "1.2.2-r3");
        assert_eq!(packages[0].architecture(), "x86_64");
        assert_eq!(packages[1].name(), "busybox");
        assert_eq!(packages[1].version(), "1.33.0-r5");
    }

    #[test]
    fn test_paragraph_without_p_tag_skipped() {
        let view = installed_view("C:Q1abc\nV:1.0\nA:x86_64\n");
        assert!(ApkParser.parse(&view).unwrap().is_empty());
    }

    #[test]
    fn test_missing_database_yields_empty() {
        let view = FilesystemMerger::merge(vec![]);
        assert!(!ApkParser.is_present(&view));
        assert!(ApkParser.parse(&view).unwrap().is_empty());
    }

    #[test]
    fn test_value_with_colon_preserved() {
        // Only the first ':' separates tag and value
        let view = installed_view("P:weird\nV:1.0:extra\n");
        let packages = ApkParser.parse(&view).unwrap();
        assert_eq!(packages[0].version(), "1.0:extra");
    }
}
