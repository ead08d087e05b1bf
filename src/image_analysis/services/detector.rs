use crate::image_analysis::domain::{Diagnostic, Package};
use crate::image_analysis::services::EffectiveFilesystemView;
use crate::parsers::all_parsers;

/// Outcome of package-manager detection and parsing.
#[derive(Debug)]
pub struct DetectionOutcome {
    pub packages: Vec<Package>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decides which package managers govern the image and runs their parsers.
///
/// Detection is by presence of each manager's state file in the merged
/// view. When more than one manager is present, all are parsed and the
/// results unioned: an image layered from multiple base distributions is
/// rare but possible, and dropping one silently would lose data. When
/// none is present the outcome carries an empty package list and a
/// `NoPackageManagerDetected` diagnostic - the scan itself still
/// succeeds.
///
/// Parser failures (notably unsupported rpm database generations) also
/// degrade to diagnostics: "OS identified, packages unknown" is strictly
/// more useful than no output.
pub struct PackageManagerDetector;

impl PackageManagerDetector {
    pub fn detect_and_parse(view: &EffectiveFilesystemView) -> DetectionOutcome {
        let mut packages = Vec::new();
        let mut diagnostics = Vec::new();
        let mut any_present = false;

        for parser in all_parsers() {
            if !parser.is_present(view) {
                continue;
            }
            any_present = true;

            match parser.parse(view) {
                Ok(parsed) => packages.extend(parsed),
                Err(e) => diagnostics.push(Diagnostic::UnsupportedDatabaseFormat {
                    details: format!("{}: {}", parser.manager(), root_message(&e)),
                }),
            }
        }

        if !any_present {
            diagnostics.push(Diagnostic::NoPackageManagerDetected);
        }

        DetectionOutcome {
            packages,
            diagnostics,
        }
    }
}

/// First line of the error chain, without the teaching hints that belong
/// on the console rather than in the report document.
fn root_message(error: &anyhow::Error) -> String {
    error
        .to_string()
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}
