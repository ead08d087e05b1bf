/// Package-manager on-disk format decoders
///
/// Each parser decodes one manager's installed-package state from the
/// merged filesystem view into normalized [`Package`] records. All three
/// are polymorphic over [`PackageListParser`], so the detector can treat
/// them uniformly and union their results when an image carries state
/// files from more than one manager.
mod apk;
mod dpkg;
mod rpm;

pub use apk::ApkParser;
pub use dpkg::DpkgParser;
pub use rpm::RpmParser;

use crate::image_analysis::domain::{Package, PackageManager};
use crate::image_analysis::services::EffectiveFilesystemView;
use crate::shared::Result;

/// Common "parse package list" capability over a merged filesystem view.
pub trait PackageListParser {
    /// The manager whose on-disk format this parser decodes
    fn manager(&self) -> PackageManager;

    /// Whether this manager's state files are present in the view
    fn is_present(&self, view: &EffectiveFilesystemView) -> bool;

    /// Decodes the manager's state into normalized package records.
    ///
    /// # Errors
    /// Returns an error when the state file exists but cannot be decoded
    /// (notably `UnsupportedDatabaseFormat` for unrecognized rpm database
    /// containers). Callers degrade such errors to diagnostics.
    fn parse(&self, view: &EffectiveFilesystemView) -> Result<Vec<Package>>;
}

/// All supported parsers, tried in detection order.
pub fn all_parsers() -> Vec<Box<dyn PackageListParser>> {
    vec![
        Box::new(DpkgParser),
        Box::new(ApkParser),
        Box::new(RpmParser),
    ]
}
