mod detector;
mod matcher;
mod merger;
mod os_identifier;

pub use detector::{DetectionOutcome, PackageManagerDetector};
pub use matcher::name_matches_description;
pub use merger::{EffectiveFilesystemView, FilesystemMerger};
pub use os_identifier::OsIdentifier;
