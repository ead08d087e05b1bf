mod file_entry;
mod inventory;
mod os_identity;
mod package;
mod vulnerability;

pub use file_entry::{classify_whiteout, normalize_path, FileEntry, FileKind};
pub use inventory::{Diagnostic, Inventory};
pub use os_identity::OsIdentity;
pub use package::{Package, PackageManager};
pub use vulnerability::{CorrelationResult, MatchedVulnerability, SubjectKind, VulnerabilityRecord};
