/// Use cases module containing application business logic orchestration
mod correlate_vulnerabilities;
mod scan_image;

pub use correlate_vulnerabilities::{CorrelateVulnerabilitiesUseCase, CorrelationOutcome};
pub use scan_image::{ScanImageUseCase, ScanOutcome};
