/// Data Transfer Objects for application layer
///
/// DTOs are used to transfer data between the application layer
/// and adapters, keeping the domain layer isolated.
mod scan_report;
mod scan_request;

pub use scan_report::ScanReport;
pub use scan_request::{CorrelationSettings, ScanRequest};
