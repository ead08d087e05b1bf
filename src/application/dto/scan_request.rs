use std::path::PathBuf;
use std::time::Duration;

/// Tuning for the correlation stage.
#[derive(Debug, Clone)]
pub struct CorrelationSettings {
    /// Subjects grouped into one unit of work
    pub batch_size: usize,
    /// Concurrent feed queries in flight at once
    pub concurrency: usize,
    /// Attempts per subject before it is reported as failed
    pub max_retries: u32,
    /// Wall-clock budget for the whole correlation stage
    pub deadline: Duration,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            batch_size: 16,
            concurrency: 4,
            max_retries: 3,
            deadline: Duration::from_secs(300),
        }
    }
}

/// ScanRequest - Internal request DTO for the image scan use case
///
/// Correlation tuning travels separately to the correlation use case;
/// the inventory stage needs only the archive location.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Path to the saved image archive
    pub archive_path: PathBuf,
}

impl ScanRequest {
    pub fn new(archive_path: PathBuf) -> Self {
        Self { archive_path }
    }
}
