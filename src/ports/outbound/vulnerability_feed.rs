use crate::image_analysis::domain::VulnerabilityRecord;
use crate::shared::Result;
use async_trait::async_trait;

/// VulnerabilityFeed port for querying known vulnerabilities
///
/// This port abstracts the external advisory source (e.g., the NVD
/// keyword-search API) used to retrieve vulnerability records for a
/// scan subject.
///
/// # Async Support
/// All methods are async for efficient concurrent querying.
/// Implementations must be `Send + Sync` to support concurrent access.
#[async_trait]
pub trait VulnerabilityFeed: Send + Sync {
    /// Queries the feed for vulnerabilities matching a keyword
    ///
    /// # Arguments
    /// * `keyword` - Subject keyword (a package name, or a
    ///   "distribution version" pair for the operating system)
    ///
    /// # Returns
    /// All vulnerability records the feed associates with the keyword.
    /// An empty list means the feed knows nothing about the subject,
    /// which is a normal outcome and not an error.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The network request fails
    /// - The feed returns an error status code
    /// - The response cannot be parsed
    async fn query(&self, keyword: &str) -> Result<Vec<VulnerabilityRecord>>;
}
