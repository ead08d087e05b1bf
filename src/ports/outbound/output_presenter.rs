use crate::shared::Result;

/// OutputPresenter port for presenting the final report
///
/// This port abstracts the output destination (stdout, file, etc.)
/// where the serialized scan report is presented.
pub trait OutputPresenter {
    /// Presents the serialized report to the output destination
    ///
    /// # Arguments
    /// * `content` - The serialized report content to present
    ///
    /// # Errors
    /// Returns an error if:
    /// - Writing to the output destination fails
    /// - File permissions prevent writing
    fn present(&self, content: &str) -> Result<()>;
}
