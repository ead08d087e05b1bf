use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow unattended automation to distinguish between an
/// unreadable archive (no inventory possible) and a completed scan,
/// even one completed with diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// The inventory stage completed. Correlation may still have partially
    /// failed; diagnostics are embedded in the output document.
    Success = 0,
    /// The archive could not be parsed at all - no inventory was produced
    ArchiveError = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Other application error (file I/O error, config error, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::ArchiveError => write!(f, "Archive Error (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Application-specific errors for image scanning.
///
/// Uses thiserror to derive Display and Error traits automatically,
/// reducing boilerplate while maintaining user-friendly error messages.
///
/// Archive-level structural failures (`MalformedArchive`,
/// `UnsupportedFormat`) abort the scan; everything below the archive level
/// degrades to diagnostics carried in the output document instead.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Malformed image archive: {details}\n\n💡 Hint: Expected a saved container image (e.g. produced by `docker save`)")]
    MalformedArchive { details: String },

    #[error("Unsupported archive format: {details}\n\n💡 Hint: Only the classic saved-image layout with a top-level manifest.json is supported")]
    UnsupportedFormat { details: String },

    #[error("Unsupported package database format: {details}")]
    UnsupportedDatabaseFormat { details: String },

    #[error("Vulnerability feed request failed: {details}")]
    FeedRequestError { details: String },

    #[error("Failed to read file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file exists and you have read permissions")]
    FileReadError { path: PathBuf, details: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },

    #[error("Invalid archive path: {path}\nReason: {reason}\n\n💡 Hint: Please specify a saved image archive file")]
    InvalidArchivePath { path: PathBuf, reason: String },
}

impl ScanError {
    /// Whether this error means the archive itself could not be parsed,
    /// mapping to [`ExitCode::ArchiveError`].
    pub fn is_archive_error(&self) -> bool {
        matches!(
            self,
            ScanError::MalformedArchive { .. } | ScanError::UnsupportedFormat { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::ArchiveError.as_i32(), 1);
        assert_eq!(ExitCode::InvalidArguments.as_i32(), 2);
        assert_eq!(ExitCode::ApplicationError.as_i32(), 3);
    }

    #[test]
    fn test_exit_code_display() {
        assert_eq!(format!("{}", ExitCode::Success), "Success (0)");
        assert_eq!(format!("{}", ExitCode::ArchiveError), "Archive Error (1)");
    }

    #[test]
    fn test_malformed_archive_display() {
        let error = ScanError::MalformedArchive {
            details: "manifest.json not found".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Malformed image archive"));
        assert!(display.contains("manifest.json not found"));
        assert!(display.contains("💡 Hint:"));
    }

    #[test]
    fn test_is_archive_error() {
        assert!(ScanError::MalformedArchive {
            details: String::new()
        }
        .is_archive_error());
        assert!(ScanError::UnsupportedFormat {
            details: String::new()
        }
        .is_archive_error());
        assert!(!ScanError::UnsupportedDatabaseFormat {
            details: String::new()
        }
        .is_archive_error());
        assert!(!ScanError::FileReadError {
            path: PathBuf::from("/x"),
            details: String::new()
        }
        .is_archive_error());
    }

    #[test]
    fn test_file_write_error_display() {
        let error = ScanError::FileWriteError {
            path: PathBuf::from("/test/output.json"),
            details: "Permission denied".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Failed to write to file"));
        assert!(display.contains("/test/output.json"));
        assert!(display.contains("Permission denied"));
    }
}
