//! layerscan - static package inventory and CVE correlation for saved
//! container images
//!
//! This library reads a saved image archive (e.g. produced by
//! `docker save`), reconstructs the effective filesystem of the control
//! files it needs, identifies the OS and installed packages, and
//! correlates them with a vulnerability feed - all without running the
//! image or requiring a container runtime.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`image_analysis`): Pure scanning logic and domain models
//! - **Archive Layer** (`archive`): Saved-image decoding and layer filtering
//! - **Parsers** (`parsers`): Package database format readers
//! - **Application Layer** (`application`): Use cases and DTOs
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use layerscan::prelude::*;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<()> {
//! let progress_reporter = StderrProgressReporter::new();
//! let use_case = ScanImageUseCase::new(progress_reporter);
//!
//! let request = ScanRequest::new(PathBuf::from("alpine.tar"));
//! let outcome = use_case.execute(&request)?;
//!
//! let report = ScanReport::new(outcome.image, outcome.inventory, vec![], outcome.diagnostics);
//! println!("{}", report.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod archive;
pub mod config;
pub mod image_analysis;
pub mod parsers;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::{SilentProgressReporter, StderrProgressReporter};
    pub use crate::adapters::outbound::filesystem::{FileSystemWriter, StdoutPresenter};
    pub use crate::adapters::outbound::network::{CachingFeedClient, NvdFeedClient};
    pub use crate::application::dto::{CorrelationSettings, ScanReport, ScanRequest};
    pub use crate::application::use_cases::{
        CorrelateVulnerabilitiesUseCase, ScanImageUseCase,
    };
    pub use crate::image_analysis::domain::{Diagnostic, Inventory, OsIdentity, Package};
    pub use crate::ports::outbound::{OutputPresenter, ProgressReporter, VulnerabilityFeed};
    pub use crate::shared::error::{ExitCode, ScanError};
    pub use crate::shared::Result;
}
