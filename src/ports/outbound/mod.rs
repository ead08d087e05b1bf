/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (vulnerability feed, file system,
/// console).
pub mod output_presenter;
pub mod progress_reporter;
pub mod vulnerability_feed;

pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
pub use vulnerability_feed::VulnerabilityFeed;
