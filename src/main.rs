mod adapters;
mod application;
mod archive;
mod cli;
mod config;
mod image_analysis;
mod parsers;
mod ports;
mod shared;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use owo_colors::OwoColorize;

use adapters::outbound::console::{SilentProgressReporter, StderrProgressReporter};
use adapters::outbound::filesystem::{FileSystemWriter, StdoutPresenter};
use adapters::outbound::network::{CachingFeedClient, NvdFeedClient};
use application::dto::{CorrelationSettings, ScanReport, ScanRequest};
use application::use_cases::{CorrelateVulnerabilitiesUseCase, ScanImageUseCase};
use cli::Args;
use config::ConfigFile;
use image_analysis::domain::CorrelationResult;
use ports::outbound::{OutputPresenter, ProgressReporter};
use shared::error::{ExitCode, ScanError};
use shared::Result;

fn main() {
    // clap itself exits with code 2 on invalid arguments
    let args = Args::parse_args();

    if let Err(e) = run(args) {
        eprintln!("\n{}\n", "❌ An error occurred:".red());
        eprintln!("{}", e);

        // Display error chain
        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("\nCaused by: {}", err);
            source = err.source();
        }

        eprintln!();
        process::exit(exit_code_for(&e).as_i32());
    }
}

#[tokio::main]
async fn run(args: Args) -> Result<()> {
    validate_archive_path(&args.archive)?;

    // Configuration file, explicit path or discovery in the working directory
    let config = match &args.config {
        Some(path) => config::load_config_from_path(path)?,
        None => config::discover_config(Path::new("."))?.unwrap_or_default(),
    };

    let settings = build_settings(&args, &config);
    let skip_correlation = args.skip_correlation || config.skip_correlation.unwrap_or(false);

    // Create adapters (Dependency Injection)
    let scan_reporter = make_reporter(args.quiet);

    // Inventory stage
    let scan_use_case = ScanImageUseCase::new(scan_reporter);
    let request = ScanRequest::new(args.archive.clone());
    let outcome = scan_use_case.execute(&request)?;

    // Correlation stage
    let mut diagnostics = outcome.diagnostics;
    let correlations = if skip_correlation {
        Vec::new()
    } else {
        let feed_url = args
            .feed_url
            .clone()
            .or_else(|| config.feed_url.clone());
        let feed_client = match feed_url {
            Some(url) => NvdFeedClient::with_endpoint(url)?,
            None => NvdFeedClient::new()?,
        };
        let feed = CachingFeedClient::new(feed_client);

        let correlate_use_case =
            CorrelateVulnerabilitiesUseCase::new(feed, make_reporter(args.quiet), settings);
        let correlation = correlate_use_case.execute(&outcome.inventory).await;
        diagnostics.extend(correlation.diagnostics);
        correlation.results
    };

    if !skip_correlation && !args.quiet {
        print_summary(&correlations);
    }

    // Assemble and present the report
    let report = ScanReport::new(outcome.image, outcome.inventory, correlations, diagnostics);
    let document = report.to_json()?;

    let presenter: Box<dyn OutputPresenter> = if let Some(output_path) = args.output {
        Box::new(FileSystemWriter::new(PathBuf::from(output_path)))
    } else {
        Box::new(StdoutPresenter::new())
    };
    presenter.present(&document)?;

    Ok(())
}

/// Correlation settings from defaults, overridden by config file, then CLI.
fn build_settings(args: &Args, config: &ConfigFile) -> CorrelationSettings {
    let mut settings = CorrelationSettings::default();

    if let Some(batch_size) = config.batch_size {
        settings.batch_size = batch_size;
    }
    if let Some(concurrency) = config.concurrency {
        settings.concurrency = concurrency;
    }
    if let Some(max_retries) = config.max_retries {
        settings.max_retries = max_retries;
    }
    if let Some(timeout_seconds) = config.timeout_seconds {
        settings.deadline = Duration::from_secs(timeout_seconds);
    }

    if let Some(batch_size) = args.batch_size {
        settings.batch_size = batch_size.max(1);
    }
    if let Some(concurrency) = args.concurrency {
        settings.concurrency = concurrency.max(1);
    }
    if let Some(timeout) = args.timeout {
        settings.deadline = Duration::from_secs(timeout.max(1));
    }

    settings
}

/// Returns (total matched records, subjects with at least one match).
fn summarize(correlations: &[CorrelationResult]) -> (usize, usize) {
    let total = correlations.iter().map(|c| c.vulnerabilities.len()).sum();
    let affected = correlations
        .iter()
        .filter(|c| !c.vulnerabilities.is_empty())
        .count();
    (total, affected)
}

/// Prints a colored per-severity tally to stderr.
fn print_summary(correlations: &[CorrelationResult]) {
    let (total, affected) = summarize(correlations);
    if total == 0 {
        eprintln!("{}", "✅ No known vulnerabilities matched".green());
        return;
    }

    let mut by_severity: BTreeMap<String, usize> = BTreeMap::new();
    for result in correlations {
        for vulnerability in &result.vulnerabilities {
            let severity = vulnerability
                .severity
                .as_deref()
                .unwrap_or("UNKNOWN")
                .to_uppercase();
            *by_severity.entry(severity).or_insert(0) += 1;
        }
    }

    eprintln!(
        "\n⚠️  {} vulnerabilities matched across {} subjects:",
        total, affected
    );
    for (severity, count) in &by_severity {
        let line = format!("   {}: {}", severity, count);
        match severity.as_str() {
            "CRITICAL" | "HIGH" => eprintln!("{}", line.red()),
            "MEDIUM" => eprintln!("{}", line.yellow()),
            _ => eprintln!("{}", line),
        }
    }
}

fn make_reporter(quiet: bool) -> Box<dyn ProgressReporter> {
    if quiet {
        Box::new(SilentProgressReporter)
    } else {
        Box::new(StderrProgressReporter::new())
    }
}

fn validate_archive_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ScanError::InvalidArchivePath {
            path: path.to_path_buf(),
            reason: "File does not exist".to_string(),
        }
        .into());
    }

    if !path.is_file() {
        return Err(ScanError::InvalidArchivePath {
            path: path.to_path_buf(),
            reason: "Not a regular file".to_string(),
        }
        .into());
    }

    Ok(())
}

/// Maps a failed run to its process exit code.
fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<ScanError>() {
        Some(e) if e.is_archive_error() => ExitCode::ArchiveError,
        _ => ExitCode::ApplicationError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_archive_path_valid_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("image.tar");
        fs::write(&file_path, "content").unwrap();
        assert!(validate_archive_path(&file_path).is_ok());
    }

    #[test]
    fn test_validate_archive_path_nonexistent() {
        let result = validate_archive_path(Path::new("/nonexistent/image.tar"));
        assert!(result.is_err());
        let err_string = format!("{}", result.unwrap_err());
        assert!(err_string.contains("File does not exist"));
    }

    #[test]
    fn test_validate_archive_path_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = validate_archive_path(temp_dir.path());
        assert!(result.is_err());
        let err_string = format!("{}", result.unwrap_err());
        assert!(err_string.contains("Not a regular file"));
    }

    #[test]
    fn test_exit_code_for_archive_errors() {
        let malformed: anyhow::Error = ScanError::MalformedArchive {
            details: "x".to_string(),
        }
        .into();
        assert_eq!(exit_code_for(&malformed), ExitCode::ArchiveError);

        let unsupported: anyhow::Error = ScanError::UnsupportedFormat {
            details: "x".to_string(),
        }
        .into();
        assert_eq!(exit_code_for(&unsupported), ExitCode::ArchiveError);
    }

    #[test]
    fn test_exit_code_for_other_errors() {
        let io: anyhow::Error = ScanError::FileReadError {
            path: PathBuf::from("/x"),
            details: "denied".to_string(),
        }
        .into();
        assert_eq!(exit_code_for(&io), ExitCode::ApplicationError);

        let plain = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&plain), ExitCode::ApplicationError);
    }

    #[test]
    fn test_summarize_counts_matches_and_subjects() {
        use crate::image_analysis::domain::{SubjectKind, VulnerabilityRecord};

        let mut curl = CorrelationResult::new("curl".to_string(), SubjectKind::Package);
        curl.push_deduplicated(&VulnerabilityRecord::new(
            "CVE-2024-0001".to_string(),
            "a flaw in curl".to_string(),
            Some("HIGH".to_string()),
        ));
        curl.push_deduplicated(&VulnerabilityRecord::new(
            "CVE-2024-0002".to_string(),
            "another flaw in curl".to_string(),
            None,
        ));
        let empty = CorrelationResult::new("musl".to_string(), SubjectKind::Package);

        assert_eq!(summarize(&[curl, empty]), (2, 1));
        assert_eq!(summarize(&[]), (0, 0));
    }

    #[test]
    fn test_build_settings_cli_overrides_config() {
        let args = Args::try_parse_from([
            "layerscan",
            "image.tar",
            "--batch-size",
            "2",
            "--timeout",
            "10",
        ])
        .unwrap();
        let config = ConfigFile {
            batch_size: Some(32),
            concurrency: Some(8),
            timeout_seconds: Some(600),
            ..Default::default()
        };

        let settings = build_settings(&args, &config);
        assert_eq!(settings.batch_size, 2);
        assert_eq!(settings.concurrency, 8);
        assert_eq!(settings.deadline, Duration::from_secs(10));
    }
}
