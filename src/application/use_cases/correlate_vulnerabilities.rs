use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};

use crate::application::dto::CorrelationSettings;
use crate::image_analysis::domain::{
    CorrelationResult, Diagnostic, Inventory, SubjectKind, VulnerabilityRecord,
};
use crate::image_analysis::services::name_matches_description;
use crate::ports::outbound::{ProgressReporter, VulnerabilityFeed};
use crate::shared::Result;

/// Base delay of the exponential backoff between retry attempts
const RETRY_BASE_DELAY_MS: u64 = 100;

/// Result of the correlation stage.
///
/// Correlation never fails the scan: subjects whose queries exhausted
/// their retries, and subjects left unqueried when the deadline expired,
/// are reported through diagnostics alongside whatever completed.
#[derive(Debug)]
pub struct CorrelationOutcome {
    pub results: Vec<CorrelationResult>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One query subject: the OS identity or a distinct package name.
#[derive(Debug, Clone)]
struct Subject {
    keyword: String,
    kind: SubjectKind,
}

/// CorrelateVulnerabilitiesUseCase - Use case for CVE correlation
///
/// Queries the vulnerability feed once per subject and attributes the
/// returned records. Subjects are processed in batches; within a batch
/// the queries run concurrently up to the configured limit, and each
/// subject gets an exponential-backoff retry schedule. A wall-clock
/// deadline bounds the whole stage.
///
/// # Type Parameters
/// * `F` - VulnerabilityFeed implementation
/// * `PR` - ProgressReporter implementation
pub struct CorrelateVulnerabilitiesUseCase<F: VulnerabilityFeed, PR: ProgressReporter> {
    feed: F,
    progress_reporter: PR,
    settings: CorrelationSettings,
}

impl<F: VulnerabilityFeed, PR: ProgressReporter> CorrelateVulnerabilitiesUseCase<F, PR> {
    pub fn new(feed: F, progress_reporter: PR, settings: CorrelationSettings) -> Self {
        Self {
            feed,
            progress_reporter,
            settings,
        }
    }

    /// Executes correlation over the inventory's subjects.
    pub async fn execute(&self, inventory: &Inventory) -> CorrelationOutcome {
        let subjects = Self::collect_subjects(inventory);
        let total = subjects.len();
        if total == 0 {
            return CorrelationOutcome {
                results: Vec::new(),
                diagnostics: Vec::new(),
            };
        }

        self.progress_reporter
            .report(&format!("🔎 Correlating {} subject(s) with the vulnerability feed...", total));

        let started = Instant::now();
        let mut results = Vec::new();
        let mut diagnostics = Vec::new();
        let mut completed = 0usize;

        let batch_size = self.settings.batch_size.max(1);
        let concurrency = self.settings.concurrency.max(1);

        for batch in subjects.chunks(batch_size) {
            let Some(remaining) = self.settings.deadline.checked_sub(started.elapsed()) else {
                diagnostics.push(Diagnostic::Timeout);
                break;
            };

            let batch_work = stream::iter(batch.iter().map(|subject| async move {
                (subject, self.query_with_retry(&subject.keyword).await)
            }))
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>();

            let outcomes = match tokio::time::timeout(remaining, batch_work).await {
                Ok(outcomes) => outcomes,
                Err(_) => {
                    diagnostics.push(Diagnostic::Timeout);
                    break;
                }
            };

            let mut failed: Vec<String> = Vec::new();
            for (subject, outcome) in outcomes {
                completed += 1;
                self.progress_reporter
                    .report_progress(completed, total, Some(&subject.keyword));

                match outcome {
                    Ok(records) => {
                        if let Some(result) = Self::attribute(subject, &records) {
                            results.push(result);
                        }
                    }
                    Err(_) => failed.push(subject.keyword.clone()),
                }
            }

            if !failed.is_empty() {
                failed.sort();
                diagnostics.push(Diagnostic::VulnerabilityLookupFailed { subjects: failed });
            }
        }

        results.sort_by(|a, b| a.subject.cmp(&b.subject));
        self.progress_reporter.report_completion(&format!(
            "✅ Correlation complete: {} subject(s) with findings",
            results.len()
        ));

        CorrelationOutcome {
            results,
            diagnostics,
        }
    }

    /// The OS identity (when known) followed by distinct package names.
    fn collect_subjects(inventory: &Inventory) -> Vec<Subject> {
        let mut subjects = Vec::new();
        if let Some(keyword) = inventory.os.feed_keyword() {
            subjects.push(Subject {
                keyword,
                kind: SubjectKind::Os,
            });
        }
        for name in inventory.distinct_package_names() {
            subjects.push(Subject {
                keyword: name,
                kind: SubjectKind::Package,
            });
        }
        subjects
    }

    /// Queries the feed with exponential backoff between attempts.
    async fn query_with_retry(&self, keyword: &str) -> Result<Vec<VulnerabilityRecord>> {
        let max_retries = self.settings.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=max_retries {
            match self.feed.query(keyword).await {
                Ok(records) => return Ok(records),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < max_retries {
                        let delay = RETRY_BASE_DELAY_MS * 2u64.pow(attempt - 1);
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no query attempts made")))
    }

    /// Attributes the feed records to the subject.
    ///
    /// OS subjects keep every record the keyword query returned; the
    /// query itself is the attribution. Package subjects additionally
    /// require the package name to appear as a whole word in the record
    /// description, since keyword search also matches loosely related
    /// advisories. Subjects without any attributed record are omitted
    /// from the report.
    fn attribute(subject: &Subject, records: &[VulnerabilityRecord]) -> Option<CorrelationResult> {
        let mut result = CorrelationResult::new(subject.keyword.clone(), subject.kind);
        for record in records {
            let attributed = match subject.kind {
                SubjectKind::Os => true,
                SubjectKind::Package => {
                    name_matches_description(&subject.keyword, &record.description)
                }
            };
            if attributed {
                result.push_deduplicated(record);
            }
        }

        if result.vulnerabilities.is_empty() {
            None
        } else {
            result.finalize();
            Some(result)
        }
    }
}
