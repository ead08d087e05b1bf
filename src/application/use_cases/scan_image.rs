use crate::application::dto::ScanRequest;
use crate::archive::{ArchiveReader, LayerFilter};
use crate::image_analysis::domain::{Diagnostic, FileEntry, Inventory};
use crate::image_analysis::services::{FilesystemMerger, OsIdentifier, PackageManagerDetector};
use crate::ports::outbound::ProgressReporter;
use crate::shared::Result;

/// Result of the inventory stage, before correlation.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Image label from the manifest tags, or the archive file name
    pub image: String,
    pub inventory: Inventory,
    pub diagnostics: Vec<Diagnostic>,
}

/// ScanImageUseCase - Core use case producing the package inventory
///
/// Orchestrates the inventory pipeline: manifest, per-layer filtering,
/// whiteout-aware merge, OS identification, package-manager detection
/// and parsing. The pipeline is synchronous; the outer archive is one
/// sequential stream and every stage after filtering works on in-memory
/// control files.
///
/// # Type Parameters
/// * `PR` - ProgressReporter implementation
pub struct ScanImageUseCase<PR: ProgressReporter> {
    progress_reporter: PR,
}

impl<PR: ProgressReporter> ScanImageUseCase<PR> {
    pub fn new(progress_reporter: PR) -> Self {
        Self { progress_reporter }
    }

    /// Executes the inventory stage.
    ///
    /// # Errors
    /// Fails only on archive-level problems (unreadable file, malformed
    /// or unsupported archive). Everything below the archive level
    /// degrades to diagnostics in the outcome.
    pub fn execute(&self, request: &ScanRequest) -> Result<ScanOutcome> {
        let reader = ArchiveReader::new(&request.archive_path);

        self.progress_reporter.report("🔍 Reading image archive...");
        let manifest = reader.read_manifest()?;

        let image = manifest
            .image_label()
            .map(str::to_string)
            .unwrap_or_else(|| {
                request
                    .archive_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| request.archive_path.display().to_string())
            });

        self.progress_reporter.report(&format!(
            "📦 Scanning {} layer(s) of {}...",
            manifest.layer_count(),
            image
        ));

        // Filtered entries per layer, indexed by chain position
        let mut layers: Vec<Vec<FileEntry>> =
            (0..manifest.layer_count()).map(|_| Vec::new()).collect();
        let mut diagnostics = Vec::new();
        reader.visit_layers(&manifest, |index, stream| {
            let filtered = LayerFilter::filter_layer(stream, index)?;
            for path in filtered.oversized {
                diagnostics.push(Diagnostic::UnsupportedDatabaseFormat {
                    details: format!("{}: exceeds the control-file size cap, skipped", path),
                });
            }
            layers[index] = filtered.entries;
            Ok(())
        })?;

        let view = FilesystemMerger::merge(layers);
        let os = OsIdentifier::identify(&view);
        let detection = PackageManagerDetector::detect_and_parse(&view);

        let inventory = Inventory::new(os, detection.packages);
        self.progress_reporter.report_completion(&format!(
            "✅ Inventory complete: {} package(s)",
            inventory.packages.len()
        ));

        diagnostics.extend(detection.diagnostics);
        Ok(ScanOutcome {
            image,
            inventory,
            diagnostics,
        })
    }
}
