use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::image_analysis::domain::{CorrelationResult, Diagnostic, Inventory};
use crate::shared::Result;

/// ScanReport - The final output document of a scan
///
/// Serialized as a single JSON object. Field order is fixed by the
/// struct, and the inventory it embeds is already deduplicated and
/// sorted, so two scans of the same archive against the same feed
/// state produce identical documents apart from `scan_time`.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    /// Image label from the manifest, or the archive file name
    pub image: String,
    pub scan_time: DateTime<Utc>,
    #[serde(flatten)]
    pub inventory: Inventory,
    pub vulnerabilities: Vec<CorrelationResult>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanReport {
    pub fn new(
        image: String,
        inventory: Inventory,
        vulnerabilities: Vec<CorrelationResult>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            image,
            scan_time: Utc::now(),
            inventory,
            vulnerabilities,
            diagnostics,
        }
    }

    /// Serializes the report as pretty-printed JSON with a trailing newline
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}
