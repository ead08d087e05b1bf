use serde::Serialize;

/// Maximum length of the description snippet carried into the report
const SNIPPET_MAX_LENGTH: usize = 240;

/// One vulnerability record as returned by the external feed.
///
/// Owned by the feed; cached only transiently per query batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VulnerabilityRecord {
    pub id: String,
    pub description: String,
    pub severity: Option<String>,
}

impl VulnerabilityRecord {
    pub fn new(id: String, description: String, severity: Option<String>) -> Self {
        Self {
            id,
            description,
            severity,
        }
    }
}

/// Whether a correlation subject is the OS identity or a package name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Os,
    Package,
}

/// A vulnerability attributed to a subject, trimmed for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedVulnerability {
    pub id: String,
    pub description_snippet: String,
    pub severity: Option<String>,
}

impl MatchedVulnerability {
    /// Builds the report entry from a feed record, truncating the
    /// description to a snippet on a character boundary.
    pub fn from_record(record: &VulnerabilityRecord) -> Self {
        let snippet = if record.description.chars().count() > SNIPPET_MAX_LENGTH {
            let truncated: String = record
                .description
                .chars()
                .take(SNIPPET_MAX_LENGTH - 3)
                .collect();
            format!("{}...", truncated)
        } else {
            record.description.clone()
        };

        Self {
            id: record.id.clone(),
            description_snippet: snippet,
            severity: record.severity.clone(),
        }
    }
}

/// Per-subject list of matched vulnerability records.
///
/// Invariant: a CVE id appears at most once per subject, and only when
/// the whole-word matching rule attributed the record to the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationResult {
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: SubjectKind,
    pub vulnerabilities: Vec<MatchedVulnerability>,
}

impl CorrelationResult {
    pub fn new(subject: String, kind: SubjectKind) -> Self {
        Self {
            subject,
            kind,
            vulnerabilities: Vec::new(),
        }
    }

    /// Appends a record unless its id is already attributed to this subject.
    pub fn push_deduplicated(&mut self, record: &VulnerabilityRecord) {
        if self.vulnerabilities.iter().any(|v| v.id == record.id) {
            return;
        }
        self.vulnerabilities.push(MatchedVulnerability::from_record(record));
    }

    /// Sorts matched records by id for deterministic output
    pub fn finalize(&mut self) {
        self.vulnerabilities.sort_by(|a, b| a.id.cmp(&b.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> VulnerabilityRecord {
        VulnerabilityRecord::new(
            id.to_string(),
            format!("description for {}", id),
            Some("HIGH".to_string()),
        )
    }

    #[test]
    fn test_push_deduplicated() {
        let mut result = CorrelationResult::new("curl".to_string(), SubjectKind::Package);
        result.push_deduplicated(&record("CVE-2024-0001"));
        result.push_deduplicated(&record("CVE-2024-0001"));
        result.push_deduplicated(&record("CVE-2024-0002"));
        assert_eq!(result.vulnerabilities.len(), 2);
    }

    #[test]
    fn test_finalize_sorts_by_id() {
        let mut result = CorrelationResult::new("curl".to_string(), SubjectKind::Package);
        result.push_deduplicated(&record("CVE-2024-0002"));
        result.push_deduplicated(&record("CVE-2024-0001"));
        result.finalize();
        assert_eq!(result.vulnerabilities[0].id, "CVE-2024-0001");
    }

    #[test]
    fn test_snippet_truncation() {
        let long = VulnerabilityRecord::new(
            "CVE-2024-9999".to_string(),
            "x".repeat(500),
            None,
        );
        let matched = MatchedVulnerability::from_record(&long);
        assert_eq!(matched.description_snippet.chars().count(), SNIPPET_MAX_LENGTH);
        assert!(matched.description_snippet.ends_with("..."));
    }

    #[test]
    fn test_short_description_not_truncated() {
        let matched = MatchedVulnerability::from_record(&record("CVE-2024-0001"));
        assert_eq!(matched.description_snippet, "description for CVE-2024-0001");
    }

    #[test]
    fn test_correlation_result_serialization_shape() {
        let mut result = CorrelationResult::new("openssl".to_string(), SubjectKind::Package);
        result.push_deduplicated(&record("CVE-2021-3711"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["subject"], "openssl");
        assert_eq!(json["type"], "package");
        assert_eq!(json["vulnerabilities"][0]["id"], "CVE-2021-3711");
        assert_eq!(json["vulnerabilities"][0]["severity"], "HIGH");
    }
}
