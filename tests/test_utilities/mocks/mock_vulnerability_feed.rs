#![allow(dead_code)]

use async_trait::async_trait;
use layerscan::image_analysis::domain::VulnerabilityRecord;
use layerscan::ports::outbound::VulnerabilityFeed;
use layerscan::shared::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// MockVulnerabilityFeed serves canned records per keyword and counts
/// queries, optionally failing for selected keywords.
pub struct MockVulnerabilityFeed {
    responses: HashMap<String, Vec<VulnerabilityRecord>>,
    failing_keywords: Vec<String>,
    query_count: AtomicUsize,
}

impl MockVulnerabilityFeed {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            failing_keywords: Vec::new(),
            query_count: AtomicUsize::new(0),
        }
    }

    pub fn with_records(mut self, keyword: &str, records: Vec<VulnerabilityRecord>) -> Self {
        self.responses.insert(keyword.to_string(), records);
        self
    }

    pub fn failing_on(mut self, keyword: &str) -> Self {
        self.failing_keywords.push(keyword.to_string());
        self
    }

    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }
}

impl Default for MockVulnerabilityFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VulnerabilityFeed for MockVulnerabilityFeed {
    async fn query(&self, keyword: &str) -> Result<Vec<VulnerabilityRecord>> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        if self.failing_keywords.iter().any(|k| k == keyword) {
            anyhow::bail!("mock feed failure for '{}'", keyword);
        }
        Ok(self.responses.get(keyword).cloned().unwrap_or_default())
    }
}
