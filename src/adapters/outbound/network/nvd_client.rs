use crate::image_analysis::domain::VulnerabilityRecord;
use crate::ports::outbound::VulnerabilityFeed;
use crate::shared::error::ScanError;
use crate::shared::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// NVD 2.0 keyword-search response. Only the fields the scan consumes
/// are modeled; everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
struct NvdResponse {
    #[serde(default)]
    vulnerabilities: Vec<NvdVulnerabilityWrapper>,
}

#[derive(Debug, Deserialize)]
struct NvdVulnerabilityWrapper {
    cve: NvdCve,
}

#[derive(Debug, Deserialize)]
struct NvdCve {
    id: String,
    #[serde(default)]
    descriptions: Vec<NvdDescription>,
    #[serde(default)]
    metrics: NvdMetrics,
}

#[derive(Debug, Deserialize)]
struct NvdDescription {
    lang: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct NvdMetrics {
    #[serde(rename = "cvssMetricV31", default)]
    cvss_v31: Vec<NvdCvssMetric>,
    #[serde(rename = "cvssMetricV2", default)]
    cvss_v2: Vec<NvdCvssV2Metric>,
}

#[derive(Debug, Deserialize)]
struct NvdCvssMetric {
    #[serde(rename = "cvssData")]
    cvss_data: NvdCvssData,
}

#[derive(Debug, Deserialize)]
struct NvdCvssData {
    #[serde(rename = "baseSeverity")]
    base_severity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NvdCvssV2Metric {
    #[serde(rename = "baseSeverity")]
    base_severity: Option<String>,
}

/// NvdFeedClient adapter for querying the NVD keyword-search API
///
/// This adapter implements the VulnerabilityFeed port, providing async
/// network access to an NVD 2.0 compatible CVE API.
///
/// Retrying and concurrency limiting belong to the correlation use case,
/// not here: this client performs exactly one request per query so the
/// caller's backoff schedule stays accurate.
pub struct NvdFeedClient {
    client: reqwest::Client,
    api_url: String,
}

impl NvdFeedClient {
    const API_ENDPOINT: &'static str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
    const TIMEOUT_SECONDS: u64 = 30;
    const RESULTS_PER_PAGE: u32 = 200;

    /// Creates a client against the public NVD endpoint
    pub fn new() -> Result<Self> {
        Self::with_endpoint(Self::API_ENDPOINT.to_string())
    }

    /// Creates a client against a custom endpoint (e.g. a feed mirror)
    pub fn with_endpoint(api_url: String) -> Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("layerscan/{}", version);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(Self::TIMEOUT_SECONDS))
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client, api_url })
    }

    /// Builds the keyword-search request URL, encoding the keyword to
    /// handle spaces and special characters safely.
    fn request_url(&self, keyword: &str) -> String {
        format!(
            "{}?keywordSearch={}&resultsPerPage={}",
            self.api_url,
            urlencoding::encode(keyword),
            Self::RESULTS_PER_PAGE
        )
    }

    fn convert(cve: NvdCve) -> VulnerabilityRecord {
        let description = cve
            .descriptions
            .iter()
            .find(|d| d.lang == "en")
            .or_else(|| cve.descriptions.first())
            .map(|d| d.value.clone())
            .unwrap_or_default();

        let severity = cve
            .metrics
            .cvss_v31
            .first()
            .and_then(|m| m.cvss_data.base_severity.clone())
            .or_else(|| {
                cve.metrics
                    .cvss_v2
                    .first()
                    .and_then(|m| m.base_severity.clone())
            });

        VulnerabilityRecord {
            id: cve.id,
            description,
            severity,
        }
    }
}

#[async_trait]
impl VulnerabilityFeed for NvdFeedClient {
    async fn query(&self, keyword: &str) -> Result<Vec<VulnerabilityRecord>> {
        let response = self
            .client
            .get(self.request_url(keyword))
            .send()
            .await
            .map_err(|e| ScanError::FeedRequestError {
                details: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ScanError::FeedRequestError {
                details: format!("feed returned status code {}", response.status()),
            }
            .into());
        }

        let body: NvdResponse =
            response
                .json()
                .await
                .map_err(|e| ScanError::FeedRequestError {
                    details: format!("malformed feed response: {}", e),
                })?;

        Ok(body
            .vulnerabilities
            .into_iter()
            .map(|w| Self::convert(w.cve))
            .collect())
    }
}
