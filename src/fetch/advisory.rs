//! Vulnerability advisories from the npm bulk advisory endpoint

use std::collections::HashMap;

#[cfg(test)]
use mockall::automock;

use semver::Version;
use serde::Deserialize;
use tracing::warn;

use crate::config::DEFAULT_REGISTRY_URL;
use crate::fetch::error::FetchError;
use crate::types::{AdvisoryRecord, Severity};

/// Trait for fetching known advisories for a package
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait AdvisorySource: Send + Sync {
    /// Fetches advisories affecting any of the given published versions
    async fn fetch_advisories(
        &self,
        package_name: &str,
        versions: &[Version],
    ) -> Result<Vec<AdvisoryRecord>, FetchError>;
}

/// One advisory as returned by the bulk endpoint
#[derive(Debug, Deserialize)]
struct BulkAdvisory {
    title: String,
    severity: Severity,
    url: String,
    vulnerable_versions: String,
    #[serde(default)]
    cvss: Option<Cvss>,
}

#[derive(Debug, Deserialize)]
struct Cvss {
    score: Option<f64>,
}

/// Advisory source backed by the npm registry's bulk advisory endpoint
pub struct NpmAdvisorySource {
    client: reqwest::Client,
    base_url: String,
}

impl NpmAdvisorySource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("dep-advisor/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for NpmAdvisorySource {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL)
    }
}

#[async_trait::async_trait]
impl AdvisorySource for NpmAdvisorySource {
    async fn fetch_advisories(
        &self,
        package_name: &str,
        versions: &[Version],
    ) -> Result<Vec<AdvisoryRecord>, FetchError> {
        let url = format!("{}/-/npm/v1/security/advisories/bulk", self.base_url);
        let body: HashMap<&str, Vec<String>> = HashMap::from([(
            package_name,
            versions.iter().map(|v| v.to_string()).collect(),
        )]);

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "advisory endpoint returned status {} for {}",
                status, package_name
            );
            return Err(FetchError::InvalidResponse(format!(
                "unexpected status: {status}"
            )));
        }

        let mut payload: HashMap<String, Vec<BulkAdvisory>> =
            response.json().await.map_err(|e| {
                warn!("failed to parse advisory response for {}: {}", package_name, e);
                FetchError::InvalidResponse(e.to_string())
            })?;

        let advisories = payload.remove(package_name).unwrap_or_default();

        Ok(advisories
            .into_iter()
            .map(|advisory| AdvisoryRecord {
                vulnerable_range: advisory.vulnerable_versions,
                severity: advisory.severity,
                score: advisory.cvss.and_then(|c| c.score).unwrap_or(0.0),
                title: advisory.title,
                url: advisory.url,
            })
            .collect())
    }
}
