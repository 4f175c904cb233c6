//! Registry access for published package versions

use std::collections::HashMap;

#[cfg(test)]
use mockall::automock;

use semver::Version;
use serde::Deserialize;
use tracing::warn;

use crate::config::DEFAULT_REGISTRY_URL;
use crate::fetch::error::FetchError;
use crate::types::VersionSet;

/// Trait for fetching the published version set of a package
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches every published version of a package
    ///
    /// # Returns
    /// * `Ok(VersionSet)` - all valid published versions
    /// * `Err(FetchError)` - transport failure, missing package, or
    ///   unparsable payload
    async fn fetch_published_versions(&self, package_name: &str)
    -> Result<VersionSet, FetchError>;
}

/// Response from the npm registry API
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    versions: HashMap<String, serde_json::Value>,
}

/// Registry implementation for the npm registry API
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("dep-advisor/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL)
    }
}

#[async_trait::async_trait]
impl Registry for NpmRegistry {
    async fn fetch_published_versions(
        &self,
        package_name: &str,
    ) -> Result<VersionSet, FetchError> {
        let encoded_name = Self::encode_package_name(package_name);
        let url = format!("{}/{}", self.base_url, encoded_name);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(package_name.to_string()));
        }

        if !status.is_success() {
            warn!("registry returned status {} for {}", status, url);
            return Err(FetchError::InvalidResponse(format!(
                "unexpected status: {status}"
            )));
        }

        let package_info: NpmPackageResponse = response.json().await.map_err(|e| {
            warn!("failed to parse registry response for {}: {}", package_name, e);
            FetchError::InvalidResponse(e.to_string())
        })?;

        let versions = package_info
            .versions
            .into_keys()
            .filter_map(|v| Version::parse(&v).ok())
            .collect();

        Ok(VersionSet::new(versions))
    }
}
