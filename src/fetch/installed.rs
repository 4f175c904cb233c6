//! Installed-version snapshot via the npm CLI

use std::collections::HashMap;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

use semver::Version;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::fetch::error::FetchError;
use crate::types::InstalledVersions;

/// Trait for querying the versions currently installed under a project root
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PackageManager: Send + Sync {
    /// Lists installed direct dependencies. Any spawn failure, non-zero
    /// exit, or unparsable payload is an error; callers treat it as an
    /// unknown snapshot, not as an empty one.
    async fn query_installed(&self, project_root: &Path)
    -> Result<InstalledVersions, FetchError>;
}

#[derive(Debug, Deserialize)]
struct NpmLsOutput {
    #[serde(default)]
    dependencies: HashMap<String, NpmLsEntry>,
}

#[derive(Debug, Deserialize)]
struct NpmLsEntry {
    version: Option<String>,
}

/// Parse the payload produced by `npm ls --json --depth=0`
///
/// Entries without a version (unmet or linked dependencies) are skipped.
pub fn parse_npm_ls(payload: &str) -> Result<InstalledVersions, FetchError> {
    let output: NpmLsOutput = serde_json::from_str(payload)
        .map_err(|e| FetchError::PackageManager(format!("unparsable npm ls output: {e}")))?;

    Ok(output
        .dependencies
        .into_iter()
        .filter_map(|(name, entry)| {
            let version = entry.version?;
            Version::parse(&version).ok().map(|parsed| (name, parsed))
        })
        .collect())
}

/// Package manager implementation backed by the npm CLI
#[derive(Debug, Default)]
pub struct NpmPackageManager;

impl NpmPackageManager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl PackageManager for NpmPackageManager {
    async fn query_installed(
        &self,
        project_root: &Path,
    ) -> Result<InstalledVersions, FetchError> {
        debug!("listing installed packages under {:?}", project_root);

        let output = Command::new("npm")
            .args(["ls", "--json", "--depth=0"])
            .current_dir(project_root)
            .output()
            .await
            .map_err(|e| FetchError::PackageManager(format!("failed to run npm ls: {e}")))?;

        if !output.status.success() {
            return Err(FetchError::PackageManager(format!(
                "npm ls exited with {}",
                output.status
            )));
        }

        parse_npm_ls(&String::from_utf8_lossy(&output.stdout))
    }
}
