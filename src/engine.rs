//! Engine orchestration: fetch, classify, enrich, assemble
//!
//! One call checks every declared dependency of a project. The installed
//! snapshot is fetched once per cycle, published versions and advisories per
//! package through the cached provider. Failures are isolated per
//! dependency: a dependency whose data cannot be fetched this cycle simply
//! produces no report and is retried on the next cycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;
use indexmap::IndexMap;
use tracing::debug;

use crate::concurrency::debounce::DebouncedTrigger;
use crate::config::{EngineConfig, TRIGGER_DELAY_MS, TRIGGER_WAIT_MS};
use crate::fetch::advisory::{AdvisorySource, NpmAdvisorySource};
use crate::fetch::installed::{NpmPackageManager, PackageManager};
use crate::fetch::provider::VersionProvider;
use crate::fetch::registry::{NpmRegistry, Registry};
use crate::resolve::{advisory, range, status};
use crate::types::{DeclaredDependency, DependencyReport, InstalledVersions, StatusKind};

/// One recomputation request: the project to check and its declared
/// dependencies as of the latest manifest read
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub project_root: PathBuf,
    pub dependencies: Vec<DeclaredDependency>,
}

pub struct DependencyEngine {
    provider: VersionProvider,
    config: EngineConfig,
}

impl DependencyEngine {
    /// Engine wired to the npm registry, the npm CLI, and the npm advisory
    /// endpoint
    pub fn new(config: EngineConfig) -> Self {
        let registry = Arc::new(NpmRegistry::new(&config.fetch.registry_url));
        let package_manager = Arc::new(NpmPackageManager::new());
        let advisory_source = Arc::new(NpmAdvisorySource::new(&config.fetch.registry_url));
        Self::with_sources(config, registry, package_manager, advisory_source)
    }

    /// Engine with injected collaborators
    pub fn with_sources(
        config: EngineConfig,
        registry: Arc<dyn Registry>,
        package_manager: Arc<dyn PackageManager>,
        advisory_source: Arc<dyn AdvisorySource>,
    ) -> Self {
        let provider = VersionProvider::new(&config, registry, package_manager, advisory_source);
        Self { provider, config }
    }

    /// Check every declared dependency of a project and assemble the reports
    /// keyed by package name.
    ///
    /// Non-resolvable entries and dependencies whose data could not be
    /// fetched this cycle produce no report. Completion order across
    /// dependencies is unspecified; the returned map is keyed, not ordered
    /// by arrival.
    pub async fn check_project(
        &self,
        project_root: &Path,
        dependencies: &[DeclaredDependency],
    ) -> IndexMap<String, DependencyReport> {
        let installed = self.provider.installed_versions(project_root).await;

        let checks = dependencies.iter().map(|dep| {
            let installed = installed.clone();
            async move {
                (
                    dep.name.clone(),
                    self.check_dependency(dep, installed.as_deref()).await,
                )
            }
        });

        let mut reports = IndexMap::new();
        for (name, report) in join_all(checks).await {
            if let Some(report) = report {
                reports.insert(name, report);
            }
        }
        debug!(
            "checked {} dependencies, {} reportable",
            dependencies.len(),
            reports.len()
        );
        reports
    }

    async fn check_dependency(
        &self,
        dep: &DeclaredDependency,
        installed: Option<&InstalledVersions>,
    ) -> Option<DependencyReport> {
        // Entries outside the resolvable domain are filtered before any
        // lookup happens
        if !status::is_valid_package_name(&dep.name)
            || range::is_disjunctive(&dep.raw_range)
            || !range::is_registry_range(&dep.raw_range)
        {
            return None;
        }

        let published = self.provider.published_versions(&dep.name).await?;

        let version_status = status::classify(dep, &published, installed, &self.config.update);
        if version_status.kind == StatusKind::NotApplicable {
            return None;
        }

        let advisory_status = if version_status.installed.is_some() {
            let advisories = self.provider.advisories(&dep.name, &published).await;
            advisory::apply_advisories(&version_status, &published, &advisories)
        } else {
            None
        };

        Some(DependencyReport {
            version: version_status,
            advisory: advisory_status,
        })
    }

    /// Wrap full recomputation behind the debounced trigger.
    ///
    /// Bursts of manifest-change notifications collapse into at most one
    /// in-flight check plus one coalesced pending check. Results reach
    /// `on_results` in completion order; a superseded cycle's results are
    /// simply overwritten downstream (last write wins).
    pub fn debounced(
        self: &Arc<Self>,
        on_results: impl Fn(IndexMap<String, DependencyReport>) + Send + Sync + 'static,
    ) -> DebouncedTrigger<CheckRequest> {
        let engine = Arc::clone(self);
        let on_results = Arc::new(on_results);
        DebouncedTrigger::new(
            Some(Duration::from_millis(TRIGGER_WAIT_MS)),
            Some(Duration::from_millis(TRIGGER_DELAY_MS)),
            move |request: CheckRequest| {
                let engine = Arc::clone(&engine);
                let on_results = Arc::clone(&on_results);
                async move {
                    let reports = engine
                        .check_project(&request.project_root, &request.dependencies)
                        .await;
                    on_results(reports);
                }
                .boxed()
            },
        )
    }
}
