//! Cached, de-duplicated fetch layer in front of the external collaborators
//!
//! Every query is keyed, TTL-cached, and shared: concurrent calls for the
//! same key before resolution clone the same in-flight future, so at most
//! one external query runs per key per TTL window regardless of call volume.
//! A failed query discards its cache entry immediately so the next caller
//! retries at once instead of waiting out the TTL on a poisoned value.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use semver::Version;
use tracing::{debug, warn};

use crate::concurrency::cache::TtlCache;
use crate::concurrency::gate::ConcurrencyGate;
use crate::config::{EngineConfig, INSTALLED_TTL_MS};
use crate::fetch::advisory::AdvisorySource;
use crate::fetch::error::FetchError;
use crate::fetch::installed::PackageManager;
use crate::fetch::registry::Registry;
use crate::types::{AdvisoryRecord, InstalledVersions, VersionSet};

type FetchResult<T> = Result<Arc<T>, Arc<FetchError>>;

pub struct VersionProvider {
    registry: Arc<dyn Registry>,
    package_manager: Arc<dyn PackageManager>,
    advisory_source: Arc<dyn AdvisorySource>,
    gate: ConcurrencyGate,
    published_cache: TtlCache<String, FetchResult<VersionSet>>,
    installed_cache: TtlCache<PathBuf, FetchResult<InstalledVersions>>,
    advisory_cache: TtlCache<String, FetchResult<Vec<AdvisoryRecord>>>,
}

impl VersionProvider {
    pub fn new(
        config: &EngineConfig,
        registry: Arc<dyn Registry>,
        package_manager: Arc<dyn PackageManager>,
        advisory_source: Arc<dyn AdvisorySource>,
    ) -> Self {
        let published_ttl = Duration::from_millis(config.cache.published_ttl);
        Self {
            registry,
            package_manager,
            advisory_source,
            gate: ConcurrencyGate::new(config.fetch.concurrency_limit),
            published_cache: TtlCache::new(published_ttl),
            installed_cache: TtlCache::new(Duration::from_millis(INSTALLED_TTL_MS)),
            advisory_cache: TtlCache::new(published_ttl),
        }
    }

    /// All published versions for a package. `None` when the query failed
    /// this cycle; callers degrade to "no data for this dependency".
    pub async fn published_versions(&self, package_name: &str) -> Option<Arc<VersionSet>> {
        let key = package_name.to_string();
        let entry = self.published_cache.get_or_insert_with(&key, || {
            let registry = Arc::clone(&self.registry);
            let gate = self.gate.clone();
            let name = key.clone();
            async move {
                let _ticket = gate.acquire().await;
                debug!("fetching published versions for {}", name);
                registry
                    .fetch_published_versions(&name)
                    .await
                    .map(Arc::new)
                    .map_err(Arc::new)
            }
            .boxed()
            .shared()
        });

        match entry.value.clone().await {
            Ok(versions) => Some(versions),
            Err(e) => {
                warn!("failed to fetch published versions for {}: {}", package_name, e);
                self.published_cache.invalidate(&key, entry.created_at);
                None
            }
        }
    }

    /// Snapshot of installed versions under a project root. One snapshot per
    /// root per TTL window, since listing the whole installed set is itself
    /// one expensive call. `None` means unknown, not empty.
    pub async fn installed_versions(&self, project_root: &Path) -> Option<Arc<InstalledVersions>> {
        let key = project_root.to_path_buf();
        let entry = self.installed_cache.get_or_insert_with(&key, || {
            let package_manager = Arc::clone(&self.package_manager);
            let root = key.clone();
            async move {
                package_manager
                    .query_installed(&root)
                    .await
                    .map(Arc::new)
                    .map_err(Arc::new)
            }
            .boxed()
            .shared()
        });

        match entry.value.clone().await {
            Ok(installed) => Some(installed),
            Err(e) => {
                warn!("failed to list installed versions under {:?}: {}", project_root, e);
                self.installed_cache.invalidate(&key, entry.created_at);
                None
            }
        }
    }

    /// Advisories for a package, empty when the lookup failed (advisory
    /// enrichment is skipped for the cycle).
    pub async fn advisories(
        &self,
        package_name: &str,
        published: &VersionSet,
    ) -> Arc<Vec<AdvisoryRecord>> {
        let key = package_name.to_string();
        let entry = self.advisory_cache.get_or_insert_with(&key, || {
            let source = Arc::clone(&self.advisory_source);
            let gate = self.gate.clone();
            let name = key.clone();
            let versions: Vec<Version> = published.iter().cloned().collect();
            async move {
                let _ticket = gate.acquire().await;
                source
                    .fetch_advisories(&name, &versions)
                    .await
                    .map(Arc::new)
                    .map_err(Arc::new)
            }
            .boxed()
            .shared()
        });

        match entry.value.clone().await {
            Ok(advisories) => advisories,
            Err(e) => {
                warn!("failed to fetch advisories for {}: {}", package_name, e);
                self.advisory_cache.invalidate(&key, entry.created_at);
                Arc::new(Vec::new())
            }
        }
    }
}
