use serde::Deserialize;

use crate::types::BumpLevel;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default TTL for published-version cache entries in milliseconds (20 minutes)
pub const DEFAULT_PUBLISHED_TTL_MS: u64 = 20 * 60 * 1000;

/// TTL for the installed-versions snapshot in milliseconds (1 minute).
/// Installed versions change far less often than the engine is invoked.
pub const INSTALLED_TTL_MS: u64 = 60 * 1000;

/// Leading delay before a fresh recomputation cycle starts (250ms)
pub const TRIGGER_WAIT_MS: u64 = 250;

/// Pause between a completed cycle and a coalesced pending one (500ms)
pub const TRIGGER_DELAY_MS: u64 = 500;

/// Default bound on simultaneous external lookups
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 8;

/// Default base URL for the npm registry
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Engine configuration, deserialized from the host's settings payload
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub update: UpdatePolicy,
    pub cache: CacheConfig,
    pub fetch: FetchConfig,
}

/// Policy inputs for update resolution and classification
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePolicy {
    /// Prefer suggestions within the declared range's major line over the
    /// latest overall version
    pub major_update_protection: bool,
    /// Bumps below this floor are reported as up to date
    pub minimum_bump_level: BumpLevel,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            major_update_protection: true,
            minimum_bump_level: BumpLevel::Patch,
        }
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Published-version cache TTL in milliseconds
    pub published_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            published_ttl: DEFAULT_PUBLISHED_TTL_MS,
        }
    }
}

/// Fetch-layer configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchConfig {
    /// Max simultaneous external lookups; 0 disables the bound
    pub concurrency_limit: usize,
    pub registry_url: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
        }
    }
}
