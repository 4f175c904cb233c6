//! Common types shared across the engine

use std::collections::HashMap;

use semver::Version;
use serde::Deserialize;

/// Manifest section a dependency was declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencySection {
    Dependencies,
    DevDependencies,
    OptionalDependencies,
}

impl DependencySection {
    /// Returns the manifest key for the section
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencySection::Dependencies => "dependencies",
            DependencySection::DevDependencies => "devDependencies",
            DependencySection::OptionalDependencies => "optionalDependencies",
        }
    }
}

/// One declared dependency entry, snapshotted at manifest-read time.
///
/// Owned by the manifest-parsing collaborator; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    /// Package name (e.g., "lodash", "@types/node")
    pub name: String,
    /// Raw version range as written in the manifest (e.g., "^1.2.3")
    pub raw_range: String,
    /// Section the entry was declared in
    pub section: DependencySection,
}

impl DeclaredDependency {
    pub fn new(name: &str, raw_range: &str, section: DependencySection) -> Self {
        Self {
            name: name.to_string(),
            raw_range: raw_range.to_string(),
            section,
        }
    }
}

/// Ordered, deduplicated set of published versions for one package.
///
/// Immutable once fetched; this is the value a cache entry holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSet {
    versions: Vec<Version>,
}

impl VersionSet {
    pub fn new(mut versions: Vec<Version>) -> Self {
        versions.sort();
        versions.dedup();
        Self { versions }
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Iterate versions in ascending order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Version> {
        self.versions.iter()
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.versions.binary_search(version).is_ok()
    }

    /// Newest published version. Prereleases are only candidates when
    /// `include_prerelease` is set.
    pub fn latest(&self, include_prerelease: bool) -> Option<&Version> {
        self.versions
            .iter()
            .rev()
            .find(|v| include_prerelease || v.pre.is_empty())
    }
}

/// Snapshot of installed versions keyed by package name
pub type InstalledVersions = HashMap<String, Version>;

/// Advisory severity ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// A reported vulnerability affecting a range of published versions
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryRecord {
    /// Range of affected versions (npm range grammar, may contain `||`)
    pub vulnerable_range: String,
    pub severity: Severity,
    /// CVSS score; 0 when the source reports none
    pub score: f64,
    pub title: String,
    pub url: String,
}

/// Granularity of a version bump
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    Patch,
    Minor,
    Major,
}

impl BumpLevel {
    /// Magnitude of the jump between two versions
    pub fn between(from: &Version, to: &Version) -> Self {
        if from.major != to.major {
            BumpLevel::Major
        } else if from.minor != to.minor {
            BumpLevel::Minor
        } else {
            BumpLevel::Patch
        }
    }
}

/// Final judgment for one declared dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    UpToDate,
    UpdateAvailable,
    MajorUpdateAvailable,
    PrereleaseUpdateAvailable,
    /// Nothing to compare against: the baseline is unknown to the registry
    /// and no installed version exists
    InstallPending,
    /// The baseline version does not exist in the registry
    VersionNotFound,
    InvalidRange,
    /// Out of the resolvable domain; produces no report
    NotApplicable,
    /// A safe forward upgrade escapes a vulnerability affecting the
    /// installed version
    AdvisoryUpdateAvailable,
    /// No safe forward upgrade exists; a downgrade (if any) is recommended
    AdvisoryDowngradeNeeded,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::UpToDate => "up-to-date",
            StatusKind::UpdateAvailable => "update-available",
            StatusKind::MajorUpdateAvailable => "major-update-available",
            StatusKind::PrereleaseUpdateAvailable => "prerelease-update-available",
            StatusKind::InstallPending => "install-pending",
            StatusKind::VersionNotFound => "version-not-found",
            StatusKind::InvalidRange => "invalid-range",
            StatusKind::NotApplicable => "not-applicable",
            StatusKind::AdvisoryUpdateAvailable => "advisory-update-available",
            StatusKind::AdvisoryDowngradeNeeded => "advisory-downgrade-needed",
        }
    }
}

/// The externally visible judgment for one dependency.
///
/// Plain data; holds nothing that points back at editor state.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyStatus {
    pub name: String,
    pub kind: StatusKind,
    /// Recommended upgrade (or downgrade) target
    pub suggested: Option<Version>,
    /// Newest published version under the prerelease-inclusion rule
    pub latest: Option<Version>,
    /// Installed version, when known
    pub installed: Option<Version>,
    /// Highest-scored advisory backing an advisory status
    pub advisory: Option<AdvisoryRecord>,
}

impl DependencyStatus {
    pub(crate) fn bare(name: &str, kind: StatusKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            suggested: None,
            latest: None,
            installed: None,
            advisory: None,
        }
    }
}

/// Version status plus an optional advisory finding for one dependency.
///
/// Advisory findings are surfaced alongside the version status, not instead
/// of it.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyReport {
    pub version: DependencyStatus,
    pub advisory: Option<DependencyStatus>,
}
