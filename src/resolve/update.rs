//! Update resolution: compute the recommended upgrade target for a declared
//! range against the published version set
//!
//! Pure and synchronous; recomputed on every classification pass. Only its
//! inputs are cached, never its output.

use semver::Version;

use crate::config::UpdatePolicy;
use crate::resolve::range::{self, Range, RangeSpec};
use crate::types::VersionSet;

/// Outcome of resolving a declared range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The range is outside the resolvable domain (disjunctive, or a path,
    /// URL, VCS, or workspace reference); no diagnostic is emitted
    Skip,
    /// A registry-style range from which no baseline version could be
    /// extracted
    InvalidRange,
    Resolved(ResolutionResult),
}

/// A computed upgrade recommendation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    /// Bare version extracted from the declared range
    pub baseline: Version,
    /// Recommended upgrade target, if any
    pub suggestion: Option<Version>,
    /// Newest published version under the prerelease-inclusion rule
    pub latest: Option<Version>,
    /// The baseline carries a prerelease tag
    pub is_prerelease: bool,
    /// The suggestion is the unprotected latest and changes the major
    /// component relative to the baseline. Classification confirms this
    /// against the installed version before reporting a major update.
    pub crosses_major: bool,
}

pub fn resolve(raw_range: &str, published: &VersionSet, policy: &UpdatePolicy) -> Resolution {
    if range::is_disjunctive(raw_range) || !range::is_registry_range(raw_range) {
        return Resolution::Skip;
    }
    let Some(baseline) = range::baseline(raw_range) else {
        return Resolution::InvalidRange;
    };

    let is_prerelease = !baseline.pre.is_empty();
    let latest = published.latest(is_prerelease).cloned();

    if !policy.major_update_protection {
        let crosses_major = latest.as_ref().is_some_and(|l| l.major != baseline.major);
        return Resolution::Resolved(ResolutionResult {
            suggestion: latest.clone(),
            latest,
            is_prerelease,
            crosses_major,
            baseline,
        });
    }

    if is_prerelease {
        // Graduating out of a prerelease line takes priority over staying on
        // newer prereleases within it
        let release = Version::new(baseline.major, baseline.minor, baseline.patch);
        let compatible = RangeSpec::Single(Range::Caret(release));
        if let Some(graduated) = range::max_satisfying(&compatible, published, false)
            && *graduated > baseline
        {
            return Resolution::Resolved(ResolutionResult {
                suggestion: Some(graduated.clone()),
                latest,
                is_prerelease,
                crosses_major: false,
                baseline,
            });
        }
    }

    let compatible = RangeSpec::Single(Range::Caret(baseline.clone()));
    let satisfying = range::max_satisfying(&compatible, published, is_prerelease);
    let suggestion = match satisfying {
        // The declared range's ceiling is already the newest compatible
        // version; offer the latest overall instead of staying silent
        None => latest.clone(),
        Some(ceiling) if *ceiling == baseline => latest.clone(),
        Some(newer) => Some(newer.clone()),
    };

    Resolution::Resolved(ResolutionResult {
        baseline,
        suggestion,
        latest,
        is_prerelease,
        crosses_major: false,
    })
}
