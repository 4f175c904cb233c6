//! Advisory adjustment pass over a classified dependency
//!
//! Runs after status classification and only when the installed version is
//! known. Produces an additional record surfaced alongside the version
//! status, never a replacement for it.

use semver::Version;
use tracing::debug;

use crate::resolve::range::RangeSpec;
use crate::types::{AdvisoryRecord, DependencyStatus, StatusKind, VersionSet};

/// True when `version` falls inside the advisory's vulnerable range
fn affects(advisory: &AdvisoryRecord, version: &Version) -> bool {
    RangeSpec::parse(&advisory.vulnerable_range).is_some_and(|spec| spec.matches(version))
}

/// True when `version` falls inside any advisory's vulnerable range
fn is_vulnerable(version: &Version, advisories: &[AdvisoryRecord]) -> bool {
    advisories.iter().any(|advisory| affects(advisory, version))
}

/// Fold advisories into a classified status.
///
/// Returns a record when the installed version is vulnerable: a safe forward
/// upgrade when the suggestion escapes every advisory, otherwise the highest
/// unaffected version below the installed one, otherwise the advisory alone
/// with no actionable target.
pub fn apply_advisories(
    status: &DependencyStatus,
    published: &VersionSet,
    advisories: &[AdvisoryRecord],
) -> Option<DependencyStatus> {
    let installed = status.installed.as_ref()?;

    let matching: Vec<&AdvisoryRecord> = advisories
        .iter()
        .filter(|advisory| affects(advisory, installed))
        .collect();
    if matching.is_empty() {
        return None;
    }

    // Carry the worst advisory for display
    let top = matching
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|advisory| (*advisory).clone());

    if let Some(suggestion) = &status.suggested
        && !is_vulnerable(suggestion, advisories)
    {
        return Some(DependencyStatus {
            name: status.name.clone(),
            kind: StatusKind::AdvisoryUpdateAvailable,
            suggested: Some(suggestion.clone()),
            latest: status.latest.clone(),
            installed: Some(installed.clone()),
            advisory: top,
        });
    }

    // No safe forward upgrade: look for the highest unaffected version below
    // the installed one. Prereleases are only candidates when the installed
    // version is itself a prerelease.
    let include_prerelease = !installed.pre.is_empty();
    let target = published
        .iter()
        .rev()
        .filter(|&candidate| candidate < installed)
        .filter(|&candidate| include_prerelease || candidate.pre.is_empty())
        .find(|&candidate| !is_vulnerable(candidate, advisories))
        .cloned();

    if target.is_none() {
        debug!("no unaffected published version exists for {}", status.name);
    }

    Some(DependencyStatus {
        name: status.name.clone(),
        kind: StatusKind::AdvisoryDowngradeNeeded,
        suggested: target,
        latest: status.latest.clone(),
        installed: Some(installed.clone()),
        advisory: top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::Severity;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn published(versions: &[&str]) -> VersionSet {
        VersionSet::new(versions.iter().map(|s| v(s)).collect())
    }

    fn advisory(vulnerable_range: &str, score: f64) -> AdvisoryRecord {
        AdvisoryRecord {
            vulnerable_range: vulnerable_range.to_string(),
            severity: Severity::High,
            score,
            title: format!("Vulnerability in {vulnerable_range}"),
            url: "https://github.com/advisories/GHSA-test".to_string(),
        }
    }

    fn status(installed: Option<&str>, suggested: Option<&str>) -> DependencyStatus {
        DependencyStatus {
            name: "lodash".to_string(),
            kind: StatusKind::UpToDate,
            suggested: suggested.map(v),
            latest: suggested.map(v),
            installed: installed.map(v),
            advisory: None,
        }
    }

    #[test]
    fn safe_suggestion_becomes_an_advisory_update() {
        let result = apply_advisories(
            &status(Some("1.0.0"), Some("1.0.1")),
            &published(&["1.0.0", "1.0.1"]),
            &[advisory("<1.0.1", 7.5)],
        )
        .unwrap();

        assert_eq!(result.kind, StatusKind::AdvisoryUpdateAvailable);
        assert_eq!(result.suggested, Some(v("1.0.1")));
        assert_eq!(result.advisory.unwrap().score, 7.5);
    }

    #[test]
    fn vulnerable_suggestion_triggers_a_downgrade() {
        // Declared ^1.0.1 resolves back to 1.0.1, which is itself affected;
        // the only unaffected release below the installed version is 1.0.0
        let result = apply_advisories(
            &status(Some("1.0.1"), Some("1.0.1")),
            &published(&["1.0.0", "1.0.1", "1.0.1-alpha"]),
            &[advisory("1.0.1", 6.1)],
        )
        .unwrap();

        assert_eq!(result.kind, StatusKind::AdvisoryDowngradeNeeded);
        assert_eq!(result.suggested, Some(v("1.0.0")));
    }

    #[test]
    fn downgrade_skips_prereleases_for_release_installs() {
        let result = apply_advisories(
            &status(Some("1.0.1"), Some("1.0.1")),
            &published(&["1.0.1-alpha", "1.0.1"]),
            &[advisory("1.0.1", 6.1)],
        )
        .unwrap();

        // 1.0.1-alpha is below the installed version but not a release
        assert_eq!(result.kind, StatusKind::AdvisoryDowngradeNeeded);
        assert_eq!(result.suggested, None);
    }

    #[test]
    fn no_unaffected_version_reports_the_advisory_without_a_target() {
        let result = apply_advisories(
            &status(Some("1.0.1"), Some("1.0.1")),
            &published(&["1.0.0", "1.0.1"]),
            &[advisory("<=1.0.1", 9.8)],
        )
        .unwrap();

        assert_eq!(result.kind, StatusKind::AdvisoryDowngradeNeeded);
        assert_eq!(result.suggested, None);
        assert_eq!(result.advisory.unwrap().score, 9.8);
    }

    #[test]
    fn unaffected_installed_version_produces_no_record() {
        let result = apply_advisories(
            &status(Some("2.0.0"), Some("2.0.0")),
            &published(&["1.0.0", "2.0.0"]),
            &[advisory("<2.0.0", 7.5)],
        );

        assert!(result.is_none());
    }

    #[test]
    fn unknown_installed_version_skips_enrichment() {
        let result = apply_advisories(
            &status(None, Some("1.0.1")),
            &published(&["1.0.0", "1.0.1"]),
            &[advisory("<1.0.1", 7.5)],
        );

        assert!(result.is_none());
    }

    #[test]
    fn highest_scored_matching_advisory_is_carried() {
        let result = apply_advisories(
            &status(Some("1.0.0"), Some("1.0.1")),
            &published(&["1.0.0", "1.0.1"]),
            &[advisory("<1.0.1", 5.0), advisory("<=1.0.0", 9.1)],
        )
        .unwrap();

        assert_eq!(result.advisory.unwrap().score, 9.1);
    }

    #[test]
    fn disjunctive_vulnerable_ranges_are_honored() {
        let result = apply_advisories(
            &status(Some("2.1.0"), Some("2.2.0")),
            &published(&["1.0.0", "2.1.0", "2.2.0"]),
            &[advisory("<1.0.0 || >=2.0.0 <2.2.0", 8.2)],
        )
        .unwrap();

        assert_eq!(result.kind, StatusKind::AdvisoryUpdateAvailable);
        assert_eq!(result.suggested, Some(v("2.2.0")));
    }
}
