//! Status classification for a single declared dependency
//!
//! A single pass per dependency, pure once the published set and installed
//! snapshot are available. Transitions are input-driven; there are no
//! retries in here.

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::config::UpdatePolicy;
use crate::resolve::update::{self, Resolution};
use crate::types::{
    BumpLevel, DeclaredDependency, DependencyStatus, InstalledVersions, StatusKind, VersionSet,
};

/// npm package naming rules: optional scope, lowercase URL-safe characters
static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:@[a-z0-9\-~][a-z0-9\-._~]*/)?[a-z0-9\-~][a-z0-9\-._~]*$")
        .expect("invalid package name pattern")
});

const MAX_NAME_LEN: usize = 214;

pub fn is_valid_package_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LEN && PACKAGE_NAME.is_match(name)
}

/// Classify one dependency from its resolved inputs.
///
/// `installed` is `None` when the snapshot is unknown; an unknown snapshot
/// and an unknown registry baseline together mean the dependency has not
/// been installed yet.
pub fn classify(
    dep: &DeclaredDependency,
    published: &VersionSet,
    installed: Option<&InstalledVersions>,
    policy: &UpdatePolicy,
) -> DependencyStatus {
    if !is_valid_package_name(&dep.name) {
        return DependencyStatus::bare(&dep.name, StatusKind::NotApplicable);
    }

    let resolution = match update::resolve(&dep.raw_range, published, policy) {
        Resolution::Skip => return DependencyStatus::bare(&dep.name, StatusKind::NotApplicable),
        Resolution::InvalidRange => {
            return DependencyStatus::bare(&dep.name, StatusKind::InvalidRange);
        }
        Resolution::Resolved(result) => result,
    };

    let installed_version = installed
        .and_then(|versions| versions.get(&dep.name))
        .cloned();

    if !published.contains(&resolution.baseline) {
        let kind = if installed_version.is_none() {
            StatusKind::InstallPending
        } else {
            StatusKind::VersionNotFound
        };
        return DependencyStatus {
            name: dep.name.clone(),
            kind,
            suggested: None,
            latest: resolution.latest,
            installed: installed_version,
            advisory: None,
        };
    }

    // With no installed version to compare against, the baseline anchors
    // the comparison
    let anchor = installed_version
        .clone()
        .unwrap_or_else(|| resolution.baseline.clone());

    let kind = match &resolution.suggestion {
        None => StatusKind::UpToDate,
        Some(suggestion) if !suggestion.pre.is_empty() && *suggestion > anchor => {
            StatusKind::PrereleaseUpdateAvailable
        }
        Some(suggestion) if *suggestion <= anchor => StatusKind::UpToDate,
        Some(suggestion) => {
            let kind = if resolution.crosses_major && suggestion.major != anchor.major {
                StatusKind::MajorUpdateAvailable
            } else {
                StatusKind::UpdateAvailable
            };
            apply_bump_floor(kind, &anchor, suggestion, policy)
        }
    };

    DependencyStatus {
        name: dep.name.clone(),
        kind,
        suggested: resolution.suggestion,
        latest: resolution.latest,
        installed: installed_version,
        advisory: None,
    }
}

/// Bumps below the configured floor degrade to up-to-date: no diagnostic,
/// but not an error
fn apply_bump_floor(
    kind: StatusKind,
    anchor: &Version,
    suggestion: &Version,
    policy: &UpdatePolicy,
) -> StatusKind {
    if BumpLevel::between(anchor, suggestion) < policy.minimum_bump_level {
        StatusKind::UpToDate
    } else {
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::types::DependencySection;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn published(versions: &[&str]) -> VersionSet {
        VersionSet::new(versions.iter().map(|s| v(s)).collect())
    }

    fn installed(entries: &[(&str, &str)]) -> InstalledVersions {
        entries
            .iter()
            .map(|(name, version)| (name.to_string(), v(version)))
            .collect()
    }

    fn dep(name: &str, raw_range: &str) -> DeclaredDependency {
        DeclaredDependency::new(name, raw_range, DependencySection::Dependencies)
    }

    #[rstest]
    #[case("lodash", true)]
    #[case("@types/node", true)]
    #[case("some-pkg.js", true)]
    #[case("", false)]
    #[case("UPPERCASE", false)]
    #[case(".hidden", false)]
    #[case("pkg name", false)]
    #[case("@scope/", false)]
    fn package_name_validation(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_valid_package_name(name), expected);
    }

    #[test]
    fn update_available_inside_the_declared_range() {
        let status = classify(
            &dep("lodash", "^1.0.0"),
            &published(&["1.0.0", "1.0.1"]),
            Some(&installed(&[("lodash", "1.0.0")])),
            &UpdatePolicy::default(),
        );

        assert_eq!(status.kind, StatusKind::UpdateAvailable);
        assert_eq!(status.suggested, Some(v("1.0.1")));
        assert_eq!(status.installed, Some(v("1.0.0")));
    }

    #[test]
    fn ceiling_fallback_reports_a_plain_update() {
        let status = classify(
            &dep("lodash", "^1.0.1"),
            &published(&["1.0.0", "1.0.1", "2.0.0"]),
            Some(&installed(&[("lodash", "1.0.0")])),
            &UpdatePolicy::default(),
        );

        assert_eq!(status.kind, StatusKind::UpdateAvailable);
        assert_eq!(status.suggested, Some(v("2.0.0")));
    }

    #[test]
    fn prerelease_graduation_is_a_plain_update() {
        let status = classify(
            &dep("lodash", "^1.0.1-alpha"),
            &published(&["1.0.0", "1.0.1-alpha", "1.0.1"]),
            Some(&installed(&[("lodash", "1.0.1-alpha")])),
            &UpdatePolicy::default(),
        );

        assert_eq!(status.kind, StatusKind::UpdateAvailable);
        assert_eq!(status.suggested, Some(v("1.0.1")));
    }

    #[test]
    fn newer_prerelease_within_the_line_is_a_prerelease_update() {
        let status = classify(
            &dep("lodash", "^1.0.1-alpha"),
            &published(&["1.0.1-alpha", "1.0.2-beta"]),
            Some(&installed(&[("lodash", "1.0.1-alpha")])),
            &UpdatePolicy::default(),
        );

        assert_eq!(status.kind, StatusKind::PrereleaseUpdateAvailable);
        assert_eq!(status.suggested, Some(v("1.0.2-beta")));
    }

    #[test]
    fn unprotected_major_jump_is_a_major_update() {
        let policy = UpdatePolicy {
            major_update_protection: false,
            ..UpdatePolicy::default()
        };
        let status = classify(
            &dep("lodash", "^1.0.0"),
            &published(&["1.0.0", "2.0.0"]),
            Some(&installed(&[("lodash", "1.0.0")])),
            &policy,
        );

        assert_eq!(status.kind, StatusKind::MajorUpdateAvailable);
        assert_eq!(status.suggested, Some(v("2.0.0")));
    }

    #[test]
    fn matching_installed_version_is_up_to_date() {
        let status = classify(
            &dep("lodash", "^1.0.0"),
            &published(&["1.0.0", "1.0.1"]),
            Some(&installed(&[("lodash", "1.0.1")])),
            &UpdatePolicy::default(),
        );

        assert_eq!(status.kind, StatusKind::UpToDate);
    }

    #[test]
    fn installed_ahead_of_suggestion_is_up_to_date() {
        let status = classify(
            &dep("lodash", "^1.0.0"),
            &published(&["1.0.0", "1.0.1"]),
            Some(&installed(&[("lodash", "1.2.0")])),
            &UpdatePolicy::default(),
        );

        assert_eq!(status.kind, StatusKind::UpToDate);
    }

    #[test]
    fn unknown_baseline_without_installed_version_is_install_pending() {
        let status = classify(
            &dep("lodash", "^1.0.2"),
            &published(&["1.0.0", "1.0.1"]),
            None,
            &UpdatePolicy::default(),
        );

        assert_eq!(status.kind, StatusKind::InstallPending);
    }

    #[test]
    fn unknown_baseline_with_installed_version_is_version_not_found() {
        let status = classify(
            &dep("lodash", "^1.0.2"),
            &published(&["1.0.0", "1.0.1"]),
            Some(&installed(&[("lodash", "1.0.0")])),
            &UpdatePolicy::default(),
        );

        assert_eq!(status.kind, StatusKind::VersionNotFound);
        assert_eq!(status.latest, Some(v("1.0.1")));
    }

    #[rstest]
    #[case("^1.0.0 || ^2.0.0")]
    #[case("file:../local")]
    #[case("workspace:^1.0.0")]
    fn unsupported_ranges_are_not_applicable(#[case] raw: &str) {
        let status = classify(
            &dep("lodash", raw),
            &published(&["1.0.0"]),
            None,
            &UpdatePolicy::default(),
        );
        assert_eq!(status.kind, StatusKind::NotApplicable);
    }

    #[test]
    fn invalid_name_is_not_applicable_before_anything_else() {
        let status = classify(
            &dep("Not A Package", "^1.0.0"),
            &published(&["1.0.0"]),
            None,
            &UpdatePolicy::default(),
        );
        assert_eq!(status.kind, StatusKind::NotApplicable);
    }

    #[test]
    fn unparsable_range_is_invalid() {
        let status = classify(
            &dep("lodash", "latest"),
            &published(&["1.0.0"]),
            None,
            &UpdatePolicy::default(),
        );
        assert_eq!(status.kind, StatusKind::InvalidRange);
    }

    #[rstest]
    // Patch bump suppressed by a minor floor
    #[case(BumpLevel::Minor, "^1.0.0", &["1.0.0", "1.0.1"], "1.0.0", StatusKind::UpToDate)]
    // Minor bump passes a minor floor
    #[case(BumpLevel::Minor, "^1.0.0", &["1.0.0", "1.1.0"], "1.0.0", StatusKind::UpdateAvailable)]
    // Minor bump suppressed by a major floor
    #[case(BumpLevel::Major, "^1.0.0", &["1.0.0", "1.1.0"], "1.0.0", StatusKind::UpToDate)]
    // Major bump always passes
    #[case(BumpLevel::Major, "^1.0.1", &["1.0.0", "1.0.1", "2.0.0"], "1.0.0", StatusKind::UpdateAvailable)]
    fn minimum_bump_level_suppresses_small_updates(
        #[case] floor: BumpLevel,
        #[case] raw: &str,
        #[case] versions: &[&str],
        #[case] installed_version: &str,
        #[case] expected: StatusKind,
    ) {
        let policy = UpdatePolicy {
            minimum_bump_level: floor,
            ..UpdatePolicy::default()
        };
        let status = classify(
            &dep("lodash", raw),
            &published(versions),
            Some(&installed(&[("lodash", installed_version)])),
            &policy,
        );
        assert_eq!(status.kind, expected);
    }

    #[test]
    fn baseline_anchors_comparison_when_installed_is_unknown() {
        let status = classify(
            &dep("lodash", "^1.0.0"),
            &published(&["1.0.0", "1.0.1"]),
            None,
            &UpdatePolicy::default(),
        );

        assert_eq!(status.kind, StatusKind::UpdateAvailable);
        assert_eq!(status.suggested, Some(v("1.0.1")));
        assert_eq!(status.installed, None);
    }
}
