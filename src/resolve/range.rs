//! npm version range grammar
//!
//! Supports the registry-style range forms:
//! - `1.2.3` - exact match
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0)
//! - `~1.2.3` - approximately equivalent (>=1.2.3 <1.3.0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3`, `=1.2.3` - comparison operators
//! - `1.2.x`, `1.x`, `*` - wildcards
//! - `1.0.0 - 2.0.0` - hyphen ranges
//! - space-separated AND, `||`-separated OR
//!
//! Declared specs that are not version ranges at all (paths, URLs, VCS and
//! workspace references) are detected by [`is_registry_range`] and skipped
//! by resolution. Advisory `vulnerable_versions` strings use the same
//! grammar, including `||`, which is why OR stays supported here even though
//! resolution rejects disjunctive declared ranges up front.

use semver::Version;

use crate::types::VersionSet;

/// Parse a version string, padding partial versions and keeping any
/// prerelease or build suffix intact.
///
/// Examples:
/// - "1" -> 1.0.0
/// - "1.2" -> 1.2.0
/// - "1.2-rc.1" -> 1.2.0-rc.1
/// - "v1.2.3" -> 1.2.3
pub fn parse_loose(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    if version.is_empty() {
        return None;
    }
    if let Ok(parsed) = Version::parse(version) {
        return Some(parsed);
    }

    let (core, suffix) = match version.find(['-', '+']) {
        Some(i) => (&version[..i], &version[i..]),
        None => (version, ""),
    };
    let parts: Vec<&str> = core.split('.').collect();
    let padded = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        // A full triple already failed the strict parse above
        _ => return None,
    };
    Version::parse(&format!("{padded}{suffix}")).ok()
}

/// True when the raw spec joins alternatives with `||`
pub fn is_disjunctive(raw: &str) -> bool {
    raw.contains("||")
}

/// Spec prefixes that reference something other than registry versions
const NON_REGISTRY_PREFIXES: &[&str] = &[
    "file:",
    "link:",
    "portal:",
    "workspace:",
    "npm:",
    "git:",
    "git+",
    "github:",
    "http:",
    "https:",
];

/// True when the raw spec is a registry-style version range rather than a
/// path, URL, VCS, or workspace reference
pub fn is_registry_range(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.is_empty() {
        return false;
    }
    if NON_REGISTRY_PREFIXES.iter().any(|p| raw.starts_with(p)) {
        return false;
    }
    // GitHub shorthand (user/repo) and relative or absolute paths
    if raw.contains('/') || raw.starts_with('.') {
        return false;
    }
    true
}

/// A parsed range expression
#[derive(Debug)]
pub enum RangeSpec {
    Single(Range),
    /// Space-separated ranges; all must match
    And(Vec<RangeSpec>),
    /// `||`-separated specs; any must match
    Or(Vec<RangeSpec>),
}

impl RangeSpec {
    /// Parse a range expression string
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }

        // OR has the lowest precedence
        if spec.contains("||") {
            let specs: Option<Vec<RangeSpec>> = spec
                .split("||")
                .map(|part| Self::parse_conjunction(part.trim()))
                .collect();
            return specs.map(RangeSpec::Or);
        }

        Self::parse_conjunction(spec)
    }

    /// Parse a spec that may be space-separated AND ranges or a single range
    fn parse_conjunction(spec: &str) -> Option<Self> {
        let parts = split_conjunction(spec);
        match parts.as_slice() {
            [] => None,
            [single] => Range::parse(single).map(RangeSpec::Single),
            _ => {
                let ranges: Option<Vec<RangeSpec>> = parts
                    .iter()
                    .map(|part| Range::parse(part).map(RangeSpec::Single))
                    .collect();
                ranges.map(RangeSpec::And)
            }
        }
    }

    /// Check whether a version matches this spec
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            RangeSpec::Single(range) => range.matches(version),
            RangeSpec::And(specs) => specs.iter().all(|s| s.matches(version)),
            RangeSpec::Or(specs) => specs.iter().any(|s| s.matches(version)),
        }
    }

    /// Bare version underlying this spec, operator prefixes stripped.
    /// Compound specs take the first clause; wildcard-only specs have none.
    pub fn base_version(&self) -> Option<Version> {
        match self {
            RangeSpec::Single(range) => range.base_version(),
            RangeSpec::And(specs) | RangeSpec::Or(specs) => {
                specs.first().and_then(|s| s.base_version())
            }
        }
    }
}

/// Split a conjunction into its range tokens, re-joining hyphen ranges that
/// whitespace splitting tears apart
fn split_conjunction(spec: &str) -> Vec<String> {
    let tokens: Vec<&str> = spec.split_whitespace().collect();
    let mut parts = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if i + 2 < tokens.len() && tokens[i + 1] == "-" {
            parts.push(format!("{} - {}", tokens[i], tokens[i + 2]));
            i += 3;
        } else if i + 2 == tokens.len() && tokens[i + 1] == "-" {
            // Trailing "x -" with nothing after it is malformed; keep the
            // tokens as-is so parsing fails downstream
            parts.push(tokens[i].to_string());
            parts.push(tokens[i + 1].to_string());
            i += 2;
        } else {
            parts.push(tokens[i].to_string());
            i += 1;
        }
    }
    parts
}

/// One range clause
#[derive(Debug)]
pub enum Range {
    Exact(Version),
    /// ^1.2.3 means >=1.2.3 <2.0.0, with special cases below 1.0.0
    Caret(Version),
    /// ~1.2.3 means >=1.2.3 <1.3.0
    Tilde(Version),
    Gte(Version),
    Gt(Version),
    Lte(Version),
    Lt(Version),
    /// `*` or `x`: matches everything
    Wildcard,
    /// 1.x means >=1.0.0 <2.0.0
    WildcardMajor(u64),
    /// 1.2.x means >=1.2.0 <1.3.0
    WildcardMinor(u64, u64),
    /// 1.0.0 - 2.0.0 means >=1.0.0 <=2.0.0
    Hyphen { from: Version, to: Version },
}

impl Range {
    /// Parse a single range clause
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();

        if let Some(range) = Self::parse_hyphen(spec) {
            return Some(range);
        }

        if let Some(rest) = spec.strip_prefix(">=") {
            parse_loose(rest).map(Range::Gte)
        } else if let Some(rest) = spec.strip_prefix('>') {
            parse_loose(rest).map(Range::Gt)
        } else if let Some(rest) = spec.strip_prefix("<=") {
            parse_loose(rest).map(Range::Lte)
        } else if let Some(rest) = spec.strip_prefix('<') {
            parse_loose(rest).map(Range::Lt)
        } else if let Some(rest) = spec.strip_prefix('^') {
            parse_loose(rest).map(Range::Caret)
        } else if let Some(rest) = spec.strip_prefix('~') {
            parse_loose(rest).map(Range::Tilde)
        } else if let Some(rest) = spec.strip_prefix('=') {
            parse_loose(rest).map(Range::Exact)
        } else if spec == "*" || spec.eq_ignore_ascii_case("x") {
            Some(Range::Wildcard)
        } else if let Some(range) = Self::parse_wildcard(spec) {
            Some(range)
        } else {
            parse_loose(spec).map(Range::Exact)
        }
    }

    /// Parse a hyphen range like "1.0.0 - 2.0.0"
    fn parse_hyphen(spec: &str) -> Option<Self> {
        let (from, to) = spec.split_once(" - ")?;
        let from = parse_loose(from)?;
        let to = parse_loose(to)?;
        Some(Range::Hyphen { from, to })
    }

    /// Parse wildcard patterns like "1.x" or "1.2.x"
    fn parse_wildcard(spec: &str) -> Option<Self> {
        let parts: Vec<&str> = spec.split('.').collect();
        match parts.as_slice() {
            [major, x] if x.eq_ignore_ascii_case("x") => {
                major.parse::<u64>().ok().map(Range::WildcardMajor)
            }
            [major, minor, x] if x.eq_ignore_ascii_case("x") => {
                let major = major.parse::<u64>().ok()?;
                let minor = minor.parse::<u64>().ok()?;
                Some(Range::WildcardMinor(major, minor))
            }
            _ => None,
        }
    }

    /// Check whether a version matches this clause
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Range::Exact(v) => version == v,
            Range::Caret(v) => {
                if version < v {
                    return false;
                }
                // ^1.2.3 -> >=1.2.3 <2.0.0
                // ^0.2.3 -> >=0.2.3 <0.3.0
                // ^0.0.3 -> >=0.0.3 <0.0.4
                if v.major == 0 {
                    if v.minor == 0 {
                        version.major == 0 && version.minor == 0 && version.patch == v.patch
                    } else {
                        version.major == 0 && version.minor == v.minor
                    }
                } else {
                    version.major == v.major
                }
            }
            Range::Tilde(v) => {
                version >= v && version.major == v.major && version.minor == v.minor
            }
            Range::Gte(v) => version >= v,
            Range::Gt(v) => version > v,
            Range::Lte(v) => version <= v,
            Range::Lt(v) => version < v,
            Range::Wildcard => true,
            Range::WildcardMajor(major) => version.major == *major,
            Range::WildcardMinor(major, minor) => {
                version.major == *major && version.minor == *minor
            }
            Range::Hyphen { from, to } => version >= from && version <= to,
        }
    }

    /// Bare version underlying this clause, if any
    pub fn base_version(&self) -> Option<Version> {
        match self {
            Range::Exact(v)
            | Range::Caret(v)
            | Range::Tilde(v)
            | Range::Gte(v)
            | Range::Gt(v)
            | Range::Lte(v)
            | Range::Lt(v) => Some(v.clone()),
            Range::Wildcard => None,
            Range::WildcardMajor(major) => Some(Version::new(*major, 0, 0)),
            Range::WildcardMinor(major, minor) => Some(Version::new(*major, *minor, 0)),
            Range::Hyphen { from, .. } => Some(from.clone()),
        }
    }
}

/// Bare baseline version extracted from a declared range: operator prefixes
/// stripped, prerelease tags preserved verbatim
pub fn baseline(raw: &str) -> Option<Version> {
    RangeSpec::parse(raw).and_then(|spec| spec.base_version())
}

/// Highest version in `published` matching `spec`. Prereleases are only
/// candidates when `include_prerelease` is set.
pub fn max_satisfying<'a>(
    spec: &RangeSpec,
    published: &'a VersionSet,
    include_prerelease: bool,
) -> Option<&'a Version> {
    published
        .iter()
        .rev()
        .find(|v| (include_prerelease || v.pre.is_empty()) && spec.matches(v))
}
