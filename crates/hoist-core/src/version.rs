//! Maven version ordering and concrete-version checks.
//!
//! Published descriptors must pin every version: a consumer resolving the
//! descriptor later cannot be handed a range or a dynamic selector.
//!
//! Ordering follows Maven rather than semver:
//! - segments split on `.` and `-`
//! - numeric segments compare as numbers
//! - qualifiers: `alpha` < `beta` < `milestone` < `rc` < `snapshot` < release < `sp`
//! - unknown text qualifiers (`jre`, `android`) sort below a release

use std::cmp::Ordering;
use std::fmt;

/// A parsed Maven version with comparable segments.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    original: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Numeric(u64),
    Qualifier(Qualifier),
    Text(String),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum Qualifier {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl MavenVersion {
    pub fn parse(version: &str) -> Self {
        let segments = version
            .split(['.', '-'])
            .filter(|token| !token.is_empty())
            .map(Segment::classify)
            .collect();
        Self {
            original: version.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    pub fn is_snapshot(&self) -> bool {
        self.original.ends_with("-SNAPSHOT")
    }
}

impl Segment {
    fn classify(token: &str) -> Self {
        if let Ok(n) = token.parse::<u64>() {
            return Self::Numeric(n);
        }
        let qualifier = match token.to_ascii_lowercase().as_str() {
            "alpha" | "a" => Qualifier::Alpha,
            "beta" | "b" => Qualifier::Beta,
            "milestone" | "m" => Qualifier::Milestone,
            "rc" | "cr" => Qualifier::Rc,
            "snapshot" => Qualifier::Snapshot,
            "ga" | "final" | "release" => Qualifier::Release,
            "sp" => Qualifier::Sp,
            _ => return Self::Text(token.to_ascii_lowercase()),
        };
        Self::Qualifier(qualifier)
    }

    /// How this segment compares against a missing segment (`1.0` vs `1.0.x`).
    fn cmp_missing(&self) -> Ordering {
        match self {
            Self::Numeric(n) => n.cmp(&0),
            Self::Qualifier(q) => q.cmp(&Qualifier::Release),
            Self::Text(_) => Ordering::Less,
        }
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
            (Segment::Qualifier(a), Segment::Qualifier(b)) => a.cmp(b),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Numeric(_), _) => Ordering::Greater,
            (_, Segment::Numeric(_)) => Ordering::Less,
            (Segment::Qualifier(q), Segment::Text(_)) => {
                if *q >= Qualifier::Release {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (Segment::Text(_), Segment::Qualifier(_)) => other.cmp(self).reverse(),
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| match (self.segments.get(i), other.segments.get(i)) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(a), None) => a.cmp_missing(),
                (None, Some(b)) => b.cmp_missing().reverse(),
                (None, None) => Ordering::Equal,
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Dynamic selectors understood by Gradle and Maven resolvers.
const DYNAMIC_SELECTORS: &[&str] = &[
    "latest.release",
    "latest.integration",
    "latest.milestone",
    "LATEST",
    "RELEASE",
];

/// Check that `version` pins exactly one version.
///
/// Returns a short reason on failure, suitable for a validation message.
pub fn check_concrete(version: &str) -> Result<(), String> {
    let v = version.trim();
    if v.is_empty() {
        return Err("version is missing".to_string());
    }
    if v.starts_with('[') || v.starts_with('(') || v.contains(',') {
        return Err(format!("'{v}' is a version range"));
    }
    if DYNAMIC_SELECTORS.contains(&v) || v.contains('+') || v.contains('*') {
        return Err(format!("'{v}' is a dynamic version"));
    }
    if v.contains("${") {
        return Err(format!("'{v}' contains an unresolved property"));
    }
    if v.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\' || c == ':') {
        return Err(format!("'{v}' contains characters not allowed in a version"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ordering() {
        assert!(MavenVersion::parse("9.8") < MavenVersion::parse("9.9"));
        assert!(MavenVersion::parse("9.9") < MavenVersion::parse("9.10"));
        assert!(MavenVersion::parse("1.0.1") < MavenVersion::parse("1.1"));
    }

    #[test]
    fn qualifier_ordering() {
        let ordered = ["1.0-alpha", "1.0-beta", "1.0-milestone", "1.0-rc", "1.0-SNAPSHOT", "1.0", "1.0-sp"];
        for pair in ordered.windows(2) {
            assert!(
                MavenVersion::parse(pair[0]) < MavenVersion::parse(pair[1]),
                "{} < {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn trailing_zeros_equal() {
        assert_eq!(MavenVersion::parse("1.0"), MavenVersion::parse("1.0.0"));
    }

    #[test]
    fn text_qualifier_below_release() {
        assert!(MavenVersion::parse("32.0-jre") < MavenVersion::parse("32.0"));
        assert!(MavenVersion::parse("31.0-jre") < MavenVersion::parse("32.0-jre"));
    }

    #[test]
    fn snapshot_detection() {
        assert!(MavenVersion::parse("1.0-SNAPSHOT").is_snapshot());
        assert!(!MavenVersion::parse("9.9").is_snapshot());
    }

    #[test]
    fn concrete_versions_accepted() {
        for v in ["9.9", "1.0.0-SNAPSHOT", "32.0-jre", "2.3.0-Beta2"] {
            assert!(check_concrete(v).is_ok(), "{v}");
        }
    }

    #[test]
    fn ranges_and_selectors_rejected() {
        for v in ["", "  ", "[1.0,2.0)", "(,1.0]", "[1.5]", "1.+", "latest.release", "RELEASE", "${asm.version}", "1.0 beta"] {
            assert!(check_concrete(v).is_err(), "{v:?}");
        }
    }
}
