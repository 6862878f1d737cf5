// src/version/mod.rs

//! Version handling and constraint satisfaction for package dependencies
//!
//! This module provides version parsing and comparison for RPM-style versions,
//! including support for epoch:version-release format and version constraints.
//! Comparison follows rpm's segment algorithm rather than semver, since
//! distribution versions routinely carry letters, tildes and carets.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;

/// A parsed RPM version with epoch, version, and release components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RpmVersion {
    pub epoch: u64,
    pub version: String,
    pub release: Option<String>,
}

impl RpmVersion {
    /// Build a version from its components
    pub fn new(epoch: u64, version: impl Into<String>, release: Option<String>) -> Self {
        Self {
            epoch,
            version: version.into(),
            release,
        }
    }

    /// Parse an RPM version string
    ///
    /// Format: [epoch:]version[-release]
    /// Examples:
    /// - "1.2.3" → epoch=0, version="1.2.3", release=None
    /// - "2:1.2.3" → epoch=2, version="1.2.3", release=None
    /// - "1.2.3-4.el8" → epoch=0, version="1.2.3", release=Some("4.el8")
    /// - "1:2.3.4-5.el8" → epoch=1, version="2.3.4", release=Some("5.el8")
    pub fn parse(s: &str) -> Result<Self> {
        let (epoch_str, rest) = if let Some(colon_pos) = s.find(':') {
            let (e, r) = s.split_at(colon_pos);
            (e, &r[1..]) // Skip the colon
        } else {
            ("0", s)
        };

        let epoch = if epoch_str.is_empty() {
            0 // Empty epoch (e.g., ":1.0.0") defaults to 0
        } else {
            epoch_str.parse::<u64>().map_err(|e| {
                Error::ParseError(format!("Invalid epoch in version '{}': {}", s, e))
            })?
        };

        let (version, release) = if let Some(dash_pos) = rest.find('-') {
            let (v, r) = rest.split_at(dash_pos);
            (v.to_string(), Some(r[1..].to_string()))
        } else {
            (rest.to_string(), None)
        };

        if version.is_empty() {
            return Err(Error::ParseError(format!(
                "Empty version component in '{}'",
                s
            )));
        }

        Ok(Self {
            epoch,
            version,
            release,
        })
    }

    /// Compare two RPM versions
    ///
    /// A missing release sorts before any release.
    pub fn compare(&self, other: &RpmVersion) -> Ordering {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match rpmvercmp(&self.version, &other.version) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match (&self.release, &other.release) {
            (Some(a), Some(b)) => rpmvercmp(a, b),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
        }
    }

    /// Compare the way rpm matches a requirement against a provide
    ///
    /// The release only takes part when both sides carry one, so `>= 1.0`
    /// is satisfied by `1.0-3`.
    pub fn compare_loose(&self, other: &RpmVersion) -> Ordering {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match rpmvercmp(&self.version, &other.version) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match (&self.release, &other.release) {
            (Some(a), Some(b)) => rpmvercmp(a, b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for RpmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.version)?;
        if let Some(ref release) = self.release {
            write!(f, "-{}", release)?;
        }
        Ok(())
    }
}

impl Ord for RpmVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for RpmVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two version (or release) strings segment by segment
///
/// Segments are maximal runs of digits or letters; anything else separates
/// them. Numeric segments compare numerically and beat alphabetic ones.
/// `~` sorts before everything (pre-releases), `^` sorts after the base
/// version but before any further segment.
pub fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0, 0);

    loop {
        i = skip_separators(a, i);
        j = skip_separators(b, j);

        let a_tilde = a.get(i) == Some(&b'~');
        let b_tilde = b.get(j) == Some(&b'~');
        if a_tilde || b_tilde {
            if !a_tilde {
                return Ordering::Greater;
            }
            if !b_tilde {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }

        let a_caret = a.get(i) == Some(&b'^');
        let b_caret = b.get(j) == Some(&b'^');
        if a_caret || b_caret {
            if i >= a.len() {
                return Ordering::Less;
            }
            if j >= b.len() {
                return Ordering::Greater;
            }
            if !a_caret {
                return Ordering::Greater;
            }
            if !b_caret {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }

        if i >= a.len() || j >= b.len() {
            break;
        }

        let numeric = a[i].is_ascii_digit();
        let a_end = segment_end(a, i, numeric);
        let b_end = segment_end(b, j, numeric);
        let seg_a = &a[i..a_end];
        let seg_b = &b[j..b_end];

        // Segments of different types: numeric is newer
        if seg_b.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ord = if numeric {
            let seg_a = trim_leading_zeros(seg_a);
            let seg_b = trim_leading_zeros(seg_b);
            seg_a.len().cmp(&seg_b.len()).then_with(|| seg_a.cmp(seg_b))
        } else {
            seg_a.cmp(seg_b)
        };

        if ord != Ordering::Equal {
            return ord;
        }

        i = a_end;
        j = b_end;
    }

    match (i >= a.len(), j >= b.len()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        _ => Ordering::Greater,
    }
}

fn skip_separators(s: &[u8], mut pos: usize) -> usize {
    while pos < s.len() && !s[pos].is_ascii_alphanumeric() && s[pos] != b'~' && s[pos] != b'^' {
        pos += 1;
    }
    pos
}

fn segment_end(s: &[u8], mut pos: usize, numeric: bool) -> usize {
    while pos < s.len()
        && (if numeric {
            s[pos].is_ascii_digit()
        } else {
            s[pos].is_ascii_alphabetic()
        })
    {
        pos += 1;
    }
    pos
}

fn trim_leading_zeros(seg: &[u8]) -> &[u8] {
    let start = seg.iter().position(|&c| c != b'0').unwrap_or(seg.len());
    &seg[start..]
}

/// Version constraint operators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// Any version is acceptable
    Any,
    /// Exact version match
    Exact(RpmVersion),
    /// Greater than
    GreaterThan(RpmVersion),
    /// Greater than or equal
    GreaterOrEqual(RpmVersion),
    /// Less than
    LessThan(RpmVersion),
    /// Less than or equal
    LessOrEqual(RpmVersion),
    /// Not equal
    NotEqual(RpmVersion),
    /// Both constraints must be satisfied (for ranges like ">= 1.0, < 2.0")
    And(Box<VersionConstraint>, Box<VersionConstraint>),
}

impl VersionConstraint {
    /// Parse a version constraint string
    ///
    /// Examples:
    /// - ">= 1.2.3" → GreaterOrEqual(1.2.3)
    /// - "< 2.0.0" → LessThan(2.0.0)
    /// - "= 1.5.0" → Exact(1.5.0)
    /// - "> 1.0" → GreaterThan(1.0)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "*" {
            return Ok(VersionConstraint::Any);
        }

        // Check for compound constraints (e.g., ">= 1.0, < 2.0")
        if s.contains(',') {
            let parts: Vec<&str> = s.split(',').map(|p| p.trim()).collect();
            if parts.len() == 2 {
                let left = Self::parse(parts[0])?;
                let right = Self::parse(parts[1])?;
                return Ok(VersionConstraint::And(Box::new(left), Box::new(right)));
            }
        }

        if let Some(rest) = s.strip_prefix(">=") {
            let version = RpmVersion::parse(rest.trim())?;
            Ok(VersionConstraint::GreaterOrEqual(version))
        } else if let Some(rest) = s.strip_prefix("<=") {
            let version = RpmVersion::parse(rest.trim())?;
            Ok(VersionConstraint::LessOrEqual(version))
        } else if let Some(rest) = s.strip_prefix("!=") {
            let version = RpmVersion::parse(rest.trim())?;
            Ok(VersionConstraint::NotEqual(version))
        } else if let Some(rest) = s.strip_prefix("==") {
            let version = RpmVersion::parse(rest.trim())?;
            Ok(VersionConstraint::Exact(version))
        } else if let Some(rest) = s.strip_prefix('>') {
            let version = RpmVersion::parse(rest.trim())?;
            Ok(VersionConstraint::GreaterThan(version))
        } else if let Some(rest) = s.strip_prefix('<') {
            let version = RpmVersion::parse(rest.trim())?;
            Ok(VersionConstraint::LessThan(version))
        } else if let Some(rest) = s.strip_prefix('=') {
            let version = RpmVersion::parse(rest.trim())?;
            Ok(VersionConstraint::Exact(version))
        } else {
            // No operator means exact match
            let version = RpmVersion::parse(s)?;
            Ok(VersionConstraint::Exact(version))
        }
    }

    /// Check if a version satisfies this constraint
    pub fn satisfies(&self, version: &RpmVersion) -> bool {
        let cmp = |v: &RpmVersion| version.compare_loose(v);
        match self {
            VersionConstraint::Any => true,
            VersionConstraint::Exact(v) => cmp(v) == Ordering::Equal,
            VersionConstraint::GreaterThan(v) => cmp(v) == Ordering::Greater,
            VersionConstraint::GreaterOrEqual(v) => cmp(v) != Ordering::Less,
            VersionConstraint::LessThan(v) => cmp(v) == Ordering::Less,
            VersionConstraint::LessOrEqual(v) => cmp(v) != Ordering::Greater,
            VersionConstraint::NotEqual(v) => cmp(v) != Ordering::Equal,
            VersionConstraint::And(left, right) => {
                left.satisfies(version) && right.satisfies(version)
            }
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Any => write!(f, "*"),
            VersionConstraint::Exact(v) => write!(f, "= {}", v),
            VersionConstraint::GreaterThan(v) => write!(f, "> {}", v),
            VersionConstraint::GreaterOrEqual(v) => write!(f, ">= {}", v),
            VersionConstraint::LessThan(v) => write!(f, "< {}", v),
            VersionConstraint::LessOrEqual(v) => write!(f, "<= {}", v),
            VersionConstraint::NotEqual(v) => write!(f, "!= {}", v),
            VersionConstraint::And(left, right) => write!(f, "{}, {}", left, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpm_version_parse_simple() {
        let v = RpmVersion::parse("1.2.3").unwrap();
        assert_eq!(v.epoch, 0);
        assert_eq!(v.version, "1.2.3");
        assert_eq!(v.release, None);
    }

    #[test]
    fn test_rpm_version_parse_full() {
        let v = RpmVersion::parse("1:2.3.4-5.el8").unwrap();
        assert_eq!(v.epoch, 1);
        assert_eq!(v.version, "2.3.4");
        assert_eq!(v.release, Some("5.el8".to_string()));
    }

    #[test]
    fn test_rpm_version_parse_empty_epoch() {
        let v = RpmVersion::parse(":1.02.208-2.fc43").unwrap();
        assert_eq!(v.epoch, 0);
        assert_eq!(v.version, "1.02.208");
        assert_eq!(v.release, Some("2.fc43".to_string()));
    }

    #[test]
    fn test_rpm_version_parse_rejects_garbage() {
        assert!(RpmVersion::parse("x:1.0").is_err());
        assert!(RpmVersion::parse("1:-3").is_err());
    }

    #[test]
    fn test_rpm_version_compare_epochs() {
        let v1 = RpmVersion::parse("1:1.0.0").unwrap();
        let v2 = RpmVersion::parse("0:2.0.0").unwrap();
        assert!(v1 > v2); // Higher epoch wins even with lower version
    }

    #[test]
    fn test_rpmvercmp_segments() {
        assert_eq!(rpmvercmp("1.0", "1.0"), Ordering::Equal);
        assert_eq!(rpmvercmp("1.0", "1.1"), Ordering::Less);
        assert_eq!(rpmvercmp("1.10", "1.9"), Ordering::Greater);
        assert_eq!(rpmvercmp("1.01", "1.1"), Ordering::Equal);
        assert_eq!(rpmvercmp("1.0a", "1.0"), Ordering::Greater);
        assert_eq!(rpmvercmp("2.0", "2a"), Ordering::Greater);
        assert_eq!(rpmvercmp("1.0.fc21", "1.0.fc20"), Ordering::Greater);
    }

    #[test]
    fn test_rpmvercmp_tilde_and_caret() {
        assert_eq!(rpmvercmp("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(rpmvercmp("1.0~rc1", "1.0~rc2"), Ordering::Less);
        assert_eq!(rpmvercmp("1.0^git1", "1.0"), Ordering::Greater);
        assert_eq!(rpmvercmp("1.0^git1", "1.0.1"), Ordering::Less);
    }

    #[test]
    fn test_rpm_version_compare_releases() {
        let v1 = RpmVersion::parse("1.2.3-1").unwrap();
        let v2 = RpmVersion::parse("1.2.3-2").unwrap();
        let v3 = RpmVersion::parse("1.2.3").unwrap();
        assert!(v1 < v2);
        assert!(v3 < v1);
        assert_eq!(v3.compare_loose(&v1), Ordering::Equal);
    }

    #[test]
    fn test_version_constraint_ignores_missing_release() {
        let c = VersionConstraint::parse(">= 1.0").unwrap();
        assert!(c.satisfies(&RpmVersion::parse("1.0-3.fc21").unwrap()));

        let c = VersionConstraint::parse("= 1.0-2").unwrap();
        assert!(!c.satisfies(&RpmVersion::parse("1.0-3").unwrap()));
        assert!(c.satisfies(&RpmVersion::parse("1.0").unwrap()));
    }

    #[test]
    fn test_version_constraint_and() {
        let c = VersionConstraint::parse(">= 1.0.0, < 2.0.0").unwrap();
        assert!(c.satisfies(&RpmVersion::parse("1.5.0").unwrap()));
        assert!(!c.satisfies(&RpmVersion::parse("2.0.0").unwrap()));
        assert!(!c.satisfies(&RpmVersion::parse("0.9.0").unwrap()));
    }

    #[test]
    fn test_rpm_version_display() {
        assert_eq!(RpmVersion::parse("1.2.3").unwrap().to_string(), "1.2.3");
        assert_eq!(
            RpmVersion::parse("2:1.2.3-4.el8").unwrap().to_string(),
            "2:1.2.3-4.el8"
        );
    }

    #[test]
    fn test_version_constraint_display() {
        let c = VersionConstraint::parse(">= 1.0.0, < 2.0.0").unwrap();
        assert_eq!(c.to_string(), ">= 1.0.0, < 2.0.0");
    }
}
