// src/universe/repodata.rs

//! Repository metadata records
//!
//! Repository data is a JSON document listing packages with their
//! requirements and capabilities written as RPM-style strings:
//!
//! ```json
//! {"packages": [
//!   {"name": "foo", "version": "1.0", "release": "1", "arch": "src",
//!    "requires": ["libbar-devel >= 1.0"]},
//!   {"name": "libbar-devel", "version": "1.0", "release": "1", "arch": "x86_64",
//!    "requires": ["libbar = 1.0-1"], "provides": ["pkgconfig(bar) = 1.0"]}
//! ]}
//! ```

use crate::error::{Error, Result};
use crate::version::{RpmVersion, VersionConstraint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// All packages of one repository
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoData {
    #[serde(default)]
    pub packages: Vec<PackageRecord>,
}

impl RepoData {
    pub fn new(packages: Vec<PackageRecord>) -> Self {
        Self { packages }
    }

    /// Decode repository data from JSON
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::RepoDataError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::RepoDataError(e.to_string()))
    }
}

/// One binary or source package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    #[serde(default)]
    pub epoch: u64,
    pub version: String,
    pub release: String,
    pub arch: String,
    #[serde(default)]
    pub requires: Vec<Requirement>,
    #[serde(default)]
    pub provides: Vec<Capability>,
}

impl PackageRecord {
    pub fn new(name: &str, version: &str, release: &str, arch: &str) -> Self {
        Self {
            name: name.to_string(),
            epoch: 0,
            version: version.to_string(),
            release: release.to_string(),
            arch: arch.to_string(),
            requires: Vec::new(),
            provides: Vec::new(),
        }
    }

    /// Add a requirement parsed from an RPM-style string
    pub fn requires(mut self, spec: &str) -> Result<Self> {
        self.requires.push(spec.parse()?);
        Ok(self)
    }

    pub fn provides(mut self, spec: &str) -> Result<Self> {
        self.provides.push(spec.parse()?);
        Ok(self)
    }

    pub fn evr(&self) -> RpmVersion {
        RpmVersion::new(self.epoch, self.version.clone(), Some(self.release.clone()))
    }

    pub fn is_source(&self) -> bool {
        self.arch == "src"
    }

    /// Whether this package satisfies `req`, counting its implicit self-provide
    pub fn satisfies(&self, req: &Requirement) -> bool {
        if req.name == self.name && req.constraint.satisfies(&self.evr()) {
            return true;
        }
        self.provides.iter().any(|cap| cap.satisfies(req))
    }

    /// name-[epoch:]version-release.arch
    pub fn nevra(&self) -> String {
        format!("{}-{}.{}", self.name, self.evr(), self.arch)
    }
}

/// A requirement such as `libbar >= 1.0` or `libbar.so.1()(64bit)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Requirement {
    pub name: String,
    pub constraint: VersionConstraint,
}

impl Requirement {
    pub fn new(name: impl Into<String>, constraint: VersionConstraint) -> Self {
        Self {
            name: name.into(),
            constraint,
        }
    }

    /// Requirements on rpm itself, satisfied by the build host
    pub fn is_rpmlib(&self) -> bool {
        self.name.starts_with("rpmlib(")
    }
}

impl FromStr for Requirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, rest) = match s.find(char::is_whitespace) {
            Some(pos) => (&s[..pos], s[pos..].trim()),
            None => (s, ""),
        };
        if name.is_empty() {
            return Err(Error::ParseError("Empty requirement".to_string()));
        }

        let constraint = if rest.is_empty() {
            VersionConstraint::Any
        } else {
            VersionConstraint::parse(rest)?
        };

        Ok(Self::new(name, constraint))
    }
}

impl TryFrom<String> for Requirement {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Requirement> for String {
    fn from(req: Requirement) -> Self {
        req.to_string()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.constraint {
            VersionConstraint::Any => write!(f, "{}", self.name),
            ref constraint => write!(f, "{} {}", self.name, constraint),
        }
    }
}

/// A provided capability, optionally versioned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Capability {
    pub name: String,
    pub version: Option<RpmVersion>,
}

impl Capability {
    /// An unversioned provide satisfies every requirement on its name
    pub fn satisfies(&self, req: &Requirement) -> bool {
        if self.name != req.name {
            return false;
        }
        match &self.version {
            None => true,
            Some(version) => req.constraint.satisfies(version),
        }
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, rest) = match s.find(char::is_whitespace) {
            Some(pos) => (&s[..pos], s[pos..].trim()),
            None => (s, ""),
        };
        if name.is_empty() {
            return Err(Error::ParseError("Empty capability".to_string()));
        }

        let version = if rest.is_empty() {
            None
        } else {
            let evr = rest.strip_prefix('=').ok_or_else(|| {
                Error::ParseError(format!("Capability '{s}' must use '='"))
            })?;
            Some(RpmVersion::parse(evr.trim())?)
        };

        Ok(Self {
            name: name.to_string(),
            version,
        })
    }
}

impl TryFrom<String> for Capability {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Capability> for String {
    fn from(cap: Capability) -> Self {
        cap.to_string()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            None => write!(f, "{}", self.name),
            Some(version) => write!(f, "{} = {}", self.name, version),
        }
    }
}
