// src/config.rs

//! Configuration file parsing
//!
//! Supports a TOML configuration file with the following sections:
//! - [database] - SQLite database location
//! - [dependency] - Target architecture and build group
//! - [cache] - Where repository data and source packages are cached
//! - [service] - Daemon polling interval and lock file
//!
//! Every field has a default, so an empty file is a valid configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RespinConfig {
    #[serde(default)]
    pub database: DatabaseSection,

    #[serde(default)]
    pub dependency: DependencySection,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub service: ServiceSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/var/lib/respin/respin.db")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencySection {
    /// Architecture builds run on
    #[serde(default = "default_for_arch")]
    pub for_arch: String,

    /// Packages present in every build root
    #[serde(default = "default_build_group")]
    pub build_group: Vec<String>,
}

impl Default for DependencySection {
    fn default() -> Self {
        Self {
            for_arch: default_for_arch(),
            build_group: default_build_group(),
        }
    }
}

fn default_for_arch() -> String {
    "x86_64".to_string()
}

fn default_build_group() -> Vec<String> {
    [
        "bash",
        "coreutils",
        "gcc",
        "make",
        "rpm-build",
        "redhat-rpm-config",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    /// Holds `<repo_id>/repodata.json` per repo snapshot
    #[serde(default = "default_repo_dir")]
    pub repo_dir: PathBuf,

    /// Holds `repodata.json` describing cached source packages
    #[serde(default = "default_srpm_dir")]
    pub srpm_dir: PathBuf,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            repo_dir: default_repo_dir(),
            srpm_dir: default_srpm_dir(),
        }
    }
}

fn default_repo_dir() -> PathBuf {
    PathBuf::from("/var/cache/respin/repodata")
}

fn default_srpm_dir() -> PathBuf {
    PathBuf::from("/var/cache/respin/srpms")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSection {
    /// Seconds between two runs in daemon mode
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_lock_path")]
    pub lock_path: PathBuf,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            lock_path: default_lock_path(),
        }
    }
}

fn default_interval() -> u64 {
    30
}

fn default_lock_path() -> PathBuf {
    PathBuf::from("/var/lib/respin/respin.lock")
}

impl ServiceSection {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl RespinConfig {
    /// Default configuration file location
    pub const DEFAULT_PATH: &'static str = "/etc/respin/respin.toml";

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config = Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Load `path` if given, else the default file if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(Self::DEFAULT_PATH);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: RespinConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.dependency.for_arch.trim().is_empty() {
            return Err(Error::Config("dependency.for_arch must not be empty".to_string()));
        }
        if self.dependency.for_arch == "src" || self.dependency.for_arch == "noarch" {
            return Err(Error::Config(format!(
                "dependency.for_arch must be a binary architecture, got {}",
                self.dependency.for_arch
            )));
        }
        if self.service.interval_secs == 0 {
            return Err(Error::Config("service.interval_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Database path as a string
    pub fn db_path(&self) -> Result<&str> {
        self.database.path.to_str().ok_or_else(|| {
            Error::Config(format!(
                "Database path is not valid UTF-8: {}",
                self.database.path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RespinConfig::from_toml("").unwrap();
        assert_eq!(config.dependency.for_arch, "x86_64");
        assert!(config.dependency.build_group.contains(&"gcc".to_string()));
        assert_eq!(config.service.interval(), Duration::from_secs(30));
        assert_eq!(config.db_path().unwrap(), "/var/lib/respin/respin.db");
    }

    #[test]
    fn test_parse_full_config() {
        let config = RespinConfig::from_toml(
            r#"
            [database]
            path = "/tmp/respin.db"

            [dependency]
            for_arch = "aarch64"
            build_group = ["bash", "gcc"]

            [cache]
            repo_dir = "/srv/repos"

            [service]
            interval_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/tmp/respin.db"));
        assert_eq!(config.dependency.for_arch, "aarch64");
        assert_eq!(config.dependency.build_group, vec!["bash", "gcc"]);
        assert_eq!(config.cache.repo_dir, PathBuf::from("/srv/repos"));
        assert_eq!(config.cache.srpm_dir, PathBuf::from("/var/cache/respin/srpms"));
        assert_eq!(config.service.interval_secs, 5);
    }

    #[test]
    fn test_invalid_config() {
        assert!(RespinConfig::from_toml("[service]\ninterval_secs = 0").is_err());
        assert!(RespinConfig::from_toml("[dependency]\nfor_arch = \"src\"").is_err());
        assert!(RespinConfig::from_toml("[dependency]\nbuild_group = 3").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[dependency]\nfor_arch = \"i686\"\n").unwrap();

        let config = RespinConfig::load(file.path()).unwrap();
        assert_eq!(config.dependency.for_arch, "i686");

        let missing = RespinConfig::load(Path::new("/nonexistent/respin.toml"));
        assert!(matches!(missing, Err(Error::Config(_))));
    }
}
