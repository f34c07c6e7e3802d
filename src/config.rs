//! Configuration file (`dejadiff.toml`)
//!
//! Replaces the process-wide mail and path constants of a build-master
//! setup with one explicit object handed to the components that need it.
//!
//! # Example dejadiff.toml
//!
//! ```toml
//! store_dir = "/srv/gcc-buildbot/results"
//! suites = ["gcc", "g++"]
//! git_web_url = "https://gcc-build.example.org/cgit"
//! xfail_web_url = "https://git.example.org/?p=gcc-xfails.git"
//! build_master_url = "https://gcc-build.example.org"
//! mail_from = "gcc-buildbot@example.org"
//! mail_to = "gcc-testresults@example.org"
//! notify_max_age = 2592000
//! ```

use crate::sumfile::DEFAULT_SUITES;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "dejadiff.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the baseline store
    pub store_dir: PathBuf,

    /// Suites whose `.sum` files are scanned for aggregate counts
    pub suites: Vec<String>,

    /// Web front-end of the per-builder results repositories
    pub git_web_url: String,

    /// Web front-end of the XFAIL list repository
    pub xfail_web_url: String,

    /// Build master URL, used for worker links in messages
    pub build_master_url: String,

    pub mail_from: String,
    pub mail_to: String,

    /// Compile logs longer than this many characters are truncated
    pub compile_log_limit: usize,

    /// Lines kept from the end of a truncated compile log
    pub compile_log_tail_lines: usize,

    /// Seconds after which a notification mark expires (default 30 days)
    pub notify_max_age: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("results"),
            suites: DEFAULT_SUITES.iter().map(|s| s.to_string()).collect(),
            git_web_url: "http://gcc-build.sergiodj.net/cgit".to_string(),
            xfail_web_url: "http://git.sergiodj.net/?p=gcc-xfails.git".to_string(),
            build_master_url: "http://gcc-build.sergiodj.net".to_string(),
            mail_from: "gcc-buildbot@sergiodj.net".to_string(),
            mail_to: "gcc-testresults@gcc.gnu.org".to_string(),
            compile_log_limit: 100_000,
            compile_log_tail_lines: 100,
            notify_max_age: 30 * 24 * 60 * 60,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// ```no_run
    /// use dejadiff::config::Config;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::from_file("dejadiff.toml")?;
    /// println!("store at {}", config.store_dir.display());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }

    /// Load `path` if given, else `dejadiff.toml` if present, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.store_dir.as_os_str().is_empty() {
            return Err("store_dir must not be empty".to_string());
        }

        if self.suites.iter().any(|s| s.is_empty() || s.contains('/')) {
            return Err(format!(
                "suites must be plain directory names, got {:?}",
                self.suites
            ));
        }

        if self.compile_log_tail_lines == 0 {
            return Err("compile_log_tail_lines must be >= 1".to_string());
        }

        if self.notify_max_age == 0 {
            return Err("notify_max_age must be >= 1".to_string());
        }

        Ok(())
    }
}
