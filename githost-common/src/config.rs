//! Configuration for the githost utilities.
//!
//! Three layers, later wins: compiled-in defaults, an optional TOML file
//! (`GITHOST_CONFIG`, else `/etc/githost/config.toml` when present), and
//! `GITHOST_*` environment overrides. Both binaries are invoked by sshd
//! with a near-empty environment, so everything defaults sensibly.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default repository root when nothing is configured.
pub const DEFAULT_REPOSITORIES_ROOT: &str = "/srv/git";

/// Default git exec path, used when `GIT_EXEC_PATH` is unset.
pub const DEFAULT_GIT_EXEC_PATH: &str = "/usr/lib/git-core";

/// Per-user key list location, relative to the home directory.
pub const DEFAULT_AUTHORIZED_KEYS_FILE: &str = ".ssh/authorized_keys";

/// System-wide configuration file consulted when `GITHOST_CONFIG` is unset.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/githost/config.toml";

/// Errors from [`Config::load`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings shared by the dispatcher and the key authorizer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Fixed directory every repository path resolves under.
    pub repositories_root: PathBuf,

    /// Fallback directory holding the git transfer/init programs.
    pub git_exec_path: PathBuf,

    /// Key list location relative to each member's home directory.
    pub authorized_keys_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repositories_root: PathBuf::from(DEFAULT_REPOSITORIES_ROOT),
            git_exec_path: PathBuf::from(DEFAULT_GIT_EXEC_PATH),
            authorized_keys_file: DEFAULT_AUTHORIZED_KEYS_FILE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then file, then environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var_os("GITHOST_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => {
                let system = Path::new(SYSTEM_CONFIG_PATH);
                if system.exists() {
                    Self::from_file(system)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse one TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `GITHOST_*` environment overrides in place.
    pub fn apply_env(&mut self) {
        if let Some(root) = env::var_os("GITHOST_REPOSITORIES_ROOT") {
            self.repositories_root = PathBuf::from(root);
        }
        if let Some(path) = env::var_os("GITHOST_GIT_EXEC_PATH") {
            self.git_exec_path = PathBuf::from(path);
        }
        if let Ok(file) = env::var("GITHOST_AUTHORIZED_KEYS_FILE") {
            self.authorized_keys_file = file;
        }
    }

    /// Directory to exec git programs from.
    ///
    /// `GIT_EXEC_PATH` wins when set, matching git's own convention; the
    /// configured path is only the fallback.
    pub fn effective_git_exec_path(&self) -> PathBuf {
        match env::var_os("GIT_EXEC_PATH") {
            Some(path) => PathBuf::from(path),
            None => self.git_exec_path.clone(),
        }
    }
}
