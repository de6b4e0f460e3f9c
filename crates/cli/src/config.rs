//! CLI configuration and state locations

use anyhow::{Context, Result};
use directories::ProjectDirs;
use foodsched_client::ClientConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Platform-specific directories for configuration and stored tokens
pub struct StateDir {
    project_dirs: Option<ProjectDirs>,
    override_dir: Option<PathBuf>,
}

impl StateDir {
    pub fn new() -> Self {
        let project_dirs = ProjectDirs::from("dev", "FoodScheduler", "foodsched");

        if project_dirs.is_none() {
            warn!("Failed to determine platform-specific directories, will use fallback");
        }

        Self {
            project_dirs,
            override_dir: None,
        }
    }

    /// Keep everything under `path`
    pub fn with_override(path: impl Into<PathBuf>) -> Self {
        Self {
            project_dirs: None,
            override_dir: Some(path.into()),
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.join("config");
        }

        match &self.project_dirs {
            Some(project_dirs) => project_dirs.config_dir().to_path_buf(),
            None => PathBuf::from("./config"),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.join("data");
        }

        match &self.project_dirs {
            Some(project_dirs) => project_dirs.data_dir().to_path_buf(),
            None => PathBuf::from("./data"),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    pub fn token_file(&self) -> PathBuf {
        self.data_dir().join("tokens.json")
    }
}

impl Default for StateDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Load client configuration.
///
/// An explicit path must exist. Otherwise the state directory's
/// `config.toml` is used when present, and environment variables alone when
/// it is not.
pub fn load_client_config(explicit: Option<&Path>, state_dir: &StateDir) -> Result<ClientConfig> {
    if let Some(path) = explicit {
        return ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()));
    }

    let default_file = state_dir.config_file();
    if default_file.exists() {
        debug!(path = %default_file.display(), "Using configuration file");
        return ClientConfig::from_file(&default_file).with_context(|| {
            format!("Failed to load configuration from {}", default_file.display())
        });
    }

    ClientConfig::from_env().context("Failed to load configuration from environment")
}
