//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/trimtree/trimtree.toml`
//! 3. Project config: `<project_dir>/.trimtree.toml`
//! 4. Environment variables: `TRIMTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, SortOrder};

/// Unified configuration for trimtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Catalog file, relative paths resolve against the project directory
    pub catalog: PathBuf,
    /// Solutions file, relative paths resolve against the project directory
    pub solutions: PathBuf,
    /// Default order of listed solutions
    pub sort: SortOrder,
    /// Maximum number of solutions listed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Suffix printed after prices
    pub currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("catalog.toml"),
            solutions: PathBuf::from("solutions.toml"),
            sort: SortOrder::Ascending,
            limit: None,
            currency: String::new(),
        }
    }
}

/// Raw settings for intermediate parsing: `None` means "not specified,
/// inherit from the layer below".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    catalog: Option<PathBuf>,
    solutions: Option<PathBuf>,
    sort: Option<SortOrder>,
    limit: Option<usize>,
    currency: Option<String>,
}

/// Get the XDG config directory for trimtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "trimtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("trimtree.toml"))
}

/// Get the path to the project config file.
pub fn project_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".trimtree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(raw.as_ref()) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}

impl Settings {
    /// Expand shell variables and tilde in path fields.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax. Unknown variables leave the
    /// path unchanged.
    fn expand_paths(&mut self) {
        self.catalog = expand(&self.catalog);
        self.solutions = expand(&self.solutions);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            catalog: overlay
                .catalog
                .clone()
                .unwrap_or_else(|| self.catalog.clone()),
            solutions: overlay
                .solutions
                .clone()
                .unwrap_or_else(|| self.solutions.clone()),
            sort: overlay.sort.unwrap_or(self.sort),
            limit: overlay.limit.or(self.limit),
            currency: overlay
                .currency
                .clone()
                .unwrap_or_else(|| self.currency.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory holding `.trimtree.toml`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = project_dir {
            let local_path = project_config_path(dir);
            if local_path.exists() {
                debug!("project config: {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply TRIMTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("TRIMTREE").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("catalog") {
            settings.catalog = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("solutions") {
            settings.solutions = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("sort") {
            settings.sort = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_int("limit") {
            settings.limit = usize::try_from(val).ok();
        }
        if let Ok(val) = config.get_string("currency") {
            settings.currency = val;
        }

        Ok(settings)
    }

    /// Catalog path, resolved against `project_dir` when relative.
    pub fn catalog_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.catalog)
    }

    /// Solutions path, resolved against `project_dir` when relative.
    pub fn solutions_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.solutions)
    }

    /// Price with the configured currency suffix.
    pub fn format_price(&self, price: i64) -> String {
        if self.currency.is_empty() {
            price.to_string()
        } else {
            format!("{} {}", price, self.currency)
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
