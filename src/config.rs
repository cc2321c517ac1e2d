//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/symtree/symtree.toml`
//! 3. Local config: `<project_dir>/.symtree.toml`
//! 4. Environment variables: `SYMTREE_*` prefix

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::VisibilityFilter;
use crate::util::path::expand_path;

pub const GLOBAL_CONFIG_FILE: &str = "symtree.toml";
pub const LOCAL_CONFIG_FILE: &str = ".symtree.toml";
const ENV_PREFIX: &str = "SYMTREE";

/// Raw settings for intermediate parsing (fields are Option to detect "not specified").
///
/// Used during layered config merging to distinguish between:
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub visibility: Option<VisibilityFilter>,
    pub skip_undoc: Option<bool>,
    pub exclude: Option<Vec<String>>,
}

/// Unified configuration for symtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Which symbols listings include by default
    pub visibility: VisibilityFilter,
    /// Drop symbols without a docstring from listings
    pub skip_undoc: bool,
    /// Paths skipped while loading, relative to the package's parent directory
    pub exclude: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            visibility: VisibilityFilter::Public,
            skip_undoc: false,
            exclude: Vec::new(),
        }
    }
}

/// Get the XDG config directory for symtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "symtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(LOCAL_CONFIG_FILE)
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

/// Merge arrays with union semantics and negation support.
///
/// - Items from overlay are added to base
/// - Items prefixed with `!` remove the corresponding item from the result
/// - Duplicates are de-duplicated
///
/// # Examples
/// ```ignore
/// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
/// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: BTreeSet<String> = base.iter().cloned().collect();

    for pattern in overlay {
        if let Some(negated) = pattern.strip_prefix('!') {
            result.remove(negated);
        } else {
            result.insert(pattern.clone());
        }
    }

    result.into_iter().collect()
}

fn to_strings(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}

impl Settings {
    /// Expand shell variables and tilde in exclude paths.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        self.exclude = self.exclude.iter().map(|p| expand_path(p)).collect();
    }

    /// Merge overlay config onto self (base) with union semantics for arrays.
    ///
    /// - Scalar options: overlay wins if Some, otherwise keep base
    /// - `exclude`: union merge with negation support
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            visibility: overlay.visibility.unwrap_or(self.visibility),
            skip_undoc: overlay.skip_undoc.unwrap_or(self.skip_undoc),
            exclude: overlay
                .exclude
                .as_ref()
                .map(|o| {
                    merge_array(&to_strings(&self.exclude), o)
                        .into_iter()
                        .map(PathBuf::from)
                        .collect()
                })
                .unwrap_or_else(|| self.exclude.clone()),
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    pub fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            visibility: global.visibility.unwrap_or(self.visibility),
            skip_undoc: global.skip_undoc.unwrap_or(self.skip_undoc),
            exclude: global
                .exclude
                .as_ref()
                .map(|e| e.iter().map(PathBuf::from).collect())
                .unwrap_or_else(|| self.exclude.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory for local config
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Local: UNION with `!` negation
    /// - Any → Env vars: REPLACE (explicit user override)
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), project_dir)
    }

    /// Load settings from an explicit global config file.
    pub fn load_from(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_path {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                let raw = load_raw_settings(global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(project) = project_dir {
            let local_path = local_config_path(project);
            if local_path.exists() {
                debug!("local config: {}", local_path.display());
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply SYMTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("exclude")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("visibility") {
            settings.visibility = val.parse().map_err(|message| ApplicationError::Config {
                message: format!("{ENV_PREFIX}_VISIBILITY: {message}"),
            })?;
        }
        if let Ok(val) = config.get_bool("skip_undoc") {
            settings.skip_undoc = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("exclude") {
            settings.exclude = val.into_iter().map(PathBuf::from).collect();
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# symtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/symtree/symtree.toml
#   Local:  <project_dir>/.symtree.toml
#   Env:    SYMTREE_* environment variables (SYMTREE_EXCLUDE is comma separated)
#
# Local config UNIONS `exclude` with global; "!path" removes an inherited entry.

# Default visibility for listings: "public", "private" or "all"
# visibility = "public"

# Leave undocumented symbols out of `symbols` listings
# skip_undoc = false

# Paths to skip, relative to the directory holding the package
# exclude = ["mypkg/tests", "mypkg/_vendor"]
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
