//! Configuration for calltree.
//!
//! Loads settings from `.calltree.toml` in the project root, then `CALLTREE_*`
//! environment variables. Uses figment for layered configuration with provenance tracking.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-project configuration file.
pub const CONFIG_FILE_NAME: &str = ".calltree.toml";

/// Default directories to exclude from analysis, at any depth.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &["build"];

/// Where system headers (`#include <...>`) are searched after the project's own directories.
pub const DEFAULT_SYSTEM_INCLUDE_DIRS: &[&str] = &["/usr/include", "/usr/local/include"];

/// What to do with a call that appears outside every function body,
/// e.g. `int n = sizeof(probe());` at file scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileScopePolicy {
    /// Record the edge against a synthetic caller named after the translation unit.
    #[default]
    Attribute,
    /// Ignore the call.
    Drop,
}

/// calltree configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Additional directories to exclude from analysis (merged with defaults).
    #[serde(default)]
    pub exclude_dirs: Vec<String>,

    /// Maximum syntax tree depth lowered per file (default: 500).
    #[serde(default = "default_recursion_depth")]
    pub max_recursion_depth: usize,

    /// Whether to respect .gitignore files when collecting sources (default: false).
    #[serde(default)]
    pub respect_gitignore: bool,

    /// Directories searched for `#include <...>` headers.
    #[serde(default = "default_system_include_dirs")]
    pub system_include_dirs: Vec<PathBuf>,

    /// Handling of calls made outside any function body.
    #[serde(default)]
    pub file_scope_calls: FileScopePolicy,

    /// Parse files on the rayon thread pool (default: true).
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude_dirs: Vec::new(),
            max_recursion_depth: default_recursion_depth(),
            respect_gitignore: false,
            system_include_dirs: default_system_include_dirs(),
            file_scope_calls: FileScopePolicy::default(),
            parallel: default_parallel(),
        }
    }
}

fn default_recursion_depth() -> usize {
    500
}

fn default_system_include_dirs() -> Vec<PathBuf> {
    DEFAULT_SYSTEM_INCLUDE_DIRS
        .iter()
        .map(PathBuf::from)
        .collect()
}

fn default_parallel() -> bool {
    true
}

impl Config {
    /// Resolve the configuration for the project at `root`.
    ///
    /// A missing `.calltree.toml` is not an error. Anything figment cannot
    /// extract is logged with its source location and the defaults are used.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE_NAME);

        // Build layered config: defaults <- toml file <- environment
        let figment = Figment::from(Serialized::defaults(Config::default()));

        let figment = if config_path.exists() {
            figment.merge(Toml::file(&config_path))
        } else {
            figment
        };

        let figment = figment.merge(Env::prefixed("CALLTREE_"));

        match figment.extract() {
            Ok(config) => {
                if config_path.exists() {
                    tracing::info!("Using {}", config_path.display());
                }
                config
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid calltree configuration: {}", e);
                Self::default()
            }
        }
    }

    /// `build` plus the configured exclusions, without duplicates.
    pub fn excluded_dirs(&self) -> Vec<&str> {
        let mut dirs: Vec<&str> = DEFAULT_EXCLUDE_DIRS.to_vec();
        for dir in &self.exclude_dirs {
            if !dirs.contains(&dir.as_str()) {
                dirs.push(dir.as_str());
            }
        }
        dirs
    }
}
