//! CLI configuration: `metagraph.toml` plus environment overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use metagraph_core::query::{DEFAULT_LIMIT, MAX_HOPS};
use metagraph_graph::GraphConfig;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "metagraph.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetagraphConfig {
    pub graph: GraphConfig,
    pub packages: PackagesConfig,
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PackagesConfig {
    /// SQLite file holding the package hierarchy.
    pub path: PathBuf,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("packages.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_limit: u32,
    pub max_hops: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_hops: MAX_HOPS,
        }
    }
}

impl MetagraphConfig {
    /// Load `path`, or `./metagraph.toml` when present, then apply the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(uri) = var("NEO4J_URI") {
            self.graph.uri = uri;
        }
        if let Some(user) = var("NEO4J_USER") {
            self.graph.user = user;
        }
        if let Some(password) = var("NEO4J_PASSWORD") {
            self.graph.password = password;
        }
        if let Some(database) = var("NEO4J_DATABASE") {
            self.graph.database = database;
        }
        if let Some(path) = var("METAGRAPH_PACKAGES_DB") {
            self.packages.path = PathBuf::from(path);
        }
    }
}
