use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::analysis::CountSource;
use crate::keywords::{Category, KeywordSet};

/// Top-level configuration from `.msminer.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub keywords: KeywordsConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
}

/// Which descriptor files to look for and where not to look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_filenames")]
    pub filenames: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

fn default_filenames() -> Vec<String> {
    vec![
        "docker-compose.yml".to_string(),
        "docker-compose.yaml".to_string(),
    ]
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            filenames: default_filenames(),
            exclude_patterns: Vec::new(),
        }
    }
}

/// Keyword list overrides. Extra words are appended to the base lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordsConfig {
    /// Directory holding `<category>.txt` lists that replace the bundled ones.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub database: Vec<String>,
    #[serde(default)]
    pub server: Vec<String>,
    #[serde(default)]
    pub bus: Vec<String>,
    #[serde(default)]
    pub language: Vec<String>,
    #[serde(default)]
    pub gateway: Vec<String>,
    #[serde(default)]
    pub monitor: Vec<String>,
    #[serde(default)]
    pub discovery: Vec<String>,
}

impl KeywordsConfig {
    pub fn extra(&self, category: Category) -> &[String] {
        match category {
            Category::Database => &self.database,
            Category::Server => &self.server,
            Category::Bus => &self.bus,
            Category::Language => &self.language,
            Category::Gateway => &self.gateway,
            Category::Monitor => &self.monitor,
            Category::Discovery => &self.discovery,
        }
    }

    /// Build the keyword set: bundled or directory lists plus extras.
    ///
    /// A relative `directory` is resolved against `base`.
    pub fn build(&self, base: &Path) -> Result<KeywordSet> {
        let mut set = match &self.directory {
            Some(dir) => {
                let dir = if dir.is_absolute() {
                    dir.clone()
                } else {
                    base.join(dir)
                };
                KeywordSet::from_dir(&dir)?
            }
            None => KeywordSet::bundled(),
        };
        for category in Category::ALL {
            set.extend(category, self.extra(category));
        }
        Ok(set)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default)]
    pub count_source: CountSource,
}

impl Config {
    /// Load configuration from a `.msminer.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `msminer init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `.msminer.toml` in the given directory or any ancestor, or return defaults.
    ///
    /// Also returns the directory the file was found in, for resolving relative paths.
    pub fn load_or_default(dir: &Path) -> (Self, PathBuf) {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(".msminer.toml");
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => (config, current.to_path_buf()),
                    Err(e) => {
                        warn!(
                            "failed to load config from '{}': {e:#}. Using defaults.",
                            config_path.display()
                        );
                        (Self::default(), start.clone())
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        (Self::default(), start)
    }

    /// Generate default TOML content for `msminer init`.
    pub fn default_toml() -> String {
        r#"# msminer - microservice topology mining configuration

[discovery]
# Descriptor file names searched for recursively, in priority order.
# Glob syntax is accepted.
filenames = ["docker-compose.yml", "docker-compose.yaml"]
# Paths (relative to the analyzed root) that are never searched.
exclude_patterns = []

[keywords]
# Directory with database.txt, server.txt, bus.txt, language.txt,
# gateway.txt, monitor.txt and discovery.txt replacing the bundled lists.
# directory = "keywords"

# Extra keywords appended to the lists, one array per category.
# database = ["yugabyte"]
# gateway = ["apisix"]

[dataset]
# Graph supplying the MICROSERVICES column: "full" or "microservice".
count_source = "full"
"#
        .to_string()
    }
}
