//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::adapters::CacheConfig;
use crate::error::Error;
use crate::layout::{LayoutAlgorithm, LayoutOptions};

/// Galaxy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub layout: LayoutConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Root scanned for documents and manifests; `GALAXY_ROOT` takes precedence
    pub root_path: Option<PathBuf>,
    pub cache_enabled: bool,
    pub cache_ttl_ms: u64,
    /// Substitute the built-in sample snapshot when config manifests are unavailable
    pub fallback_to_sample_config: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub algorithm: LayoutAlgorithm,
    pub seed: Option<u64>,
    pub force_iterations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub debounce_ms: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            root_path: None,
            cache_enabled: true,
            cache_ttl_ms: 5 * 60 * 1000,
            fallback_to_sample_config: false,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            algorithm: LayoutAlgorithm::Orbital,
            seed: None,
            force_iterations: 300,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

impl SourcesConfig {
    /// Root directory to ingest: `GALAXY_ROOT`, then `root_path`, then `~/.claude`
    pub fn resolved_root(&self) -> anyhow::Result<PathBuf> {
        if let Ok(root) = env::var("GALAXY_ROOT") {
            if !root.is_empty() {
                return Ok(PathBuf::from(root));
            }
        }
        if let Some(root) = &self.root_path {
            return Ok(root.clone());
        }
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not determine home directory"))?
            .join(".claude"))
    }

    /// Adapter cache policy derived from these settings
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            enabled: self.cache_enabled,
            ttl: Duration::from_millis(self.cache_ttl_ms),
        }
    }
}

impl LayoutConfig {
    /// Layout options with the configured seed and iteration count
    pub fn options(&self) -> LayoutOptions {
        let mut options = LayoutOptions::default().with_seed(self.seed);
        options.force.iterations = self.force_iterations;
        options
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("GALAXY_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("galaxy")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            // Return default config without creating file
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.layout.force_iterations == 0 {
            return Err(Error::ConfigError(
                "layout.force_iterations must be at least 1".to_string(),
            )
            .into());
        }
        if self.sources.cache_enabled && self.sources.cache_ttl_ms == 0 {
            return Err(Error::ConfigError(
                "sources.cache_ttl_ms must be positive while the cache is enabled".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // Source settings
            "sources.root_path" => Ok(self
                .sources
                .root_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(not set - defaults to GALAXY_ROOT or ~/.claude)".to_string())),
            "sources.cache_enabled" => Ok(self.sources.cache_enabled.to_string()),
            "sources.cache_ttl_ms" => Ok(self.sources.cache_ttl_ms.to_string()),
            "sources.fallback_to_sample_config" => {
                Ok(self.sources.fallback_to_sample_config.to_string())
            }

            // Layout settings
            "layout.algorithm" => Ok(self.layout.algorithm.to_string()),
            "layout.seed" => Ok(self
                .layout
                .seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "(not set)".to_string())),
            "layout.force_iterations" => Ok(self.layout.force_iterations.to_string()),

            // Watch settings
            "watch.debounce_ms" => Ok(self.watch.debounce_ms.to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `galaxy config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "sources.root_path" => {
                self.sources.root_path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "sources.cache_enabled" => {
                self.sources.cache_enabled = value
                    .parse()
                    .with_context(|| format!("Invalid cache_enabled value: {}", value))?;
            }
            "sources.cache_ttl_ms" => {
                let ttl: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid cache_ttl_ms value: {}", value))?;
                if ttl == 0 {
                    return Err(anyhow!("Cache TTL must be positive"));
                }
                self.sources.cache_ttl_ms = ttl;
            }
            "sources.fallback_to_sample_config" => {
                self.sources.fallback_to_sample_config = value.parse().with_context(|| {
                    format!("Invalid fallback_to_sample_config value: {}", value)
                })?;
            }

            "layout.algorithm" => {
                self.layout.algorithm = value.parse().map_err(|_| {
                    anyhow!(
                        "Invalid layout algorithm: {}. Valid options: {}",
                        value,
                        LayoutAlgorithm::all()
                            .iter()
                            .map(|a| a.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                })?;
            }
            "layout.seed" => {
                self.layout.seed = if value.is_empty() || value == "none" {
                    None
                } else {
                    Some(
                        value
                            .parse()
                            .with_context(|| format!("Invalid seed value: {}", value))?,
                    )
                };
            }
            "layout.force_iterations" => {
                let iterations: usize = value
                    .parse()
                    .with_context(|| format!("Invalid force_iterations value: {}", value))?;
                if iterations == 0 {
                    return Err(anyhow!("Force iterations must be at least 1"));
                }
                self.layout.force_iterations = iterations;
            }

            "watch.debounce_ms" => {
                self.watch.debounce_ms = value
                    .parse()
                    .with_context(|| format!("Invalid debounce_ms value: {}", value))?;
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `galaxy config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "sources.root_path",
            "sources.cache_enabled",
            "sources.cache_ttl_ms",
            "sources.fallback_to_sample_config",
            "layout.algorithm",
            "layout.seed",
            "layout.force_iterations",
            "watch.debounce_ms",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
