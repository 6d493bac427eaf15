use crate::error_metrics::directive::DEFAULT_DIRECTIVES;
use crate::error_metrics::options::{DEFAULT_LONG_HOMOPOLYMER, DEFAULT_PRIOR_Q};
use anyhow::Result;
use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// User defaults, read from `config.toml` in the platform config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_prior_q")]
    pub prior_q: u8,
    #[serde(default = "default_long_homopolymer")]
    pub long_homopolymer: usize,
    #[serde(default = "default_min_mapping_quality")]
    pub min_mapping_quality: u8,
    #[serde(default = "default_min_base_quality")]
    pub min_base_quality: u8,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "default_directives")]
    pub directives: Vec<String>,
}

fn default_prior_q() -> u8 {
    DEFAULT_PRIOR_Q
}

fn default_long_homopolymer() -> usize {
    DEFAULT_LONG_HOMOPOLYMER
}

fn default_min_mapping_quality() -> u8 {
    20
}

fn default_min_base_quality() -> u8 {
    20
}

fn default_max_depth() -> u32 {
    10_000
}

fn default_directives() -> Vec<String> {
    DEFAULT_DIRECTIVES.iter().map(|d| d.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prior_q: default_prior_q(),
            long_homopolymer: default_long_homopolymer(),
            min_mapping_quality: default_min_mapping_quality(),
            min_base_quality: default_min_base_quality(),
            max_depth: default_max_depth(),
            directives: default_directives(),
        }
    }
}

impl Config {
    fn path() -> Option<PathBuf> {
        ProjectDirs::from("com", "sam-error-metrics", "sam-error-metrics")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn load() -> Self {
        if let Some(config_path) = Self::path() {
            if config_path.exists() {
                if let Ok(content) = fs::read_to_string(&config_path) {
                    match Self::from_toml(&content) {
                        Ok(config) => return config,
                        Err(e) => warn!("Ignoring {}: {}", config_path.display(), e),
                    }
                }
            }
        }
        Config::default()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = Config::from_toml("prior_q = 25\n").unwrap();
        assert_eq!(config.prior_q, 25);
        assert_eq!(config.long_homopolymer, 6);
        assert_eq!(config.min_base_quality, 20);
        assert_eq!(config.directives.len(), DEFAULT_DIRECTIVES.len());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.directives = vec!["ERROR:CYCLE".to_string()];
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::from_toml("prior_q = \"high\"").is_err());
    }
}
