use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_PAGE_CAPACITY, MAX_KMER_LEN, MIN_PAGE_CAPACITY};

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub index: IndexSettings,
    pub sources: HashMap<String, SourceDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct IndexSettings {
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_page_capacity")]
    pub page_capacity: usize,
    pub output: PathBuf,
}

fn default_k() -> usize {
    21
}

fn default_page_capacity() -> usize {
    DEFAULT_PAGE_CAPACITY
}

#[derive(Debug, Deserialize)]
pub struct SourceDefinition {
    pub files: Vec<PathBuf>,
}

pub fn parse_config(path: &Path) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path)
        .context(format!("Failed to read config file: {}", path.display()))?;

    let config: ConfigFile =
        toml::from_str(&contents).context("Failed to parse TOML config")?;

    if config.sources.is_empty() {
        return Err(anyhow!("Config must define at least one source"));
    }

    if config.index.k == 0 || config.index.k > MAX_KMER_LEN {
        return Err(anyhow!(
            "Config error: k must be between 1 and {} (got {})",
            MAX_KMER_LEN,
            config.index.k
        ));
    }

    if config.index.page_capacity < MIN_PAGE_CAPACITY {
        return Err(anyhow!(
            "Config error: page_capacity must be at least {} (got {})",
            MIN_PAGE_CAPACITY,
            config.index.page_capacity
        ));
    }

    Ok(config)
}

pub fn validate_config(config: &ConfigFile, config_dir: &Path) -> Result<()> {
    for (source_name, source_def) in &config.sources {
        if source_def.files.is_empty() {
            return Err(anyhow!("Source '{}' has no files", source_name));
        }

        for file_path in &source_def.files {
            let abs_path = resolve_path(config_dir, file_path);
            if !abs_path.exists() {
                return Err(anyhow!(
                    "File not found for source '{}': {}",
                    source_name,
                    abs_path.display()
                ));
            }
        }
    }
    Ok(())
}

/// Resolve a possibly-relative path against the config file's directory.
pub fn resolve_path(config_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir.join(path)
    }
}
