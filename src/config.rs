use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;

fn default_max_depth() -> u32 {
    2
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Config {
    pub version: u32,
    /// Base directory scanning starts from. No default; scans are skipped
    /// until the user sets one.
    #[serde(default)]
    pub base_path: Option<PathBuf>,
    /// Maximum number of path segments below the base path to descend into.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            base_path: None,
            max_depth: default_max_depth(),
        }
    }
}

pub fn get_default_config_path() -> Result<PathBuf> {
    let proj_dirs =
        ProjectDirs::from("", "", "gitjump").context("Failed to determine project directories")?;

    let config_dir = proj_dirs.config_dir();
    Ok(config_dir.join("gitjump.toml"))
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p,
            None => get_default_config_path()?,
        };

        if !path.exists() {
            let default_config = Config::default();
            // Create directory if it doesn't exist
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            default_config.save(&path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn from_cli_and_file(cli_args: &CliArgs, config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load(config_path)?;

        // CLI args override config file
        if let Some(base_path) = &cli_args.base_path {
            config.base_path = Some(base_path.clone());
        }
        if let Some(max_depth) = cli_args.max_depth {
            config.max_depth = max_depth;
        }

        Ok(config)
    }

    /// Check that the configured base path exists and is a directory.
    /// Used before persisting configuration, not at scan time; a scan over
    /// a bad path just comes back empty.
    pub fn validate_base_path(&self) -> Result<()> {
        let Some(base_path) = &self.base_path else {
            bail!("No base path configured");
        };
        if !base_path.is_dir() {
            bail!(
                "Base path does not exist or is not a directory: {}",
                base_path.display()
            );
        }
        Ok(())
    }
}
