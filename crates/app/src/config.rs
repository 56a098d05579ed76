use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CliArgs;

/// Engine configuration, loaded once at startup and injected
/// immutably into the adapters. Nothing here changes at runtime.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Config {
    pub version: u32,
    pub scan_dir: PathBuf,
    /// Branch names never offered as prune candidates.
    #[serde(default = "default_protected_branches")]
    pub protected_branches: Vec<String>,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Per-command timeouts in seconds. Fetch and pull talk to remotes
/// and get more room than local queries.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TimeoutConfig {
    pub default_secs: u64,
    pub fetch_secs: u64,
    pub pull_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_secs: 30,
            fetch_secs: 60,
            pull_secs: 120,
        }
    }
}

impl TimeoutConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_secs)
    }

    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_secs)
    }
}

fn default_protected_branches() -> Vec<String> {
    [
        "main",
        "master",
        "develop",
        "dev",
        "production",
        "staging",
        "release",
    ]
    .map(String::from)
    .to_vec()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            scan_dir: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            protected_branches: default_protected_branches(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

pub fn get_default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "repofresh")
        .context("Failed to determine project directories")?;

    let config_dir = proj_dirs.config_dir();
    Ok(config_dir.join("repofresh.toml"))
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p,
            None => get_default_config_path()?,
        };

        if !path.exists() {
            let default_config = Config::default();
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

    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn from_cli_and_file(cli_args: CliArgs, config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load(config_path.or(cli_args.config))?;

        // CLI args override the config file
        if let Some(scan_dir) = cli_args.scan_dir {
            config.scan_dir = scan_dir;
        }

        Ok(config)
    }
}
