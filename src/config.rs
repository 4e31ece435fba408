use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

use crate::{app::Cli, discovery::TargetPolicy};

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEFAULT_SETTINGS_PATH: &str = "settings.json";

#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings_path: PathBuf,
    pub target_policy: TargetPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
            target_policy: TargetPolicy::default(),
        }
    }
}

impl Config {
    pub fn read(file: &mut impl Read) -> anyhow::Result<Self> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .context("Failed to read config file")?;

        let config = toml::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn read_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut file = File::open(path).context("Failed to open config file")?;
        Self::read(&mut file)
    }

    pub fn from_cli_args(args: &Cli) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(config_path) => Self::read_path(config_path)?,
            None => {
                let default_config = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_config.exists() {
                    log::info!("Using default config file {DEFAULT_CONFIG_PATH}");
                    Self::read_path(default_config)?
                } else {
                    log::warn!("No config file found; using default config");
                    Config::default()
                }
            }
        };
        if let Some(settings_path) = &args.settings {
            config.settings_path = settings_path.clone();
        }
        if let Some(policy) = args.policy {
            config.target_policy = policy;
        }
        Ok(config)
    }
}
