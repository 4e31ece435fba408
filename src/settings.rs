use std::{
    fmt, fs,
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use anyhow::Context;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub min_speed: f64,
    pub max_speed: f64,
    pub speed_step: f64,
    pub volume_step: f64,
    pub seek_step_large: f64,
    pub seek_step_small: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_speed: 0.25,
            max_speed: 4.0,
            speed_step: 0.25,
            volume_step: 0.1,
            seek_step_large: 10.0,
            seek_step_small: 5.0,
        }
    }
}

pub type SharedSettings = Arc<RwLock<Settings>>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Min speed must be less than Max speed.")]
    SpeedRange,

    #[error("{0} must be positive.")]
    NonPositiveStep(&'static str),

    #[error("{0} must be a number.")]
    NotFinite(&'static str),
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let fields = [
            ("Min speed", self.min_speed),
            ("Max speed", self.max_speed),
            ("Step", self.speed_step),
            ("Volume step", self.volume_step),
            ("Large seek step", self.seek_step_large),
            ("Small seek step", self.seek_step_small),
        ];
        if let Some(&(name, _)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(SettingsError::NotFinite(name));
        }
        if self.min_speed >= self.max_speed {
            return Err(SettingsError::SpeedRange);
        }
        for &(name, value) in &fields[2..] {
            if value <= 0.0 {
                return Err(SettingsError::NonPositiveStep(name));
            }
        }
        Ok(())
    }

    pub fn with_speeds(
        self,
        min_speed: Option<f64>,
        max_speed: Option<f64>,
        speed_step: Option<f64>,
    ) -> Self {
        Self {
            min_speed: min_speed.unwrap_or(self.min_speed),
            max_speed: max_speed.unwrap_or(self.max_speed),
            speed_step: speed_step.unwrap_or(self.speed_step),
            ..self
        }
    }

    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    pub fn saved() -> Self {
        Self {
            text: "Options saved.".to_string(),
            is_error: false,
        }
    }

    pub fn error(err: &SettingsError) -> Self {
        Self {
            text: format!("Error: {err}"),
            is_error: true,
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored settings. Only I/O failures are errors: a missing file, an unparsable
    /// one and values that do not validate all yield the defaults.
    pub fn load(&self) -> anyhow::Result<Settings> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!(
                    "No settings stored at {}; using defaults",
                    self.path.display()
                );
                return Ok(Settings::default());
            }
            Err(err) => {
                return Err(anyhow::Error::from(err).context(format!(
                    "Failed to read settings file {}",
                    self.path.display()
                )))
            }
        };
        let settings = match Settings::parse(&contents) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!(
                    "Ignoring unparsable settings in {}: {err}",
                    self.path.display()
                );
                return Ok(Settings::default());
            }
        };
        if let Err(err) = settings.validate() {
            log::warn!(
                "Ignoring invalid settings in {}: {err}",
                self.path.display()
            );
            return Ok(Settings::default());
        }
        Ok(settings)
    }

    // rejected values leave the stored file untouched
    pub fn save(&self, settings: &Settings) -> anyhow::Result<StatusMessage> {
        if let Err(err) = settings.validate() {
            return Ok(StatusMessage::error(&err));
        }
        let contents =
            serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(&self.path, contents).with_context(|| {
            format!("Failed to write settings file {}", self.path.display())
        })?;
        log::debug!("Saved settings to {}", self.path.display());
        Ok(StatusMessage::saved())
    }

    pub fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|meta| meta.modified()).ok()
    }
}
