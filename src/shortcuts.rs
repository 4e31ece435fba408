use std::{collections::HashMap, fmt, sync::LazyLock};

use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    PlayPause,
    MuteUnmute,
    VolumeUp,
    VolumeDown,
    SpeedUp,
    SpeedDown,
    SeekForwardLarge,
    SeekBackwardLarge,
    SeekForwardSmall,
    SeekBackwardSmall,
    SeekToPercentage,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::PlayPause => "play/pause",
            Self::MuteUnmute => "mute/unmute",
            Self::VolumeUp => "volume up",
            Self::VolumeDown => "volume down",
            Self::SpeedUp => "speed up",
            Self::SpeedDown => "speed down",
            Self::SeekForwardLarge => "seek forward (large)",
            Self::SeekBackwardLarge => "seek backward (large)",
            Self::SeekForwardSmall => "seek forward (small)",
            Self::SeekBackwardSmall => "seek backward (small)",
            Self::SeekToPercentage => "seek to percentage",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Magnitude {
    Delta(f64),
    Percentage(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub magnitude: Option<Magnitude>,
}

impl Action {
    pub const fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            magnitude: None,
        }
    }

    pub const fn seek_to(percentage: f64) -> Self {
        Self {
            kind: ActionKind::SeekToPercentage,
            magnitude: Some(Magnitude::Percentage(percentage)),
        }
    }
}

#[cfg(test)]
impl Action {
    pub const fn with_delta(kind: ActionKind, delta: f64) -> Self {
        Self {
            kind,
            magnitude: Some(Magnitude::Delta(delta)),
        }
    }
}

pub const SEEK_END_KEY: char = ')';

fn build_key_bindings() -> HashMap<char, ActionKind> {
    let mut bindings = HashMap::from([
        ('k', ActionKind::PlayPause),
        ('m', ActionKind::MuteUnmute),
        (']', ActionKind::VolumeUp),
        ('[', ActionKind::VolumeDown),
        ('>', ActionKind::SpeedUp),
        ('<', ActionKind::SpeedDown),
        ('l', ActionKind::SeekForwardLarge),
        ('j', ActionKind::SeekBackwardLarge),
        ('.', ActionKind::SeekForwardSmall),
        (',', ActionKind::SeekBackwardSmall),
        (SEEK_END_KEY, ActionKind::SeekToPercentage),
    ]);
    for digit in '0'..='9' {
        bindings.insert(digit, ActionKind::SeekToPercentage);
    }
    bindings
}

static KEY_BINDINGS: LazyLock<HashMap<char, ActionKind>> = LazyLock::new(build_key_bindings);

pub fn supported_keys() -> impl Iterator<Item = char> {
    KEY_BINDINGS.keys().copied()
}

pub fn binding(key: char) -> Option<ActionKind> {
    KEY_BINDINGS.get(&key).copied()
}

/// Percentage keys carry their target in the magnitude; every other action leaves the
/// magnitude empty so the configured step applies at execution time.
pub fn resolve(key: char) -> Option<Action> {
    let kind = binding(key)?;
    let action = match kind {
        ActionKind::SeekToPercentage => Action::seek_to(seek_percentage(key)?),
        _ => Action::new(kind),
    };
    log::trace!("Resolved key {key:?} to {action:?}");
    Some(action)
}

pub fn seek_percentage(key: char) -> Option<f64> {
    if key == SEEK_END_KEY {
        return Some(1.0);
    }
    key.to_digit(10).map(|digit| f64::from(digit) / 10.0)
}

pub fn action_to_change(kind: ActionKind, settings: &Settings) -> Option<f64> {
    let change = match kind {
        ActionKind::VolumeUp => settings.volume_step,
        ActionKind::VolumeDown => -settings.volume_step,
        ActionKind::SpeedUp => settings.speed_step,
        ActionKind::SpeedDown => -settings.speed_step,
        ActionKind::SeekForwardLarge => settings.seek_step_large,
        ActionKind::SeekBackwardLarge => -settings.seek_step_large,
        ActionKind::SeekForwardSmall => settings.seek_step_small,
        ActionKind::SeekBackwardSmall => -settings.seek_step_small,
        ActionKind::PlayPause | ActionKind::MuteUnmute | ActionKind::SeekToPercentage => {
            return None
        }
    };
    Some(change)
}
