use std::fmt;

use thiserror::Error;

use crate::{
    media::{MediaTarget, Rect},
    settings::Settings,
    shortcuts::{action_to_change, Action, ActionKind, Magnitude},
    utils::{clamp, format_clock},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("{kind} cannot be executed with magnitude {magnitude:?}")]
    MismatchedMagnitude {
        kind: ActionKind,
        magnitude: Option<Magnitude>,
    },

    #[error("Seek percentage {0} is outside 0.0..=1.0")]
    InvalidPercentage(f64),
}

impl ActionError {
    fn mismatch(action: &Action) -> Self {
        Self::MismatchedMagnitude {
            kind: action.kind,
            magnitude: action.magnitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Indicator {
    Play,
    Pause,
    Muted,
    Unmuted,
    Volume(f64),
    Speed(f64),
    Position { time: f64, duration: f64 },
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Play => write!(f, "Play"),
            Self::Pause => write!(f, "Pause"),
            Self::Muted => write!(f, "Muted"),
            Self::Unmuted => write!(f, "Unmuted"),
            Self::Volume(volume) => write!(f, "Volume {:.0}%", volume * 100.0),
            Self::Speed(rate) => {
                let rate = format!("{rate:.2}");
                let rate = rate.trim_end_matches('0').trim_end_matches('.');
                write!(f, "Speed {rate}x")
            }
            Self::Position { time, duration } => {
                write!(f, "{} / {}", format_clock(*time), format_clock(*duration))
            }
        }
    }
}

pub trait Feedback {
    fn show(&self, indicator: Indicator, anchor: Rect);
}

pub fn set_media_volume<M: MediaTarget + ?Sized>(target: &M, value: f64) -> f64 {
    let current = target.volume();
    if value.is_nan() {
        return current;
    }
    let volume = clamp(value, 0.0, 1.0);
    if volume == current {
        return current;
    }
    target.set_volume(volume);
    if volume > 0.0 && target.is_muted() {
        target.set_muted(false);
    }
    volume
}

/// Returns `Ok(None)` when the element cannot take the action (a seek without a known
/// duration); nothing is changed or shown then.
pub fn run_action<M, F>(
    target: &M,
    action: &Action,
    settings: &Settings,
    feedback: &F,
) -> Result<Option<Indicator>, ActionError>
where
    M: MediaTarget + ?Sized,
    F: Feedback + ?Sized,
{
    let Some(indicator) = apply(target, action, settings)? else {
        log::debug!("Skipped {}: target has no known duration", action.kind);
        return Ok(None);
    };
    log::debug!("Applied {}: {indicator}", action.kind);
    feedback.show(indicator, target.bounding_rect());
    Ok(Some(indicator))
}

fn apply<M: MediaTarget + ?Sized>(
    target: &M,
    action: &Action,
    settings: &Settings,
) -> Result<Option<Indicator>, ActionError> {
    let indicator = match action.kind {
        ActionKind::PlayPause => {
            expect_no_magnitude(action)?;
            if target.is_paused() {
                target.play();
                Indicator::Play
            } else {
                target.pause();
                Indicator::Pause
            }
        }
        ActionKind::MuteUnmute => {
            expect_no_magnitude(action)?;
            let muted = !target.is_muted();
            target.set_muted(muted);
            if muted {
                Indicator::Muted
            } else {
                Indicator::Unmuted
            }
        }
        ActionKind::VolumeUp | ActionKind::VolumeDown => {
            let delta = delta(action, settings)?;
            let volume = set_media_volume(target, target.volume() + delta);
            if volume > 0.0 && target.is_muted() {
                target.set_muted(false);
            }
            Indicator::Volume(volume)
        }
        ActionKind::SpeedUp | ActionKind::SpeedDown => {
            let delta = delta(action, settings)?;
            let current = target.playback_rate();
            let rate = clamp(current + delta, settings.min_speed, settings.max_speed);
            if rate != current {
                target.set_playback_rate(rate);
            }
            Indicator::Speed(rate)
        }
        ActionKind::SeekForwardLarge
        | ActionKind::SeekBackwardLarge
        | ActionKind::SeekForwardSmall
        | ActionKind::SeekBackwardSmall => {
            let delta = delta(action, settings)?;
            let Some(duration) = target.duration() else {
                return Ok(None);
            };
            seek(target, target.current_time() + delta, duration)
        }
        ActionKind::SeekToPercentage => {
            let Some(Magnitude::Percentage(percentage)) = action.magnitude else {
                return Err(ActionError::mismatch(action));
            };
            if !(0.0..=1.0).contains(&percentage) {
                return Err(ActionError::InvalidPercentage(percentage));
            }
            let Some(duration) = target.duration() else {
                return Ok(None);
            };
            seek(target, duration * percentage, duration)
        }
    };
    Ok(Some(indicator))
}

fn seek<M: MediaTarget + ?Sized>(target: &M, time: f64, duration: f64) -> Indicator {
    let time = clamp(time, 0.0, duration);
    target.set_current_time(time);
    Indicator::Position { time, duration }
}

fn delta(action: &Action, settings: &Settings) -> Result<f64, ActionError> {
    match action.magnitude {
        Some(Magnitude::Delta(delta)) => Ok(delta),
        None => {
            action_to_change(action.kind, settings).ok_or_else(|| ActionError::mismatch(action))
        }
        Some(Magnitude::Percentage(_)) => Err(ActionError::mismatch(action)),
    }
}

fn expect_no_magnitude(action: &Action) -> Result<(), ActionError> {
    match action.magnitude {
        None => Ok(()),
        Some(_) => Err(ActionError::mismatch(action)),
    }
}
