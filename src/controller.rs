use std::str::FromStr;

use thiserror::Error;

use crate::{
    discovery::{get_target_media, Node, TargetPolicy},
    engine::{run_action, ActionError, Feedback, Indicator},
    settings::SharedSettings,
    shortcuts::{self, Action},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: char,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub const fn plain(key: char) -> Self {
        Self {
            key,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    pub fn has_modifiers(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("key token is empty")]
    Empty,
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
    #[error("'{0}' is not a single key")]
    NotSingleKey(String),
}

impl FromStr for KeyEvent {
    type Err = KeyParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.is_empty() {
            return Err(KeyParseError::Empty);
        }
        // a lone "+" is a key, not a separator
        let (modifiers, key) = match token.rsplit_once('+') {
            Some((modifiers, "")) => (modifiers.strip_suffix('+').unwrap_or(modifiers), "+"),
            Some((modifiers, key)) => (modifiers, key),
            None => ("", token),
        };

        let key = match key {
            "space" => ' ',
            "plus" => '+',
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(key), None) => key,
                    _ => return Err(KeyParseError::NotSingleKey(key.to_string())),
                }
            }
        };

        let mut event = KeyEvent::plain(key);
        for modifier in modifiers.split('+').filter(|m| !m.is_empty()) {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => event.ctrl = true,
                "alt" | "option" => event.alt = true,
                "meta" | "cmd" | "super" => event.meta = true,
                "shift" => {}
                _ => return Err(KeyParseError::UnknownModifier(modifier.to_string())),
            }
        }
        Ok(event)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Ignored,
    Unbound,
    NoTarget(Action),
    Applied {
        action: Action,
        indicator: Option<Indicator>,
    },
}

pub struct Controller<N: Node, F> {
    settings: SharedSettings,
    policy: TargetPolicy,
    feedback: F,
    last_interacted: Option<N::Media>,
}

impl<N: Node, F: Feedback> Controller<N, F> {
    pub fn new(settings: SharedSettings, policy: TargetPolicy, feedback: F) -> Self {
        Self {
            settings,
            policy,
            feedback,
            last_interacted: None,
        }
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn note_interaction(&mut self, media: N::Media) {
        self.last_interacted = Some(media);
    }

    pub fn handle_key(&mut self, event: &KeyEvent, root: &N) -> Result<KeyOutcome, ActionError> {
        if event.has_modifiers() {
            return Ok(KeyOutcome::Ignored);
        }
        let Some(action) = shortcuts::resolve(event.key) else {
            return Ok(KeyOutcome::Unbound);
        };
        let Some(target) = get_target_media(root, self.policy, self.last_interacted.as_ref())
        else {
            log::debug!("No media on the page for {}", action.kind);
            return Ok(KeyOutcome::NoTarget(action));
        };

        let settings = *self.settings.read();
        let indicator = run_action(&target, &action, &settings, &self.feedback)?;
        self.last_interacted = Some(target);
        Ok(KeyOutcome::Applied { action, indicator })
    }
}
