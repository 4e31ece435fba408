use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Handles are shared, so setters take `&self` and implementations use interior
/// mutability, the same way page elements are mutated through any reference to them.
pub trait MediaTarget {
    fn is_paused(&self) -> bool;
    fn play(&self);
    fn pause(&self);

    fn current_time(&self) -> f64;
    fn set_current_time(&self, time: f64);

    fn duration(&self) -> Option<f64>;

    fn volume(&self) -> f64;
    fn set_volume(&self, volume: f64);

    fn is_muted(&self) -> bool;
    fn set_muted(&self, muted: bool);

    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&self, rate: f64);

    fn bounding_rect(&self) -> Rect;
}
