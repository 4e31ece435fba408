use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{runtime::Handle, task::JoinHandle};

use crate::{
    engine::{Feedback, Indicator},
    media::Rect,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shown {
    pub indicator: Indicator,
    pub left: f64,
    pub top: f64,
    pub anchor: Rect,
}

#[derive(Debug, Default)]
struct OverlayState {
    shown: Option<Shown>,
    generation: u64,
    hide_timer: Option<JoinHandle<()>>,
}

/// Each `show` replaces what is visible and restarts the hide countdown. The overlay keeps
/// its own copy of the anchor, so the element may disappear while it is visible.
#[derive(Debug, Clone)]
pub struct Overlay {
    state: Arc<Mutex<OverlayState>>,
    runtime: Handle,
    hide_after: Duration,
}

impl Overlay {
    pub const HIDE_AFTER: Duration = Duration::from_secs(2);
    const ANCHOR_INSET: f64 = 10.0;

    pub fn new(runtime: Handle) -> Self {
        Self {
            state: Arc::new(Mutex::new(OverlayState::default())),
            runtime,
            hide_after: Self::HIDE_AFTER,
        }
    }

    pub fn current(&self) -> Option<Shown> {
        self.state.lock().shown
    }

    pub fn hide(&self) {
        let mut state = self.state.lock();
        if let Some(timer) = state.hide_timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.shown = None;
    }
}

impl Feedback for Overlay {
    fn show(&self, indicator: Indicator, anchor: Rect) {
        let shown = Shown {
            indicator,
            left: anchor.left + Self::ANCHOR_INSET,
            top: anchor.top + Self::ANCHOR_INSET,
            anchor,
        };
        log::info!(
            "{indicator} (over {:.0}x{:.0} at {:.0}, {:.0})",
            anchor.width,
            anchor.height,
            anchor.left,
            anchor.top
        );

        let mut state = self.state.lock();
        if let Some(timer) = state.hide_timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.shown = Some(shown);

        let generation = state.generation;
        let overlay_state = Arc::clone(&self.state);
        let hide_after = self.hide_after;
        state.hide_timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep(hide_after).await;
            let mut state = overlay_state.lock();
            // a newer show owns the overlay now
            if state.generation != generation {
                return;
            }
            state.shown = None;
            state.hide_timer = None;
            log::debug!("Overlay hidden");
        }));
    }
}
