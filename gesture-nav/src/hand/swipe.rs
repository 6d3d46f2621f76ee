//! Horizontal swipe detection from palm-center displacement.
//!
//! The tracker anchors on the first open-hand sample, measures horizontal
//! displacement against that anchor, and fires once the displacement
//! crosses the threshold inside the time window.  A cooldown masks
//! detection after each swipe without resetting the window.

use tracing::debug;

/// Raw direction of palm movement in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Palm x decreased.
    Left,
    /// Palm x increased.
    Right,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

// ── Config ─────────────────────────────────────────────────

/// Configuration for swipe detection.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeConfig {
    /// Minimum horizontal displacement (normalized) to fire.
    pub displacement_threshold: f32,
    /// Samples older than this (ms) relative to the anchor restart the window.
    pub window_ms: f64,
    /// Minimum time (ms) between two swipes.
    pub cooldown_ms: f64,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            displacement_threshold: 0.15,
            window_ms: 500.0,
            cooldown_ms: 600.0,
        }
    }
}

// ── Tracker ────────────────────────────────────────────────

/// Per-session swipe tracking state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwipeTrackerState {
    /// Palm x the current window is measured from.
    anchor_x: Option<f32>,
    /// When the anchor was taken (ms).
    anchor_time_ms: f64,
    /// When the last swipe fired (ms), if ever.
    last_swipe_ms: Option<f64>,
}

impl SwipeTrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor(&self) -> Option<(f32, f64)> {
        self.anchor_x.map(|x| (x, self.anchor_time_ms))
    }

    pub fn last_swipe_ms(&self) -> Option<f64> {
        self.last_swipe_ms
    }

    /// Drop the accumulating window.  The cooldown is kept.
    pub fn clear_anchor(&mut self) {
        self.anchor_x = None;
    }

    /// Discard all state, cooldown included.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn set_anchor(&mut self, x: f32, now_ms: f64) {
        self.anchor_x = Some(x);
        self.anchor_time_ms = now_ms;
    }

    /// Feed one open-hand palm sample.  Returns a direction when a swipe fires.
    pub fn detect(&mut self, palm_x: f32, now_ms: f64, config: &SwipeConfig) -> Option<SwipeDirection> {
        let anchor_x = match self.anchor_x {
            Some(x) => x,
            None => {
                self.set_anchor(palm_x, now_ms);
                return None;
            }
        };

        let dx = palm_x - anchor_x;
        let dt = now_ms - self.anchor_time_ms;

        // Too slow: restart the window here.
        if dt > config.window_ms {
            self.set_anchor(palm_x, now_ms);
            return None;
        }

        if let Some(last) = self.last_swipe_ms {
            if now_ms - last < config.cooldown_ms {
                return None;
            }
        }

        if dx.abs() > config.displacement_threshold {
            self.last_swipe_ms = Some(now_ms);
            self.anchor_x = None;
            let direction = if dx > 0.0 {
                SwipeDirection::Right
            } else {
                SwipeDirection::Left
            };
            debug!(dx, dt, direction = direction.as_str(), "swipe detected");
            return Some(direction);
        }

        None
    }
}

// ── Tests ──────────────────────────────────────────────────
