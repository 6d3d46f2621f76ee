//! Navigation gesture recognition from hand landmark frames.
//!
//! Combines finger extension, swipe detection, and two debounce timers
//! into one named classification per frame, and raises pause and page
//! navigation events.  Frames must be fed serially; there is no locking.

use tracing::{debug, info};

use super::fingers::{classify_fingers, FingerConfig};
use super::landmarks::{HandLandmark, InvalidFrameError, LandmarkFrame};
use super::swipe::{SwipeConfig, SwipeDirection, SwipeTrackerState};

// ── Gesture names ──────────────────────────────────────────

/// Published classification names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureName {
    /// Session not running.
    Waiting,
    /// No hand in view.
    Scanning,
    /// Fist held.
    Paused,
    /// Partial hand, debounce elapsed.
    Ready,
    /// Partial hand shortly after a fist or open pose.
    Stabilizing,
    /// Open hand, no swipe this frame.
    SwipeReady,
    /// Previous-page swipe fired this frame.
    SwipeLeft,
    /// Next-page swipe fired this frame.
    SwipeRight,
}

impl GestureName {
    /// Wire name for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Scanning => "SCANNING",
            Self::Paused => "PAUSED",
            Self::Ready => "READY",
            Self::Stabilizing => "STABILIZING",
            Self::SwipeReady => "SWIPE_READY",
            Self::SwipeLeft => "SWIPE_LEFT",
            Self::SwipeRight => "SWIPE_RIGHT",
        }
    }

    /// Human-readable indicator label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Scanning => "Scanning...",
            Self::Paused => "Paused",
            Self::Ready => "Ready",
            Self::Stabilizing => "Stabilizing...",
            Self::SwipeReady => "Swipe Ready",
            Self::SwipeLeft => "← Previous",
            Self::SwipeRight => "Next →",
        }
    }
}

// ── Events ─────────────────────────────────────────────────

/// Navigation events raised by gesture recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavEvent {
    /// Fist held this frame.  Repeats on every fist frame.
    Pause,
    PreviousPage,
    NextPage,
}

impl NavEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::PreviousPage => "previous-page",
            Self::NextPage => "next-page",
        }
    }
}

/// Receiver for navigation events, supplied per call.
pub trait NavigationSink {
    fn on_nav_event(&mut self, event: NavEvent);
}

impl NavigationSink for Vec<NavEvent> {
    fn on_nav_event(&mut self, event: NavEvent) {
        self.push(event);
    }
}

/// Map a raw swipe direction to the page action and display name.
///
/// The camera image is mirrored: moving the hand to the user's right
/// shows up as decreasing palm x, so raw `Left` means "next page".
pub fn swipe_action(direction: SwipeDirection) -> (NavEvent, GestureName) {
    match direction {
        SwipeDirection::Left => (NavEvent::NextPage, GestureName::SwipeRight),
        SwipeDirection::Right => (NavEvent::PreviousPage, GestureName::SwipeLeft),
    }
}

// ── Classification ─────────────────────────────────────────

/// One frame's published result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureClassification {
    pub name: GestureName,
    /// Extended fingers including the thumb (0-5).
    pub finger_count: u8,
    /// Handedness confidence (0.0-1.0).
    pub confidence: f32,
}

impl GestureClassification {
    pub fn waiting() -> Self {
        Self::idle(GestureName::Waiting)
    }

    fn idle(name: GestureName) -> Self {
        Self {
            name,
            finger_count: 0,
            confidence: 0.0,
        }
    }

    /// Generate s-expression for IPC.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:name {} :label \"{}\" :finger-count {} :confidence {:.2})",
            self.name.as_str(),
            self.name.label(),
            self.finger_count,
            self.confidence,
        )
    }
}

/// Result of classifying a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub classification: GestureClassification,
    /// At most one event per frame.
    pub event: Option<NavEvent>,
}

// ── Config ─────────────────────────────────────────────────

/// Configuration for gesture recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Finger extension thresholds.
    pub fingers: FingerConfig,
    /// Swipe displacement, window, and cooldown.
    pub swipe: SwipeConfig,
    /// Extended fingers (thumb included) that make an open hand.
    pub open_hand_min_fingers: u8,
    /// Partial-hand poses stay STABILIZING this long (ms) after a fist.
    pub fist_release_delay_ms: f64,
    /// Partial-hand poses stay STABILIZING this long (ms) after an open hand.
    pub open_release_delay_ms: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            fingers: FingerConfig::default(),
            swipe: SwipeConfig::default(),
            open_hand_min_fingers: 4,
            fist_release_delay_ms: 600.0,
            open_release_delay_ms: 500.0,
        }
    }
}

impl GestureConfig {
    /// Generate s-expression for IPC config.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:thumb-axis-threshold {} :thumb-palm-proximity {} :finger-extend-threshold {} :open-hand-min-fingers {} :swipe-displacement-threshold {} :swipe-window-ms {} :swipe-cooldown-ms {} :fist-release-delay-ms {} :open-release-delay-ms {})",
            self.fingers.thumb_axis_threshold,
            self.fingers.thumb_palm_proximity,
            self.fingers.finger_extend_threshold,
            self.open_hand_min_fingers,
            self.swipe.displacement_threshold,
            self.swipe.window_ms,
            self.swipe.cooldown_ms,
            self.fist_release_delay_ms,
            self.open_release_delay_ms,
        )
    }
}

// ── Debounce ───────────────────────────────────────────────

/// When the fist and open-hand poses were last seen (ms).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebounceTimers {
    pub last_fist_ms: Option<f64>,
    pub last_open_ms: Option<f64>,
}

impl DebounceTimers {
    /// Both release delays have elapsed.  A pose never seen imposes no delay.
    fn settled(&self, now_ms: f64, config: &GestureConfig) -> bool {
        let fist_ok = self
            .last_fist_ms
            .map_or(true, |t| now_ms - t > config.fist_release_delay_ms);
        let open_ok = self
            .last_open_ms
            .map_or(true, |t| now_ms - t > config.open_release_delay_ms);
        fist_ok && open_ok
    }
}

/// Classify one frame against explicit session state.
///
/// `frame` is `None` when no hand was detected.  An invalid frame returns
/// an error before any state is touched.
pub fn classify(
    config: &GestureConfig,
    frame: Option<&LandmarkFrame>,
    now_ms: f64,
    swipe: &mut SwipeTrackerState,
    timers: &mut DebounceTimers,
) -> Result<FrameOutcome, InvalidFrameError> {
    let frame = match frame {
        Some(f) => f,
        None => {
            swipe.clear_anchor();
            return Ok(FrameOutcome {
                classification: GestureClassification::idle(GestureName::Scanning),
                event: None,
            });
        }
    };
    frame.validate()?;

    let fingers = classify_fingers(frame, &config.fingers);
    let finger_count = fingers.extended_count();
    let confidence = frame.clamped_confidence();
    let result = |name, event| FrameOutcome {
        classification: GestureClassification {
            name,
            finger_count,
            confidence,
        },
        event,
    };

    if fingers.is_fist() {
        timers.last_fist_ms = Some(now_ms);
        swipe.clear_anchor();
        return Ok(result(GestureName::Paused, Some(NavEvent::Pause)));
    }

    if finger_count >= config.open_hand_min_fingers {
        timers.last_open_ms = Some(now_ms);
        let palm_x = frame.point(HandLandmark::PALM_CENTER).x;
        return Ok(match swipe.detect(palm_x, now_ms, &config.swipe) {
            Some(direction) => {
                let (event, name) = swipe_action(direction);
                result(name, Some(event))
            }
            None => result(GestureName::SwipeReady, None),
        });
    }

    swipe.clear_anchor();
    let name = if timers.settled(now_ms, config) {
        GestureName::Ready
    } else {
        GestureName::Stabilizing
    };
    Ok(result(name, None))
}

// ── State ──────────────────────────────────────────────────

/// Central gesture recognition state for one session.
pub struct GestureState {
    /// Configuration.
    pub config: GestureConfig,
    swipe: SwipeTrackerState,
    timers: DebounceTimers,
    /// Whether the session is running.
    active: bool,
    /// Last published classification.
    current: GestureClassification,
    frames_processed: u64,
    frames_dropped: u64,
    events_emitted: u64,
}

impl Default for GestureState {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureState {
    /// Create an inactive state with default config.
    pub fn new() -> Self {
        Self::with_config(GestureConfig::default())
    }

    pub fn with_config(config: GestureConfig) -> Self {
        Self {
            config,
            swipe: SwipeTrackerState::new(),
            timers: DebounceTimers::default(),
            active: false,
            current: GestureClassification::waiting(),
            frames_processed: 0,
            frames_dropped: 0,
            events_emitted: 0,
        }
    }

    /// Begin accepting frames.  No effect if already running.
    pub fn start(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        self.frames_processed = 0;
        self.frames_dropped = 0;
        self.events_emitted = 0;
        info!("gesture session started");
    }

    /// Stop the session, discarding all timer and detector state.
    pub fn stop(&mut self) {
        self.swipe.reset();
        self.timers = DebounceTimers::default();
        self.current = GestureClassification::waiting();
        if self.active {
            info!(
                frames = self.frames_processed,
                dropped = self.frames_dropped,
                "gesture session stopped"
            );
        }
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Last published classification.
    pub fn current(&self) -> GestureClassification {
        self.current
    }

    pub fn swipe_tracker(&self) -> &SwipeTrackerState {
        &self.swipe
    }

    pub fn timers(&self) -> &DebounceTimers {
        &self.timers
    }

    /// Process one frame.  Never fails: invalid frames are dropped and the
    /// previous classification is returned with no event.
    pub fn update(&mut self, frame: Option<&LandmarkFrame>, now_ms: f64) -> FrameOutcome {
        let unchanged = FrameOutcome {
            classification: self.current,
            event: None,
        };
        if !self.active {
            return unchanged;
        }

        match classify(&self.config, frame, now_ms, &mut self.swipe, &mut self.timers) {
            Ok(outcome) => {
                self.frames_processed += 1;
                if outcome.classification.name != self.current.name {
                    debug!(
                        from = self.current.name.as_str(),
                        to = outcome.classification.name.as_str(),
                        "gesture changed"
                    );
                }
                if outcome.event.is_some() {
                    self.events_emitted += 1;
                }
                self.current = outcome.classification;
                outcome
            }
            Err(e) => {
                self.frames_dropped += 1;
                debug!(now_ms, "dropping frame: {}", e);
                unchanged
            }
        }
    }

    /// Process one frame and deliver any event to `sink`.
    pub fn update_with<S: NavigationSink + ?Sized>(
        &mut self,
        frame: Option<&LandmarkFrame>,
        now_ms: f64,
        sink: &mut S,
    ) -> GestureClassification {
        let outcome = self.update(frame, now_ms);
        if let Some(event) = outcome.event {
            sink.on_nav_event(event);
        }
        outcome.classification
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:active {} :gesture {} :frames {} :dropped {} :events {})",
            if self.active { "t" } else { "nil" },
            self.current.to_sexp(),
            self.frames_processed,
            self.frames_dropped,
            self.events_emitted,
        )
    }

    /// Generate s-expression for IPC config.
    pub fn config_sexp(&self) -> String {
        self.config.to_sexp()
    }
}

// ── Tests ──────────────────────────────────────────────────
