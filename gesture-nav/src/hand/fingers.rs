//! Per-finger extension classification.
//!
//! A fixed geometric heuristic over landmark positions: each finger is
//! either extended or flexed.  No smoothing; every frame is judged alone.

use super::landmarks::{HandLandmark, Handedness, LandmarkFrame};

// ── Config ─────────────────────────────────────────────────

/// Thresholds for the finger heuristic, in normalized image units.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerConfig {
    /// Minimum horizontal tip-to-IP offset for an extended thumb.
    pub thumb_axis_threshold: f32,
    /// Thumb tips closer than this to the palm center (on x) are tucked.
    pub thumb_palm_proximity: f32,
    /// Minimum vertical PIP-to-tip offset for an extended finger.
    pub finger_extend_threshold: f32,
}

impl Default for FingerConfig {
    fn default() -> Self {
        Self {
            thumb_axis_threshold: 0.02,
            thumb_palm_proximity: 0.08,
            finger_extend_threshold: 0.02,
        }
    }
}

// ── Finger state ───────────────────────────────────────────

/// Extension flags for thumb, index, middle, ring, pinky.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerState(pub [bool; 5]);

impl FingerState {
    pub fn thumb(&self) -> bool {
        self.0[0]
    }

    /// Extended fingers including the thumb (0-5).
    pub fn extended_count(&self) -> u8 {
        self.0.iter().filter(|&&e| e).count() as u8
    }

    /// Extended fingers excluding the thumb (0-4).
    pub fn non_thumb_count(&self) -> u8 {
        self.0[1..].iter().filter(|&&e| e).count() as u8
    }

    /// All four non-thumb fingers curled.
    pub fn is_fist(&self) -> bool {
        self.non_thumb_count() == 0
    }
}

/// Classify each finger of a validated frame as extended or flexed.
pub fn classify_fingers(frame: &LandmarkFrame, config: &FingerConfig) -> FingerState {
    let mut fingers = [false; 5];
    fingers[0] = thumb_extended(frame, config);

    let tips = HandLandmark::fingertips();
    let joints = HandLandmark::reference_joints();
    for i in 1..5 {
        let tip = frame.point(tips[i]);
        let pip = frame.point(joints[i]);
        // Image y grows downward: an extended tip sits above its PIP.
        fingers[i] = pip.y - tip.y > config.finger_extend_threshold;
    }

    FingerState(fingers)
}

fn thumb_extended(frame: &LandmarkFrame, config: &FingerConfig) -> bool {
    let tip = frame.point(HandLandmark::ThumbTip);
    let ip = frame.point(HandLandmark::ThumbIp);
    let palm = frame.point(HandLandmark::PALM_CENTER);

    if (tip.x - palm.x).abs() < config.thumb_palm_proximity {
        return false;
    }

    // Mirrored camera: a right hand's thumb points toward smaller x.
    // Unlabelled hands take the left-hand branch.
    match frame.handedness {
        Some(Handedness::Right) => tip.x < ip.x - config.thumb_axis_threshold,
        Some(Handedness::Left) | None => tip.x > ip.x + config.thumb_axis_threshold,
    }
}

// ── Test helpers ───────────────────────────────────────────

/// Build a validated frame with every finger posed as requested.
///
/// `extended` is thumb first.  The palm center sits at `palm_x`.
#[cfg(test)]
pub(crate) fn make_hand(
    palm_x: f32,
    extended: [bool; 5],
    handedness: Option<Handedness>,
) -> LandmarkFrame {
    use super::landmarks::{Point3, LANDMARK_COUNT};

    let mut points = vec![Point3::new(palm_x, 0.6, 0.0); LANDMARK_COUNT];
    points[HandLandmark::Wrist.index()] = Point3::new(palm_x, 0.8, 0.0);

    // Thumb: IP beside the palm, tip pushed outward or tucked onto the palm.
    let outward = match handedness {
        Some(Handedness::Right) => -1.0,
        _ => 1.0,
    };
    points[HandLandmark::ThumbIp.index()] = Point3::new(palm_x + outward * 0.06, 0.6, 0.0);
    points[HandLandmark::ThumbTip.index()] = if extended[0] {
        Point3::new(palm_x + outward * 0.15, 0.58, 0.0)
    } else {
        Point3::new(palm_x + outward * 0.03, 0.62, 0.0)
    };

    let tips = HandLandmark::fingertips();
    let joints = HandLandmark::reference_joints();
    for i in 1..5 {
        let x = palm_x - 0.06 + 0.03 * i as f32;
        points[joints[i].index()] = Point3::new(x, 0.5, 0.0);
        points[tips[i].index()] = if extended[i] {
            Point3::new(x, 0.4, 0.0)
        } else {
            Point3::new(x, 0.55, 0.0)
        };
    }

    LandmarkFrame {
        points,
        handedness,
        confidence: handedness.map(|_| 0.9),
    }
}

// ── Tests ──────────────────────────────────────────────────
