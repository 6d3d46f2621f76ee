//! Hand landmark data structures.
//!
//! Models the 21-point hand skeleton produced by camera-based hand
//! trackers.  Coordinates are normalized to the image frame: x grows to the
//! right, y grows downward, both in [0, 1].

use std::fmt;

// ── Landmark definitions ───────────────────────────────────

/// The 21 landmarks of a tracked hand, in tracker order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Landmark used as the palm center for swipe and thumb checks.
    pub const PALM_CENTER: HandLandmark = HandLandmark::MiddleMcp;

    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }

    /// Fingertip landmarks, thumb first.
    pub fn fingertips() -> [HandLandmark; 5] {
        [
            Self::ThumbTip,
            Self::IndexTip,
            Self::MiddleTip,
            Self::RingTip,
            Self::PinkyTip,
        ]
    }

    /// Joint each fingertip is compared against, thumb first.
    ///
    /// The thumb has no PIP joint; its interphalangeal joint stands in.
    pub fn reference_joints() -> [HandLandmark; 5] {
        [
            Self::ThumbIp,
            Self::IndexPip,
            Self::MiddlePip,
            Self::RingPip,
            Self::PinkyPip,
        ]
    }
}

// ── Handedness ─────────────────────────────────────────────

/// Which hand the tracker believes it is seeing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parse a tracker label ("Left", "right", ...).  Case-insensitive.
    pub fn from_label(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("left") {
            Some(Self::Left)
        } else if label.eq_ignore_ascii_case("right") {
            Some(Self::Right)
        } else {
            None
        }
    }
}

// ── Points and frames ──────────────────────────────────────

/// A single normalized landmark position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One hand as reported by the tracker for a single video frame.
#[derive(Debug, Clone, Default)]
pub struct LandmarkFrame {
    /// Landmark positions indexed by `HandLandmark`.
    pub points: Vec<Point3>,
    /// Handedness label, if the tracker reported one.
    pub handedness: Option<Handedness>,
    /// Handedness score (0.0-1.0), if the tracker reported one.
    pub confidence: Option<f32>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Point3>) -> Self {
        Self {
            points,
            handedness: None,
            confidence: None,
        }
    }

    pub fn with_handedness(mut self, handedness: Handedness, confidence: f32) -> Self {
        self.handedness = Some(handedness);
        self.confidence = Some(confidence);
        self
    }

    /// Check that the frame can be classified.
    pub fn validate(&self) -> Result<(), InvalidFrameError> {
        if self.points.len() != LANDMARK_COUNT {
            return Err(InvalidFrameError::WrongLandmarkCount {
                expected: LANDMARK_COUNT,
                got: self.points.len(),
            });
        }
        if let Some(index) = self.points.iter().position(|p| !p.is_finite()) {
            return Err(InvalidFrameError::NonFiniteCoordinate { index });
        }
        Ok(())
    }

    /// Position of a landmark.  Callers must have validated the frame.
    pub fn point(&self, landmark: HandLandmark) -> Point3 {
        self.points[landmark.index()]
    }

    /// Reported confidence clamped to [0, 1].  Missing handedness reads as 0.
    pub fn clamped_confidence(&self) -> f32 {
        match (self.handedness, self.confidence) {
            (Some(_), Some(c)) if c.is_finite() => c.clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

// ── Errors ─────────────────────────────────────────────────

/// A landmark frame that cannot be classified.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidFrameError {
    /// The tracker delivered a skeleton with the wrong number of points.
    WrongLandmarkCount { expected: usize, got: usize },
    /// A coordinate was NaN or infinite.
    NonFiniteCoordinate { index: usize },
}

impl fmt::Display for InvalidFrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLandmarkCount { expected, got } => {
                write!(f, "expected {expected} landmarks, got {got}")
            }
            Self::NonFiniteCoordinate { index } => {
                write!(f, "landmark {index} has a non-finite coordinate")
            }
        }
    }
}

impl std::error::Error for InvalidFrameError {}

// ── Tests ──────────────────────────────────────────────────
