//! Hand gesture subsystem: landmark frames in, navigation events out.
//!
//! Provides:
//! - `landmarks`: 21-point hand skeleton and frame validation
//! - `fingers`: per-finger extended/flexed heuristic
//! - `swipe`: horizontal swipe detection with window and cooldown
//! - `gesture`: per-frame classification, debounce, and session state
//!
//! Pure computation: no I/O, no clocks, no threads.

pub mod fingers;
pub mod gesture;
pub mod landmarks;
pub mod swipe;

pub use gesture::{
    classify, FrameOutcome, GestureClassification, GestureConfig, GestureName, GestureState,
    NavEvent, NavigationSink,
};
pub use landmarks::{Handedness, InvalidFrameError, LandmarkFrame, Point3, LANDMARK_COUNT};
