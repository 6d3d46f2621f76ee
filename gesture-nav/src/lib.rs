//! gesture-nav - hand-gesture page navigation.
//!
//! Classifies per-frame hand landmarks into navigation gestures and turns
//! swipes into page changes.

pub mod hand;
pub mod ipc;
pub mod pager;
pub mod state;
