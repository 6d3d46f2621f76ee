//! Line-oriented s-expression protocol between the frame source and the
//! gesture session.

pub mod dispatch;

pub use dispatch::{apply_config, format_event, handle_message};
