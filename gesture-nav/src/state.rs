//! Adapter state: the gesture session plus the presentation it drives.

use crate::hand::{
    FrameOutcome, GestureConfig, GestureState, LandmarkFrame, NavEvent, NavigationSink,
};
use crate::ipc::dispatch::format_event;
use crate::pager::PageCursor;

/// Everything the message loop owns.
pub struct NavState {
    pub gesture: GestureState,
    pub pager: PageCursor,
    /// Event lines waiting to be written by the loop.
    pub pending_events: Vec<String>,
}

impl NavState {
    pub fn new(config: GestureConfig, pages: u32) -> Self {
        Self {
            gesture: GestureState::with_config(config),
            pager: PageCursor::new(pages),
            pending_events: Vec::new(),
        }
    }

    /// Feed one frame, route its event to the pager, and queue the event line.
    pub fn process_frame(&mut self, frame: Option<&LandmarkFrame>, now_ms: f64) -> FrameOutcome {
        let outcome = self.gesture.update(frame, now_ms);
        if let Some(event) = outcome.event {
            self.pager.on_nav_event(event);
            let page = self.pager.current().to_string();
            let total = self.pager.total().to_string();
            let t = format!("{:.0}", now_ms);
            self.pending_events.push(format_event(
                event.as_str(),
                &[
                    ("gesture", outcome.classification.name.as_str()),
                    ("page", page.as_str()),
                    ("total", total.as_str()),
                    ("t", t.as_str()),
                ],
            ));
        }
        outcome
    }

    /// Turn the page by hand, bypassing the gesture session.
    ///
    /// Queues an event line only when the page actually moved, so a turn
    /// past either end of the document is a no-op.
    pub fn turn_page(&mut self, event: NavEvent) -> bool {
        let before = self.pager.current();
        self.pager.on_nav_event(event);
        if self.pager.current() == before {
            return false;
        }
        let page = self.pager.current().to_string();
        let total = self.pager.total().to_string();
        self.pending_events.push(format_event(
            event.as_str(),
            &[
                ("source", "manual"),
                ("page", page.as_str()),
                ("total", total.as_str()),
            ],
        ));
        true
    }

    /// Take all queued event lines.
    pub fn drain_events(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_events)
    }
}
