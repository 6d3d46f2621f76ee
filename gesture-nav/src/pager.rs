//! Page cursor driven by navigation events.
//!
//! Stands in for the document viewer: tracks a 1-based page index
//! clamped to the document length.

use tracing::debug;

use crate::hand::{NavEvent, NavigationSink};

/// 1-based page position within a document of `total` pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    current: u32,
    total: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PageCursor {
    /// Cursor on the first page.  An empty document sits at page 0.
    pub fn new(total: u32) -> Self {
        Self {
            current: total.min(1),
            total,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Load a document of a new length, returning to its first page.
    pub fn set_total(&mut self, total: u32) {
        *self = Self::new(total);
    }

    /// Advance one page.  Returns false at the last page.
    pub fn next(&mut self) -> bool {
        if self.current >= self.total {
            return false;
        }
        self.current += 1;
        true
    }

    /// Go back one page.  Returns false at the first page.
    pub fn previous(&mut self) -> bool {
        if self.current <= 1 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self) -> String {
        format!("(:page {} :total {})", self.current, self.total)
    }
}

impl NavigationSink for PageCursor {
    fn on_nav_event(&mut self, event: NavEvent) {
        let moved = match event {
            NavEvent::NextPage => self.next(),
            NavEvent::PreviousPage => self.previous(),
            NavEvent::Pause => false,
        };
        if moved {
            debug!(page = self.current, total = self.total, "page changed");
        }
    }
}
