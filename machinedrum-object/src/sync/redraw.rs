use std::sync::atomic::{AtomicBool, Ordering};

/// Collapses any number of redraw requests into one pass per frame.
#[derive(Debug, Default)]
pub struct RedrawScheduler {
    pending: AtomicBool,
}

impl RedrawScheduler {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Asks for a redraw on the next frame. True when this call scheduled it, false when
    /// one was already pending.
    pub fn request(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }

    /// Consumes the pending redraw, if there is one.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
