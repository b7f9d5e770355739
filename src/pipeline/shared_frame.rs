use std::sync::Mutex;

use crate::frame::Frame;

/// Single-slot hand-off of the most recently produced frame.
///
/// The worker replaces the slot under the lock; readers take a full copy under
/// the same lock so a concurrent write can never tear a frame a reader is
/// holding. An empty slot means nothing has been published yet and readers
/// should poll again.
#[derive(Default)]
pub struct SharedFrameBuffer {
    slot: Mutex<Option<Frame>>,
}

impl SharedFrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: Frame) {
        let mut slot = self.slot.lock().expect("frame buffer lock poisoned");
        *slot = Some(frame);
    }

    pub fn latest(&self) -> Option<Frame> {
        let slot = self.slot.lock().expect("frame buffer lock poisoned");
        slot.clone()
    }
}
