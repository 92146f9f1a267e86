use std::sync::Mutex;

use crate::shared::frame::Frame;

/// A rendered frame tagged with the index of the frame it came from.
#[derive(Clone, Debug)]
pub struct AnnotatedFrame {
    pub index: usize,
    pub frame: Frame,
    pub faces: usize,
}

impl AnnotatedFrame {
    pub fn new(frame: Frame, faces: usize) -> Self {
        Self {
            index: frame.index(),
            frame,
            faces,
        }
    }
}

/// Unordered collection that workers append to concurrently.
///
/// Holds the lock only for the push. A worker that panicked while holding
/// the lock cannot leave a half-written entry, so a poisoned lock is
/// recovered rather than propagated.
#[derive(Debug, Default)]
pub struct ResultSet {
    frames: Mutex<Vec<AnnotatedFrame>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, frame: AnnotatedFrame) {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes the set once all workers have joined.
    pub fn into_frames(self) -> Vec<AnnotatedFrame> {
        self.frames.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}
