use crate::shared::frame::Frame;

/// A contiguous run of frames handed to one worker.
#[derive(Debug)]
pub struct Chunk {
    pub id: usize,
    pub frames: Vec<Frame>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the first frame, if any.
    pub fn first_index(&self) -> Option<usize> {
        self.frames.first().map(Frame::index)
    }
}

/// Splits `frames` into `min(workers, frames.len())` contiguous chunks.
///
/// Every chunk gets `len / count` frames and the last one also takes the
/// remainder, so chunk sizes differ only in the final chunk. A worker count
/// of zero is treated as one.
pub fn partition(frames: Vec<Frame>, workers: usize) -> Vec<Chunk> {
    let total = frames.len();
    let count = workers.max(1).min(total);
    if count == 0 {
        return Vec::new();
    }

    let base = total / count;
    let mut chunks = Vec::with_capacity(count);
    let mut remaining = frames.into_iter();

    for id in 0..count {
        let take = if id + 1 == count {
            total - base * (count - 1)
        } else {
            base
        };
        chunks.push(Chunk {
            id,
            frames: remaining.by_ref().take(take).collect(),
        });
    }

    chunks
}
