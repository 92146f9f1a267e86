use std::path::Path;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("unable to create output video {path}: {reason}")]
    Creation { path: String, reason: String },
    #[error("writer is not open")]
    NotOpened,
    #[error("failed to write frame {index}: {reason}")]
    Write { index: usize, reason: String },
    #[error("failed to finalize output: {0}")]
    Close(String),
}

/// Abstracts video encoding so the pipeline can write output without
/// depending on a specific codec library.
///
/// `open` takes codec, fps and dimensions from `metadata` and creates the
/// output directory when missing.
pub trait VideoWriter: Send {
    fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), SinkError>;

    fn write(&mut self, frame: &Frame) -> Result<(), SinkError>;

    fn close(&mut self) -> Result<(), SinkError>;
}
