use thiserror::Error;

use crate::identity::domain::identity_store::IdentityStoreError;
use crate::video::domain::video_reader::SourceError;
use crate::video::domain::video_writer::SinkError;

/// Run-fatal failures. Per-frame detection and render failures never end
/// up here; they are reported as [`PipelineWarning`](super::run_report::PipelineWarning)s.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot open source video: {0}")]
    SourceOpen(#[source] SourceError),
    #[error("source video became unreadable: {0}")]
    SourceRead(#[source] SourceError),
    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),
    #[error("cannot create output video: {0}")]
    SinkCreation(#[source] SinkError),
    #[error("cannot write output video: {0}")]
    SinkWrite(#[source] SinkError),
    #[error("cannot list {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    IdentityStore(#[from] IdentityStoreError),
    #[error("Pipeline already executed")]
    AlreadyExecuted,
}
