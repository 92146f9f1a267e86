use std::fmt;
use std::path::PathBuf;

/// Non-fatal problem recorded during a run.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineWarning {
    /// The annotator failed on one frame; the frame is missing from the output.
    FrameDropped { index: usize, reason: String },
    /// A worker gave up on the rest of its chunk.
    ChunkAborted {
        chunk: usize,
        skipped: Vec<usize>,
        reason: String,
    },
}

impl PipelineWarning {
    /// Frame indices this warning accounts for.
    pub fn frame_indices(&self) -> Vec<usize> {
        match self {
            Self::FrameDropped { index, .. } => vec![*index],
            Self::ChunkAborted { skipped, .. } => skipped.clone(),
        }
    }
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameDropped { index, reason } => {
                write!(f, "frame {index} dropped: {reason}")
            }
            Self::ChunkAborted {
                chunk,
                skipped,
                reason,
            } => match (skipped.first(), skipped.last()) {
                (Some(first), Some(last)) => write!(
                    f,
                    "chunk {chunk} aborted, skipped frames {first}..={last}: {reason}"
                ),
                _ => write!(f, "chunk {chunk} aborted: {reason}"),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    PartialSuccess,
    Cancelled,
}

/// What a finished run produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    pub frames_read: usize,
    pub frames_written: usize,
    pub warnings: Vec<PipelineWarning>,
    pub cancelled: bool,
    /// Set once the output video has been created.
    pub output: Option<PathBuf>,
}

impl RunReport {
    pub fn outcome(&self) -> RunOutcome {
        if self.cancelled {
            RunOutcome::Cancelled
        } else if !self.warnings.is_empty() || self.frames_written < self.frames_read {
            RunOutcome::PartialSuccess
        } else {
            RunOutcome::Success
        }
    }

    /// One-line status for the user.
    pub fn status_text(&self) -> String {
        let counts = format!("{}/{} frames written", self.frames_written, self.frames_read);
        match self.outcome() {
            RunOutcome::Success => format!("Analysis complete: {counts}"),
            RunOutcome::PartialSuccess => format!(
                "Analysis complete with {} warning(s): {counts}",
                self.warnings.len()
            ),
            RunOutcome::Cancelled if self.warnings.is_empty() => {
                format!("Analysis cancelled: {counts}")
            }
            RunOutcome::Cancelled => format!(
                "Analysis cancelled with {} warning(s): {counts}",
                self.warnings.len()
            ),
        }
    }
}
