use crate::detection::domain::annotator::Annotator;
use crate::rendering::domain::frame_renderer::FrameRenderer;
use crate::shared::constants::DEFAULT_MAX_CONSECUTIVE_FAILURES;
use crate::shared::identity::KnownIdentitySet;

use super::cancellation::CancellationToken;
use super::chunker::Chunk;
use super::pipeline_logger::PipelineLogger;
use super::result_set::ResultSet;
use super::run_report::PipelineWarning;

/// Configuration for a pipeline execution run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Consecutive detection failures after which a worker gives up on its
    /// chunk. Zero disables the limit.
    pub max_consecutive_failures: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

/// Best-effort progress message sent from a worker to the orchestrating
/// thread. Losing one only affects progress output.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkerStatus {
    Processed {
        chunk: usize,
        index: usize,
        faces: usize,
        annotate_ms: f64,
        render_ms: f64,
    },
    Dropped { chunk: usize, index: usize },
}

/// Abstracts how chunks are annotated and rendered.
///
/// This is a port (application-layer interface). Infrastructure provides
/// the concrete scheduling. Implementations append every rendered frame to
/// `results` and return the warnings collected by all workers once every
/// worker has finished.
pub trait PipelineExecutor: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        chunks: Vec<Chunk>,
        annotator: &dyn Annotator,
        renderer: &dyn FrameRenderer,
        known: &KnownIdentitySet,
        results: &ResultSet,
        cancel: &CancellationToken,
        logger: &mut dyn PipelineLogger,
    ) -> Vec<PipelineWarning>;
}
