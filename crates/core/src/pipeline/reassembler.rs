use super::result_set::{AnnotatedFrame, ResultSet};

/// Restores playback order after the workers have joined.
///
/// Returns a single-pass iterator sorted by frame index. Gaps left by
/// dropped frames, aborted chunks or cancellation stay as gaps.
pub fn reassemble(results: ResultSet) -> std::vec::IntoIter<AnnotatedFrame> {
    let mut frames = results.into_frames();
    frames.sort_by_key(|f| f.index);
    frames.into_iter()
}
