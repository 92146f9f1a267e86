use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    /// Decoder name of the source stream; the writer reuses it when it can.
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Frames per second rounded for encoder time bases, defaulting to 30
    /// when the container reports nothing usable.
    pub fn integer_fps(&self) -> i32 {
        let fps = self.fps.round() as i32;
        if fps <= 0 {
            30
        } else {
            fps
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn meta(fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: 640,
            height: 480,
            fps,
            total_frames: 100,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/test.mp4")),
        }
    }

    #[test]
    fn test_clone_is_equal() {
        let m = meta(24.0);
        assert_eq!(m.clone(), m);
    }

    #[rstest]
    #[case::exact(30.0, 30)]
    #[case::ntsc(29.97, 30)]
    #[case::zero(0.0, 30)]
    #[case::negative(-1.0, 30)]
    #[case::film(23.976, 24)]
    fn test_integer_fps(#[case] fps: f64, #[case] expected: i32) {
        assert_eq!(meta(fps).integer_fps(), expected);
    }
}
