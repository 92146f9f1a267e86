use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::{SinkError, VideoWriter};

const VIDEO_STREAM_INDEX: usize = 0;

/// Encodes RGB frames via ffmpeg-next.
///
/// Reuses the source stream's codec when an encoder for it is available
/// and accepts YUV420P input, otherwise falls back to MPEG4.
pub struct FfmpegWriter {
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    fps: i32,
    frame_count: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            fps: 30,
            frame_count: 0,
        }
    }

    /// Sends encoded packets waiting in the encoder to the container.
    fn drain_packets(&mut self) -> Result<(), ffmpeg_next::Error> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Ok(());
        };
        let ost_time_base = octx
            .stream(VIDEO_STREAM_INDEX)
            .ok_or(ffmpeg_next::Error::StreamNotFound)?
            .time_base();

        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(VIDEO_STREAM_INDEX);
            encoded.rescale_ts(ffmpeg_next::Rational(1, self.fps), ost_time_base);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn accepts_yuv420p(codec: &ffmpeg_next::Codec) -> bool {
    codec
        .video()
        .ok()
        .and_then(|video| video.formats())
        .map(|mut formats| formats.any(|f| f == ffmpeg_next::format::Pixel::YUV420P))
        .unwrap_or(false)
}

/// Picks the encoder for the output stream.
fn select_encoder(source_codec: &str) -> Option<ffmpeg_next::Codec> {
    if !source_codec.is_empty() {
        match ffmpeg_next::encoder::find_by_name(source_codec) {
            Some(codec) if accepts_yuv420p(&codec) => return Some(codec),
            _ => log::debug!("No usable {source_codec} encoder, falling back to MPEG4"),
        }
    }
    ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
}

impl VideoWriter for FfmpegWriter {
    fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), SinkError> {
        let creation_error = |reason: String| SinkError::Creation {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| creation_error(e.to_string()))?;
        }

        ffmpeg_next::init().map_err(|e| creation_error(e.to_string()))?;

        self.width = metadata.width;
        self.height = metadata.height;
        self.fps = metadata.integer_fps();

        let mut octx =
            ffmpeg_next::format::output(path).map_err(|e| creation_error(e.to_string()))?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = select_encoder(&metadata.codec)
            .ok_or_else(|| creation_error("MPEG4 encoder not found".to_string()))?;

        let mut ost = octx
            .add_stream(Some(codec))
            .map_err(|e| creation_error(e.to_string()))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| creation_error(e.to_string()))?;

        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, self.fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(self.fps, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .map_err(|e| creation_error(e.to_string()))?;
        ost.set_parameters(&encoder);

        octx.write_header()
            .map_err(|e| creation_error(e.to_string()))?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| creation_error(e.to_string()))?;

        log::debug!(
            "Writing {} with {} at {}x{} @ {} fps",
            path.display(),
            codec.name(),
            metadata.width,
            metadata.height,
            self.fps
        );

        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.frame_count = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), SinkError> {
        let write_error = |reason: String| SinkError::Write {
            index: frame.index(),
            reason,
        };

        let (Some(encoder), Some(scaler)) = (self.encoder.as_mut(), self.scaler.as_mut()) else {
            return Err(SinkError::NotOpened);
        };

        if frame.width() != self.width || frame.height() != self.height || frame.channels() != 3
        {
            return Err(write_error(format!(
                "expected {}x{}x3, got {}x{}x{}",
                self.width,
                self.height,
                frame.width(),
                frame.height(),
                frame.channels()
            )));
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );

        let stride = rgb_frame.stride(0);
        let row_bytes = self.width as usize * 3;
        let dst = rgb_frame.data_mut(0);
        for (row, src) in frame.data().chunks_exact(row_bytes).enumerate() {
            let dst_start = row * stride;
            dst[dst_start..dst_start + row_bytes].copy_from_slice(src);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler
            .run(&rgb_frame, &mut yuv_frame)
            .map_err(|e| write_error(e.to_string()))?;
        yuv_frame.set_pts(Some(self.frame_count as i64));

        encoder
            .send_frame(&yuv_frame)
            .map_err(|e| write_error(e.to_string()))?;
        self.drain_packets()
            .map_err(|e| write_error(e.to_string()))?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder
                .send_eof()
                .map_err(|e| SinkError::Close(e.to_string()))?;
            self.drain_packets()
                .map_err(|e| SinkError::Close(e.to_string()))?;
            if let Some(octx) = self.octx.as_mut() {
                octx.write_trailer()
                    .map_err(|e| SinkError::Close(e.to_string()))?;
            }
            log::debug!("Encoded {} frames", self.frame_count);
        }

        self.octx = None;
        self.encoder = None;
        self.scaler = None;

        Ok(())
    }
}
