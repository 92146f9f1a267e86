use image::{imageops, RgbImage};

/// Colorspace conversions a detector may ask for ahead of time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorConversion {
    /// RGB ↔ BGR channel swap.
    SwapRedBlue,
    /// Single-channel luma, as computed by `image::imageops::grayscale`.
    Grayscale,
}

/// A derived pixel buffer owned by the frame it was computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvertedBuffer {
    pub conversion: ColorConversion,
    pub channels: u8,
    pub data: Vec<u8>,
}

/// A single decoded video frame: contiguous RGB bytes in row-major order.
///
/// `index` is the 1-based position in playback order, assigned by the
/// reader at decode time. The raw buffer is never modified once read;
/// rendering produces a new frame with the same index.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    converted: Option<ConvertedBuffer>,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            converted: None,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn converted(&self) -> Option<&ConvertedBuffer> {
        self.converted.as_ref()
    }

    /// Computes and attaches a converted copy of the raw pixels.
    ///
    /// Only 3-channel frames are converted; other layouts are returned as-is.
    pub fn with_conversion(mut self, conversion: ColorConversion) -> Self {
        if self.channels != 3 {
            return self;
        }
        let Some(mut rgb) = RgbImage::from_raw(self.width, self.height, self.data.clone()) else {
            return self;
        };
        let (channels, data) = match conversion {
            ColorConversion::SwapRedBlue => {
                for px in rgb.pixels_mut() {
                    px.0.swap(0, 2);
                }
                (3, rgb.into_raw())
            }
            ColorConversion::Grayscale => (1, imageops::grayscale(&rgb).into_raw()),
        };
        self.converted = Some(ConvertedBuffer {
            conversion,
            channels,
            data,
        });
        self
    }

    /// Builds a new frame at the same index from rendered pixels.
    ///
    /// The converted buffer is not carried over since it no longer
    /// matches the new pixel data.
    pub fn with_pixels(&self, data: Vec<u8>) -> Self {
        Self::new(data, self.width, self.height, self.channels, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
        assert!(frame.converted().is_none());
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 1);
    }

    #[test]
    fn test_swap_red_blue_leaves_raw_untouched() {
        let frame = Frame::new(vec![10, 20, 30, 40, 50, 60], 2, 1, 3, 1)
            .with_conversion(ColorConversion::SwapRedBlue);
        let converted = frame.converted().unwrap();
        assert_eq!(converted.data, vec![30, 20, 10, 60, 50, 40]);
        assert_eq!(converted.channels, 3);
        assert_eq!(frame.data(), &[10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_grayscale_conversion() {
        let frame = Frame::new(vec![255, 255, 255, 0, 0, 0], 2, 1, 3, 1)
            .with_conversion(ColorConversion::Grayscale);
        let converted = frame.converted().unwrap();
        assert_eq!(converted.channels, 1);
        assert_eq!(converted.data, vec![255, 0]);
    }

    #[test]
    fn test_single_channel_frame_is_not_converted() {
        let frame = Frame::new(vec![7u8; 4], 2, 2, 1, 1).with_conversion(ColorConversion::Grayscale);
        assert!(frame.converted().is_none());
    }

    #[test]
    fn test_with_pixels_keeps_index_and_drops_conversion() {
        let frame = Frame::new(vec![1u8; 12], 2, 2, 3, 9)
            .with_conversion(ColorConversion::Grayscale);
        let rendered = frame.with_pixels(vec![2u8; 12]);
        assert_eq!(rendered.index(), 9);
        assert_eq!(rendered.data(), &[2u8; 12]);
        assert!(rendered.converted().is_none());
        assert_eq!(frame.data(), &[1u8; 12]);
    }

    #[test]
    fn test_clone_is_independent() {
        let frame = Frame::new(vec![100u8; 12], 2, 2, 3, 1);
        let cloned = frame.clone().with_pixels(vec![0u8; 12]);
        assert_eq!(frame.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }
}
