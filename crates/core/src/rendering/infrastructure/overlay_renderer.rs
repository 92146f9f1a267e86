use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::rendering::domain::frame_renderer::{FrameRenderer, RenderError};
use crate::shared::annotation::Annotation;
use crate::shared::frame::Frame;

use super::bitmap_font::{self, GLYPH_HEIGHT};

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const LABEL_BACKGROUND: Rgb<u8> = Rgb([25, 25, 25]);
pub const LABEL_TEXT: Rgb<u8> = Rgb([255, 255, 255]);

const BOX_THICKNESS: i32 = 2;
const LABEL_HEIGHT: i32 = 20;
const LABEL_TEXT_INSET: i32 = 10;
/// Pixels a region may extend past the frame before its edges are clamped.
const CLIP_MARGIN: i32 = 4096;

/// CPU renderer that outlines every face and adds a name bar under
/// identified ones.
pub struct OverlayRenderer;

impl OverlayRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRenderer for OverlayRenderer {
    fn render(&self, frame: &Frame, annotations: &[Annotation]) -> Result<Frame, RenderError> {
        let layout_error = || RenderError::UnsupportedLayout {
            index: frame.index(),
            width: frame.width(),
            height: frame.height(),
            channels: frame.channels(),
        };
        if frame.channels() != 3 {
            return Err(layout_error());
        }
        if annotations.is_empty() {
            return Ok(frame.clone());
        }

        let mut img = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or_else(layout_error)?;

        for annotation in annotations {
            let region = annotation
                .full_resolution_region()
                .clamped(frame.width(), frame.height(), CLIP_MARGIN);
            if region.is_empty() {
                continue;
            }

            draw_thick_rect(
                &mut img,
                region.left,
                region.top,
                region.width(),
                region.height(),
                BOX_COLOR,
            );

            if annotation.is_identified() {
                let bar = Rect::at(region.left, region.bottom)
                    .of_size(region.width() as u32, LABEL_HEIGHT as u32);
                draw_filled_rect_mut(&mut img, bar, LABEL_BACKGROUND);
                draw_thick_rect(
                    &mut img,
                    region.left,
                    region.bottom,
                    region.width(),
                    LABEL_HEIGHT,
                    BOX_COLOR,
                );
                bitmap_font::draw_text(
                    &mut img,
                    &annotation.label,
                    region.left + LABEL_TEXT_INSET,
                    region.bottom + (LABEL_HEIGHT - GLYPH_HEIGHT) / 2,
                    LABEL_TEXT,
                );
            }
        }

        Ok(frame.with_pixels(img.into_raw()))
    }
}

/// Draws a rectangle outline growing inward from the given bounds.
fn draw_thick_rect(img: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, color: Rgb<u8>) {
    for offset in 0..BOX_THICKNESS {
        let rw = w - offset * 2;
        let rh = h - offset * 2;
        if rw <= 0 || rh <= 0 {
            break;
        }
        let rect = Rect::at(x + offset, y + offset).of_size(rw as u32, rh as u32);
        draw_hollow_rect_mut(img, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::annotation::BoundingBox;

    fn blank(w: u32, h: u32) -> Frame {
        Frame::new(vec![0u8; (w * h * 3) as usize], w, h, 3, 3)
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    #[test]
    fn test_no_annotations_returns_identical_pixels() {
        let frame = blank(16, 16);
        let out = OverlayRenderer::new().render(&frame, &[]).unwrap();
        assert_eq!(out.data(), frame.data());
        assert_eq!(out.index(), 3);
    }

    #[test]
    fn test_unidentified_face_gets_box_only() {
        let frame = blank(40, 60);
        let a = Annotation::unidentified(BoundingBox::new(10, 30, 30, 10), 1);

        let out = OverlayRenderer::new().render(&frame, &[a]).unwrap();

        assert_eq!(pixel(&out, 10, 10), [0, 255, 0]);
        assert_eq!(pixel(&out, 11, 11), [0, 255, 0]);
        assert_eq!(pixel(&out, 20, 20), [0, 0, 0]);
        // No label bar below the box.
        assert_eq!(pixel(&out, 20, 40), [0, 0, 0]);
    }

    #[test]
    fn test_identified_face_gets_label_bar() {
        let frame = blank(60, 60);
        let a = Annotation::identified(BoundingBox::new(5, 50, 25, 5), 1, "AB");

        let out = OverlayRenderer::new().render(&frame, &[a]).unwrap();

        // Bar interior, away from text and border.
        assert_eq!(pixel(&out, 45, 35), [25, 25, 25]);
        // Bar border.
        assert_eq!(pixel(&out, 5, 44), [0, 255, 0]);
        // Some label text drawn.
        let white = (0..60)
            .flat_map(|y| (0..60).map(move |x| (x, y)))
            .filter(|&(x, y)| pixel(&out, x, y) == [255, 255, 255])
            .count();
        assert!(white > 0);
    }

    #[test]
    fn test_input_frame_untouched() {
        let frame = blank(20, 20);
        let a = Annotation::unidentified(BoundingBox::new(2, 10, 10, 2), 1);
        OverlayRenderer::new().render(&frame, &[a]).unwrap();
        assert!(frame.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_scale_factor_matches_prescaled_coordinates() {
        let frame = blank(200, 200);
        let full = Annotation::identified(BoundingBox::new(40, 160, 120, 80), 1, "ALICE-1");
        let quarter = Annotation::identified(BoundingBox::new(10, 40, 30, 20), 4, "ALICE-1");

        let renderer = OverlayRenderer::new();
        let a = renderer.render(&frame, &[full]).unwrap();
        let b = renderer.render(&frame, &[quarter]).unwrap();

        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_scaled_box_within_rounding_of_full_resolution() {
        // 83 / 4 truncates to 20; the scaled box edge lands within one
        // scale step of the full-resolution edge.
        let full = BoundingBox::new(41, 163, 122, 83);
        let quarter = Annotation::unidentified(
            BoundingBox::new(full.top / 4, full.right / 4, full.bottom / 4, full.left / 4),
            4,
        );
        let mapped = quarter.full_resolution_region();
        for (m, f) in [
            (mapped.top, full.top),
            (mapped.right, full.right),
            (mapped.bottom, full.bottom),
            (mapped.left, full.left),
        ] {
            assert!((f - m).abs() < 4, "{m} vs {f}");
        }
    }

    #[test]
    fn test_box_partly_off_frame_is_clipped() {
        let frame = blank(20, 20);
        let a = Annotation::identified(BoundingBox::new(-5, 30, 15, -5), 1, "EDGE");
        let out = OverlayRenderer::new().render(&frame, &[a]).unwrap();
        assert_eq!(out.data().len(), frame.data().len());
    }

    #[test]
    fn test_huge_detection_coordinates_render_without_panicking() {
        let frame = blank(20, 20);
        let a = Annotation::identified(
            BoundingBox::new(1_000_000_000, 1_000_000_000, 1_000_000_000, 1_000_000_000),
            4,
            "FAR",
        );
        let b = Annotation::identified(
            BoundingBox::new(-1_000_000_000, 1_000_000_000, 1_000_000_000, -1_000_000_000),
            4,
            "ALL",
        );

        let out = OverlayRenderer::new().render(&frame, &[a, b]).unwrap();

        assert_eq!(out.index(), 3);
        assert_eq!(out.data().len(), frame.data().len());
    }

    #[test]
    fn test_empty_region_skipped() {
        let frame = blank(20, 20);
        let a = Annotation::unidentified(BoundingBox::new(5, 5, 5, 5), 1);
        let out = OverlayRenderer::new().render(&frame, &[a]).unwrap();
        assert_eq!(out.data(), frame.data());
    }

    #[test]
    fn test_non_rgb_frame_rejected() {
        let frame = Frame::new(vec![0u8; 16], 4, 4, 1, 2);
        let a = Annotation::unidentified(BoundingBox::new(0, 2, 2, 0), 1);
        let err = OverlayRenderer::new().render(&frame, &[a]).unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedLayout { index: 2, .. }));
    }
}
