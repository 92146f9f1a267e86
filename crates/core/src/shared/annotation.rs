use serde::{Deserialize, Serialize};

/// Face bounding box in `(top, right, bottom, left)` order.
///
/// Coordinates are in the units of the image the detector ran on, which
/// may be a downscaled copy of the source frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl BoundingBox {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Multiplies every edge by `factor`, saturating at the `i32` range.
    pub fn scaled(&self, factor: u32) -> Self {
        let f = i32::try_from(factor.max(1)).unwrap_or(i32::MAX);
        Self {
            top: self.top.saturating_mul(f),
            right: self.right.saturating_mul(f),
            bottom: self.bottom.saturating_mul(f),
            left: self.left.saturating_mul(f),
        }
    }

    /// Clamps every edge into `[-margin, limit + margin]` on its axis.
    pub fn clamped(&self, width: u32, height: u32, margin: i32) -> Self {
        let clamp = |v: i32, limit: u32| {
            let hi = i32::try_from(limit).unwrap_or(i32::MAX).saturating_add(margin);
            v.clamp(-margin, hi)
        };
        Self {
            top: clamp(self.top, height),
            right: clamp(self.right, width),
            bottom: clamp(self.bottom, height),
            left: clamp(self.left, width),
        }
    }
}

/// One detected face plus the identity it matched, before rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub region: BoundingBox,
    /// Factor that maps `region` back to full-resolution coordinates.
    pub scale: u32,
    /// Matched identity name; empty when unidentified.
    pub label: String,
}

impl Annotation {
    pub fn unidentified(region: BoundingBox, scale: u32) -> Self {
        Self {
            region,
            scale,
            label: String::new(),
        }
    }

    pub fn identified(region: BoundingBox, scale: u32, label: impl Into<String>) -> Self {
        Self {
            region,
            scale,
            label: label.into(),
        }
    }

    pub fn is_identified(&self) -> bool {
        !self.label.is_empty()
    }

    pub fn full_resolution_region(&self) -> BoundingBox {
        self.region.scaled(self.scale)
    }
}
