use std::path::Path;

use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
#[error("unable to load image {path}: {source}")]
pub struct ImageLoadError {
    pub path: String,
    #[source]
    pub source: image::ImageError,
}

/// Decodes a still image into a single RGB frame carrying `index`.
pub fn load_image_frame(path: &Path, index: usize) -> Result<Frame, ImageLoadError> {
    let img = image::open(path)
        .map_err(|source| ImageLoadError {
            path: path.display().to_string(),
            source,
        })?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, index))
}
