use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::detection::domain::face_detector::FaceDetector;
use crate::identity::domain::identity_store::IdentityStore;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::identity::{Identity, KnownIdentitySet};
use crate::shared::media_files::list_files;
use crate::video::infrastructure::image_loader::load_image_frame;

use super::error::PipelineError;

#[derive(Debug, Default, PartialEq)]
pub struct EnrollmentReport {
    /// Names added to the store, e.g. `alice-1`.
    pub enrolled: Vec<String>,
    /// Image stems skipped because that person is already known.
    pub skipped: Vec<String>,
    /// Images that could not be loaded or analysed.
    pub failed: Vec<(PathBuf, String)>,
}

/// Adds the people pictured in a directory of reference photos to the
/// identity store.
///
/// Each image is named after the person (`alice.jpg`). Every face found in
/// it becomes an identity called `{stem}-{n}`, counting from 1. Images are
/// handed to the detector as frames numbered by their 1-based position in
/// the sorted directory listing.
pub struct EnrollIdentitiesUseCase {
    store: Box<dyn IdentityStore>,
    detector: Arc<dyn FaceDetector>,
}

impl EnrollIdentitiesUseCase {
    pub fn new(store: Box<dyn IdentityStore>, detector: Arc<dyn FaceDetector>) -> Self {
        Self { store, detector }
    }

    /// Returns the updated identity set together with what happened to
    /// each image. The store is saved after every image that adds faces.
    pub fn execute(
        &self,
        known_people_dir: &Path,
    ) -> Result<(KnownIdentitySet, EnrollmentReport), PipelineError> {
        let mut known = self.store.load()?;
        let mut report = EnrollmentReport::default();

        let images = list_files(known_people_dir, IMAGE_EXTENSIONS).map_err(|source| {
            PipelineError::Directory {
                path: known_people_dir.display().to_string(),
                source,
            }
        })?;
        if images.is_empty() {
            log::warn!(
                "No input images found in {}, only already-known identities can be recognised",
                known_people_dir.display()
            );
        }

        for (position, path) in images.iter().enumerate() {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if known.contains_person(stem) {
                log::info!("Skipped {stem}: an encoding of this person is already known");
                report.skipped.push(stem.to_string());
                continue;
            }

            let faces = match load_image_frame(path, position + 1) {
                Ok(frame) => self.detector.detect(&frame).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            let faces = match faces {
                Ok(faces) => faces,
                Err(reason) => {
                    log::warn!("Could not enroll {}: {reason}", path.display());
                    report.failed.push((path.clone(), reason));
                    continue;
                }
            };

            if faces.is_empty() {
                log::warn!("No face found in {}", path.display());
                continue;
            }

            log::info!("Enrolling {} face(s) from {}", faces.len(), path.display());
            for (n, face) in faces.into_iter().enumerate() {
                let name = format!("{stem}-{}", n + 1);
                known.push(Identity::new(name.clone(), face.encoding));
                report.enrolled.push(name);
            }
            self.store.save(&known)?;
        }

        Ok((known, report))
    }
}
