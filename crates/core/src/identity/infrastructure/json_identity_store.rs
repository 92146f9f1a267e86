use std::path::{Path, PathBuf};

use crate::identity::domain::identity_store::{IdentityStore, IdentityStoreError};
use crate::shared::identity::{Identity, KnownIdentitySet};

/// Stores identities as a JSON array of `{ "name", "encoding" }` objects.
pub struct JsonIdentityStore {
    path: PathBuf,
}

impl JsonIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

impl IdentityStore for JsonIdentityStore {
    fn load(&self) -> Result<KnownIdentitySet, IdentityStoreError> {
        if !self.path.exists() {
            log::info!(
                "No identity store at {}, starting with no known identities",
                self.path.display()
            );
            return Ok(KnownIdentitySet::empty());
        }

        let json = std::fs::read_to_string(&self.path).map_err(|source| {
            IdentityStoreError::Read {
                path: self.display_path(),
                source,
            }
        })?;
        let identities: Vec<Identity> =
            serde_json::from_str(&json).map_err(|source| IdentityStoreError::Parse {
                path: self.display_path(),
                source,
            })?;

        log::info!(
            "Loaded {} known identities from {}",
            identities.len(),
            self.path.display()
        );
        Ok(KnownIdentitySet::new(identities))
    }

    fn save(&self, identities: &KnownIdentitySet) -> Result<(), IdentityStoreError> {
        let write_error = |reason: String| IdentityStoreError::Write {
            path: self.display_path(),
            reason,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
        }

        let list: Vec<&Identity> = identities.iter().collect();
        let json = serde_json::to_string_pretty(&list).map_err(|e| write_error(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| write_error(e.to_string()))?;

        log::info!(
            "Saved {} identities to {}",
            identities.len(),
            self.path.display()
        );
        Ok(())
    }
}
