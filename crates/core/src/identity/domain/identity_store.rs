use thiserror::Error;

use crate::shared::identity::KnownIdentitySet;

#[derive(Error, Debug)]
pub enum IdentityStoreError {
    #[error("failed to read identity store {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("identity store {path} is malformed: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write identity store {path}: {reason}")]
    Write { path: String, reason: String },
}

/// Persists the known identities between runs.
///
/// A store that has never been saved loads as an empty set.
pub trait IdentityStore: Send {
    fn load(&self) -> Result<KnownIdentitySet, IdentityStoreError>;

    fn save(&self, identities: &KnownIdentitySet) -> Result<(), IdentityStoreError>;
}
