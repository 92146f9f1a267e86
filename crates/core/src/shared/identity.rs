use serde::{Deserialize, Serialize};

/// A known person: a display name plus the face encoding to match against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub encoding: Vec<f64>,
}

impl Identity {
    pub fn new(name: impl Into<String>, encoding: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            encoding,
        }
    }
}

/// Read-only set of identities shared by every worker for one run.
///
/// Order is preserved from load time so matching is deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KnownIdentitySet {
    identities: Vec<Identity>,
}

impl KnownIdentitySet {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.iter()
    }

    pub fn push(&mut self, identity: Identity) {
        self.identities.push(identity);
    }

    /// True when any identity's name contains `stem` (e.g. `alice`
    /// matches `alice-1`).
    pub fn contains_person(&self, stem: &str) -> bool {
        self.identities.iter().any(|i| i.name.contains(stem))
    }

    /// Returns the name of the closest identity within `tolerance`.
    ///
    /// Encodings of a different length never match.
    pub fn best_match(&self, encoding: &[f64], tolerance: f64) -> Option<&str> {
        self.identities
            .iter()
            .filter_map(|identity| {
                euclidean_distance(&identity.encoding, encoding)
                    .filter(|d| *d <= tolerance)
                    .map(|d| (identity, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(identity, _)| identity.name.as_str())
    }
}

impl FromIterator<Identity> for KnownIdentitySet {
    fn from_iter<T: IntoIterator<Item = Identity>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    Some(sum.sqrt())
}
