use serde::{Deserialize, Serialize};

/// Content digest of one source file.
///
/// `digest` is the lowercase hex SHA-256 of the raw bytes. `path` is the
/// artifact path as given, or the `/`-separated path relative to the
/// directory artifact the file was found under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub path: String,
    pub digest: String,
}

impl Fingerprint {
    pub fn new(path: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            digest: digest.into(),
        }
    }
}
