use std::path::PathBuf;
use thiserror::Error;

pub type CharacterizeResult<T> = Result<T, CharacterizeError>;

/// Failures raised while inspecting source artifacts or a routing component.
///
/// None of these are recoverable inside a characterization run: they mean the
/// harness points at something that moved, vanished, or is not introspectable.
#[derive(Error, Debug)]
pub enum CharacterizeError {
    #[error("source artifact not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("component does not expose an introspectable layer stack: {0}")]
    InvalidComponent(String),
}

impl CharacterizeError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CharacterizeError::ReadError {
            path: path.into(),
            source,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        CharacterizeError::InvalidComponent(reason.into())
    }
}
