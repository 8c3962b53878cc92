//! Error types for meshshot

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for meshshot operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to load mesh '{}': {message}", path.display())]
    MeshLoad { path: PathBuf, message: String },

    #[error("Render setup failed: {0}")]
    RenderSetup(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// Wrap any error raised while reading `path` into a mesh load failure
    pub fn mesh_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::MeshLoad {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Parse(e.to_string())
    }
}
