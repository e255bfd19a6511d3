//! Error types for the viewer

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while mounting the viewer or loading its asset
#[derive(Debug, Error)]
pub enum ViewerError {
    /// No GPU context is available, so no render surface can be created
    #[error("render surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("failed to read asset {path}: {source}")]
    AssetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("OBJ parse error on line {line}: {message}")]
    ObjParse { line: usize, message: String },

    /// The asset parsed but contained no triangles
    #[error("asset {0} contains no geometry")]
    EmptyMesh(PathBuf),

    /// The decode worker went away without delivering a result
    #[error("asset loader disconnected before delivering a result")]
    LoaderDisconnected,

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ViewerError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ObjParse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
