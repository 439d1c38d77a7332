use std::path::PathBuf;
use thiserror::Error;

/// The main error type for labelsplit operations.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write COCO JSON to {path}: {source}")]
    CocoJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed input in {path}: {message}")]
    MalformedInput { path: PathBuf, message: String },

    #[error("Invalid VOC annotation layout at {path}: {message}")]
    VocLayoutInvalid { path: PathBuf, message: String },

    #[error("Split ratio {ratio} is outside the open interval (0, 1)")]
    InvalidSplitRatio { ratio: f64 },

    #[error(
        "Image '{file_name}' has degenerate dimensions {width}x{height}; cannot normalize boxes"
    )]
    InvalidGeometry {
        file_name: String,
        width: u32,
        height: u32,
    },
}
