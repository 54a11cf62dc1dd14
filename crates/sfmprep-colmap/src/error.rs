use crate::types::CameraModelId;

/// Error types for reading COLMAP models.
#[derive(Debug, thiserror::Error)]
pub enum ColmapError {
    /// Error reading or writing file
    #[error("error reading or writing file")]
    IoError(#[from] std::io::Error),

    /// Error decoding a binary model record
    #[error("Failed to decode binary model. {0}")]
    DecodeError(#[from] bincode::error::DecodeError),

    /// Invalid number of camera parameters
    #[error("Invalid number of camera parameters for {0}: {1}")]
    InvalidNumCameraParams(CameraModelId, usize),

    /// Parse error
    #[error("Parse error {0}")]
    ParseError(String),

    /// The directory does not contain a complete model
    #[error("No COLMAP model found in {0}")]
    ModelNotFound(std::path::PathBuf),

    /// An image refers to a camera that is not part of the model
    #[error("Image {0} refers to unknown camera {1}")]
    UnknownCamera(u32, u32),
}
