mod properties;
mod writer;

pub use properties::*;
pub use writer::*;

/// Error types for the PLY module.
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    /// Failed to write PLY file
    #[error("Failed to write PLY file")]
    Io(#[from] std::io::Error),

    /// Failed to serialize a PLY vertex
    #[error("Failed to serialize PLY vertex")]
    Serialize(#[from] bincode::error::EncodeError),

    /// Number of colors does not match the number of points
    #[error("Point cloud has {0} points but {1} colors")]
    MismatchedColors(usize, usize),
}
