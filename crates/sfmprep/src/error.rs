use std::path::PathBuf;

use sfmprep_3d::io::ply::PlyError;
use sfmprep_colmap::{ColmapError, EngineError};
use sfmprep_imgproc::ImgprocError;

/// An error type for the preparation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    /// The data directory has no `images` directory.
    #[error("data_dir must contain an 'images' directory: {0}")]
    MissingImagesDir(PathBuf),

    /// A feature database from a previous run exists.
    #[error("Database file already exists: {0}")]
    DatabaseExists(PathBuf),

    /// A reconstruction from a previous run exists and reuse was not requested.
    #[error("Reconstruction directory already exists: {0}")]
    ReconstructionExists(PathBuf),

    /// Mapping did not produce any reconstruction.
    #[error("No reconstruction found in {0}")]
    NoReconstruction(PathBuf),

    /// File system error.
    #[error("File system error. {0}")]
    Io(#[from] std::io::Error),

    /// Error from the reconstruction engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Error reading a reconstruction.
    #[error(transparent)]
    Colmap(#[from] ColmapError),

    /// Error downsampling an image.
    #[error(transparent)]
    Imgproc(#[from] ImgprocError),

    /// Error exporting the point cloud.
    #[error(transparent)]
    Ply(#[from] PlyError),
}
