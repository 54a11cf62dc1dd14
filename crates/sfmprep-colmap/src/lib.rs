#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Readers for COLMAP binary models.
pub mod binary;

/// Reconstruction engine interface and the `colmap` executable driver.
pub mod engine;

/// Error types for reading COLMAP models.
pub mod error;

/// Sparse reconstruction container and model discovery.
pub mod reconstruction;

/// Readers for COLMAP text models.
pub mod text;

/// COLMAP model types.
pub mod types;

pub use engine::{ColmapCli, EngineError, FeatureExtractionOptions, MatchingOptions, SfmEngine};
pub use error::ColmapError;
pub use reconstruction::{find_model_dirs, largest_reconstruction, ModelFormat, Reconstruction};
pub use types::{CameraModelId, ColmapCamera, ColmapImage, ColmapPoint3d};
