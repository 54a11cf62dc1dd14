use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sfmprep_colmap::CameraModelId;

/// Environment variable overriding the default `colmap` executable.
pub const COLMAP_BIN_ENV: &str = "SFMPREP_COLMAP_BIN";

/// Which image names are undistorted for each reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndistortSelection {
    /// The images registered in the selected reconstruction, for every reconstruction.
    #[default]
    Selected,
    /// The images registered in the reconstruction being undistorted.
    Own,
}

/// Configuration of a preparation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareConfig {
    /// Root directory holding `images/` and receiving every output.
    pub data_dir: PathBuf,
    /// Camera model estimated during feature extraction.
    pub camera_model: CameraModelId,
    /// The `colmap` executable.
    pub colmap_bin: PathBuf,
    /// Load an existing `sparse/` directory instead of failing on it.
    pub reuse_sparse: bool,
    /// Image names passed to the undistorter.
    pub undistort_selection: UndistortSelection,
}

impl PrepareConfig {
    /// Create a configuration with default settings for `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            camera_model: CameraModelId::OpenCV,
            colmap_bin: default_colmap_bin(),
            reuse_sparse: false,
            undistort_selection: UndistortSelection::default(),
        }
    }
}

/// The `colmap` executable from [`COLMAP_BIN_ENV`], or `colmap` from `PATH`.
pub fn default_colmap_bin() -> PathBuf {
    std::env::var_os(COLMAP_BIN_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("colmap"))
}
