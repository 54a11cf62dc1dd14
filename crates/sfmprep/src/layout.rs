use std::path::{Path, PathBuf};

/// Paths of every input and output of a run, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    data_dir: PathBuf,
}

impl Layout {
    /// Create the layout rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The input images.
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    /// The feature database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("database.db")
    }

    /// The mapper output, one sub-directory per reconstruction.
    pub fn sparse_dir(&self) -> PathBuf {
        self.data_dir.join("sparse")
    }

    /// The undistorter output of reconstruction `index`.
    pub fn undistorted_dir(&self, index: usize) -> PathBuf {
        self.data_dir.join(format!("rechter{index}"))
    }

    /// The undistorted images of every reconstruction merged together.
    pub fn merged_dir(&self) -> PathBuf {
        self.data_dir.join("rechter")
    }

    /// The images downsampled by `factor`.
    pub fn tier_dir(&self, factor: u32) -> PathBuf {
        self.data_dir.join(format!("images_{factor}"))
    }

    /// The exported point cloud.
    pub fn point_cloud_path(&self) -> PathBuf {
        self.data_dir.join("point_cloud.ply")
    }
}
