use std::path::{Path, PathBuf};

use sfmprep_3d::pointcloud::PointCloud;

use crate::error::ColmapError;
use crate::types::{ColmapCamera, ColmapImage, ColmapPoint3d};
use crate::{binary, text};

/// On-disk encoding of a COLMAP sparse model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// `cameras.bin`, `images.bin`, `points3D.bin`
    Binary,
    /// `cameras.txt`, `images.txt`, `points3D.txt`
    Text,
}

impl ModelFormat {
    fn extension(&self) -> &'static str {
        match self {
            ModelFormat::Binary => "bin",
            ModelFormat::Text => "txt",
        }
    }

    /// Detect the format of the model stored in `dir`, preferring binary.
    ///
    /// Returns `None` when the directory does not hold all three model files.
    pub fn detect(dir: impl AsRef<Path>) -> Option<Self> {
        let dir = dir.as_ref();
        [ModelFormat::Binary, ModelFormat::Text]
            .into_iter()
            .find(|format| {
                ["cameras", "images", "points3D"]
                    .iter()
                    .all(|stem| dir.join(format!("{stem}.{}", format.extension())).is_file())
            })
    }
}

/// A sparse reconstruction: cameras, registered images and triangulated points.
///
/// Images are kept ordered by image id and points by point id.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    path: PathBuf,
    cameras: Vec<ColmapCamera>,
    images: Vec<ColmapImage>,
    points3d: Vec<ColmapPoint3d>,
}

impl Reconstruction {
    /// Create a reconstruction from already parsed model parts.
    ///
    /// # Arguments
    ///
    /// * `path` - The directory the model belongs to.
    /// * `cameras` - The cameras of the model.
    /// * `images` - The registered images, in any order.
    /// * `points3d` - The triangulated points, in any order.
    ///
    /// # Errors
    ///
    /// Fails if an image refers to a camera that is not part of the model.
    pub fn new(
        path: impl Into<PathBuf>,
        cameras: Vec<ColmapCamera>,
        mut images: Vec<ColmapImage>,
        mut points3d: Vec<ColmapPoint3d>,
    ) -> Result<Self, ColmapError> {
        for image in &images {
            if !cameras.iter().any(|c| c.camera_id == image.camera_id) {
                return Err(ColmapError::UnknownCamera(image.image_id, image.camera_id));
            }
        }

        images.sort_by_key(|image| image.image_id);
        points3d.sort_by_key(|point| point.point3d_id);

        Ok(Self {
            path: path.into(),
            cameras,
            images,
            points3d,
        })
    }

    /// Read a reconstruction from a model directory in binary or text format.
    ///
    /// # Arguments
    ///
    /// * `dir` - The directory containing the model files.
    pub fn read(dir: impl AsRef<Path>) -> Result<Self, ColmapError> {
        let dir = dir.as_ref();
        let format =
            ModelFormat::detect(dir).ok_or_else(|| ColmapError::ModelNotFound(dir.to_path_buf()))?;

        let (cameras, images, points3d) = match format {
            ModelFormat::Binary => (
                binary::read_cameras_bin(dir.join("cameras.bin"))?,
                binary::read_images_bin(dir.join("images.bin"))?,
                binary::read_points3d_bin(dir.join("points3D.bin"))?,
            ),
            ModelFormat::Text => (
                text::read_cameras_txt(dir.join("cameras.txt"))?,
                text::read_images_txt(dir.join("images.txt"))?,
                text::read_points3d_txt(dir.join("points3D.txt"))?,
            ),
        };

        log::debug!(
            "Read {:?} model from {}: {} cameras, {} images, {} points",
            format,
            dir.display(),
            cameras.len(),
            images.len(),
            points3d.len()
        );

        Self::new(dir, cameras, images, points3d)
    }

    /// The directory the reconstruction was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The number of registered images.
    #[inline]
    pub fn num_images(&self) -> usize {
        self.images.len()
    }

    /// The number of triangulated points.
    #[inline]
    pub fn num_points3d(&self) -> usize {
        self.points3d.len()
    }

    /// The cameras of the model.
    pub fn cameras(&self) -> &[ColmapCamera] {
        &self.cameras
    }

    /// The registered images, ordered by image id.
    pub fn images(&self) -> &[ColmapImage] {
        &self.images
    }

    /// The triangulated points, ordered by point id.
    pub fn points3d(&self) -> &[ColmapPoint3d] {
        &self.points3d
    }

    /// The names of the registered images, ordered by image id.
    pub fn image_names(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(|image| image.name.as_str())
    }

    /// Collect the triangulated points and their colors.
    pub fn point_cloud(&self) -> PointCloud {
        let (points, colors) = self
            .points3d
            .iter()
            .map(|point| (point.xyz, point.rgb))
            .unzip();
        PointCloud::new(points, Some(colors))
    }
}

/// Return the index of the reconstruction with the most registered images.
///
/// Ties are resolved in favour of the lowest index. Returns `None` for an empty slice.
pub fn largest_reconstruction(reconstructions: &[Reconstruction]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, reconstruction) in reconstructions.iter().enumerate() {
        let num_images = reconstruction.num_images();
        if best.map_or(true, |(_, max)| num_images > max) {
            best = Some((i, num_images));
        }
    }
    best.map(|(i, _)| i)
}

/// List the model directories produced by a mapping run.
///
/// Numbered sub-directories of `sparse_dir` holding a model are returned in numeric
/// order. If `sparse_dir` itself holds a model it is the only entry.
///
/// # Arguments
///
/// * `sparse_dir` - The mapper output directory.
pub fn find_model_dirs(sparse_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ColmapError> {
    let sparse_dir = sparse_dir.as_ref();
    if ModelFormat::detect(sparse_dir).is_some() {
        return Ok(vec![sparse_dir.to_path_buf()]);
    }

    let mut numbered = Vec::new();
    for entry in std::fs::read_dir(sparse_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let index = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<usize>().ok());
        match index {
            Some(index) if ModelFormat::detect(&path).is_some() => numbered.push((index, path)),
            _ => log::debug!("Skipping {}: not a numbered model directory", path.display()),
        }
    }
    numbered.sort_by_key(|(index, _)| *index);

    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::test_utils::*;
    use crate::types::CameraModelId;

    fn camera() -> ColmapCamera {
        ColmapCamera {
            camera_id: 1,
            model_id: CameraModelId::Pinhole,
            width: 64,
            height: 48,
            params: vec![50.0, 50.0, 32.0, 24.0],
        }
    }

    fn image(image_id: u32, name: &str) -> ColmapImage {
        ColmapImage {
            name: name.to_string(),
            image_id,
            camera_id: 1,
            rotation: [1.0, 0.0, 0.0, 0.0],
            translation: [0.0, 0.0, 0.0],
            points2d: vec![],
        }
    }

    fn point(point3d_id: u64, xyz: [f64; 3]) -> ColmapPoint3d {
        ColmapPoint3d {
            point3d_id,
            xyz,
            rgb: [1, 2, 3],
            error: 0.5,
            track: vec![(1, 0)],
        }
    }

    fn reconstruction(names: &[&str]) -> Reconstruction {
        let images = names
            .iter()
            .enumerate()
            .map(|(i, name)| image(i as u32 + 1, name))
            .collect();
        Reconstruction::new("sparse", vec![camera()], images, vec![]).unwrap()
    }

    fn write_text_model(dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join("cameras.txt"), "1 PINHOLE 64 48 50 50 32 24\n")?;
        std::fs::write(
            dir.join("images.txt"),
            "2 1 0 0 0 0 0 0 1 b.png\n\n1 1 0 0 0 0 0 0 1 a.png\n\n",
        )?;
        std::fs::write(
            dir.join("points3D.txt"),
            "9 1 2 3 1 2 3 0.5 1 0\n4 -1 0 1 1 2 3 0.5 1 0\n",
        )?;
        Ok(())
    }

    #[test]
    fn test_read_text_model_sorted() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        write_text_model(tmp_dir.path())?;

        let reconstruction = Reconstruction::read(tmp_dir.path())?;
        assert_eq!(reconstruction.num_images(), 2);
        assert_eq!(
            reconstruction.image_names().collect::<Vec<_>>(),
            vec!["a.png", "b.png"]
        );
        assert_eq!(reconstruction.num_points3d(), 2);
        assert_eq!(reconstruction.points3d()[0].point3d_id, 4);
        Ok(())
    }

    #[test]
    fn test_text_and_binary_models_agree() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        let text_dir = tmp_dir.path().join("text");
        let bin_dir = tmp_dir.path().join("bin");
        write_text_model(&text_dir)?;

        let from_text = Reconstruction::read(&text_dir)?;
        std::fs::create_dir_all(&bin_dir)?;
        write_cameras_bin(&bin_dir.join("cameras.bin"), from_text.cameras())?;
        write_images_bin(&bin_dir.join("images.bin"), from_text.images())?;
        write_points3d_bin(&bin_dir.join("points3D.bin"), from_text.points3d())?;
        let from_bin = Reconstruction::read(&bin_dir)?;

        assert_eq!(from_text.cameras(), from_bin.cameras());
        assert_eq!(from_text.images(), from_bin.images());
        assert_eq!(from_text.points3d(), from_bin.points3d());
        Ok(())
    }

    #[test]
    fn test_binary_preferred_over_text() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        write_text_model(tmp_dir.path())?;
        assert_eq!(ModelFormat::detect(tmp_dir.path()), Some(ModelFormat::Text));

        write_cameras_bin(&tmp_dir.path().join("cameras.bin"), &[camera()])?;
        write_images_bin(&tmp_dir.path().join("images.bin"), &[image(5, "c.png")])?;
        write_points3d_bin(&tmp_dir.path().join("points3D.bin"), &[])?;
        assert_eq!(ModelFormat::detect(tmp_dir.path()), Some(ModelFormat::Binary));

        let reconstruction = Reconstruction::read(tmp_dir.path())?;
        assert_eq!(reconstruction.image_names().collect::<Vec<_>>(), vec!["c.png"]);
        Ok(())
    }

    #[test]
    fn test_missing_model() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        assert!(matches!(
            Reconstruction::read(tmp_dir.path()),
            Err(ColmapError::ModelNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_unknown_camera() {
        let mut orphan = image(1, "a.png");
        orphan.camera_id = 7;
        let result = Reconstruction::new("sparse", vec![camera()], vec![orphan], vec![]);
        assert!(matches!(result, Err(ColmapError::UnknownCamera(1, 7))));
    }

    #[test]
    fn test_point_cloud() {
        let reconstruction = Reconstruction::new(
            "sparse",
            vec![camera()],
            vec![],
            vec![point(2, [0.0, 1.0, 2.0]), point(1, [3.0, 4.0, 5.0])],
        )
        .unwrap();
        let cloud = reconstruction.point_cloud();
        assert_eq!(cloud.points(), &[[3.0, 4.0, 5.0], [0.0, 1.0, 2.0]]);
        assert_eq!(cloud.colors().unwrap(), &[[1, 2, 3], [1, 2, 3]]);
    }

    #[test]
    fn test_largest_reconstruction() {
        assert_eq!(largest_reconstruction(&[]), None);

        let candidates = vec![
            reconstruction(&["a"]),
            reconstruction(&["b", "c", "d"]),
            reconstruction(&["e", "f"]),
        ];
        assert_eq!(largest_reconstruction(&candidates), Some(1));
    }

    #[test]
    fn test_largest_reconstruction_ties_pick_first() {
        let candidates = vec![
            reconstruction(&["a", "b"]),
            reconstruction(&["c"]),
            reconstruction(&["d", "e"]),
        ];
        assert_eq!(largest_reconstruction(&candidates), Some(0));
    }

    #[test]
    fn test_find_model_dirs_numeric_order() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        for name in ["10", "2", "0"] {
            write_text_model(&tmp_dir.path().join(name))?;
        }
        std::fs::create_dir_all(tmp_dir.path().join("1"))?;
        std::fs::create_dir_all(tmp_dir.path().join("notes"))?;

        let dirs = find_model_dirs(tmp_dir.path())?;
        let names = dirs
            .iter()
            .map(|d| d.file_name().unwrap().to_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["0", "2", "10"]);
        Ok(())
    }

    #[test]
    fn test_find_model_dirs_flat() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        write_text_model(tmp_dir.path())?;
        assert_eq!(find_model_dirs(tmp_dir.path())?, vec![tmp_dir.path().to_path_buf()]);
        Ok(())
    }
}
