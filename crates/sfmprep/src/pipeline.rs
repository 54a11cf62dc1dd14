use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use sfmprep_3d::io::ply::write_ply_binary;
use sfmprep_colmap::{
    find_model_dirs, largest_reconstruction, FeatureExtractionOptions, MatchingOptions,
    Reconstruction, SfmEngine,
};
use sfmprep_imgproc::{
    pyramid::{PyramidDownsampler, PYRAMID_FACTORS},
    ImageSize,
};

use crate::config::{PrepareConfig, UndistortSelection};
use crate::error::PrepareError;
use crate::layout::Layout;
use crate::progress::progress_bar;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareSummary {
    /// Number of candidate reconstructions.
    pub num_reconstructions: usize,
    /// Index of the selected reconstruction.
    pub selected: usize,
    /// Number of unique images downsampled.
    pub num_images: usize,
    /// Base resolution of the downsampled images, `None` if there were no images.
    pub base_size: Option<ImageSize>,
    /// Number of exported points.
    pub num_points: usize,
    /// Path of the exported point cloud.
    pub point_cloud_path: PathBuf,
}

/// How the reconstruction stage obtains its candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Acquisition {
    Build,
    Reuse,
}

/// Sequences the preparation stages over a data directory.
pub struct Preparation<E: SfmEngine> {
    config: PrepareConfig,
    layout: Layout,
    engine: E,
}

impl<E: SfmEngine> Preparation<E> {
    /// Create a run for `config` using `engine` for reconstruction and undistortion.
    pub fn new(config: PrepareConfig, engine: E) -> Self {
        let layout = Layout::new(&config.data_dir);
        Self {
            config,
            layout,
            engine,
        }
    }

    /// Run every stage in order.
    ///
    /// Any error aborts the run; outputs written so far are left in place.
    pub fn run(&self) -> Result<PrepareSummary, PrepareError> {
        log::info!("Preparing {}", self.layout.data_dir().display());
        let acquisition = self.check_preconditions()?;

        let candidates = match acquisition {
            Acquisition::Build => self.build_reconstructions()?,
            Acquisition::Reuse => self.load_reconstructions()?,
        };

        let selected = select_reconstruction(&candidates)
            .ok_or_else(|| PrepareError::NoReconstruction(self.layout.sparse_dir()))?;

        self.undistort_and_merge(&candidates, selected)?;

        let image_names = unique_image_names(&candidates);
        let base_size = self.downsample(&image_names)?;

        let num_points = self.export_point_cloud(&candidates[selected])?;

        Ok(PrepareSummary {
            num_reconstructions: candidates.len(),
            selected,
            num_images: image_names.len(),
            base_size,
            num_points,
            point_cloud_path: self.layout.point_cloud_path(),
        })
    }

    /// Validate the data directory before any side effect.
    fn check_preconditions(&self) -> Result<Acquisition, PrepareError> {
        let images_dir = self.layout.images_dir();
        if !images_dir.is_dir() {
            return Err(PrepareError::MissingImagesDir(images_dir));
        }

        let sparse_dir = self.layout.sparse_dir();
        if sparse_dir.exists() {
            if self.config.reuse_sparse {
                log::info!("Reusing reconstruction in {}", sparse_dir.display());
                return Ok(Acquisition::Reuse);
            }
            let database_path = self.layout.database_path();
            if database_path.exists() {
                return Err(PrepareError::DatabaseExists(database_path));
            }
            return Err(PrepareError::ReconstructionExists(sparse_dir));
        }

        let database_path = self.layout.database_path();
        if database_path.exists() {
            return Err(PrepareError::DatabaseExists(database_path));
        }

        Ok(Acquisition::Build)
    }

    /// Extract, match and map the input images.
    fn build_reconstructions(&self) -> Result<Vec<Reconstruction>, PrepareError> {
        let images_dir = self.layout.images_dir();
        let database_path = self.layout.database_path();
        let sparse_dir = self.layout.sparse_dir();

        let num_files = count_files(&images_dir)?;
        log::info!("Found {} files in {}", num_files, images_dir.display());

        let extraction = FeatureExtractionOptions {
            camera_model: self.config.camera_model,
            single_camera: true,
        };
        self.engine
            .extract_features(&database_path, &images_dir, &extraction)?;
        log::info!("Imported features to {}", database_path.display());

        self.engine
            .match_exhaustive(&database_path, &MatchingOptions::default())?;
        log::info!("Feature matching completed");

        fs::create_dir(&sparse_dir)?;
        let reconstructions =
            self.engine
                .incremental_mapping(&database_path, &images_dir, &sparse_dir)?;
        log::info!("Mapping produced {} reconstructions", reconstructions.len());

        Ok(reconstructions)
    }

    /// Load the reconstructions of a previous mapping run.
    fn load_reconstructions(&self) -> Result<Vec<Reconstruction>, PrepareError> {
        let reconstructions = find_model_dirs(self.layout.sparse_dir())?
            .iter()
            .map(Reconstruction::read)
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("Loaded {} reconstructions", reconstructions.len());
        Ok(reconstructions)
    }

    /// Undistort every reconstruction and merge the results into one directory.
    ///
    /// Files of later reconstructions replace files of earlier ones with the same name.
    fn undistort_and_merge(
        &self,
        candidates: &[Reconstruction],
        selected: usize,
    ) -> Result<usize, PrepareError> {
        let images_dir = self.layout.images_dir();
        let merged_dir = self.layout.merged_dir();
        fs::create_dir_all(&merged_dir)?;

        let selected_names = owned_names(&candidates[selected]);

        let mut num_copied = 0;
        for (position, reconstruction) in candidates.iter().enumerate() {
            let names = match self.config.undistort_selection {
                UndistortSelection::Selected => selected_names.clone(),
                UndistortSelection::Own => owned_names(reconstruction),
            };

            let output_dir = self
                .layout
                .undistorted_dir(model_index(reconstruction).unwrap_or(position));
            log::info!(
                "Undistorting {} images of {} into {}",
                names.len(),
                reconstruction.path().display(),
                output_dir.display()
            );
            self.engine
                .undistort_images(reconstruction.path(), &images_dir, &output_dir, &names)?;

            num_copied += copy_files(&output_dir.join("images"), &merged_dir)?;
        }
        log::info!("Merged {} undistorted images into {}", num_copied, merged_dir.display());

        Ok(num_copied)
    }

    /// Write the half, quarter and eighth resolution tiers of every merged image.
    fn downsample(&self, image_names: &[String]) -> Result<Option<ImageSize>, PrepareError> {
        let mut downsampler = PyramidDownsampler::new(&PYRAMID_FACTORS);
        for &factor in downsampler.factors() {
            fs::create_dir_all(self.layout.tier_dir(factor))?;
        }

        log::info!("Downsampling images");
        let merged_dir = self.layout.merged_dir();

        let pb = progress_bar(image_names.len(), "Downsampling");
        for name in image_names {
            for &factor in downsampler.factors() {
                if let Some(parent) = self.layout.tier_dir(factor).join(name).parent() {
                    fs::create_dir_all(parent)?;
                }
            }
            downsampler.downsample_file(&merged_dir.join(name), |factor| {
                self.layout.tier_dir(factor).join(name)
            })?;
            pb.inc(1);
        }
        pb.finish_and_clear();

        if let Some(base_size) = downsampler.base_size() {
            log::info!("Downsampled {} images from base size {}", image_names.len(), base_size);
        }
        Ok(downsampler.base_size())
    }

    /// Export the point cloud of the selected reconstruction.
    fn export_point_cloud(&self, reconstruction: &Reconstruction) -> Result<usize, PrepareError> {
        log::info!("Exporting point cloud");
        let pointcloud = reconstruction.point_cloud();
        let path = self.layout.point_cloud_path();
        write_ply_binary(&path, &pointcloud)?;

        match pointcloud.bounds() {
            Some((min, max)) => log::info!(
                "Wrote {} points to {}, bounds {:?} - {:?}",
                pointcloud.len(),
                path.display(),
                min,
                max
            ),
            None => log::warn!("Wrote an empty point cloud to {}", path.display()),
        }
        Ok(pointcloud.len())
    }
}

/// Pick the reconstruction with the most registered images, warning if there is a choice.
///
/// Ties go to the first candidate. Returns `None` if there are no candidates.
pub fn select_reconstruction(candidates: &[Reconstruction]) -> Option<usize> {
    let selected = largest_reconstruction(candidates)?;
    if candidates.len() > 1 {
        log::warn!("Multiple reconstructions found, taking biggest one");
    }
    log::info!(
        "Biggest one was {} with {} images",
        selected,
        candidates[selected].num_images()
    );
    Some(selected)
}

/// Collect the registered image names of every candidate, in first-seen order.
pub fn unique_image_names(candidates: &[Reconstruction]) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .flat_map(|reconstruction| reconstruction.image_names())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// The number of a `sparse/<n>` model directory.
fn model_index(reconstruction: &Reconstruction) -> Option<usize> {
    reconstruction
        .path()
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.parse().ok())
}

fn owned_names(reconstruction: &Reconstruction) -> Vec<String> {
    reconstruction.image_names().map(str::to_string).collect()
}

fn count_files(dir: &Path) -> std::io::Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        if entry?.file_type()?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

/// Copy the regular files of `src_dir` into `dst_dir`, overwriting existing files.
fn copy_files(src_dir: &Path, dst_dir: &Path) -> std::io::Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(src_dir)? {
        let entry = entry?;
        let src = entry.path();
        if src.is_file() {
            fs::copy(&src, dst_dir.join(entry.file_name()))?;
            count += 1;
        }
    }
    Ok(count)
}
