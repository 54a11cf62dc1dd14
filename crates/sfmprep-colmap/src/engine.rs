use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::error::ColmapError;
use crate::reconstruction::{find_model_dirs, Reconstruction};
use crate::types::CameraModelId;

/// Error types for the reconstruction engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine executable could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        /// The executable that failed to start
        program: PathBuf,
        /// The underlying error
        source: std::io::Error,
    },

    /// A sub-command exited with a failure status
    #[error("colmap {subcommand} failed with {status}")]
    CommandFailed {
        /// The sub-command that failed
        subcommand: &'static str,
        /// The exit status of the process
        status: ExitStatus,
    },

    /// Error preparing the engine inputs
    #[error("Failed to prepare engine inputs. {0}")]
    Io(#[from] std::io::Error),

    /// Error reading the models written by the engine
    #[error("Failed to read the engine output. {0}")]
    Model(#[from] ColmapError),
}

/// Options for feature extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureExtractionOptions {
    /// The camera model to estimate.
    pub camera_model: CameraModelId,
    /// Whether all images share a single camera.
    pub single_camera: bool,
}

impl Default for FeatureExtractionOptions {
    fn default() -> Self {
        Self {
            camera_model: CameraModelId::OpenCV,
            single_camera: true,
        }
    }
}

/// Options for feature matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingOptions {
    /// Whether to refine matches with the estimated two-view geometry.
    pub guided_matching: bool,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self {
            guided_matching: true,
        }
    }
}

/// The operations the preparation pipeline needs from a reconstruction engine.
pub trait SfmEngine {
    /// Detect features in every image of `image_dir` and store them in the database.
    fn extract_features(
        &self,
        database_path: &Path,
        image_dir: &Path,
        options: &FeatureExtractionOptions,
    ) -> Result<(), EngineError>;

    /// Match the features of every image pair in the database.
    fn match_exhaustive(
        &self,
        database_path: &Path,
        options: &MatchingOptions,
    ) -> Result<(), EngineError>;

    /// Run incremental mapping and return every reconstruction written to `output_dir`.
    ///
    /// The reconstructions are returned in the order of their model directories.
    fn incremental_mapping(
        &self,
        database_path: &Path,
        image_dir: &Path,
        output_dir: &Path,
    ) -> Result<Vec<Reconstruction>, EngineError>;

    /// Undistort `image_names` using the model in `model_dir`.
    ///
    /// The undistorted images are written to `output_dir/images`.
    fn undistort_images(
        &self,
        model_dir: &Path,
        image_dir: &Path,
        output_dir: &Path,
        image_names: &[String],
    ) -> Result<(), EngineError>;
}

/// Drives the `colmap` command line executable.
#[derive(Debug, Clone)]
pub struct ColmapCli {
    executable: PathBuf,
}

impl ColmapCli {
    /// Create a driver for the given executable, resolved through `PATH` if relative.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// The executable invoked by the driver.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn run(&self, subcommand: &'static str, args: Vec<OsString>) -> Result<(), EngineError> {
        let mut command = Command::new(&self.executable);
        command.arg(subcommand).args(args);
        log::debug!("Running {:?}", command);

        let status = command.status().map_err(|source| EngineError::Spawn {
            program: self.executable.clone(),
            source,
        })?;

        if !status.success() {
            return Err(EngineError::CommandFailed { subcommand, status });
        }
        Ok(())
    }
}

fn flag(name: &str, value: impl Into<OsString>) -> [OsString; 2] {
    [format!("--{name}").into(), value.into()]
}

fn bool_value(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

impl SfmEngine for ColmapCli {
    fn extract_features(
        &self,
        database_path: &Path,
        image_dir: &Path,
        options: &FeatureExtractionOptions,
    ) -> Result<(), EngineError> {
        let args = [
            flag("database_path", database_path),
            flag("image_path", image_dir),
            flag("ImageReader.single_camera", bool_value(options.single_camera)),
            flag("ImageReader.camera_model", options.camera_model.name()),
        ];
        self.run("feature_extractor", args.into_iter().flatten().collect())
    }

    fn match_exhaustive(
        &self,
        database_path: &Path,
        options: &MatchingOptions,
    ) -> Result<(), EngineError> {
        let args = [
            flag("database_path", database_path),
            flag(
                "SiftMatching.guided_matching",
                bool_value(options.guided_matching),
            ),
        ];
        self.run("exhaustive_matcher", args.into_iter().flatten().collect())
    }

    fn incremental_mapping(
        &self,
        database_path: &Path,
        image_dir: &Path,
        output_dir: &Path,
    ) -> Result<Vec<Reconstruction>, EngineError> {
        let args = [
            flag("database_path", database_path),
            flag("image_path", image_dir),
            flag("output_path", output_dir),
        ];
        self.run("mapper", args.into_iter().flatten().collect())?;

        let reconstructions = find_model_dirs(output_dir)?
            .iter()
            .map(Reconstruction::read)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reconstructions)
    }

    fn undistort_images(
        &self,
        model_dir: &Path,
        image_dir: &Path,
        output_dir: &Path,
        image_names: &[String],
    ) -> Result<(), EngineError> {
        std::fs::create_dir_all(output_dir)?;
        let image_list_path = output_dir.join("image_list.txt");
        let mut image_list = image_names.join("\n");
        image_list.push('\n');
        std::fs::write(&image_list_path, image_list)?;

        let args = [
            flag("image_path", image_dir),
            flag("input_path", model_dir),
            flag("output_path", output_dir),
            flag("output_type", "COLMAP"),
            flag("image_list_path", &image_list_path),
        ];
        self.run("image_undistorter", args.into_iter().flatten().collect())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::{Mutex, MutexGuard};

    // Writing an executable while another test thread forks can fail with ETXTBSY.
    static SPAWN_LOCK: Mutex<()> = Mutex::new(());

    fn spawn_lock() -> MutexGuard<'static, ()> {
        SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write an executable script recording its arguments and failing on `fail_on`.
    fn fake_colmap(dir: &Path, fail_on: &str) -> PathBuf {
        let path = dir.join("colmap");
        let log = dir.join("calls.log");
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> {}\nif [ \"$1\" = \"{}\" ]; then exit 3; fi\nexit 0\n",
            log.display(),
            fail_on
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn calls(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_arguments() -> Result<(), EngineError> {
        let _guard = spawn_lock();
        let tmp_dir = tempfile::tempdir()?;
        let engine = ColmapCli::new(fake_colmap(tmp_dir.path(), "none"));
        let db = tmp_dir.path().join("database.db");
        let images = tmp_dir.path().join("images");

        let options = FeatureExtractionOptions {
            camera_model: CameraModelId::Pinhole,
            single_camera: true,
        };
        engine.extract_features(&db, &images, &options)?;
        engine.match_exhaustive(&db, &MatchingOptions::default())?;

        let calls = calls(tmp_dir.path());
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            format!(
                "feature_extractor --database_path {} --image_path {} --ImageReader.single_camera 1 --ImageReader.camera_model PINHOLE",
                db.display(),
                images.display()
            )
        );
        assert_eq!(
            calls[1],
            format!(
                "exhaustive_matcher --database_path {} --SiftMatching.guided_matching 1",
                db.display()
            )
        );
        Ok(())
    }

    #[test]
    fn test_undistort_writes_image_list() -> Result<(), EngineError> {
        let _guard = spawn_lock();
        let tmp_dir = tempfile::tempdir()?;
        let engine = ColmapCli::new(fake_colmap(tmp_dir.path(), "none"));
        let output_dir = tmp_dir.path().join("rechter0");

        engine.undistort_images(
            &tmp_dir.path().join("sparse/0"),
            &tmp_dir.path().join("images"),
            &output_dir,
            &["a.jpg".to_string(), "b.jpg".to_string()],
        )?;

        let list = std::fs::read_to_string(output_dir.join("image_list.txt"))?;
        assert_eq!(list, "a.jpg\nb.jpg\n");
        let calls = calls(tmp_dir.path());
        assert!(calls[0].starts_with("image_undistorter "));
        assert!(calls[0].contains("--output_type COLMAP"));
        Ok(())
    }

    #[test]
    fn test_mapping_reads_models() -> Result<(), EngineError> {
        let _guard = spawn_lock();
        let tmp_dir = tempfile::tempdir()?;
        let engine = ColmapCli::new(fake_colmap(tmp_dir.path(), "none"));
        let sparse = tmp_dir.path().join("sparse");
        let model_dir = sparse.join("0");
        std::fs::create_dir_all(&model_dir)?;
        std::fs::write(model_dir.join("cameras.txt"), "1 SIMPLE_PINHOLE 8 8 4 4 4\n")?;
        std::fs::write(model_dir.join("images.txt"), "1 1 0 0 0 0 0 0 1 a.jpg\n\n")?;
        std::fs::write(model_dir.join("points3D.txt"), "")?;

        let reconstructions = engine.incremental_mapping(
            &tmp_dir.path().join("database.db"),
            &tmp_dir.path().join("images"),
            &sparse,
        )?;
        assert_eq!(reconstructions.len(), 1);
        assert_eq!(reconstructions[0].num_images(), 1);
        Ok(())
    }

    #[test]
    fn test_failed_command() -> Result<(), EngineError> {
        let _guard = spawn_lock();
        let tmp_dir = tempfile::tempdir()?;
        let engine = ColmapCli::new(fake_colmap(tmp_dir.path(), "mapper"));
        let result = engine.incremental_mapping(
            &tmp_dir.path().join("database.db"),
            &tmp_dir.path().join("images"),
            &tmp_dir.path().join("sparse"),
        );
        match result {
            Err(EngineError::CommandFailed { subcommand, status }) => {
                assert_eq!(subcommand, "mapper");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_missing_executable() {
        let _guard = spawn_lock();
        let engine = ColmapCli::new("/nonexistent/colmap-binary");
        assert_eq!(engine.executable(), Path::new("/nonexistent/colmap-binary"));
        let result = engine.match_exhaustive(Path::new("db"), &MatchingOptions::default());
        assert!(matches!(result, Err(EngineError::Spawn { .. })));
    }
}
