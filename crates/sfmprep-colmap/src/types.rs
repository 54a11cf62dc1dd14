use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ColmapError;

/// Represents a Colmap camera model.
///
/// The discriminant is the model id stored in `cameras.bin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CameraModelId {
    /// Simple pinhole camera model: f, cx, cy
    SimplePinhole = 0,
    /// Pinhole camera model: fx, fy, cx, cy
    Pinhole = 1,
    /// Simplified radial camera model: f, cx, cy, k
    SimpleRadial = 2,
    /// Radial camera model: f, cx, cy, k1, k2
    Radial = 3,
    /// OpenCV camera model: fx, fy, cx, cy, k1, k2, p1, p2
    OpenCV = 4,
    /// OpenCV fisheye camera model: fx, fy, cx, cy, k1, k2, k3, k4
    OpenCVFisheye = 5,
    /// Full OpenCV camera model: fx, fy, cx, cy, k1, k2, p1, p2, k3, k4, k5, k6
    FullOpenCV = 6,
    /// Field of view camera model: fx, fy, cx, cy, omega
    Fov = 7,
    /// Simple radial fisheye camera model: f, cx, cy, k
    SimpleRadialFisheye = 8,
    /// Radial fisheye camera model: f, cx, cy, k1, k2
    RadialFisheye = 9,
    /// Thin prism fisheye camera model: fx, fy, cx, cy, k1, k2, p1, p2, k3, k4, sx1, sy1
    ThinPrismFisheye = 10,
}

impl CameraModelId {
    /// All camera models, ordered by id.
    pub const ALL: [CameraModelId; 11] = [
        CameraModelId::SimplePinhole,
        CameraModelId::Pinhole,
        CameraModelId::SimpleRadial,
        CameraModelId::Radial,
        CameraModelId::OpenCV,
        CameraModelId::OpenCVFisheye,
        CameraModelId::FullOpenCV,
        CameraModelId::Fov,
        CameraModelId::SimpleRadialFisheye,
        CameraModelId::RadialFisheye,
        CameraModelId::ThinPrismFisheye,
    ];

    /// The number of intrinsic parameters of the model.
    pub fn num_params(&self) -> usize {
        match self {
            CameraModelId::SimplePinhole => 3,
            CameraModelId::Pinhole
            | CameraModelId::SimpleRadial
            | CameraModelId::SimpleRadialFisheye => 4,
            CameraModelId::Radial | CameraModelId::Fov | CameraModelId::RadialFisheye => 5,
            CameraModelId::OpenCV | CameraModelId::OpenCVFisheye => 8,
            CameraModelId::FullOpenCV | CameraModelId::ThinPrismFisheye => 12,
        }
    }

    /// The name used by Colmap in text models and on its command line.
    pub fn name(&self) -> &'static str {
        match self {
            CameraModelId::SimplePinhole => "SIMPLE_PINHOLE",
            CameraModelId::Pinhole => "PINHOLE",
            CameraModelId::SimpleRadial => "SIMPLE_RADIAL",
            CameraModelId::Radial => "RADIAL",
            CameraModelId::OpenCV => "OPENCV",
            CameraModelId::OpenCVFisheye => "OPENCV_FISHEYE",
            CameraModelId::FullOpenCV => "FULL_OPENCV",
            CameraModelId::Fov => "FOV",
            CameraModelId::SimpleRadialFisheye => "SIMPLE_RADIAL_FISHEYE",
            CameraModelId::RadialFisheye => "RADIAL_FISHEYE",
            CameraModelId::ThinPrismFisheye => "THIN_PRISM_FISHEYE",
        }
    }

    /// Look up a camera model from the id stored in binary models.
    pub fn from_id(id: i32) -> Result<Self, ColmapError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| ColmapError::ParseError(format!("Invalid camera model id: {id}")))
    }
}

impl FromStr for CameraModelId {
    type Err = ColmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|model| model.name() == s)
            .copied()
            .ok_or_else(|| ColmapError::ParseError(format!("Invalid camera model: {s}")))
    }
}

impl TryFrom<String> for CameraModelId {
    type Error = ColmapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CameraModelId> for String {
    fn from(model: CameraModelId) -> Self {
        model.name().to_string()
    }
}

impl fmt::Display for CameraModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents a camera in the Colmap system.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapCamera {
    /// Camera id
    pub camera_id: u32,
    /// Camera model id
    pub model_id: CameraModelId,
    /// Image width
    pub width: usize,
    /// Image height
    pub height: usize,
    /// Camera parameters
    pub params: Vec<f64>,
}

impl ColmapCamera {
    /// Check that the number of parameters matches the camera model.
    pub fn validate(&self) -> Result<(), ColmapError> {
        if self.params.len() != self.model_id.num_params() {
            return Err(ColmapError::InvalidNumCameraParams(
                self.model_id,
                self.params.len(),
            ));
        }
        Ok(())
    }
}

/// Represents an image in the Colmap system.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapImage {
    /// Image name
    pub name: String,
    /// Image id
    pub image_id: u32,
    /// Camera id
    pub camera_id: u32,
    /// Rotation
    pub rotation: [f64; 4], // qw, qx, qy, qz
    /// Translation
    pub translation: [f64; 3], // x, y, z
    /// Points2d as (x, y, point3d id), the id is -1 for untriangulated observations
    pub points2d: Vec<(f64, f64, i64)>,
}

/// Represents a 3D point in the Colmap system.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapPoint3d {
    /// Point3d id
    pub point3d_id: u64,
    /// x, y, z coordinates
    pub xyz: [f64; 3],
    /// rgb color
    pub rgb: [u8; 3],
    /// Error
    pub error: f64,
    /// Track as (image id, point2d index)
    pub track: Vec<(u32, u32)>,
}
