use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::io::{image_size, read_image, write_image};
use crate::resize::resize_lanczos;
use crate::{ImageSize, ImgprocError};

/// Downsampling factors of the half, quarter and eighth resolution tiers.
pub const PYRAMID_FACTORS: [u32; 3] = [2, 4, 8];

/// Compute the size of a tier by integer division of the base size.
///
/// # Arguments
///
/// * `base` - The full resolution size.
/// * `factor` - The downsampling factor, must be non zero.
///
/// # Errors
///
/// Fails if the tier would have no pixels in one dimension.
///
/// # Example
///
/// ```
/// use sfmprep_imgproc::{pyramid::scaled_size, ImageSize};
///
/// let size = scaled_size(ImageSize::from([1001, 750]), 8).unwrap();
/// assert_eq!(size, ImageSize::from([125, 93]));
/// ```
pub fn scaled_size(base: ImageSize, factor: u32) -> Result<ImageSize, ImgprocError> {
    let size = base
        .width
        .checked_div(factor)
        .zip(base.height.checked_div(factor))
        .map(|(width, height)| ImageSize { width, height });

    match size {
        Some(size) if size.width > 0 && size.height > 0 => Ok(size),
        _ => Err(ImgprocError::InvalidScale(base, factor)),
    }
}

/// Writes fixed-ratio downsampled copies of a sequence of images.
///
/// The first image processed fixes the base resolution: every later image is resized to
/// the tiers of that base, whatever its own size.
#[derive(Debug, Clone)]
pub struct PyramidDownsampler {
    factors: Vec<u32>,
    base_size: Option<ImageSize>,
}

impl Default for PyramidDownsampler {
    fn default() -> Self {
        Self::new(&PYRAMID_FACTORS)
    }
}

impl PyramidDownsampler {
    /// Create a downsampler for the given factors.
    pub fn new(factors: &[u32]) -> Self {
        Self {
            factors: factors.to_vec(),
            base_size: None,
        }
    }

    /// The downsampling factors, in output order.
    pub fn factors(&self) -> &[u32] {
        &self.factors
    }

    /// The base resolution, set once the first image has been processed.
    pub fn base_size(&self) -> Option<ImageSize> {
        self.base_size
    }

    /// Downsample an image to every tier.
    ///
    /// # Returns
    ///
    /// One `(factor, image)` pair per factor, in factor order.
    pub fn downsample(
        &mut self,
        src: &DynamicImage,
    ) -> Result<Vec<(u32, DynamicImage)>, ImgprocError> {
        let size = image_size(src);
        let base = *self.base_size.get_or_insert(size);
        if size != base {
            log::debug!("Image of size {} resized from base size {}", size, base);
        }

        self.factors
            .iter()
            .map(|&factor| {
                let tier_size = scaled_size(base, factor)?;
                Ok((factor, resize_lanczos(src, tier_size)?))
            })
            .collect()
    }

    /// Read an image, downsample it and write every tier.
    ///
    /// # Arguments
    ///
    /// * `src_path` - The full resolution image.
    /// * `dst_path` - Maps a factor to the path of its output file.
    ///
    /// # Returns
    ///
    /// The sizes of the written tiers, in factor order.
    pub fn downsample_file(
        &mut self,
        src_path: &Path,
        dst_path: impl Fn(u32) -> PathBuf,
    ) -> Result<Vec<ImageSize>, ImgprocError> {
        let src = read_image(src_path)?;
        let tiers = self.downsample(&src)?;
        drop(src);

        tiers
            .into_iter()
            .map(|(factor, tier)| {
                write_image(dst_path(factor), &tier)?;
                Ok(image_size(&tier))
            })
            .collect()
    }
}
