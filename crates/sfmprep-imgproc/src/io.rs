use std::path::Path;

use image::DynamicImage;

use crate::{ImageSize, ImgprocError};

/// Reads an image from the given file path.
///
/// The format is guessed from the file content, any format supported by the image crate
/// is accepted.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// The decoded image.
pub fn read_image(file_path: impl AsRef<Path>) -> Result<DynamicImage, ImgprocError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(ImgprocError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let reader = image::ImageReader::open(file_path)?.with_guessed_format()?;
    Ok(reader.decode()?)
}

/// Writes an image to the given file path.
///
/// The encoding follows the file extension.
///
/// # Arguments
///
/// * `file_path` - The destination path, overwritten if it exists.
/// * `image` - The image to encode.
pub fn write_image(file_path: impl AsRef<Path>, image: &DynamicImage) -> Result<(), ImgprocError> {
    image.save(file_path)?;
    Ok(())
}

/// The size of a decoded image.
pub fn image_size(image: &DynamicImage) -> ImageSize {
    ImageSize {
        width: image.width(),
        height: image.height(),
    }
}
