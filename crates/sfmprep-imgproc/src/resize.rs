use fast_image_resize as fr;
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

use crate::{ImageSize, ImgprocError};

/// Resampling filter used by [`resize_lanczos`].
const LANCZOS: fr::ResizeAlg = fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3);

/// Split an image into an 8-bit interleaved buffer and its pixel type.
///
/// Images with 16-bit or float channels are converted to 8-bit, keeping alpha if present.
fn to_u8_buffer(src: &DynamicImage) -> (Vec<u8>, fr::PixelType) {
    match src {
        DynamicImage::ImageLuma8(img) => (img.as_raw().clone(), fr::PixelType::U8),
        DynamicImage::ImageLumaA8(img) => (img.as_raw().clone(), fr::PixelType::U8x2),
        DynamicImage::ImageRgb8(img) => (img.as_raw().clone(), fr::PixelType::U8x3),
        DynamicImage::ImageRgba8(img) => (img.as_raw().clone(), fr::PixelType::U8x4),
        other => {
            log::debug!("Converting {:?} image to 8 bits before resizing", other.color());
            if other.color().has_alpha() {
                (other.to_rgba8().into_raw(), fr::PixelType::U8x4)
            } else {
                (other.to_rgb8().into_raw(), fr::PixelType::U8x3)
            }
        }
    }
}

fn from_u8_buffer(
    buffer: Vec<u8>,
    size: ImageSize,
    pixel_type: fr::PixelType,
) -> Result<DynamicImage, ImgprocError> {
    let (width, height) = (size.width, size.height);
    let image = match pixel_type {
        fr::PixelType::U8 => {
            GrayImage::from_raw(width, height, buffer).map(DynamicImage::ImageLuma8)
        }
        fr::PixelType::U8x2 => {
            GrayAlphaImage::from_raw(width, height, buffer).map(DynamicImage::ImageLumaA8)
        }
        fr::PixelType::U8x3 => {
            RgbImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgb8)
        }
        _ => RgbaImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgba8),
    };
    image.ok_or(ImgprocError::BufferSizeMismatch(size))
}

/// Resize an image using the [fast_image_resize](https://crates.io/crates/fast_image_resize)
/// crate with a Lanczos3 convolution filter.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `new_size` - The size of the output image.
///
/// # Returns
///
/// The resized image, 8 bits per channel with the channel layout of the input.
///
/// # Errors
///
/// The function returns an error if either size is zero in one dimension.
pub fn resize_lanczos(
    src: &DynamicImage,
    new_size: ImageSize,
) -> Result<DynamicImage, ImgprocError> {
    for size in [ImageSize::from([src.width(), src.height()]), new_size] {
        if size.width == 0 || size.height == 0 {
            return Err(ImgprocError::EmptyImage(size));
        }
    }

    let (buffer, pixel_type) = to_u8_buffer(src);

    let src_image =
        fr::images::Image::from_vec_u8(src.width(), src.height(), buffer, pixel_type)?;
    let mut dst_image = fr::images::Image::new(new_size.width, new_size.height, pixel_type);

    let mut resizer = fr::Resizer::new();
    resizer.resize(
        &src_image,
        &mut dst_image,
        &fr::ResizeOptions::new().resize_alg(LANCZOS),
    )?;

    from_u8_buffer(dst_image.buffer().to_vec(), new_size, pixel_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{LumaA, Rgb};

    #[test]
    fn resize_rgb() -> Result<(), ImgprocError> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([10, 200, 30])));
        let resized = resize_lanczos(&image, ImageSize::from([5, 2]))?;

        assert_eq!(resized.width(), 5);
        assert_eq!(resized.height(), 2);
        // a constant image stays constant under a normalized filter
        let rgb = resized.to_rgb8();
        for pixel in rgb.pixels() {
            for (value, expected) in pixel.0.iter().zip([10i32, 200, 30]) {
                assert!((*value as i32 - expected).abs() <= 1, "{:?}", pixel);
            }
        }
        Ok(())
    }

    #[test]
    fn resize_keeps_channel_layout() -> Result<(), ImgprocError> {
        let gray = DynamicImage::ImageLuma8(GrayImage::new(8, 8));
        assert!(matches!(
            resize_lanczos(&gray, ImageSize::from([4, 4]))?,
            DynamicImage::ImageLuma8(_)
        ));

        let gray_alpha =
            DynamicImage::ImageLumaA8(GrayAlphaImage::from_pixel(8, 8, LumaA([5, 255])));
        assert!(matches!(
            resize_lanczos(&gray_alpha, ImageSize::from([2, 2]))?,
            DynamicImage::ImageLumaA8(_)
        ));

        let rgb16 = DynamicImage::ImageRgb16(image::ImageBuffer::new(8, 8));
        assert!(matches!(
            resize_lanczos(&rgb16, ImageSize::from([4, 2]))?,
            DynamicImage::ImageRgb8(_)
        ));
        Ok(())
    }

    #[test]
    fn resize_to_zero_fails() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(matches!(
            resize_lanczos(&image, ImageSize::from([0, 2])),
            Err(ImgprocError::EmptyImage(_))
        ));
    }
}
