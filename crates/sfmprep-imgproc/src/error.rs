/// An error type for the imgproc module.
#[derive(thiserror::Error, Debug)]
pub enum ImgprocError {
    /// Error when the file does not exist.
    #[error("File does not exist: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Error to open or create the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Error to decode or encode the image.
    #[error("Failed to decode or encode the image. {0}")]
    ImageError(#[from] image::ImageError),

    /// Error to wrap a pixel buffer for resizing.
    #[error("Invalid pixel buffer. {0}")]
    BufferError(#[from] fast_image_resize::ImageBufferError),

    /// Error while resizing.
    #[error("Failed to resize the image. {0}")]
    ResizeError(#[from] fast_image_resize::ResizeError),

    /// The image is too small for the requested downsampling factor.
    #[error("Image of size {0} cannot be downsampled by {1}")]
    InvalidScale(crate::ImageSize, u32),

    /// The image has no pixels.
    #[error("Image of size {0} is empty")]
    EmptyImage(crate::ImageSize),

    /// The resized buffer does not match the requested size.
    #[error("Resized buffer does not match size {0}")]
    BufferSizeMismatch(crate::ImageSize),
}
