#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the image processing module.
pub mod error;

/// Image reading and writing.
pub mod io;

/// Multi-resolution downsampling.
pub mod pyramid;

/// Image resizing.
pub mod resize;

pub use error::ImgprocError;

/// Image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: u32,
    /// Height of the image in pixels
    pub height: u32,
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<[u32; 2]> for ImageSize {
    fn from(size: [u32; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}
