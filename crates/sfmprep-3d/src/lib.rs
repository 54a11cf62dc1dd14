#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// I/O utilities for writing 3D data.
pub mod io;

/// Point cloud container.
pub mod pointcloud;
