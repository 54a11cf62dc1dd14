#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Configuration of a preparation run.
pub mod config;

/// Error types for the preparation pipeline.
pub mod error;

/// Paths of the data directory.
pub mod layout;

/// The preparation stages.
pub mod pipeline;

mod progress;

pub use config::{PrepareConfig, UndistortSelection};
pub use error::PrepareError;
pub use layout::Layout;
pub use pipeline::{Preparation, PrepareSummary};
