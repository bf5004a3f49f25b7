//! Pixel buffers, errors, configuration and the application boundary

/// Command-line interface and batch file processing
pub mod cli;
/// Named constants and defaults
pub mod configuration;
/// Error type shared by every module
pub mod error;
/// PNG import, export and tiling previews
pub mod image;
/// RGBA sample buffers
pub mod pixels;
/// Terminal progress display
pub mod progress;

pub use pixels::PixelBuffer;
