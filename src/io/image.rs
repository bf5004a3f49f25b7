//! PNG import and export at the application boundary

use std::path::Path;

use image::{ImageBuffer, Rgba};

use crate::io::error::{Result, SynthesisError};
use crate::io::pixels::{CHANNELS, PixelBuffer};

/// Load a PNG as normalized RGBA samples
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded
pub fn load_png(path: &Path) -> Result<PixelBuffer> {
    let img = image::open(path)
        .map_err(|e| SynthesisError::ImageLoad {
            path: path.to_path_buf(),
            source: e,
        })?
        .to_rgba8();
    let (width, height) = img.dimensions();
    PixelBuffer::from_rgba8(img.as_raw(), width, height)
}

/// Quantize `buffer` to RGBA8 and write it as PNG
///
/// Missing parent directories are created.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the image cannot
/// be encoded or written
pub fn save_png(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SynthesisError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(buffer.width(), buffer.height(), buffer.to_rgba8()).ok_or_else(
            || SynthesisError::LengthMismatch {
                expected: buffer.pixel_count() * CHANNELS,
                actual: buffer.data().len(),
            },
        )?;

    img.save(path).map_err(|e| SynthesisError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Repeat `buffer` in a `repeat_x x repeat_y` grid to inspect its seams
///
/// # Errors
///
/// Returns an error if a repeat count is zero or the result is too large
pub fn tile_preview(buffer: &PixelBuffer, repeat_x: u32, repeat_y: u32) -> Result<PixelBuffer> {
    let (width, height) = (buffer.width(), buffer.height());
    let out_width = width
        .checked_mul(repeat_x)
        .ok_or_else(|| crate::io::error::invalid_geometry("repeat_x", &repeat_x, &"too large"))?;
    let out_height = height
        .checked_mul(repeat_y)
        .ok_or_else(|| crate::io::error::invalid_geometry("repeat_y", &repeat_y, &"too large"))?;

    let row_len = width as usize * CHANNELS;
    let mut data = Vec::with_capacity(out_width as usize * out_height as usize * CHANNELS);
    for _ in 0..repeat_y {
        for row in buffer.data().chunks_exact(row_len) {
            for _ in 0..repeat_x {
                data.extend_from_slice(row);
            }
        }
    }
    PixelBuffer::new(data, out_width, out_height)
}
