// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversions between `PixelBuffer` and the `image` crate's buffers.

use image::{DynamicImage, RgbaImage};
use labscan_core::PixelBuffer;
use labscan_core::error::{LabscanError, Result};
use tracing::{debug, instrument};

/// Copy a `PixelBuffer` into an `RgbaImage`.
pub fn to_rgba_image(buffer: &PixelBuffer) -> Result<RgbaImage> {
    RgbaImage::from_raw(
        buffer.width(),
        buffer.height(),
        buffer.as_rgba_bytes().to_vec(),
    )
    .ok_or_else(|| {
        LabscanError::invalid_dimensions(
            buffer.width(),
            buffer.height(),
            "sample count does not match dimensions",
        )
    })
}

/// Wrap an `RgbaImage` as a `PixelBuffer`.
pub fn from_rgba_image(image: RgbaImage) -> Result<PixelBuffer> {
    let (width, height) = image.dimensions();
    PixelBuffer::from_raw_rgba(width, height, image.as_raw())
}

/// Convert any decoded image to a `PixelBuffer` (RGBA8).
pub fn from_dynamic(image: &DynamicImage) -> Result<PixelBuffer> {
    from_rgba_image(image.to_rgba8())
}

/// Decode encoded image bytes (JPEG, PNG, TIFF, ...).
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode(data: &[u8]) -> Result<PixelBuffer> {
    let image = image::load_from_memory(data)
        .map_err(|err| LabscanError::ImageError(format!("failed to decode image: {}", err)))?;
    debug!(
        width = image.width(),
        height = image.height(),
        "Image decoded from bytes"
    );
    from_dynamic(&image)
}

/// Encode a `PixelBuffer` as PNG bytes.
pub fn to_png_bytes(buffer: &PixelBuffer) -> Result<Vec<u8>> {
    let rgba = to_rgba_image(buffer)?;
    let mut bytes = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut bytes);
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|err| LabscanError::ImageError(format!("PNG encoding failed: {}", err)))?;
    Ok(bytes)
}
