// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Legibility enhancement for captured report pages: upscale, 3x3 sharpen,
// and a two-level contrast stretch that pushes paper towards white and ink
// towards black before recognition. An optional binarization pass follows.

use image::imageops::FilterType;
use image::{GrayImage, ImageBuffer, Rgba, RgbaImage};
use imageproc::contrast::{ThresholdType, adaptive_threshold, equalize_histogram, otsu_level, threshold};
use labscan_core::error::{LabscanError, Result};
use labscan_core::{Binarization, PixelBuffer};
use tracing::{debug, info, instrument};

use super::convert::{from_rgba_image, to_rgba_image};

/// Sharpening kernel applied to R, G and B.
const SHARPEN_KERNEL: [[i32; 3]; 3] = [[0, -1, 0], [-1, 5, -1], [0, -1, 0]];

/// Pixels brighter than this mean luminance are treated as paper.
const LUMINANCE_PIVOT: f32 = 128.0;

/// Gain applied to paper pixels.
const BRIGHT_GAIN: f32 = 1.4;

/// Gain applied to ink pixels.
const DARK_GAIN: f32 = 0.6;

/// Largest upscaled frame accepted, in pixels (1 GiB of RGBA).
pub const MAX_OUTPUT_PIXELS: u64 = 1 << 28;

/// Enhances captured document frames for text recognition.
///
/// The pipeline is fixed:
///
/// 1. Upscale by `scale` with a bilinear filter
/// 2. Sharpen with a 3x3 kernel (borders pass through)
/// 3. Contrast stretch around a luminance of 128
/// 4. Binarize, when a [`Binarization`] mode other than `Off` is set
///
/// Enhancement never mutates its input and is fully deterministic.
#[derive(Debug, Clone, Copy)]
pub struct ImageEnhancer {
    scale: f32,
    binarization: Binarization,
}

impl ImageEnhancer {
    /// Create an enhancer with the given upscale factor (`>= 1`).
    pub fn new(scale: f32) -> Result<Self> {
        check_scale(scale)?;
        Ok(Self {
            scale,
            binarization: Binarization::Off,
        })
    }

    /// Add a black-and-white pass after the contrast stretch.
    pub fn with_binarization(mut self, binarization: Binarization) -> Result<Self> {
        check_binarization(binarization)?;
        self.binarization = binarization;
        Ok(self)
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn binarization(&self) -> Binarization {
        self.binarization
    }

    /// Run the full pipeline over `input`.
    #[instrument(skip_all, fields(width = input.width(), height = input.height(), scale = self.scale))]
    pub fn enhance(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        let stretched = enhance(input, self.scale)?;
        if self.binarization == Binarization::Off {
            return Ok(stretched);
        }
        let binary = binarize(&to_rgba_image(&stretched)?, self.binarization);
        from_rgba_image(binary)
    }
}

impl Default for ImageEnhancer {
    fn default() -> Self {
        Self {
            scale: 2.0,
            binarization: Binarization::Off,
        }
    }
}

/// Upscale, sharpen and contrast-stretch `input`, returning a new buffer of
/// the upscaled size.
pub fn enhance(input: &PixelBuffer, scale: f32) -> Result<PixelBuffer> {
    check_scale(scale)?;
    let (width, height) = scaled_dimensions(input.width(), input.height(), scale)?;

    info!(
        from_w = input.width(),
        from_h = input.height(),
        to_w = width,
        to_h = height,
        "Enhancing frame"
    );

    let source = to_rgba_image(input)?;
    let upscaled = upscale(&source, width, height);
    let sharpened = sharpen(&upscaled);
    let stretched = contrast_stretch(&sharpened);

    debug!("Enhancement complete");
    from_rgba_image(stretched)
}

/// Resample to exactly `width` x `height` with a bilinear (triangle) filter.
#[instrument(skip(image))]
pub fn upscale(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    image::imageops::resize(image, width, height, FilterType::Triangle)
}

/// Convolve R, G and B with [`SHARPEN_KERNEL`].
///
/// Every output value is computed from `source` only, so no sharpened pixel
/// feeds into its neighbour. Border pixels are copied through unchanged.
#[instrument(skip(source), fields(width = source.width(), height = source.height()))]
pub fn sharpen(source: &RgbaImage) -> RgbaImage {
    let (width, height) = source.dimensions();
    let mut output = source.clone();

    if width < 3 || height < 3 {
        debug!("Frame too small for an interior; sharpening is a no-op");
        return output;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sums = [0i32; 3];
            for (ky, row) in SHARPEN_KERNEL.iter().enumerate() {
                for (kx, &weight) in row.iter().enumerate() {
                    if weight == 0 {
                        continue;
                    }
                    let px = source.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1).0;
                    for (sum, &channel) in sums.iter_mut().zip(px.iter()) {
                        *sum += weight * channel as i32;
                    }
                }
            }

            let alpha = source.get_pixel(x, y).0[3];
            output.put_pixel(
                x,
                y,
                Rgba([
                    sums[0].clamp(0, 255) as u8,
                    sums[1].clamp(0, 255) as u8,
                    sums[2].clamp(0, 255) as u8,
                    alpha,
                ]),
            );
        }
    }

    output
}

/// Brighten pixels whose mean luminance exceeds 128 by 1.4x and darken the
/// rest by 0.6x. Alpha is left alone.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn contrast_stretch(image: &RgbaImage) -> RgbaImage {
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        Rgba(stretch_pixel(image.get_pixel(x, y).0))
    })
}

/// Contrast stretch for a single RGBA pixel.
pub fn stretch_pixel([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let luminance = (r as f32 + g as f32 + b as f32) / 3.0;
    let gain = if luminance > LUMINANCE_PIVOT {
        BRIGHT_GAIN
    } else {
        DARK_GAIN
    };
    let adjust = |channel: u8| -> u8 { (channel as f32 * gain).round().clamp(0.0, 255.0) as u8 };
    [adjust(r), adjust(g), adjust(b), a]
}

/// Reduce `image` to pure black and white. Alpha is kept; colour is dropped.
///
/// `Fixed` equalizes the histogram first so the threshold lands between ink
/// and paper on dim captures. `Off` returns a copy.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn binarize(image: &RgbaImage, mode: Binarization) -> RgbaImage {
    let gray = || -> GrayImage { image::imageops::grayscale(image) };
    let binary = match mode {
        Binarization::Off => return image.clone(),
        Binarization::Fixed { threshold: level } => {
            threshold(&equalize_histogram(&gray()), level, ThresholdType::Binary)
        }
        Binarization::Otsu => {
            let gray = gray();
            let level = otsu_level(&gray);
            debug!(level, "Otsu level computed");
            threshold(&gray, level, ThresholdType::Binary)
        }
        Binarization::Adaptive { block_radius } => adaptive_threshold(&gray(), block_radius.max(1)),
    };
    info!(?mode, "Frame binarized");

    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let value = binary.get_pixel(x, y).0[0];
        Rgba([value, value, value, image.get_pixel(x, y).0[3]])
    })
}

fn check_binarization(mode: Binarization) -> Result<()> {
    if let Binarization::Adaptive { block_radius: 0 } = mode {
        return Err(LabscanError::invalid_dimensions(
            0,
            0,
            "adaptive binarization needs a block radius of at least 1",
        ));
    }
    Ok(())
}

fn check_scale(scale: f32) -> Result<()> {
    if !scale.is_finite() || scale < 1.0 {
        return Err(LabscanError::invalid_dimensions(
            0,
            0,
            format!("scale must be a finite number >= 1, got {scale}"),
        ));
    }
    Ok(())
}

fn scaled_dimensions(width: u32, height: u32, scale: f32) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(LabscanError::invalid_dimensions(
            width,
            height,
            "width and height must be non-zero",
        ));
    }
    let scaled = |side: u32| -> Option<u32> {
        let value = (side as f64 * scale as f64).round();
        (value <= u32::MAX as f64).then_some((value as u32).max(1))
    };
    let too_large = || {
        LabscanError::invalid_dimensions(
            width,
            height,
            format!("scaling by {scale} exceeds the limit of {MAX_OUTPUT_PIXELS} output pixels"),
        )
    };
    let (Some(w), Some(h)) = (scaled(width), scaled(height)) else {
        return Err(too_large());
    };
    let pixels = (w as u64).checked_mul(h as u64).ok_or_else(too_large)?;
    let bytes = pixels.checked_mul(4).ok_or_else(too_large)?;
    if pixels > MAX_OUTPUT_PIXELS || usize::try_from(bytes).is_err() {
        return Err(too_large());
    }
    Ok((w, h))
}

// -- Tests --------------------------------------------------------------------
