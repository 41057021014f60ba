// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document boundary correction: find the page quadrilateral in a captured
// frame and warp it flat.
//
// The corrector is picked once from `BoundaryStrategy` when the pipeline is
// assembled. A corrector that cannot find the page returns
// `BoundaryNotFound`; the caller decides whether to fall back to the raw
// frame.

use image::{Rgba, RgbaImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use labscan_core::error::{LabscanError, Result};
use labscan_core::{BoundaryStrategy, PixelBuffer};
use tracing::{debug, info, instrument, warn};

use crate::image::convert::{from_rgba_image, to_rgba_image};

/// Frames smaller than this on either side are never searched.
const MIN_FRAME_SIDE: u32 = 16;

/// Geometric correction of a captured document frame.
pub trait BoundaryCorrector: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Return a new buffer holding only the flattened document, or
    /// [`LabscanError::BoundaryNotFound`].
    fn correct(&self, frame: &PixelBuffer) -> Result<PixelBuffer>;
}

/// Build the corrector for a strategy.
pub fn corrector_for(strategy: BoundaryStrategy) -> Box<dyn BoundaryCorrector> {
    match strategy {
        BoundaryStrategy::Hough => Box::new(HoughCorrector::default()),
        BoundaryStrategy::Disabled => Box::new(DisabledCorrector),
    }
}

/// Never finds a boundary, so frames pass through uncorrected.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCorrector;

impl BoundaryCorrector for DisabledCorrector {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn correct(&self, _frame: &PixelBuffer) -> Result<PixelBuffer> {
        Err(LabscanError::BoundaryNotFound)
    }
}

/// Edge + Hough line based page detection with a projective warp.
///
/// ## Pipeline
///
/// 1. Convert to grayscale
/// 2. Gaussian blur for noise reduction
/// 3. Canny edge detection
/// 4. Hough line detection to find dominant straight edges
/// 5. Split lines into roughly horizontal and roughly vertical
/// 6. Take the outermost line on each side
/// 7. Intersect them into four corners
/// 8. Warp the quadrilateral to a rectangle sized from its edge lengths
#[derive(Debug, Clone)]
pub struct HoughCorrector {
    /// Gaussian blur sigma applied before edge detection.
    pub blur_sigma: f32,
    /// Canny hysteresis thresholds.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Smallest quadrilateral accepted, as a fraction of the frame area.
    pub min_area_ratio: f32,
}

impl Default for HoughCorrector {
    fn default() -> Self {
        Self {
            blur_sigma: 2.0,
            canny_low: 50.0,
            canny_high: 150.0,
            min_area_ratio: 0.10,
        }
    }
}

impl BoundaryCorrector for HoughCorrector {
    fn name(&self) -> &'static str {
        "hough"
    }

    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    fn correct(&self, frame: &PixelBuffer) -> Result<PixelBuffer> {
        let (orig_w, orig_h) = (frame.width(), frame.height());
        if orig_w < MIN_FRAME_SIDE || orig_h < MIN_FRAME_SIDE {
            debug!("Frame too small for boundary detection");
            return Err(LabscanError::BoundaryNotFound);
        }
        let rgba = to_rgba_image(frame)?;

        let gray = image::DynamicImage::ImageRgba8(rgba.clone()).to_luma8();
        let blurred = gaussian_blur_f32(&gray, self.blur_sigma);
        let edges = canny(&blurred, self.canny_low, self.canny_high);
        debug!(sigma = self.blur_sigma, "Edges detected");

        // Vote threshold scales with the image diagonal; the suppression
        // radius removes near-duplicate lines.
        let diagonal = ((orig_w as f64).powi(2) + (orig_h as f64).powi(2)).sqrt();
        let vote_threshold = (diagonal * 0.25).max(80.0) as u32;
        let lines = detect_lines(
            &edges,
            LineDetectionOptions {
                vote_threshold,
                suppression_radius: 8,
            },
        );
        debug!(line_count = lines.len(), vote_threshold, "Hough lines detected");

        let (horizontal, vertical) = classify_lines(&lines);
        if horizontal.len() < 2 || vertical.len() < 2 {
            warn!(
                horizontal = horizontal.len(),
                vertical = vertical.len(),
                "Not enough page edges"
            );
            return Err(LabscanError::BoundaryNotFound);
        }

        let mid = (orig_w as f32 / 2.0, orig_h as f32 / 2.0);
        let edges = PageEdges {
            top: extreme_line(&horizontal, mid, Side::Low).ok_or(LabscanError::BoundaryNotFound)?,
            bottom: extreme_line(&horizontal, mid, Side::High).ok_or(LabscanError::BoundaryNotFound)?,
            left: extreme_line(&vertical, mid, Side::Low).ok_or(LabscanError::BoundaryNotFound)?,
            right: extreme_line(&vertical, mid, Side::High).ok_or(LabscanError::BoundaryNotFound)?,
        };

        let corners = edges.corners().ok_or_else(|| {
            warn!("Page edges do not intersect");
            LabscanError::BoundaryNotFound
        })?;
        debug!(
            top_left = ?corners[0],
            top_right = ?corners[1],
            bottom_right = ?corners[2],
            bottom_left = ?corners[3],
            "Quadrilateral corners computed"
        );

        let quad_area = shoelace_area(&corners);
        let frame_area = orig_w as f32 * orig_h as f32;
        if quad_area < frame_area * self.min_area_ratio {
            warn!(quad_area, frame_area, "Detected quadrilateral too small");
            return Err(LabscanError::BoundaryNotFound);
        }

        let (out_w, out_h) = output_size(&corners, orig_w, orig_h);
        let dest: [(f32, f32); 4] = [
            (0.0, 0.0),
            (out_w as f32, 0.0),
            (out_w as f32, out_h as f32),
            (0.0, out_h as f32),
        ];
        let projection =
            Projection::from_control_points(corners, dest).ok_or(LabscanError::BoundaryNotFound)?;

        let mut output = RgbaImage::new(out_w, out_h);
        warp_into(
            &rgba,
            &projection,
            Interpolation::Bilinear,
            Rgba([255, 255, 255, 255]),
            &mut output,
        );

        info!(out_w, out_h, "Document boundary corrected");
        from_rgba_image(output)
    }
}

// -- Geometry helpers ---------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Side {
    /// Top for horizontal lines, left for vertical ones.
    Low,
    /// Bottom for horizontal lines, right for vertical ones.
    High,
}

struct PageEdges {
    top: PolarLine,
    bottom: PolarLine,
    left: PolarLine,
    right: PolarLine,
}

impl PageEdges {
    /// `[top_left, top_right, bottom_right, bottom_left]`.
    fn corners(&self) -> Option<[(f32, f32); 4]> {
        Some([
            intersect_polar_lines(&self.top, &self.left)?,
            intersect_polar_lines(&self.top, &self.right)?,
            intersect_polar_lines(&self.bottom, &self.right)?,
            intersect_polar_lines(&self.bottom, &self.left)?,
        ])
    }
}

/// Split lines into roughly horizontal and roughly vertical ones.
///
/// A `PolarLine` satisfies `x·cos θ + y·sin θ = r`, so θ near 90° is a
/// horizontal line and θ near 0° or 180° a vertical one. Diagonals are
/// dropped.
fn classify_lines(lines: &[PolarLine]) -> (Vec<PolarLine>, Vec<PolarLine>) {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();
    for line in lines {
        let angle = line.angle_in_degrees;
        if (60..=120).contains(&angle) {
            horizontal.push(*line);
        } else if angle <= 30 || angle >= 150 {
            vertical.push(*line);
        }
    }
    (horizontal, vertical)
}

/// Where a line crosses the frame's centre column (horizontal lines) or
/// centre row (vertical lines).
fn line_position(line: &PolarLine, mid: (f32, f32)) -> Option<f32> {
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (sin, cos) = theta.sin_cos();
    if (60..=120).contains(&line.angle_in_degrees) {
        (sin.abs() > 1e-6).then(|| (line.r - mid.0 * cos) / sin)
    } else {
        (cos.abs() > 1e-6).then(|| (line.r - mid.1 * sin) / cos)
    }
}

fn extreme_line(lines: &[PolarLine], mid: (f32, f32), side: Side) -> Option<PolarLine> {
    let positioned = lines
        .iter()
        .filter_map(|line| line_position(line, mid).map(|pos| (pos, *line)));
    let pick = match side {
        Side::Low => positioned.min_by(|a, b| a.0.total_cmp(&b.0)),
        Side::High => positioned.max_by(|a, b| a.0.total_cmp(&b.0)),
    };
    pick.map(|(_, line)| line)
}

/// Intersection of two lines in polar (Hough) form, or `None` if they are
/// (nearly) parallel.
fn intersect_polar_lines(a: &PolarLine, b: &PolarLine) -> Option<(f32, f32)> {
    let (sin_a, cos_a) = (a.angle_in_degrees as f64).to_radians().sin_cos();
    let (sin_b, cos_b) = (b.angle_in_degrees as f64).to_radians().sin_cos();

    let denom = cos_a * sin_b - sin_a * cos_b;
    if denom.abs() < 1e-6 {
        return None;
    }

    let (r_a, r_b) = (a.r as f64, b.r as f64);
    let x = (r_a * sin_b - r_b * sin_a) / denom;
    let y = (r_b * cos_a - r_a * cos_b) / denom;
    Some((x as f32, y as f32))
}

/// Area of a quadrilateral with vertices in order (CW or CCW).
fn shoelace_area(corners: &[(f32, f32); 4]) -> f32 {
    let mut area = 0.0f32;
    for i in 0..corners.len() {
        let j = (i + 1) % corners.len();
        area += corners[i].0 * corners[j].1 - corners[j].0 * corners[i].1;
    }
    area.abs() / 2.0
}

/// Output rectangle: the longer of each pair of opposite edges, capped at
/// twice the frame size.
fn output_size(corners: &[(f32, f32); 4], frame_w: u32, frame_h: u32) -> (u32, u32) {
    let dist = |a: (f32, f32), b: (f32, f32)| ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
    let [tl, tr, br, bl] = *corners;
    let width = dist(tl, tr).max(dist(bl, br)).round();
    let height = dist(tl, bl).max(dist(tr, br)).round();
    let clamp = |value: f32, limit: u32| -> u32 { (value as u32).clamp(1, limit.saturating_mul(2)) };
    (clamp(width, frame_w), clamp(height, frame_h))
}

// -- Tests --------------------------------------------------------------------
