// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Labscan capture pipeline.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::error::{LabscanError, Result};

/// Key under which the verbatim recognized text is stored in a [`FieldMapping`].
pub const RAW_TEXT_KEY: &str = "_raw_text";

/// Unique identifier for a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which camera to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Rear camera, pointed at the document.
    #[default]
    Environment,
    /// Front (selfie) camera.
    User,
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Environment => f.write_str("environment"),
            Facing::User => f.write_str("user"),
        }
    }
}

/// Page segmentation hint passed to the recognition engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Let the engine lay out the page on its own.
    #[default]
    Auto,
    /// Treat the page as one block and emit one line of text per detected line.
    SingleBlock,
}

/// How the captured frame is geometrically corrected.
///
/// Chosen once when the pipeline is assembled, never re-probed per capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryStrategy {
    /// Edge detection + Hough lines + projective warp.
    #[default]
    Hough,
    /// Skip correction; frames pass through as captured.
    Disabled,
}

/// Optional black-and-white pass run after the contrast stretch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Binarization {
    /// Keep the stretched colour frame.
    #[default]
    Off,
    /// Histogram equalization, then a global threshold (brighter becomes white).
    Fixed { threshold: u8 },
    /// Global threshold chosen from the histogram with Otsu's method.
    Otsu,
    /// Local mean threshold over a `(2r + 1)` square block.
    Adaptive { block_radius: u32 },
}

impl Binarization {
    /// Equalize then threshold at 150.
    pub const DEFAULT_FIXED: Binarization = Binarization::Fixed { threshold: 150 };

    /// Local mean over a 31x31 block.
    pub const DEFAULT_ADAPTIVE: Binarization = Binarization::Adaptive { block_radius: 15 };
}

/// Classification of errors for the propagation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Camera refused or missing. Fatal to the session attempt, no retry.
    DeviceError,
    /// An external engine is still initialising; retry once it is ready.
    EngineNotReady,
    /// Document boundary not found; the pipeline continues uncorrected.
    CorrectionFailure,
    /// Fatal to a single pipeline run; the session stays usable.
    RunFatal,
    /// The caller asked for something the session cannot do right now.
    Usage,
    /// Storage or configuration trouble.
    Internal,
}

// ---------------------------------------------------------------------------
// PixelBuffer
// ---------------------------------------------------------------------------

/// An RGBA image: `width * height` samples in row-major order.
///
/// Immutable once built. Every pipeline stage that changes pixels produces a
/// new buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    samples: Vec<[u8; 4]>,
}

impl PixelBuffer {
    /// Build a buffer, checking that both dimensions are non-zero and that
    /// `samples` holds exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, samples: Vec<[u8; 4]>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(LabscanError::invalid_dimensions(
                width,
                height,
                "width and height must be non-zero",
            ));
        }
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(LabscanError::invalid_dimensions(
                width,
                height,
                format!("expected {expected} samples, got {}", samples.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Build a buffer from interleaved RGBA bytes (4 bytes per pixel).
    pub fn from_raw_rgba(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(LabscanError::invalid_dimensions(
                width,
                height,
                format!("{} bytes is not a whole number of RGBA pixels", bytes.len()),
            ));
        }
        let samples = bytes
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
            .collect();
        Self::new(width, height, samples)
    }

    /// A buffer where every pixel has the same value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let count = width as usize * height as usize;
        Self::new(width, height, vec![rgba; count])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixel at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.samples
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// All samples in row-major order.
    pub fn samples(&self) -> &[[u8; 4]] {
        &self.samples
    }

    /// Interleaved RGBA bytes, e.g. for handing to an image codec.
    pub fn as_rgba_bytes(&self) -> &[u8] {
        self.samples.as_flattened()
    }

    pub fn into_samples(self) -> Vec<[u8; 4]> {
        self.samples
    }
}

// ---------------------------------------------------------------------------
// FieldMapping
// ---------------------------------------------------------------------------

/// Extracted indicator values in presentation order, plus the raw text they
/// were read from.
///
/// Values keep the decimal separator exactly as recognized (`"5,2"` stays
/// `"5,2"`). An indicator that was not found simply has no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<(String, String)>,
    raw_text: Option<String>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty mapping carrying only the recognized text.
    pub fn with_raw_text(raw_text: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            raw_text: Some(raw_text.into()),
        }
    }

    /// Set an indicator value. An existing entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn set_raw_text(&mut self, raw_text: impl Into<String>) {
        self.raw_text = Some(raw_text.into());
    }

    /// Look up an indicator, or the raw text under [`RAW_TEXT_KEY`].
    pub fn get(&self, key: &str) -> Option<&str> {
        if key == RAW_TEXT_KEY {
            return self.raw_text.as_deref();
        }
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn raw_text(&self) -> Option<&str> {
        self.raw_text.as_deref()
    }

    /// Indicator entries in order, without the raw text.
    pub fn indicators(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of indicator entries. The raw text is not counted.
    pub fn indicator_count(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no indicators and no raw text.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.raw_text.is_none()
    }

    /// A copy holding only the indicators whose names appear in `known`,
    /// without the raw text.
    pub fn restricted_to<'a, I>(&self, known: I) -> FieldMapping
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: Vec<&str> = known.into_iter().collect();
        FieldMapping {
            entries: self
                .entries
                .iter()
                .filter(|(name, _)| known.contains(&name.as_str()))
                .cloned()
                .collect(),
            raw_text: None,
        }
    }
}

impl Serialize for FieldMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = self.entries.len() + usize::from(self.raw_text.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        if let Some(raw) = &self.raw_text {
            map.serialize_entry(RAW_TEXT_KEY, raw)?;
        }
        map.end()
    }
}
