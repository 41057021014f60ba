// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// labscan-document — Post-capture processing for lab report photos.
//
// Provides image enhancement (upscale, sharpen, contrast stretch), document
// boundary correction, the recognition engine boundary (with an `ocrs`
// backend behind the "ocr" feature), and heuristic indicator extraction from
// recognized text.

pub mod extract;
pub mod image;
pub mod scan;

// Re-export the primary structs so callers can use `labscan_document::ImageEnhancer` etc.
pub use extract::{FieldExtractor, IndicatorSpec};
pub use crate::image::enhance::ImageEnhancer;
pub use scan::boundary::{BoundaryCorrector, corrector_for};
pub use scan::recognize::{EngineReadiness, ReadyOutcome, RecognitionAdapter, RecognitionRequest};

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrsRecognizer;
