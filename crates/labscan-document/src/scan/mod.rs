// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning boundaries: document boundary correction and optical character
// recognition (OCR).

pub mod boundary;
pub mod recognize;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use boundary::BoundaryCorrector;
pub use recognize::RecognitionAdapter;

#[cfg(feature = "ocr")]
pub use ocr::OcrsRecognizer;
