// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: PixelBuffer conversions and legibility enhancement.

pub mod convert;
pub mod enhance;

pub use enhance::ImageEnhancer;
