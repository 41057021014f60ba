// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{LabscanError, Result};
use crate::types::{Binarization, BoundaryStrategy, Facing, SegmentationMode};

/// Persistent pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Camera to open when a session starts.
    pub facing: Facing,
    /// Upscale factor applied before sharpening (must be >= 1).
    pub upscale_factor: f32,
    /// Black-and-white pass after the contrast stretch.
    pub binarization: Binarization,
    /// Language codes passed to the recognition engine.
    pub languages: Vec<String>,
    /// Page segmentation hint for the recognition engine.
    pub segmentation: SegmentationMode,
    /// Document boundary correction strategy.
    pub boundary: BoundaryStrategy,
    /// How long to wait for the recognition engine to finish loading.
    pub engine_ready_timeout_secs: u64,
    /// Characters searched after an indicator label when no dedicated
    /// pattern matched.
    pub value_window_chars: usize,
    /// Directory holding the OCR model files. `None` uses the engine's cache.
    pub model_dir: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            facing: Facing::Environment,
            upscale_factor: 2.0,
            binarization: Binarization::Off,
            languages: vec!["vie".into(), "eng".into()],
            segmentation: SegmentationMode::Auto,
            boundary: BoundaryStrategy::Hough,
            engine_ready_timeout_secs: 10,
            value_window_chars: 100,
            model_dir: None,
        }
    }
}

impl ScanConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !self.upscale_factor.is_finite() || self.upscale_factor < 1.0 {
            return Err(LabscanError::Config(format!(
                "upscale_factor must be a finite number >= 1, got {}",
                self.upscale_factor
            )));
        }
        if let Binarization::Adaptive { block_radius: 0 } = self.binarization {
            return Err(LabscanError::Config(
                "adaptive binarization needs a block_radius of at least 1".into(),
            ));
        }
        if self.value_window_chars == 0 {
            return Err(LabscanError::Config(
                "value_window_chars must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn engine_ready_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.engine_ready_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ScanConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn upscale_below_one_is_rejected() {
        let config = ScanConfig {
            upscale_factor: 0.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LabscanError::Config(_))));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: ScanConfig =
            serde_json::from_str(r#"{ "upscale_factor": 3.0, "boundary": "disabled" }"#)
                .expect("parse");
        assert_eq!(config.upscale_factor, 3.0);
        assert_eq!(config.boundary, BoundaryStrategy::Disabled);
        assert_eq!(config.value_window_chars, 100);
        assert_eq!(config.languages, vec!["vie".to_string(), "eng".to_string()]);
        assert_eq!(config.binarization, Binarization::Off);
    }

    #[test]
    fn binarization_is_tagged_by_mode() {
        let config: ScanConfig = serde_json::from_str(
            r#"{ "binarization": { "mode": "fixed", "threshold": 150 } }"#,
        )
        .expect("parse");
        assert_eq!(config.binarization, Binarization::DEFAULT_FIXED);

        let otsu: ScanConfig =
            serde_json::from_str(r#"{ "binarization": { "mode": "otsu" } }"#).expect("parse");
        assert_eq!(otsu.binarization, Binarization::Otsu);
    }

    #[test]
    fn zero_adaptive_radius_is_rejected() {
        let config = ScanConfig {
            binarization: Binarization::Adaptive { block_radius: 0 },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LabscanError::Config(_))));
    }
}
