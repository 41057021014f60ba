// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Labscan.

use thiserror::Error;

use crate::types::ErrorClass;

/// Top-level error type for all Labscan operations.
#[derive(Debug, Error)]
pub enum LabscanError {
    // -- Capture device --
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    // -- External engines --
    #[error("engine not ready: {0}")]
    EngineNotReady(String),

    #[error("no document boundary found")]
    BoundaryNotFound,

    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Pixel data --
    #[error("invalid image dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Session --
    #[error("cannot {action} while session is {phase}")]
    InvalidTransition { phase: String, action: String },

    #[error("no recognition result to save")]
    NothingToSave,

    // -- Storage / configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl LabscanError {
    /// Shorthand for an [`LabscanError::InvalidDimensions`] error.
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Where this error sits in the propagation policy.
    pub fn class(&self) -> ErrorClass {
        match self {
            LabscanError::PermissionDenied
            | LabscanError::DeviceUnavailable(_)
            | LabscanError::PlatformUnavailable => ErrorClass::DeviceError,

            LabscanError::EngineNotReady(_) => ErrorClass::EngineNotReady,

            LabscanError::BoundaryNotFound => ErrorClass::CorrectionFailure,

            LabscanError::InvalidDimensions { .. }
            | LabscanError::ImageError(_)
            | LabscanError::OcrError(_) => ErrorClass::RunFatal,

            LabscanError::InvalidTransition { .. } | LabscanError::NothingToSave => {
                ErrorClass::Usage
            }

            LabscanError::Config(_) | LabscanError::Io(_) | LabscanError::Serialization(_) => {
                ErrorClass::Internal
            }
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LabscanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_errors_are_session_fatal() {
        assert_eq!(LabscanError::PermissionDenied.class(), ErrorClass::DeviceError);
        assert_eq!(
            LabscanError::DeviceUnavailable("no camera".into()).class(),
            ErrorClass::DeviceError
        );
    }

    #[test]
    fn invalid_dimensions_only_aborts_the_run() {
        let err = LabscanError::invalid_dimensions(0, 10, "width is zero");
        assert_eq!(err.class(), ErrorClass::RunFatal);
        assert_eq!(
            err.to_string(),
            "invalid image dimensions 0x10: width is zero"
        );
    }

    #[test]
    fn missing_boundary_is_recovered_locally() {
        assert_eq!(
            LabscanError::BoundaryNotFound.class(),
            ErrorClass::CorrectionFailure
        );
    }
}
