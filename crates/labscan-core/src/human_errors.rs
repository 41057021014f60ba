// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the person holding the camera.
//
// Every technical error is mapped to a plain sentence and a suggestion.
// Presentation decides how to show them; nothing here pops up on its own.

use crate::error::LabscanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Wait a moment and try the same thing again.
    Transient,
    /// User must do something (grant permission, improve lighting).
    ActionRequired,
    /// Cannot be fixed by retrying.
    Permanent,
}

/// A human-readable error with plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether repeating the action can succeed.
    pub retriable: bool,
    /// Severity level (drives presentation).
    pub severity: Severity,
}

/// Convert a `LabscanError` into a `HumanError`.
pub fn humanize_error(err: &LabscanError) -> HumanError {
    match err {
        // -- Capture device --
        LabscanError::PermissionDenied => HumanError {
            message: "We couldn't open the camera.".into(),
            suggestion: "Check that this app is allowed to use the camera, then open the scanner again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LabscanError::DeviceUnavailable(_) => HumanError {
            message: "No camera was found.".into(),
            suggestion: "Make sure a camera is connected and not in use by another app, then open the scanner again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Engines --
        LabscanError::EngineNotReady(_) => HumanError {
            message: "The scanner is still getting ready.".into(),
            suggestion: "Wait a few seconds and press capture again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        LabscanError::BoundaryNotFound => HumanError {
            message: "We couldn't find the edges of the page.".into(),
            suggestion: "The photo was used as taken. For better results, place the report on a dark surface with all four corners visible.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        LabscanError::OcrError(_) => HumanError {
            message: "Text recognition didn't work on this photo.".into(),
            suggestion: "Try again with better lighting, holding the camera steady and parallel to the page.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Pixels --
        LabscanError::InvalidDimensions { .. } | LabscanError::ImageError(_) => HumanError {
            message: "That photo couldn't be processed.".into(),
            suggestion: "Take the photo again. The scanner is still ready for another capture.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Session --
        LabscanError::InvalidTransition { action, .. } => HumanError {
            message: format!("You can't {action} right now."),
            suggestion: "Wait for the current step to finish, or reopen the scanner.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        LabscanError::NothingToSave => HumanError {
            message: "There is nothing to save yet.".into(),
            suggestion: "Capture a report first, then save the results.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Storage --
        LabscanError::Config(detail) => HumanError {
            message: "The scanner settings aren't valid.".into(),
            suggestion: format!("Fix the configuration file or reset it to the defaults. (Detail: {detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LabscanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to read that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        LabscanError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        LabscanError::PlatformUnavailable => HumanError {
            message: "This feature isn't available on your device.".into(),
            suggestion: "Load a photo of the report from a file instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
