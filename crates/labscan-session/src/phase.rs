// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture session phases.

use serde::{Deserialize, Serialize};

/// Where a session is in its lifecycle.
///
/// `Idle → DeviceAcquiring → DeviceReady → Capturing → Correcting → Enhancing
/// → Recognizing → Extracted → DeviceReady`, with `Released` reachable from
/// anywhere and terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    DeviceAcquiring,
    DeviceReady,
    Capturing,
    Correcting,
    Enhancing,
    /// Waiting on the recognition engine. The device stays held.
    Recognizing,
    Extracted,
    Released,
}

impl SessionPhase {
    /// Whether a new capture may start. A second capture is allowed while an
    /// earlier one is still being recognized.
    pub fn accepts_capture(self) -> bool {
        matches!(
            self,
            SessionPhase::DeviceReady | SessionPhase::Recognizing | SessionPhase::Extracted
        )
    }

    pub fn is_released(self) -> bool {
        self == SessionPhase::Released
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::DeviceAcquiring => "device acquiring",
            SessionPhase::DeviceReady => "device ready",
            SessionPhase::Capturing => "capturing",
            SessionPhase::Correcting => "correcting",
            SessionPhase::Enhancing => "enhancing",
            SessionPhase::Recognizing => "recognizing",
            SessionPhase::Extracted => "extracted",
            SessionPhase::Released => "released",
        };
        f.write_str(name)
    }
}
