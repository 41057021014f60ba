// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// labscan-session — Orchestrates one capture session: device lifecycle,
// correct → enhance → recognize → extract, and the current/saved results.

pub mod controller;
pub mod phase;
pub mod state;

pub use controller::{Applied, CaptureReport, CaptureSessionController, PendingCapture, RecognitionOutcome};
pub use labscan_document::{EngineReadiness, ReadyOutcome};
pub use phase::SessionPhase;
pub use state::SessionState;
