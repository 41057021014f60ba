// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-session mutable state.

use labscan_bridge::StreamHandle;
use labscan_core::FieldMapping;

/// Results and resources owned by one capture session.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Replaced wholesale by each applied recognition.
    pub current_fields: FieldMapping,
    /// Replaced wholesale by each save.
    pub saved_fields: FieldMapping,
    /// `None` before acquisition and after release.
    pub device_handle: Option<StreamHandle>,
    /// Newest generation token; only results carrying it are applied.
    latest_generation: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the token for a newly initiated capture.
    pub fn issue_generation(&mut self) -> u64 {
        self.latest_generation += 1;
        self.latest_generation
    }

    /// Make every outstanding token stale.
    pub fn invalidate_generations(&mut self) {
        self.latest_generation += 1;
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    pub fn is_latest(&self, generation: u64) -> bool {
        generation == self.latest_generation
    }
}
