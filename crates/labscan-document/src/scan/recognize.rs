// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition engine boundary and its readiness signal.
//
// Engines load models in the background. Callers either check `is_ready()`
// and refuse the action, or await `wait(timeout)` once for a typed outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use labscan_core::error::{LabscanError, Result};
use labscan_core::{PixelBuffer, SegmentationMode};
use tokio::sync::watch;
use tracing::debug;

/// Options passed with every recognition call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    /// Language codes, e.g. `["vie", "eng"]`.
    pub languages: Vec<String>,
    pub segmentation: SegmentationMode,
}

impl Default for RecognitionRequest {
    fn default() -> Self {
        Self {
            languages: vec!["vie".into(), "eng".into()],
            segmentation: SegmentationMode::Auto,
        }
    }
}

/// An OCR engine: pixels in, raw text out. No partial results.
pub trait RecognitionAdapter: Send + Sync + 'static {
    fn readiness(&self) -> &EngineReadiness;

    fn recognize(
        &self,
        buffer: PixelBuffer,
        request: RecognitionRequest,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Lifecycle of an engine's initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Loading,
    Ready,
    Failed(String),
}

/// Result of waiting for an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyOutcome {
    Ready,
    TimedOut,
    Failed(String),
}

impl ReadyOutcome {
    /// `Ok(())` when ready, otherwise `EngineNotReady`.
    pub fn into_result(self) -> Result<()> {
        match self {
            ReadyOutcome::Ready => Ok(()),
            ReadyOutcome::TimedOut => Err(LabscanError::EngineNotReady(
                "timed out waiting for the recognition engine".into(),
            )),
            ReadyOutcome::Failed(reason) => Err(LabscanError::EngineNotReady(reason)),
        }
    }
}

/// Shared readiness flag. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct EngineReadiness {
    tx: Arc<watch::Sender<EngineState>>,
}

impl EngineReadiness {
    /// A signal in the `Loading` state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(EngineState::Loading);
        Self { tx: Arc::new(tx) }
    }

    /// A signal that is ready from the start.
    pub fn ready() -> Self {
        let readiness = Self::new();
        readiness.mark_ready();
        readiness
    }

    pub fn mark_ready(&self) {
        self.tx.send_replace(EngineState::Ready);
        debug!("Recognition engine ready");
    }

    pub fn mark_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(%reason, "Recognition engine failed to initialize");
        self.tx.send_replace(EngineState::Failed(reason));
    }

    pub fn state(&self) -> EngineState {
        self.tx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.tx.borrow(), EngineState::Ready)
    }

    /// Wait until the engine leaves `Loading`, at most `timeout`.
    pub async fn wait(&self, timeout: Duration) -> ReadyOutcome {
        let mut rx = self.tx.subscribe();
        let settled = tokio::time::timeout(timeout, async move {
            rx.wait_for(|state| *state != EngineState::Loading)
                .await
                .map(|state| (*state).clone())
        })
        .await;

        match settled {
            Ok(Ok(EngineState::Ready)) => ReadyOutcome::Ready,
            Ok(Ok(EngineState::Failed(reason))) => ReadyOutcome::Failed(reason),
            // The sender lives as long as `self`, so the channel cannot close here.
            Ok(Ok(EngineState::Loading)) | Ok(Err(_)) | Err(_) => ReadyOutcome::TimedOut,
        }
    }
}

impl Default for EngineReadiness {
    fn default() -> Self {
        Self::new()
    }
}
