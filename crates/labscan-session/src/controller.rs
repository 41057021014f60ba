// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture session controller.
//
// A capture runs in three steps so that recognition, the only slow stage,
// never borrows the controller:
//
// 1. `begin_capture` snapshots, corrects and enhances, then stamps a
//    generation token onto a `PendingCapture`.
// 2. `PendingCapture::recognize` awaits the engine.
// 3. `complete` extracts and publishes, but only for the newest token of a
//    live session. Anything older is discarded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use labscan_bridge::CaptureDevice;
use labscan_core::error::{LabscanError, Result};
use labscan_core::{FieldMapping, PixelBuffer, ScanConfig, SessionId};
use labscan_document::{
    BoundaryCorrector, FieldExtractor, ImageEnhancer, RecognitionAdapter, RecognitionRequest,
    corrector_for,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::phase::SessionPhase;
use crate::state::SessionState;

/// A capture that has been enhanced and is waiting for recognition.
#[derive(Debug)]
pub struct PendingCapture {
    generation: u64,
    buffer: PixelBuffer,
    corrected: bool,
    request: RecognitionRequest,
}

impl PendingCapture {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether boundary correction succeeded for this frame.
    pub fn corrected(&self) -> bool {
        self.corrected
    }

    /// The enhanced buffer that will be recognized.
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Run the recognition engine. The controller is not borrowed, so a
    /// newer capture or a release can happen meanwhile.
    #[instrument(skip_all, fields(generation = self.generation))]
    pub async fn recognize<R: RecognitionAdapter>(self, recognizer: &R) -> RecognitionOutcome {
        let (enhanced_width, enhanced_height) = (self.buffer.width(), self.buffer.height());
        let result = recognizer.recognize(self.buffer, self.request).await;
        debug!(ok = result.is_ok(), "Recognition finished");
        RecognitionOutcome {
            generation: self.generation,
            corrected: self.corrected,
            enhanced_width,
            enhanced_height,
            result,
        }
    }
}

/// What the engine returned for one capture.
#[derive(Debug)]
pub struct RecognitionOutcome {
    pub generation: u64,
    pub corrected: bool,
    pub enhanced_width: u32,
    pub enhanced_height: u32,
    pub result: Result<String>,
}

/// Summary of a published capture.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureReport {
    pub generation: u64,
    pub captured_at: DateTime<Utc>,
    /// False when the frame went through uncorrected.
    pub corrected: bool,
    pub enhanced_width: u32,
    pub enhanced_height: u32,
    pub fields: FieldMapping,
}

/// How `complete` treated an outcome.
#[derive(Debug, Clone)]
pub enum Applied {
    Published(CaptureReport),
    /// A newer capture was initiated, or the session was released.
    Discarded { generation: u64, latest: u64 },
}

/// Drives one capture session from device acquisition to release.
pub struct CaptureSessionController<D: CaptureDevice, R: RecognitionAdapter> {
    id: SessionId,
    config: ScanConfig,
    device: D,
    recognizer: Arc<R>,
    corrector: Box<dyn BoundaryCorrector>,
    enhancer: ImageEnhancer,
    extractor: FieldExtractor,
    phase: SessionPhase,
    state: SessionState,
}

impl<D: CaptureDevice, R: RecognitionAdapter> CaptureSessionController<D, R> {
    /// Assemble a session. The boundary corrector is fixed here from
    /// `config.boundary`.
    pub fn new(config: ScanConfig, device: D, recognizer: Arc<R>) -> Result<Self> {
        config.validate()?;
        let enhancer =
            ImageEnhancer::new(config.upscale_factor)?.with_binarization(config.binarization)?;
        let extractor = FieldExtractor::default().with_window(config.value_window_chars);
        let corrector = corrector_for(config.boundary);
        let id = SessionId::new();
        info!(session = %id, device = device.name(), corrector = corrector.name(), "Capture session created");

        Ok(Self {
            id,
            config,
            device,
            recognizer,
            corrector,
            enhancer,
            extractor,
            phase: SessionPhase::Idle,
            state: SessionState::new(),
        })
    }

    /// Replace the boundary corrector.
    pub fn with_corrector(mut self, corrector: Box<dyn BoundaryCorrector>) -> Self {
        self.corrector = corrector;
        self
    }

    /// Replace the indicator extractor.
    pub fn with_extractor(mut self, extractor: FieldExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    // -- Accessors -----------------------------------------------------------

    pub fn session_id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_fields(&self) -> &FieldMapping {
        &self.state.current_fields
    }

    pub fn saved_fields(&self) -> &FieldMapping {
        &self.state.saved_fields
    }

    pub fn has_device(&self) -> bool {
        self.state.device_handle.is_some()
    }

    pub fn latest_generation(&self) -> u64 {
        self.state.latest_generation()
    }

    pub fn recognizer(&self) -> &Arc<R> {
        &self.recognizer
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    // -- Lifecycle -----------------------------------------------------------

    /// Acquire the capture device. A failure releases the session for good.
    #[instrument(skip(self), fields(session = %self.id, facing = %self.config.facing))]
    pub fn start(&mut self) -> Result<()> {
        if self.phase != SessionPhase::Idle {
            return Err(self.invalid_transition("start"));
        }
        self.transition(SessionPhase::DeviceAcquiring);

        match self.device.acquire(self.config.facing) {
            Ok(handle) => {
                info!(stream = handle.id(), "Capture device acquired");
                self.state.device_handle = Some(handle);
                self.transition(SessionPhase::DeviceReady);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Capture device unavailable; session released");
                self.transition(SessionPhase::Released);
                Err(err)
            }
        }
    }

    /// Snapshot, correct and enhance the live frame.
    ///
    /// Refuses with `EngineNotReady` while the recognition engine is still
    /// loading; nothing is queued.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn begin_capture(&mut self) -> Result<PendingCapture> {
        if !self.phase.accepts_capture() {
            return Err(self.invalid_transition("capture"));
        }
        if !self.recognizer.readiness().is_ready() {
            return Err(LabscanError::EngineNotReady(
                "the recognition engine is still loading".into(),
            ));
        }

        let resume = self.phase;
        match self.prepare_frame() {
            Ok((buffer, corrected)) => {
                let generation = self.state.issue_generation();
                self.transition(SessionPhase::Recognizing);
                info!(
                    generation,
                    corrected,
                    width = buffer.width(),
                    height = buffer.height(),
                    "Capture ready for recognition"
                );
                Ok(PendingCapture {
                    generation,
                    buffer,
                    corrected,
                    request: RecognitionRequest {
                        languages: self.config.languages.clone(),
                        segmentation: self.config.segmentation,
                    },
                })
            }
            Err(err) => {
                warn!(error = %err, "Capture aborted");
                // An earlier capture may still be awaiting recognition.
                let back = if resume == SessionPhase::Recognizing {
                    SessionPhase::Recognizing
                } else {
                    SessionPhase::DeviceReady
                };
                self.transition(back);
                Err(err)
            }
        }
    }

    fn prepare_frame(&mut self) -> Result<(PixelBuffer, bool)> {
        self.transition(SessionPhase::Capturing);
        let handle = self
            .state
            .device_handle
            .as_ref()
            .ok_or_else(|| LabscanError::DeviceUnavailable("no live stream".into()))?;
        let frame = self.device.snapshot(handle)?;

        self.transition(SessionPhase::Correcting);
        let (page, corrected) = match self.corrector.correct(&frame) {
            Ok(page) => (page, true),
            Err(LabscanError::BoundaryNotFound) => {
                warn!(corrector = self.corrector.name(), "Boundary not found; using uncorrected frame");
                (frame, false)
            }
            Err(err) => return Err(err),
        };

        self.transition(SessionPhase::Enhancing);
        let enhanced = self.enhancer.enhance(&page)?;
        Ok((enhanced, corrected))
    }

    /// Apply a recognition outcome.
    ///
    /// Only the newest generation of a live session is published; the
    /// published fields replace `current_fields` wholesale.
    #[instrument(skip(self, outcome), fields(session = %self.id, generation = outcome.generation))]
    pub fn complete(&mut self, outcome: RecognitionOutcome) -> Result<Applied> {
        let latest = self.state.latest_generation();
        if self.phase.is_released() || !self.state.is_latest(outcome.generation) {
            info!(latest, released = self.phase.is_released(), "Stale recognition result discarded");
            return Ok(Applied::Discarded {
                generation: outcome.generation,
                latest,
            });
        }

        let text = match outcome.result {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "Recognition failed");
                self.transition(SessionPhase::DeviceReady);
                return Err(err);
            }
        };

        let fields = self.extractor.extract(&text);
        self.state.current_fields = fields.clone();
        self.transition(SessionPhase::Extracted);
        info!(indicators = fields.indicator_count(), "Fields published");
        self.transition(SessionPhase::DeviceReady);

        Ok(Applied::Published(CaptureReport {
            generation: outcome.generation,
            captured_at: Utc::now(),
            corrected: outcome.corrected,
            enhanced_width: outcome.enhanced_width,
            enhanced_height: outcome.enhanced_height,
            fields,
        }))
    }

    /// `begin_capture`, `recognize` and `complete` in one call.
    pub async fn capture(&mut self) -> Result<Applied> {
        let recognizer = Arc::clone(&self.recognizer);
        let pending = self.begin_capture()?;
        let outcome = pending.recognize(recognizer.as_ref()).await;
        self.complete(outcome)
    }

    /// Copy the catalogue indicators of `current_fields` into
    /// `saved_fields`, replacing whatever was saved before.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn save(&mut self) -> Result<&FieldMapping> {
        if self.state.current_fields.is_empty() {
            return Err(LabscanError::NothingToSave);
        }
        let saved = self
            .state
            .current_fields
            .restricted_to(labscan_document::extract::known_names());
        info!(indicators = saved.indicator_count(), "Fields saved");
        self.state.saved_fields = saved;
        Ok(&self.state.saved_fields)
    }

    /// Release the device and end the session. Safe to call repeatedly.
    ///
    /// Recognitions still in flight complete, but their results are
    /// discarded.
    pub fn release(&mut self) {
        if let Some(handle) = self.state.device_handle.take() {
            let stream = handle.id();
            self.device.release(handle);
            info!(session = %self.id, stream, "Capture device released");
        }
        if !self.phase.is_released() {
            self.state.invalidate_generations();
            self.transition(SessionPhase::Released);
        }
    }

    /// The user navigated away from the capture screen.
    pub fn on_navigate(&mut self) {
        debug!(session = %self.id, "Navigation away from session");
        self.release();
    }

    /// The capture screen was hidden or shown again.
    pub fn on_visibility_change(&mut self, hidden: bool) {
        if hidden {
            debug!(session = %self.id, "Session hidden");
            self.release();
        }
    }

    // -- Internals -----------------------------------------------------------

    fn transition(&mut self, next: SessionPhase) {
        debug!(from = %self.phase, to = %next, "Session phase change");
        self.phase = next;
    }

    fn invalid_transition(&self, action: &str) -> LabscanError {
        LabscanError::InvalidTransition {
            phase: self.phase.to_string(),
            action: action.to_string(),
        }
    }
}

impl<D: CaptureDevice, R: RecognitionAdapter> Drop for CaptureSessionController<D, R> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<D: CaptureDevice, R: RecognitionAdapter> std::fmt::Debug for CaptureSessionController<D, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSessionController")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("has_device", &self.has_device())
            .field("latest_generation", &self.state.latest_generation())
            .finish()
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use labscan_bridge::StreamHandle;
    use labscan_core::{Binarization, BoundaryStrategy, ErrorClass, Facing, RAW_TEXT_KEY};
    use labscan_document::EngineReadiness;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Camera that serves a fixed frame and counts releases.
    struct FakeCamera {
        frame: PixelBuffer,
        deny: bool,
        releases: AtomicUsize,
    }

    impl FakeCamera {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                frame: PixelBuffer::filled(8, 6, [180, 170, 160, 255]).expect("valid"),
                deny: false,
                releases: AtomicUsize::new(0),
            })
        }

        fn denied() -> Arc<Self> {
            Arc::new(Self {
                frame: PixelBuffer::filled(1, 1, [0, 0, 0, 255]).expect("valid"),
                deny: true,
                releases: AtomicUsize::new(0),
            })
        }
    }

    impl CaptureDevice for FakeCamera {
        fn name(&self) -> &str {
            "fake"
        }

        fn acquire(&self, facing: Facing) -> Result<StreamHandle> {
            if self.deny {
                return Err(LabscanError::PermissionDenied);
            }
            Ok(StreamHandle::new(7, facing))
        }

        fn snapshot(&self, _handle: &StreamHandle) -> Result<PixelBuffer> {
            Ok(self.frame.clone())
        }

        fn release(&self, _handle: StreamHandle) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Engine that answers each call with the next scripted text.
    struct ScriptedRecognizer {
        readiness: EngineReadiness,
        texts: Mutex<VecDeque<String>>,
    }

    impl ScriptedRecognizer {
        fn ready(texts: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                readiness: EngineReadiness::ready(),
                texts: Mutex::new(texts.iter().map(|t| t.to_string()).collect()),
            })
        }

        fn loading() -> Arc<Self> {
            Arc::new(Self {
                readiness: EngineReadiness::new(),
                texts: Mutex::new(VecDeque::new()),
            })
        }
    }

    impl RecognitionAdapter for ScriptedRecognizer {
        fn readiness(&self) -> &EngineReadiness {
            &self.readiness
        }

        async fn recognize(&self, _buffer: PixelBuffer, _request: RecognitionRequest) -> Result<String> {
            let next = self.texts.lock().expect("lock").pop_front();
            next.ok_or_else(|| LabscanError::OcrError("script exhausted".into()))
        }
    }

    /// Crops to the top-left quarter.
    struct QuarterCorrector;

    impl BoundaryCorrector for QuarterCorrector {
        fn name(&self) -> &'static str {
            "quarter"
        }

        fn correct(&self, frame: &PixelBuffer) -> Result<PixelBuffer> {
            PixelBuffer::filled(frame.width() / 2, frame.height() / 2, [255, 255, 255, 255])
        }
    }

    struct BrokenCorrector;

    impl BoundaryCorrector for BrokenCorrector {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn correct(&self, _frame: &PixelBuffer) -> Result<PixelBuffer> {
            Err(LabscanError::invalid_dimensions(0, 0, "degenerate quadrilateral"))
        }
    }

    fn config() -> ScanConfig {
        ScanConfig {
            boundary: BoundaryStrategy::Disabled,
            ..ScanConfig::default()
        }
    }

    fn started(
        camera: &Arc<FakeCamera>,
        recognizer: Arc<ScriptedRecognizer>,
    ) -> CaptureSessionController<Arc<FakeCamera>, ScriptedRecognizer> {
        let mut session =
            CaptureSessionController::new(config(), Arc::clone(camera), recognizer).expect("session");
        session.start().expect("start");
        session
    }

    fn published(applied: Applied) -> CaptureReport {
        match applied {
            Applied::Published(report) => report,
            Applied::Discarded { generation, latest } => {
                panic!("generation {generation} discarded, latest {latest}")
            }
        }
    }

    #[tokio::test]
    async fn capture_publishes_extracted_fields() {
        let camera = FakeCamera::new();
        let mut session = started(&camera, ScriptedRecognizer::ready(&["FT4 12.3 TSH 3.1"]));
        assert_eq!(session.phase(), SessionPhase::DeviceReady);

        let report = published(session.capture().await.expect("capture"));
        assert!(!report.corrected);
        assert_eq!((report.enhanced_width, report.enhanced_height), (16, 12));
        assert_eq!(session.current_fields().get("FT4"), Some("12.3"));
        assert_eq!(session.current_fields().get("TSH"), Some("3.1"));
        assert_eq!(session.current_fields().get(RAW_TEXT_KEY), Some("FT4 12.3 TSH 3.1"));
        assert_eq!(session.phase(), SessionPhase::DeviceReady);
    }

    #[tokio::test]
    async fn corrected_frame_is_enhanced() {
        let camera = FakeCamera::new();
        let mut session = started(&camera, ScriptedRecognizer::ready(&["TSH 1.0"]))
            .with_corrector(Box::new(QuarterCorrector));
        let report = published(session.capture().await.expect("capture"));
        assert!(report.corrected);
        assert_eq!((report.enhanced_width, report.enhanced_height), (8, 6));
    }

    #[test]
    fn release_twice_is_harmless() {
        let camera = FakeCamera::new();
        let mut session = started(&camera, ScriptedRecognizer::ready(&[]));
        assert!(session.has_device());

        session.release();
        assert!(!session.has_device());
        session.release();
        assert!(!session.has_device());
        assert_eq!(session.phase(), SessionPhase::Released);
        assert_eq!(camera.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_the_device() {
        let camera = FakeCamera::new();
        {
            let _session = started(&camera, ScriptedRecognizer::ready(&[]));
        }
        assert_eq!(camera.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hidden_screen_and_navigation_release() {
        let camera = FakeCamera::new();
        let mut session = started(&camera, ScriptedRecognizer::ready(&[]));
        session.on_visibility_change(false);
        assert!(session.has_device());
        session.on_visibility_change(true);
        assert!(!session.has_device());
        session.on_navigate();
        assert_eq!(camera.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn denied_device_ends_the_session() {
        let camera = FakeCamera::denied();
        let mut session =
            CaptureSessionController::new(config(), Arc::clone(&camera), ScriptedRecognizer::ready(&[]))
                .expect("session");

        let err = session.start().unwrap_err();
        assert_eq!(err.class(), ErrorClass::DeviceError);
        assert_eq!(session.phase(), SessionPhase::Released);
        assert!(!session.has_device());
        assert!(matches!(
            session.begin_capture().unwrap_err(),
            LabscanError::InvalidTransition { .. }
        ));
        assert!(session.start().is_err());
    }

    #[test]
    fn capture_before_start_is_rejected() {
        let camera = FakeCamera::new();
        let mut session =
            CaptureSessionController::new(config(), Arc::clone(&camera), ScriptedRecognizer::ready(&[]))
                .expect("session");
        let err = session.begin_capture().unwrap_err();
        assert_eq!(err.class(), ErrorClass::Usage);
    }

    #[test]
    fn loading_engine_refuses_capture() {
        let camera = FakeCamera::new();
        let mut session = started(&camera, ScriptedRecognizer::loading());
        let err = session.begin_capture().unwrap_err();
        assert!(matches!(err, LabscanError::EngineNotReady(_)));
        assert_eq!(session.phase(), SessionPhase::DeviceReady);
        assert_eq!(session.latest_generation(), 0);
    }

    #[test]
    fn failed_run_returns_to_device_ready() {
        let camera = FakeCamera::new();
        let mut session = started(&camera, ScriptedRecognizer::ready(&[]))
            .with_corrector(Box::new(BrokenCorrector));
        let err = session.begin_capture().unwrap_err();
        assert_eq!(err.class(), ErrorClass::RunFatal);
        assert_eq!(session.phase(), SessionPhase::DeviceReady);
        assert!(session.has_device());
    }

    #[test]
    fn configured_binarization_reaches_the_recognizer_input() {
        let camera = FakeCamera::new();
        let config = ScanConfig {
            binarization: Binarization::DEFAULT_FIXED,
            ..config()
        };
        let mut session =
            CaptureSessionController::new(config, Arc::clone(&camera), ScriptedRecognizer::ready(&[]))
                .expect("session");
        session.start().expect("start");

        let pending = session.begin_capture().expect("begin");
        let buffer = pending.buffer();
        assert_eq!((buffer.width(), buffer.height()), (16, 12));
        assert!(buffer.samples().iter().all(|px| *px == [255, 255, 255, 255]));
    }

    #[test]
    fn oversized_upscale_fails_the_run_not_the_session() {
        let camera = FakeCamera::new();
        let config = ScanConfig {
            upscale_factor: 1.0e5,
            ..config()
        };
        let mut session =
            CaptureSessionController::new(config, Arc::clone(&camera), ScriptedRecognizer::ready(&[]))
                .expect("session");
        session.start().expect("start");

        let err = session.begin_capture().unwrap_err();
        assert!(matches!(err, LabscanError::InvalidDimensions { .. }));
        assert_eq!(err.class(), ErrorClass::RunFatal);
        assert_eq!(session.phase(), SessionPhase::DeviceReady);
        assert!(session.has_device());
        assert_eq!(session.latest_generation(), 0);
    }

    #[tokio::test]
    async fn newest_capture_wins_when_it_resolves_first() {
        let camera = FakeCamera::new();
        let recognizer = ScriptedRecognizer::ready(&["TSH 2.2", "TSH 1.1"]);
        let mut session = started(&camera, Arc::clone(&recognizer));

        let first = session.begin_capture().expect("first");
        let second = session.begin_capture().expect("second");
        assert!(second.generation() > first.generation());

        let second_outcome = second.recognize(recognizer.as_ref()).await;
        let first_outcome = first.recognize(recognizer.as_ref()).await;

        published(session.complete(second_outcome).expect("second applies"));
        let stale = session.complete(first_outcome).expect("first handled");
        assert!(matches!(stale, Applied::Discarded { .. }));
        assert_eq!(session.current_fields().get("TSH"), Some("2.2"));
    }

    #[tokio::test]
    async fn newest_capture_wins_when_it_resolves_last() {
        let camera = FakeCamera::new();
        let recognizer = ScriptedRecognizer::ready(&["TSH 1.1", "TSH 2.2"]);
        let mut session = started(&camera, Arc::clone(&recognizer));

        let first = session.begin_capture().expect("first");
        let second = session.begin_capture().expect("second");

        let first_outcome = first.recognize(recognizer.as_ref()).await;
        assert!(matches!(
            session.complete(first_outcome).expect("first handled"),
            Applied::Discarded { .. }
        ));
        assert_eq!(session.phase(), SessionPhase::Recognizing);

        let second_outcome = second.recognize(recognizer.as_ref()).await;
        published(session.complete(second_outcome).expect("second applies"));
        assert_eq!(session.current_fields().get("TSH"), Some("2.2"));
    }

    #[tokio::test]
    async fn release_during_recognition_discards_the_result() {
        let camera = FakeCamera::new();
        let recognizer = ScriptedRecognizer::ready(&["TSH 9.9"]);
        let mut session = started(&camera, Arc::clone(&recognizer));

        let pending = session.begin_capture().expect("capture");
        session.release();
        let outcome = pending.recognize(recognizer.as_ref()).await;

        assert!(matches!(session.complete(outcome), Ok(Applied::Discarded { .. })));
        assert!(session.current_fields().is_empty());
    }

    #[tokio::test]
    async fn recognition_failure_is_reported() {
        let camera = FakeCamera::new();
        let mut session = started(&camera, ScriptedRecognizer::ready(&[]));
        let err = session.capture().await.unwrap_err();
        assert!(matches!(err, LabscanError::OcrError(_)));
        assert_eq!(session.phase(), SessionPhase::DeviceReady);
    }

    #[tokio::test]
    async fn save_overwrites_instead_of_merging() {
        let camera = FakeCamera::new();
        let mut session = started(&camera, ScriptedRecognizer::ready(&["FT4 12.3 TSH 3.1", "TSH 2.0"]));

        assert!(matches!(session.save().unwrap_err(), LabscanError::NothingToSave));

        session.capture().await.expect("first capture");
        let saved = session.save().expect("save");
        assert_eq!(saved.get("FT4"), Some("12.3"));
        assert_eq!(saved.get("TSH"), Some("3.1"));
        assert_eq!(saved.raw_text(), None);

        session.capture().await.expect("second capture");
        session.save().expect("save again");
        assert_eq!(session.saved_fields().get("TSH"), Some("2.0"));
        assert!(!session.saved_fields().contains("FT4"));
        assert_eq!(session.phase(), SessionPhase::DeviceReady);
    }

    #[tokio::test]
    async fn save_keeps_only_catalogue_indicators() {
        let camera = FakeCamera::new();
        let recognizer = ScriptedRecognizer::ready(&["Glucose 5.4 Sodium 140"]);
        let extractor = FieldExtractor::new(vec![
            labscan_document::IndicatorSpec::new("Glucose").expect("spec"),
            labscan_document::IndicatorSpec::new("Sodium").expect("spec"),
        ]);
        let mut session = started(&camera, recognizer).with_extractor(extractor);

        session.capture().await.expect("capture");
        assert_eq!(session.current_fields().get("Sodium"), Some("140"));

        let saved = session.save().expect("save");
        assert_eq!(saved.get("Glucose"), Some("5.4"));
        assert!(!saved.contains("Sodium"));
        assert_eq!(saved.indicator_count(), 1);
    }
}
