// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `ocrs` backed recognition engine.
//
// Only available with the `ocr` feature:
//
// ```toml
// labscan-document = { path = "crates/labscan-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// Two model files are required in the model directory:
//
// - `text-detection.rten` locates text regions.
// - `text-recognition.rten` decodes characters from those regions.
//
// Running `ocrs-cli` once downloads both to `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is the default location.
//
// The recognition models are Latin-script only; requested language codes are
// recorded in the logs but do not select a model.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use labscan_core::error::{LabscanError, Result};
use labscan_core::{PixelBuffer, ScanConfig, SegmentationMode};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, error, info, instrument, warn};

use super::recognize::{EngineReadiness, RecognitionAdapter, RecognitionRequest};
use crate::image::convert::to_rgba_image;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, else `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Where to find the two model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Model directory from the scan config, or the default cache directory.
    pub fn from_scan_config(config: &ScanConfig) -> Self {
        match &config.model_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (kind, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(LabscanError::OcrError(format!(
                    "{kind} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

fn load_model(kind: &str, path: &Path) -> Result<Model> {
    info!(kind, path = %path.display(), "Loading OCR model");
    Model::load_file(path).map_err(|err| {
        LabscanError::OcrError(format!(
            "failed to load {kind} model from {}: {}",
            path.display(),
            err
        ))
    })
}

/// Load both models and build the engine. Blocking.
#[instrument(skip_all, fields(
    detection = %config.detection_model_path.display(),
    recognition = %config.recognition_model_path.display(),
))]
fn build_engine(config: &OcrConfig) -> Result<OcrEngine> {
    config.validate()?;
    let detection_model = load_model("detection", &config.detection_model_path)?;
    let recognition_model = load_model("recognition", &config.recognition_model_path)?;

    let engine = OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
    .map_err(|err| LabscanError::OcrError(format!("failed to initialise OCR engine: {}", err)))?;

    info!("OCR engine initialised");
    Ok(engine)
}

/// Recognition adapter over the `ocrs` engine.
///
/// Note: `ocrs` and `rten` must be built in release mode; debug builds are
/// one to two orders of magnitude slower.
#[derive(Clone)]
pub struct OcrsRecognizer {
    engine: Arc<OnceLock<OcrEngine>>,
    readiness: EngineReadiness,
}

impl OcrsRecognizer {
    /// Start loading the models on a blocking thread and return immediately.
    ///
    /// Must be called from within a tokio runtime. Watch
    /// [`readiness`](RecognitionAdapter::readiness) for the outcome.
    pub fn spawn(config: OcrConfig) -> Self {
        let recognizer = Self {
            engine: Arc::new(OnceLock::new()),
            readiness: EngineReadiness::new(),
        };

        let engine = Arc::clone(&recognizer.engine);
        let readiness = recognizer.readiness.clone();
        tokio::task::spawn_blocking(move || match build_engine(&config) {
            Ok(built) => install(&engine, &readiness, built),
            Err(err) => {
                error!(error = %err, "OCR engine failed to load");
                readiness.mark_failed(err.to_string());
            }
        });

        recognizer
    }

    /// Load the models on the calling thread.
    pub fn load(config: &OcrConfig) -> Result<Self> {
        Ok(Self {
            engine: Arc::new(OnceLock::from(build_engine(config)?)),
            readiness: EngineReadiness::ready(),
        })
    }
}

/// Publish a loaded engine. A cell that is already filled keeps its engine.
fn install(cell: &OnceLock<OcrEngine>, readiness: &EngineReadiness, built: OcrEngine) {
    match cell.set(built) {
        Ok(()) => readiness.mark_ready(),
        Err(_) => warn!("OCR engine already installed; dropping the new one"),
    }
}

impl std::fmt::Debug for OcrsRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrsRecognizer")
            .field("state", &self.readiness.state())
            .finish()
    }
}

impl RecognitionAdapter for OcrsRecognizer {
    fn readiness(&self) -> &EngineReadiness {
        &self.readiness
    }

    async fn recognize(&self, buffer: PixelBuffer, request: RecognitionRequest) -> Result<String> {
        let engine = Arc::clone(&self.engine);
        debug!(
            languages = ?request.languages,
            segmentation = ?request.segmentation,
            width = buffer.width(),
            height = buffer.height(),
            "Recognition requested"
        );

        tokio::task::spawn_blocking(move || {
            let engine = engine
                .get()
                .ok_or_else(|| LabscanError::EngineNotReady("OCR models are still loading".into()))?;
            run_recognition(engine, &buffer, request.segmentation)
        })
        .await
        .map_err(|err| LabscanError::OcrError(format!("recognition task failed: {}", err)))?
    }
}

#[instrument(skip_all, fields(width = buffer.width(), height = buffer.height(), ?segmentation))]
fn run_recognition(
    engine: &OcrEngine,
    buffer: &PixelBuffer,
    segmentation: SegmentationMode,
) -> Result<String> {
    let rgb = image::DynamicImage::ImageRgba8(to_rgba_image(buffer)?).to_rgb8();
    let (width, height) = rgb.dimensions();

    let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
        LabscanError::OcrError(format!(
            "failed to create image source ({}x{}): {}",
            width, height, err
        ))
    })?;
    let input = engine
        .prepare_input(source)
        .map_err(|err| LabscanError::OcrError(format!("OCR preprocessing failed: {}", err)))?;

    let text = match segmentation {
        SegmentationMode::Auto => engine
            .get_text(&input)
            .map_err(|err| LabscanError::OcrError(format!("OCR text recognition failed: {}", err)))?,
        SegmentationMode::SingleBlock => {
            let words = engine
                .detect_words(&input)
                .map_err(|err| LabscanError::OcrError(format!("word detection failed: {}", err)))?;
            let lines = engine.find_text_lines(&input, &words);
            let texts = engine
                .recognize_text(&input, &lines)
                .map_err(|err| LabscanError::OcrError(format!("line recognition failed: {}", err)))?;
            texts
                .iter()
                .flatten()
                .map(|line| line.to_string())
                .filter(|line| !line.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        }
    };

    debug!(
        line_count = text.lines().count(),
        char_count = text.chars().count(),
        "OCR recognition complete"
    );
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::recognize::ReadyOutcome;
    use std::time::Duration;

    #[test]
    fn config_from_dir() {
        let config = OcrConfig::from_dir("/tmp/my-models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn scan_config_model_dir_is_used() {
        let scan = ScanConfig {
            model_dir: Some(PathBuf::from("/opt/models")),
            ..ScanConfig::default()
        };
        assert_eq!(OcrConfig::from_scan_config(&scan), OcrConfig::from_dir("/opt/models"));
    }

    #[test]
    fn validate_missing_models() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = OcrConfig::from_dir(dir.path()).validate().unwrap_err();
        assert!(matches!(err, LabscanError::OcrError(_)));
    }

    #[test]
    fn load_fails_without_models() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(OcrsRecognizer::load(&OcrConfig::from_dir(dir.path())).is_err());
    }

    #[tokio::test]
    async fn missing_models_signal_failure_and_refuse_work() {
        let dir = tempfile::tempdir().expect("tempdir");
        let recognizer = OcrsRecognizer::spawn(OcrConfig::from_dir(dir.path()));

        let outcome = recognizer.readiness().wait(Duration::from_secs(5)).await;
        assert!(matches!(outcome, ReadyOutcome::Failed(_)), "got {outcome:?}");

        let frame = PixelBuffer::filled(4, 4, [255, 255, 255, 255]).expect("valid");
        let err = recognizer
            .recognize(frame, RecognitionRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LabscanError::EngineNotReady(_)));
    }

    fn bare_engine() -> OcrEngine {
        OcrEngine::new(OcrEngineParams::default()).expect("engine without models")
    }

    #[test]
    fn install_marks_ready_and_keeps_the_first_engine() {
        let cell = OnceLock::new();
        let readiness = EngineReadiness::new();
        assert!(!readiness.is_ready());

        install(&cell, &readiness, bare_engine());
        assert!(readiness.is_ready());
        assert!(cell.get().is_some());

        // A second engine is rejected without disturbing the state.
        install(&cell, &readiness, bare_engine());
        assert!(readiness.is_ready());
    }
}
