// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, ValueEnum};
use labscan_bridge::default_camera;
use labscan_core::error::Result;
use labscan_core::{
    Binarization, BoundaryStrategy, FieldMapping, ScanConfig, SegmentationMode, SessionId,
};
use labscan_document::extract::catalogue;
use labscan_document::scan::ocr::OcrConfig;
use labscan_document::{FieldExtractor, OcrsRecognizer, RecognitionAdapter};
use labscan_session::{Applied, CaptureReport, CaptureSessionController};
use serde::Serialize;
use tracing::{info, warn};

use crate::services::config_store::{effective_config, persist_config};

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Photo of the report (JPEG, PNG, ...).
    pub image: PathBuf,
    /// Upscale factor for enhancement (at least 1).
    #[arg(long)]
    pub scale: Option<f32>,
    /// Directory holding the OCR models.
    #[arg(long)]
    pub model_dir: Option<PathBuf>,
    /// Skip document boundary correction.
    #[arg(long)]
    pub no_correct: bool,
    /// Treat the page as one block of text.
    #[arg(long)]
    pub single_block: bool,
    /// Reduce the enhanced frame to black and white before recognition.
    #[arg(long, value_enum)]
    pub binarize: Option<BinarizeArg>,
    /// Save the extracted indicators after capture.
    #[arg(long)]
    pub save: bool,
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BinarizeArg {
    Off,
    /// Equalize, then threshold at 150.
    Fixed,
    Otsu,
    /// Local mean over a 31x31 block.
    Adaptive,
}

impl From<BinarizeArg> for Binarization {
    fn from(arg: BinarizeArg) -> Self {
        match arg {
            BinarizeArg::Off => Binarization::Off,
            BinarizeArg::Fixed => Binarization::DEFAULT_FIXED,
            BinarizeArg::Otsu => Binarization::Otsu,
            BinarizeArg::Adaptive => Binarization::DEFAULT_ADAPTIVE,
        }
    }
}

/// Command line flags win over the stored config.
pub fn apply_overrides(config: &mut ScanConfig, args: &ScanArgs) {
    if let Some(scale) = args.scale {
        config.upscale_factor = scale;
    }
    if let Some(dir) = &args.model_dir {
        config.model_dir = Some(dir.clone());
    }
    if args.no_correct {
        config.boundary = BoundaryStrategy::Disabled;
    }
    if args.single_block {
        config.segmentation = SegmentationMode::SingleBlock;
    }
    if let Some(mode) = args.binarize {
        config.binarization = mode.into();
    }
}

#[derive(Serialize)]
struct ScanOutput<'a> {
    session: SessionId,
    report: &'a CaptureReport,
    saved: Option<&'a FieldMapping>,
}

/// start → capture → (save) → release over a still image.
pub async fn scan(data_dir: &Path, args: ScanArgs) -> Result<()> {
    let mut config = effective_config(data_dir);
    apply_overrides(&mut config, &args);
    config.validate()?;

    let recognizer = OcrsRecognizer::spawn(OcrConfig::from_scan_config(&config));
    recognizer
        .readiness()
        .wait(config.engine_ready_timeout())
        .await
        .into_result()?;

    let camera = default_camera(Some(args.image.as_path()));
    let mut session = CaptureSessionController::new(config, camera, Arc::new(recognizer))?;
    session.start()?;

    let report = match session.capture().await? {
        Applied::Published(report) => report,
        Applied::Discarded { generation, latest } => {
            warn!(generation, latest, "Capture result discarded");
            session.release();
            return Ok(());
        }
    };

    let saved = if args.save {
        Some(session.save()?.clone())
    } else {
        None
    };
    session.release();
    info!(session = %session.session_id(), indicators = report.fields.indicator_count(), "Scan finished");

    if args.json {
        let output = ScanOutput {
            session: session.session_id(),
            report: &report,
            saved: saved.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        if !report.corrected {
            println!("(document boundary not found; used the uncorrected photo)");
        }
        print!("{}", render_table(&report.fields));
        if let Some(saved) = &saved {
            println!("saved {} indicator(s)", saved.indicator_count());
        }
    }
    Ok(())
}

/// Re-run extraction over recognized text.
pub fn extract(data_dir: &Path, file: Option<&Path>, json: bool) -> Result<()> {
    let config = effective_config(data_dir);
    config.validate()?;
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => std::io::read_to_string(std::io::stdin())?,
    };
    let fields = FieldExtractor::default()
        .with_window(config.value_window_chars)
        .extract(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
    } else {
        print!("{}", render_table(&fields));
    }
    Ok(())
}

pub fn indicators() -> Result<()> {
    for spec in catalogue() {
        let path = if spec.has_dedicated_pattern() {
            "dedicated pattern, then window"
        } else {
            "window"
        };
        println!("{:<10} {}", spec.name(), path);
    }
    Ok(())
}

pub fn config(data_dir: &Path, init: bool) -> Result<()> {
    if init {
        let path = persist_config(data_dir, &ScanConfig::default())?;
        println!("wrote {}", path.display());
        return Ok(());
    }
    let config = effective_config(data_dir);
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// One line per found indicator, or a note when none were found.
pub fn render_table(fields: &FieldMapping) -> String {
    if fields.indicators().next().is_none() {
        return "no indicators found\n".to_string();
    }
    fields
        .indicators()
        .map(|(name, value)| format!("{name:<10} {value}\n"))
        .collect()
}
