// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Still image camera. Serves a photo from disk as the live frame.
//
// Used on desktop and in tests. The file is read and decoded when the stream
// is acquired; one stream at a time.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use labscan_core::error::{LabscanError, Result};
use labscan_core::{Facing, PixelBuffer};
use labscan_document::image::convert::decode;
use tracing::{debug, info, instrument, warn};

use crate::traits::{CaptureDevice, StreamHandle};

#[derive(Debug)]
struct LiveStream {
    id: u64,
    frame: PixelBuffer,
}

/// A camera backed by an image file.
#[derive(Debug)]
pub struct StillImageCamera {
    path: PathBuf,
    next_id: AtomicU64,
    live: Mutex<Option<LiveStream>>,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            next_id: AtomicU64::new(1),
            live: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a stream is currently open.
    pub fn is_streaming(&self) -> bool {
        self.live.lock().map(|live| live.is_some()).unwrap_or(false)
    }

    fn load_frame(&self) -> Result<PixelBuffer> {
        let bytes = std::fs::read(&self.path).map_err(|err| match err.kind() {
            std::io::ErrorKind::PermissionDenied => LabscanError::PermissionDenied,
            _ => LabscanError::DeviceUnavailable(format!(
                "cannot read {}: {}",
                self.path.display(),
                err
            )),
        })?;
        decode(&bytes).map_err(|err| {
            LabscanError::DeviceUnavailable(format!(
                "{} is not a readable image: {}",
                self.path.display(),
                err
            ))
        })
    }
}

impl CaptureDevice for StillImageCamera {
    fn name(&self) -> &str {
        "still-image"
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn acquire(&self, facing: Facing) -> Result<StreamHandle> {
        let mut live = self
            .live
            .lock()
            .map_err(|_| LabscanError::DeviceUnavailable("camera state poisoned".into()))?;
        if live.is_some() {
            return Err(LabscanError::DeviceUnavailable(
                "camera is already streaming".into(),
            ));
        }

        let frame = self.load_frame()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        info!(
            stream = id,
            width = frame.width(),
            height = frame.height(),
            "Still image stream acquired"
        );
        *live = Some(LiveStream { id, frame });
        Ok(StreamHandle::new(id, facing))
    }

    fn snapshot(&self, handle: &StreamHandle) -> Result<PixelBuffer> {
        let live = self
            .live
            .lock()
            .map_err(|_| LabscanError::DeviceUnavailable("camera state poisoned".into()))?;
        match live.as_ref() {
            Some(stream) if stream.id == handle.id() => {
                debug!(stream = stream.id, "Frame snapshot taken");
                Ok(stream.frame.clone())
            }
            _ => Err(LabscanError::DeviceUnavailable(format!(
                "stream {} is not live",
                handle.id()
            ))),
        }
    }

    fn release(&self, handle: StreamHandle) {
        let Ok(mut live) = self.live.lock() else {
            warn!(stream = handle.id(), "Camera state poisoned; stream dropped");
            return;
        };
        if live.as_ref().is_some_and(|stream| stream.id == handle.id()) {
            *live = None;
            info!(stream = handle.id(), "Still image stream released");
        }
    }
}
