// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// labscan-bridge — Capture device abstractions.
//
// The session controller only ever sees `CaptureDevice`. Desktop and CI
// builds serve a still image as the live frame; without one there is no
// camera and acquisition fails with `DeviceUnavailable`.

pub mod still;
pub mod stub;
pub mod traits;

use std::path::Path;

pub use still::StillImageCamera;
pub use stub::StubCamera;
pub use traits::{CaptureDevice, StreamHandle};

/// Pick the capture device for this build.
///
/// With an image path the file stands in for the camera frame.
pub fn default_camera(image: Option<&Path>) -> Box<dyn CaptureDevice> {
    match image {
        Some(path) => Box::new(StillImageCamera::new(path)),
        None => Box::new(StubCamera),
    }
}
