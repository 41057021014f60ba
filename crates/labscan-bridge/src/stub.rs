// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub camera for builds without a capture device.

use labscan_core::error::{LabscanError, Result};
use labscan_core::{Facing, PixelBuffer};

use crate::traits::{CaptureDevice, StreamHandle};

/// A camera that is never there.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubCamera;

impl CaptureDevice for StubCamera {
    fn name(&self) -> &str {
        "stub"
    }

    fn acquire(&self, facing: Facing) -> Result<StreamHandle> {
        tracing::warn!(%facing, "CaptureDevice::acquire called on stub camera");
        Err(LabscanError::DeviceUnavailable(
            "no camera on this platform".into(),
        ))
    }

    fn snapshot(&self, _handle: &StreamHandle) -> Result<PixelBuffer> {
        tracing::warn!("CaptureDevice::snapshot called on stub camera");
        Err(LabscanError::PlatformUnavailable)
    }

    fn release(&self, _handle: StreamHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use labscan_core::ErrorClass;

    #[test]
    fn acquire_is_a_device_error() {
        let err = StubCamera.acquire(Facing::Environment).unwrap_err();
        assert!(matches!(err, LabscanError::DeviceUnavailable(_)));
        assert_eq!(err.class(), ErrorClass::DeviceError);
    }
}
