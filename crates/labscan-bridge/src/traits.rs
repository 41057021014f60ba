// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic capture device trait.

use std::sync::Arc;

use labscan_core::error::Result;
use labscan_core::{Facing, PixelBuffer};

/// An acquired live stream.
///
/// Not `Clone`: releasing consumes the handle, so a stream is released at
/// most once.
#[derive(Debug, PartialEq, Eq)]
pub struct StreamHandle {
    id: u64,
    facing: Facing,
}

impl StreamHandle {
    pub fn new(id: u64, facing: Facing) -> Self {
        Self { id, facing }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }
}

/// A camera (or anything that can stand in for one).
pub trait CaptureDevice: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Open a live stream. Fails with `PermissionDenied` or
    /// `DeviceUnavailable`.
    fn acquire(&self, facing: Facing) -> Result<StreamHandle>;

    /// Copy the current frame of a live stream.
    fn snapshot(&self, handle: &StreamHandle) -> Result<PixelBuffer>;

    /// Stop the stream and free the device.
    fn release(&self, handle: StreamHandle);
}

impl<D: CaptureDevice + ?Sized> CaptureDevice for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn acquire(&self, facing: Facing) -> Result<StreamHandle> {
        (**self).acquire(facing)
    }

    fn snapshot(&self, handle: &StreamHandle) -> Result<PixelBuffer> {
        (**self).snapshot(handle)
    }

    fn release(&self, handle: StreamHandle) {
        (**self).release(handle)
    }
}

impl<D: CaptureDevice + ?Sized> CaptureDevice for Arc<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn acquire(&self, facing: Facing) -> Result<StreamHandle> {
        (**self).acquire(facing)
    }

    fn snapshot(&self, handle: &StreamHandle) -> Result<PixelBuffer> {
        (**self).snapshot(handle)
    }

    fn release(&self, handle: StreamHandle) {
        (**self).release(handle)
    }
}
