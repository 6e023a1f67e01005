use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::CameraAcquisitionError;

/// Boundary to the host platform's capture device.
///
/// Acquisition is the one call in the engine that may genuinely take a while,
/// so the driver runs it off the session loop and feeds the outcome back as a
/// signal.
#[async_trait]
pub trait CameraSource: Send + Sync {
    /// Attempt to acquire the capture device.
    ///
    /// # Errors
    ///
    /// Returns `CameraAcquisitionError` when the device cannot be opened.
    async fn acquire(&self) -> Result<(), CameraAcquisitionError>;

    /// Release the device if held. Idempotent.
    async fn release(&self);
}

/// Camera double for tests and prototyping; scriptable to fail acquisition.
#[derive(Clone, Default)]
pub struct StubCamera {
    fail_with: Arc<Mutex<Option<CameraAcquisitionError>>>,
    acquired: Arc<Mutex<bool>>,
}

impl StubCamera {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A stub that refuses acquisition with the given error.
    #[must_use]
    pub fn failing(error: CameraAcquisitionError) -> Self {
        Self {
            fail_with: Arc::new(Mutex::new(Some(error))),
            acquired: Arc::new(Mutex::new(false)),
        }
    }

    #[must_use]
    pub fn is_acquired(&self) -> bool {
        self.acquired.lock().map(|guard| *guard).unwrap_or(false)
    }
}

#[async_trait]
impl CameraSource for StubCamera {
    async fn acquire(&self) -> Result<(), CameraAcquisitionError> {
        let scripted = self
            .fail_with
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        if let Some(error) = scripted {
            return Err(error);
        }
        if let Ok(mut guard) = self.acquired.lock() {
            *guard = true;
        }
        Ok(())
    }

    async fn release(&self) {
        if let Ok(mut guard) = self.acquired.lock() {
            *guard = false;
        }
    }
}
