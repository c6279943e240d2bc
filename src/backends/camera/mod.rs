// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! The core never talks to a camera API directly. It drives the collaborator
//! traits defined here, and the hardware reports asynchronous outcomes back
//! through an [`EventSink`] onto the session worker's queue.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────┐
//! │  CameraSession (UI facing)│
//! └─────────────┬─────────────┘
//!               │ intents
//!               ▼
//! ┌───────────────────────────┐      HardwareEvent
//! │  camera worker thread     │ ◀──────────────────┐
//! │  CaptureSessionController │                    │
//! └─────────────┬─────────────┘                    │
//!               │ calls                            │
//!               ▼                                  │
//! ┌───────────────────────────┐                    │
//! │  CameraHardware trait     │ ── EventSink ──────┘
//! │  RecorderSink / FileSink  │
//! └───────────────────────────┘
//! ```

pub mod types;

pub use types::*;

use crate::errors::CaptureStage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Asynchronous outcome reported by the hardware
#[derive(Debug)]
pub enum HardwareEvent {
    /// The device finished opening
    Opened,
    /// The device went away (another client took it, USB unplug, ...)
    Disconnected,
    /// The device reported an error
    Error { stage: CaptureStage, cause: String },
    /// A session finished configuring its outputs
    SessionConfigured(SessionId),
    /// A session could not be configured
    SessionConfigureFailed(SessionId, String),
    /// Capture result for a one-shot request with autofocus progress
    CaptureProgressed(AfState),
    /// The image reader produced an encoded still
    StillImageAvailable(StillImage),
}

/// Channel the hardware uses to report events back to the session worker
#[derive(Clone)]
pub struct EventSink {
    post: Arc<dyn Fn(HardwareEvent) -> bool + Send + Sync>,
}

impl EventSink {
    /// Create a sink from a delivery function
    ///
    /// The function returns false once the receiving side is gone.
    pub fn new<F>(post: F) -> Self
    where
        F: Fn(HardwareEvent) -> bool + Send + Sync + 'static,
    {
        Self {
            post: Arc::new(post),
        }
    }

    /// Post an event; returns false if nobody is listening anymore
    pub fn post(&self, event: HardwareEvent) -> bool {
        (self.post)(event)
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EventSink")
    }
}

/// Source of the current display rotation
///
/// Read once, when the stream plan is built.
pub trait DisplayRotationSource {
    fn current_rotation(&self) -> DisplayRotation;
}

impl DisplayRotationSource for DisplayRotation {
    fn current_rotation(&self) -> DisplayRotation {
        *self
    }
}

/// Camera hardware trait
///
/// All calls are made from the session worker thread, one at a time.
/// Calls return once the request was accepted; completion is reported later
/// through the [`EventSink`] handed over in [`CameraHardware::open`].
pub trait CameraHardware: Send {
    // ===== Enumeration =====

    /// Enumerate cameras with their facing, sensor orientation and sizes
    fn cameras(&self) -> BackendResult<Vec<CameraCharacteristics>>;

    // ===== Device =====

    /// Open a camera device
    ///
    /// # Arguments
    /// * `camera_id` - Identifier from [`CameraHardware::cameras`]
    /// * `events` - Where to report this device's callbacks
    ///
    /// Reports `Opened`, or `Error { stage: Open, .. }` when opening fails later.
    fn open(&mut self, camera_id: &str, events: EventSink) -> BackendResult<()>;

    /// Close the device; closing an already closed device is a no-op
    fn close_device(&mut self);

    // ===== Sessions =====

    /// Create a session over a fixed set of output surfaces
    ///
    /// Reports `SessionConfigured(id)` or `SessionConfigureFailed(id, ..)`.
    fn create_session(&mut self, id: SessionId, targets: &[OutputTarget]) -> BackendResult<()>;

    /// Install a repeating request, replacing any previous one
    fn set_repeating_request(&mut self, id: SessionId, request: &CaptureRequest)
    -> BackendResult<()>;

    /// Submit a one-shot request
    ///
    /// Requests with an autofocus trigger report `CaptureProgressed`, still
    /// requests eventually report `StillImageAvailable`.
    fn capture(&mut self, id: SessionId, request: &CaptureRequest) -> BackendResult<()>;

    /// Cancel the repeating request of a session
    fn stop_repeating(&mut self, id: SessionId) -> BackendResult<()>;

    /// Close a session; closing an unknown session is a no-op
    fn close_session(&mut self, id: SessionId);
}

/// Video recorder consuming the record surface
pub trait RecorderSink: Send {
    /// Prepare the encoder and its input surface
    fn configure(&mut self, config: &RecorderConfig) -> BackendResult<()>;

    /// Start writing frames
    fn start(&mut self) -> BackendResult<()>;

    /// Stop and finalize the output file
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Path to the saved video file
    fn stop(&mut self) -> BackendResult<PathBuf>;
}

/// Destination for still images
pub trait FileSink: Send {
    /// Choose where the next still image goes
    fn allocate_still_path(&self) -> std::io::Result<PathBuf>;

    /// Write encoded bytes to the destination
    fn write(&self, bytes: &[u8], destination: &Path) -> std::io::Result<()>;
}

/// The collaborators a session drives
pub struct SessionParts {
    pub hardware: Box<dyn CameraHardware>,
    pub recorder: Box<dyn RecorderSink>,
    pub file_sink: Box<dyn FileSink>,
}

impl std::fmt::Debug for SessionParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionParts")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_event_sink_reports_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        let sink = EventSink::new(move |event| tx.send(event).is_ok());

        assert!(sink.post(HardwareEvent::Opened));
        assert!(matches!(rx.recv().unwrap(), HardwareEvent::Opened));

        drop(rx);
        assert!(!sink.post(HardwareEvent::Disconnected));
    }

    #[test]
    fn test_display_rotation_is_its_own_source() {
        let source: &dyn DisplayRotationSource = &DisplayRotation::Rot180;
        assert_eq!(source.current_rotation(), DisplayRotation::Rot180);
    }
}
