// SPDX-License-Identifier: GPL-3.0-only

//! Camera session
//!
//! [`CameraSession`] is what a UI holds while the camera screen is visible.
//! Opening it negotiates a [`StreamPlan`], starts the camera worker and opens
//! the device; dropping it tears everything down.
//!
//! - [`state`]: the pure capture state machine
//! - [`controller`]: executes state machine effects against the hardware
//! - [`worker`]: the background thread all camera work runs on
//! - [`notify`]: notifications back to the UI

pub mod controller;
pub mod notify;
pub mod state;
pub mod worker;

pub use controller::{CaptureSessionController, Intent};
pub use notify::{Notification, Notifier};
pub use state::CaptureState;
pub use worker::{CameraWorker, Job};

use crate::backends::camera::{DisplayRotationSource, RecordingRequest, Resolution, SessionParts};
use crate::config::RecorderSettings;
use crate::errors::{CaptureStage, CoreError, CoreResult};
use crate::stream::StreamPlan;
use std::sync::mpsc;
use tokio::sync::{mpsc as tokio_mpsc, watch};
use tracing::info;

/// Parameters for opening a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Pixel size of the preview surface, in display orientation
    pub surface: Resolution,
    pub recorder: RecorderSettings,
    /// Recording to start as soon as the device opens, e.g. when the UI
    /// comes back while a recording was requested
    pub resume_recording: Option<RecordingRequest>,
}

impl SessionOptions {
    pub fn new(surface: Resolution) -> Self {
        Self {
            surface,
            recorder: RecorderSettings::default(),
            resume_recording: None,
        }
    }
}

/// An open camera with its capture state machine
pub struct CameraSession {
    plan: StreamPlan,
    worker: CameraWorker,
    state: watch::Receiver<CaptureState>,
    notifications: Option<tokio_mpsc::UnboundedReceiver<Notification>>,
}

impl CameraSession {
    /// Negotiate streams and open the first back-facing camera
    ///
    /// The display rotation is read once, here. Completion of the open is
    /// reported asynchronously as `StateChanged(Previewing)` (or `Recording`
    /// when resuming a recording).
    ///
    /// # Errors
    /// * `NoCameraAvailable` - No back-facing camera
    /// * `InvalidArgument` - The camera reports no preview sizes, or a
    ///   recording should resume on a camera that cannot record
    /// * `Capture` - Enumeration failed or the worker could not start
    pub fn open(
        parts: SessionParts,
        display: &dyn DisplayRotationSource,
        options: SessionOptions,
    ) -> CoreResult<Self> {
        let cameras = parts
            .hardware
            .cameras()
            .map_err(|e| e.at(CaptureStage::Open))?;
        let plan = StreamPlan::build(&cameras, options.surface, display)?;

        if options.resume_recording.is_some() && plan.video_size.is_none() {
            return Err(CoreError::InvalidArgument(format!(
                "camera {} cannot record video",
                plan.camera_id
            )));
        }

        let (notifier, state, notifications) = Notifier::channel();
        let (sender, receiver) = mpsc::channel();
        let controller = CaptureSessionController::new(
            plan.clone(),
            parts,
            options.recorder,
            options.resume_recording,
            notifier,
            sender.clone(),
        );
        let worker = CameraWorker::spawn(controller, receiver, sender)?;
        worker.submit(Job::Open)?;

        info!(camera = %plan.camera_id, "Camera session opened");
        Ok(Self {
            plan,
            worker,
            state,
            notifications: Some(notifications),
        })
    }

    pub fn plan(&self) -> &StreamPlan {
        &self.plan
    }

    /// Latest capture state
    pub fn state(&self) -> CaptureState {
        *self.state.borrow()
    }

    /// Watch channel following the capture state
    pub fn subscribe_state(&self) -> watch::Receiver<CaptureState> {
        self.state.clone()
    }

    /// Take the notification stream; only the first call returns it
    pub fn take_notifications(&mut self) -> Option<tokio_mpsc::UnboundedReceiver<Notification>> {
        self.notifications.take()
    }

    /// Lock focus and take a picture
    pub fn lock_focus(&self) -> CoreResult<()> {
        self.worker.submit(Job::Intent(Intent::LockFocus))
    }

    pub fn start_recording(&self, request: RecordingRequest) -> CoreResult<()> {
        self.worker
            .submit(Job::Intent(Intent::StartRecording(request)))
    }

    pub fn stop_recording(&self) -> CoreResult<()> {
        self.worker.submit(Job::Intent(Intent::StopRecording))
    }

    /// Release the camera and stop the worker
    ///
    /// A running recording is finalized. Calling this more than once is a
    /// no-op; dropping the session does the same.
    pub fn close(&mut self) {
        self.worker.shutdown();
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("camera", &self.plan.camera_id)
            .field("state", &self.state())
            .field("worker", &self.worker)
            .finish()
    }
}
