// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! A simulated camera device, recorder and device profile. It behaves like
//! asynchronous camera hardware: calls return immediately and completions are
//! posted through the [`EventSink`] handed over at open. Every accepted call
//! is appended to a shared [`Journal`], which makes call ordering observable.
//!
//! # Architecture
//!
//! ```text
//!  CaptureSessionController
//!        │ calls
//!        ▼
//! ┌──────────────────┐        ┌──────────────────┐
//! │ VirtualCamera    │        │ VirtualRecorder  │
//! │ (CameraHardware) │        │ (RecorderSink)   │
//! └────────┬─────────┘        └────────┬─────────┘
//!          │      VirtualControl       │
//!          └──────── journal ──────────┘
//!                    failures
//!                    event sink ──▶ worker queue
//! ```
//!
//! [`VirtualControl`] stays with the caller: it injects failures, simulates a
//! disconnect and can hold callbacks back to reproduce slow hardware.

mod frames;
mod journal;
mod profile;
mod recorder;

pub use frames::render_still;
pub use journal::{HardwareCall, Journal};
pub use profile::VirtualProfile;
pub use recorder::VirtualRecorder;

use crate::backends::camera::{
    BackendError, BackendResult, CameraCharacteristics, CameraHardware, CaptureRequest,
    EventSink, FileSink, HardwareEvent, OutputKind, OutputTarget, RequestTemplate, SessionId,
    SessionParts, StillImage,
};
use crate::errors::CaptureStage;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Call that can be made to fail once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// `open` returns an error
    Open,
    /// `open` succeeds but the device reports an open error
    OpenCallback,
    /// `create_session` returns an error
    CreateSession,
    /// `create_session` succeeds but configuration fails
    ConfigureSession,
    SetRepeating,
    Capture,
    StopRepeating,
    RecorderConfigure,
    RecorderStart,
    RecorderStop,
}

#[derive(Debug, Default)]
struct ControlState {
    failures: Vec<FailPoint>,
    sink: Option<EventSink>,
    holding: bool,
    held: VecDeque<HardwareEvent>,
}

/// Test and CLI handle shared by the virtual camera and recorder
#[derive(Debug, Clone, Default)]
pub struct VirtualControl {
    state: Arc<Mutex<ControlState>>,
    journal: Journal,
}

impl VirtualControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Make the next call at `point` fail
    pub fn fail_next(&self, point: FailPoint) {
        debug!(?point, "Injecting failure");
        self.lock().failures.push(point);
    }

    /// Consume an injected failure for `point`, if any
    pub(crate) fn check(&self, point: FailPoint) -> BackendResult<()> {
        let mut state = self.lock();
        match state.failures.iter().position(|p| *p == point) {
            Some(index) => {
                state.failures.remove(index);
                warn!(?point, "Injected failure");
                Err(BackendError::Rejected(format!("injected failure at {:?}", point)))
            }
            None => Ok(()),
        }
    }

    /// Hold callbacks back until [`VirtualControl::release_callbacks`]
    pub fn hold_callbacks(&self) {
        self.lock().holding = true;
    }

    /// Deliver held callbacks in order and stop holding
    ///
    /// Returns how many were delivered.
    pub fn release_callbacks(&self) -> usize {
        let (sink, held) = {
            let mut state = self.lock();
            state.holding = false;
            (state.sink.clone(), std::mem::take(&mut state.held))
        };
        let Some(sink) = sink else {
            return 0;
        };
        let count = held.len();
        for event in held {
            sink.post(event);
        }
        count
    }

    /// Simulate the device being taken away
    ///
    /// Returns false when no device is open.
    pub fn disconnect(&self) -> bool {
        let sink = self.lock().sink.clone();
        match sink {
            Some(sink) => {
                info!("Simulating camera disconnect");
                sink.post(HardwareEvent::Disconnected)
            }
            None => false,
        }
    }

    /// Simulate an asynchronous device error
    pub fn device_error(&self, cause: &str) -> bool {
        self.emit(HardwareEvent::Error {
            stage: CaptureStage::Device,
            cause: cause.to_string(),
        })
    }

    fn attach(&self, sink: EventSink) {
        let mut state = self.lock();
        state.sink = Some(sink);
        state.held.clear();
    }

    fn detach(&self) {
        let mut state = self.lock();
        state.sink = None;
        state.held.clear();
    }

    /// Post an event, or hold it while callbacks are held
    fn emit(&self, event: HardwareEvent) -> bool {
        let sink = {
            let mut state = self.lock();
            if state.holding {
                state.held.push_back(event);
                return true;
            }
            state.sink.clone()
        };
        match sink {
            Some(sink) => sink.post(event),
            None => false,
        }
    }
}

#[derive(Debug)]
struct LiveSession {
    id: SessionId,
    targets: Vec<OutputTarget>,
}

impl LiveSession {
    fn target(&self, kind: OutputKind) -> Option<&OutputTarget> {
        self.targets.iter().find(|t| t.kind() == kind)
    }
}

/// Simulated camera device
#[derive(Debug)]
pub struct VirtualCamera {
    profile: VirtualProfile,
    control: VirtualControl,
    opened: Option<String>,
    session: Option<LiveSession>,
}

impl VirtualCamera {
    pub fn new(profile: VirtualProfile, control: VirtualControl) -> Self {
        Self {
            profile,
            control,
            opened: None,
            session: None,
        }
    }

    pub fn profile(&self) -> &VirtualProfile {
        &self.profile
    }

    fn journal(&self) -> &Journal {
        self.control.journal()
    }

    fn live_session(&self, id: SessionId) -> BackendResult<&LiveSession> {
        self.session
            .as_ref()
            .filter(|s| s.id == id)
            .ok_or(BackendError::SessionClosed(id))
    }

    fn check_targets(&self, id: SessionId, request: &CaptureRequest) -> BackendResult<()> {
        let session = self.live_session(id)?;
        for kind in &request.targets {
            if session.target(*kind).is_none() {
                return Err(BackendError::Rejected(format!(
                    "{:?} output is not part of {}",
                    kind, id
                )));
            }
        }
        Ok(())
    }

    fn emit_still(&self, id: SessionId, request: &CaptureRequest) -> BackendResult<()> {
        let size = self
            .live_session(id)?
            .target(OutputKind::Still)
            .map(OutputTarget::size)
            .ok_or_else(|| BackendError::Rejected(format!("{} has no still output", id)))?;
        let rotation = request.jpeg_orientation.unwrap_or_default();
        let data = render_still(size, rotation)?;

        let journal = self.journal().clone();
        let image = StillImage::new(size.width, size.height, data)
            .with_release(move || journal.record(HardwareCall::StillReleased));
        self.control.emit(HardwareEvent::StillImageAvailable(image));
        Ok(())
    }
}

impl CameraHardware for VirtualCamera {
    fn cameras(&self) -> BackendResult<Vec<CameraCharacteristics>> {
        Ok(self.profile.cameras.clone())
    }

    fn open(&mut self, camera_id: &str, events: EventSink) -> BackendResult<()> {
        if let Some(open) = &self.opened {
            return Err(BackendError::Rejected(format!(
                "camera {} is already open",
                open
            )));
        }
        if self.profile.camera(camera_id).is_none() {
            return Err(BackendError::DeviceNotFound(camera_id.to_string()));
        }
        self.control.check(FailPoint::Open)?;

        self.journal()
            .record(HardwareCall::Open(camera_id.to_string()));
        self.control.attach(events);
        self.opened = Some(camera_id.to_string());
        info!(camera = camera_id, "Virtual camera open");

        if self.control.check(FailPoint::OpenCallback).is_err() {
            self.control.emit(HardwareEvent::Error {
                stage: CaptureStage::Open,
                cause: "camera service refused the device".into(),
            });
        } else {
            self.control.emit(HardwareEvent::Opened);
        }
        Ok(())
    }

    fn close_device(&mut self) {
        if let Some(camera_id) = self.opened.take() {
            self.session = None;
            self.control.detach();
            self.journal().record(HardwareCall::CloseDevice);
            info!(camera = %camera_id, "Virtual camera closed");
        }
    }

    fn create_session(&mut self, id: SessionId, targets: &[OutputTarget]) -> BackendResult<()> {
        if self.opened.is_none() {
            return Err(BackendError::Rejected("camera is not open".into()));
        }
        if targets.is_empty() {
            return Err(BackendError::Rejected("session needs at least one output".into()));
        }
        self.control.check(FailPoint::CreateSession)?;

        if let Some(previous) = self.session.take() {
            debug!(session = %previous.id, "Replacing live session");
        }
        self.journal().record(HardwareCall::CreateSession {
            id,
            targets: targets.to_vec(),
        });
        self.session = Some(LiveSession {
            id,
            targets: targets.to_vec(),
        });

        if let Err(e) = self.control.check(FailPoint::ConfigureSession) {
            self.control
                .emit(HardwareEvent::SessionConfigureFailed(id, e.to_string()));
        } else {
            self.control.emit(HardwareEvent::SessionConfigured(id));
        }
        Ok(())
    }

    fn set_repeating_request(
        &mut self,
        id: SessionId,
        request: &CaptureRequest,
    ) -> BackendResult<()> {
        self.check_targets(id, request)?;
        self.control.check(FailPoint::SetRepeating)?;
        self.journal().record(HardwareCall::SetRepeating {
            id,
            request: request.clone(),
        });
        Ok(())
    }

    fn capture(&mut self, id: SessionId, request: &CaptureRequest) -> BackendResult<()> {
        self.check_targets(id, request)?;
        self.control.check(FailPoint::Capture)?;
        self.journal().record(HardwareCall::Capture {
            id,
            request: request.clone(),
        });

        if request.af_trigger {
            for af_state in self.profile.autofocus.clone() {
                self.control.emit(HardwareEvent::CaptureProgressed(af_state));
            }
        }
        if request.template == RequestTemplate::StillCapture {
            self.emit_still(id, request)?;
        }
        Ok(())
    }

    fn stop_repeating(&mut self, id: SessionId) -> BackendResult<()> {
        self.live_session(id)?;
        self.control.check(FailPoint::StopRepeating)?;
        self.journal().record(HardwareCall::StopRepeating(id));
        Ok(())
    }

    fn close_session(&mut self, id: SessionId) {
        if self.session.as_ref().is_some_and(|s| s.id == id) {
            self.session = None;
            self.journal().record(HardwareCall::CloseSession(id));
        }
    }
}

/// Virtual camera and recorder wired to one control handle
pub fn virtual_parts(
    profile: VirtualProfile,
    file_sink: Box<dyn FileSink>,
) -> (SessionParts, VirtualControl) {
    let control = VirtualControl::new();
    let parts = SessionParts {
        hardware: Box::new(VirtualCamera::new(profile, control.clone())),
        recorder: Box::new(VirtualRecorder::new(control.clone())),
        file_sink,
    };
    (parts, control)
}
