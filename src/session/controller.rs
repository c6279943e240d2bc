// SPDX-License-Identifier: GPL-3.0-only

//! Capture session controller
//!
//! Runs on the camera worker. Hardware callbacks, UI intents and save jobs
//! are turned into state machine [`Event`]s; the resulting [`Effect`]s are
//! executed against the collaborators, and failures are fed back in as
//! `Failed` events.

use super::notify::{Notification, Notifier};
use super::state::{CaptureState, Effect, Event, SessionKind, Transition, transition};
use super::worker::Job;
use crate::backends::camera::{
    CaptureRequest, EventSink, HardwareEvent, RecorderConfig, RecordingRequest, SessionId,
    SessionParts, StillImage,
};
use crate::config::RecorderSettings;
use crate::errors::{CaptureStage, CoreError, CoreResult};
use crate::stream::StreamPlan;
use std::path::PathBuf;
use std::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Request from the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Lock focus, then take one still
    LockFocus,
    StartRecording(RecordingRequest),
    StopRecording,
}

impl From<Intent> for Event {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::LockFocus => Event::LockFocus,
            Intent::StartRecording(request) => Event::StartRecording(request),
            Intent::StopRecording => Event::StopRecording,
        }
    }
}

/// The single hardware session of the open device
#[derive(Debug, Clone, Copy)]
struct ActiveSession {
    id: SessionId,
    kind: SessionKind,
    /// Reported configured by the hardware
    ready: bool,
    /// A repeating request is installed
    repeating: bool,
}

/// Mutable resources of one camera-open cycle
struct SessionContext {
    parts: SessionParts,
    session: Option<ActiveSession>,
    next_session_id: u64,
    /// `open` was accepted and the device has not been released since
    device_open: bool,
    recorder_running: bool,
    recording_path: Option<PathBuf>,
    /// Recording to start as soon as the device opens
    pending_recording: Option<RecordingRequest>,
}

impl SessionContext {
    fn allocate_session_id(&mut self) -> SessionId {
        self.next_session_id += 1;
        SessionId(self.next_session_id)
    }

    fn is_current(&self, id: SessionId) -> bool {
        self.session.is_some_and(|s| s.id == id)
    }
}

/// Owner of the capture state machine and everything it drives
pub struct CaptureSessionController {
    plan: StreamPlan,
    recorder_settings: RecorderSettings,
    state: CaptureState,
    ctx: SessionContext,
    notifier: Notifier,
    jobs: mpsc::Sender<Job>,
}

impl CaptureSessionController {
    /// Create a controller for an already negotiated plan
    ///
    /// # Arguments
    /// * `jobs` - Sender of the worker queue this controller runs on; hardware
    ///   events and save jobs are posted back through it
    pub fn new(
        plan: StreamPlan,
        parts: SessionParts,
        recorder_settings: RecorderSettings,
        resume_recording: Option<RecordingRequest>,
        notifier: Notifier,
        jobs: mpsc::Sender<Job>,
    ) -> Self {
        Self {
            plan,
            recorder_settings,
            state: CaptureState::Idle,
            ctx: SessionContext {
                parts,
                session: None,
                next_session_id: 0,
                device_open: false,
                recorder_running: false,
                recording_path: None,
                pending_recording: resume_recording,
            },
            notifier,
            jobs,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn plan(&self) -> &StreamPlan {
        &self.plan
    }

    /// Process one job from the worker queue
    pub fn handle(&mut self, job: Job) {
        match job {
            Job::Open => self.open_device(),
            Job::Hardware(event) => self.on_hardware_event(event),
            Job::Intent(intent) => self.on_intent(intent),
            Job::SaveStill(image) => self.save_still(image),
            Job::Shutdown => self.teardown(),
        }
    }

    fn open_device(&mut self) {
        if self.ctx.device_open {
            warn!(camera = %self.plan.camera_id, "Camera already open");
            return;
        }

        info!(camera = %self.plan.camera_id, "Opening camera");
        let jobs = self.jobs.clone();
        let events = EventSink::new(move |event| jobs.send(Job::Hardware(event)).is_ok());

        match self.ctx.parts.hardware.open(&self.plan.camera_id, events) {
            Ok(()) => self.ctx.device_open = true,
            Err(e) => {
                error!(camera = %self.plan.camera_id, error = %e, "Failed to open camera");
                self.apply(Event::Failed {
                    stage: CaptureStage::Open,
                    cause: e.to_string(),
                });
            }
        }
    }

    fn on_hardware_event(&mut self, event: HardwareEvent) {
        match event {
            HardwareEvent::Opened => {
                if !self.ctx.device_open {
                    debug!("Open callback for a released device, dropping");
                    return;
                }
                info!(camera = %self.plan.camera_id, "Camera opened");
                let pending_recording = self.ctx.pending_recording.take();
                self.apply(Event::DeviceOpened { pending_recording });
            }
            HardwareEvent::Disconnected => {
                if !self.ctx.device_open {
                    debug!("Disconnect of a released device, dropping");
                    return;
                }
                warn!(camera = %self.plan.camera_id, "Camera disconnected");
                self.apply(Event::Disconnected);
            }
            HardwareEvent::Error { stage, cause } => {
                if !self.ctx.device_open {
                    debug!(%stage, %cause, "Error from a released device, dropping");
                    return;
                }
                error!(camera = %self.plan.camera_id, %stage, %cause, "Camera error");
                self.apply(Event::Failed { stage, cause });
            }
            HardwareEvent::SessionConfigured(id) => {
                if !self.ctx.is_current(id) {
                    debug!(session = %id, "Configured callback for a stale session, dropping");
                    return;
                }
                if let Some(session) = self.ctx.session.as_mut() {
                    session.ready = true;
                }
                debug!(session = %id, "Session configured");
                self.apply(Event::SessionConfigured);
            }
            HardwareEvent::SessionConfigureFailed(id, cause) => {
                if !self.ctx.is_current(id) {
                    debug!(session = %id, %cause, "Configure failure of a stale session, dropping");
                    return;
                }
                error!(session = %id, %cause, "Session configuration failed");
                self.apply(Event::Failed {
                    stage: CaptureStage::CreateSession,
                    cause,
                });
            }
            HardwareEvent::CaptureProgressed(af_state) => {
                debug!(?af_state, "Capture progressed");
                self.apply(Event::CaptureProgressed(af_state));
            }
            HardwareEvent::StillImageAvailable(image) => {
                debug!(?image, "Still image available");
                self.apply(Event::StillImageAvailable(image));
            }
        }
    }

    fn on_intent(&mut self, intent: Intent) {
        if let Some(session) = self.ctx.session
            && !session.ready
        {
            warn!(
                session = %session.id,
                ?intent,
                "Session is still being configured, ignoring request"
            );
            return;
        }

        if self.state == CaptureState::Idle {
            if self.ctx.device_open {
                warn!(?intent, "Camera is still opening, ignoring request");
            } else {
                warn!(?intent, "Camera is closed, ignoring request");
                self.notifier.publish(Notification::Failed(CoreError::capture(
                    CaptureStage::Device,
                    "camera is closed, the session has to be reopened",
                )));
            }
            return;
        }

        match &intent {
            _ if self.state != CaptureState::Previewing => {}
            Intent::LockFocus if self.plan.still_size.is_none() => {
                self.reject(format!("camera {} cannot take stills", self.plan.camera_id));
                return;
            }
            Intent::StartRecording(_) if self.plan.video_size.is_none() => {
                self.reject(format!("camera {} cannot record video", self.plan.camera_id));
                return;
            }
            _ => {}
        }

        self.apply(intent.into());
    }

    fn reject(&self, reason: String) {
        warn!(%reason, "Request rejected");
        self.notifier
            .publish(Notification::Failed(CoreError::InvalidArgument(reason)));
    }

    /// Run the state machine for one event and execute its effects
    fn apply(&mut self, event: Event) {
        let failure_path = matches!(event, Event::Failed { .. } | Event::Disconnected);
        let from = self.state;
        let name = event.name();

        let outcome = transition(from, event);
        if outcome.is_noop(from) {
            debug!(state = %from, event = name, "Event ignored");
            return;
        }
        let Transition { next, effects } = outcome;

        if next != from {
            info!(from = %from, to = %next, event = name, "Capture state changed");
            self.state = next;
            self.notifier.state_changed(next);
        }

        for effect in effects {
            if let Err(err) = self.execute(effect) {
                if failure_path {
                    warn!(error = %err, "Cleanup step failed");
                    continue;
                }
                error!(error = %err, state = %self.state, "Capture step failed");
                let (stage, cause) = match err {
                    CoreError::Capture { stage, cause } => (stage, cause),
                    other => (CaptureStage::SubmitRequest, other.to_string()),
                };
                self.apply(Event::Failed { stage, cause });
                return;
            }
        }
    }

    fn execute(&mut self, effect: Effect) -> CoreResult<()> {
        match effect {
            Effect::OpenSession(kind) => self.open_session(kind),
            Effect::CloseSession => self.close_session(),
            Effect::StartRepeating(kind) => self.start_repeating(kind),
            Effect::TriggerAutofocus => {
                let id = self.current_session_id()?;
                debug!(session = %id, "Triggering autofocus");
                self.ctx
                    .parts
                    .hardware
                    .capture(id, &CaptureRequest::preview().with_af_trigger())
                    .map_err(|e| e.at(CaptureStage::SubmitRequest))
            }
            Effect::CaptureStill => {
                let id = self.current_session_id()?;
                info!(session = %id, rotation = %self.plan.rotation, "Capturing still");
                self.ctx
                    .parts
                    .hardware
                    .capture(id, &CaptureRequest::still(self.plan.rotation))
                    .map_err(|e| e.at(CaptureStage::SubmitRequest))
            }
            Effect::PrepareRecorder(request) => self.prepare_recorder(request),
            Effect::StartRecorder => {
                self.ctx
                    .parts
                    .recorder
                    .start()
                    .map_err(|e| e.at(CaptureStage::Recorder))?;
                self.ctx.recorder_running = true;
                if let Some(path) = self.ctx.recording_path.clone() {
                    info!(path = %path.display(), "Recording started");
                    self.notifier.publish(Notification::RecordingStarted(path));
                }
                Ok(())
            }
            Effect::StopRecorder => self.stop_recorder(),
            Effect::SaveStill(image) => self
                .jobs
                .send(Job::SaveStill(image))
                .map_err(|_| CoreError::capture(CaptureStage::Worker, "job queue closed")),
            Effect::ReleaseDevice => {
                self.release_session();
                self.release_device();
                Ok(())
            }
            Effect::Report(err) => {
                self.notifier.publish(Notification::Failed(err));
                Ok(())
            }
        }
    }

    fn current_session_id(&self) -> CoreResult<SessionId> {
        self.ctx.session.map(|s| s.id).ok_or_else(|| {
            CoreError::capture(CaptureStage::SubmitRequest, "no active capture session")
        })
    }

    fn open_session(&mut self, kind: SessionKind) -> CoreResult<()> {
        let targets = match kind {
            SessionKind::Preview => self.plan.preview_targets(),
            SessionKind::Recording => self
                .plan
                .recording_targets()
                .map_err(|e| CoreError::capture(CaptureStage::Recorder, e.to_string()))?,
        };

        let id = self.ctx.allocate_session_id();
        debug!(session = %id, ?kind, targets = targets.len(), "Creating capture session");
        self.ctx
            .parts
            .hardware
            .create_session(id, &targets)
            .map_err(|e| e.at(CaptureStage::CreateSession))?;
        self.ctx.session = Some(ActiveSession {
            id,
            kind,
            ready: false,
            repeating: false,
        });
        Ok(())
    }

    fn close_session(&mut self) -> CoreResult<()> {
        let Some(session) = self.ctx.session.take() else {
            return Ok(());
        };
        debug!(session = %session.id, kind = ?session.kind, "Closing capture session");
        let stopped = if session.repeating {
            self.ctx
                .parts
                .hardware
                .stop_repeating(session.id)
                .map_err(|e| e.at(CaptureStage::SubmitRequest))
        } else {
            Ok(())
        };
        self.ctx.parts.hardware.close_session(session.id);
        stopped
    }

    fn start_repeating(&mut self, kind: SessionKind) -> CoreResult<()> {
        let id = self.current_session_id()?;
        let request = match kind {
            SessionKind::Preview => CaptureRequest::preview(),
            SessionKind::Recording => CaptureRequest::recording(),
        };
        debug!(session = %id, ?kind, "Starting repeating request");
        self.ctx
            .parts
            .hardware
            .set_repeating_request(id, &request)
            .map_err(|e| e.at(CaptureStage::SubmitRequest))?;
        if let Some(session) = self.ctx.session.as_mut() {
            session.repeating = true;
        }
        if kind == SessionKind::Preview {
            self.notifier.publish(Notification::PreviewStarted);
        }
        Ok(())
    }

    fn prepare_recorder(&mut self, request: RecordingRequest) -> CoreResult<()> {
        let size = self.plan.video_size.ok_or_else(|| {
            CoreError::capture(
                CaptureStage::Recorder,
                format!("camera {} cannot record video", self.plan.camera_id),
            )
        })?;
        let config = RecorderConfig {
            output_path: request.output_path,
            size,
            bitrate_bps: self.recorder_settings.bitrate_bps,
            frame_rate: self.recorder_settings.frame_rate,
            rotation_hint: self.plan.rotation,
        };
        debug!(
            path = %config.output_path.display(),
            size = %config.size,
            bitrate = config.bitrate_bps,
            fps = config.frame_rate,
            rotation = %config.rotation_hint,
            "Preparing recorder"
        );
        self.ctx
            .parts
            .recorder
            .configure(&config)
            .map_err(|e| e.at(CaptureStage::Recorder))?;
        self.ctx.recording_path = Some(config.output_path);
        Ok(())
    }

    fn stop_recorder(&mut self) -> CoreResult<()> {
        self.ctx.recording_path = None;
        if !self.ctx.recorder_running {
            return Ok(());
        }
        self.ctx.recorder_running = false;
        let path = self
            .ctx
            .parts
            .recorder
            .stop()
            .map_err(|e| e.at(CaptureStage::Recorder))?;
        info!(path = %path.display(), "Recording saved");
        self.notifier.publish(Notification::RecordingSaved(path));
        Ok(())
    }

    /// Close the session, logging instead of failing
    fn release_session(&mut self) {
        if let Err(e) = self.close_session() {
            warn!(error = %e, "Failed to stop repeating request");
        }
    }

    fn release_device(&mut self) {
        if self.ctx.device_open {
            info!(camera = %self.plan.camera_id, "Closing camera");
            self.ctx.parts.hardware.close_device();
            self.ctx.device_open = false;
        }
    }

    /// Write a still and release its buffer
    ///
    /// A write failure is reported but leaves the capture state alone.
    fn save_still(&mut self, image: StillImage) {
        let sink = &self.ctx.parts.file_sink;
        let result = sink.allocate_still_path().and_then(|path| {
            sink.write(&image.data, &path)?;
            Ok(path)
        });
        drop(image);

        match result {
            Ok(path) => {
                info!(path = %path.display(), "Still image saved");
                self.notifier.publish(Notification::StillSaved(path));
            }
            Err(e) => {
                error!(error = %e, "Failed to save still image");
                self.notifier.publish(Notification::Failed(e.into()));
            }
        }
    }

    /// Handle a job left in the queue after shutdown was requested
    ///
    /// Stills are still written so their buffers are only released after the
    /// write; everything else is dropped.
    pub fn finish_pending(&mut self, job: Job) {
        match job {
            Job::SaveStill(image)
            | Job::Hardware(HardwareEvent::StillImageAvailable(image)) => self.save_still(image),
            other => debug!(job = ?other, "Dropping job queued after shutdown"),
        }
    }

    /// Release everything in order: repeating request, session, device,
    /// then the recorder
    ///
    /// Safe to call more than once.
    pub fn teardown(&mut self) {
        debug!(state = %self.state, "Tearing down camera session");
        self.ctx.pending_recording = None;
        self.release_session();
        self.release_device();
        if let Err(e) = self.stop_recorder() {
            warn!(error = %e, "Failed to finalize recording");
        }
        if self.state != CaptureState::Idle {
            self.state = CaptureState::Idle;
            self.notifier.state_changed(CaptureState::Idle);
        }
    }
}

impl std::fmt::Debug for CaptureSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSessionController")
            .field("camera", &self.plan.camera_id)
            .field("state", &self.state)
            .field("session", &self.ctx.session)
            .finish()
    }
}
