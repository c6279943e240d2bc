// SPDX-License-Identifier: GPL-3.0-only

//! Capture state machine
//!
//! The transition function is pure: it maps the current state and one event
//! to the next state plus the effects to run. The controller executes the
//! effects against the hardware and feeds the outcomes back in as events.

use crate::backends::camera::{AfState, RecordingRequest, StillImage};
use crate::errors::{CaptureStage, CoreError};
use serde::Serialize;

/// Capture state of the open camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CaptureState {
    /// No device open, or the last open ended in an error
    #[default]
    Idle,
    /// Repeating preview on a preview session
    Previewing,
    /// Autofocus trigger submitted, waiting for the lock
    AwaitingFocusLock,
    /// Repeating request feeding preview and recorder
    Recording,
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureState::Idle => write!(f, "idle"),
            CaptureState::Previewing => write!(f, "previewing"),
            CaptureState::AwaitingFocusLock => write!(f, "awaiting-focus-lock"),
            CaptureState::Recording => write!(f, "recording"),
        }
    }
}

/// Target-surface set of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Preview and still surfaces
    Preview,
    /// Preview, recorder and still surfaces
    Recording,
}

/// Input to the state machine
#[derive(Debug)]
pub enum Event {
    /// The device opened; `pending_recording` resumes a recording that was
    /// requested before the device was (re)opened
    DeviceOpened {
        pending_recording: Option<RecordingRequest>,
    },
    /// The current session finished configuring
    SessionConfigured,
    /// Autofocus progress of the one-shot trigger request
    CaptureProgressed(AfState),
    /// The image reader produced a still
    StillImageAvailable(StillImage),
    /// A hardware or recorder call failed
    Failed { stage: CaptureStage, cause: String },
    /// The device was disconnected
    Disconnected,
    /// UI: lock focus, then take a picture
    LockFocus,
    /// UI: start recording into a file
    StartRecording(RecordingRequest),
    /// UI: stop the running recording
    StopRecording,
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::DeviceOpened { .. } => "device-opened",
            Event::SessionConfigured => "session-configured",
            Event::CaptureProgressed(_) => "capture-progressed",
            Event::StillImageAvailable(_) => "still-image-available",
            Event::Failed { .. } => "failed",
            Event::Disconnected => "disconnected",
            Event::LockFocus => "lock-focus",
            Event::StartRecording(_) => "start-recording",
            Event::StopRecording => "stop-recording",
        }
    }
}

/// Work the controller performs on behalf of a transition, in order
#[derive(Debug)]
pub enum Effect {
    /// Create a new session over the kind's target set
    OpenSession(SessionKind),
    /// Stop the repeating request and close the current session
    CloseSession,
    /// Install the repeating request for the kind
    StartRepeating(SessionKind),
    /// One-shot preview request with the autofocus trigger set
    TriggerAutofocus,
    /// One-shot still capture tagged with the plan rotation
    CaptureStill,
    /// Configure the recorder for a new output file
    PrepareRecorder(RecordingRequest),
    StartRecorder,
    StopRecorder,
    /// Hand a still to the file sink as a separate worker job
    SaveStill(StillImage),
    /// Close session and device
    ReleaseDevice,
    /// Publish an error to the UI
    Report(CoreError),
}

/// Outcome of one transition
#[derive(Debug)]
pub struct Transition {
    pub next: CaptureState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: CaptureState, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }

    fn stay(state: CaptureState) -> Self {
        Self {
            next: state,
            effects: Vec::new(),
        }
    }

    /// Whether the event had no effect at all
    pub fn is_noop(&self, from: CaptureState) -> bool {
        self.next == from && self.effects.is_empty()
    }
}

/// Compute the next state and effects for `event` in `state`
///
/// Events that have no meaning in the current state leave it unchanged and
/// produce no effects.
pub fn transition(state: CaptureState, event: Event) -> Transition {
    use CaptureState::*;

    match (state, event) {
        // Errors win in every state
        (from, Event::Failed { stage, cause }) => fail(from, CoreError::Capture { stage, cause }),
        (from, Event::Disconnected) => fail(
            from,
            CoreError::capture(CaptureStage::Device, "camera disconnected"),
        ),

        // The frame exists already; save it whatever happened since
        (from, Event::StillImageAvailable(image)) => {
            Transition::to(from, vec![Effect::SaveStill(image)])
        }

        (Idle, Event::DeviceOpened { pending_recording }) => match pending_recording {
            None => Transition::to(Previewing, vec![Effect::OpenSession(SessionKind::Preview)]),
            Some(request) => Transition::to(
                Recording,
                vec![
                    Effect::PrepareRecorder(request),
                    Effect::OpenSession(SessionKind::Recording),
                ],
            ),
        },

        (Previewing, Event::SessionConfigured) => Transition::to(
            Previewing,
            vec![Effect::StartRepeating(SessionKind::Preview)],
        ),
        (Recording, Event::SessionConfigured) => Transition::to(
            Recording,
            vec![
                Effect::StartRepeating(SessionKind::Recording),
                Effect::StartRecorder,
            ],
        ),

        (Previewing, Event::LockFocus) => {
            Transition::to(AwaitingFocusLock, vec![Effect::TriggerAutofocus])
        }
        (AwaitingFocusLock, Event::CaptureProgressed(af_state)) if af_state.is_locked() => {
            Transition::to(Previewing, vec![Effect::CaptureStill])
        }

        (Previewing, Event::StartRecording(request)) => Transition::to(
            Recording,
            vec![
                Effect::CloseSession,
                Effect::PrepareRecorder(request),
                Effect::OpenSession(SessionKind::Recording),
            ],
        ),
        (Recording, Event::StopRecording) => Transition::to(
            Previewing,
            vec![
                Effect::StopRecorder,
                Effect::CloseSession,
                Effect::OpenSession(SessionKind::Preview),
            ],
        ),

        (from, _) => Transition::stay(from),
    }
}

fn fail(from: CaptureState, error: CoreError) -> Transition {
    let mut effects = Vec::with_capacity(3);
    if from == CaptureState::Recording {
        effects.push(Effect::StopRecorder);
    }
    effects.push(Effect::ReleaseDevice);
    effects.push(Effect::Report(error));
    Transition::to(CaptureState::Idle, effects)
}
