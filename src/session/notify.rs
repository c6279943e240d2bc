// SPDX-License-Identifier: GPL-3.0-only

//! Notifications from the camera worker to the UI

use super::state::CaptureState;
use crate::errors::CoreError;
use std::path::PathBuf;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Something the UI should display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The capture state changed
    StateChanged(CaptureState),
    /// The preview repeating request is running; intents are accepted
    PreviewStarted,
    /// A still image was written
    StillSaved(PathBuf),
    /// The recorder started writing into this file
    RecordingStarted(PathBuf),
    /// A recording was finalized
    RecordingSaved(PathBuf),
    /// An asynchronous failure
    Failed(CoreError),
}

/// Publishing side, owned by the controller on the worker thread
///
/// Both channels are non-blocking, so publishing never stalls the worker.
#[derive(Debug)]
pub struct Notifier {
    state: watch::Sender<CaptureState>,
    events: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn new(
        state: watch::Sender<CaptureState>,
        events: mpsc::UnboundedSender<Notification>,
    ) -> Self {
        Self { state, events }
    }

    /// Create a notifier together with both receiving ends
    pub fn channel() -> (
        Self,
        watch::Receiver<CaptureState>,
        mpsc::UnboundedReceiver<Notification>,
    ) {
        let (state_tx, state_rx) = watch::channel(CaptureState::Idle);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (Self::new(state_tx, events_tx), state_rx, events_rx)
    }

    /// Update the watched state and announce the change
    pub fn state_changed(&self, state: CaptureState) {
        self.state.send_replace(state);
        self.publish(Notification::StateChanged(state));
    }

    pub fn publish(&self, notification: Notification) {
        if self.events.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }
}
