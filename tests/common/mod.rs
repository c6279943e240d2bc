// SPDX-License-Identifier: MPL-2.0

//! Shared helpers for session integration tests

#![allow(dead_code)]

use camera_session::backends::camera::{
    CameraCharacteristics, DisplayRotation, LensFacing, Resolution,
};
use camera_session::backends::virtual_camera::{VirtualControl, VirtualProfile, virtual_parts};
use camera_session::session::{CameraSession, CaptureState, Notification, SessionOptions};
use camera_session::storage::MediaStorage;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

/// How long to wait for the worker before failing a test
pub const WAIT: Duration = Duration::from_secs(5);

pub fn res(width: u32, height: u32) -> Resolution {
    Resolution::new(width, height).unwrap()
}

/// Back camera at 90° with sizes small enough to encode quickly
pub fn small_profile() -> VirtualProfile {
    VirtualProfile {
        cameras: vec![
            CameraCharacteristics {
                id: "1".into(),
                facing: LensFacing::Front,
                sensor_orientation: 270,
                preview_sizes: vec![res(320, 180)],
                video_sizes: vec![res(320, 180)],
                still_sizes: vec![res(320, 180)],
            },
            CameraCharacteristics {
                id: "0".into(),
                facing: LensFacing::Back,
                sensor_orientation: 90,
                preview_sizes: vec![res(640, 360), res(320, 180), res(160, 120)],
                video_sizes: vec![res(640, 360), res(320, 180)],
                still_sizes: vec![res(320, 180), res(160, 120)],
            },
        ],
        ..VirtualProfile::default()
    }
}

/// An open session on the virtual camera plus everything to observe it
pub struct Rig {
    pub session: CameraSession,
    pub control: VirtualControl,
    pub storage: MediaStorage,
    pub notifications: UnboundedReceiver<Notification>,
    pub dir: TempDir,
}

impl Rig {
    pub fn open(profile: VirtualProfile) -> Self {
        Self::open_with(profile, |options| options)
    }

    pub fn open_with(
        profile: VirtualProfile,
        customize: impl FnOnce(SessionOptions) -> SessionOptions,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path().join("pictures"), dir.path().join("videos"));
        let (parts, control) = virtual_parts(profile, Box::new(storage.clone()));

        let options = customize(SessionOptions::new(res(180, 320)));
        let mut session = CameraSession::open(parts, &DisplayRotation::Rot0, options).unwrap();
        let notifications = session.take_notifications().unwrap();

        Self {
            session,
            control,
            storage,
            notifications,
            dir,
        }
    }

    /// Next notification, failing the test after [`WAIT`]
    pub async fn next(&mut self) -> Notification {
        tokio::time::timeout(WAIT, self.notifications.recv())
            .await
            .expect("timed out waiting for a notification")
            .expect("notification channel closed")
    }

    /// Skip notifications until `pick` accepts one
    pub async fn wait_for<T>(&mut self, mut pick: impl FnMut(&Notification) -> Option<T>) -> T {
        loop {
            let notification = self.next().await;
            if let Some(value) = pick(&notification) {
                return value;
            }
        }
    }

    pub async fn wait_for_state(&mut self, state: CaptureState) {
        self.wait_for(|n| (*n == Notification::StateChanged(state)).then_some(()))
            .await
    }

    /// Wait until the preview runs and intents are accepted
    pub async fn wait_for_preview(&mut self) {
        self.wait_for(|n| (*n == Notification::PreviewStarted).then_some(()))
            .await
    }

    /// Drain what is already queued without waiting
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            out.push(notification);
        }
        out
    }
}
