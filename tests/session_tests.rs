// SPDX-License-Identifier: MPL-2.0

//! End-to-end tests of the camera session on the virtual camera

mod common;

use camera_session::backends::camera::{
    DisplayRotation, RecordingRequest, RotationAngle, SessionId,
};
use camera_session::backends::virtual_camera::{HardwareCall, VirtualProfile, virtual_parts};
use camera_session::session::{CameraSession, CaptureState, Notification, SessionOptions};
use camera_session::storage::MediaStorage;
use camera_session::{CaptureStage, CoreError};
use common::{Rig, WAIT, res, small_profile};

#[tokio::test]
async fn test_plan_is_built_on_open() {
    let rig = Rig::open(small_profile());
    let plan = rig.session.plan();

    assert_eq!(plan.camera_id, "0");
    assert_eq!(plan.rotation, RotationAngle::DEG_90);
    assert_eq!(plan.preview_size, res(320, 180));
    assert_eq!(plan.video_size, Some(res(320, 180)));
    assert_eq!(plan.still_size, Some(res(320, 180)));
    assert_eq!(plan.display_preview_size(), res(180, 320));
}

#[tokio::test]
async fn test_photo_is_saved() {
    let mut rig = Rig::open(small_profile());
    rig.wait_for_preview().await;

    rig.session.lock_focus().unwrap();
    let path = rig
        .wait_for(|n| match n {
            Notification::StillSaved(path) => Some(path.clone()),
            _ => None,
        })
        .await;

    assert!(path.starts_with(rig.storage.picture_dir()));
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("IMAGE_") && name.ends_with(".jpg"), "{}", name);

    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 180));
    assert_eq!(rig.session.state(), CaptureState::Previewing);
}

#[tokio::test]
async fn test_record_and_stop() {
    let mut rig = Rig::open(small_profile());
    rig.wait_for_preview().await;

    let output = rig.storage.next_video_path().unwrap();
    rig.session
        .start_recording(RecordingRequest::new(output.clone()))
        .unwrap();
    let started = rig
        .wait_for(|n| match n {
            Notification::RecordingStarted(path) => Some(path.clone()),
            _ => None,
        })
        .await;
    assert_eq!(started, output);
    assert_eq!(rig.session.state(), CaptureState::Recording);

    rig.session.stop_recording().unwrap();
    let saved = rig
        .wait_for(|n| match n {
            Notification::RecordingSaved(path) => Some(path.clone()),
            _ => None,
        })
        .await;
    assert_eq!(saved, output);
    assert!(output.exists());
    assert_eq!(rig.session.state(), CaptureState::Previewing);

    let journal = rig.control.journal();
    let close_old = journal
        .position(|c| *c == HardwareCall::CloseSession(SessionId(1)))
        .unwrap();
    let create_new = journal
        .position(|c| matches!(c, HardwareCall::CreateSession { id: SessionId(2), .. }))
        .unwrap();
    let start = journal
        .position(|c| *c == HardwareCall::RecorderStart)
        .unwrap();
    assert!(close_old < create_new);
    assert!(create_new < start);
}

#[tokio::test]
async fn test_close_while_recording_finalizes() {
    let mut rig = Rig::open(small_profile());
    rig.wait_for_preview().await;

    let output = rig.storage.next_video_path().unwrap();
    rig.session
        .start_recording(RecordingRequest::new(output.clone()))
        .unwrap();
    rig.wait_for(|n| matches!(n, Notification::RecordingStarted(_)).then_some(()))
        .await;

    rig.session.close();
    rig.session.close();

    let journal = rig.control.journal();
    let close_device = journal
        .position(|c| *c == HardwareCall::CloseDevice)
        .unwrap();
    let stop = journal
        .position(|c| *c == HardwareCall::RecorderStop)
        .unwrap();
    assert!(close_device < stop);
    assert_eq!(journal.count(|c| *c == HardwareCall::CloseDevice), 1);

    let notifications = rig.drain();
    assert!(notifications.contains(&Notification::RecordingSaved(output)));
    assert_eq!(rig.session.state(), CaptureState::Idle);

    assert!(matches!(
        rig.session.lock_focus(),
        Err(CoreError::Capture {
            stage: CaptureStage::Worker,
            ..
        })
    ));
}

#[tokio::test]
async fn test_drop_releases_camera() {
    let mut rig = Rig::open(small_profile());
    rig.wait_for_preview().await;

    let Rig {
        session, control, ..
    } = rig;
    drop(session);

    let journal = control.journal();
    assert_eq!(journal.count(|c| *c == HardwareCall::CloseDevice), 1);
    assert_eq!(
        journal.last_position(|c| matches!(c, HardwareCall::CloseSession(_))),
        journal.len().checked_sub(2)
    );
}

#[tokio::test]
async fn test_disconnect_reports_failure() {
    let mut rig = Rig::open(small_profile());
    rig.wait_for_preview().await;
    let mut state = rig.session.subscribe_state();

    assert!(rig.control.disconnect());
    let error = rig
        .wait_for(|n| match n {
            Notification::Failed(error) => Some(error.clone()),
            _ => None,
        })
        .await;
    assert_eq!(error.stage(), Some(CaptureStage::Device));

    tokio::time::timeout(WAIT, state.wait_for(|s| *s == CaptureState::Idle))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_recording_resumes_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("VIDEO_resumed.mp4");
    let request = RecordingRequest::new(output.clone());
    let mut rig = Rig::open_with(small_profile(), |options| SessionOptions {
        resume_recording: Some(request),
        ..options
    });

    rig.wait_for_state(CaptureState::Recording).await;
    let started = rig
        .wait_for(|n| match n {
            Notification::RecordingStarted(path) => Some(path.clone()),
            _ => None,
        })
        .await;
    assert_eq!(started, output);
}

#[test]
fn test_open_without_back_camera() {
    let mut profile = small_profile();
    profile.cameras.retain(|c| c.id == "1");
    let dir = tempfile::tempdir().unwrap();
    let (parts, control) = virtual_parts(profile, Box::new(MediaStorage::new(dir.path(), dir.path())));

    let result = CameraSession::open(
        parts,
        &DisplayRotation::Rot0,
        SessionOptions::new(res(180, 320)),
    );
    assert!(matches!(result, Err(CoreError::NoCameraAvailable)));
    assert!(control.journal().is_empty());
}

#[test]
fn test_resume_on_camera_without_video_is_rejected() {
    let mut profile = small_profile();
    for camera in &mut profile.cameras {
        camera.video_sizes.clear();
    }
    let dir = tempfile::tempdir().unwrap();
    let (parts, _control) = virtual_parts(profile, Box::new(MediaStorage::new(dir.path(), dir.path())));

    let options = SessionOptions {
        resume_recording: Some(RecordingRequest::new(dir.path().join("VIDEO.mp4"))),
        ..SessionOptions::new(res(180, 320))
    };
    let result = CameraSession::open(parts, &DisplayRotation::Rot0, options);
    assert!(matches!(result, Err(CoreError::InvalidArgument(_))));
}

#[test]
fn test_notifications_can_be_taken_once() {
    let dir = tempfile::tempdir().unwrap();
    let (parts, _control) = virtual_parts(
        VirtualProfile::fixed_focus(),
        Box::new(MediaStorage::new(dir.path(), dir.path())),
    );
    let mut session = CameraSession::open(
        parts,
        &DisplayRotation::Rot90,
        SessionOptions::new(res(1920, 1080)),
    )
    .unwrap();

    assert!(session.take_notifications().is_some());
    assert!(session.take_notifications().is_none());
    // 90 + 90
    assert_eq!(session.plan().rotation, RotationAngle::DEG_180);
}
