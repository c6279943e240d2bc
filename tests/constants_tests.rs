// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use camera_session::constants::{self, recorder, storage};

#[test]
fn test_recorder_defaults() {
    assert_eq!(recorder::DEFAULT_BITRATE_BPS, 1_000_000);
    assert_eq!(recorder::DEFAULT_FRAME_RATE, 30);
    assert_eq!(recorder::CONTAINER, "mp4");
    assert_eq!(recorder::VIDEO_CODEC, "h264");
}

#[test]
fn test_file_naming() {
    assert_eq!(storage::IMAGE_PREFIX, "IMAGE");
    assert_eq!(storage::VIDEO_PREFIX, "VIDEO");
    assert_eq!(storage::IMAGE_EXTENSION, "jpg");
    assert_eq!(storage::VIDEO_EXTENSION, recorder::CONTAINER);

    // Timestamp format must produce yyyyMMdd_HHmmss
    let stamp = chrono::NaiveDate::from_ymd_opt(2024, 3, 7)
        .and_then(|d| d.and_hms_opt(9, 5, 1))
        .unwrap()
        .format(storage::TIMESTAMP_FORMAT)
        .to_string();
    assert_eq!(stamp, "20240307_090501");
}

#[test]
fn test_worker_thread_name() {
    assert_eq!(constants::WORKER_THREAD_NAME, "camera2");
}

#[test]
fn test_default_surface_is_portrait() {
    assert!(constants::DEFAULT_SURFACE_HEIGHT > constants::DEFAULT_SURFACE_WIDTH);
}
