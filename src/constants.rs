// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Recorder defaults
///
/// The recorder writes H.264 into an MPEG-4 container. Bitrate and frame rate
/// can be overridden from the user config.
pub mod recorder {
    /// Video encoder bitrate in bits per second (1 Mbit/s)
    pub const DEFAULT_BITRATE_BPS: u32 = 1_000_000;
    /// Video frame rate
    pub const DEFAULT_FRAME_RATE: u32 = 30;
    /// Container written by the recorder
    pub const CONTAINER: &str = "mp4";
    /// Video codec used by the recorder
    pub const VIDEO_CODEC: &str = "h264";
}

/// Output file naming
pub mod storage {
    /// Folder created under the user's picture and video directories
    pub const MEDIA_FOLDER_NAME: &str = "Camera2VideoImage";
    /// Prefix for still images
    pub const IMAGE_PREFIX: &str = "IMAGE";
    /// Prefix for recordings
    pub const VIDEO_PREFIX: &str = "VIDEO";
    /// Still image extension
    pub const IMAGE_EXTENSION: &str = "jpg";
    /// Recording extension
    pub const VIDEO_EXTENSION: &str = "mp4";
    /// chrono format of the timestamp embedded in file names
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
    /// Length of the random suffix keeping names unique within one second
    pub const UNIQUE_SUFFIX_LEN: usize = 8;
}

/// Name of the background worker thread running all capture callbacks
pub const WORKER_THREAD_NAME: &str = "camera2";

/// Directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "camera-session";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default preview surface size used by the CLI when none is given
pub const DEFAULT_SURFACE_WIDTH: u32 = 1080;
pub const DEFAULT_SURFACE_HEIGHT: u32 = 1920;

/// How long the CLI waits for a capture notification before giving up
pub const CLI_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

/// JPEG quality of frames produced by the virtual camera
pub const VIRTUAL_JPEG_QUALITY: u8 = 85;
