// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::errors::{CaptureStage, CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Output resolution in pixels
///
/// Both dimensions are always non-zero. The text form is `WIDTHxHEIGHT`,
/// which is also what device profiles and the CLI use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Create a resolution, rejecting zero dimensions
    pub fn new(width: u32, height: u32) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidArgument(format!(
                "resolution must be non-zero, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    /// Pixel count
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Aspect ratio expressed as height / width
    pub fn aspect(&self) -> f64 {
        self.height as f64 / self.width as f64
    }

    /// Same resolution with width and height exchanged
    pub fn swapped(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidArgument(format!("invalid resolution '{}'", s));
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width = w.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = h.trim().parse::<u32>().map_err(|_| invalid())?;
        Resolution::new(width, height)
    }
}

impl TryFrom<String> for Resolution {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

/// Compensation angle in degrees, always normalized into [0, 360)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct RotationAngle(u32);

impl RotationAngle {
    pub const DEG_0: RotationAngle = RotationAngle(0);
    pub const DEG_90: RotationAngle = RotationAngle(90);
    pub const DEG_180: RotationAngle = RotationAngle(180);
    pub const DEG_270: RotationAngle = RotationAngle(270);

    /// Create an angle from any integer degree value (normalised to 0-360)
    pub fn from_degrees(degrees: i64) -> Self {
        RotationAngle(degrees.rem_euclid(360) as u32)
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        self.0
    }

    /// Check if rotation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        self.0 == 90 || self.0 == 270
    }
}

impl From<u32> for RotationAngle {
    fn from(degrees: u32) -> Self {
        RotationAngle::from_degrees(degrees as i64)
    }
}

impl From<RotationAngle> for u32 {
    fn from(angle: RotationAngle) -> Self {
        angle.0
    }
}

impl std::fmt::Display for RotationAngle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Discrete display rotation reported by the window system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisplayRotation {
    #[default]
    Rot0,
    Rot90,
    Rot180,
    Rot270,
}

impl DisplayRotation {
    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            DisplayRotation::Rot0 => 0,
            DisplayRotation::Rot90 => 90,
            DisplayRotation::Rot180 => 180,
            DisplayRotation::Rot270 => 270,
        }
    }

    /// Map a degree value back to a display state (only exact quarter turns)
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(DisplayRotation::Rot0),
            90 => Some(DisplayRotation::Rot90),
            180 => Some(DisplayRotation::Rot180),
            270 => Some(DisplayRotation::Rot270),
            _ => None,
        }
    }
}

impl FromStr for DisplayRotation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(DisplayRotation::from_degrees)
            .ok_or_else(|| {
                CoreError::InvalidArgument(format!(
                    "display rotation must be 0, 90, 180 or 270, got '{}'",
                    s
                ))
            })
    }
}

/// Direction the lens faces relative to the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensFacing {
    Front,
    Back,
}

impl std::fmt::Display for LensFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LensFacing::Front => write!(f, "front"),
            LensFacing::Back => write!(f, "back"),
        }
    }
}

/// Kind of output surface a stream is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// On-screen preview
    Preview,
    /// Recorder input surface
    Record,
    /// Still image reader
    Still,
}

/// A concrete output surface bound into a session, sized by the stream plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputTarget {
    Preview(Resolution),
    Record(Resolution),
    Still(Resolution),
}

impl OutputTarget {
    /// Output kind of this target
    pub fn kind(&self) -> OutputKind {
        match self {
            OutputTarget::Preview(_) => OutputKind::Preview,
            OutputTarget::Record(_) => OutputKind::Record,
            OutputTarget::Still(_) => OutputKind::Still,
        }
    }

    /// Buffer size of the surface
    pub fn size(&self) -> Resolution {
        match self {
            OutputTarget::Preview(size) | OutputTarget::Record(size) | OutputTarget::Still(size) => {
                *size
            }
        }
    }
}

/// Static description of one camera as reported by device enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraCharacteristics {
    /// Backend camera identifier
    pub id: String,
    /// Lens facing
    pub facing: LensFacing,
    /// Clockwise angle the sensor is mounted at
    pub sensor_orientation: u32,
    /// Supported sizes for the preview surface
    #[serde(default)]
    pub preview_sizes: Vec<Resolution>,
    /// Supported sizes for the recorder surface
    #[serde(default)]
    pub video_sizes: Vec<Resolution>,
    /// Supported JPEG still sizes
    #[serde(default)]
    pub still_sizes: Vec<Resolution>,
}

impl CameraCharacteristics {
    /// Candidate sizes for one output kind
    pub fn candidates(&self, kind: OutputKind) -> &[Resolution] {
        match kind {
            OutputKind::Preview => &self.preview_sizes,
            OutputKind::Record => &self.video_sizes,
            OutputKind::Still => &self.still_sizes,
        }
    }
}

/// Autofocus state reported in capture results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfState {
    #[default]
    Inactive,
    PassiveScan,
    PassiveFocused,
    PassiveUnfocused,
    ActiveScan,
    /// Focus locked after a trigger
    FocusedLocked,
    /// Lock reached without focus; also what fixed-focus sensors report
    NotFocusedLocked,
}

impl AfState {
    /// Whether the autofocus routine has settled into a lock
    pub fn is_locked(&self) -> bool {
        matches!(self, AfState::FocusedLocked | AfState::NotFocusedLocked)
    }
}

/// Request template, selecting the device's tuning for the use case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestTemplate {
    Preview,
    Record,
    StillCapture,
}

/// A capture request bound to a set of session outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub template: RequestTemplate,
    pub targets: Vec<OutputKind>,
    /// Start an autofocus scan with this request
    pub af_trigger: bool,
    /// Orientation written into the still's metadata
    pub jpeg_orientation: Option<RotationAngle>,
}

impl CaptureRequest {
    /// Repeating preview request on the preview surface alone
    pub fn preview() -> Self {
        Self {
            template: RequestTemplate::Preview,
            targets: vec![OutputKind::Preview],
            af_trigger: false,
            jpeg_orientation: None,
        }
    }

    /// Repeating request feeding preview and recorder together
    pub fn recording() -> Self {
        Self {
            template: RequestTemplate::Record,
            targets: vec![OutputKind::Preview, OutputKind::Record],
            af_trigger: false,
            jpeg_orientation: None,
        }
    }

    /// One-shot still capture into the image reader
    pub fn still(rotation: RotationAngle) -> Self {
        Self {
            template: RequestTemplate::StillCapture,
            targets: vec![OutputKind::Still],
            af_trigger: false,
            jpeg_orientation: Some(rotation),
        }
    }

    /// Copy of this request carrying an autofocus trigger
    pub fn with_af_trigger(&self) -> Self {
        Self {
            af_trigger: true,
            ..self.clone()
        }
    }
}

/// Identifier of one hardware capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Encoded still image delivered by the image reader
///
/// The frame buffer backing the image is handed back to the hardware when
/// the image is dropped, via the optional release hook.
pub struct StillImage {
    pub width: u32,
    pub height: u32,
    /// Encoded bytes (JPEG)
    pub data: Vec<u8>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl StillImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
            release: None,
        }
    }

    /// Attach a hook run when the image buffer is released
    pub fn with_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.release = Some(Box::new(release));
        self
    }
}

impl Drop for StillImage {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for StillImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "StillImage({}x{}, {} bytes)",
            self.width,
            self.height,
            self.data.len()
        )
    }
}

/// UI request to record into a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingRequest {
    pub output_path: PathBuf,
}

impl RecordingRequest {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }
}

/// Everything the recorder needs before its input surface exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    pub output_path: PathBuf,
    pub size: Resolution,
    pub bitrate_bps: u32,
    pub frame_rate: u32,
    /// Rotation written into the container so players show the video upright
    pub rotation_hint: RotationAngle,
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Camera device not found
    DeviceNotFound(String),
    /// Operation on a session that is closed or unknown
    SessionClosed(SessionId),
    /// The device refused the call (busy, bad state, bad request)
    Rejected(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl BackendError {
    /// Convert into the core taxonomy, recording where the failure happened
    pub fn at(self, stage: CaptureStage) -> CoreError {
        CoreError::capture(stage, self.to_string())
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::SessionClosed(id) => write!(f, "{} is closed", id),
            BackendError::Rejected(msg) => write!(f, "Request rejected: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_rejects_zero() {
        assert!(Resolution::new(0, 1080).is_err());
        assert!(Resolution::new(1920, 0).is_err());
        let res = Resolution::new(1920, 1080).unwrap();
        assert_eq!(res.area(), 2_073_600);
        assert_eq!(res.swapped(), Resolution::new(1080, 1920).unwrap());
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!(
            "1280x720".parse::<Resolution>().unwrap(),
            Resolution::new(1280, 720).unwrap()
        );
        assert_eq!(
            " 640X480 ".parse::<Resolution>().unwrap(),
            Resolution::new(640, 480).unwrap()
        );
        assert!("1280".parse::<Resolution>().is_err());
        assert!("0x720".parse::<Resolution>().is_err());
        assert!("axb".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_resolution_serde_text_form() {
        let res = Resolution::new(1920, 1080).unwrap();
        let json = serde_json::to_string(&res).unwrap();
        assert_eq!(json, "\"1920x1080\"");
        let back: Resolution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, res);
        assert!(serde_json::from_str::<Resolution>("\"0x10\"").is_err());
    }

    #[test]
    fn test_rotation_angle_normalizes() {
        assert_eq!(RotationAngle::from_degrees(450).degrees(), 90);
        assert_eq!(RotationAngle::from_degrees(-90).degrees(), 270);
        assert_eq!(RotationAngle::from_degrees(360).degrees(), 0);
        assert!(RotationAngle::DEG_270.swaps_dimensions());
        assert!(!RotationAngle::DEG_180.swaps_dimensions());
    }

    #[test]
    fn test_display_rotation_parse() {
        assert_eq!("90".parse::<DisplayRotation>().unwrap(), DisplayRotation::Rot90);
        assert_eq!(DisplayRotation::Rot270.degrees(), 270);
        assert!("45".parse::<DisplayRotation>().is_err());
    }

    #[test]
    fn test_af_state_locked() {
        assert!(AfState::FocusedLocked.is_locked());
        assert!(AfState::NotFocusedLocked.is_locked());
        assert!(!AfState::ActiveScan.is_locked());
        assert!(!AfState::PassiveFocused.is_locked());
    }

    #[test]
    fn test_still_image_release_runs_on_drop() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        let released = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&released);
        let image = StillImage::new(4, 3, vec![0xff, 0xd8]).with_release(move || {
            flag.store(true, Ordering::SeqCst);
        });
        assert!(!released.load(Ordering::SeqCst));
        drop(image);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_af_trigger_keeps_template_and_targets() {
        let trigger = CaptureRequest::preview().with_af_trigger();
        assert!(trigger.af_trigger);
        assert_eq!(trigger.template, RequestTemplate::Preview);
        assert_eq!(trigger.targets, vec![OutputKind::Preview]);
    }
}
