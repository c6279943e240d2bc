// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera session core
//!
//! Every failure that crosses the core/UI boundary is one of the four
//! [`CoreError`] kinds. Hardware-layer failures arrive as
//! [`BackendError`](crate::backends::camera::BackendError) and are converted
//! with the stage at which they happened.

use std::fmt;

/// Result type alias using CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Point in the capture flow where a hardware call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureStage {
    /// Opening the camera device
    Open,
    /// Device-level error or disconnection after open
    Device,
    /// Creating or configuring a capture session
    CreateSession,
    /// Submitting a repeating or one-shot capture request
    SubmitRequest,
    /// Configuring, starting or stopping the recorder
    Recorder,
    /// The background worker is gone
    Worker,
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureStage::Open => "open",
            CaptureStage::Device => "device",
            CaptureStage::CreateSession => "create-session",
            CaptureStage::SubmitRequest => "submit-request",
            CaptureStage::Recorder => "recorder",
            CaptureStage::Worker => "worker",
        };
        write!(f, "{}", name)
    }
}

/// Main error type of the core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Bad input to negotiation or construction (programming error)
    InvalidArgument(String),
    /// No back-facing camera was found
    NoCameraAvailable,
    /// Open, session or request failure; the state machine returns to Idle
    Capture { stage: CaptureStage, cause: String },
    /// Writing a still or video output failed
    Io(String),
}

impl CoreError {
    /// Shorthand for a capture error at the given stage
    pub fn capture(stage: CaptureStage, cause: impl Into<String>) -> Self {
        CoreError::Capture {
            stage,
            cause: cause.into(),
        }
    }

    /// Stage of a capture error, if this is one
    pub fn stage(&self) -> Option<CaptureStage> {
        match self {
            CoreError::Capture { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CoreError::NoCameraAvailable => write!(f, "No back-facing camera available"),
            CoreError::Capture { stage, cause } => {
                write!(f, "Capture error during {}: {}", stage, cause)
            }
            CoreError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}

// Conversions for I/O errors
impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Io(err.to_string())
    }
}
