// SPDX-License-Identifier: GPL-3.0-only

//! Virtual recorder
//!
//! Accepts the same configure/start/stop sequence as a hardware encoder and
//! writes a small placeholder file describing the recording.

use super::journal::{HardwareCall, Journal};
use super::{FailPoint, VirtualControl};
use crate::backends::camera::{BackendError, BackendResult, RecorderConfig, RecorderSink};
use crate::constants::recorder::{CONTAINER, VIDEO_CODEC};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug)]
pub struct VirtualRecorder {
    control: VirtualControl,
    config: Option<RecorderConfig>,
    recording: bool,
}

impl VirtualRecorder {
    pub fn new(control: VirtualControl) -> Self {
        Self {
            control,
            config: None,
            recording: false,
        }
    }

    fn journal(&self) -> &Journal {
        self.control.journal()
    }
}

impl RecorderSink for VirtualRecorder {
    fn configure(&mut self, config: &RecorderConfig) -> BackendResult<()> {
        if self.recording {
            return Err(BackendError::Rejected("recorder is running".into()));
        }
        self.control.check(FailPoint::RecorderConfigure)?;
        self.journal()
            .record(HardwareCall::RecorderConfigure(config.clone()));
        debug!(path = %config.output_path.display(), size = %config.size, "Recorder configured");
        self.config = Some(config.clone());
        Ok(())
    }

    fn start(&mut self) -> BackendResult<()> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| BackendError::Rejected("recorder is not configured".into()))?;
        if self.recording {
            return Err(BackendError::Rejected("recorder already running".into()));
        }
        self.control.check(FailPoint::RecorderStart)?;

        let header = format!(
            "{} {} {} {}bps {}fps rotation={}\n",
            CONTAINER,
            VIDEO_CODEC,
            config.size,
            config.bitrate_bps,
            config.frame_rate,
            config.rotation_hint.degrees()
        );
        std::fs::write(&config.output_path, header)?;

        self.journal().record(HardwareCall::RecorderStart);
        self.recording = true;
        info!(path = %config.output_path.display(), "Virtual recording started");
        Ok(())
    }

    fn stop(&mut self) -> BackendResult<PathBuf> {
        if !self.recording {
            return Err(BackendError::Rejected("recorder is not running".into()));
        }
        self.recording = false;
        let config = self
            .config
            .take()
            .ok_or_else(|| BackendError::Rejected("recorder is not configured".into()))?;
        self.journal().record(HardwareCall::RecorderStop);
        self.control.check(FailPoint::RecorderStop)?;
        info!(path = %config.output_path.display(), "Virtual recording stopped");
        Ok(config.output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{Resolution, RotationAngle};

    fn config(path: PathBuf) -> RecorderConfig {
        RecorderConfig {
            output_path: path,
            size: Resolution::new(1280, 720).unwrap(),
            bitrate_bps: 1_000_000,
            frame_rate: 30,
            rotation_hint: RotationAngle::DEG_90,
        }
    }

    #[test]
    fn test_start_creates_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("VIDEO_test.mp4");
        let control = VirtualControl::new();
        let mut recorder = VirtualRecorder::new(control.clone());

        recorder.configure(&config(path.clone())).unwrap();
        assert!(!path.exists());
        recorder.start().unwrap();
        assert!(path.exists());
        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.contains("rotation=90"));

        assert_eq!(recorder.stop().unwrap(), path);
        assert_eq!(
            control.journal().calls(),
            vec![
                HardwareCall::RecorderConfigure(config(path)),
                HardwareCall::RecorderStart,
                HardwareCall::RecorderStop,
            ]
        );
    }

    #[test]
    fn test_start_without_configure_is_rejected() {
        let mut recorder = VirtualRecorder::new(VirtualControl::new());
        assert!(matches!(recorder.start(), Err(BackendError::Rejected(_))));
        assert!(matches!(recorder.stop(), Err(BackendError::Rejected(_))));
    }

    #[test]
    fn test_injected_start_failure() {
        let dir = tempfile::tempdir().unwrap();
        let control = VirtualControl::new();
        let mut recorder = VirtualRecorder::new(control.clone());
        recorder.configure(&config(dir.path().join("a.mp4"))).unwrap();

        control.fail_next(FailPoint::RecorderStart);
        assert!(recorder.start().is_err());
        // One-shot
        assert!(recorder.start().is_ok());
    }
}
