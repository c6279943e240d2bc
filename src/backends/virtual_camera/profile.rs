// SPDX-License-Identifier: GPL-3.0-only

//! Device profiles for the virtual camera
//!
//! A profile lists the simulated cameras and how autofocus behaves. Profiles
//! are JSON files so different phones can be mimicked without code changes:
//!
//! ```json
//! {
//!   "cameras": [
//!     {
//!       "id": "0",
//!       "facing": "back",
//!       "sensor_orientation": 90,
//!       "preview_sizes": ["1920x1080", "1280x720"],
//!       "video_sizes": ["1280x720"],
//!       "still_sizes": ["1280x720"]
//!     }
//!   ],
//!   "autofocus": ["active_scan", "focused_locked"]
//! }
//! ```

use crate::backends::camera::{
    AfState, BackendError, BackendResult, CameraCharacteristics, LensFacing, Resolution,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualProfile {
    /// Cameras in enumeration order
    pub cameras: Vec<CameraCharacteristics>,
    /// Autofocus states reported, in order, for every autofocus trigger
    #[serde(default = "default_autofocus")]
    pub autofocus: Vec<AfState>,
}

impl Default for VirtualProfile {
    /// A typical phone: back camera mounted at 90°, front camera at 270°
    fn default() -> Self {
        Self {
            cameras: vec![
                CameraCharacteristics {
                    id: "0".into(),
                    facing: LensFacing::Back,
                    sensor_orientation: 90,
                    preview_sizes: sizes(&[
                        (1920, 1080),
                        (1440, 1080),
                        (1280, 720),
                        (960, 720),
                        (640, 480),
                    ]),
                    video_sizes: sizes(&[(1920, 1080), (1280, 720), (640, 480)]),
                    still_sizes: sizes(&[(1280, 720), (960, 720), (640, 480)]),
                },
                CameraCharacteristics {
                    id: "1".into(),
                    facing: LensFacing::Front,
                    sensor_orientation: 270,
                    preview_sizes: sizes(&[(1280, 720), (640, 480)]),
                    video_sizes: sizes(&[(1280, 720)]),
                    still_sizes: sizes(&[(1280, 720)]),
                },
            ],
            autofocus: default_autofocus(),
        }
    }
}

impl VirtualProfile {
    /// Profile whose lens cannot focus: every trigger locks immediately
    pub fn fixed_focus() -> Self {
        Self {
            autofocus: vec![AfState::NotFocusedLocked],
            ..Self::default()
        }
    }

    /// Load a profile from a JSON file
    pub fn load(path: &Path) -> BackendResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let profile: VirtualProfile = serde_json::from_str(&contents).map_err(|e| {
            BackendError::Other(format!("invalid profile {}: {}", path.display(), e))
        })?;
        debug!(
            path = %path.display(),
            cameras = profile.cameras.len(),
            "Loaded virtual camera profile"
        );
        Ok(profile)
    }

    /// Characteristics of one camera
    pub fn camera(&self, id: &str) -> Option<&CameraCharacteristics> {
        self.cameras.iter().find(|c| c.id == id)
    }
}

fn default_autofocus() -> Vec<AfState> {
    vec![
        AfState::ActiveScan,
        AfState::ActiveScan,
        AfState::FocusedLocked,
    ]
}

fn sizes(list: &[(u32, u32)]) -> Vec<Resolution> {
    list.iter()
        .map(|&(width, height)| Resolution { width, height })
        .collect()
}
