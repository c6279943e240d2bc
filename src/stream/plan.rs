// SPDX-License-Identifier: GPL-3.0-only

//! Stream plan: the negotiated outputs of one camera-open cycle

use super::{rotation, size};
use crate::backends::camera::{
    CameraCharacteristics, DisplayRotationSource, LensFacing, OutputKind, OutputTarget,
    Resolution, RotationAngle,
};
use crate::errors::{CoreError, CoreResult};
use serde::Serialize;
use tracing::{debug, info};

/// Negotiated output sizes and rotation for one camera
///
/// Built once when the preview surface becomes available and never modified
/// afterwards. A new plan is built for every open of the camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamPlan {
    pub camera_id: String,
    pub preview_size: Resolution,
    /// None when the camera lists no recorder sizes
    pub video_size: Option<Resolution>,
    /// None when the camera lists no still sizes
    pub still_size: Option<Resolution>,
    pub rotation: RotationAngle,
}

impl StreamPlan {
    /// Build a plan for the first back-facing camera
    ///
    /// # Arguments
    /// * `cameras` - Enumerated cameras, in enumeration order
    /// * `surface` - Current pixel size of the preview surface
    /// * `display` - Queried once for the current display rotation
    ///
    /// # Errors
    /// * `NoCameraAvailable` - No back-facing camera in `cameras`
    /// * `InvalidArgument` - The camera lists no preview sizes
    pub fn build(
        cameras: &[CameraCharacteristics],
        surface: Resolution,
        display: &dyn DisplayRotationSource,
    ) -> CoreResult<Self> {
        let camera = select_back_camera(cameras)?;
        let display_rotation = display.current_rotation();
        let rotation = rotation::resolve(camera.sensor_orientation, display_rotation);

        // Camera outputs are landscape; size them against the rotated surface
        let target = if rotation.swaps_dimensions() {
            debug!(camera = %camera.id, "Swapping surface width and height");
            surface.swapped()
        } else {
            surface
        };

        let preview_candidates = camera.candidates(OutputKind::Preview);
        if preview_candidates.is_empty() {
            return Err(CoreError::InvalidArgument(format!(
                "camera {} reports no preview sizes",
                camera.id
            )));
        }

        let preview_size = size::choose(preview_candidates, target.width, target.height)?;
        let video_size = negotiate_optional(camera, OutputKind::Record, target)?;
        let still_size = negotiate_optional(camera, OutputKind::Still, target)?;

        let plan = Self {
            camera_id: camera.id.clone(),
            preview_size,
            video_size,
            still_size,
            rotation,
        };

        info!(
            camera = %plan.camera_id,
            sensor = camera.sensor_orientation,
            display = display_rotation.degrees(),
            rotation = %plan.rotation,
            preview = %plan.preview_size,
            video = ?plan.video_size.map(|s| s.to_string()),
            still = ?plan.still_size.map(|s| s.to_string()),
            "Stream plan built"
        );

        Ok(plan)
    }

    /// Whether preview width and height are exchanged relative to the display
    pub fn requires_swap(&self) -> bool {
        self.rotation.swaps_dimensions()
    }

    /// Preview size in display orientation, for laying out the preview surface
    pub fn display_preview_size(&self) -> Resolution {
        if self.requires_swap() {
            self.preview_size.swapped()
        } else {
            self.preview_size
        }
    }

    /// Surfaces of a preview-only session
    pub fn preview_targets(&self) -> Vec<OutputTarget> {
        let mut targets = vec![OutputTarget::Preview(self.preview_size)];
        targets.extend(self.still_size.map(OutputTarget::Still));
        targets
    }

    /// Surfaces of a recording session
    ///
    /// # Errors
    /// `InvalidArgument` when the camera has no recorder sizes.
    pub fn recording_targets(&self) -> CoreResult<Vec<OutputTarget>> {
        let video_size = self.video_size.ok_or_else(|| {
            CoreError::InvalidArgument(format!("camera {} cannot record video", self.camera_id))
        })?;
        let mut targets = vec![
            OutputTarget::Preview(self.preview_size),
            OutputTarget::Record(video_size),
        ];
        targets.extend(self.still_size.map(OutputTarget::Still));
        Ok(targets)
    }
}

/// First back-facing camera in enumeration order
fn select_back_camera(cameras: &[CameraCharacteristics]) -> CoreResult<&CameraCharacteristics> {
    for camera in cameras {
        if camera.facing == LensFacing::Front {
            debug!(camera = %camera.id, "Camera is front facing, skipping");
            continue;
        }
        debug!(camera = %camera.id, "Camera is facing back");
        return Ok(camera);
    }
    Err(CoreError::NoCameraAvailable)
}

fn negotiate_optional(
    camera: &CameraCharacteristics,
    kind: OutputKind,
    target: Resolution,
) -> CoreResult<Option<Resolution>> {
    let candidates = camera.candidates(kind);
    if candidates.is_empty() {
        debug!(camera = %camera.id, ?kind, "No sizes reported for output");
        return Ok(None);
    }
    size::choose(candidates, target.width, target.height).map(Some)
}
