// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic still frames

use crate::backends::camera::{BackendError, BackendResult, Resolution, RotationAngle};
use crate::constants::VIRTUAL_JPEG_QUALITY;
use image::{Rgb, RgbImage};
use tracing::debug;

const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

/// Render color bars at `size` and encode them as JPEG
///
/// A dark marker in the top-left quadrant is moved by `rotation`, so a saved
/// still shows which way the frame was tagged.
pub fn render_still(size: Resolution, rotation: RotationAngle) -> BackendResult<Vec<u8>> {
    let Resolution { width, height } = size;
    let bar_width = (width / BARS.len() as u32).max(1);
    let (marker_x, marker_y) = match rotation.degrees() {
        90 => (width * 3 / 4, height / 4),
        180 => (width * 3 / 4, height * 3 / 4),
        270 => (width / 4, height * 3 / 4),
        _ => (width / 4, height / 4),
    };
    let marker_radius = (width.min(height) / 10).max(1);

    let frame = RgbImage::from_fn(width, height, |x, y| {
        if x.abs_diff(marker_x) < marker_radius && y.abs_diff(marker_y) < marker_radius {
            return Rgb([16, 16, 16]);
        }
        let bar = ((x / bar_width) as usize).min(BARS.len() - 1);
        Rgb(BARS[bar])
    });

    let mut jpeg_data = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_data, VIRTUAL_JPEG_QUALITY);
    encoder
        .encode_image(&frame)
        .map_err(|e| BackendError::Other(format!("Failed to encode JPEG: {}", e)))?;

    debug!(size = %size, bytes = jpeg_data.len(), "Rendered virtual still");
    Ok(jpeg_data)
}
