// SPDX-License-Identifier: GPL-3.0-only

//! Sensor to display rotation

use crate::backends::camera::{DisplayRotation, RotationAngle};

/// Combine the sensor mounting angle with the current display rotation
///
/// The result is the angle a captured frame must be rotated by to appear
/// upright in the current device orientation. It is also what decides
/// whether preview sizing has to swap width and height
/// (see [`RotationAngle::swaps_dimensions`]).
pub fn resolve(sensor_orientation_deg: u32, display: DisplayRotation) -> RotationAngle {
    let total = sensor_orientation_deg as i64 + display.degrees() as i64 + 360;
    RotationAngle::from_degrees(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_DISPLAY: [DisplayRotation; 4] = [
        DisplayRotation::Rot0,
        DisplayRotation::Rot90,
        DisplayRotation::Rot180,
        DisplayRotation::Rot270,
    ];

    #[test]
    fn test_known_values() {
        assert_eq!(resolve(0, DisplayRotation::Rot0), RotationAngle::DEG_0);
        assert_eq!(resolve(90, DisplayRotation::Rot90), RotationAngle::DEG_180);
        assert_eq!(resolve(270, DisplayRotation::Rot90), RotationAngle::DEG_0);
        assert_eq!(resolve(180, DisplayRotation::Rot270), RotationAngle::DEG_90);
    }

    #[test]
    fn test_portrait_phone_requires_swap() {
        let rotation = resolve(90, DisplayRotation::Rot0);
        assert_eq!(rotation.degrees(), 90);
        assert!(rotation.swaps_dimensions());
    }

    #[test]
    fn test_all_inputs_in_range_and_swap_rule() {
        for display in ALL_DISPLAY {
            for sensor in 0..360u32 {
                let rotation = resolve(sensor, display);
                let degrees = rotation.degrees();
                assert!(degrees < 360, "{} + {:?} gave {}", sensor, display, degrees);
                assert_eq!(degrees, (sensor + display.degrees()) % 360);
                assert_eq!(
                    rotation.swaps_dimensions(),
                    degrees == 90 || degrees == 270
                );
            }
        }
    }
}
