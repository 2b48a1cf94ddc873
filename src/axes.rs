//! Remapping of device axes to the current display orientation
//!
//! Sensor readings arrive in the device's natural frame: X to the right of
//! the screen, Y to the top, Z out of the screen. When the user turns the
//! device and the rendered content turns with it, the heading shown should
//! follow the display's "up" rather than the device's top edge.
//!
//! # Example
//! ```
//! use nalgebra::Vector3;
//! use kompass::{DisplayRotation, remap_to_display};
//!
//! let reading = Vector3::new(1.0, 2.0, 3.0);
//!
//! // Content rotated a quarter turn clockwise: display up is device +X
//! let display = remap_to_display(reading, DisplayRotation::Rotation90);
//!
//! assert_eq!(display, Vector3::new(-2.0, 1.0, 3.0));
//! ```

use nalgebra::Vector3;

/// Clockwise rotation of the rendered content relative to the device's
/// natural orientation
///
/// `Rotation90` is reported when the device itself is turned a quarter turn
/// counter-clockwise, so the content must turn clockwise to stay upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayRotation {
    /// Natural orientation, no remapping
    #[default]
    Rotation0,
    /// Display up is device +X
    Rotation90,
    /// Display up is device -Y
    Rotation180,
    /// Display up is device -X
    Rotation270,
}

impl DisplayRotation {
    /// Parse a rotation from whole degrees
    ///
    /// # Example
    /// ```
    /// use kompass::DisplayRotation;
    ///
    /// assert_eq!(DisplayRotation::from_degrees(270), Some(DisplayRotation::Rotation270));
    /// assert_eq!(DisplayRotation::from_degrees(45), None);
    /// ```
    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees % 360 {
            0 => Some(DisplayRotation::Rotation0),
            90 => Some(DisplayRotation::Rotation90),
            180 => Some(DisplayRotation::Rotation180),
            270 => Some(DisplayRotation::Rotation270),
            _ => None,
        }
    }

    /// Rotation in whole degrees
    pub fn degrees(self) -> u16 {
        match self {
            DisplayRotation::Rotation0 => 0,
            DisplayRotation::Rotation90 => 90,
            DisplayRotation::Rotation180 => 180,
            DisplayRotation::Rotation270 => 270,
        }
    }
}

/// Express a device-frame reading in display coordinates
///
/// The Z axis is never touched; only the in-screen axes turn.
#[inline]
pub fn remap_to_display(device: Vector3<f32>, rotation: DisplayRotation) -> Vector3<f32> {
    match rotation {
        DisplayRotation::Rotation0 => device,
        DisplayRotation::Rotation90 => Vector3::new(-device.y, device.x, device.z),
        DisplayRotation::Rotation180 => Vector3::new(-device.x, -device.y, device.z),
        DisplayRotation::Rotation270 => Vector3::new(device.y, -device.x, device.z),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROTATIONS: [DisplayRotation; 4] = [
        DisplayRotation::Rotation0,
        DisplayRotation::Rotation90,
        DisplayRotation::Rotation180,
        DisplayRotation::Rotation270,
    ];

    #[test]
    fn test_identity_rotation() {
        let sensor = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(remap_to_display(sensor, DisplayRotation::Rotation0), sensor);
    }

    #[test]
    fn test_rotations_preserve_magnitude_and_z() {
        let sensor = Vector3::new(1.0, -2.0, 3.0);

        for rotation in ROTATIONS {
            let result = remap_to_display(sensor, rotation);
            assert!(
                (result.norm() - sensor.norm()).abs() < 1e-6,
                "Rotation {:?} changed magnitude",
                rotation
            );
            assert_eq!(result.z, sensor.z);
        }
    }

    #[test]
    fn test_display_up_axis() {
        // The device axis that ends up as display +Y
        let up = |rotation| {
            [Vector3::x(), Vector3::y(), -Vector3::x(), -Vector3::y()]
                .into_iter()
                .find(|axis| remap_to_display(*axis, rotation) == Vector3::y())
        };

        assert_eq!(up(DisplayRotation::Rotation0), Some(Vector3::y()));
        assert_eq!(up(DisplayRotation::Rotation90), Some(Vector3::x()));
        assert_eq!(up(DisplayRotation::Rotation180), Some(-Vector3::y()));
        assert_eq!(up(DisplayRotation::Rotation270), Some(-Vector3::x()));
    }

    #[test]
    fn test_quarter_turns_compose() {
        let sensor = Vector3::new(0.3, -0.7, 9.7);
        let twice = remap_to_display(
            remap_to_display(sensor, DisplayRotation::Rotation90),
            DisplayRotation::Rotation90,
        );
        assert_eq!(twice, remap_to_display(sensor, DisplayRotation::Rotation180));

        let back = remap_to_display(
            remap_to_display(sensor, DisplayRotation::Rotation90),
            DisplayRotation::Rotation270,
        );
        assert_eq!(back, sensor);
    }

    #[test]
    fn test_degrees_round_trip() {
        for rotation in ROTATIONS {
            assert_eq!(DisplayRotation::from_degrees(rotation.degrees()), Some(rotation));
        }
        assert_eq!(DisplayRotation::from_degrees(450), Some(DisplayRotation::Rotation90));
        assert_eq!(DisplayRotation::from_degrees(100), None);
    }
}
