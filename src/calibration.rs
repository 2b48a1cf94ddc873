//! Magnetometer hard and soft iron correction

use nalgebra::{Matrix3, Vector3};

/// Hard and soft iron correction for magnetometer readings
///
/// Applied as `soft_iron * (uncalibrated - hard_iron)`. The default is the
/// identity correction.
///
/// # Example
/// ```
/// use nalgebra::{Matrix3, Vector3};
/// use kompass::MagneticCalibration;
///
/// let calibration = MagneticCalibration {
///     soft_iron: Matrix3::identity(),
///     hard_iron: Vector3::new(10.0, 20.0, 30.0),
/// };
/// let corrected = calibration.apply(Vector3::new(100.0, 200.0, 300.0));
/// assert_eq!(corrected, Vector3::new(90.0, 180.0, 270.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagneticCalibration {
    /// Soft iron correction matrix
    pub soft_iron: Matrix3<f32>,
    /// Hard iron offset in µT
    pub hard_iron: Vector3<f32>,
}

impl Default for MagneticCalibration {
    fn default() -> Self {
        Self {
            soft_iron: Matrix3::identity(),
            hard_iron: Vector3::zeros(),
        }
    }
}

impl MagneticCalibration {
    /// Correct a raw magnetometer reading
    pub fn apply(&self, uncalibrated: Vector3<f32>) -> Vector3<f32> {
        calibrate_magnetic(uncalibrated, self.soft_iron, self.hard_iron)
    }

    /// True when applying the correction leaves readings unchanged
    pub fn is_identity(&self) -> bool {
        self.soft_iron == Matrix3::identity() && self.hard_iron == Vector3::zeros()
    }
}

/// Applies magnetometer calibration (hard and soft iron correction)
///
/// # Arguments
/// * `uncalibrated` - Raw magnetometer reading
/// * `soft_iron_matrix` - 3x3 soft iron correction matrix
/// * `hard_iron_offset` - Hard iron offset vector
///
/// # Returns
/// Calibrated magnetometer reading
pub fn calibrate_magnetic(
    uncalibrated: Vector3<f32>,
    soft_iron_matrix: Matrix3<f32>,
    hard_iron_offset: Vector3<f32>,
) -> Vector3<f32> {
    soft_iron_matrix * (uncalibrated - hard_iron_offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnetic_calibration() {
        let raw = Vector3::new(100.0, 200.0, 300.0);
        let soft_iron = Matrix3::identity();
        let hard_iron = Vector3::new(10.0, 20.0, 30.0);

        let calibrated = calibrate_magnetic(raw, soft_iron, hard_iron);
        let expected = Vector3::new(90.0, 180.0, 270.0); // raw - hard_iron

        assert!((calibrated - expected).norm() < 1e-6);
    }

    #[test]
    fn test_soft_iron_scaling() {
        let calibration = MagneticCalibration {
            soft_iron: Matrix3::from_diagonal(&Vector3::new(0.5, 2.0, 1.0)),
            hard_iron: Vector3::new(1.0, 1.0, 1.0),
        };
        let corrected = calibration.apply(Vector3::new(5.0, 3.0, -1.0));

        assert!((corrected - Vector3::new(2.0, 4.0, -2.0)).norm() < 1e-6);
        assert!(!calibration.is_identity());
        assert!(MagneticCalibration::default().is_identity());
    }
}
