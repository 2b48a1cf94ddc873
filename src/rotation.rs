//! Rotation matrix and orientation angles from gravity and geomagnetic vectors
//!
//! The rotation matrix maps device coordinates to a world frame where X
//! points east, Y points to magnetic north and Z points up. Its rows are
//! those three world axes expressed in device coordinates.

use nalgebra::{Matrix3, Vector3};

use crate::error::FusionError;
use crate::math::{STANDARD_GRAVITY, Vector3Ext};
use crate::types::{Orientation, SensorKind};

/// Gravity below 10% of standard gravity is treated as free fall
const FREE_FALL_GRAVITY_SQUARED: f32 = 0.01 * STANDARD_GRAVITY * STANDARD_GRAVITY;

/// Minimum magnitude of `field × gravity` for a usable east vector
const MIN_HORIZONTAL_FIELD: f32 = 0.1;

/// Device-to-world rotation (rows: east, north, up)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationMatrix(Matrix3<f32>);

impl RotationMatrix {
    /// Underlying 3x3 matrix
    pub fn matrix(&self) -> &Matrix3<f32> {
        &self.0
    }

    /// World east axis in device coordinates
    pub fn east(&self) -> Vector3<f32> {
        self.0.row(0).transpose()
    }

    /// World magnetic-north axis in device coordinates
    pub fn north(&self) -> Vector3<f32> {
        self.0.row(1).transpose()
    }

    /// World up axis in device coordinates
    pub fn up(&self) -> Vector3<f32> {
        self.0.row(2).transpose()
    }

    /// Rotate a device-frame vector into the world frame
    pub fn to_world(&self, device: Vector3<f32>) -> Vector3<f32> {
        self.0 * device
    }
}

/// Rotation of the geomagnetic vector into the world frame, about east
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InclinationMatrix(Matrix3<f32>);

impl InclinationMatrix {
    /// Underlying 3x3 matrix
    pub fn matrix(&self) -> &Matrix3<f32> {
        &self.0
    }
}

/// Compute the device-to-world rotation from gravity and geomagnetic readings
///
/// Both vectors are in device coordinates and need not be normalized. The
/// gravity vector is the raw accelerometer reading (pointing away from the
/// ground when the device is at rest).
///
/// # Errors
/// [`FusionError::FreeFall`] when gravity is below 10% of standard gravity,
/// [`FusionError::WeakField`] when the field is too weak or parallel to
/// gravity, and [`FusionError::NonFinite`] for NaN or infinite components.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use kompass::rotation::{orientation, rotation_matrix};
///
/// let gravity = Vector3::new(0.0, 0.0, 9.81);       // lying flat
/// let field = Vector3::new(0.0, 22.0, -40.0);       // north along +Y
/// let rotation = rotation_matrix(gravity, field).unwrap();
/// assert!(orientation(&rotation).azimuth.abs() < 1e-5);
/// ```
pub fn rotation_matrix(
    gravity: Vector3<f32>,
    geomagnetic: Vector3<f32>,
) -> Result<RotationMatrix, FusionError> {
    if !gravity.all_finite() {
        return Err(FusionError::NonFinite(SensorKind::Accelerometer));
    }
    if !geomagnetic.all_finite() {
        return Err(FusionError::NonFinite(SensorKind::MagneticField));
    }

    let norm_squared = gravity.norm_squared();
    if norm_squared < FREE_FALL_GRAVITY_SQUARED {
        return Err(FusionError::FreeFall { norm_squared });
    }

    let east = geomagnetic.cross(&gravity);
    let horizontal = east.norm();
    if horizontal < MIN_HORIZONTAL_FIELD {
        return Err(FusionError::WeakField { horizontal });
    }

    let east = east / horizontal;
    let up = gravity / norm_squared.sqrt();
    let north = up.cross(&east);

    Ok(RotationMatrix(Matrix3::from_rows(&[
        east.transpose(),
        north.transpose(),
        up.transpose(),
    ])))
}

/// Compute the matrix rotating the geomagnetic vector into the world frame
///
/// Only meaningful for a rotation produced from the same readings.
pub fn inclination_matrix(
    geomagnetic: Vector3<f32>,
    rotation: &RotationMatrix,
) -> InclinationMatrix {
    let field = geomagnetic.safe_normalize();
    let c = field.dot(&rotation.north());
    let s = field.dot(&rotation.up());

    InclinationMatrix(Matrix3::new(
        1.0, 0.0, 0.0, //
        0.0, c, s, //
        0.0, -s, c,
    ))
}

/// Magnetic dip angle in radians, negative when the field points into the ground
pub fn inclination(matrix: &InclinationMatrix) -> f32 {
    let m = matrix.matrix();
    m[(1, 2)].atan2(m[(1, 1)])
}

/// Derive azimuth, pitch and roll from a rotation matrix
///
/// - azimuth: `atan2(R01, R11)`, heading of the device Y axis from north
/// - pitch: `asin(-R21)`, rotation about device X
/// - roll: `atan2(-R20, R22)`, rotation about device Y
pub fn orientation(rotation: &RotationMatrix) -> Orientation {
    let r = rotation.matrix();

    Orientation {
        azimuth: r[(0, 1)].atan2(r[(1, 1)]),
        pitch: (-r[(2, 1)]).clamp(-1.0, 1.0).asin(),
        roll: (-r[(2, 0)]).atan2(r[(2, 2)]),
    }
}
