//! Angle constants, vector helpers and azimuth normalization

use nalgebra::Vector3;

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Standard gravity in m/s²
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Full turn in degrees
pub const FULL_TURN_DEGREES: f32 = 360.0;

/// Wrap a heading in degrees into `[0, 360)`
///
/// Headings from [`orientation`](crate::rotation::orientation) lie in
/// `(-180, 180]`, so in practice this only ever adds one turn to negative
/// values. Arbitrary inputs are wrapped with a single Euclidean remainder.
///
/// # Example
/// ```
/// use kompass::normalize_azimuth;
///
/// assert_eq!(normalize_azimuth(-90.0), 270.0);
/// assert_eq!(normalize_azimuth(45.0), 45.0);
/// assert_eq!(normalize_azimuth(360.0), 0.0);
/// ```
pub fn normalize_azimuth(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(FULL_TURN_DEGREES);

    // -1e-8 + 360 rounds to exactly 360 in f32
    if wrapped >= FULL_TURN_DEGREES {
        0.0
    } else {
        wrapped
    }
}

/// Smallest signed difference `to - from` between two headings, in degrees
pub fn azimuth_difference(from: f32, to: f32) -> f32 {
    let delta = normalize_azimuth(to - from);
    if delta > 180.0 { delta - FULL_TURN_DEGREES } else { delta }
}

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Normalize the vector, returning zero vector if magnitude is zero
    fn safe_normalize(&self) -> Vector3<f32>;

    /// True when every component is finite
    fn all_finite(&self) -> bool;
}

impl Vector3Ext for Vector3<f32> {
    fn safe_normalize(&self) -> Vector3<f32> {
        let magnitude = self.norm();
        if magnitude > 0.0 {
            *self / magnitude
        } else {
            Vector3::zeros()
        }
    }

    fn all_finite(&self) -> bool {
        self.iter().all(|component| component.is_finite())
    }
}
