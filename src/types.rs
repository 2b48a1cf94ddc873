//! Core types and settings for the Kompass library

use nalgebra::Vector3;

use crate::axes::DisplayRotation;
use crate::calibration::MagneticCalibration;
use crate::rose::RoseStyle;

/// Sensor streams consumed by the compass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Acceleration including gravity, in m/s²
    Accelerometer,
    /// Ambient geomagnetic field, in µT
    MagneticField,
}

/// Accuracy reported by the host for a sensor stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SensorAccuracy {
    /// Readings cannot be trusted, calibration is needed
    Unreliable,
    Low,
    Medium,
    #[default]
    High,
}

/// Delivery-rate hint passed when registering a listener
///
/// The host is free to deliver faster or slower; the hint only states the
/// period the listener is interested in.
///
/// # Example
/// ```
/// use kompass::SensorDelay;
///
/// assert_eq!(SensorDelay::Ui.period_us(), 66_667);
/// assert!(SensorDelay::Game.period_us() < SensorDelay::Normal.period_us());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorDelay {
    /// As fast as the hardware allows
    Fastest,
    /// Suitable for games
    Game,
    /// Suitable for the user interface
    #[default]
    Ui,
    /// Suitable for screen orientation changes
    Normal,
}

impl SensorDelay {
    /// Requested sampling period in microseconds
    pub const fn period_us(self) -> u64 {
        match self {
            SensorDelay::Fastest => 0,
            SensorDelay::Game => 20_000,
            SensorDelay::Ui => 66_667,
            SensorDelay::Normal => 200_000,
        }
    }

    /// Requested sampling period in nanoseconds, the unit of event timestamps
    pub const fn period_ns(self) -> u64 {
        self.period_us() * 1_000
    }
}

/// A single reading delivered by the sensor service
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorEvent {
    /// Stream the reading belongs to
    pub kind: SensorKind,
    /// Three-axis value in device coordinates
    pub values: Vector3<f32>,
    /// Monotonic timestamp in nanoseconds
    pub timestamp_ns: u64,
    /// Accuracy of this reading
    pub accuracy: SensorAccuracy,
}

impl SensorEvent {
    /// Create an event with high accuracy
    pub fn new(kind: SensorKind, values: Vector3<f32>, timestamp_ns: u64) -> Self {
        Self {
            kind,
            values,
            timestamp_ns,
            accuracy: SensorAccuracy::High,
        }
    }

    /// Shorthand for an accelerometer reading
    pub fn accelerometer(values: Vector3<f32>, timestamp_ns: u64) -> Self {
        Self::new(SensorKind::Accelerometer, values, timestamp_ns)
    }

    /// Shorthand for a magnetometer reading
    pub fn magnetic_field(values: Vector3<f32>, timestamp_ns: u64) -> Self {
        Self::new(SensorKind::MagneticField, values, timestamp_ns)
    }
}

/// Device orientation derived from a rotation matrix
///
/// All angles are in radians. `azimuth` is the rotation about the world
/// up axis, 0 when the device's Y axis points to magnetic north and
/// positive towards east.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    /// Heading about the up axis, in `(-π, π]`
    pub azimuth: f32,
    /// Rotation about the device X axis, in `[-π/2, π/2]`
    pub pitch: f32,
    /// Rotation about the device Y axis, in `(-π, π]`
    pub roll: f32,
}

impl Orientation {
    /// Azimuth in degrees, wrapped into `[0, 360)`
    pub fn azimuth_degrees(&self) -> f32 {
        crate::math::normalize_azimuth(self.azimuth.to_degrees())
    }
}

/// Compass settings
///
/// # Example
/// ```
/// use kompass::{CompassSettings, DisplayRotation, SensorDelay};
///
/// let settings = CompassSettings {
///     delay: SensorDelay::Game,
///     display_rotation: DisplayRotation::Rotation90,
///     ..Default::default()
/// };
/// assert_eq!(settings.title, "Kompass");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompassSettings {
    /// Title shown in the title bar and as the caption under the rose
    pub title: String,
    /// Delivery-rate hint used when registering for sensor updates
    pub delay: SensorDelay,
    /// Rotation of the display relative to the device's natural orientation
    pub display_rotation: DisplayRotation,
    /// Hard and soft iron correction applied to magnetometer readings
    pub magnetic_calibration: MagneticCalibration,
    /// Geometry and colors of the drawn rose
    pub rose: RoseStyle,
}

impl Default for CompassSettings {
    fn default() -> Self {
        Self {
            title: String::from("Kompass"),
            delay: SensorDelay::Ui,
            display_rotation: DisplayRotation::default(),
            magnetic_calibration: MagneticCalibration::default(),
            rose: RoseStyle::default(),
        }
    }
}
