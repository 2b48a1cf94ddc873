//! Orientation sampler: turns accelerometer and magnetometer events into a heading

use log::{debug, trace};
use nalgebra::Vector3;

use crate::axes::{DisplayRotation, remap_to_display};
use crate::calibration::MagneticCalibration;
use crate::error::FusionError;
use crate::math::Vector3Ext;
use crate::rotation::{orientation, rotation_matrix};
use crate::sensor::SensorListener;
use crate::types::{CompassSettings, Orientation, SensorAccuracy, SensorEvent, SensorKind};

/// Which readings the sampler has seen since it was created or reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// No reading from either sensor yet
    AwaitingBoth,
    /// Magnetometer seen, still waiting for gravity
    AwaitingAccelerometer,
    /// Gravity seen, still waiting for the magnetometer
    AwaitingMagnetometer,
    /// Both seen; every new reading recomputes the heading
    Producing,
}

/// Combines the latest gravity and geomagnetic readings into an azimuth
///
/// Each reading replaces the buffered value for its sensor. Once both
/// sensors have reported, every reading recomputes the rotation matrix; if
/// the inputs are degenerate the previous heading is kept.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use kompass::{OrientationSampler, SensorEvent};
///
/// let mut sampler = OrientationSampler::new();
///
/// // Only one sensor so far: no heading
/// let update = sampler.on_sensor_changed(&SensorEvent::accelerometer(Vector3::new(0.0, 0.0, 9.81), 0));
/// assert_eq!(update, None);
///
/// // Device flat, magnetic north towards the device's left edge
/// let update = sampler.on_sensor_changed(&SensorEvent::magnetic_field(Vector3::new(-22.0, 0.0, -40.0), 1));
/// assert!((update.unwrap() - 90.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct OrientationSampler {
    gravity: Option<Vector3<f32>>,
    geomagnetic: Option<Vector3<f32>>,
    calibration: MagneticCalibration,
    display_rotation: DisplayRotation,
    orientation: Option<Orientation>,
    azimuth: f32,
    updates: u64,
    rejected: u64,
    last_error: Option<FusionError>,
}

impl Default for OrientationSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationSampler {
    /// Sampler with identity calibration and natural display orientation
    pub fn new() -> Self {
        Self::with_settings(&CompassSettings::default())
    }

    /// Sampler using the calibration and display rotation from `settings`
    pub fn with_settings(settings: &CompassSettings) -> Self {
        Self {
            gravity: None,
            geomagnetic: None,
            calibration: settings.magnetic_calibration,
            display_rotation: settings.display_rotation,
            orientation: None,
            azimuth: 0.0,
            updates: 0,
            rejected: 0,
            last_error: None,
        }
    }

    /// Feed one reading; returns the new azimuth in degrees when one was produced
    pub fn on_sensor_changed(&mut self, event: &SensorEvent) -> Option<f32> {
        if !event.values.all_finite() {
            debug!("dropping non-finite {:?} reading {:?}", event.kind, event.values);
            self.reject(FusionError::NonFinite(event.kind));
            return None;
        }

        match event.kind {
            SensorKind::Accelerometer => self.gravity = Some(event.values),
            SensorKind::MagneticField => {
                self.geomagnetic = Some(self.calibration.apply(event.values))
            }
        }

        let (gravity, geomagnetic) = self.gravity.zip(self.geomagnetic)?;
        self.update(gravity, geomagnetic)
    }

    /// Accuracy changes do not affect the heading
    pub fn on_accuracy_changed(&mut self, kind: SensorKind, accuracy: SensorAccuracy) {
        trace!("{:?} accuracy is now {:?}", kind, accuracy);
    }

    fn update(&mut self, gravity: Vector3<f32>, geomagnetic: Vector3<f32>) -> Option<f32> {
        let gravity = remap_to_display(gravity, self.display_rotation);
        let geomagnetic = remap_to_display(geomagnetic, self.display_rotation);

        match rotation_matrix(gravity, geomagnetic) {
            Ok(rotation) => {
                let angles = orientation(&rotation);
                self.azimuth = angles.azimuth_degrees();
                self.orientation = Some(angles);
                self.updates += 1;
                self.last_error = None;
                trace!("azimuth {:.1}°", self.azimuth);
                Some(self.azimuth)
            }
            Err(error) => {
                debug!("keeping azimuth {:.1}°: {}", self.azimuth, error);
                self.reject(error);
                None
            }
        }
    }

    fn reject(&mut self, error: FusionError) {
        self.rejected += 1;
        self.last_error = Some(error);
    }

    /// Latest heading in degrees, `[0, 360)`; 0 before the first update
    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    /// Latest full orientation, `None` before the first update
    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    /// Which sensors have reported so far
    pub fn state(&self) -> SamplerState {
        match (self.gravity.is_some(), self.geomagnetic.is_some()) {
            (false, false) => SamplerState::AwaitingBoth,
            (false, true) => SamplerState::AwaitingAccelerometer,
            (true, false) => SamplerState::AwaitingMagnetometer,
            (true, true) => SamplerState::Producing,
        }
    }

    /// Number of headings produced
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Number of readings that left the heading unchanged because of bad input
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Why the most recent reading was rejected, cleared by the next heading
    pub fn last_error(&self) -> Option<FusionError> {
        self.last_error
    }

    /// Current magnetometer correction
    pub fn calibration(&self) -> &MagneticCalibration {
        &self.calibration
    }

    /// Replace the magnetometer correction; the buffered field is kept as is
    pub fn set_calibration(&mut self, calibration: MagneticCalibration) {
        self.calibration = calibration;
    }

    /// Change the display rotation used for subsequent headings
    pub fn set_display_rotation(&mut self, rotation: DisplayRotation) {
        self.display_rotation = rotation;
    }

    /// Discard both buffers, the heading and the counters
    pub fn reset(&mut self) {
        self.gravity = None;
        self.geomagnetic = None;
        self.orientation = None;
        self.azimuth = 0.0;
        self.updates = 0;
        self.rejected = 0;
        self.last_error = None;
    }
}

impl SensorListener for OrientationSampler {
    fn on_sensor_changed(&mut self, event: &SensorEvent) {
        OrientationSampler::on_sensor_changed(self, event);
    }

    fn on_accuracy_changed(&mut self, kind: SensorKind, accuracy: SensorAccuracy) {
        OrientationSampler::on_accuracy_changed(self, kind, accuracy);
    }
}
