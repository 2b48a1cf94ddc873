//! [![license]](https://opensource.org/licenses/MIT)
//!
//! [license]: https://img.shields.io/badge/License-MIT-blue.svg?style=for-the-badge&labelColor=555555
//!
//! Kompass - a compass rose driven by accelerometer and magnetometer fusion
//!
//! The library turns raw gravity and geomagnetic readings into a magnetic
//! heading and draws a rounded star that rotates to keep its marker on
//! north. The host sensor service and drawing surface sit behind the
//! [`SensorService`] and [`Canvas`] traits; [`SensorHub`] and
//! [`DisplayList`] are in-memory implementations for tests and tooling.
//!
//! # Features
//!
//! - Rotation matrix, inclination and orientation angles from one
//!   accelerometer and one magnetometer reading
//! - Heading normalized to `[0, 360)`; degenerate input keeps the last heading
//! - Magnetometer hard/soft iron correction and display-rotation remapping
//! - Listener lifecycle scoped to screen visibility, with delivery-rate hints
//! - Rounded star outline as lines and cubic Béziers, ready for any renderer
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use kompass::{OrientationSampler, SensorEvent};
//!
//! let mut sampler = OrientationSampler::new();
//!
//! // Device lying flat, magnetic north towards its right edge
//! sampler.on_sensor_changed(&SensorEvent::accelerometer(Vector3::new(0.0, 0.0, 9.81), 0));
//! sampler.on_sensor_changed(&SensorEvent::magnetic_field(Vector3::new(22.0, 0.0, -40.0), 0));
//!
//! assert!((sampler.azimuth() - 270.0).abs() < 1e-3);
//! ```

pub mod axes;
pub mod calibration;
pub mod canvas;
mod error;
mod math;
pub mod rose;
pub mod rotation;
mod sampler;
pub mod screen;
pub mod sensor;
mod types;

// Re-export all public types and functions
pub use axes::{DisplayRotation, remap_to_display};
pub use calibration::{MagneticCalibration, calibrate_magnetic};
pub use canvas::{Canvas, Color, DisplayList, DrawCommand, Size};
pub use error::{FusionError, SensorError, ShapeError};
pub use math::{
    DEG_TO_RAD, FULL_TURN_DEGREES, RAD_TO_DEG, STANDARD_GRAVITY, Vector3Ext, azimuth_difference,
    normalize_azimuth,
};
pub use rose::{CompassRose, CornerRounding, Path, PathCommand, RoseStyle, RoundedPolygon};
pub use rotation::{
    InclinationMatrix, RotationMatrix, inclination, inclination_matrix, orientation,
    rotation_matrix,
};
pub use sampler::{OrientationSampler, SamplerState};
pub use screen::{CompassScreen, MenuItem};
pub use sensor::{ListenerId, Sensor, SensorHub, SensorListener, SensorService, SharedListener};
pub use types::*;
