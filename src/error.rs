//! Error types

use thiserror::Error;

use crate::types::SensorKind;

/// Reasons the gravity and geomagnetic vectors cannot produce a rotation
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FusionError {
    /// Gravity reading too small to define "up", the device is falling
    #[error("device in free fall: |gravity|² = {norm_squared} m²/s⁴")]
    FreeFall { norm_squared: f32 },
    /// Field is too weak or parallel to gravity, east is undefined
    #[error("geomagnetic field unusable: |field × gravity| = {horizontal} µT·m/s²")]
    WeakField { horizontal: f32 },
    /// A reading contains NaN or infinity
    #[error("non-finite {0:?} reading")]
    NonFinite(SensorKind),
}

/// Sensor service failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("no {0:?} sensor on this device")]
    Unavailable(SensorKind),
    #[error("listener already registered for {0:?}")]
    AlreadyRegistered(SensorKind),
}

/// Invalid shape parameters
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ShapeError {
    #[error("a star needs at least 3 vertices per radius, got {0}")]
    TooFewVertices(usize),
    #[error("radii must be positive with inner < outer, got outer {outer} and inner {inner}")]
    InvalidRadius { outer: f32, inner: f32 },
    #[error("drawing area {width}x{height} leaves no room for the rose")]
    AreaTooSmall { width: f32, height: f32 },
}
