//! Sensor service seam and an in-memory, single-threaded implementation
//!
//! The host owns the hardware; the compass only registers a listener for
//! the streams it needs and unregisters it when hidden. [`SensorHub`] is a
//! host stand-in that delivers whatever events it is handed, honoring each
//! registration's delivery-rate hint.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use crate::error::SensorError;
use crate::types::{SensorAccuracy, SensorDelay, SensorEvent, SensorKind};

/// Receives readings from a [`SensorService`]
pub trait SensorListener {
    /// Called for every delivered reading
    fn on_sensor_changed(&mut self, event: &SensorEvent);

    /// Called when the host changes its accuracy estimate for a stream
    fn on_accuracy_changed(&mut self, kind: SensorKind, accuracy: SensorAccuracy) {
        let _ = (kind, accuracy);
    }
}

/// Listener shared between its owner and the service delivering to it
pub type SharedListener = Rc<RefCell<dyn SensorListener>>;

/// Handle for one listener/sensor registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Description of a hardware sensor
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub kind: SensorKind,
    pub name: String,
    /// Shortest supported sampling period in microseconds, 0 if event driven
    pub min_delay_us: u64,
}

impl Sensor {
    /// Generic sensor of the given kind, sampling at up to 200 Hz
    pub fn new(kind: SensorKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            min_delay_us: 5_000,
        }
    }
}

/// Host sensor service
pub trait SensorService {
    /// Default sensor for a stream, `None` when the device lacks one
    fn default_sensor(&self, kind: SensorKind) -> Option<Sensor>;

    /// Start delivering readings from `sensor` to `listener`
    fn register_listener(
        &mut self,
        listener: &SharedListener,
        sensor: &Sensor,
        delay: SensorDelay,
    ) -> Result<ListenerId, SensorError>;

    /// Stop all deliveries to `listener`; returns how many registrations were removed
    fn unregister_listener(&mut self, listener: &SharedListener) -> usize;
}

fn same_listener(a: &SharedListener, b: &SharedListener) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

struct Registration {
    id: ListenerId,
    kind: SensorKind,
    period_ns: u64,
    listener: SharedListener,
    last_delivered_ns: Option<u64>,
}

impl Registration {
    /// True when the event arrives no sooner than the requested period
    fn wants(&self, timestamp_ns: u64) -> bool {
        match self.last_delivered_ns {
            None => true,
            Some(last) => timestamp_ns.saturating_sub(last) >= self.period_ns,
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("period_ns", &self.period_ns)
            .field("last_delivered_ns", &self.last_delivered_ns)
            .finish_non_exhaustive()
    }
}

/// In-memory sensor service
///
/// # Example
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use nalgebra::Vector3;
/// use kompass::{OrientationSampler, SensorDelay, SensorEvent, SensorHub, SensorKind, SensorService, SharedListener};
///
/// let mut hub = SensorHub::with_default_sensors();
/// let sampler = Rc::new(RefCell::new(OrientationSampler::new()));
/// let listener: SharedListener = sampler.clone();
///
/// for kind in [SensorKind::Accelerometer, SensorKind::MagneticField] {
///     let sensor = hub.default_sensor(kind).unwrap();
///     hub.register_listener(&listener, &sensor, SensorDelay::Ui).unwrap();
/// }
///
/// hub.dispatch(&SensorEvent::accelerometer(Vector3::new(0.0, 0.0, 9.81), 0));
/// hub.dispatch(&SensorEvent::magnetic_field(Vector3::new(22.0, 0.0, -40.0), 0));
/// assert!((sampler.borrow().azimuth() - 270.0).abs() < 1e-3);
/// ```
#[derive(Debug, Default)]
pub struct SensorHub {
    sensors: HashMap<SensorKind, Sensor>,
    accuracy: HashMap<SensorKind, SensorAccuracy>,
    registrations: Vec<Registration>,
    next_id: u64,
}

impl SensorHub {
    /// Hub without any sensors
    pub fn new() -> Self {
        Self::default()
    }

    /// Hub with an accelerometer and a magnetometer installed
    pub fn with_default_sensors() -> Self {
        let mut hub = Self::new();
        hub.install(Sensor::new(SensorKind::Accelerometer, "Accelerometer"));
        hub.install(Sensor::new(SensorKind::MagneticField, "Magnetometer"));
        hub
    }

    /// Install or replace the default sensor for its kind
    pub fn install(&mut self, sensor: Sensor) {
        debug!("installing {:?} sensor {:?}", sensor.kind, sensor.name);
        self.sensors.insert(sensor.kind, sensor);
    }

    /// Remove a sensor; existing registrations for it stay but receive nothing new
    pub fn remove(&mut self, kind: SensorKind) -> Option<Sensor> {
        self.sensors.remove(&kind)
    }

    /// Deliver an event to every interested listener; returns the number of deliveries
    pub fn dispatch(&mut self, event: &SensorEvent) -> usize {
        if !self.sensors.contains_key(&event.kind) {
            trace!("no {:?} sensor installed, dropping event", event.kind);
            return 0;
        }

        let mut delivered = 0;
        for registration in &mut self.registrations {
            if registration.kind != event.kind || !registration.wants(event.timestamp_ns) {
                continue;
            }
            registration.last_delivered_ns = Some(event.timestamp_ns);
            registration.listener.borrow_mut().on_sensor_changed(event);
            delivered += 1;
        }
        delivered
    }

    /// Update the accuracy of a stream, notifying listeners when it changes
    pub fn set_accuracy(&mut self, kind: SensorKind, accuracy: SensorAccuracy) {
        if self.accuracy.insert(kind, accuracy) == Some(accuracy) {
            return;
        }
        for registration in self.registrations.iter().filter(|r| r.kind == kind) {
            registration
                .listener
                .borrow_mut()
                .on_accuracy_changed(kind, accuracy);
        }
    }

    /// Current accuracy of a stream
    pub fn accuracy(&self, kind: SensorKind) -> SensorAccuracy {
        self.accuracy.get(&kind).copied().unwrap_or_default()
    }

    /// Number of live registrations
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    /// True when `listener` has at least one live registration
    pub fn is_registered(&self, listener: &SharedListener) -> bool {
        self.registrations
            .iter()
            .any(|r| same_listener(&r.listener, listener))
    }
}

impl SensorService for SensorHub {
    fn default_sensor(&self, kind: SensorKind) -> Option<Sensor> {
        self.sensors.get(&kind).cloned()
    }

    fn register_listener(
        &mut self,
        listener: &SharedListener,
        sensor: &Sensor,
        delay: SensorDelay,
    ) -> Result<ListenerId, SensorError> {
        if !self.sensors.contains_key(&sensor.kind) {
            return Err(SensorError::Unavailable(sensor.kind));
        }
        if self
            .registrations
            .iter()
            .any(|r| r.kind == sensor.kind && same_listener(&r.listener, listener))
        {
            return Err(SensorError::AlreadyRegistered(sensor.kind));
        }

        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.registrations.push(Registration {
            id,
            kind: sensor.kind,
            // The hardware cannot deliver faster than its minimum delay
            period_ns: delay.period_ns().max(sensor.min_delay_us * 1_000),
            listener: Rc::clone(listener),
            last_delivered_ns: None,
        });
        debug!("registered {:?} for {:?} at {:?}", id, sensor.kind, delay);
        Ok(id)
    }

    fn unregister_listener(&mut self, listener: &SharedListener) -> usize {
        let before = self.registrations.len();
        self.registrations
            .retain(|r| !same_listener(&r.listener, listener));
        let removed = before - self.registrations.len();
        debug!("unregistered listener from {} sensor(s)", removed);
        removed
    }
}
