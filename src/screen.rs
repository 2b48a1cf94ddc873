//! The compass screen: title bar, overflow menu, sensor lifecycle and redraw

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::axes::DisplayRotation;
use crate::calibration::MagneticCalibration;
use crate::canvas::{Canvas, Size};
use crate::error::ShapeError;
use crate::rose::CompassRose;
use crate::sampler::{OrientationSampler, SamplerState};
use crate::sensor::{SensorService, SharedListener};
use crate::types::{CompassSettings, SensorKind};

/// Detached sampler still registered with a service, and how many times
type StaleRegistration = (Rc<RefCell<OrientationSampler>>, usize);

/// Unregister `sampler`; returns it if some of its registrations survived
fn release(
    service: &mut dyn SensorService,
    sampler: Rc<RefCell<OrientationSampler>>,
    registered: usize,
) -> Option<StaleRegistration> {
    let listener: SharedListener = sampler.clone();
    let remaining = registered.saturating_sub(service.unregister_listener(&listener));
    if remaining == 0 {
        return None;
    }
    warn!("{} registration(s) survived unregistering", remaining);
    Some((sampler, remaining))
}

/// Entries of the title bar's overflow menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Settings,
}

impl MenuItem {
    pub const ALL: [MenuItem; 1] = [MenuItem::Settings];

    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Settings => "Settings",
        }
    }
}

/// Single-screen compass
///
/// While attached, one [`OrientationSampler`] is registered with the sensor
/// service for both the accelerometer and the magnetometer. Detaching
/// unregisters it and discards its buffers; the last heading stays on
/// screen. Registrations that could not be removed at detach time are kept
/// and released by the next `attach` or `detach` given a service.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use kompass::{CompassScreen, CompassSettings, DisplayList, SensorEvent, SensorHub, Size};
///
/// let mut hub = SensorHub::with_default_sensors();
/// let mut screen = CompassScreen::new(CompassSettings::default());
/// screen.attach(Some(&mut hub));
///
/// hub.dispatch(&SensorEvent::accelerometer(Vector3::new(0.0, 0.0, 9.81), 0));
/// hub.dispatch(&SensorEvent::magnetic_field(Vector3::new(-22.0, 0.0, -40.0), 0));
/// assert!((screen.azimuth() - 90.0).abs() < 1e-3);
///
/// let mut frame = DisplayList::new(Size::new(400.0, 600.0));
/// screen.redraw(&mut frame).unwrap();
/// assert_eq!(frame.commands().len(), 3);
///
/// screen.detach(Some(&mut hub));
/// ```
#[derive(Debug)]
pub struct CompassScreen {
    settings: CompassSettings,
    sampler: Option<Rc<RefCell<OrientationSampler>>>,
    registered: usize,
    stale: Vec<StaleRegistration>,
    azimuth: f32,
    menu_expanded: bool,
    layout: Option<(Size, CompassRose)>,
}

impl CompassScreen {
    pub fn new(settings: CompassSettings) -> Self {
        Self {
            settings,
            sampler: None,
            registered: 0,
            stale: Vec::new(),
            azimuth: 0.0,
            menu_expanded: false,
            layout: None,
        }
    }

    pub fn settings(&self) -> &CompassSettings {
        &self.settings
    }

    /// Title shown in the title bar
    pub fn title(&self) -> &str {
        &self.settings.title
    }

    pub fn menu_items(&self) -> &'static [MenuItem] {
        &MenuItem::ALL
    }

    pub fn is_menu_expanded(&self) -> bool {
        self.menu_expanded
    }

    /// Overflow button pressed
    pub fn open_menu(&mut self) {
        self.menu_expanded = true;
    }

    /// Tap outside the menu
    pub fn dismiss_menu(&mut self) {
        self.menu_expanded = false;
    }

    /// Pick a menu entry; returns the transient notice to show
    ///
    /// The entries do nothing beyond acknowledging the tap.
    pub fn select(&mut self, item: MenuItem) -> String {
        self.menu_expanded = false;
        info!("menu item {:?} selected", item);
        format!("{} Clicked", item.label())
    }

    /// Screen became visible: register for sensor updates
    ///
    /// A missing service or sensor is not an error; the compass just stays
    /// still. Returns the number of sensors registered.
    pub fn attach(&mut self, service: Option<&mut dyn SensorService>) -> usize {
        if self.sampler.is_some() {
            debug!("screen already attached");
            return 0;
        }

        let sampler = Rc::new(RefCell::new(OrientationSampler::with_settings(
            &self.settings,
        )));
        self.sampler = Some(Rc::clone(&sampler));
        self.registered = 0;

        let Some(service) = service else {
            warn!("no sensor service, compass stays static");
            return 0;
        };
        self.release_stale(&mut *service);

        let listener: SharedListener = sampler;
        let mut registered = 0;
        for kind in [SensorKind::MagneticField, SensorKind::Accelerometer] {
            let Some(sensor) = service.default_sensor(kind) else {
                warn!("no {:?} sensor, skipping registration", kind);
                continue;
            };
            match service.register_listener(&listener, &sensor, self.settings.delay) {
                Ok(id) => {
                    debug!("listening to {:?} as {:?}", sensor.name, id);
                    registered += 1;
                }
                Err(error) => warn!("cannot listen to {:?}: {}", sensor.name, error),
            }
        }
        self.registered = registered;
        registered
    }

    /// Screen hidden: unregister and discard the sensor buffers
    ///
    /// After this returns the displayed heading no longer changes, even if
    /// the service keeps delivering to a stale registration. Without a
    /// service the registrations are remembered until one is supplied.
    pub fn detach(&mut self, mut service: Option<&mut dyn SensorService>) {
        if let Some(service) = service.as_deref_mut() {
            self.release_stale(service);
        }

        let Some(sampler) = self.sampler.take() else {
            debug!("screen not attached");
            return;
        };

        self.azimuth = Self::current_azimuth(&sampler, self.azimuth);
        let registered = std::mem::take(&mut self.registered);
        let leftover = match service {
            Some(service) => release(service, sampler, registered),
            None if registered > 0 => {
                warn!(
                    "detached without a sensor service, {} registration(s) kept for later release",
                    registered
                );
                Some((sampler, registered))
            }
            None => None,
        };
        self.stale.extend(leftover);
    }

    /// Registrations left behind by earlier detaches
    pub fn stale_registrations(&self) -> usize {
        self.stale.iter().map(|(_, remaining)| remaining).sum()
    }

    fn release_stale(&mut self, service: &mut dyn SensorService) {
        if self.stale.is_empty() {
            return;
        }
        self.stale = std::mem::take(&mut self.stale)
            .into_iter()
            .filter_map(|(sampler, remaining)| release(&mut *service, sampler, remaining))
            .collect();
    }

    pub fn is_attached(&self) -> bool {
        self.sampler.is_some()
    }

    /// Heading in degrees, `[0, 360)`
    pub fn azimuth(&self) -> f32 {
        match &self.sampler {
            Some(sampler) => Self::current_azimuth(sampler, self.azimuth),
            None => self.azimuth,
        }
    }

    fn current_azimuth(sampler: &RefCell<OrientationSampler>, fallback: f32) -> f32 {
        let sampler = sampler.borrow();
        if sampler.updates() > 0 {
            sampler.azimuth()
        } else {
            fallback
        }
    }

    /// Sensor readiness, `None` while detached
    pub fn sampler_state(&self) -> Option<SamplerState> {
        self.sampler.as_ref().map(|sampler| sampler.borrow().state())
    }

    /// Display rotated; applies to the next reading
    pub fn set_display_rotation(&mut self, rotation: DisplayRotation) {
        self.settings.display_rotation = rotation;
        if let Some(sampler) = &self.sampler {
            sampler.borrow_mut().set_display_rotation(rotation);
        }
    }

    /// New magnetometer correction; applies to the next magnetometer reading
    pub fn set_magnetic_calibration(&mut self, calibration: MagneticCalibration) {
        self.settings.magnetic_calibration = calibration;
        if let Some(sampler) = &self.sampler {
            sampler.borrow_mut().set_calibration(calibration);
        }
    }

    /// Draw the rose at the current heading
    pub fn redraw(&mut self, canvas: &mut dyn Canvas) -> Result<(), ShapeError> {
        let size = canvas.size();
        let rose = match self.layout.take() {
            Some((cached, rose)) if cached == size => rose,
            _ => CompassRose::layout(&self.settings.rose, size)?,
        };

        let style = &self.settings.rose;
        let transform = rose.transform(self.azimuth());
        canvas.fill_path(rose.outline(), &transform, style.fill);
        canvas.fill_circle(
            rose.marker_center(),
            rose.marker_radius(),
            &transform,
            style.marker,
        );
        canvas.draw_text(&self.settings.title, rose.caption_position(), style.caption);

        self.layout = Some((size, rose));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, DrawCommand};
    use crate::sensor::SensorHub;
    use crate::types::SensorEvent;
    use nalgebra::{Point2, Vector3};

    fn flat(hub: &mut SensorHub, field: Vector3<f32>, timestamp_ns: u64) {
        hub.dispatch(&SensorEvent::accelerometer(Vector3::new(0.0, 0.0, 9.81), timestamp_ns));
        hub.dispatch(&SensorEvent::magnetic_field(field, timestamp_ns));
    }

    #[test]
    fn test_menu_is_inert() {
        let mut screen = CompassScreen::new(CompassSettings::default());
        assert_eq!(screen.title(), "Kompass");
        assert_eq!(screen.menu_items(), &[MenuItem::Settings]);
        assert!(!screen.is_menu_expanded());

        screen.open_menu();
        assert!(screen.is_menu_expanded());
        assert_eq!(screen.select(MenuItem::Settings), "Settings Clicked");
        assert!(!screen.is_menu_expanded());

        screen.open_menu();
        screen.dismiss_menu();
        assert!(!screen.is_menu_expanded());
    }

    #[test]
    fn test_attach_registers_both_sensors() {
        let mut hub = SensorHub::with_default_sensors();
        let mut screen = CompassScreen::new(CompassSettings::default());

        assert_eq!(screen.attach(Some(&mut hub)), 2);
        assert_eq!(hub.registration_count(), 2);
        assert_eq!(screen.sampler_state(), Some(SamplerState::AwaitingBoth));

        // Second attach is a no-op
        assert_eq!(screen.attach(Some(&mut hub)), 0);
        assert_eq!(hub.registration_count(), 2);
    }

    #[test]
    fn test_missing_service_keeps_compass_static() {
        let mut screen = CompassScreen::new(CompassSettings::default());
        assert_eq!(screen.attach(None), 0);
        assert!(screen.is_attached());
        assert_eq!(screen.azimuth(), 0.0);
        screen.detach(None);
        assert!(!screen.is_attached());
    }

    #[test]
    fn test_missing_magnetometer_is_skipped() {
        let mut hub = SensorHub::with_default_sensors();
        hub.remove(SensorKind::MagneticField);
        let mut screen = CompassScreen::new(CompassSettings::default());

        assert_eq!(screen.attach(Some(&mut hub)), 1);
        flat(&mut hub, Vector3::new(-22.0, 0.0, -40.0), 0);
        assert_eq!(screen.azimuth(), 0.0);
        assert_eq!(screen.sampler_state(), Some(SamplerState::AwaitingMagnetometer));
    }

    #[test]
    fn test_detach_freezes_heading() {
        let mut hub = SensorHub::with_default_sensors();
        let mut screen = CompassScreen::new(CompassSettings::default());
        screen.attach(Some(&mut hub));

        flat(&mut hub, Vector3::new(-22.0, 0.0, -40.0), 0);
        assert!((screen.azimuth() - 90.0).abs() < 1e-3);

        screen.detach(Some(&mut hub));
        assert_eq!(hub.registration_count(), 0);

        flat(&mut hub, Vector3::new(22.0, 0.0, -40.0), 1_000_000_000);
        assert!((screen.azimuth() - 90.0).abs() < 1e-3);
        assert_eq!(screen.sampler_state(), None);
    }

    #[test]
    fn test_detach_without_service_keeps_registrations_releasable() {
        let mut hub = SensorHub::with_default_sensors();
        let mut screen = CompassScreen::new(CompassSettings::default());
        screen.attach(Some(&mut hub));
        flat(&mut hub, Vector3::new(-22.0, 0.0, -40.0), 0);

        screen.detach(None);
        assert!(!screen.is_attached());
        assert_eq!(screen.stale_registrations(), 2);
        assert_eq!(hub.registration_count(), 2);

        // Still delivered to, but no longer shown
        flat(&mut hub, Vector3::new(22.0, 0.0, -40.0), 1_000_000_000);
        assert!((screen.azimuth() - 90.0).abs() < 1e-3);

        screen.detach(Some(&mut hub));
        assert_eq!(hub.registration_count(), 0);
        assert_eq!(screen.stale_registrations(), 0);
    }

    #[test]
    fn test_attach_cycle_reclaims_stale_registrations() {
        let mut hub = SensorHub::with_default_sensors();
        let mut other = SensorHub::with_default_sensors();
        let mut screen = CompassScreen::new(CompassSettings::default());

        screen.attach(Some(&mut hub));
        screen.detach(Some(&mut other));
        assert_eq!(hub.registration_count(), 2);
        assert_eq!(screen.stale_registrations(), 2);

        assert_eq!(screen.attach(Some(&mut hub)), 2);
        assert_eq!(hub.registration_count(), 2);
        assert_eq!(screen.stale_registrations(), 0);

        screen.detach(Some(&mut hub));
        assert_eq!(hub.registration_count(), 0);
    }

    #[test]
    fn test_reattach_starts_with_fresh_buffers() {
        let mut hub = SensorHub::with_default_sensors();
        let mut screen = CompassScreen::new(CompassSettings::default());
        screen.attach(Some(&mut hub));
        flat(&mut hub, Vector3::new(-22.0, 0.0, -40.0), 0);
        screen.detach(Some(&mut hub));

        screen.attach(Some(&mut hub));
        assert_eq!(screen.sampler_state(), Some(SamplerState::AwaitingBoth));
        // Previous heading shown until both sensors report again
        assert!((screen.azimuth() - 90.0).abs() < 1e-3);

        hub.dispatch(&SensorEvent::magnetic_field(Vector3::new(0.0, -22.0, -40.0), 1));
        assert!((screen.azimuth() - 90.0).abs() < 1e-3);
        hub.dispatch(&SensorEvent::accelerometer(Vector3::new(0.0, 0.0, 9.81), 1));
        assert!((screen.azimuth() - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_calibration_change_reaches_live_sampler() {
        let mut hub = SensorHub::with_default_sensors();
        let mut screen = CompassScreen::new(CompassSettings::default());
        screen.attach(Some(&mut hub));

        // Raw reading carries a 100 µT hard iron offset along device X
        flat(&mut hub, Vector3::new(100.0, 22.0, -40.0), 0);
        assert!((screen.azimuth() - 282.41).abs() < 0.05, "raw: {}", screen.azimuth());

        screen.set_magnetic_calibration(MagneticCalibration {
            hard_iron: Vector3::new(100.0, 0.0, 0.0),
            ..Default::default()
        });
        flat(&mut hub, Vector3::new(100.0, 22.0, -40.0), 1_000_000_000);
        let heading = screen.azimuth();
        assert!(heading < 1e-3 || heading > 359.999, "heading: {}", heading);

        // Kept for the next attach
        screen.detach(Some(&mut hub));
        assert!(!screen.settings().magnetic_calibration.is_identity());
    }

    #[test]
    fn test_redraw_draws_rose_marker_and_caption() {
        let mut hub = SensorHub::with_default_sensors();
        let mut screen = CompassScreen::new(CompassSettings::default());
        screen.attach(Some(&mut hub));
        flat(&mut hub, Vector3::new(-22.0, 0.0, -40.0), 0);

        let mut frame = DisplayList::new(Size::new(420.0, 800.0));
        screen.redraw(&mut frame).unwrap();

        let commands = frame.commands();
        assert_eq!(commands.len(), 3);
        let DrawCommand::FillPath { path, transform, color } = &commands[0] else {
            panic!("first command must fill the rose");
        };
        assert_eq!(*color, screen.settings().rose.fill);
        assert_eq!(path.curve_count(), 72);
        assert!((transform.rotation.angle() + 90f32.to_radians()).abs() < 1e-4);

        let DrawCommand::FillCircle { center, transform, .. } = &commands[1] else {
            panic!("second command must draw the marker");
        };
        let marker = transform * center;
        assert!((marker - Point2::new(110.0, 380.0)).norm() < 1e-2);

        assert!(matches!(&commands[2], DrawCommand::Text { text, .. } if text == "Kompass"));
    }

    #[test]
    fn test_redraw_on_tiny_canvas_fails() {
        let mut screen = CompassScreen::new(CompassSettings::default());
        let mut frame = DisplayList::new(Size::new(20.0, 20.0));
        assert!(screen.redraw(&mut frame).is_err());
        assert!(frame.commands().is_empty());
    }
}
