use kompass::{
    CompassScreen, CompassSettings, DisplayList, MenuItem, SensorEvent, SensorHub, Size,
};
use nalgebra::Vector3;

const SAMPLE_PERIOD_NS: u64 = 100_000_000; // 100 ms sample period

fn main() {
    env_logger::init();

    let mut hub = SensorHub::with_default_sensors();
    let mut screen = CompassScreen::new(CompassSettings::default());
    let mut frame = DisplayList::new(Size::new(1080.0, 1920.0));

    // screen becomes visible
    screen.attach(Some(&mut hub));

    for step in 0..12u64 {
        // device lying flat and turning clockwise, 30 degrees per sample
        let heading = (step * 30) as f32;
        let h = heading.to_radians();
        let accelerometer = Vector3::new(0.0, 0.0, 9.81); // replace with accelerometer data in m/s^2
        let magnetometer = Vector3::new(-22.0 * h.sin(), 22.0 * h.cos(), -40.0); // and field data in uT

        let timestamp_ns = step * SAMPLE_PERIOD_NS;
        hub.dispatch(&SensorEvent::accelerometer(accelerometer, timestamp_ns));
        hub.dispatch(&SensorEvent::magnetic_field(magnetometer, timestamp_ns));

        frame.clear();
        if let Err(error) = screen.redraw(&mut frame) {
            eprintln!("redraw failed: {}", error);
            continue;
        }

        println!(
            "Heading: {:6.2}, Draw commands: {}",
            screen.azimuth(),
            frame.commands().len()
        );
    }

    screen.open_menu();
    println!("{}", screen.select(MenuItem::Settings));

    // screen hidden: no more updates reach it
    screen.detach(Some(&mut hub));
    let deliveries = hub.dispatch(&SensorEvent::accelerometer(Vector3::new(0.0, 0.0, 9.81), 0));
    println!(
        "Detached, heading held at {:.2}, deliveries after detach: {}",
        screen.azimuth(),
        deliveries
    );
}
