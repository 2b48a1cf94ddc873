//! Compass replay rendered to SVG
//!
//! Replays the recorded turn from `testdata/compass_turn.csv` through a
//! [`SensorHub`] into a [`CompassScreen`], then writes `compass_replay.svg`
//! showing:
//! - Fused heading against the recorded reference heading
//! - The rose as drawn at eight points during the turn
//!
//! Frames are recorded into a [`DisplayList`] and replayed onto a plotters
//! drawing area through the [`Canvas`] trait.
//!
//! Run with: `cargo run --example render`

use kompass::{
    Canvas, Color, CompassScreen, CompassSettings, DisplayList, Path, SensorEvent, SensorHub, Size,
};
use log::{debug, info};
use nalgebra::{Isometry2, Point2, Vector3};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::Color as _;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Deserialize;
use std::error::Error;

#[derive(Debug, Deserialize)]
struct SensorData {
    #[serde(rename = "Time (s)")]
    time: f32,
    #[serde(rename = "Accelerometer X (m/s^2)")]
    accel_x: f32,
    #[serde(rename = "Accelerometer Y (m/s^2)")]
    accel_y: f32,
    #[serde(rename = "Accelerometer Z (m/s^2)")]
    accel_z: f32,
    #[serde(rename = "Magnetometer X (uT)")]
    mag_x: f32,
    #[serde(rename = "Magnetometer Y (uT)")]
    mag_y: f32,
    #[serde(rename = "Magnetometer Z (uT)")]
    mag_z: f32,
    #[serde(rename = "Heading (deg)")]
    heading: f32,
}

const OUTPUT: &str = "compass_replay.svg";
const FRAME_COUNT: usize = 8;
const SEGMENTS_PER_CURVE: usize = 6;

/// Plotters drawing area behind the [`Canvas`] trait
///
/// The first drawing error is kept and reported once the frame is done.
struct PlottersCanvas<'a, 'b> {
    area: &'a DrawingArea<SVGBackend<'b>, Shift>,
    error: Option<String>,
}

impl<'a, 'b> PlottersCanvas<'a, 'b> {
    fn new(area: &'a DrawingArea<SVGBackend<'b>, Shift>) -> Self {
        Self { area, error: None }
    }

    fn finish(self) -> Result<(), Box<dyn Error>> {
        match self.error {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    fn record<E: std::fmt::Display>(&mut self, result: Result<(), E>) {
        if let Err(error) = result {
            self.error.get_or_insert_with(|| error.to_string());
        }
    }
}

fn rgb(color: Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn pixel(point: Point2<f32>) -> (i32, i32) {
    (point.x.round() as i32, point.y.round() as i32)
}

impl Canvas for PlottersCanvas<'_, '_> {
    fn size(&self) -> Size {
        let (width, height) = self.area.dim_in_pixel();
        Size::new(width as f32, height as f32)
    }

    fn fill_path(&mut self, path: &Path, transform: &Isometry2<f32>, color: Color) {
        for outline in path.transform(transform).flatten(SEGMENTS_PER_CURVE) {
            let points: Vec<(i32, i32)> = outline.into_iter().map(pixel).collect();
            let result = self.area.draw(&Polygon::new(points, rgb(color).filled()));
            self.record(result);
        }
    }

    fn fill_circle(
        &mut self,
        center: Point2<f32>,
        radius: f32,
        transform: &Isometry2<f32>,
        color: Color,
    ) {
        let center = transform * center;
        let result = self.area.draw(&Circle::new(
            pixel(center),
            radius.round() as i32,
            rgb(color).filled(),
        ));
        self.record(result);
    }

    fn draw_text(&mut self, text: &str, position: Point2<f32>, color: Color) {
        let style = ("sans-serif", 16)
            .into_font()
            .color(&rgb(color))
            .pos(Pos::new(HPos::Center, VPos::Center));
        let result = self.area.draw(&Text::new(text.to_owned(), pixel(position), style));
        self.record(result);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // Load sensor data from CSV
    let mut reader = csv::Reader::from_path("testdata/compass_turn.csv")?;
    let mut sensor_data = Vec::new();
    for result in reader.deserialize() {
        let record: SensorData = result?;
        sensor_data.push(record);
    }
    if sensor_data.is_empty() {
        return Err("no samples in testdata/compass_turn.csv".into());
    }
    info!("Replaying {} samples", sensor_data.len());

    let mut hub = SensorHub::with_default_sensors();
    let mut screen = CompassScreen::new(CompassSettings::default());
    screen.attach(Some(&mut hub));

    let root = SVGBackend::new(OUTPUT, (1200, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(400);
    let frame_areas = lower.split_evenly((2, FRAME_COUNT / 2));
    let frame_stride = sensor_data.len().div_ceil(FRAME_COUNT).max(1);

    let mut headings = Vec::with_capacity(sensor_data.len());
    let mut frames = Vec::with_capacity(FRAME_COUNT);

    for (i, data) in sensor_data.iter().enumerate() {
        let timestamp_ns = (f64::from(data.time) * 1e9).round() as u64;
        let accelerometer = Vector3::new(data.accel_x, data.accel_y, data.accel_z);
        let magnetometer = Vector3::new(data.mag_x, data.mag_y, data.mag_z);

        hub.dispatch(&SensorEvent::accelerometer(accelerometer, timestamp_ns));
        hub.dispatch(&SensorEvent::magnetic_field(magnetometer, timestamp_ns));
        headings.push(screen.azimuth());

        if i % frame_stride == 0 && frames.len() < frame_areas.len() {
            let (width, height) = frame_areas[frames.len()].dim_in_pixel();
            let mut frame = DisplayList::new(Size::new(width as f32, height as f32));
            screen.redraw(&mut frame)?;
            debug!(
                "frame {} at {:.1}s: {} commands",
                frames.len(),
                data.time,
                frame.commands().len()
            );
            frames.push((data.time, screen.azimuth(), frame));
        }
    }
    screen.detach(Some(&mut hub));

    // Heading trace
    let time_range = sensor_data[0].time..sensor_data[sensor_data.len() - 1].time;
    let mut chart = ChartBuilder::on(&upper)
        .caption("Heading", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range, 0f32..360f32)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Degrees")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            sensor_data.iter().map(|d| (d.time, d.heading)),
            &BLUE,
        ))?
        .label("Reference")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLUE));

    chart
        .draw_series(
            sensor_data
                .iter()
                .zip(headings.iter())
                .map(|(d, &h)| Circle::new((d.time, h), 2, RED.filled())),
        )?
        .label("Fused")
        .legend(|(x, y)| Circle::new((x + 5, y), 2, RED.filled()));

    chart.configure_series_labels().draw()?;

    // Rose frames
    for (area, (time, azimuth, frame)) in frame_areas.iter().zip(frames.iter()) {
        let mut canvas = PlottersCanvas::new(area);
        frame.replay(&mut canvas);
        canvas.finish()?;
        area.draw(&Text::new(
            format!("{:.1}s  {:.0}°", time, azimuth),
            (5, 5),
            ("sans-serif", 14).into_font(),
        ))?;
    }

    root.present()?;
    println!("✓ Replay saved to {}", OUTPUT);
    Ok(())
}
