//! Rounded star geometry for the compass rose

use core::f32::consts::PI;

use nalgebra::{Isometry2, Point2, Vector2};

use crate::canvas::{Color, Size};
use crate::error::ShapeError;

/// One segment of a [`Path`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point2<f32>),
    LineTo(Point2<f32>),
    CubicTo {
        control1: Point2<f32>,
        control2: Point2<f32>,
        to: Point2<f32>,
    },
    Close,
}

/// Outline made of lines and cubic Bézier curves
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, point: Point2<f32>) -> &mut Self {
        self.commands.push(PathCommand::MoveTo(point));
        self
    }

    pub fn line_to(&mut self, point: Point2<f32>) -> &mut Self {
        self.commands.push(PathCommand::LineTo(point));
        self
    }

    pub fn cubic_to(
        &mut self,
        control1: Point2<f32>,
        control2: Point2<f32>,
        to: Point2<f32>,
    ) -> &mut Self {
        self.commands.push(PathCommand::CubicTo {
            control1,
            control2,
            to,
        });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.commands.push(PathCommand::Close);
        self
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of cubic segments
    pub fn curve_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, PathCommand::CubicTo { .. }))
            .count()
    }

    /// Copy of the path with every point moved by `transform`
    pub fn transform(&self, transform: &Isometry2<f32>) -> Path {
        let map = |point: &Point2<f32>| transform * point;
        let commands = self
            .commands
            .iter()
            .map(|command| match command {
                PathCommand::MoveTo(point) => PathCommand::MoveTo(map(point)),
                PathCommand::LineTo(point) => PathCommand::LineTo(map(point)),
                PathCommand::CubicTo {
                    control1,
                    control2,
                    to,
                } => PathCommand::CubicTo {
                    control1: map(control1),
                    control2: map(control2),
                    to: map(to),
                },
                PathCommand::Close => PathCommand::Close,
            })
            .collect();

        Path { commands }
    }

    /// Approximate the outline with polylines, one per subpath
    ///
    /// Each cubic is sampled at `segments_per_curve` evenly spaced
    /// parameters. Closed subpaths end with their first point repeated.
    pub fn flatten(&self, segments_per_curve: usize) -> Vec<Vec<Point2<f32>>> {
        let segments = segments_per_curve.max(1);
        let mut polylines: Vec<Vec<Point2<f32>>> = Vec::new();
        let mut current: Vec<Point2<f32>> = Vec::new();

        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(point) => {
                    if current.len() > 1 {
                        polylines.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(point);
                }
                PathCommand::LineTo(point) => current.push(point),
                PathCommand::CubicTo {
                    control1,
                    control2,
                    to,
                } => {
                    let Some(&from) = current.last() else {
                        current.push(to);
                        continue;
                    };
                    for step in 1..=segments {
                        let t = step as f32 / segments as f32;
                        current.push(cubic_point(from, control1, control2, to, t));
                    }
                }
                PathCommand::Close => {
                    if let Some(&first) = current.first() {
                        current.push(first);
                        polylines.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if current.len() > 1 {
            polylines.push(current);
        }

        polylines
    }

    /// Axis-aligned bounds of the flattened outline as `(min, max)`
    pub fn bounds(&self) -> Option<(Point2<f32>, Point2<f32>)> {
        self.flatten(8)
            .into_iter()
            .flatten()
            .fold(None, |bounds, point| match bounds {
                None => Some((point, point)),
                Some((min, max)) => Some((min.inf(&point), max.sup(&point))),
            })
    }
}

fn cubic_point(
    p0: Point2<f32>,
    p1: Point2<f32>,
    p2: Point2<f32>,
    p3: Point2<f32>,
    t: f32,
) -> Point2<f32> {
    let u = 1.0 - t;
    let coords = p0.coords * (u * u * u)
        + p1.coords * (3.0 * u * u * t)
        + p2.coords * (3.0 * u * t * t)
        + p3.coords * (t * t * t);
    Point2::from(coords)
}

/// How much a polygon corner is rounded
///
/// `radius` is the radius of the arc fitted into the corner; it is clamped
/// per corner so two neighbouring roundings never overlap. `smoothing`
/// (0..=1) pulls the curve's control points towards the corner, giving a
/// tighter shoulder.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CornerRounding {
    pub radius: f32,
    pub smoothing: f32,
}

impl CornerRounding {
    /// Sharp corners
    pub const UNROUNDED: CornerRounding = CornerRounding {
        radius: 0.0,
        smoothing: 0.0,
    };

    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            smoothing: 0.0,
        }
    }
}

/// Polygon whose corners are replaced by curves when converted to a path
#[derive(Debug, Clone, PartialEq)]
pub struct RoundedPolygon {
    vertices: Vec<Point2<f32>>,
    center: Point2<f32>,
    rounding: CornerRounding,
}

impl RoundedPolygon {
    /// Polygon from explicit vertices, in drawing order
    pub fn new(
        vertices: Vec<Point2<f32>>,
        center: Point2<f32>,
        rounding: CornerRounding,
    ) -> Result<Self, ShapeError> {
        if vertices.len() < 3 {
            return Err(ShapeError::TooFewVertices(vertices.len()));
        }

        Ok(Self {
            vertices,
            center,
            rounding,
        })
    }

    /// Star with `vertices_per_radius` outer points alternating with as many inner points
    ///
    /// The first outer point lies at angle 0 (to the right of the centre).
    ///
    /// # Example
    /// ```
    /// use nalgebra::Point2;
    /// use kompass::{CornerRounding, RoundedPolygon};
    ///
    /// let star = RoundedPolygon::star(5, 100.0, 40.0, Point2::new(0.0, 0.0), CornerRounding::new(4.0)).unwrap();
    /// assert_eq!(star.vertices().len(), 10);
    /// assert_eq!(star.to_path().curve_count(), 10);
    /// ```
    pub fn star(
        vertices_per_radius: usize,
        radius: f32,
        inner_radius: f32,
        center: Point2<f32>,
        rounding: CornerRounding,
    ) -> Result<Self, ShapeError> {
        if vertices_per_radius < 3 {
            return Err(ShapeError::TooFewVertices(vertices_per_radius));
        }
        if !(radius > 0.0 && inner_radius > 0.0 && inner_radius < radius) {
            return Err(ShapeError::InvalidRadius {
                outer: radius,
                inner: inner_radius,
            });
        }

        let count = vertices_per_radius * 2;
        let step = PI / vertices_per_radius as f32;
        let vertices = (0..count)
            .map(|i| {
                let r = if i % 2 == 0 { radius } else { inner_radius };
                let angle = step * i as f32;
                center + Vector2::new(angle.cos(), angle.sin()) * r
            })
            .collect();

        Self::new(vertices, center, rounding)
    }

    pub fn vertices(&self) -> &[Point2<f32>] {
        &self.vertices
    }

    pub fn center(&self) -> Point2<f32> {
        self.center
    }

    pub fn rounding(&self) -> CornerRounding {
        self.rounding
    }

    /// Closed outline with every corner rounded
    pub fn to_path(&self) -> Path {
        let count = self.vertices.len();
        let corners: Vec<Corner> = (0..count)
            .map(|i| {
                let previous = self.vertices[(i + count - 1) % count];
                let next = self.vertices[(i + 1) % count];
                Corner::fit(previous, self.vertices[i], next, self.rounding)
            })
            .collect();

        let mut path = Path::new();
        for (i, corner) in corners.iter().enumerate() {
            if i == 0 {
                path.move_to(corner.start);
            } else {
                path.line_to(corner.start);
            }
            if let Some((control1, control2)) = corner.controls {
                path.cubic_to(control1, control2, corner.end);
            }
        }
        path.close();
        path
    }
}

/// Curve replacing one polygon corner
struct Corner {
    start: Point2<f32>,
    end: Point2<f32>,
    controls: Option<(Point2<f32>, Point2<f32>)>,
}

impl Corner {
    fn fit(
        previous: Point2<f32>,
        vertex: Point2<f32>,
        next: Point2<f32>,
        rounding: CornerRounding,
    ) -> Self {
        let sharp = Corner {
            start: vertex,
            end: vertex,
            controls: None,
        };

        let to_previous = previous - vertex;
        let to_next = next - vertex;
        let (previous_length, next_length) = (to_previous.norm(), to_next.norm());
        if rounding.radius <= 0.0 || previous_length == 0.0 || next_length == 0.0 {
            return sharp;
        }

        let d1 = to_previous / previous_length;
        let d2 = to_next / next_length;
        let angle = d1.dot(&d2).clamp(-1.0, 1.0).acos();
        let half_tan = (angle * 0.5).tan();
        if half_tan <= f32::EPSILON || angle >= PI - 1e-4 {
            return sharp;
        }

        let cut = (rounding.radius / half_tan).min(previous_length.min(next_length) * 0.5);
        let start = vertex + d1 * cut;
        let end = vertex + d2 * cut;

        // Quadratic with the vertex as control point, raised to a cubic
        let pull = (2.0 + rounding.smoothing.clamp(0.0, 1.0)) / 3.0;
        let control1 = start + (vertex - start) * pull;
        let control2 = end + (vertex - end) * pull;

        Corner {
            start,
            end,
            controls: Some((control1, control2)),
        }
    }
}

/// Geometry and colors of the compass rose, relative to the drawing square
///
/// Lengths are fractions of the square's side except `padding` and
/// `caption_height`, which are in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoseStyle {
    pub vertices_per_radius: usize,
    pub outer_radius: f32,
    pub inner_radius: f32,
    pub rounding: f32,
    pub marker_radius: f32,
    /// Distance of the north marker above the centre
    pub marker_offset: f32,
    pub padding: f32,
    pub caption_height: f32,
    pub fill: Color,
    pub marker: Color,
    pub caption: Color,
}

impl Default for RoseStyle {
    fn default() -> Self {
        Self {
            vertices_per_radius: 36,
            outer_radius: 0.4,
            inner_radius: 0.35,
            rounding: 1.0,
            marker_radius: 0.03,
            marker_offset: 0.25,
            padding: 10.0,
            caption_height: 40.0,
            fill: Color::BLUE,
            marker: Color::WHITE,
            caption: Color::BLACK,
        }
    }
}

/// Rose laid out for a particular surface, ready to draw at any heading
#[derive(Debug, Clone, PartialEq)]
pub struct CompassRose {
    outline: Path,
    center: Point2<f32>,
    side: f32,
    marker_center: Point2<f32>,
    marker_radius: f32,
    caption_position: Point2<f32>,
}

impl CompassRose {
    /// Lay the rose out in a square centred on the surface, caption below
    pub fn layout(style: &RoseStyle, size: Size) -> Result<Self, ShapeError> {
        let side = (size.width - 2.0 * style.padding)
            .min(size.height - 2.0 * style.padding - style.caption_height);
        if side.is_nan() || side <= 0.0 {
            return Err(ShapeError::AreaTooSmall {
                width: size.width,
                height: size.height,
            });
        }

        let top = (size.height - side - style.caption_height) * 0.5;
        let center = Point2::new(size.width * 0.5, top + side * 0.5);

        let star = RoundedPolygon::star(
            style.vertices_per_radius,
            side * style.outer_radius,
            side * style.inner_radius,
            center,
            CornerRounding::new(side * style.rounding),
        )?;

        Ok(Self {
            outline: star.to_path(),
            center,
            side,
            marker_center: center - Vector2::new(0.0, side * style.marker_offset),
            marker_radius: side * style.marker_radius,
            caption_position: Point2::new(center.x, top + side + style.caption_height * 0.5),
        })
    }

    /// Untransformed star outline
    pub fn outline(&self) -> &Path {
        &self.outline
    }

    pub fn center(&self) -> Point2<f32> {
        self.center
    }

    /// Side of the drawing square in pixels
    pub fn side(&self) -> f32 {
        self.side
    }

    pub fn marker_center(&self) -> Point2<f32> {
        self.marker_center
    }

    pub fn marker_radius(&self) -> f32 {
        self.marker_radius
    }

    pub fn caption_position(&self) -> Point2<f32> {
        self.caption_position
    }

    /// Rotation by `-azimuth` degrees about the rose centre
    ///
    /// Surface coordinates have Y pointing down, so a negative angle turns
    /// the rose counter-clockwise on screen and keeps the marker on north.
    pub fn transform(&self, azimuth: f32) -> Isometry2<f32> {
        rotation_about(self.center, -azimuth.to_radians())
    }
}

/// Rotation by `angle` radians about `pivot`
pub fn rotation_about(pivot: Point2<f32>, angle: f32) -> Isometry2<f32> {
    Isometry2::translation(pivot.x, pivot.y)
        * Isometry2::rotation(angle)
        * Isometry2::translation(-pivot.x, -pivot.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Point2<f32> {
        Point2::origin()
    }

    #[test]
    fn test_star_vertices_alternate() {
        let star = RoundedPolygon::star(4, 10.0, 5.0, origin(), CornerRounding::UNROUNDED).unwrap();
        assert_eq!(star.vertices().len(), 8);

        for (i, vertex) in star.vertices().iter().enumerate() {
            let expected = if i % 2 == 0 { 10.0 } else { 5.0 };
            assert!((vertex.coords.norm() - expected).abs() < 1e-4);
        }
        assert!((star.vertices()[0] - Point2::new(10.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_star_rejects_bad_parameters() {
        let rounding = CornerRounding::UNROUNDED;
        assert_eq!(
            RoundedPolygon::star(2, 10.0, 5.0, origin(), rounding),
            Err(ShapeError::TooFewVertices(2))
        );
        assert!(matches!(
            RoundedPolygon::star(5, 10.0, 12.0, origin(), rounding),
            Err(ShapeError::InvalidRadius { .. })
        ));
        assert!(matches!(
            RoundedPolygon::star(5, 10.0, 0.0, origin(), rounding),
            Err(ShapeError::InvalidRadius { .. })
        ));
    }

    #[test]
    fn test_unrounded_path_is_polygon() {
        let star = RoundedPolygon::star(3, 10.0, 4.0, origin(), CornerRounding::UNROUNDED).unwrap();
        let path = star.to_path();

        assert_eq!(path.curve_count(), 0);
        assert_eq!(path.commands().len(), 7); // move, 5 lines, close
        assert_eq!(path.commands()[0], PathCommand::MoveTo(star.vertices()[0]));
    }

    #[test]
    fn test_rounding_is_clamped_to_half_edges() {
        // Huge rounding, as used for the rose
        let star = RoundedPolygon::star(36, 40.0, 35.0, origin(), CornerRounding::new(100.0)).unwrap();
        let path = star.to_path();
        assert_eq!(path.curve_count(), 72);

        // Every point stays between the inner and outer radius
        for point in path.flatten(8).into_iter().flatten() {
            let r = point.coords.norm();
            assert!((34.0..=40.01).contains(&r), "radius {} outside rose band", r);
        }
    }

    #[test]
    fn test_rounded_corner_is_cut_back() {
        let square = RoundedPolygon::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(0.0, 10.0),
            ],
            Point2::new(5.0, 5.0),
            CornerRounding::new(2.0),
        )
        .unwrap();
        let path = square.to_path();

        // Right angle: cut = r / tan(45°) = r
        let PathCommand::MoveTo(start) = path.commands()[0] else {
            panic!("path must start with a move");
        };
        assert!((start - Point2::new(0.0, 2.0)).norm() < 1e-4);

        let (min, max) = path.bounds().unwrap();
        assert!(min.x >= -1e-4 && min.y >= -1e-4);
        assert!(max.x <= 10.0 + 1e-4 && max.y <= 10.0 + 1e-4);
    }

    #[test]
    fn test_polygon_needs_three_vertices() {
        let result = RoundedPolygon::new(vec![origin(), Point2::new(1.0, 0.0)], origin(), CornerRounding::UNROUNDED);
        assert_eq!(result, Err(ShapeError::TooFewVertices(2)));
    }

    #[test]
    fn test_flatten_closes_subpath() {
        let mut path = Path::new();
        path.move_to(origin())
            .line_to(Point2::new(1.0, 0.0))
            .cubic_to(Point2::new(1.0, 0.5), Point2::new(1.0, 0.5), Point2::new(1.0, 1.0))
            .close();

        let polylines = path.flatten(4);
        assert_eq!(polylines.len(), 1);
        let line = &polylines[0];
        assert_eq!(line.len(), 1 + 1 + 4 + 1);
        assert_eq!(line.first(), line.last());
        assert!((line[5] - Point2::new(1.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_rotation_about_pivot() {
        let pivot = Point2::new(100.0, 50.0);
        let quarter = rotation_about(pivot, PI / 2.0);

        assert!((quarter * pivot - pivot).norm() < 1e-4);
        // (110, 50) -> (100, 60): with Y down this is a clockwise quarter turn on screen
        assert!((quarter * Point2::new(110.0, 50.0) - Point2::new(100.0, 60.0)).norm() < 1e-4);
    }

    #[test]
    fn test_layout_matches_style_fractions() {
        let style = RoseStyle::default();
        let rose = CompassRose::layout(&style, Size::new(420.0, 800.0)).unwrap();

        assert!((rose.side() - 400.0).abs() < 1e-4);
        assert!((rose.center().x - 210.0).abs() < 1e-4);
        assert!((rose.marker_radius() - 12.0).abs() < 1e-4);
        assert!((rose.center().y - rose.marker_center().y - 100.0).abs() < 1e-4);
        assert!(rose.caption_position().y > rose.center().y + 200.0);

        let (min, max) = rose.outline().bounds().unwrap();
        // Rounding trims the tips slightly inside the outer radius
        let reach = max.x - rose.center().x;
        assert!((150.0..=160.0).contains(&reach), "reach {}", reach);
        assert!(min.x >= rose.center().x - 160.5);
        assert!(max.y <= rose.center().y + 160.5);
    }

    #[test]
    fn test_layout_rejects_tiny_area() {
        let result = CompassRose::layout(&RoseStyle::default(), Size::new(15.0, 15.0));
        assert!(matches!(result, Err(ShapeError::AreaTooSmall { .. })));
    }

    #[test]
    fn test_transform_keeps_marker_on_north() {
        let rose = CompassRose::layout(&RoseStyle::default(), Size::new(420.0, 800.0)).unwrap();

        // Heading east: north is to the left of the screen
        let marker = rose.transform(90.0) * rose.marker_center();
        assert!((marker.x - (rose.center().x - 100.0)).abs() < 1e-3);
        assert!((marker.y - rose.center().y).abs() < 1e-3);

        // Heading 0 leaves everything in place
        let marker = rose.transform(0.0) * rose.marker_center();
        assert!((marker - rose.marker_center()).norm() < 1e-4);
    }
}
