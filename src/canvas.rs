//! Drawing surface seam and a recording implementation

use nalgebra::{Isometry2, Point2};

use crate::rose::Path;

/// Size of a drawing surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Shorter of the two sides
    pub fn min_dimension(&self) -> f32 {
        self.width.min(self.height)
    }

    /// Centre of the surface
    pub fn center(&self) -> Point2<f32> {
        Point2::new(self.width * 0.5, self.height * 0.5)
    }
}

/// RGBA color, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLUE: Color = Color::rgb(0x00, 0x00, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// `#rrggbb` notation, alpha dropped
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Host drawing surface
///
/// Shapes are given in surface coordinates (origin top-left, Y down)
/// together with the transform to apply before rasterizing.
pub trait Canvas {
    /// Current size of the surface
    fn size(&self) -> Size;

    /// Fill a closed path
    fn fill_path(&mut self, path: &Path, transform: &Isometry2<f32>, color: Color);

    /// Fill a circle
    fn fill_circle(
        &mut self,
        center: Point2<f32>,
        radius: f32,
        transform: &Isometry2<f32>,
        color: Color,
    );

    /// Draw a line of text centred on `position`
    fn draw_text(&mut self, text: &str, position: Point2<f32>, color: Color);
}

/// One recorded drawing operation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillPath {
        path: Path,
        transform: Isometry2<f32>,
        color: Color,
    },
    FillCircle {
        center: Point2<f32>,
        radius: f32,
        transform: Isometry2<f32>,
        color: Color,
    },
    Text {
        text: String,
        position: Point2<f32>,
        color: Color,
    },
}

/// Canvas that records what it is asked to draw
///
/// Useful for tests and for handing a frame to a renderer later.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop recorded commands, keeping the size
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    /// Replay the recorded commands onto another canvas
    pub fn replay(&self, target: &mut dyn Canvas) {
        for command in &self.commands {
            match command {
                DrawCommand::FillPath {
                    path,
                    transform,
                    color,
                } => target.fill_path(path, transform, *color),
                DrawCommand::FillCircle {
                    center,
                    radius,
                    transform,
                    color,
                } => target.fill_circle(*center, *radius, transform, *color),
                DrawCommand::Text {
                    text,
                    position,
                    color,
                } => target.draw_text(text, *position, *color),
            }
        }
    }
}

impl Canvas for DisplayList {
    fn size(&self) -> Size {
        self.size
    }

    fn fill_path(&mut self, path: &Path, transform: &Isometry2<f32>, color: Color) {
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            transform: *transform,
            color,
        });
    }

    fn fill_circle(
        &mut self,
        center: Point2<f32>,
        radius: f32,
        transform: &Isometry2<f32>,
        color: Color,
    ) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            transform: *transform,
            color,
        });
    }

    fn draw_text(&mut self, text: &str, position: Point2<f32>, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            position,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_helpers() {
        let size = Size::new(300.0, 500.0);
        assert_eq!(size.min_dimension(), 300.0);
        assert_eq!(size.center(), Point2::new(150.0, 250.0));
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::BLUE.to_hex(), "#0000ff");
        assert_eq!(Color::rgb(0x12, 0xab, 0x0f).to_hex(), "#12ab0f");
    }

    #[test]
    fn test_replay_copies_commands() {
        let mut list = DisplayList::new(Size::new(10.0, 10.0));
        list.fill_circle(Point2::new(5.0, 5.0), 1.0, &Isometry2::identity(), Color::WHITE);
        list.draw_text("N", Point2::new(5.0, 1.0), Color::BLACK);

        let mut copy = DisplayList::new(list.size());
        list.replay(&mut copy);
        assert_eq!(copy.commands(), list.commands());

        list.clear();
        assert!(list.commands().is_empty());
        assert_eq!(list.size(), Size::new(10.0, 10.0));
    }
}
