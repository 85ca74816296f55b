//! Backend-neutral drawing commands.
//!
//! The renderer makes every geometric decision and records it here in pixel
//! space (origin top-left, y down). Backends only interpret the list.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Drawing order; lower layers are painted first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    Grid,
    Fill,
    Wall,
    Symbol,
    Dimension,
    Annotation,
}

/// Opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const INK: Color = Color::rgb(20, 20, 20);
    pub const WALL: Color = Color::rgb(40, 40, 40);
    pub const GRID_MINOR: Color = Color::rgb(232, 236, 242);
    pub const GRID_MAJOR: Color = Color::rgb(200, 208, 220);
    pub const ROOM_FILL: Color = Color::rgb(250, 248, 242);
    pub const STAIR_FILL: Color = Color::rgb(236, 236, 236);
    pub const DIMENSION: Color = Color::rgb(30, 80, 160);
    pub const FIXTURE: Color = Color::rgb(90, 90, 90);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// `#rrggbb`
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Stroke color and width in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width_px: f64,
}

impl Stroke {
    pub fn new(color: Color, width_px: f64) -> Self {
        Stroke { color, width_px }
    }
}

/// Horizontal text alignment about the anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// One primitive, in pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// Solid wall piece: a quad offset from the centerline by half the
    /// thickness on each side
    Wall { corners: [Point; 4], color: Color },
    Line { from: Point, to: Point, stroke: Stroke },
    /// Circular arc. Angles in degrees, measured from +x toward +y (clockwise
    /// on screen); a sweep of 360 draws a full circle.
    Arc {
        center: Point,
        radius: f64,
        start_deg: f64,
        sweep_deg: f64,
        stroke: Stroke,
    },
    Polyline {
        points: Vec<Point>,
        closed: bool,
        stroke: Stroke,
    },
    Rect {
        origin: Point,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Text {
        at: Point,
        text: String,
        size_px: f64,
        anchor: TextAnchor,
        /// Clockwise rotation about `at`
        rotation_deg: f64,
        color: Color,
    },
    /// Line with an arrowhead at `to` (and at `from` when `both_ends`)
    Arrow {
        from: Point,
        to: Point,
        head_px: f64,
        both_ends: bool,
        stroke: Stroke,
    },
}

impl DrawCommand {
    /// Every coordinate in the command is finite
    pub fn is_finite(&self) -> bool {
        match self {
            DrawCommand::Wall { corners, .. } => corners.iter().all(|p| p.is_finite()),
            DrawCommand::Line { from, to, .. } | DrawCommand::Arrow { from, to, .. } => {
                from.is_finite() && to.is_finite()
            }
            DrawCommand::Arc {
                center,
                radius,
                start_deg,
                sweep_deg,
                ..
            } => center.is_finite() && radius.is_finite() && start_deg.is_finite() && sweep_deg.is_finite(),
            DrawCommand::Polyline { points, .. } => points.iter().all(|p| p.is_finite()),
            DrawCommand::Rect {
                origin, width, height, ..
            } => origin.is_finite() && width.is_finite() && height.is_finite(),
            DrawCommand::Text { at, size_px, .. } => at.is_finite() && size_px.is_finite(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeredCommand {
    pub layer: Layer,
    pub command: DrawCommand,
}

/// A finished drawing: canvas size plus commands in paint order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub width_px: u32,
    pub height_px: u32,
    pub background: Color,
    pub commands: Vec<LayeredCommand>,
}

impl Drawing {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Drawing {
            width_px,
            height_px,
            background: Color::WHITE,
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, layer: Layer, command: DrawCommand) {
        self.commands.push(LayeredCommand { layer, command });
    }

    /// Sort into paint order. The sort is stable, so commands on one layer
    /// keep their emission order.
    pub fn finish(mut self) -> Self {
        self.commands.sort_by_key(|c| c.layer);
        self
    }

    pub fn on_layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCommand> + '_ {
        self.commands.iter().filter(move |c| c.layer == layer).map(|c| &c.command)
    }

    /// All text in paint order
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|c| match &c.command {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Triangle for an arrowhead with its tip at `to`: `[tip, left, right]`.
/// `None` for a zero-length shaft.
pub fn arrowhead(from: Point, to: Point, size_px: f64) -> Option<[Point; 3]> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let length = (dx * dx + dy * dy).sqrt();
    if length < 1e-3 {
        return None;
    }
    let (ux, uy) = (dx / length, dy / length);
    let half = size_px * 0.35;
    let base = Point::new(to.x - ux * size_px, to.y - uy * size_px);
    Some([
        to,
        Point::new(base.x - uy * half, base.y + ux * half),
        Point::new(base.x + uy * half, base.y - ux * half),
    ])
}

/// Points along an arc, one per `step_deg` or finer
pub fn arc_points(center: Point, radius: f64, start_deg: f64, sweep_deg: f64, step_deg: f64) -> Vec<Point> {
    let steps = (sweep_deg.abs() / step_deg).ceil().max(1.0) as usize;
    (0..=steps)
        .map(|i| {
            let theta = (start_deg + sweep_deg * i as f64 / steps as f64).to_radians();
            Point::new(center.x + radius * theta.cos(), center.y + radius * theta.sin())
        })
        .collect()
}
