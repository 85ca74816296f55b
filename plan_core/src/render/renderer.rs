//! # Blueprint Renderer
//!
//! Walks one [`FloorPlan`] and produces a [`Drawing`]: a scaled list of
//! vector commands that a backend turns into SVG or pixels. Rendering is a
//! pure function of the plan and the configuration.
//!
//! ## Transform
//!
//! ```text
//! px_per_ft = dpi * 12 / scale          (1:50 at 150 dpi -> 36 px/ft)
//! px.x = (margin + x) * px_per_ft
//! px.y = (margin + depth - y) * px_per_ft   (plan-North up)
//! ```
//!
//! The title block sits in a band below the plan.
//!
//! ## Layers
//!
//! Grid, room fills, walls (cut at openings), symbols (doors, windows,
//! fixtures, stair), dimensions, then labels and the title block.

use serde::{Deserialize, Serialize};

use super::commands::{Color, DrawCommand, Drawing, Layer, Stroke, TextAnchor};
use crate::errors::{PlanError, PlanResult};
use crate::floor_plan::{DoorSwing, FloorPlan, Opening, OpeningKind, Wall};
use crate::geometry::{Axis, Direction, Point, Rect};
use crate::program::{RoomKind, StaircaseType};
use crate::regulation::Envelope;
use crate::units::{Feet, SqFt, EPSILON};

/// Height of the title band below the plan
const TITLE_BLOCK_FT: f64 = 5.0;
const MAJOR_GRID_EVERY: i64 = 5;
/// Offset of dimension lines from the footprint
const DIMENSION_CLEARANCE_FT: f64 = 1.0;
const EXTENSION_GAP_FT: f64 = 0.15;
const EXTENSION_OVERSHOOT_FT: f64 = 0.25;
/// Window mullion spacing
const MULLION_SPACING_FT: f64 = 1.5;
const MAX_CANVAS_PX: f64 = 16384.0;

/// Rendering options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Drawing scale denominator (50 means 1:50)
    pub scale: f64,
    pub dpi: f64,
    pub show_dimensions: bool,
    pub show_grid: bool,
    /// Blank border around the plan, in feet
    pub margin_ft: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            scale: 50.0,
            dpi: 150.0,
            show_dimensions: true,
            show_grid: true,
            margin_ft: 2.0,
        }
    }
}

impl RenderConfig {
    pub fn px_per_ft(&self) -> f64 {
        self.dpi * 12.0 / self.scale
    }

    pub fn validate(&self) -> PlanResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(PlanError::invalid_input("scale", self.scale.to_string(), "Scale must be positive"));
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(PlanError::invalid_input("dpi", self.dpi.to_string(), "DPI must be positive"));
        }
        if !self.margin_ft.is_finite() || self.margin_ft < 0.0 {
            return Err(PlanError::invalid_input(
                "margin_ft",
                self.margin_ft.to_string(),
                "Margin must be zero or more feet",
            ));
        }
        Ok(())
    }
}

/// World-to-pixel affine transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub px_per_ft: f64,
    origin_x: f64,
    origin_y: f64,
}

impl Transform {
    pub fn new(envelope: Envelope, config: &RenderConfig) -> Self {
        let s = config.px_per_ft();
        Transform {
            px_per_ft: s,
            origin_x: config.margin_ft * s,
            origin_y: (config.margin_ft + envelope.depth_ft) * s,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.origin_x + p.x * self.px_per_ft, self.origin_y - p.y * self.px_per_ft)
    }

    pub fn length(&self, feet: f64) -> f64 {
        feet * self.px_per_ft
    }
}

/// Render one floor. `facing` orients the compass rose.
pub fn render_floor(plan: &FloorPlan, facing: Direction, config: &RenderConfig) -> PlanResult<Drawing> {
    config.validate()?;
    check_geometry(plan)?;

    let envelope = plan.envelope();
    let s = config.px_per_ft();
    let width = (envelope.width_ft + 2.0 * config.margin_ft) * s;
    let height = (envelope.depth_ft + 2.0 * config.margin_ft + TITLE_BLOCK_FT) * s;
    if width > MAX_CANVAS_PX || height > MAX_CANVAS_PX {
        return Err(PlanError::invalid_input(
            "dpi",
            config.dpi.to_string(),
            format!("Canvas of {:.0} x {:.0} px is too large", width, height),
        ));
    }

    let mut painter = Painter {
        plan,
        config,
        tx: Transform::new(envelope, config),
        drawing: Drawing::new(width.ceil() as u32, height.ceil() as u32),
    };
    if config.show_grid {
        painter.grid();
    }
    painter.fills();
    painter.walls();
    painter.openings();
    painter.fixtures();
    painter.staircase();
    if config.show_dimensions {
        painter.dimensions();
    }
    painter.labels();
    painter.title_block(facing);

    let drawing = painter.drawing.finish();
    if let Some(bad) = drawing.commands.iter().find(|c| !c.command.is_finite()) {
        return Err(defect(plan.floor_index(), format!("{:?} layer", bad.layer), "non-finite coordinate"));
    }
    tracing::debug!(
        floor = plan.floor_index(),
        commands = drawing.commands.len(),
        width = drawing.width_px,
        height = drawing.height_px,
        "Floor rendered"
    );
    Ok(drawing)
}

// ============================================================================
// Geometry checks
// ============================================================================

fn defect(floor: usize, entity: String, reason: &str) -> PlanError {
    tracing::error!(floor, entity = %entity, reason, "Unrenderable geometry");
    PlanError::render(floor, entity, reason)
}

fn check_geometry(plan: &FloorPlan) -> PlanResult<()> {
    let floor = plan.floor_index();
    for room in plan.rooms() {
        if !room.footprint.is_finite() {
            return Err(defect(floor, room.id.to_string(), "non-finite footprint"));
        }
        if room.area() <= EPSILON {
            return Err(defect(floor, room.id.to_string(), "zero-area room"));
        }
    }
    for wall in plan.walls() {
        if !wall.start.is_finite() || !wall.end.is_finite() || !wall.thickness_ft.is_finite() {
            return Err(defect(floor, wall.id.to_string(), "non-finite wall"));
        }
        if wall.length() <= EPSILON {
            return Err(defect(floor, wall.id.to_string(), "zero-length wall"));
        }
    }
    for opening in plan.openings() {
        if !opening.offset_ft.is_finite() || !opening.width_ft.is_finite() {
            return Err(defect(floor, opening.id.to_string(), "non-finite opening"));
        }
    }
    Ok(())
}

// ============================================================================
// Vector helpers (plan feet)
// ============================================================================

fn offset(p: Point, v: Point, k: f64) -> Point {
    Point::new(p.x + v.x * k, p.y + v.y * k)
}

fn unit_along(wall: &Wall) -> Point {
    let length = wall.length();
    Point::new((wall.end.x - wall.start.x) / length, (wall.end.y - wall.start.y) / length)
}

/// Left normal, looking from the wall start toward its end
fn left_of(dir: Point) -> Point {
    Point::new(-dir.y, dir.x)
}

/// Plan-frame unit vector for a compass direction (North = +y)
fn heading(direction: Direction) -> Point {
    let theta = direction.bearing_degrees().to_radians();
    Point::new(theta.sin(), theta.cos())
}

fn angle_deg(from: Point, to: Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x).to_degrees()
}

fn normalize_deg(mut angle: f64) -> f64 {
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

// ============================================================================
// Painter
// ============================================================================

struct Painter<'a> {
    plan: &'a FloorPlan,
    config: &'a RenderConfig,
    tx: Transform,
    drawing: Drawing,
}

impl Painter<'_> {
    fn thin(&self) -> Stroke {
        Stroke::new(Color::INK, 1.0)
    }

    fn line(&mut self, layer: Layer, a: Point, b: Point, stroke: Stroke) {
        let (from, to) = (self.tx.apply(a), self.tx.apply(b));
        self.drawing.push(layer, DrawCommand::Line { from, to, stroke });
    }

    fn polyline(&mut self, layer: Layer, points: &[Point], closed: bool, stroke: Stroke) {
        let points = points.iter().map(|p| self.tx.apply(*p)).collect();
        self.drawing.push(layer, DrawCommand::Polyline { points, closed, stroke });
    }

    fn outline(&mut self, layer: Layer, r: Rect, stroke: Stroke) {
        let corners = [
            Point::new(r.x, r.y),
            Point::new(r.max_x(), r.y),
            Point::new(r.max_x(), r.max_y()),
            Point::new(r.x, r.max_y()),
        ];
        self.polyline(layer, &corners, true, stroke);
    }

    fn rect(&mut self, layer: Layer, r: Rect, fill: Option<Color>, stroke: Option<Stroke>) {
        let origin = self.tx.apply(Point::new(r.x, r.max_y()));
        self.drawing.push(
            layer,
            DrawCommand::Rect {
                origin,
                width: self.tx.length(r.width),
                height: self.tx.length(r.depth),
                fill,
                stroke,
            },
        );
    }

    fn circle(&mut self, layer: Layer, center: Point, radius_ft: f64, stroke: Stroke) {
        self.drawing.push(
            layer,
            DrawCommand::Arc {
                center: self.tx.apply(center),
                radius: self.tx.length(radius_ft),
                start_deg: 0.0,
                sweep_deg: 360.0,
                stroke,
            },
        );
    }

    fn text(&mut self, layer: Layer, at: Point, text: String, size_ft: f64, anchor: TextAnchor, rotation_deg: f64) {
        self.drawing.push(
            layer,
            DrawCommand::Text {
                at: self.tx.apply(at),
                text,
                size_px: self.tx.length(size_ft),
                anchor,
                rotation_deg,
                color: Color::INK,
            },
        );
    }

    fn arrow(&mut self, layer: Layer, a: Point, b: Point, both_ends: bool, stroke: Stroke) {
        self.drawing.push(
            layer,
            DrawCommand::Arrow {
                from: self.tx.apply(a),
                to: self.tx.apply(b),
                head_px: self.tx.length(0.3),
                both_ends,
                stroke,
            },
        );
    }

    // ------------------------------------------------------------------------

    fn grid(&mut self) {
        let env = self.plan.envelope();
        let minor = Stroke::new(Color::GRID_MINOR, 0.5);
        let major = Stroke::new(Color::GRID_MAJOR, 1.0);
        for i in 0..=env.width_ft.floor() as i64 {
            let x = i as f64;
            let stroke = if i % MAJOR_GRID_EVERY == 0 { major } else { minor };
            self.line(Layer::Grid, Point::new(x, 0.0), Point::new(x, env.depth_ft), stroke);
        }
        for j in 0..=env.depth_ft.floor() as i64 {
            let y = j as f64;
            let stroke = if j % MAJOR_GRID_EVERY == 0 { major } else { minor };
            self.line(Layer::Grid, Point::new(0.0, y), Point::new(env.width_ft, y), stroke);
        }
    }

    fn fills(&mut self) {
        for room in self.plan.rooms() {
            let fill = if room.kind == RoomKind::Staircase {
                Color::STAIR_FILL
            } else {
                Color::ROOM_FILL
            };
            self.rect(Layer::Fill, room.footprint, Some(fill), None);
        }
    }

    /// Solid wall pieces between openings, extended by half the thickness
    /// at the true wall ends so corners close.
    fn walls(&mut self) {
        for wall in self.plan.walls() {
            let half = wall.thickness_ft / 2.0;
            let length = wall.length();
            let normal = left_of(unit_along(wall));

            let mut gaps: Vec<&Opening> = self.plan.openings_on(wall.id).collect();
            gaps.sort_by(|a, b| a.offset_ft.total_cmp(&b.offset_ft));

            let mut pieces = Vec::new();
            let mut cursor = -half;
            for gap in gaps {
                if gap.offset_ft > cursor + EPSILON {
                    pieces.push((cursor, gap.offset_ft));
                }
                cursor = cursor.max(gap.offset_ft + gap.width_ft);
            }
            if length + half > cursor + EPSILON {
                pieces.push((cursor, length + half));
            }

            for (a, b) in pieces {
                let (pa, pb) = (wall.point_at(a), wall.point_at(b));
                let corners = [
                    self.tx.apply(offset(pa, normal, half)),
                    self.tx.apply(offset(pb, normal, half)),
                    self.tx.apply(offset(pb, normal, -half)),
                    self.tx.apply(offset(pa, normal, -half)),
                ];
                self.drawing.push(
                    Layer::Wall,
                    DrawCommand::Wall {
                        corners,
                        color: Color::WALL,
                    },
                );
            }
        }
    }

    fn openings(&mut self) {
        for opening in self.plan.openings() {
            let Some(wall) = self.plan.wall(opening.wall) else {
                continue;
            };
            match opening.kind {
                OpeningKind::Door => self.door(wall, opening),
                OpeningKind::Window => self.window(wall, opening),
            }
        }
    }

    /// Leaf drawn open at 90 degrees from the hinge jamb, with the quarter
    /// swing arc back to the strike jamb.
    fn door(&mut self, wall: &Wall, door: &Opening) {
        let dir = unit_along(wall);
        let a = wall.point_at(door.offset_ft);
        let b = wall.point_at(door.offset_ft + door.width_ft);
        let swing = door.swing.unwrap_or(DoorSwing::HingeStartLeft);
        let (hinge, strike) = if swing.hinge_at_start() { (a, b) } else { (b, a) };
        let side = if swing.opens_left() { 1.0 } else { -1.0 };
        let tip = offset(hinge, left_of(dir), side * door.width_ft);

        let stroke = Stroke::new(Color::INK, if door.main_entrance { 2.0 } else { 1.5 });
        self.line(Layer::Symbol, hinge, tip, stroke);

        let (hinge_px, tip_px, strike_px) = (self.tx.apply(hinge), self.tx.apply(tip), self.tx.apply(strike));
        let start_deg = angle_deg(hinge_px, tip_px);
        let sweep_deg = normalize_deg(angle_deg(hinge_px, strike_px) - start_deg);
        self.drawing.push(
            Layer::Symbol,
            DrawCommand::Arc {
                center: hinge_px,
                radius: self.tx.length(door.width_ft),
                start_deg,
                sweep_deg,
                stroke: Stroke::new(Color::INK, 0.75),
            },
        );

        if door.main_entrance {
            let mid = wall.point_at(door.offset_ft + door.width_ft / 2.0);
            let outward = self.outward(wall, mid);
            let label_at = offset(mid, outward, 1.2);
            self.text(Layer::Annotation, label_at, "ENTRY".to_string(), 0.4, TextAnchor::Middle, 0.0);
        }
    }

    /// Unit normal of an exterior wall pointing away from its room
    fn outward(&self, wall: &Wall, at: Point) -> Point {
        let normal = left_of(unit_along(wall));
        let inside = wall
            .rooms
            .first()
            .and_then(|id| self.plan.room(*id))
            .map(|r| r.footprint.center());
        match inside {
            Some(c) if (c.x - at.x) * normal.x + (c.y - at.y) * normal.y > 0.0 => Point::new(-normal.x, -normal.y),
            _ => normal,
        }
    }

    fn window(&mut self, wall: &Wall, window: &Opening) {
        let normal = left_of(unit_along(wall));
        let half = wall.thickness_ft / 2.0;
        let quarter = wall.thickness_ft / 4.0;
        let a = wall.point_at(window.offset_ft);
        let b = wall.point_at(window.offset_ft + window.width_ft);
        let stroke = self.thin();

        for k in [-quarter, quarter] {
            self.line(Layer::Symbol, offset(a, normal, k), offset(b, normal, k), stroke);
        }
        for jamb in [a, b] {
            self.line(Layer::Symbol, offset(jamb, normal, -half), offset(jamb, normal, half), stroke);
        }
        let mullions = mullion_count(window.width_ft);
        for i in 1..=mullions {
            let at = window.offset_ft + window.width_ft * i as f64 / (mullions + 1) as f64;
            let p = wall.point_at(at);
            self.line(Layer::Symbol, offset(p, normal, -quarter), offset(p, normal, quarter), stroke);
        }
    }

    fn fixtures(&mut self) {
        let t = self.plan.wall_thickness_ft();
        for room in self.plan.rooms() {
            let inner = room.footprint.inset(t / 2.0);
            match room.kind {
                RoomKind::Bathroom => self.bathroom(inner),
                RoomKind::Kitchen => self.kitchen(inner),
                RoomKind::Balcony => self.balcony(inner),
                RoomKind::Pooja => self.altar(inner),
                _ => {}
            }
        }
    }

    /// WC against the back wall on the left, basin on the right
    fn bathroom(&mut self, inner: Rect) {
        let s = (inner.width.min(inner.depth) / 5.0).clamp(0.5, 1.0);
        let stroke = Stroke::new(Color::FIXTURE, 1.0);
        let (x0, x1, top) = (inner.x, inner.max_x(), inner.max_y());

        let tank = Rect::new(x0 + 0.3 * s, top - 0.7 * s, 1.6 * s, 0.7 * s);
        self.outline(Layer::Symbol, tank, stroke);
        self.circle(Layer::Symbol, Point::new(x0 + 1.1 * s, top - 1.5 * s), 0.7 * s, stroke);

        let basin = Rect::new(x1 - 2.0 * s, top - 1.3 * s, 1.7 * s, 1.3 * s);
        self.outline(Layer::Symbol, basin, stroke);
        self.circle(Layer::Symbol, basin.center(), 0.4 * s, stroke);
    }

    /// L-shaped counter along the back and left walls with a two-burner hob
    fn kitchen(&mut self, inner: Rect) {
        let c = 2.0_f64.min(inner.width / 3.0).min(inner.depth / 3.0);
        let leg = inner.depth * 0.6;
        let (x0, x1, top) = (inner.x, inner.max_x(), inner.max_y());
        let stroke = Stroke::new(Color::FIXTURE, 1.0);
        let counter = [
            Point::new(x0, top),
            Point::new(x1, top),
            Point::new(x1, top - c),
            Point::new(x0 + c, top - c),
            Point::new(x0 + c, top - leg),
            Point::new(x0, top - leg),
        ];
        self.polyline(Layer::Symbol, &counter, true, stroke);
        for fraction in [0.55, 0.75] {
            self.circle(Layer::Symbol, Point::new(x0 + inner.width * fraction, top - c / 2.0), c * 0.2, stroke);
        }
    }

    /// Railing band along the balcony edge with diagonal hatching
    fn balcony(&mut self, inner: Rect) {
        let band = 0.3;
        let stroke = Stroke::new(Color::FIXTURE, 0.75);
        let rail = inner.inset(band);
        self.outline(Layer::Symbol, inner, stroke);
        self.outline(Layer::Symbol, rail, stroke);
        let mut x = inner.x;
        while x + band <= inner.max_x() + EPSILON {
            self.line(Layer::Symbol, Point::new(x, inner.y), Point::new(x + band, inner.y + band), stroke);
            self.line(Layer::Symbol, Point::new(x, rail.max_y()), Point::new(x + band, inner.max_y()), stroke);
            x += 1.0;
        }
    }

    /// Stepped altar against the back wall
    fn altar(&mut self, inner: Rect) {
        let width = inner.width * 0.5;
        let depth = 1.5_f64.min(inner.depth * 0.3);
        let base = Rect::new(inner.center().x - width / 2.0, inner.max_y() - depth, width, depth);
        let stroke = Stroke::new(Color::FIXTURE, 1.0);
        self.outline(Layer::Symbol, base, stroke);
        self.outline(Layer::Symbol, base.inset(depth * 0.25), stroke);
    }

    fn staircase(&mut self) {
        let Some(stair) = self.plan.staircase() else {
            return;
        };
        let fp = stair.footprint;
        let stroke = self.thin();
        let treads = stair.treads.max(1);
        let up = heading(stair.ascent);

        if stair.shape == StaircaseType::Spiral {
            let center = fp.center();
            let radius = fp.width.min(fp.depth) / 2.0 - 0.2;
            let column = radius * 0.15;
            self.circle(Layer::Symbol, center, radius, stroke);
            self.circle(Layer::Symbol, center, column, stroke);
            for i in 0..treads {
                let theta = (i as f64 * 360.0 / treads as f64).to_radians();
                let dir = Point::new(theta.cos(), theta.sin());
                self.line(Layer::Symbol, offset(center, dir, column), offset(center, dir, radius), stroke);
            }
            self.arrow(Layer::Symbol, center, offset(center, up, radius * 0.9), false, stroke);
            return;
        }

        let axis = if fp.depth >= fp.width { Axis::Vertical } else { Axis::Horizontal };
        let run = stair.tread_run_ft;
        for i in 1..treads {
            let k = i as f64 * run;
            match axis {
                Axis::Vertical => self.line(
                    Layer::Symbol,
                    Point::new(fp.x, fp.y + k),
                    Point::new(fp.max_x(), fp.y + k),
                    stroke,
                ),
                Axis::Horizontal => self.line(
                    Layer::Symbol,
                    Point::new(fp.x + k, fp.y),
                    Point::new(fp.x + k, fp.max_y()),
                    stroke,
                ),
            }
        }
        let c = fp.center();
        if stair.shape == StaircaseType::UShaped {
            match axis {
                Axis::Vertical => self.line(Layer::Symbol, Point::new(c.x, fp.y), Point::new(c.x, fp.max_y()), stroke),
                Axis::Horizontal => self.line(Layer::Symbol, Point::new(fp.x, c.y), Point::new(fp.max_x(), c.y), stroke),
            }
        }
        let reach = match axis {
            Axis::Vertical => fp.depth / 2.0 - run,
            Axis::Horizontal => fp.width / 2.0 - run,
        };
        let tail = offset(c, up, -reach);
        self.arrow(Layer::Symbol, tail, offset(c, up, reach), false, Stroke::new(Color::INK, 1.5));
        self.text(Layer::Annotation, offset(tail, up, -0.5), "UP".to_string(), 0.35, TextAnchor::Middle, 0.0);
    }

    fn dimensions(&mut self) {
        let stroke = Stroke::new(Color::DIMENSION, 0.75);
        let plan = self.plan;
        for room in plan.rooms() {
            let fp = room.footprint;

            // width, below the footprint
            let y = fp.y - DIMENSION_CLEARANCE_FT;
            for x in [fp.x, fp.max_x()] {
                self.line(
                    Layer::Dimension,
                    Point::new(x, fp.y - EXTENSION_GAP_FT),
                    Point::new(x, y - EXTENSION_OVERSHOOT_FT),
                    stroke,
                );
            }
            self.arrow(Layer::Dimension, Point::new(fp.x, y), Point::new(fp.max_x(), y), true, stroke);
            self.text(
                Layer::Dimension,
                Point::new(fp.center().x, y + 0.15),
                dimension_label(fp.width),
                0.35,
                TextAnchor::Middle,
                0.0,
            );

            // depth, left of the footprint
            let x = fp.x - DIMENSION_CLEARANCE_FT;
            for y in [fp.y, fp.max_y()] {
                self.line(
                    Layer::Dimension,
                    Point::new(fp.x - EXTENSION_GAP_FT, y),
                    Point::new(x - EXTENSION_OVERSHOOT_FT, y),
                    stroke,
                );
            }
            self.arrow(Layer::Dimension, Point::new(x, fp.y), Point::new(x, fp.max_y()), true, stroke);
            self.text(
                Layer::Dimension,
                Point::new(x - 0.15, fp.center().y),
                dimension_label(fp.depth),
                0.35,
                TextAnchor::Middle,
                -90.0,
            );
        }
    }

    fn labels(&mut self) {
        let plan = self.plan;
        for room in plan.rooms() {
            let center = room.footprint.center();
            self.text(
                Layer::Annotation,
                Point::new(center.x, center.y + 0.3),
                room.label.clone(),
                0.45,
                TextAnchor::Middle,
                0.0,
            );
            self.text(
                Layer::Annotation,
                Point::new(center.x, center.y - 0.4),
                SqFt(room.area()).to_string(),
                0.35,
                TextAnchor::Middle,
                0.0,
            );
        }
    }

    fn title_block(&mut self, facing: Direction) {
        let env = self.plan.envelope();
        let m = self.config.margin_ft;
        let top = -m;
        let frame = Rect::new(-m + 0.25, top - TITLE_BLOCK_FT + 0.25, env.width_ft + 2.0 * m - 0.5, TITLE_BLOCK_FT - 0.5);
        self.rect(Layer::Annotation, frame, None, Some(self.thin()));

        let x = -m + 0.75;
        let lines = [
            (self.plan.label(), 0.6),
            (format!("Total area: {}", SqFt(self.plan.metadata().total_area)), 0.4),
            (format!("Facing: {}", facing.display_name()), 0.4),
            (format!("Scale 1:{:.0}", self.config.scale), 0.4),
        ];
        for (i, (text, size)) in lines.into_iter().enumerate() {
            let y = top - 1.2 - i as f64 * 0.95;
            self.text(Layer::Annotation, Point::new(x, y), text, size, TextAnchor::Start, 0.0);
        }

        // compass rose: the needle shows true North in the plan frame
        let radius = 1.5;
        let center = Point::new(env.width_ft + m - 2.0, top - TITLE_BLOCK_FT / 2.0);
        let north = heading(Direction::North.to_plan(facing));
        let east = Point::new(north.y, -north.x);
        let stroke = self.thin();
        self.circle(Layer::Annotation, center, radius, stroke);
        self.line(
            Layer::Annotation,
            offset(center, east, -radius * 0.6),
            offset(center, east, radius * 0.6),
            stroke,
        );
        self.arrow(
            Layer::Annotation,
            offset(center, north, -radius * 0.8),
            offset(center, north, radius * 0.8),
            false,
            Stroke::new(Color::INK, 1.5),
        );
        self.text(
            Layer::Annotation,
            offset(center, north, radius + 0.45),
            "N".to_string(),
            0.45,
            TextAnchor::Middle,
            0.0,
        );
    }
}

/// Mullions in a window of this width
pub fn mullion_count(width_ft: f64) -> usize {
    ((width_ft / MULLION_SPACING_FT - EPSILON).ceil() as usize).saturating_sub(1)
}

/// Dimension text: feet to one decimal
pub fn dimension_label(feet: f64) -> String {
    Feet(feet).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::FloorRole;
    use crate::floor_plan::{FloorPlanParts, OpeningId, Room, RoomId, WallId};

    fn room(id: usize, kind: RoomKind, rect: Rect) -> Room {
        Room {
            id: RoomId(id),
            kind,
            label: kind.display_name().to_string(),
            floor: 0,
            footprint: rect,
            openings: Vec::new(),
        }
    }

    fn wall(id: usize, start: Point, end: Point, rooms: Vec<usize>) -> Wall {
        Wall {
            id: WallId(id),
            start,
            end,
            thickness_ft: 0.75,
            rooms: rooms.into_iter().map(RoomId).collect(),
        }
    }

    /// Living room and bathroom with a shared door and one window.
    fn parts() -> FloorPlanParts {
        FloorPlanParts {
            floor_index: 0,
            role: FloorRole::Ground,
            envelope: Envelope {
                width_ft: 20.0,
                depth_ft: 10.0,
            },
            buildable_area: 200.0,
            wall_thickness_ft: 0.75,
            entry: RoomId(0),
            rooms: vec![
                room(0, RoomKind::Living, Rect::new(0.0, 0.0, 14.0, 10.0)),
                room(1, RoomKind::Bathroom, Rect::new(14.0, 0.0, 6.0, 10.0)),
            ],
            walls: vec![
                wall(0, Point::new(0.0, 0.0), Point::new(14.0, 0.0), vec![0]),
                wall(1, Point::new(14.0, 0.0), Point::new(14.0, 10.0), vec![0, 1]),
            ],
            openings: vec![
                Opening {
                    id: OpeningId(0),
                    kind: OpeningKind::Door,
                    wall: WallId(1),
                    offset_ft: 2.0,
                    width_ft: 2.5,
                    swing: Some(DoorSwing::HingeStartRight),
                    main_entrance: false,
                },
                Opening {
                    id: OpeningId(1),
                    kind: OpeningKind::Window,
                    wall: WallId(0),
                    offset_ft: 5.0,
                    width_ft: 4.0,
                    swing: None,
                    main_entrance: false,
                },
            ],
            staircase: None,
        }
    }

    #[test]
    fn test_transform_flips_y() {
        let config = RenderConfig::default();
        let env = Envelope {
            width_ft: 20.0,
            depth_ft: 10.0,
        };
        let tx = Transform::new(env, &config);
        assert_eq!(tx.px_per_ft, 36.0);
        assert_eq!(tx.apply(Point::new(0.0, 0.0)), Point::new(72.0, 432.0));
        assert_eq!(tx.apply(Point::new(20.0, 10.0)), Point::new(792.0, 72.0));
    }

    #[test]
    fn test_canvas_size() {
        let plan = FloorPlan::new(parts()).unwrap();
        let drawing = render_floor(&plan, Direction::North, &RenderConfig::default()).unwrap();
        assert_eq!(drawing.width_px, 864);
        // (10 + 4 + 5) * 36
        assert_eq!(drawing.height_px, 684);
    }

    #[test]
    fn test_layers_are_ordered() {
        let plan = FloorPlan::new(parts()).unwrap();
        let drawing = render_floor(&plan, Direction::East, &RenderConfig::default()).unwrap();
        let layers: Vec<Layer> = drawing.commands.iter().map(|c| c.layer).collect();
        assert!(layers.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(layers.first(), Some(&Layer::Grid));
    }

    #[test]
    fn test_walls_are_cut_at_openings() {
        let plan = FloorPlan::new(parts()).unwrap();
        let drawing = render_floor(&plan, Direction::North, &RenderConfig::default()).unwrap();
        // each wall has one opening, so two pieces each
        assert_eq!(drawing.on_layer(Layer::Wall).count(), 4);
    }

    #[test]
    fn test_door_arc_is_quarter_turn() {
        let plan = FloorPlan::new(parts()).unwrap();
        let drawing = render_floor(&plan, Direction::North, &RenderConfig::default()).unwrap();
        let arcs: Vec<(f64, f64)> = drawing
            .on_layer(Layer::Symbol)
            .filter_map(|c| match c {
                DrawCommand::Arc { radius, sweep_deg, .. } if *sweep_deg != 360.0 => Some((*radius, *sweep_deg)),
                _ => None,
            })
            .collect();
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].0, 2.5 * 36.0);
        assert!((arcs[0].1.abs() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_labels() {
        let plan = FloorPlan::new(parts()).unwrap();
        let drawing = render_floor(&plan, Direction::North, &RenderConfig::default()).unwrap();
        let texts: Vec<&str> = drawing.texts().collect();
        assert!(texts.contains(&"14.0'"));
        assert!(texts.contains(&"10.0'"));
        assert!(texts.contains(&"Ground Floor"));
        assert!(texts.contains(&"Scale 1:50"));
        assert!(texts.contains(&"140 sq ft"));
        assert!(texts.contains(&"60 sq ft"));
        assert!(texts.contains(&"Total area: 200 sq ft"));
        assert_eq!(dimension_label(12.345), "12.3'");
    }

    #[test]
    fn test_toggles() {
        let plan = FloorPlan::new(parts()).unwrap();
        let config = RenderConfig {
            show_grid: false,
            show_dimensions: false,
            ..RenderConfig::default()
        };
        let drawing = render_floor(&plan, Direction::North, &config).unwrap();
        assert_eq!(drawing.on_layer(Layer::Grid).count(), 0);
        assert_eq!(drawing.on_layer(Layer::Dimension).count(), 0);
    }

    #[test]
    fn test_mullions() {
        assert_eq!(mullion_count(1.5), 0);
        assert_eq!(mullion_count(3.0), 1);
        assert_eq!(mullion_count(4.0), 2);
    }

    #[test]
    fn test_degenerate_wall_is_a_defect() {
        let mut parts = parts();
        parts.walls.push(wall(2, Point::new(0.0, 10.0), Point::new(0.0, 10.0), vec![0]));
        let plan = FloorPlan::new(parts).unwrap();
        let err = render_floor(&plan, Direction::North, &RenderConfig::default()).unwrap_err();
        assert!(err.is_defect());
        match err {
            PlanError::Render { entity, .. } => assert_eq!(entity, "W2"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_bad_config_is_rejected() {
        let plan = FloorPlan::new(parts()).unwrap();
        let config = RenderConfig {
            scale: 0.0,
            ..RenderConfig::default()
        };
        let err = render_floor(&plan, Direction::North, &config).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_compass_needle_follows_facing() {
        // East facing: true North is drawn pointing right
        assert_eq!(Direction::North.to_plan(Direction::East), Direction::East);
        let v = heading(Direction::East);
        assert!((v.x - 1.0).abs() < 1e-12 && v.y.abs() < 1e-12);
    }
}
