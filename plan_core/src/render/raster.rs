//! Raster backend on `image` + `imageproc`.
//!
//! Geometry only: no font ships with the crate, so text commands are
//! skipped. The SVG output carries the labels.

use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_polygon_mut,
};
use imageproc::point::Point as PxPoint;
use imageproc::rect::Rect as PxRect;

use super::commands::{arc_points, arrowhead, Color, DrawCommand, Drawing, Stroke};
use super::Backend;
use crate::errors::{PlanError, PlanResult};
use crate::geometry::Point;

/// Arc flattening step
const ARC_STEP_DEG: f64 = 5.0;

/// Renders a [`Drawing`] to an RGB image.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RasterBackend;

impl Backend for RasterBackend {
    type Output = RgbImage;

    fn render(&self, drawing: &Drawing) -> PlanResult<RgbImage> {
        if drawing.width_px == 0 || drawing.height_px == 0 {
            return Err(PlanError::render(0, "canvas", "empty canvas"));
        }
        let mut image = RgbImage::from_pixel(drawing.width_px, drawing.height_px, rgb(drawing.background));
        for layered in &drawing.commands {
            paint(&mut image, &layered.command);
        }
        Ok(image)
    }
}

fn rgb(color: Color) -> Rgb<u8> {
    Rgb([color.r, color.g, color.b])
}

fn px(p: Point) -> PxPoint<i32> {
    PxPoint::new(p.x.round() as i32, p.y.round() as i32)
}

fn paint(image: &mut RgbImage, command: &DrawCommand) {
    match command {
        DrawCommand::Wall { corners, color } => fill_polygon(image, corners, rgb(*color)),
        DrawCommand::Line { from, to, stroke } => line(image, *from, *to, stroke),
        DrawCommand::Arc {
            center,
            radius,
            start_deg,
            sweep_deg,
            stroke,
        } => {
            let sweep = sweep_deg.clamp(-360.0, 360.0);
            let points = arc_points(*center, *radius, *start_deg, sweep, ARC_STEP_DEG);
            for pair in points.windows(2) {
                line(image, pair[0], pair[1], stroke);
            }
        }
        DrawCommand::Polyline { points, closed, stroke } => {
            for pair in points.windows(2) {
                line(image, pair[0], pair[1], stroke);
            }
            if *closed {
                if let (Some(first), Some(last)) = (points.first(), points.last()) {
                    line(image, *last, *first, stroke);
                }
            }
        }
        DrawCommand::Rect {
            origin,
            width,
            height,
            fill,
            stroke,
        } => {
            let rect = PxRect::at(origin.x.round() as i32, origin.y.round() as i32)
                .of_size(width.round().max(1.0) as u32, height.round().max(1.0) as u32);
            if let Some(fill) = fill {
                draw_filled_rect_mut(image, rect, rgb(*fill));
            }
            if let Some(stroke) = stroke {
                draw_hollow_rect_mut(image, rect, rgb(stroke.color));
            }
        }
        DrawCommand::Text { .. } => {}
        DrawCommand::Arrow {
            from,
            to,
            head_px,
            both_ends,
            stroke,
        } => {
            line(image, *from, *to, stroke);
            let mut heads = vec![arrowhead(*from, *to, *head_px)];
            if *both_ends {
                heads.push(arrowhead(*to, *from, *head_px));
            }
            for head in heads.into_iter().flatten() {
                fill_polygon(image, &head, rgb(stroke.color));
            }
        }
    }
}

/// Hairlines go through the line rasterizer; wider strokes become quads.
fn line(image: &mut RgbImage, a: Point, b: Point, stroke: &Stroke) {
    let color = rgb(stroke.color);
    if stroke.width_px <= 1.0 {
        draw_line_segment_mut(image, (a.x as f32, a.y as f32), (b.x as f32, b.y as f32), color);
        return;
    }
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length = (dx * dx + dy * dy).sqrt();
    if length < 1e-6 {
        return;
    }
    let half = stroke.width_px / 2.0;
    let (nx, ny) = (-dy / length * half, dx / length * half);
    let quad = [
        Point::new(a.x + nx, a.y + ny),
        Point::new(b.x + nx, b.y + ny),
        Point::new(b.x - nx, b.y - ny),
        Point::new(a.x - nx, a.y - ny),
    ];
    fill_polygon(image, &quad, color);
}

/// `draw_polygon_mut` rejects a closing point equal to the first, and a
/// polygon that collapses to a segment after rounding.
fn fill_polygon(image: &mut RgbImage, points: &[Point], color: Rgb<u8>) {
    let mut poly: Vec<PxPoint<i32>> = Vec::with_capacity(points.len());
    for p in points.iter().map(|p| px(*p)) {
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    match poly.len() {
        0 => {}
        1 => {
            let p = poly[0];
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < image.width() && (p.y as u32) < image.height() {
                image.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
        2 => draw_line_segment_mut(
            image,
            (poly[0].x as f32, poly[0].y as f32),
            (poly[1].x as f32, poly[1].y as f32),
            color,
        ),
        _ => draw_polygon_mut(image, &poly, color),
    }
}
