//! SVG backend. The only output that carries text, so it is the fully
//! annotated drawing.

use std::fmt::{self, Write};

use super::commands::{arrowhead, DrawCommand, Drawing, Stroke, TextAnchor};
use super::Backend;
use crate::errors::{PlanError, PlanResult};
use crate::geometry::Point;

/// Renders a [`Drawing`] to an SVG document string.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgBackend {
    pub font_family: String,
}

impl Default for SvgBackend {
    fn default() -> Self {
        SvgBackend {
            font_family: "Helvetica, Arial, sans-serif".to_string(),
        }
    }
}

impl Backend for SvgBackend {
    type Output = String;

    fn render(&self, drawing: &Drawing) -> PlanResult<String> {
        let mut svg = String::new();
        self.write_document(&mut svg, drawing)
            .map_err(|e| PlanError::serialization(format!("SVG formatting failed: {}", e)))?;
        Ok(svg)
    }
}

impl SvgBackend {
    fn write_document(&self, svg: &mut String, drawing: &Drawing) -> fmt::Result {
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = drawing.width_px,
            h = drawing.height_px
        )?;
        writeln!(svg, r#"  <rect width="100%" height="100%" fill="{}"/>"#, drawing.background.hex())?;
        for layered in &drawing.commands {
            self.write_command(svg, &layered.command)?;
        }
        writeln!(svg, "</svg>")
    }

    fn write_command(&self, svg: &mut String, command: &DrawCommand) -> fmt::Result {
        match command {
            DrawCommand::Wall { corners, color } => writeln!(
                svg,
                r#"  <polygon points="{}" fill="{}" stroke="none"/>"#,
                points_attr(corners),
                color.hex()
            ),
            DrawCommand::Line { from, to, stroke } => writeln!(
                svg,
                r#"  <line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" {}/>"#,
                from.x,
                from.y,
                to.x,
                to.y,
                stroke_attr(stroke)
            ),
            DrawCommand::Arc {
                center,
                radius,
                start_deg,
                sweep_deg,
                stroke,
            } => {
                if sweep_deg.abs() >= 360.0 {
                    return writeln!(
                        svg,
                        r#"  <circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="none" {}/>"#,
                        center.x,
                        center.y,
                        radius,
                        stroke_attr(stroke)
                    );
                }
                let at = |deg: f64| {
                    let t = deg.to_radians();
                    Point::new(center.x + radius * t.cos(), center.y + radius * t.sin())
                };
                let (start, end) = (at(*start_deg), at(start_deg + sweep_deg));
                // positive sweep runs toward +y, which is SVG's sweep-flag 1
                let large = u8::from(sweep_deg.abs() > 180.0);
                let sweep = u8::from(*sweep_deg > 0.0);
                writeln!(
                    svg,
                    r#"  <path d="M {:.2},{:.2} A {:.2},{:.2} 0 {} {} {:.2},{:.2}" fill="none" {}/>"#,
                    start.x,
                    start.y,
                    radius,
                    radius,
                    large,
                    sweep,
                    end.x,
                    end.y,
                    stroke_attr(stroke)
                )
            }
            DrawCommand::Polyline { points, closed, stroke } => {
                let tag = if *closed { "polygon" } else { "polyline" };
                writeln!(
                    svg,
                    r#"  <{} points="{}" fill="none" {}/>"#,
                    tag,
                    points_attr(points),
                    stroke_attr(stroke)
                )
            }
            DrawCommand::Rect {
                origin,
                width,
                height,
                fill,
                stroke,
            } => {
                let fill = fill.map_or_else(|| "none".to_string(), |c| c.hex());
                let stroke = stroke.as_ref().map_or_else(|| r#"stroke="none""#.to_string(), stroke_attr);
                writeln!(
                    svg,
                    r#"  <rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" {}/>"#,
                    origin.x, origin.y, width, height, fill, stroke
                )
            }
            DrawCommand::Text {
                at,
                text,
                size_px,
                anchor,
                rotation_deg,
                color,
            } => {
                let anchor = match anchor {
                    TextAnchor::Start => "start",
                    TextAnchor::Middle => "middle",
                    TextAnchor::End => "end",
                };
                let rotate = if *rotation_deg != 0.0 {
                    format!(r#" transform="rotate({:.1} {:.2} {:.2})""#, rotation_deg, at.x, at.y)
                } else {
                    String::new()
                };
                writeln!(
                    svg,
                    r#"  <text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}" text-anchor="{}" fill="{}"{}>{}</text>"#,
                    at.x,
                    at.y,
                    self.font_family,
                    size_px,
                    anchor,
                    color.hex(),
                    rotate,
                    escape_xml(text)
                )
            }
            DrawCommand::Arrow {
                from,
                to,
                head_px,
                both_ends,
                stroke,
            } => {
                writeln!(
                    svg,
                    r#"  <line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" {}/>"#,
                    from.x,
                    from.y,
                    to.x,
                    to.y,
                    stroke_attr(stroke)
                )?;
                let mut heads = vec![arrowhead(*from, *to, *head_px)];
                if *both_ends {
                    heads.push(arrowhead(*to, *from, *head_px));
                }
                for head in heads.into_iter().flatten() {
                    writeln!(
                        svg,
                        r#"  <polygon points="{}" fill="{}" stroke="none"/>"#,
                        points_attr(&head),
                        stroke.color.hex()
                    )?;
                }
                Ok(())
            }
        }
    }
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn stroke_attr(stroke: &Stroke) -> String {
    format!(r#"stroke="{}" stroke-width="{:.2}""#, stroke.color.hex(), stroke.width_px)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
