//! Wall derivation.
//!
//! Every room edge lies on a horizontal or vertical grid line. Each line is
//! cut at every edge endpoint on it, each piece records which rooms it
//! bounds, and neighboring pieces with the same owners are merged back into
//! one wall. Coordinates are handled in whole grid ticks so that coincident
//! edges compare exactly.

use std::collections::BTreeMap;

use crate::errors::{PlanError, PlanResult};
use crate::floor_plan::{Room, RoomId, Wall, WallId};
use crate::geometry::{Axis, Point};

/// Edge of one room on a line: start tick, end tick, owner
type Edge = (i64, i64, RoomId);

fn ticks(value: f64, grid: f64) -> i64 {
    (value / grid).round() as i64
}

/// Derive the deduplicated wall set for a floor's rooms.
pub fn derive_walls(rooms: &[Room], floor: usize, grid: f64, thickness: f64) -> PlanResult<Vec<Wall>> {
    let mut horizontal: BTreeMap<i64, Vec<Edge>> = BTreeMap::new();
    let mut vertical: BTreeMap<i64, Vec<Edge>> = BTreeMap::new();
    for room in rooms {
        let fp = room.footprint;
        let (x0, x1) = (ticks(fp.x, grid), ticks(fp.max_x(), grid));
        let (y0, y1) = (ticks(fp.y, grid), ticks(fp.max_y(), grid));
        horizontal.entry(y0).or_default().push((x0, x1, room.id));
        horizontal.entry(y1).or_default().push((x0, x1, room.id));
        vertical.entry(x0).or_default().push((y0, y1, room.id));
        vertical.entry(x1).or_default().push((y0, y1, room.id));
    }

    let mut walls = Vec::new();
    for (axis, lines) in [(Axis::Horizontal, &horizontal), (Axis::Vertical, &vertical)] {
        for (line, edges) in lines {
            for (a, b, owners) in split_line(edges) {
                if owners.len() > 2 {
                    let ids: Vec<String> = owners.iter().map(|id| id.to_string()).collect();
                    tracing::error!(floor, rooms = %ids.join(","), "Wall piece bounded by more than two rooms");
                    return Err(PlanError::invariant(
                        floor,
                        "wall_sides",
                        format!("segment {}..{} on line {} is bounded by {}", a, b, line, ids.join(", ")),
                    ));
                }
                let c = *line as f64 * grid;
                let (start, end) = match axis {
                    Axis::Horizontal => (Point::new(a as f64 * grid, c), Point::new(b as f64 * grid, c)),
                    Axis::Vertical => (Point::new(c, a as f64 * grid), Point::new(c, b as f64 * grid)),
                };
                walls.push(Wall {
                    id: WallId(walls.len()),
                    start,
                    end,
                    thickness_ft: thickness,
                    rooms: owners,
                });
            }
        }
    }
    Ok(walls)
}

/// Cut one line at every breakpoint and merge runs with equal owners.
fn split_line(edges: &[Edge]) -> Vec<(i64, i64, Vec<RoomId>)> {
    let mut points: Vec<i64> = edges.iter().flat_map(|e| [e.0, e.1]).collect();
    points.sort_unstable();
    points.dedup();

    let mut merged: Vec<(i64, i64, Vec<RoomId>)> = Vec::new();
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let mut owners: Vec<RoomId> = edges
            .iter()
            .filter(|e| e.0 <= a && b <= e.1)
            .map(|e| e.2)
            .collect();
        owners.sort();
        owners.dedup();
        if owners.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.1 == a && last.2 == owners => last.1 = b,
            _ => merged.push((a, b, owners)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::program::RoomKind;

    fn room(id: usize, rect: Rect) -> Room {
        Room {
            id: RoomId(id),
            kind: RoomKind::Bedroom,
            label: format!("Room {}", id),
            floor: 0,
            footprint: rect,
            openings: Vec::new(),
        }
    }

    #[test]
    fn test_shared_edge_becomes_one_wall() {
        let rooms = vec![
            room(0, Rect::new(0.0, 0.0, 10.0, 10.0)),
            room(1, Rect::new(10.0, 0.0, 5.0, 10.0)),
        ];
        let walls = derive_walls(&rooms, 0, 0.5, 0.75).unwrap();
        let shared: Vec<&Wall> = walls.iter().filter(|w| w.rooms.len() == 2).collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].start, Point::new(10.0, 0.0));
        assert_eq!(shared[0].end, Point::new(10.0, 10.0));
        // 2 bottom, 2 top, left, right, shared
        assert_eq!(walls.len(), 7);
        assert_eq!(walls.iter().filter(|w| w.is_exterior()).count(), 6);
    }

    #[test]
    fn test_t_junction_splits_line() {
        // one long room below two short ones
        let rooms = vec![
            room(0, Rect::new(0.0, 0.0, 20.0, 10.0)),
            room(1, Rect::new(0.0, 10.0, 8.0, 6.0)),
            room(2, Rect::new(8.0, 10.0, 12.0, 6.0)),
        ];
        let walls = derive_walls(&rooms, 0, 0.5, 0.75).unwrap();
        let on_line: Vec<&Wall> = walls
            .iter()
            .filter(|w| w.axis() == Axis::Horizontal && w.start.y == 10.0)
            .collect();
        assert_eq!(on_line.len(), 2);
        assert_eq!(on_line[0].rooms, vec![RoomId(0), RoomId(1)]);
        assert_eq!(on_line[1].rooms, vec![RoomId(0), RoomId(2)]);
        assert_eq!(on_line[1].length(), 12.0);
    }

    #[test]
    fn test_overlapping_edges_are_rejected() {
        let rooms = vec![
            room(0, Rect::new(0.0, 0.0, 10.0, 10.0)),
            room(1, Rect::new(0.0, 0.0, 10.0, 5.0)),
            room(2, Rect::new(0.0, -5.0, 10.0, 5.0)),
        ];
        let err = derive_walls(&rooms, 2, 0.5, 0.75).unwrap_err();
        assert!(err.is_defect());
    }
}
