//! Door and window placement.
//!
//! Doors form a spanning tree over the rooms, grown greedily from the entry
//! room through shared walls, preferring to hang new rooms off circulation
//! space. The main entrance and windows go on exterior walls afterwards.

use crate::errors::{PlanError, PlanResult};
use crate::floor_plan::{DoorSwing, Opening, OpeningId, OpeningKind, Room, RoomId, Wall};
use crate::geometry::Axis;
use crate::program::RoomKind;
use crate::rules::{OpeningRules, RuleTables};
use crate::units::EPSILON;

/// Width of a door on a wall of `length` between rooms of the given kinds,
/// or `None` if the wall cannot hold one.
fn door_width(a: RoomKind, b: RoomKind, length: f64, rules: &OpeningRules) -> Option<f64> {
    if length + EPSILON < rules.min_door_wall_ft {
        return None;
    }
    let nominal = if a == RoomKind::Bathroom || b == RoomKind::Bathroom {
        rules.bathroom_door_width_ft
    } else {
        rules.door_width_ft
    };
    let width = nominal.min(length - 2.0 * rules.door_end_clearance_ft);
    (width + EPSILON >= rules.min_door_width_ft).then_some(width)
}

/// Swing that opens the leaf into `room`, hinged at the wall start.
fn swing_into(wall: &Wall, room: &Room) -> DoorSwing {
    let center = room.footprint.center();
    // left of a wall running start -> end: +y for horizontal, -x for vertical
    let opens_left = match wall.axis() {
        Axis::Horizontal => center.y > wall.start.y,
        Axis::Vertical => center.x < wall.start.x,
    };
    DoorSwing::from_parts(true, opens_left)
}

fn centered(id: usize, kind: OpeningKind, wall: &Wall, width: f64) -> Opening {
    Opening {
        id: OpeningId(id),
        kind,
        wall: wall.id,
        offset_ft: (wall.length() - width) / 2.0,
        width_ft: width,
        swing: None,
        main_entrance: false,
    }
}

/// Connect every room to the entry with one door per tree edge.
///
/// Each step picks, over all shared walls between a connected and an
/// unconnected room, the smallest of (connected side is circulation first,
/// new room id, wall id).
pub fn connect_rooms(
    rooms: &[Room],
    walls: &[Wall],
    entry: RoomId,
    floor: usize,
    rules: &OpeningRules,
) -> PlanResult<Vec<Opening>> {
    let mut connected = vec![false; rooms.len()];
    connected[entry.0] = true;
    let mut remaining = rooms.len().saturating_sub(1);
    let mut doors = Vec::with_capacity(remaining);

    while remaining > 0 {
        let mut best: Option<((u8, usize, usize), RoomId, &Wall, f64)> = None;
        for wall in walls {
            let [a, b] = wall.rooms.as_slice() else {
                continue;
            };
            if connected[a.0] == connected[b.0] {
                continue;
            }
            let (old, new) = if connected[a.0] { (*a, *b) } else { (*b, *a) };
            let Some(width) = door_width(rooms[old.0].kind, rooms[new.0].kind, wall.length(), rules) else {
                continue;
            };
            let rank = (u8::from(!rooms[old.0].kind.is_circulation()), new.0, wall.id.0);
            if best.as_ref().map_or(true, |current| rank < current.0) {
                best = Some((rank, new, wall, width));
            }
        }

        let Some((_, new, wall, width)) = best else {
            let stranded = rooms
                .iter()
                .find(|r| !connected[r.id.0])
                .map_or(RoomKind::Corridor, |r| r.kind);
            let unreached: Vec<String> = rooms
                .iter()
                .filter(|r| !connected[r.id.0])
                .map(|r| format!("{} {}", r.id, r.label))
                .collect();
            return Err(PlanError::layout_infeasible(
                floor,
                stranded.display_name(),
                "-",
                unreached,
                "no shared wall long enough for a door reaches these rooms",
            ));
        };

        let mut door = centered(doors.len(), OpeningKind::Door, wall, width);
        door.swing = Some(swing_into(wall, &rooms[new.0]));
        doors.push(door);
        connected[new.0] = true;
        remaining -= 1;
    }
    Ok(doors)
}

/// Main entrance on the entry room's longest road-side exterior wall
/// (plan y = 0), falling back to its longest exterior wall.
pub fn main_entrance(rooms: &[Room], walls: &[Wall], entry: RoomId, next_id: usize, rules: &OpeningRules) -> Option<Opening> {
    let exterior = || walls.iter().filter(move |w| w.is_exterior() && w.bounds(entry));
    let longest = |a: &&Wall, b: &&Wall| a.length().total_cmp(&b.length()).then(b.id.cmp(&a.id));
    let host = exterior()
        .filter(|w| w.axis() == Axis::Horizontal && w.start.y.abs() < EPSILON)
        .max_by(longest)
        .or_else(|| exterior().max_by(longest))?;

    let width = rules
        .main_door_width_ft
        .min(host.length() - 2.0 * rules.door_end_clearance_ft);
    if width + EPSILON < rules.min_door_width_ft {
        tracing::warn!(room = %entry, wall = %host.id, "Entry wall too short for a main door");
        return None;
    }
    let mut door = centered(next_id, OpeningKind::Door, host, width);
    door.swing = Some(swing_into(host, &rooms[entry.0]));
    door.main_entrance = true;
    Some(door)
}

/// Windows on every exterior wall longer than the minimum whose room is not
/// circulation, skipping any that would overlap an existing opening.
pub fn windows(
    rooms: &[Room],
    walls: &[Wall],
    existing: &[Opening],
    next_id: usize,
    rules: &RuleTables,
) -> PlanResult<Vec<Opening>> {
    let openings = &rules.openings;
    let mut result = Vec::new();
    for wall in walls.iter().filter(|w| w.is_exterior()) {
        let room = &rooms[wall.rooms[0].0];
        if room.kind.is_circulation() || wall.length() <= openings.min_window_wall_ft {
            continue;
        }
        let nominal = rules.room(room.kind)?.window_ft;
        let width = nominal.min(wall.length() - 2.0 * openings.window_end_clearance_ft);
        let window = centered(next_id + result.len(), OpeningKind::Window, wall, width);
        let clashes = existing.iter().any(|o| {
            o.wall == wall.id
                && o.offset_ft < window.offset_ft + window.width_ft - EPSILON
                && window.offset_ft < o.offset_ft + o.width_ft - EPSILON
        });
        if !clashes {
            result.push(window);
        }
    }
    Ok(result)
}

/// Record each opening on the rooms its wall bounds.
pub fn attach(rooms: &mut [Room], walls: &[Wall], openings: &[Opening]) {
    for opening in openings {
        if let Some(wall) = walls.get(opening.wall.0) {
            for room in &wall.rooms {
                rooms[room.0].openings.push(opening.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floor_plan::WallId;
    use crate::geometry::{Point, Rect};

    fn rules() -> RuleTables {
        RuleTables::builtin().unwrap()
    }

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

    fn wall(id: usize, start: (f64, f64), end: (f64, f64), rooms: &[usize]) -> Wall {
        Wall {
            id: WallId(id),
            start: Point::new(start.0, start.1),
            end: Point::new(end.0, end.1),
            thickness_ft: 0.75,
            rooms: rooms.iter().map(|r| RoomId(*r)).collect(),
        }
    }

    #[test]
    fn test_door_widths() {
        let r = rules().openings;
        assert_eq!(door_width(RoomKind::Bedroom, RoomKind::Corridor, 10.0, &r), Some(3.0));
        assert_eq!(door_width(RoomKind::Bathroom, RoomKind::Bedroom, 10.0, &r), Some(2.5));
        assert_eq!(door_width(RoomKind::Bedroom, RoomKind::Corridor, 3.0, &r), Some(2.0));
        assert_eq!(door_width(RoomKind::Bedroom, RoomKind::Corridor, 2.5, &r), None);
    }

    #[test]
    fn test_tree_prefers_circulation() {
        // living | corridor | bedroom, bedroom also touches living on top
        let rooms = vec![
            room(0, RoomKind::Living, Rect::new(0.0, 0.0, 10.0, 10.0)),
            room(1, RoomKind::Corridor, Rect::new(10.0, 0.0, 4.0, 10.0)),
            room(2, RoomKind::Bedroom, Rect::new(14.0, 0.0, 10.0, 10.0)),
            room(3, RoomKind::Kitchen, Rect::new(0.0, 10.0, 24.0, 8.0)),
        ];
        let walls = vec![
            wall(0, (0.0, 10.0), (10.0, 10.0), &[0, 3]),
            wall(1, (10.0, 10.0), (14.0, 10.0), &[1, 3]),
            wall(2, (14.0, 10.0), (24.0, 10.0), &[2, 3]),
            wall(3, (10.0, 0.0), (10.0, 10.0), &[0, 1]),
            wall(4, (14.0, 0.0), (14.0, 10.0), &[1, 2]),
        ];
        let doors = connect_rooms(&rooms, &walls, RoomId(0), 0, &rules().openings).unwrap();
        assert_eq!(doors.len(), 3);
        // corridor first (lowest id reachable), then rooms hung off the corridor
        assert_eq!(doors[0].wall, WallId(3));
        assert_eq!(doors[1].wall, WallId(4));
        assert_eq!(doors[2].wall, WallId(1));
        for door in &doors {
            let w = &walls[door.wall.0];
            assert!(door.offset_ft >= 0.0 && door.offset_ft + door.width_ft <= w.length());
        }
    }

    #[test]
    fn test_swing_opens_into_new_room() {
        let rooms = vec![
            room(0, RoomKind::Corridor, Rect::new(0.0, 0.0, 10.0, 4.0)),
            room(1, RoomKind::Bedroom, Rect::new(0.0, 4.0, 10.0, 10.0)),
        ];
        let walls = vec![wall(0, (0.0, 4.0), (10.0, 4.0), &[0, 1])];
        let doors = connect_rooms(&rooms, &walls, RoomId(0), 0, &rules().openings).unwrap();
        assert_eq!(doors[0].swing, Some(DoorSwing::HingeStartLeft));
        assert_eq!(doors[0].offset_ft, 3.5);
    }

    #[test]
    fn test_unreachable_room_is_infeasible() {
        let rooms = vec![
            room(0, RoomKind::Living, Rect::new(0.0, 0.0, 10.0, 10.0)),
            room(1, RoomKind::Store, Rect::new(10.0, 0.0, 2.0, 2.0)),
        ];
        let walls = vec![wall(0, (10.0, 0.0), (10.0, 2.0), &[0, 1])];
        let err = connect_rooms(&rooms, &walls, RoomId(0), 1, &rules().openings).unwrap_err();
        assert_eq!(err.error_code(), "LAYOUT_INFEASIBLE");
    }

    #[test]
    fn test_windows_skip_main_door_and_circulation() {
        let rules = rules();
        let rooms = vec![
            room(0, RoomKind::Living, Rect::new(0.0, 0.0, 12.0, 10.0)),
            room(1, RoomKind::Corridor, Rect::new(0.0, 10.0, 12.0, 4.0)),
        ];
        let walls = vec![
            wall(0, (0.0, 0.0), (12.0, 0.0), &[0]),
            wall(1, (0.0, 14.0), (12.0, 14.0), &[1]),
            wall(2, (0.0, 0.0), (0.0, 10.0), &[0]),
            wall(3, (0.0, 10.0), (12.0, 10.0), &[0, 1]),
        ];
        let main = main_entrance(&rooms, &walls, RoomId(0), 0, &rules.openings).unwrap();
        assert_eq!(main.wall, WallId(0));
        assert!(main.main_entrance);
        assert_eq!(main.width_ft, 3.5);

        let windows = windows(&rooms, &walls, std::slice::from_ref(&main), 1, &rules).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].wall, WallId(2));
        assert_eq!(windows[0].width_ft, 4.0);
        assert_eq!(windows[0].offset_ft, 3.0);
    }
}
