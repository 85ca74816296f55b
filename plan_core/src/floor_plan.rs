//! # Floor Plan Model
//!
//! The immutable geometric result for one building floor: rooms, the walls
//! between them, door and window openings, and the staircase. The packer
//! builds one, the renderer and exporters only read it.
//!
//! ## Structure
//!
//! ```text
//! FloorPlan
//! ├── rooms: Vec<Room>          (RoomId = position)
//! ├── walls: Vec<Wall>          (each bounded by 1 room = exterior, or 2 = shared)
//! ├── openings: Vec<Opening>    (door/window hosted on a wall)
//! ├── staircase: Option<Staircase>
//! └── metadata: FloorMetadata   (areas, compliance flags)
//! ```
//!
//! ## Construction checks
//!
//! [`FloorPlan::new`] runs every consistency check once and refuses to build
//! a plan that violates one; nothing is repaired. Deserialization goes through
//! the same path, so a persisted plan that was edited into an invalid state
//! fails to load instead of reaching the renderer.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::allocator::FloorRole;
use crate::errors::{PlanError, PlanResult};
use crate::geometry::{Axis, Direction, Point, Rect};
use crate::program::{RoomKind, StaircaseType};
use crate::regulation::Envelope;
use crate::units::EPSILON;

// ============================================================================
// Identifiers
// ============================================================================

/// Index of a room within its floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub usize);

/// Index of a wall within its floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WallId(pub usize);

/// Index of an opening within its floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpeningId(pub usize);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

impl fmt::Display for WallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}", self.0)
    }
}

impl fmt::Display for OpeningId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O{}", self.0)
    }
}

// ============================================================================
// Elements
// ============================================================================

/// A placed room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    pub label: String,
    pub floor: usize,
    /// Footprint in plan-local feet, measured to wall centerlines
    pub footprint: Rect,
    /// Openings on this room's boundary walls
    pub openings: Vec<OpeningId>,
}

impl Room {
    pub fn area(&self) -> f64 {
        self.footprint.area()
    }
}

/// A wall centerline segment. Bounded by one room (exterior) or two (shared).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub id: WallId,
    /// Start point; `start` precedes `end` along the wall's axis
    pub start: Point,
    pub end: Point,
    pub thickness_ft: f64,
    pub rooms: Vec<RoomId>,
}

impl Wall {
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn axis(&self) -> Axis {
        if (self.start.y - self.end.y).abs() < EPSILON {
            Axis::Horizontal
        } else {
            Axis::Vertical
        }
    }

    pub fn is_exterior(&self) -> bool {
        self.rooms.len() == 1
    }

    pub fn bounds(&self, room: RoomId) -> bool {
        self.rooms.contains(&room)
    }

    /// The room on the other side of a shared wall
    pub fn other_side(&self, room: RoomId) -> Option<RoomId> {
        match self.rooms.as_slice() {
            [a, b] if *a == room => Some(*b),
            [a, b] if *b == room => Some(*a),
            _ => None,
        }
    }

    /// Point at `offset` feet from the start along the wall
    pub fn point_at(&self, offset: f64) -> Point {
        let length = self.length();
        if length <= 0.0 {
            return self.start;
        }
        let t = offset / length;
        Point::new(
            self.start.x + (self.end.x - self.start.x) * t,
            self.start.y + (self.end.y - self.start.y) * t,
        )
    }
}

/// Kind of opening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpeningKind {
    Door,
    Window,
}

/// Door swing quadrant: which jamb carries the hinge (the one at the start or
/// end of the opening along the wall) and which side of the wall the leaf
/// opens into (left or right looking from the wall start toward its end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorSwing {
    HingeStartLeft,
    HingeStartRight,
    HingeEndLeft,
    HingeEndRight,
}

impl DoorSwing {
    pub fn hinge_at_start(self) -> bool {
        matches!(self, DoorSwing::HingeStartLeft | DoorSwing::HingeStartRight)
    }

    pub fn opens_left(self) -> bool {
        matches!(self, DoorSwing::HingeStartLeft | DoorSwing::HingeEndLeft)
    }

    pub fn from_parts(hinge_at_start: bool, opens_left: bool) -> Self {
        match (hinge_at_start, opens_left) {
            (true, true) => DoorSwing::HingeStartLeft,
            (true, false) => DoorSwing::HingeStartRight,
            (false, true) => DoorSwing::HingeEndLeft,
            (false, false) => DoorSwing::HingeEndRight,
        }
    }
}

/// A door or window on a wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    pub id: OpeningId,
    pub kind: OpeningKind,
    pub wall: WallId,
    /// Distance from the wall start to the near jamb
    pub offset_ft: f64,
    pub width_ft: f64,
    /// Doors only
    pub swing: Option<DoorSwing>,
    /// The building's main entrance
    #[serde(default)]
    pub main_entrance: bool,
}

impl Opening {
    pub fn is_door(&self) -> bool {
        self.kind == OpeningKind::Door
    }
}

/// Stair geometry, identical in position on every floor of a design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staircase {
    pub room: RoomId,
    pub footprint: Rect,
    pub shape: StaircaseType,
    pub risers: u32,
    pub treads: u32,
    pub riser_height_ft: f64,
    pub tread_run_ft: f64,
    /// Plan-frame direction of travel going up
    pub ascent: Direction,
}

/// Compliance summary carried with every plan.
///
/// The first four restate checks that [`FloorPlan::new`] refuses to build
/// without, so on a constructed plan they are always set; they exist so
/// exported JSON records what was verified. `main_entrance` and `daylit` are
/// advisory and computed from the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceFlags {
    pub within_buildable: bool,
    pub no_overlaps: bool,
    pub openings_within_walls: bool,
    pub connected: bool,
    /// A ground floor has a main-entrance door; other floors need none
    pub main_entrance: bool,
    /// Every non-circulation room has at least one window
    pub daylit: bool,
}

/// Floor-level metadata derived at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorMetadata {
    pub total_area: f64,
    pub carpet_area: f64,
    pub compliance: ComplianceFlags,
}

// ============================================================================
// Floor plan
// ============================================================================

/// Everything a floor plan is built from. This is also the persisted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorPlanParts {
    pub floor_index: usize,
    pub role: FloorRole,
    pub envelope: Envelope,
    /// Area this floor may occupy
    pub buildable_area: f64,
    pub wall_thickness_ft: f64,
    /// Connectivity root
    pub entry: RoomId,
    pub rooms: Vec<Room>,
    pub walls: Vec<Wall>,
    pub openings: Vec<Opening>,
    pub staircase: Option<Staircase>,
}

/// Immutable, checked floor plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FloorPlanParts")]
pub struct FloorPlan {
    floor_index: usize,
    role: FloorRole,
    envelope: Envelope,
    buildable_area: f64,
    wall_thickness_ft: f64,
    entry: RoomId,
    rooms: Vec<Room>,
    walls: Vec<Wall>,
    openings: Vec<Opening>,
    staircase: Option<Staircase>,
    metadata: FloorMetadata,
}

impl TryFrom<FloorPlanParts> for FloorPlan {
    type Error = PlanError;

    fn try_from(parts: FloorPlanParts) -> Result<Self, Self::Error> {
        FloorPlan::new(parts)
    }
}

impl FloorPlan {
    /// Build a plan, running every consistency check. The first violation
    /// is returned as `InvariantViolation`.
    pub fn new(parts: FloorPlanParts) -> PlanResult<Self> {
        let floor = parts.floor_index;
        check_ids(&parts)?;
        check_staircase(&parts)?;
        check_dimensions(&parts)?;
        check_overlaps(&parts)?;

        let total_area: f64 = parts.rooms.iter().map(Room::area).sum();
        if total_area > parts.buildable_area + EPSILON {
            return Err(fatal(
                floor,
                "buildable_area",
                format!("rooms cover {:.2} sq ft, allowance is {:.2}", total_area, parts.buildable_area),
            ));
        }

        check_openings(&parts)?;

        let reachable = reachable_rooms(&parts.rooms, &parts.walls, &parts.openings, parts.entry);
        if reachable.len() != parts.rooms.len() {
            let missing: Vec<String> = parts
                .rooms
                .iter()
                .filter(|r| !reachable.contains(&r.id))
                .map(|r| format!("{} {}", r.id, r.label))
                .collect();
            return Err(fatal(
                floor,
                "connectivity",
                format!("not reachable from {}: {}", parts.entry, missing.join(", ")),
            ));
        }

        let t = parts.wall_thickness_ft;
        let carpet_area = parts
            .rooms
            .iter()
            .filter(|r| r.kind != RoomKind::Staircase)
            .map(|r| (r.footprint.width - t).max(0.0) * (r.footprint.depth - t).max(0.0))
            .sum();

        let metadata = FloorMetadata {
            total_area,
            carpet_area,
            compliance: ComplianceFlags {
                within_buildable: true,
                no_overlaps: true,
                openings_within_walls: true,
                connected: true,
                main_entrance: parts.role != FloorRole::Ground || parts.openings.iter().any(|o| o.main_entrance),
                daylit: parts
                    .rooms
                    .iter()
                    .filter(|r| !r.kind.is_circulation())
                    .all(|r| has_window(&parts, r.id)),
            },
        };

        Ok(FloorPlan {
            floor_index: parts.floor_index,
            role: parts.role,
            envelope: parts.envelope,
            buildable_area: parts.buildable_area,
            wall_thickness_ft: parts.wall_thickness_ft,
            entry: parts.entry,
            rooms: parts.rooms,
            walls: parts.walls,
            openings: parts.openings,
            staircase: parts.staircase,
            metadata,
        })
    }

    pub fn floor_index(&self) -> usize {
        self.floor_index
    }

    pub fn role(&self) -> FloorRole {
        self.role
    }

    /// "Ground Floor", "First Floor", ...
    pub fn label(&self) -> String {
        floor_label(self.floor_index)
    }

    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    pub fn buildable_area(&self) -> f64 {
        self.buildable_area
    }

    pub fn wall_thickness_ft(&self) -> f64 {
        self.wall_thickness_ft
    }

    pub fn entry(&self) -> RoomId {
        self.entry
    }

    pub fn metadata(&self) -> &FloorMetadata {
        &self.metadata
    }

    pub fn staircase(&self) -> Option<&Staircase> {
        self.staircase.as_ref()
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.0)
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.get(id.0)
    }

    pub fn openings(&self) -> &[Opening] {
        &self.openings
    }

    pub fn opening(&self, id: OpeningId) -> Option<&Opening> {
        self.openings.get(id.0)
    }

    /// Walls bounding a room
    pub fn walls_of(&self, room: RoomId) -> impl Iterator<Item = &Wall> + '_ {
        self.walls.iter().filter(move |w| w.bounds(room))
    }

    /// Openings hosted on a wall
    pub fn openings_on(&self, wall: WallId) -> impl Iterator<Item = &Opening> + '_ {
        self.openings.iter().filter(move |o| o.wall == wall)
    }

    /// Openings on a room's boundary
    pub fn openings_of(&self, room: RoomId) -> impl Iterator<Item = &Opening> + '_ {
        self.room(room)
            .into_iter()
            .flat_map(|r| r.openings.iter())
            .filter_map(move |id| self.opening(*id))
    }

    /// Rooms one door away
    pub fn neighbors_through_doors(&self, room: RoomId) -> Vec<RoomId> {
        door_neighbors(&self.walls, &self.openings, room)
    }

    /// Rooms reachable from the entry through doors, in breadth-first order
    pub fn reachable_from_entry(&self) -> Vec<RoomId> {
        bfs_order(&self.rooms, &self.walls, &self.openings, self.entry)
    }

    /// Iterate rooms of one kind
    pub fn rooms_of_kind(&self, kind: RoomKind) -> impl Iterator<Item = &Room> + '_ {
        self.rooms.iter().filter(move |r| r.kind == kind)
    }
}

/// Conventional name of a floor by index
pub fn floor_label(index: usize) -> String {
    const ORDINALS: [&str; 5] = ["Ground", "First", "Second", "Third", "Fourth"];
    match ORDINALS.get(index) {
        Some(name) => format!("{} Floor", name),
        None => format!("Floor {}", index),
    }
}

// ============================================================================
// Checks
// ============================================================================

fn fatal(floor: usize, check: &str, detail: String) -> PlanError {
    tracing::error!(floor, check, %detail, "Floor plan invariant violated");
    PlanError::invariant(floor, check, detail)
}

fn check_ids(parts: &FloorPlanParts) -> PlanResult<()> {
    let floor = parts.floor_index;
    for (i, room) in parts.rooms.iter().enumerate() {
        if room.id.0 != i {
            return Err(fatal(floor, "ids", format!("room at position {} carries id {}", i, room.id)));
        }
    }
    for (i, wall) in parts.walls.iter().enumerate() {
        if wall.id.0 != i {
            return Err(fatal(floor, "ids", format!("wall at position {} carries id {}", i, wall.id)));
        }
        if wall.rooms.is_empty() || wall.rooms.len() > 2 {
            return Err(fatal(
                floor,
                "wall_sides",
                format!("{} is bounded by {} rooms", wall.id, wall.rooms.len()),
            ));
        }
        if let Some(missing) = wall.rooms.iter().find(|r| r.0 >= parts.rooms.len()) {
            return Err(fatal(floor, "ids", format!("{} references unknown room {}", wall.id, missing)));
        }
    }
    for (i, opening) in parts.openings.iter().enumerate() {
        if opening.id.0 != i {
            return Err(fatal(floor, "ids", format!("opening at position {} carries id {}", i, opening.id)));
        }
    }
    if parts.entry.0 >= parts.rooms.len() {
        return Err(fatal(floor, "ids", format!("entry {} is not a room", parts.entry)));
    }
    Ok(())
}

/// The staircase must name the stair room and share its footprint.
fn check_staircase(parts: &FloorPlanParts) -> PlanResult<()> {
    let Some(stair) = &parts.staircase else {
        return Ok(());
    };
    let floor = parts.floor_index;
    let room = parts
        .rooms
        .get(stair.room.0)
        .ok_or_else(|| fatal(floor, "staircase", format!("staircase references unknown room {}", stair.room)))?;
    if room.kind != RoomKind::Staircase {
        return Err(fatal(
            floor,
            "staircase",
            format!("staircase references {} {}, a {}", room.id, room.label, room.kind),
        ));
    }
    if room.footprint != stair.footprint {
        return Err(fatal(
            floor,
            "staircase",
            format!("staircase footprint differs from room {}", room.id),
        ));
    }
    Ok(())
}

fn has_window(parts: &FloorPlanParts, room: RoomId) -> bool {
    parts.openings.iter().any(|o| {
        o.kind == OpeningKind::Window && parts.walls.get(o.wall.0).is_some_and(|w| w.bounds(room))
    })
}

fn check_dimensions(parts: &FloorPlanParts) -> PlanResult<()> {
    for room in &parts.rooms {
        let fp = room.footprint;
        if !fp.is_finite() || fp.width <= 0.0 || fp.depth <= 0.0 {
            return Err(fatal(
                parts.floor_index,
                "room_dimensions",
                format!("{} {} is {:.2} x {:.2}", room.id, room.label, fp.width, fp.depth),
            ));
        }
    }
    Ok(())
}

fn check_overlaps(parts: &FloorPlanParts) -> PlanResult<()> {
    for (i, a) in parts.rooms.iter().enumerate() {
        for b in &parts.rooms[i + 1..] {
            if a.footprint.overlaps(&b.footprint) {
                return Err(fatal(
                    parts.floor_index,
                    "overlap",
                    format!("{} {} overlaps {} {}", a.id, a.label, b.id, b.label),
                ));
            }
        }
    }
    Ok(())
}

fn check_openings(parts: &FloorPlanParts) -> PlanResult<()> {
    for opening in &parts.openings {
        let wall = parts.walls.get(opening.wall.0).ok_or_else(|| {
            fatal(
                parts.floor_index,
                "opening_host",
                format!("{} is hosted on unknown wall {}", opening.id, opening.wall),
            )
        })?;
        let length = wall.length();
        let fits = opening.offset_ft >= 0.0
            && opening.width_ft > 0.0
            && opening.offset_ft + opening.width_ft <= length + EPSILON;
        if !fits {
            return Err(fatal(
                parts.floor_index,
                "opening_bounds",
                format!(
                    "{} spans {:.2}..{:.2} on {} of length {:.2}",
                    opening.id,
                    opening.offset_ft,
                    opening.offset_ft + opening.width_ft,
                    wall.id,
                    length
                ),
            ));
        }
    }
    Ok(())
}

fn door_neighbors(walls: &[Wall], openings: &[Opening], room: RoomId) -> Vec<RoomId> {
    let mut neighbors = BTreeSet::new();
    for opening in openings.iter().filter(|o| o.is_door()) {
        if let Some(other) = walls.get(opening.wall.0).and_then(|w| w.other_side(room)) {
            neighbors.insert(other);
        }
    }
    neighbors.into_iter().collect()
}

fn bfs_order(rooms: &[Room], walls: &[Wall], openings: &[Opening], entry: RoomId) -> Vec<RoomId> {
    let mut seen = vec![false; rooms.len()];
    let mut order = Vec::with_capacity(rooms.len());
    let mut queue = VecDeque::new();
    if entry.0 < rooms.len() {
        seen[entry.0] = true;
        queue.push_back(entry);
    }
    while let Some(room) = queue.pop_front() {
        order.push(room);
        for next in door_neighbors(walls, openings, room) {
            if !seen[next.0] {
                seen[next.0] = true;
                queue.push_back(next);
            }
        }
    }
    order
}

fn reachable_rooms(rooms: &[Room], walls: &[Wall], openings: &[Opening], entry: RoomId) -> BTreeSet<RoomId> {
    bfs_order(rooms, walls, openings, entry).into_iter().collect()
}
