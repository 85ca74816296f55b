//! # Layout Packer
//!
//! Turns one floor's zoned room list into concrete, non-overlapping
//! rectangles inside the envelope, then derives walls, doors and windows and
//! hands everything to [`FloorPlan::new`] for the construction checks.
//!
//! ## Model
//!
//! ```text
//!   y = D  +-----------+-----------+-----------+
//!          |    NW     |     N     |    NE     |   back band
//!          +-----------+-----------+-----------+
//!          |               corridor            |   (W and E fall through)
//!          +-----------+-----------+-----------+
//!          |    SW     |     S     |    SE     |   front band
//!   y = 0  +-----------+-----------+-----------+   road side
//! ```
//!
//! Zones are expressed in the plan frame, where the road-facing side is
//! plan-South. Each room searches its zone, then the neighbors in compass
//! order, then the opposite direction, first within a single cell, then
//! pooling adjacent cells, then the whole band. A room that finds nowhere to
//! hold its minimum width fails the floor with `LayoutInfeasible`; nothing
//! is retried with relaxed bounds.
//!
//! The staircase slot is placed once per design by [`place_staircase`] and
//! reserved at the same position on every floor.

mod grid;
mod openings;
mod walls;

pub use grid::{cell_of, Band, BandGrid, SearchPass};

use serde::{Deserialize, Serialize};

use crate::allocator::{FloorProgram, FloorRole};
use crate::errors::{PlanError, PlanResult};
use crate::floor_plan::{FloorPlan, FloorPlanParts, Room, RoomId, Staircase};
use crate::geometry::{Direction, Rect};
use crate::program::{RoomKind, StaircaseType};
use crate::regulation::{Envelope, RegulationResult};
use crate::rules::{RuleTables, StairRules};
use crate::units::EPSILON;

use grid::ShelfPlanner;

/// Staircase reservation shared by every floor of a design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StairSlot {
    pub shape: StaircaseType,
    pub band: Band,
    pub column: usize,
    /// Plan-frame corner the slot sits in
    pub corner: Direction,
    pub footprint: Rect,
}

impl StairSlot {
    /// Flight geometry for the stair room `room`.
    pub fn staircase(&self, room: RoomId, rules: &StairRules) -> Staircase {
        let risers = (rules.floor_height_ft / rules.max_riser_ft - EPSILON).ceil().max(2.0) as u32;
        let treads = risers - 1;
        let length = self.footprint.width.max(self.footprint.depth);
        Staircase {
            room,
            footprint: self.footprint,
            shape: self.shape,
            risers,
            treads,
            riser_height_ft: rules.floor_height_ft / risers as f64,
            tread_run_ft: length / treads as f64,
            // flights climb from the corridor toward the outside wall
            ascent: match self.band {
                Band::Front => Direction::South,
                Band::Back => Direction::North,
            },
        }
    }
}

/// Reserve the staircase slot: the first corner cell along the staircase
/// zone's search order whose column is wide enough, flush with the plot side.
pub fn place_staircase(
    envelope: Envelope,
    facing: Direction,
    shape: StaircaseType,
    rules: &RuleTables,
) -> PlanResult<StairSlot> {
    let width = rules.stair(shape)?.slot_width_ft;
    let grid = BandGrid::new(envelope, &rules.layout);
    let zone = rules.staircase.zone.resolve(facing);

    let mut attempted = Vec::new();
    for candidate in zone.to_plan(facing).search_order() {
        if !candidate.is_corner() {
            continue;
        }
        let Some((band, column)) = cell_of(candidate) else {
            continue;
        };
        attempted.push(candidate.from_plan(facing).code().to_string());
        if grid.column_width(column) + EPSILON < width {
            continue;
        }
        let x = if column == 0 { 0.0 } else { grid.width - width };
        let slot = StairSlot {
            shape,
            band,
            column,
            corner: candidate,
            footprint: Rect::new(x, grid.y(band), width, grid.depth(band)),
        };
        tracing::debug!(shape = %shape, corner = %candidate, x, y = slot.footprint.y, "Staircase slot reserved");
        return Ok(slot);
    }

    Err(PlanError::layout_infeasible(
        0,
        RoomKind::Staircase.display_name(),
        zone.code(),
        attempted,
        format!("no corner cell is {:.1} ft wide", width),
    ))
}

/// Pack one floor.
///
/// `facing` rotates each room's compass zone into the plan frame; `stair` is
/// the design's reserved slot (absent for single-floor designs).
pub fn pack_floor(
    program: &FloorProgram,
    regulation: &RegulationResult,
    facing: Direction,
    stair: Option<&StairSlot>,
    rules: &RuleTables,
) -> PlanResult<FloorPlan> {
    let layout = &rules.layout;
    let floor = program.index;
    let envelope = regulation.envelope;
    let grid = BandGrid::new(envelope, layout);

    let mut planner = ShelfPlanner::new(&grid, layout);
    if let Some(slot) = stair {
        planner.reserve_stair(slot);
    }

    for (index, room) in program.rooms.iter().enumerate() {
        if let Err(tried) = planner.place(index, room, room.zone.to_plan(facing)) {
            let attempted: Vec<String> = tried
                .iter()
                .map(|(pass, cell)| format!("{}:{}", pass.name(), cell.from_plan(facing).code()))
                .collect();
            tracing::debug!(floor, room = %room.label, zone = %room.zone, "No cell holds room");
            return Err(PlanError::layout_infeasible(
                floor,
                room.kind.display_name(),
                room.zone.code(),
                attempted,
                format!("no cell combination holds its {:.0} sq ft minimum", room.target.min_sqft),
            ));
        }
    }

    let placed = planner.fill(&program.rooms, stair).map_err(|open| {
        let room = &program.rooms[open.room];
        tracing::debug!(floor, band = open.band.name(), "Band cannot be closed");
        PlanError::layout_infeasible(
            floor,
            room.kind.display_name(),
            room.zone.code(),
            vec![format!("fill:{}", open.band.name())],
            format!(
                "{} band leaves a gap narrower than a {:.0} ft passage",
                open.band.name(),
                layout.min_passage_ft
            ),
        )
    })?;

    let mut rooms: Vec<Room> = placed
        .into_iter()
        .enumerate()
        .map(|(i, placed)| Room {
            id: RoomId(i),
            kind: placed.kind,
            label: placed.label,
            floor,
            footprint: placed.rect,
            openings: Vec::new(),
        })
        .collect();

    let walls = walls::derive_walls(&rooms, floor, layout.grid_ft, layout.wall_thickness_ft)?;

    let entry_kind = program.role.entry_kind();
    let entry = find_room(&rooms, entry_kind).ok_or_else(|| {
        PlanError::invariant(floor, "entry", format!("floor has no {} to enter through", entry_kind))
    })?;

    let mut openings = openings::connect_rooms(&rooms, &walls, entry, floor, &rules.openings)?;
    if program.role == FloorRole::Ground {
        match openings::main_entrance(&rooms, &walls, entry, openings.len(), &rules.openings) {
            Some(main) => openings.push(main),
            None => tracing::warn!(floor, "No exterior wall can hold the main entrance"),
        }
    }
    let windows = openings::windows(&rooms, &walls, &openings, openings.len(), rules)?;
    openings.extend(windows);
    openings::attach(&mut rooms, &walls, &openings);

    let staircase = match stair {
        Some(slot) => {
            let room = find_room(&rooms, RoomKind::Staircase)
                .ok_or_else(|| PlanError::invariant(floor, "staircase", "reserved slot was not placed"))?;
            Some(slot.staircase(room, &rules.staircase))
        }
        None => None,
    };

    tracing::debug!(
        floor,
        role = ?program.role,
        rooms = rooms.len(),
        walls = walls.len(),
        openings = openings.len(),
        "Packed floor"
    );

    FloorPlan::new(FloorPlanParts {
        floor_index: floor,
        role: program.role,
        envelope,
        buildable_area: regulation.per_floor_area,
        wall_thickness_ft: layout.wall_thickness_ft,
        entry,
        rooms,
        walls,
        openings,
        staircase,
    })
}

fn find_room(rooms: &[Room], kind: RoomKind) -> Option<RoomId> {
    rooms.iter().find(|r| r.kind == kind).map(|r| r.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{allocate, Allocation};
    use crate::floor_plan::OpeningKind;
    use crate::program::{BedroomConfig, BuildingType, DesignInput};
    use crate::regulation;

    struct Setup {
        rules: RuleTables,
        regulation: RegulationResult,
        allocation: Allocation,
        facing: Direction,
        stair: Option<StairSlot>,
    }

    fn setup(land: f64, facing: Direction, bedrooms: u8, floors: u32, shape: StaircaseType) -> Setup {
        let rules = RuleTables::builtin().unwrap();
        let input = DesignInput::new(land, facing, BuildingType::IndependentHouse, BedroomConfig::new(bedrooms), floors)
            .with_staircase(shape);
        let (plot, program) = input.split().unwrap();
        let regulation = regulation::calculate(&plot, &rules).unwrap();
        let allocation = allocate(&program, &regulation, &plot, &rules).unwrap();
        let stair = program
            .staircase
            .map(|s| place_staircase(regulation.envelope, facing, s, &rules).unwrap());
        Setup {
            rules,
            regulation,
            allocation,
            facing,
            stair,
        }
    }

    impl Setup {
        fn pack(&self, floor: usize) -> PlanResult<FloorPlan> {
            pack_floor(
                &self.allocation.floors[floor],
                &self.regulation,
                self.facing,
                self.stair.as_ref(),
                &self.rules,
            )
        }
    }

    #[test]
    fn test_stair_slot_east_facing() {
        let s = setup(1200.0, Direction::East, 3, 2, StaircaseType::Straight);
        let slot = s.stair.unwrap();
        // South is plan-West for an east-facing plot; the first corner is plan-NW
        assert_eq!(slot.corner, Direction::NorthWest);
        assert_eq!(slot.band, Band::Back);
        assert_eq!(slot.footprint, Rect::new(0.0, 16.5, 3.5, 13.0));
    }

    #[test]
    fn test_stair_geometry() {
        let s = setup(1200.0, Direction::East, 3, 2, StaircaseType::Straight);
        let stair = s.stair.unwrap().staircase(RoomId(0), &s.rules.staircase);
        assert_eq!(stair.risers, 17);
        assert_eq!(stair.treads, 16);
        assert!((stair.tread_run_ft - 13.0 / 16.0).abs() < 1e-9);
        assert!(stair.riser_height_ft <= s.rules.staircase.max_riser_ft);
    }

    #[test]
    fn test_stair_too_wide_for_corner() {
        let rules = RuleTables::builtin().unwrap();
        let envelope = Envelope {
            width_ft: 12.0,
            depth_ft: 20.0,
        };
        let err = place_staircase(envelope, Direction::North, StaircaseType::UShaped, &rules).unwrap_err();
        match err {
            PlanError::LayoutInfeasible { attempted_cells, .. } => assert_eq!(attempted_cells.len(), 4),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_two_floor_design_packs() {
        let s = setup(1200.0, Direction::East, 3, 2, StaircaseType::Straight);
        for floor in 0..2 {
            let plan = s.pack(floor).unwrap();
            let area: f64 = plan.rooms().iter().map(Room::area).sum();
            assert!((area - s.regulation.envelope.area()).abs() < 1e-6);
            assert!(area <= s.regulation.per_floor_area);
            assert_eq!(plan.reachable_from_entry().len(), plan.rooms().len());
            for room in plan.rooms() {
                assert!(Rect::new(0.0, 0.0, 30.5, 29.5).contains(&room.footprint));
            }
        }
    }

    #[test]
    fn test_stair_identical_on_every_floor() {
        let s = setup(1200.0, Direction::East, 3, 2, StaircaseType::Straight);
        let ground = s.pack(0).unwrap();
        let first = s.pack(1).unwrap();
        assert_eq!(
            ground.staircase().unwrap().footprint,
            first.staircase().unwrap().footprint
        );
        let entry = first.room(first.entry()).unwrap();
        assert_eq!(entry.kind, RoomKind::Staircase);
    }

    #[test]
    fn test_ground_floor_has_main_entrance_on_road_side() {
        let s = setup(1200.0, Direction::East, 3, 2, StaircaseType::Straight);
        let plan = s.pack(0).unwrap();
        let main: Vec<_> = plan.openings().iter().filter(|o| o.main_entrance).collect();
        assert_eq!(main.len(), 1);
        let wall = plan.wall(main[0].wall).unwrap();
        assert!(wall.is_exterior());
        assert_eq!(wall.start.y, 0.0);
        assert_eq!(plan.room(wall.rooms[0]).unwrap().kind, RoomKind::Living);
        assert!(plan.metadata().compliance.main_entrance);

        let upper = s.pack(1).unwrap();
        assert!(upper.openings().iter().all(|o| !o.main_entrance));
    }

    #[test]
    fn test_windows_only_on_exterior_non_circulation_walls() {
        let s = setup(1200.0, Direction::East, 3, 2, StaircaseType::Straight);
        let plan = s.pack(1).unwrap();
        let windows: Vec<_> = plan.openings().iter().filter(|o| o.kind == OpeningKind::Window).collect();
        assert!(!windows.is_empty());
        for window in windows {
            let wall = plan.wall(window.wall).unwrap();
            assert!(wall.is_exterior());
            assert!(wall.length() > 4.0);
            assert!(!plan.room(wall.rooms[0]).unwrap().kind.is_circulation());
        }
    }

    #[test]
    fn test_small_plot_is_infeasible() {
        let s = setup(600.0, Direction::North, 3, 1, StaircaseType::Straight);
        let err = s.pack(0).unwrap_err();
        match err {
            PlanError::LayoutInfeasible {
                room_kind,
                attempted_cells,
                ..
            } => {
                assert_eq!(room_kind, "Living Room");
                assert!(attempted_cells.iter().any(|c| c.starts_with("band:")));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_packing_is_deterministic() {
        let s = setup(2000.0, Direction::SouthWest, 4, 2, StaircaseType::LShaped);
        assert_eq!(s.pack(1).unwrap(), s.pack(1).unwrap());
    }
}
