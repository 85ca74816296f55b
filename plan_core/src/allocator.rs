//! # Zone Allocator
//!
//! Decides which rooms go on which floor, where on the compass each one would
//! like to sit, and how large it should be, without fixing any geometry yet.
//!
//! ## Floor roles
//!
//! Each floor index gets a [`FloorRole`]: the ground floor carries the public
//! and service rooms, upper floors carry bedrooms, and an upper floor left
//! without bedrooms becomes a service floor (study, store). The room list for
//! a role comes from the `[floors]` policy in the rule tables.
//!
//! ## Targets
//!
//! A floor's usable area (envelope area times `usable_ratio`, less the
//! staircase slot) is shared between its rooms by weight; each room's target
//! range runs from its minimum livable size up to that share, capped at the
//! standard's maximum.
//!
//! The output is ordered by room priority, with equal priorities kept in
//! program order.

use serde::{Deserialize, Serialize};

use crate::errors::{PlanError, PlanResult};
use crate::geometry::Direction;
use crate::program::{PlotSpec, ProgramSpec, RoomKind};
use crate::regulation::RegulationResult;
use crate::rules::{PrivacyClass, RuleTables};

/// Room-distribution policy for one floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloorRole {
    /// Entrance level: public and service rooms
    Ground,
    /// Bedroom level
    Upper,
    /// Upper level with no bedrooms assigned
    Service,
}

impl FloorRole {
    /// Role of floor `index` given how many bedrooms landed on it.
    pub fn for_floor(index: usize, bedrooms_on_floor: usize) -> Self {
        match (index, bedrooms_on_floor) {
            (0, _) => FloorRole::Ground,
            (_, 0) => FloorRole::Service,
            _ => FloorRole::Upper,
        }
    }

    /// Fixed (non-bedroom) rooms the policy adds to a floor of this role.
    fn fixed_rooms(self, index: usize, rules: &RuleTables) -> Vec<RoomKind> {
        let policy = &rules.floors;
        match self {
            FloorRole::Ground => policy.ground.clone(),
            FloorRole::Upper if index == 1 => {
                let mut rooms = policy.first_upper_extra.clone();
                rooms.extend(&policy.upper);
                rooms
            }
            FloorRole::Upper => policy.upper.clone(),
            FloorRole::Service => policy.service.clone(),
        }
    }

    /// Room used as the connectivity root of a floor with this role.
    pub fn entry_kind(self) -> RoomKind {
        match self {
            FloorRole::Ground => RoomKind::Living,
            FloorRole::Upper | FloorRole::Service => RoomKind::Staircase,
        }
    }
}

/// Target area range in square feet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaRange {
    pub min_sqft: f64,
    pub max_sqft: f64,
}

/// A required room with its placement preference but no geometry yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonedRoom {
    pub kind: RoomKind,
    /// Display label, numbered across the design ("Bedroom 2", "Bathroom 3")
    pub label: String,
    pub floor: usize,
    pub target: AreaRange,
    /// Preferred zone as an absolute compass direction
    pub zone: Direction,
    pub privacy: PrivacyClass,
    /// Index into the priority order (lower places first)
    pub priority: usize,
    pub half_depth: bool,
}

/// Zoned rooms for one floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorProgram {
    pub index: usize,
    pub role: FloorRole,
    pub rooms: Vec<ZonedRoom>,
}

/// Allocation result for the whole design, one entry per floor in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub floors: Vec<FloorProgram>,
}

impl Allocation {
    /// All zoned rooms in floor order
    pub fn rooms(&self) -> impl Iterator<Item = &ZonedRoom> {
        self.floors.iter().flat_map(|f| f.rooms.iter())
    }
}

/// Distribute the program over floors and assign zones and target areas.
///
/// Fails with `UnsupportedConfiguration` when the bedroom configuration or
/// the staircase shape has no rule-table entry.
pub fn allocate(
    program: &ProgramSpec,
    regulation: &RegulationResult,
    plot: &PlotSpec,
    rules: &RuleTables,
) -> PlanResult<Allocation> {
    if !rules.supports(program.bedrooms) {
        return Err(PlanError::unsupported(
            "bedroom_config",
            program.bedrooms.to_string(),
            format!(
                "No program table entry; supported: {}",
                rules
                    .programs
                    .supported
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ));
    }
    let stair_slot_width = match program.staircase {
        Some(shape) => Some(rules.stair(shape)?.slot_width_ft),
        None => None,
    };

    let floor_count = plot.floors as usize;
    let kinds_per_floor = distribute(program, floor_count, rules);

    let layout = &rules.layout;
    let envelope = regulation.envelope;
    let mut usable = envelope.area() * layout.usable_ratio;
    if let Some(width) = stair_slot_width {
        usable -= width * (envelope.depth_ft - layout.corridor_width_ft) / 2.0;
    }

    let mut labels = Labeler::default();
    let mut floors = Vec::with_capacity(floor_count);
    for (index, (role, kinds)) in kinds_per_floor.into_iter().enumerate() {
        let mut total_weight = 0.0;
        for kind in &kinds {
            total_weight += rules.room(*kind)?.weight;
        }

        let mut rooms = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let standard = rules.room(kind)?;
            let share = usable * standard.weight / total_weight;
            let max_sqft = standard.max_area_sqft.min(share.max(standard.min_area_sqft));
            rooms.push(ZonedRoom {
                kind,
                label: labels.next(kind),
                floor: index,
                target: AreaRange {
                    min_sqft: standard.min_area_sqft,
                    max_sqft,
                },
                zone: standard.zone.resolve(plot.facing),
                privacy: standard.privacy,
                priority: rules.priority_of(kind),
                half_depth: standard.half_depth,
            });
        }
        // stable: equal priorities keep program order
        rooms.sort_by_key(|r| r.priority);

        tracing::debug!(floor = index, role = ?role, rooms = rooms.len(), "Allocated floor program");
        floors.push(FloorProgram { index, role, rooms });
    }

    Ok(Allocation { floors })
}

/// Room kinds for each floor, in program order, with the floor's role.
fn distribute(program: &ProgramSpec, floor_count: usize, rules: &RuleTables) -> Vec<(FloorRole, Vec<RoomKind>)> {
    let policy = &rules.floors;
    let bedroom_count = program.bedrooms.bedrooms as usize;
    let baths_per_bedroom = policy.baths_per_bedroom as usize;

    let mut bedrooms = Vec::with_capacity(bedroom_count);
    bedrooms.push(RoomKind::MasterBedroom);
    bedrooms.extend(std::iter::repeat(RoomKind::Bedroom).take(bedroom_count.saturating_sub(1)));

    let mut ground: Vec<RoomKind> = FloorRole::Ground
        .fixed_rooms(0, rules)
        .into_iter()
        .filter(|kind| program.options.includes(*kind))
        .collect();

    if floor_count <= 1 {
        ground.extend(&bedrooms);
        ground.extend(std::iter::repeat(RoomKind::Bathroom).take(bedroom_count * baths_per_bedroom));
        return vec![(FloorRole::Ground, ground)];
    }

    let guests = if bedroom_count >= 2 {
        (policy.ground_guest_bedrooms as usize).min(bedroom_count - 1)
    } else {
        0
    };
    for _ in 0..guests {
        if let Some(kind) = bedrooms.pop() {
            ground.push(kind);
        }
    }
    ground.push(RoomKind::Bathroom);

    let uppers = floor_count - 1;
    let mut per_upper: Vec<Vec<RoomKind>> = vec![Vec::new(); uppers];
    for (i, kind) in bedrooms.into_iter().enumerate() {
        per_upper[i % uppers].push(kind);
    }

    let mut floors = vec![(FloorRole::Ground, ground)];
    for (offset, mut kinds) in per_upper.into_iter().enumerate() {
        let index = offset + 1;
        let role = FloorRole::for_floor(index, kinds.len());
        if role == FloorRole::Upper {
            let baths = kinds.len() * baths_per_bedroom;
            kinds.extend(std::iter::repeat(RoomKind::Bathroom).take(baths));
        }
        kinds.extend(role.fixed_rooms(index, rules));
        floors.push((role, kinds));
    }
    floors
}

/// Sequential labels: secondary bedrooms and bathrooms are numbered across
/// the design.
#[derive(Default)]
struct Labeler {
    bedrooms: usize,
    bathrooms: usize,
}

impl Labeler {
    fn next(&mut self, kind: RoomKind) -> String {
        match kind {
            RoomKind::Bedroom => {
                // the master bedroom is bedroom 1
                self.bedrooms += 1;
                format!("Bedroom {}", self.bedrooms + 1)
            }
            RoomKind::Bathroom => {
                self.bathrooms += 1;
                format!("Bathroom {}", self.bathrooms)
            }
            _ => kind.display_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction;
    use crate::program::{BedroomConfig, BuildingType, DesignInput};
    use crate::regulation;

    fn allocate_for(land: f64, facing: Direction, bedrooms: u8, floors: u32) -> PlanResult<Allocation> {
        let rules = RuleTables::builtin().unwrap();
        let input = DesignInput::new(land, facing, BuildingType::IndependentHouse, BedroomConfig::new(bedrooms), floors);
        let (plot, program) = input.split().unwrap();
        let reg = regulation::calculate(&plot, &rules).unwrap();
        allocate(&program, &reg, &plot, &rules)
    }

    fn kinds(floor: &FloorProgram) -> Vec<RoomKind> {
        floor.rooms.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_two_floor_distribution() {
        let allocation = allocate_for(1200.0, Direction::East, 3, 2).unwrap();
        assert_eq!(allocation.floors.len(), 2);

        let ground = &allocation.floors[0];
        assert_eq!(ground.role, FloorRole::Ground);
        assert_eq!(
            kinds(ground),
            vec![
                RoomKind::Living,
                RoomKind::Kitchen,
                RoomKind::Bedroom,
                RoomKind::Dining,
                RoomKind::Bathroom,
                RoomKind::Pooja,
                RoomKind::Utility,
            ]
        );

        let first = &allocation.floors[1];
        assert_eq!(first.role, FloorRole::Upper);
        assert_eq!(
            kinds(first),
            vec![
                RoomKind::MasterBedroom,
                RoomKind::Bedroom,
                RoomKind::Lounge,
                RoomKind::Bathroom,
                RoomKind::Bathroom,
                RoomKind::Balcony,
            ]
        );
    }

    #[test]
    fn test_single_floor_keeps_everything_downstairs() {
        let allocation = allocate_for(2000.0, Direction::North, 2, 1).unwrap();
        let ground = &allocation.floors[0];
        let bathrooms = ground.rooms.iter().filter(|r| r.kind == RoomKind::Bathroom).count();
        assert_eq!(bathrooms, 2);
        assert!(ground.rooms.iter().any(|r| r.kind == RoomKind::MasterBedroom));
    }

    #[test]
    fn test_service_floor_when_bedrooms_run_out() {
        let allocation = allocate_for(2000.0, Direction::North, 2, 3).unwrap();
        // 2 bedrooms: one stays down, the master goes to floor 1, floor 2 has none
        assert_eq!(allocation.floors[1].role, FloorRole::Upper);
        assert_eq!(allocation.floors[2].role, FloorRole::Service);
        assert!(allocation.floors[2].rooms.iter().any(|r| r.kind == RoomKind::Study));
    }

    #[test]
    fn test_zones_follow_compass_table() {
        let allocation = allocate_for(1200.0, Direction::East, 3, 2).unwrap();
        let living = allocation.rooms().find(|r| r.kind == RoomKind::Living).unwrap();
        let kitchen = allocation.rooms().find(|r| r.kind == RoomKind::Kitchen).unwrap();
        assert_eq!(living.zone, Direction::East);
        assert_eq!(kitchen.zone, Direction::SouthEast);
    }

    #[test]
    fn test_targets_within_standards() {
        let rules = RuleTables::builtin().unwrap();
        let allocation = allocate_for(1200.0, Direction::East, 3, 2).unwrap();
        for room in allocation.rooms() {
            let standard = rules.room(room.kind).unwrap();
            assert!(room.target.min_sqft <= room.target.max_sqft);
            assert!(room.target.max_sqft <= standard.max_area_sqft);
            assert_eq!(room.target.min_sqft, standard.min_area_sqft);
        }
    }

    #[test]
    fn test_labels_are_numbered_across_floors() {
        let allocation = allocate_for(1200.0, Direction::East, 3, 2).unwrap();
        let labels: Vec<&str> = allocation.rooms().map(|r| r.label.as_str()).collect();
        assert!(labels.contains(&"Master Bedroom"));
        assert!(labels.contains(&"Bedroom 2"));
        assert!(labels.contains(&"Bedroom 3"));
        assert!(labels.contains(&"Bathroom 3"));
    }

    #[test]
    fn test_unsupported_bedroom_count() {
        let err = allocate_for(6000.0, Direction::East, 10, 2).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_CONFIGURATION");
    }
}
