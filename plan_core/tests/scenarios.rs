//! End-to-end acceptance scenarios through the public API.

use approx::assert_relative_eq;
use plan_core::floor_plan::OpeningKind;
use plan_core::program::RoomKind;
use plan_core::{generate, BedroomConfig, BuildingType, DesignInput, Direction, PlanError, RuleTables};

fn rules() -> RuleTables {
    RuleTables::builtin().unwrap()
}

fn house(land: f64, facing: Direction, bedrooms: u8, floors: u32) -> DesignInput {
    DesignInput::new(
        land,
        facing,
        BuildingType::IndependentHouse,
        BedroomConfig::new(bedrooms),
        floors,
    )
}

#[test]
fn test_scenario_a_two_floor_house() {
    let design = generate(&house(1200.0, Direction::East, 3, 2), &rules()).unwrap();

    assert_eq!(design.floors.len(), 2);
    let built = design.summary.total_built_area;
    assert!((1850.0 * 0.95..=1850.0 * 1.05).contains(&built), "built area {}", built);
    let efficiency = design.summary.efficiency_ratio;
    assert!((0.75..=0.85).contains(&efficiency), "efficiency {}", efficiency);
    assert_relative_eq!(efficiency, design.summary.carpet_area / built, epsilon = 1e-9);

    let ground = &design.floors[0];
    assert_eq!(ground.rooms_of_kind(RoomKind::Living).count(), 1);
    assert_eq!(ground.rooms_of_kind(RoomKind::Kitchen).count(), 1);
    let bedrooms: usize = design
        .floors
        .iter()
        .map(|f| f.rooms_of_kind(RoomKind::MasterBedroom).count() + f.rooms_of_kind(RoomKind::Bedroom).count())
        .sum();
    assert_eq!(bedrooms, 3);

    // exactly one main entrance, a door on the ground floor
    let entrances: Vec<_> = design
        .floors
        .iter()
        .flat_map(|f| f.openings().iter().filter(|o| o.main_entrance).map(move |o| (f.floor_index(), o)))
        .collect();
    assert_eq!(entrances.len(), 1);
    assert_eq!(entrances[0].0, 0);
    assert_eq!(entrances[0].1.kind, OpeningKind::Door);
}

#[test]
fn test_scenario_a_staircase_stacks() {
    let design = generate(&house(1200.0, Direction::East, 3, 2), &rules()).unwrap();
    let stairs: Vec<_> = design.floors.iter().map(|f| f.staircase().unwrap().footprint).collect();
    assert_eq!(stairs[0], stairs[1]);
}

#[test]
fn test_scenario_b_too_small_for_program() {
    let err = generate(&house(600.0, Direction::North, 3, 1), &rules()).unwrap_err();
    assert_eq!(err.error_code(), "LAYOUT_INFEASIBLE");
    assert!(!err.is_defect());
    if let PlanError::LayoutInfeasible { floor, room_kind, .. } = &err {
        assert_eq!(*floor, 0);
        assert!(!room_kind.is_empty());
    }
}

#[test]
fn test_scenario_c_non_positive_land() {
    for land in [0.0, -5.0, -1200.0] {
        let err = generate(&house(land, Direction::East, 3, 2), &rules()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PLOT", "land {}", land);
    }
}

#[test]
fn test_scenario_d_unsupported_bedroom_count() {
    let err = generate(&house(5000.0, Direction::North, 10, 2), &rules()).unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_CONFIGURATION");
    assert!(err.to_string().contains("10"));
}

#[test]
fn test_generation_is_deterministic() {
    let rules = rules();
    let input = house(2000.0, Direction::SouthWest, 4, 2)
        .with_staircase(plan_core::StaircaseType::LShaped);
    let a = generate(&input, &rules).unwrap();
    let b = generate(&input, &rules).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.rules_version, rules.version);
}

#[test]
fn test_main_entrance_on_entry_exterior_wall() {
    let design = generate(&house(2000.0, Direction::North, 2, 3), &rules()).unwrap();
    let ground = &design.floors[0];
    let entrance = ground.openings().iter().find(|o| o.main_entrance).unwrap();
    let wall = ground.wall(entrance.wall).unwrap();
    assert!(wall.is_exterior());
    assert!(wall.bounds(ground.entry()));
    assert!(entrance.offset_ft >= 0.0);
    assert!(entrance.offset_ft + entrance.width_ft <= wall.length() + 1e-6);
}
