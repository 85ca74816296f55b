//! Rendering a generated design through both backends.

use std::fs;
use std::path::PathBuf;

use plan_core::render::{Backend, DrawCommand, Layer, RasterBackend, SvgBackend};
use plan_core::{
    generate, render_design, render_floor, BedroomConfig, BuildingType, Design, DesignInput, Direction, OutputFormat,
    RenderConfig, RuleTables,
};

fn scenario_a() -> Design {
    let rules = RuleTables::builtin().unwrap();
    let input = DesignInput::new(1200.0, Direction::East, BuildingType::IndependentHouse, BedroomConfig::new(3), 2);
    generate(&input, &rules).unwrap()
}

fn out_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("plan_core_it_render_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_ground_floor_svg_is_annotated() {
    let design = scenario_a();
    let ground = &design.floors[0];
    let drawing = render_floor(ground, design.input.facing, &RenderConfig::default()).unwrap();
    let svg = SvgBackend::default().render(&drawing).unwrap();

    assert!(svg.contains("Ground Floor"));
    assert!(svg.contains("ENTRY"));
    assert!(svg.contains("UP"));
    assert!(svg.contains("Facing: East"));
    assert!(svg.contains("Scale 1:50"));
    for room in ground.rooms() {
        assert!(svg.contains(&room.label), "missing label {}", room.label);
    }
    assert!(drawing.commands.iter().all(|c| c.command.is_finite()));
}

#[test]
fn test_every_floor_renders() {
    let design = scenario_a();
    for floor in &design.floors {
        let drawing = render_floor(floor, design.input.facing, &RenderConfig::default()).unwrap();
        let walls = drawing.on_layer(Layer::Wall).filter(|c| matches!(c, DrawCommand::Wall { .. })).count();
        assert!(walls >= floor.walls().len() / 2, "floor {} drew {} wall pieces", floor.floor_index(), walls);
        let image = RasterBackend.render(&drawing).unwrap();
        assert_eq!(image.dimensions(), (drawing.width_px, drawing.height_px));
    }
}

#[test]
fn test_toggles_remove_layers() {
    let design = scenario_a();
    let config = RenderConfig {
        show_grid: false,
        show_dimensions: false,
        ..RenderConfig::default()
    };
    let drawing = render_floor(&design.floors[0], design.input.facing, &config).unwrap();
    assert_eq!(drawing.on_layer(Layer::Grid).count(), 0);
    assert_eq!(drawing.on_layer(Layer::Dimension).count(), 0);

    let full = render_floor(&design.floors[0], design.input.facing, &RenderConfig::default()).unwrap();
    assert!(full.on_layer(Layer::Grid).count() > 0);
    assert!(full.on_layer(Layer::Dimension).count() > 0);
}

#[test]
fn test_rendering_is_pure() {
    let design = scenario_a();
    let config = RenderConfig::default();
    let a = render_floor(&design.floors[1], design.input.facing, &config).unwrap();
    let b = render_floor(&design.floors[1], design.input.facing, &config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_render_design_writes_each_floor() {
    let design = scenario_a();
    let dir = out_dir("design");
    let paths = render_design(&design, &RenderConfig::default(), &dir, &OutputFormat::ALL).unwrap();

    let names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "ground_floor_plan.svg",
            "ground_floor_plan.png",
            "first_floor_plan.svg",
            "first_floor_plan.png",
        ]
    );
    for path in &paths {
        assert!(fs::metadata(path).unwrap().len() > 0);
    }
    let _ = fs::remove_dir_all(&dir);
}
