//! Saving and reloading design documents.

use std::fs;
use std::path::PathBuf;

use plan_core::document::DesignDocument;
use plan_core::{
    generate, load_design, load_design_with_lock_check, save_design, BedroomConfig, BuildingType, DesignInput,
    Direction, FileLock, RuleTables, StaircaseType,
};

fn path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("plan_core_it_{}_{}.plan", name, std::process::id()))
}

fn document() -> DesignDocument {
    let rules = RuleTables::builtin().unwrap();
    let input = DesignInput::new(2000.0, Direction::SouthWest, BuildingType::IndependentHouse, BedroomConfig::new(4), 2)
        .with_staircase(StaircaseType::LShaped);
    DesignDocument::new("South-west corner plot", generate(&input, &rules).unwrap())
}

#[test]
fn test_reload_reproduces_geometry() {
    let path = path("geometry");
    let doc = document();
    save_design(&doc, &path).unwrap();

    let loaded = load_design(&path).unwrap();
    assert_eq!(loaded.meta, doc.meta);
    for (saved, original) in loaded.design.floors.iter().zip(&doc.design.floors) {
        assert_eq!(saved.rooms(), original.rooms());
        assert_eq!(saved.walls(), original.walls());
        assert_eq!(saved.openings(), original.openings());
        assert_eq!(saved.staircase(), original.staircase());
    }
    assert_eq!(loaded, doc);

    let _ = fs::remove_file(&path);
}

#[test]
fn test_locked_document_loads_read_only() {
    let path = path("locked");
    let doc = document();
    let lock = FileLock::acquire(&path, "first@studio.in").unwrap();
    save_design(&doc, &path).unwrap();

    let (loaded, holder) = load_design_with_lock_check(&path).unwrap();
    assert_eq!(loaded.meta.id, doc.meta.id);
    assert_eq!(holder.unwrap().user_id, "first@studio.in");
    assert!(FileLock::acquire(&path, "second@studio.in").unwrap_err().is_recoverable());

    drop(lock);
    let (_, holder) = load_design_with_lock_check(&path).unwrap();
    assert!(holder.is_none());

    let _ = fs::remove_file(&path);
}

#[test]
fn test_garbage_file_is_a_serialization_error() {
    let path = path("garbage");
    fs::write(&path, "{ not json").unwrap();
    assert_eq!(load_design(&path).unwrap_err().error_code(), "SERIALIZATION_ERROR");
    let _ = fs::remove_file(&path);
}
