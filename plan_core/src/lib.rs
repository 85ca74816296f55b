//! # plan_core - Rule-Driven Floor Plan Engine
//!
//! `plan_core` turns a handful of plot and program choices (land size,
//! facing, building type, bedroom count, floors) into checked floor plans
//! and scaled blueprint drawings. Every input and output is
//! JSON-serializable.
//!
//! ## Pipeline
//!
//! ```text
//! DesignInput
//!   └─> regulation ──> allocator ──> packer (per floor) ──> FloorPlan
//!                                                              │
//!                          estimate, analysis <────────────────┤
//!                          render (SVG / PNG) <────────────────┘
//! ```
//!
//! ## Design Philosophy
//!
//! - **Explicit rules**: regulation, priorities and sizes live in
//!   [`RuleTables`], loaded once and passed by reference into every stage
//! - **Checked output**: a [`FloorPlan`] cannot exist unless its rooms fit,
//!   do not overlap, and connect to the entry
//! - **Rich errors**: [`PlanError`] names the stage, floor and room involved
//!
//! ## Quick Start
//!
//! ```rust
//! use plan_core::{generate, BedroomConfig, BuildingType, DesignInput, Direction, RuleTables};
//!
//! let rules = RuleTables::builtin().unwrap();
//! let input = DesignInput::new(
//!     1200.0,
//!     Direction::East,
//!     BuildingType::IndependentHouse,
//!     BedroomConfig::new(3),
//!     2,
//! );
//! let design = generate(&input, &rules).unwrap();
//!
//! for floor in &design.floors {
//!     println!("{}: {} rooms", floor.label(), floor.rooms().len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`units`], [`geometry`] - feet/area helpers, directions and rectangles
//! - [`program`] - design input and its split into plot and program
//! - [`rules`] - versioned rule tables (embedded TOML or a file)
//! - [`regulation`] - setbacks, coverage and the buildable envelope
//! - [`allocator`] - per-floor room lists with zones and area ranges
//! - [`packer`] - staircase placement and grid packing into a [`FloorPlan`]
//! - [`floor_plan`] - the checked floor plan model
//! - [`design`] - the end-to-end pipeline
//! - [`estimate`], [`analysis`] - cost, timeline and space utilization
//! - [`render`] - drawing commands plus SVG and raster backends
//! - [`document`], [`file_io`] - saved designs with atomic writes and locking
//! - [`errors`] - structured error types

pub mod allocator;
pub mod analysis;
pub mod design;
pub mod document;
pub mod errors;
pub mod estimate;
pub mod file_io;
pub mod floor_plan;
pub mod geometry;
pub mod packer;
pub mod program;
pub mod regulation;
pub mod render;
pub mod rules;
pub mod units;

pub use design::{generate, generate_floors, Design, DesignSummary};
pub use document::{DesignDocument, DocumentMeta};
pub use errors::{PlanError, PlanResult};
pub use file_io::{load_design, load_design_with_lock_check, save_design, FileLock};
pub use floor_plan::FloorPlan;
pub use geometry::Direction;
pub use program::{BedroomConfig, BudgetRange, BuildingType, DesignInput, StaircaseType};
pub use render::{render_design, render_floor, OutputFormat, RenderConfig};
pub use rules::RuleTables;
