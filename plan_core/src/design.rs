//! # Design Pipeline
//!
//! Runs the stages in dependency order and assembles the [`Design`]
//! aggregate handed to consumers:
//!
//! ```text
//! DesignInput ─split─> PlotSpec + ProgramSpec
//!     │
//!     ├─ regulation::calculate      (once)
//!     ├─ allocator::allocate        (once)
//!     ├─ packer::place_staircase    (once, shared by every floor)
//!     └─ packer::pack_floor         (per floor, in parallel)
//!            │
//!            └─> Vec<FloorPlan> ─> summary, cost, timeline, analysis
//! ```
//!
//! Regulation and allocation errors abort the request. Packing errors are
//! floor-scoped: [`generate_floors`] reports each floor's outcome, while
//! [`generate`] fails with the lowest failing floor's error.
//!
//! ## Example
//!
//! ```rust
//! use plan_core::design::generate;
//! use plan_core::geometry::Direction;
//! use plan_core::program::{BedroomConfig, BuildingType, DesignInput};
//! use plan_core::rules::RuleTables;
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
//! assert_eq!(design.floors.len(), 2);
//! assert!(design.summary.efficiency_ratio > 0.75);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::allocator::{self, Allocation};
use crate::analysis::{self, SpaceAnalysis};
use crate::errors::{PlanError, PlanResult};
use crate::estimate::{self, CostEstimate, Timeline};
use crate::floor_plan::FloorPlan;
use crate::packer::{self, StairSlot};
use crate::program::{BuildingType, DesignInput};
use crate::regulation::{self, RegulationResult};
use crate::rules::RuleTables;

/// Plot side below which the plot is flagged as narrow
const NARROW_PLOT_SIDE_FT: f64 = 20.0;
/// Land area above which few bedrooms is flagged
const LARGE_PLOT_SQFT: f64 = 3000.0;
/// Rough area one bedroom suite needs
const SQFT_PER_BEDROOM: f64 = 300.0;

// ============================================================================
// Output types
// ============================================================================

/// Area totals over all floors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSummary {
    /// Sum of the envelope area of every floor
    pub total_built_area: f64,
    pub carpet_area: f64,
    /// carpet / built
    pub efficiency_ratio: f64,
    pub room_count: usize,
}

impl DesignSummary {
    fn from_floors(floors: &[FloorPlan]) -> Self {
        let total_built_area: f64 = floors.iter().map(|f| f.envelope().area()).sum();
        let carpet_area: f64 = floors.iter().map(|f| f.metadata().carpet_area).sum();
        DesignSummary {
            total_built_area,
            carpet_area,
            efficiency_ratio: if total_built_area > 0.0 {
                carpet_area / total_built_area
            } else {
                0.0
            },
            room_count: floors.iter().map(|f| f.rooms().len()).sum(),
        }
    }
}

/// A complete generated design. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    /// Version of the rule tables the design was generated with
    pub rules_version: String,
    pub input: DesignInput,
    pub regulation: RegulationResult,
    /// Floor plans ordered by floor index
    pub floors: Vec<FloorPlan>,
    pub summary: DesignSummary,
    pub warnings: Vec<String>,
    pub cost: CostEstimate,
    pub timeline: Timeline,
    pub analysis: SpaceAnalysis,
}

impl Design {
    pub fn floor(&self, index: usize) -> Option<&FloorPlan> {
        self.floors.get(index)
    }
}

/// Per-floor outcomes of one design run
#[derive(Debug, Clone, PartialEq)]
pub struct FloorOutcomes {
    pub regulation: RegulationResult,
    pub allocation: Allocation,
    pub stair: Option<StairSlot>,
    pub warnings: Vec<String>,
    /// One entry per floor, in floor order
    pub floors: Vec<PlanResult<FloorPlan>>,
}

impl FloorOutcomes {
    /// Floors that failed to pack, with their errors
    pub fn failures(&self) -> impl Iterator<Item = (usize, &PlanError)> + '_ {
        self.floors
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| outcome.as_ref().err().map(|e| (index, e)))
    }

    pub fn is_complete(&self) -> bool {
        self.floors.iter().all(|outcome| outcome.is_ok())
    }

    /// Assemble the design, failing with the lowest failing floor's error.
    pub fn into_design(self, input: &DesignInput, rules: &RuleTables) -> PlanResult<Design> {
        let floors: Vec<FloorPlan> = self.floors.into_iter().collect::<PlanResult<_>>()?;
        let summary = DesignSummary::from_floors(&floors);
        let cost = estimate::estimate_cost(summary.total_built_area, input.building_type, input.budget_range, rules)?;
        let timeline = estimate::construction_timeline(summary.total_built_area, input.floors);
        let analysis = analysis::analyze(&floors, summary.efficiency_ratio, rules);

        tracing::info!(
            floors = floors.len(),
            built = summary.total_built_area,
            carpet = summary.carpet_area,
            efficiency = summary.efficiency_ratio,
            "Design generated"
        );

        Ok(Design {
            rules_version: rules.version.clone(),
            input: input.clone(),
            regulation: self.regulation,
            floors,
            summary,
            warnings: self.warnings,
            cost,
            timeline,
            analysis,
        })
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Generate a complete design.
pub fn generate(input: &DesignInput, rules: &RuleTables) -> PlanResult<Design> {
    generate_floors(input, rules)?.into_design(input, rules)
}

/// Run the pipeline and report every floor's packing outcome.
///
/// Fails outright only for errors that precede packing (input, regulation,
/// allocation, staircase slot).
pub fn generate_floors(input: &DesignInput, rules: &RuleTables) -> PlanResult<FloorOutcomes> {
    let (plot, program) = input.split()?;
    let regulation = regulation::calculate(&plot, rules)?;
    tracing::debug!(
        bracket = %regulation.bracket,
        width = regulation.envelope.width_ft,
        depth = regulation.envelope.depth_ft,
        per_floor = regulation.per_floor_area,
        "Regulation computed"
    );

    let warnings = feasibility_warnings(input, &regulation);
    for warning in &warnings {
        tracing::warn!(%warning, "Feasibility warning");
    }

    let allocation = allocator::allocate(&program, &regulation, &plot, rules)?;
    let stair = program
        .staircase
        .map(|shape| packer::place_staircase(regulation.envelope, plot.facing, shape, rules))
        .transpose()?;

    let floors: Vec<PlanResult<FloorPlan>> = allocation
        .floors
        .par_iter()
        .map(|floor| packer::pack_floor(floor, &regulation, plot.facing, stair.as_ref(), rules))
        .collect();

    for (index, outcome) in floors.iter().enumerate() {
        match outcome {
            Ok(plan) => tracing::debug!(floor = index, rooms = plan.rooms().len(), "Floor packed"),
            Err(e) => tracing::debug!(floor = index, code = e.error_code(), "Floor failed to pack"),
        }
    }

    Ok(FloorOutcomes {
        regulation,
        allocation,
        stair,
        warnings,
        floors,
    })
}

/// Non-fatal observations about the request.
pub fn feasibility_warnings(input: &DesignInput, regulation: &RegulationResult) -> Vec<String> {
    let mut warnings = Vec::new();
    let bedrooms = input.bedroom_config.bedrooms as u32;

    if input.building_type == BuildingType::Apartment && input.floors > 1 {
        warnings.push(
            "Apartment units are typically single floor; consider an Independent House or Duplex for a multi-floor design"
                .to_string(),
        );
    }
    if input.floors == 1 && input.staircase_type.is_some() {
        warnings.push("Staircase specified for a single-floor building will be ignored".to_string());
    }
    if regulation.plot_side_ft < NARROW_PLOT_SIDE_FT {
        warnings.push("Very narrow plot may limit design flexibility".to_string());
    }
    if input.land_size > LARGE_PLOT_SQFT && bedrooms < 3 {
        warnings.push("Large plot with few bedrooms; consider additional amenities or larger rooms".to_string());
    }
    if bedrooms as f64 * SQFT_PER_BEDROOM > 0.8 * input.land_size {
        warnings.push(format!(
            "{} bedrooms may not fit comfortably in {:.0} sq ft",
            bedrooms, input.land_size
        ));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction;
    use crate::program::{BedroomConfig, StaircaseType};

    fn scenario_a() -> DesignInput {
        DesignInput::new(
            1200.0,
            Direction::East,
            BuildingType::IndependentHouse,
            BedroomConfig::new(3),
            2,
        )
    }

    #[test]
    fn test_generate_two_floors() {
        let rules = RuleTables::builtin().unwrap();
        let design = generate(&scenario_a(), &rules).unwrap();
        assert_eq!(design.floors.len(), 2);
        assert_eq!(design.rules_version, rules.version);
        for (index, floor) in design.floors.iter().enumerate() {
            assert_eq!(floor.floor_index(), index);
        }
        let expected: f64 = design.floors.iter().map(|f| f.envelope().area()).sum();
        assert_eq!(design.summary.total_built_area, expected);
        assert!(design.summary.carpet_area < design.summary.total_built_area);
        assert!(design.cost.total > 0.0);
    }

    #[test]
    fn test_staircase_aligned_across_floors() {
        let rules = RuleTables::builtin().unwrap();
        let input = DesignInput::new(
            2000.0,
            Direction::SouthWest,
            BuildingType::IndependentHouse,
            BedroomConfig::new(4),
            2,
        )
        .with_staircase(StaircaseType::LShaped);
        let design = generate(&input, &rules).unwrap();
        let stairs: Vec<_> = design.floors.iter().map(|f| f.staircase().unwrap().footprint).collect();
        assert_eq!(stairs[0], stairs[1]);
    }

    #[test]
    fn test_single_floor_has_no_staircase() {
        let rules = RuleTables::builtin().unwrap();
        let input = DesignInput::new(
            1500.0,
            Direction::North,
            BuildingType::IndependentHouse,
            BedroomConfig::new(2),
            1,
        )
        .with_staircase(StaircaseType::Spiral);
        let design = generate(&input, &rules).unwrap();
        assert!(design.floors[0].staircase().is_none());
        assert!(design.warnings.iter().any(|w| w.contains("ignored")));
    }

    #[test]
    fn test_outcomes_report_each_floor() {
        let rules = RuleTables::builtin().unwrap();
        let outcomes = generate_floors(&scenario_a(), &rules).unwrap();
        assert_eq!(outcomes.floors.len(), 2);
        assert!(outcomes.is_complete());
        assert_eq!(outcomes.failures().count(), 0);
        assert!(outcomes.stair.is_some());
    }

    #[test]
    fn test_regulation_errors_abort() {
        let rules = RuleTables::builtin().unwrap();
        let mut input = scenario_a();
        input.land_size = -5.0;
        let err = generate_floors(&input, &rules).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PLOT");
    }

    #[test]
    fn test_warnings() {
        let rules = RuleTables::builtin().unwrap();
        let mut input = scenario_a();
        let (plot, _) = input.split().unwrap();
        let regulation = regulation::calculate(&plot, &rules).unwrap();
        assert!(feasibility_warnings(&input, &regulation).is_empty());

        input.building_type = BuildingType::Apartment;
        let warnings = feasibility_warnings(&input, &regulation);
        assert!(warnings.iter().any(|w| w.starts_with("Apartment")));

        input.land_size = 3500.0;
        input.bedroom_config = BedroomConfig::new(2);
        let warnings = feasibility_warnings(&input, &regulation);
        assert!(warnings.iter().any(|w| w.starts_with("Large plot")));
    }
}
