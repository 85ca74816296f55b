//! # Regulation Calculator
//!
//! Turns a [`PlotSpec`] into the buildable envelope the rest of the pipeline
//! packs into. Pure lookup and arithmetic against the rule tables: select the
//! land-area bracket and building-type entry, apply setbacks on a square plot,
//! and derive FAR-limited areas.
//!
//! ```text
//! side            = sqrt(land)
//! setback_area    = land - (side - 2*side_setback) * (side - front - rear)
//! max_far         = bracket.far * building.far_multiplier
//! buildable_area  = land * max_far - setback_area        (all floors)
//! footprint_area  = land * coverage - setback_area       (one floor)
//! per_floor_area  = min(footprint_area, buildable_area / floors)
//! ```
//!
//! The packed envelope is the setback rectangle snapped down to the layout
//! grid, capped to what the packer's band model can use, and trimmed in depth
//! until it fits `per_floor_area`.
//!
//! ## Example
//!
//! ```rust
//! use plan_core::program::{BedroomConfig, BuildingType, DesignInput};
//! use plan_core::geometry::Direction;
//! use plan_core::regulation::calculate;
//! use plan_core::rules::RuleTables;
//!
//! let rules = RuleTables::builtin().unwrap();
//! let input = DesignInput::new(1200.0, Direction::East, BuildingType::IndependentHouse, BedroomConfig::new(3), 2);
//! let (plot, _) = input.split().unwrap();
//! let result = calculate(&plot, &rules).unwrap();
//! assert_eq!(result.envelope.width_ft, 30.5);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{PlanError, PlanResult};
use crate::program::PlotSpec;
use crate::rules::RuleTables;
use crate::units::{snap_down, EPSILON};

/// Setback distances in feet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Setbacks {
    pub front_ft: f64,
    pub rear_ft: f64,
    pub side_ft: f64,
}

/// Rectangle available to the packer on every floor. Local origin at the
/// front-left corner; the road runs along `y = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub width_ft: f64,
    pub depth_ft: f64,
}

impl Envelope {
    pub fn area(&self) -> f64 {
        self.width_ft * self.depth_ft
    }
}

/// Derived, read-only regulation outcome for one plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationResult {
    /// Bracket label the plot fell into
    pub bracket: String,
    pub land_area: f64,
    /// Side of the equivalent square plot
    pub plot_side_ft: f64,
    pub setbacks: Setbacks,
    pub setback_area: f64,
    pub coverage: f64,
    /// Effective FAR after the building-type multiplier
    pub max_far: f64,
    pub max_floors: u32,
    /// Total permitted built area over all floors
    pub buildable_area: f64,
    /// Single-floor footprint permitted by coverage
    pub footprint_area: f64,
    /// Area each floor may occupy
    pub per_floor_area: f64,
    pub envelope: Envelope,
}

/// Compute the regulation outcome for a plot.
///
/// Fails with `InvalidPlot` when the land is below the building-type minimum,
/// the floor count exceeds what the rules allow, or setbacks leave nothing
/// usable to build on.
pub fn calculate(plot: &PlotSpec, rules: &RuleTables) -> PlanResult<RegulationResult> {
    let land = plot.land_area;
    if !land.is_finite() || land <= 0.0 {
        return Err(PlanError::invalid_plot(
            "land_size",
            land.to_string(),
            "Land area must be a positive, finite number of square feet",
        ));
    }
    if plot.floors == 0 {
        return Err(PlanError::invalid_plot("floors", "0", "At least one floor is required"));
    }

    let building = rules.building(plot.building_type)?;
    if land < building.min_plot_sqft {
        return Err(PlanError::invalid_plot(
            "land_size",
            land.to_string(),
            format!(
                "Plot is below the {} sq ft minimum for {}",
                building.min_plot_sqft,
                plot.building_type.display_name()
            ),
        ));
    }

    let bracket = rules.bracket_for(land);
    let max_floors = bracket.max_floors.min(building.max_floors);
    if plot.floors > max_floors {
        return Err(PlanError::invalid_plot(
            "floors",
            plot.floors.to_string(),
            format!("At most {} floors are permitted on this plot", max_floors),
        ));
    }

    let setbacks = Setbacks {
        front_ft: bracket.front_setback_ft,
        rear_ft: bracket.rear_setback_ft,
        side_ft: bracket.side_setback_ft,
    };
    let side = land.sqrt();
    let inner_width = side - 2.0 * setbacks.side_ft;
    let inner_depth = side - setbacks.front_ft - setbacks.rear_ft;
    if inner_width <= 0.0 || inner_depth <= 0.0 {
        return Err(PlanError::invalid_plot(
            "land_size",
            land.to_string(),
            "Setbacks consume the entire plot",
        ));
    }
    let setback_area = land - inner_width * inner_depth;
    let max_far = bracket.far * building.far_multiplier;
    let buildable_area = land * max_far - setback_area;
    let footprint_area = land * bracket.coverage - setback_area;
    if buildable_area <= 0.0 || footprint_area <= 0.0 {
        return Err(PlanError::invalid_plot(
            "land_size",
            land.to_string(),
            format!("No buildable area remains after setbacks ({:.1} sq ft)", buildable_area.min(footprint_area)),
        ));
    }
    let per_floor_area = footprint_area.min(buildable_area / plot.floors as f64);

    let envelope = envelope_for(inner_width, inner_depth, per_floor_area, rules)?;

    tracing::debug!(
        land,
        bracket = %bracket.label,
        buildable_area,
        per_floor_area,
        width = envelope.width_ft,
        depth = envelope.depth_ft,
        "Regulation envelope computed"
    );

    Ok(RegulationResult {
        bracket: bracket.label.clone(),
        land_area: land,
        plot_side_ft: side,
        setbacks,
        setback_area,
        coverage: bracket.coverage,
        max_far,
        max_floors,
        buildable_area,
        footprint_area,
        per_floor_area,
        envelope,
    })
}

/// Snap the setback rectangle to the grid, cap it to what the band model can
/// use, and trim the depth until the floor fits its area allowance.
fn envelope_for(inner_width: f64, inner_depth: f64, per_floor_area: f64, rules: &RuleTables) -> PlanResult<Envelope> {
    let layout = &rules.layout;
    let grid = layout.grid_ft;
    let max_depth = 2.0 * layout.max_band_depth_ft + layout.corridor_width_ft;
    let min_depth = 2.0 * layout.min_band_depth_ft + layout.corridor_width_ft;

    let width = snap_down(inner_width, grid).min(layout.max_envelope_width_ft);
    if width < layout.min_envelope_width_ft {
        return Err(PlanError::invalid_plot(
            "land_size",
            format!("{:.1} ft wide", width),
            format!("Buildable envelope is narrower than {} ft", layout.min_envelope_width_ft),
        ));
    }
    let mut depth = snap_down(inner_depth, grid).min(max_depth);
    if width * depth > per_floor_area + EPSILON {
        depth = snap_down(per_floor_area / width, grid);
    }
    if depth < min_depth {
        return Err(PlanError::invalid_plot(
            "land_size",
            format!("{:.1} ft deep", depth),
            format!("Buildable envelope is shallower than {} ft", min_depth),
        ));
    }
    Ok(Envelope {
        width_ft: width,
        depth_ft: depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction;
    use crate::program::BuildingType;
    use approx::assert_relative_eq;

    fn plot(land: f64, floors: u32) -> PlotSpec {
        PlotSpec {
            land_area: land,
            facing: Direction::East,
            road_side: Direction::East,
            building_type: BuildingType::IndependentHouse,
            floors,
        }
    }

    #[test]
    fn test_medium_plot_two_floors() {
        let rules = RuleTables::builtin().unwrap();
        let result = calculate(&plot(1200.0, 2), &rules).unwrap();
        assert_eq!(result.bracket, "medium");
        assert_relative_eq!(result.max_far, 1.75);
        let side = 1200f64.sqrt();
        let setback_area = 1200.0 - (side - 4.0) * (side - 4.5);
        assert_relative_eq!(result.setback_area, setback_area, epsilon = 1e-9);
        assert_relative_eq!(result.buildable_area, 2100.0 - setback_area, epsilon = 1e-9);
        assert_relative_eq!(result.per_floor_area, (2100.0 - setback_area) / 2.0, epsilon = 1e-9);
        // 30.5 x 30.0 = 915 exceeds ~911.8, so the depth is trimmed
        assert_eq!(result.envelope.width_ft, 30.5);
        assert_eq!(result.envelope.depth_ft, 29.5);
        assert!(result.envelope.area() <= result.per_floor_area);
    }

    #[test]
    fn test_small_plot_single_floor() {
        let rules = RuleTables::builtin().unwrap();
        let result = calculate(&plot(600.0, 1), &rules).unwrap();
        assert_eq!(result.bracket, "small");
        assert_eq!(result.envelope.width_ft, 20.0);
        assert_eq!(result.envelope.depth_ft, 19.0);
    }

    #[test]
    fn test_large_plot_is_capped() {
        let rules = RuleTables::builtin().unwrap();
        let result = calculate(&plot(6000.0, 1), &rules).unwrap();
        assert_eq!(result.envelope.width_ft, 48.0);
        assert!(result.envelope.depth_ft <= 34.0);
    }

    #[test]
    fn test_below_building_minimum() {
        let rules = RuleTables::builtin().unwrap();
        let mut villa = plot(1200.0, 1);
        villa.building_type = BuildingType::Villa;
        let err = calculate(&villa, &rules).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PLOT");
    }

    #[test]
    fn test_too_many_floors() {
        let rules = RuleTables::builtin().unwrap();
        let err = calculate(&plot(1200.0, 4), &rules).unwrap_err();
        assert!(matches!(err, PlanError::InvalidPlot { ref field, .. } if field == "floors"));
    }

    #[test]
    fn test_non_positive_land() {
        let rules = RuleTables::builtin().unwrap();
        for land in [0.0, -1.0, f64::NAN] {
            assert_eq!(calculate(&plot(land, 1), &rules).unwrap_err().error_code(), "INVALID_PLOT");
        }
    }

    #[test]
    fn test_setbacks_consuming_plot() {
        let rules = RuleTables::builtin().unwrap();
        let mut apartment = plot(300.0, 1);
        apartment.building_type = BuildingType::Apartment;
        // 17.3 ft square minus 5 ft of front/rear setbacks leaves a 12 ft deep strip
        let err = calculate(&apartment, &rules).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PLOT");
    }
}
