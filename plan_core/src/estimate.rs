//! # Cost and Timeline Estimates
//!
//! Rough construction figures attached to every design. They read the built
//! area and the rule tables only; geometry never depends on them.
//!
//! ```text
//! cost   = built_area * rate(building_type) * scale(built_area) * finish(budget)
//! months = 6 + built_area / 200 + 2 * (floors - 1)
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{PlanError, PlanResult};
use crate::program::{BudgetRange, BuildingType};
use crate::rules::RuleTables;

/// Itemized construction cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub currency: String,
    pub built_area: f64,
    pub rate_per_sqft: f64,
    /// Economies or diseconomies of scale
    pub scale_multiplier: f64,
    /// From the budget tier
    pub finish_multiplier: f64,
    pub total: f64,
}

/// Construction duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub months: f64,
    pub label: String,
}

/// Estimate construction cost for a built area.
pub fn estimate_cost(
    built_area: f64,
    building_type: BuildingType,
    budget: BudgetRange,
    rules: &RuleTables,
) -> PlanResult<CostEstimate> {
    let cost = &rules.cost;
    let rate_per_sqft = rules.cost_rate(building_type).ok_or_else(|| {
        PlanError::unsupported("building_type", building_type.display_name(), "No cost rate for this building type")
    })?;
    let scale_multiplier = if built_area < cost.small_area_sqft {
        cost.small_area_multiplier
    } else if built_area > cost.large_area_sqft {
        cost.large_area_multiplier
    } else {
        1.0
    };
    let finish_multiplier = cost.finish.for_budget(budget);
    Ok(CostEstimate {
        currency: cost.currency.clone(),
        built_area,
        rate_per_sqft,
        scale_multiplier,
        finish_multiplier,
        total: built_area * rate_per_sqft * scale_multiplier * finish_multiplier,
    })
}

/// Estimate construction time: six months base, a month per 200 sq ft, and
/// two months per floor above the ground.
pub fn construction_timeline(built_area: f64, floors: u32) -> Timeline {
    let months = 6.0 + built_area / 200.0 + 2.0 * floors.saturating_sub(1) as f64;
    let whole = months.floor() as u64;
    let label = if months <= 8.0 {
        format!("{} months", whole)
    } else if months <= 12.0 {
        format!("{} months (including finishing)", whole)
    } else {
        let years = whole / 12;
        let rest = whole % 12;
        let unit = if years > 1 { "years" } else { "year" };
        if rest == 0 {
            format!("{} {}", years, unit)
        } else {
            format!("{} {} {} months", years, unit, rest)
        }
    };
    Timeline { months, label }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cost_standard_mid_size() {
        let rules = RuleTables::builtin().unwrap();
        let cost = estimate_cost(1800.0, BuildingType::IndependentHouse, BudgetRange::Standard, &rules).unwrap();
        assert_eq!(cost.scale_multiplier, 1.0);
        assert_relative_eq!(cost.total, 1800.0 * 1800.0);
        assert_eq!(cost.currency, "INR");
    }

    #[test]
    fn test_cost_multipliers() {
        let rules = RuleTables::builtin().unwrap();
        let small = estimate_cost(600.0, BuildingType::Apartment, BudgetRange::Economy, &rules).unwrap();
        assert_relative_eq!(small.total, 600.0 * 1400.0 * 1.2 * 0.9);
        let large = estimate_cost(3000.0, BuildingType::Villa, BudgetRange::Luxury, &rules).unwrap();
        assert_relative_eq!(large.total, 3000.0 * 2500.0 * 0.9 * 1.6);
    }

    #[test]
    fn test_timeline_labels() {
        assert_eq!(construction_timeline(300.0, 1).label, "7 months");
        assert_eq!(construction_timeline(800.0, 1).label, "10 months (including finishing)");
        // 6 + 9 + 2 = 17
        assert_eq!(construction_timeline(1800.0, 2).label, "1 year 5 months");
        // 6 + 16 + 2 = 24
        assert_eq!(construction_timeline(3200.0, 2).label, "2 years");
    }
}
