//! # Rule Tables
//!
//! Regulation brackets, room standards, directional placement preferences,
//! floor-role policy, staircase dimensions and cost rates, loaded once from
//! TOML into an immutable [`RuleTables`] value that is passed by reference to
//! every pipeline stage. Nothing here is global state: two rule sets can be
//! used side by side, and tests can load their own.
//!
//! The default tables ship with the crate (`default_rules.toml`).
//!
//! ## Example
//!
//! ```rust
//! use plan_core::rules::RuleTables;
//! use plan_core::program::RoomKind;
//!
//! let rules = RuleTables::builtin().unwrap();
//! let living = rules.room(RoomKind::Living).unwrap();
//! assert_eq!(living.min_area_sqft, 120.0);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{PlanError, PlanResult};
use crate::geometry::Direction;
use crate::program::{BedroomConfig, BudgetRange, BuildingType, RoomKind, StaircaseType};

const DEFAULT_RULES: &str = include_str!("default_rules.toml");

/// Complete, validated rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTables {
    /// Version string, copied into every generated design
    pub version: String,
    /// Tie-break order for rooms competing for placement
    pub priority: Vec<RoomKind>,
    pub layout: LayoutRules,
    pub openings: OpeningRules,
    pub regulation: RegulationRules,
    #[serde(rename = "room")]
    pub rooms: Vec<RoomStandard>,
    pub floors: FloorPolicy,
    pub programs: ProgramTable,
    pub staircase: StairRules,
    pub cost: CostRules,
}

/// Packing constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRules {
    pub grid_ft: f64,
    pub wall_thickness_ft: f64,
    pub corridor_width_ft: f64,
    pub max_band_depth_ft: f64,
    pub min_band_depth_ft: f64,
    pub max_envelope_width_ft: f64,
    pub min_envelope_width_ft: f64,
    /// Longest side over shortest side, for every packed room
    pub aspect_ratio_max: f64,
    /// Narrowest strip left over as a passage; narrower residuals are absorbed
    pub min_passage_ft: f64,
    /// Fraction of the envelope shared out as room targets
    pub usable_ratio: f64,
}

/// Door and window sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningRules {
    pub door_width_ft: f64,
    pub bathroom_door_width_ft: f64,
    pub main_door_width_ft: f64,
    pub min_door_width_ft: f64,
    pub door_end_clearance_ft: f64,
    pub min_door_wall_ft: f64,
    pub min_window_wall_ft: f64,
    pub window_end_clearance_ft: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationRules {
    #[serde(rename = "bracket")]
    pub brackets: Vec<RegulationBracket>,
    #[serde(rename = "building")]
    pub buildings: Vec<BuildingRule>,
}

/// Land-area bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationBracket {
    pub label: String,
    /// Exclusive upper bound; `None` for the open-ended last bracket
    #[serde(default)]
    pub max_area_sqft: Option<f64>,
    /// Maximum ground coverage fraction
    pub coverage: f64,
    pub far: f64,
    pub max_floors: u32,
    pub front_setback_ft: f64,
    pub rear_setback_ft: f64,
    pub side_setback_ft: f64,
}

/// Building-type adjustments applied on top of the bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRule {
    pub building_type: BuildingType,
    pub min_plot_sqft: f64,
    pub far_multiplier: f64,
    pub max_floors: u32,
}

/// Who a room serves; drives floor assignment and analysis categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrivacyClass {
    Public,
    Private,
    Service,
}

/// Directional preference as written in the tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ZonePreference {
    /// Whatever side faces the road
    Front,
    Compass(Direction),
}

impl ZonePreference {
    /// Resolve to an absolute compass direction for a plot facing `facing`.
    pub fn resolve(self, facing: Direction) -> Direction {
        match self {
            ZonePreference::Front => facing,
            ZonePreference::Compass(direction) => direction,
        }
    }
}

impl TryFrom<String> for ZonePreference {
    type Error = PlanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("front") {
            return Ok(ZonePreference::Front);
        }
        Direction::from_str_flexible(&value).map(ZonePreference::Compass)
    }
}

impl From<ZonePreference> for String {
    fn from(value: ZonePreference) -> Self {
        match value {
            ZonePreference::Front => "front".to_string(),
            ZonePreference::Compass(direction) => direction.code().to_string(),
        }
    }
}

/// Per-kind size standard and placement preference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStandard {
    pub kind: RoomKind,
    pub min_area_sqft: f64,
    pub max_area_sqft: f64,
    /// Reference size for the space analysis
    #[serde(default)]
    pub ideal_area_sqft: Option<f64>,
    /// Share weight when dividing the floor between rooms
    pub weight: f64,
    /// Occupies half a band's depth and pairs with another half-depth room
    pub half_depth: bool,
    pub privacy: PrivacyClass,
    pub zone: ZonePreference,
    pub window_ft: f64,
}

/// Floor-role room lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorPolicy {
    pub ground: Vec<RoomKind>,
    /// Bedrooms kept on the ground floor of a multi-floor design (only when
    /// there is more than one bedroom)
    pub ground_guest_bedrooms: u8,
    pub upper: Vec<RoomKind>,
    pub first_upper_extra: Vec<RoomKind>,
    pub service: Vec<RoomKind>,
    pub baths_per_bedroom: u8,
}

/// Bedroom configurations that have a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramTable {
    pub supported: Vec<BedroomConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StairRules {
    pub zone: ZonePreference,
    pub floor_height_ft: f64,
    pub max_riser_ft: f64,
    #[serde(rename = "shape")]
    pub shapes: Vec<StairShapeRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StairShapeRule {
    pub kind: StaircaseType,
    /// Width of the reserved slot along the band; the slot depth is the band depth
    pub slot_width_ft: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRules {
    pub currency: String,
    pub small_area_sqft: f64,
    pub small_area_multiplier: f64,
    pub large_area_sqft: f64,
    pub large_area_multiplier: f64,
    pub finish: FinishMultipliers,
    #[serde(rename = "rate")]
    pub rates: Vec<CostRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishMultipliers {
    pub economy: f64,
    pub standard: f64,
    pub premium: f64,
    pub luxury: f64,
}

impl FinishMultipliers {
    pub fn for_budget(&self, budget: BudgetRange) -> f64 {
        match budget {
            BudgetRange::Economy => self.economy,
            BudgetRange::Standard => self.standard,
            BudgetRange::Premium => self.premium,
            BudgetRange::Luxury => self.luxury,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRate {
    pub building_type: BuildingType,
    pub rate_per_sqft: f64,
}

// ============================================================================
// Loading and lookup
// ============================================================================

impl RuleTables {
    /// The rule set shipped with the crate.
    pub fn builtin() -> PlanResult<Self> {
        Self::from_toml_str(DEFAULT_RULES)
    }

    /// Parse and validate a TOML rule document.
    pub fn from_toml_str(source: &str) -> PlanResult<Self> {
        let rules: RuleTables =
            toml::from_str(source).map_err(|e| PlanError::rule_table(format!("Invalid rule TOML: {}", e)))?;
        rules.validate()?;
        tracing::debug!(version = %rules.version, rooms = rules.rooms.len(), "Loaded rule tables");
        Ok(rules)
    }

    /// Load a rule document from disk.
    pub fn load(path: &Path) -> PlanResult<Self> {
        let source = fs::read_to_string(path)
            .map_err(|e| PlanError::file_error("read rules", path.display().to_string(), e.to_string()))?;
        Self::from_toml_str(&source)
    }

    /// Consistency checks run once at load time.
    pub fn validate(&self) -> PlanResult<()> {
        let layout = &self.layout;
        for (name, value) in [
            ("grid_ft", layout.grid_ft),
            ("wall_thickness_ft", layout.wall_thickness_ft),
            ("corridor_width_ft", layout.corridor_width_ft),
            ("max_band_depth_ft", layout.max_band_depth_ft),
            ("min_band_depth_ft", layout.min_band_depth_ft),
            ("aspect_ratio_max", layout.aspect_ratio_max),
            ("usable_ratio", layout.usable_ratio),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(PlanError::rule_table(format!("layout.{} must be positive, got {}", name, value)));
            }
        }
        if layout.aspect_ratio_max < 1.0 {
            return Err(PlanError::rule_table("layout.aspect_ratio_max must be at least 1"));
        }
        if layout.min_band_depth_ft > layout.max_band_depth_ft {
            return Err(PlanError::rule_table("layout.min_band_depth_ft exceeds max_band_depth_ft"));
        }

        if self.regulation.brackets.is_empty() {
            return Err(PlanError::rule_table("at least one regulation bracket is required"));
        }
        let mut previous = 0.0;
        let last = self.regulation.brackets.len() - 1;
        for (i, bracket) in self.regulation.brackets.iter().enumerate() {
            match (bracket.max_area_sqft, i == last) {
                (Some(max), _) if max <= previous => {
                    return Err(PlanError::rule_table(format!(
                        "bracket '{}' upper bound {} is not above the previous bound {}",
                        bracket.label, max, previous
                    )));
                }
                (Some(max), _) => previous = max,
                (None, false) => {
                    return Err(PlanError::rule_table(format!(
                        "only the last bracket may be open-ended ('{}' is not last)",
                        bracket.label
                    )));
                }
                (None, true) => {}
            }
            if !(bracket.coverage > 0.0 && bracket.coverage <= 1.0) {
                return Err(PlanError::rule_table(format!("bracket '{}' coverage must be in (0, 1]", bracket.label)));
            }
        }
        if self.regulation.brackets[last].max_area_sqft.is_some() {
            return Err(PlanError::rule_table("the last regulation bracket must be open-ended"));
        }

        for kind in RoomKind::PROGRAMMABLE {
            let standard = self.room(kind)?;
            if standard.min_area_sqft <= 0.0 || standard.min_area_sqft > standard.max_area_sqft {
                return Err(PlanError::rule_table(format!(
                    "{:?}: need 0 < min_area_sqft <= max_area_sqft",
                    kind
                )));
            }
            if standard.weight <= 0.0 {
                return Err(PlanError::rule_table(format!("{:?}: weight must be positive", kind)));
            }
            if !self.priority.contains(&kind) {
                return Err(PlanError::rule_table(format!("{:?} is missing from the priority list", kind)));
            }
        }
        let policy_kinds = self
            .floors
            .ground
            .iter()
            .chain(&self.floors.upper)
            .chain(&self.floors.first_upper_extra)
            .chain(&self.floors.service);
        for kind in policy_kinds {
            if kind.is_circulation() {
                return Err(PlanError::rule_table(format!("{:?} cannot be requested by a floor policy", kind)));
            }
        }

        for shape in &self.staircase.shapes {
            if !(shape.slot_width_ft > 0.0) {
                return Err(PlanError::rule_table(format!("{} stair slot width must be positive", shape.kind)));
            }
        }
        if !(self.staircase.max_riser_ft > 0.0 && self.staircase.floor_height_ft > 0.0) {
            return Err(PlanError::rule_table("staircase floor height and riser must be positive"));
        }
        Ok(())
    }

    /// Size standard for a programmable room kind.
    pub fn room(&self, kind: RoomKind) -> PlanResult<&RoomStandard> {
        self.rooms
            .iter()
            .find(|r| r.kind == kind)
            .ok_or_else(|| PlanError::rule_table(format!("no room standard for {:?}", kind)))
    }

    /// Position in the tie-break order (lower places first).
    pub fn priority_of(&self, kind: RoomKind) -> usize {
        self.priority
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(self.priority.len())
    }

    /// Bracket whose range contains the land area.
    pub fn bracket_for(&self, land_area_sqft: f64) -> &RegulationBracket {
        let brackets = &self.regulation.brackets;
        brackets
            .iter()
            .find(|b| b.max_area_sqft.map_or(true, |max| land_area_sqft < max))
            .unwrap_or(&brackets[brackets.len() - 1])
    }

    pub fn building(&self, building_type: BuildingType) -> PlanResult<&BuildingRule> {
        self.regulation
            .buildings
            .iter()
            .find(|b| b.building_type == building_type)
            .ok_or_else(|| {
                PlanError::unsupported(
                    "building_type",
                    building_type.display_name(),
                    "No regulation entry for this building type",
                )
            })
    }

    pub fn stair(&self, kind: StaircaseType) -> PlanResult<&StairShapeRule> {
        self.staircase.shapes.iter().find(|s| s.kind == kind).ok_or_else(|| {
            PlanError::unsupported("staircase_type", kind.display_name(), "No staircase table entry for this shape")
        })
    }

    pub fn supports(&self, config: BedroomConfig) -> bool {
        self.programs.supported.contains(&config)
    }

    pub fn cost_rate(&self, building_type: BuildingType) -> Option<f64> {
        self.cost
            .rates
            .iter()
            .find(|r| r.building_type == building_type)
            .map(|r| r.rate_per_sqft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_load() {
        let rules = RuleTables::builtin().unwrap();
        assert_eq!(rules.version, "2024.1");
        assert_eq!(rules.regulation.brackets.len(), 4);
        assert_eq!(rules.priority[0], RoomKind::Living);
        assert!(rules.room(RoomKind::Bathroom).unwrap().half_depth);
        assert_eq!(rules.room(RoomKind::Living).unwrap().zone, ZonePreference::Front);
        assert_eq!(
            rules.room(RoomKind::Kitchen).unwrap().zone,
            ZonePreference::Compass(Direction::SouthEast)
        );
    }

    #[test]
    fn test_bracket_selection_upper_bound_exclusive() {
        let rules = RuleTables::builtin().unwrap();
        assert_eq!(rules.bracket_for(600.0).label, "small");
        assert_eq!(rules.bracket_for(1000.0).label, "medium");
        assert_eq!(rules.bracket_for(1200.0).label, "medium");
        assert_eq!(rules.bracket_for(4999.0).label, "large");
        assert_eq!(rules.bracket_for(1.0e6).label, "estate");
    }

    #[test]
    fn test_program_support() {
        let rules = RuleTables::builtin().unwrap();
        assert!(rules.supports(BedroomConfig::new(1)));
        assert!(rules.supports(BedroomConfig::new(5)));
        assert!(!rules.supports(BedroomConfig::new(10)));
    }

    #[test]
    fn test_stair_lookup() {
        let rules = RuleTables::builtin().unwrap();
        assert_eq!(rules.stair(StaircaseType::UShaped).unwrap().slot_width_ft, 7.5);
        assert_eq!(rules.staircase.zone, ZonePreference::Compass(Direction::South));
    }

    #[test]
    fn test_invalid_toml_is_rule_table_error() {
        let err = RuleTables::from_toml_str("version = 3").unwrap_err();
        assert_eq!(err.error_code(), "RULE_TABLE_ERROR");
    }

    #[test]
    fn test_validation_rejects_inverted_room_bounds() {
        let broken = DEFAULT_RULES.replacen("max_area_sqft = 300.0", "max_area_sqft = 100.0", 1);
        let err = RuleTables::from_toml_str(&broken).unwrap_err();
        assert!(err.to_string().contains("Living"));
    }

    #[test]
    fn test_validation_rejects_unordered_brackets() {
        let broken = DEFAULT_RULES.replacen("max_area_sqft = 2500.0", "max_area_sqft = 900.0", 1);
        assert!(RuleTables::from_toml_str(&broken).is_err());
    }

    #[test]
    fn test_rules_are_independent_values() {
        let a = RuleTables::builtin().unwrap();
        let mut b = a.clone();
        b.layout.corridor_width_ft = 5.0;
        assert_ne!(a, b);
        assert_eq!(a.layout.corridor_width_ft, 4.0);
    }
}
