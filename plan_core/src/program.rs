//! # Design Input and Program
//!
//! The request record a caller hands to the pipeline ([`DesignInput`]) and the
//! two immutable views the pipeline works from once it is validated:
//!
//! - [`PlotSpec`] - the land: area, facing, building type, floor count
//! - [`ProgramSpec`] - what has to be built on it: bedrooms, auxiliary rooms,
//!   staircase, budget tier
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "land_size": 1200.0,
//!   "facing": "E",
//!   "building_type": "Independent House",
//!   "bedroom_config": "3BHK",
//!   "staircase_type": "Straight",
//!   "floors": 2,
//!   "budget_range": "Standard"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{PlanError, PlanResult};
use crate::geometry::Direction;

// ============================================================================
// Enumerations
// ============================================================================

/// Building typology, selects the regulation entry and cost rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    #[serde(rename = "Independent House", alias = "IndependentHouse")]
    IndependentHouse,
    #[serde(rename = "Row House", alias = "RowHouse")]
    RowHouse,
    Duplex,
    Villa,
    #[serde(rename = "Apartment", alias = "ApartmentUnit")]
    Apartment,
}

impl BuildingType {
    pub const ALL: [BuildingType; 5] = [
        BuildingType::IndependentHouse,
        BuildingType::RowHouse,
        BuildingType::Duplex,
        BuildingType::Villa,
        BuildingType::Apartment,
    ];

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            BuildingType::IndependentHouse => "Independent House",
            BuildingType::RowHouse => "Row House",
            BuildingType::Duplex => "Duplex",
            BuildingType::Villa => "Villa",
            BuildingType::Apartment => "Apartment",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> PlanResult<Self> {
        match s.to_uppercase().replace([' ', '_', '-'], "").as_str() {
            "INDEPENDENTHOUSE" | "HOUSE" | "IH" => Ok(BuildingType::IndependentHouse),
            "ROWHOUSE" | "ROW" | "TOWNHOUSE" => Ok(BuildingType::RowHouse),
            "DUPLEX" => Ok(BuildingType::Duplex),
            "VILLA" => Ok(BuildingType::Villa),
            "APARTMENT" | "APARTMENTUNIT" | "FLAT" => Ok(BuildingType::Apartment),
            _ => Err(PlanError::invalid_input(
                "building_type",
                s,
                "Expected Independent House, Row House, Duplex, Villa or Apartment",
            )),
        }
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Staircase shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaircaseType {
    Straight,
    #[serde(rename = "L-Shaped", alias = "LShaped")]
    LShaped,
    #[serde(rename = "U-Shaped", alias = "UShaped")]
    UShaped,
    Spiral,
    Winder,
}

impl StaircaseType {
    pub const ALL: [StaircaseType; 5] = [
        StaircaseType::Straight,
        StaircaseType::LShaped,
        StaircaseType::UShaped,
        StaircaseType::Spiral,
        StaircaseType::Winder,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            StaircaseType::Straight => "Straight",
            StaircaseType::LShaped => "L-Shaped",
            StaircaseType::UShaped => "U-Shaped",
            StaircaseType::Spiral => "Spiral",
            StaircaseType::Winder => "Winder",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> PlanResult<Self> {
        match s.to_uppercase().replace([' ', '_', '-'], "").as_str() {
            "STRAIGHT" | "I" => Ok(StaircaseType::Straight),
            "LSHAPED" | "L" => Ok(StaircaseType::LShaped),
            "USHAPED" | "U" | "DOGLEG" => Ok(StaircaseType::UShaped),
            "SPIRAL" | "HELICAL" => Ok(StaircaseType::Spiral),
            "WINDER" => Ok(StaircaseType::Winder),
            _ => Err(PlanError::invalid_input(
                "staircase_type",
                s,
                "Expected Straight, L-Shaped, U-Shaped, Spiral or Winder",
            )),
        }
    }
}

impl fmt::Display for StaircaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Budget tier. Only scales the finish multiplier of the cost estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BudgetRange {
    Economy,
    #[default]
    Standard,
    Premium,
    Luxury,
}

impl BudgetRange {
    pub fn display_name(&self) -> &'static str {
        match self {
            BudgetRange::Economy => "Economy",
            BudgetRange::Standard => "Standard",
            BudgetRange::Premium => "Premium",
            BudgetRange::Luxury => "Luxury",
        }
    }

    pub fn from_str_flexible(s: &str) -> PlanResult<Self> {
        match s.to_uppercase().trim() {
            "ECONOMY" | "LOW" | "BASIC" => Ok(BudgetRange::Economy),
            "STANDARD" | "MEDIUM" | "MID" => Ok(BudgetRange::Standard),
            "PREMIUM" | "HIGH" => Ok(BudgetRange::Premium),
            "LUXURY" => Ok(BudgetRange::Luxury),
            _ => Err(PlanError::invalid_input(
                "budget_range",
                s,
                "Expected Economy, Standard, Premium or Luxury",
            )),
        }
    }
}

/// Functional room kinds. The last three are produced by the packer for
/// circulation and never requested by a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoomKind {
    Living,
    Kitchen,
    MasterBedroom,
    Bedroom,
    Dining,
    Lounge,
    Study,
    Bathroom,
    Pooja,
    Utility,
    Store,
    Balcony,
    Staircase,
    Corridor,
    Passage,
}

impl RoomKind {
    /// Kinds a program can request
    pub const PROGRAMMABLE: [RoomKind; 12] = [
        RoomKind::Living,
        RoomKind::Kitchen,
        RoomKind::MasterBedroom,
        RoomKind::Bedroom,
        RoomKind::Dining,
        RoomKind::Lounge,
        RoomKind::Study,
        RoomKind::Bathroom,
        RoomKind::Pooja,
        RoomKind::Utility,
        RoomKind::Store,
        RoomKind::Balcony,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            RoomKind::Living => "Living Room",
            RoomKind::Kitchen => "Kitchen",
            RoomKind::MasterBedroom => "Master Bedroom",
            RoomKind::Bedroom => "Bedroom",
            RoomKind::Dining => "Dining",
            RoomKind::Lounge => "Family Lounge",
            RoomKind::Study => "Study",
            RoomKind::Bathroom => "Bathroom",
            RoomKind::Pooja => "Pooja Room",
            RoomKind::Utility => "Utility",
            RoomKind::Store => "Store",
            RoomKind::Balcony => "Balcony",
            RoomKind::Staircase => "Staircase",
            RoomKind::Corridor => "Corridor",
            RoomKind::Passage => "Passage",
        }
    }

    /// Circulation spaces: doors are routed through them first and they get
    /// no windows.
    pub fn is_circulation(&self) -> bool {
        matches!(self, RoomKind::Staircase | RoomKind::Corridor | RoomKind::Passage)
    }

    pub fn is_bedroom(&self) -> bool {
        matches!(self, RoomKind::MasterBedroom | RoomKind::Bedroom)
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Bedroom configuration
// ============================================================================

/// Bedroom count in the "<N>BHK" notation (bedrooms + hall + kitchen).
///
/// Any positive count parses; whether it is buildable is decided by the
/// program table in the rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BedroomConfig {
    pub bedrooms: u8,
}

impl BedroomConfig {
    pub fn new(bedrooms: u8) -> Self {
        BedroomConfig { bedrooms }
    }

    /// Parse "3BHK", "3 bhk", "3-BHK"
    pub fn parse(s: &str) -> PlanResult<Self> {
        let normalized = s.to_uppercase().replace([' ', '-', '_'], "");
        let count = normalized
            .strip_suffix("BHK")
            .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| PlanError::invalid_input("bedroom_config", s, "Expected the form <N>BHK, e.g. 3BHK"))?;
        let bedrooms: u8 = count
            .parse()
            .map_err(|_| PlanError::invalid_input("bedroom_config", s, "Bedroom count out of range"))?;
        if bedrooms == 0 {
            return Err(PlanError::invalid_input("bedroom_config", s, "At least one bedroom is required"));
        }
        Ok(BedroomConfig { bedrooms })
    }
}

impl fmt::Display for BedroomConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}BHK", self.bedrooms)
    }
}

impl TryFrom<String> for BedroomConfig {
    type Error = PlanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BedroomConfig::parse(&value)
    }
}

impl From<BedroomConfig> for String {
    fn from(value: BedroomConfig) -> Self {
        value.to_string()
    }
}

// ============================================================================
// Design input
// ============================================================================

/// Optional auxiliary rooms on the ground floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOptions {
    pub dining: bool,
    pub pooja: bool,
    pub utility: bool,
}

impl Default for RoomOptions {
    fn default() -> Self {
        RoomOptions {
            dining: true,
            pooja: true,
            utility: true,
        }
    }
}

impl RoomOptions {
    /// Whether a ground-floor room of this kind is wanted
    pub fn includes(&self, kind: RoomKind) -> bool {
        match kind {
            RoomKind::Dining => self.dining,
            RoomKind::Pooja => self.pooja,
            RoomKind::Utility => self.utility,
            _ => true,
        }
    }
}

/// The request record marshalled in by an outer caller (web form, CLI).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignInput {
    /// Land area in square feet
    pub land_size: f64,

    /// Road-facing compass direction of the plot
    pub facing: Direction,

    pub building_type: BuildingType,

    /// e.g. "3BHK"
    pub bedroom_config: BedroomConfig,

    /// Defaults to straight; ignored for single-floor designs
    #[serde(default)]
    pub staircase_type: Option<StaircaseType>,

    pub floors: u32,

    #[serde(default)]
    pub budget_range: BudgetRange,

    #[serde(default)]
    pub options: RoomOptions,
}

impl DesignInput {
    /// Convenience constructor with Standard budget and all auxiliary rooms.
    pub fn new(
        land_size: f64,
        facing: Direction,
        building_type: BuildingType,
        bedroom_config: BedroomConfig,
        floors: u32,
    ) -> Self {
        DesignInput {
            land_size,
            facing,
            building_type,
            bedroom_config,
            staircase_type: None,
            floors,
            budget_range: BudgetRange::default(),
            options: RoomOptions::default(),
        }
    }

    pub fn with_staircase(mut self, staircase_type: StaircaseType) -> Self {
        self.staircase_type = Some(staircase_type);
        self
    }

    pub fn with_budget(mut self, budget_range: BudgetRange) -> Self {
        self.budget_range = budget_range;
        self
    }

    /// Validate the plot-level fields. Runs before any rule lookup, so a
    /// non-positive land area never reaches allocation.
    pub fn validate(&self) -> PlanResult<()> {
        if !self.land_size.is_finite() || self.land_size <= 0.0 {
            return Err(PlanError::invalid_plot(
                "land_size",
                self.land_size.to_string(),
                "Land area must be a positive, finite number of square feet",
            ));
        }
        if self.floors == 0 {
            return Err(PlanError::invalid_plot(
                "floors",
                self.floors.to_string(),
                "At least one floor is required",
            ));
        }
        Ok(())
    }

    /// Validate and split into the immutable plot and program views.
    pub fn split(&self) -> PlanResult<(PlotSpec, ProgramSpec)> {
        self.validate()?;
        let plot = PlotSpec {
            land_area: self.land_size,
            facing: self.facing,
            road_side: self.facing,
            building_type: self.building_type,
            floors: self.floors,
        };
        let program = ProgramSpec {
            bedrooms: self.bedroom_config,
            staircase: (self.floors > 1).then(|| self.staircase_type.unwrap_or(StaircaseType::Straight)),
            budget: self.budget_range,
            options: self.options,
        };
        Ok((plot, program))
    }
}

/// Plot parameters, fixed for the whole design run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    /// Land area in square feet
    pub land_area: f64,
    pub facing: Direction,
    /// Side the road (and main entrance) is on
    pub road_side: Direction,
    pub building_type: BuildingType,
    pub floors: u32,
}

/// Room program, fixed for the whole design run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgramSpec {
    pub bedrooms: BedroomConfig,
    /// `None` for single-floor designs
    pub staircase: Option<StaircaseType>,
    pub budget: BudgetRange,
    pub options: RoomOptions,
}
