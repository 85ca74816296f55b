//! # Space Analysis
//!
//! Summarizes how a generated design uses its floor area: shares by
//! category, how close key rooms come to their ideal sizes, and a 0-100
//! utilization score with a letter grade and short recommendations.

use serde::{Deserialize, Serialize};

use crate::floor_plan::FloorPlan;
use crate::program::RoomKind;
use crate::rules::RuleTables;

const MAX_RECOMMENDATIONS: usize = 8;

/// Category used for the area distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpaceCategory {
    Living,
    Bedrooms,
    Service,
    Wet,
    Circulation,
    Outdoor,
}

impl SpaceCategory {
    pub const ALL: [SpaceCategory; 6] = [
        SpaceCategory::Living,
        SpaceCategory::Bedrooms,
        SpaceCategory::Service,
        SpaceCategory::Wet,
        SpaceCategory::Circulation,
        SpaceCategory::Outdoor,
    ];

    pub fn of(kind: RoomKind) -> Self {
        match kind {
            RoomKind::Living | RoomKind::Dining | RoomKind::Lounge => SpaceCategory::Living,
            RoomKind::MasterBedroom | RoomKind::Bedroom | RoomKind::Study => SpaceCategory::Bedrooms,
            RoomKind::Kitchen | RoomKind::Utility | RoomKind::Store | RoomKind::Pooja => SpaceCategory::Service,
            RoomKind::Bathroom => SpaceCategory::Wet,
            RoomKind::Staircase | RoomKind::Corridor | RoomKind::Passage => SpaceCategory::Circulation,
            RoomKind::Balcony => SpaceCategory::Outdoor,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SpaceCategory::Living => "Living spaces",
            SpaceCategory::Bedrooms => "Bedrooms",
            SpaceCategory::Service => "Service",
            SpaceCategory::Wet => "Wet areas",
            SpaceCategory::Circulation => "Circulation",
            SpaceCategory::Outdoor => "Outdoor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: SpaceCategory,
    pub area: f64,
    /// Percent of all room area
    pub percent: f64,
}

/// Result of [`analyze`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceAnalysis {
    pub distribution: Vec<CategoryShare>,
    /// Mean of min(actual / ideal, 1) over rooms with an ideal size
    pub room_size_efficiency: f64,
    pub circulation_percent: f64,
    pub utilization_score: f64,
    pub grade: String,
    pub recommendations: Vec<String>,
}

impl SpaceAnalysis {
    pub fn percent_of(&self, category: SpaceCategory) -> f64 {
        self.distribution
            .iter()
            .find(|share| share.category == category)
            .map_or(0.0, |share| share.percent)
    }
}

/// Analyze a design's floors. `efficiency_ratio` is carpet over built area.
pub fn analyze(floors: &[FloorPlan], efficiency_ratio: f64, rules: &RuleTables) -> SpaceAnalysis {
    let rooms = || floors.iter().flat_map(|f| f.rooms().iter());

    let total: f64 = rooms().map(|r| r.area()).sum();
    let distribution: Vec<CategoryShare> = SpaceCategory::ALL
        .iter()
        .map(|category| {
            let area: f64 = rooms().filter(|r| SpaceCategory::of(r.kind) == *category).map(|r| r.area()).sum();
            CategoryShare {
                category: *category,
                area,
                percent: if total > 0.0 { area / total * 100.0 } else { 0.0 },
            }
        })
        .collect();

    // bathrooms count once, by their average
    let mut scores = Vec::new();
    let mut bath_areas = Vec::new();
    for room in rooms() {
        let Some(ideal) = rules.room(room.kind).ok().and_then(|s| s.ideal_area_sqft) else {
            continue;
        };
        if room.kind == RoomKind::Bathroom {
            bath_areas.push(room.area());
        } else {
            scores.push((room.area() / ideal).min(1.0));
        }
    }
    if !bath_areas.is_empty() {
        if let Some(ideal) = rules.room(RoomKind::Bathroom).ok().and_then(|s| s.ideal_area_sqft) {
            let mean = bath_areas.iter().sum::<f64>() / bath_areas.len() as f64;
            scores.push((mean / ideal).min(1.0));
        }
    }
    let room_size_efficiency = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    let mut analysis = SpaceAnalysis {
        distribution,
        room_size_efficiency,
        circulation_percent: 0.0,
        utilization_score: 0.0,
        grade: String::new(),
        recommendations: Vec::new(),
    };
    analysis.circulation_percent = analysis.percent_of(SpaceCategory::Circulation);
    analysis.utilization_score = utilization_score(efficiency_ratio, room_size_efficiency, analysis.circulation_percent);
    analysis.grade = grade(analysis.utilization_score).to_string();
    analysis.recommendations = recommendations(&analysis, efficiency_ratio, floors, rules);
    analysis
}

fn utilization_score(efficiency_ratio: f64, room_size_efficiency: f64, circulation_percent: f64) -> f64 {
    let efficiency_points = if efficiency_ratio >= 0.75 {
        40.0
    } else if efficiency_ratio >= 0.65 {
        30.0
    } else if efficiency_ratio >= 0.55 {
        20.0
    } else {
        10.0
    };
    let circulation_points = if (8.0..=20.0).contains(&circulation_percent) {
        20.0
    } else {
        10.0
    };
    (efficiency_points + 40.0 * room_size_efficiency + circulation_points).min(100.0)
}

pub fn grade(score: f64) -> &'static str {
    match score {
        s if s >= 85.0 => "A+",
        s if s >= 80.0 => "A",
        s if s >= 75.0 => "B+",
        s if s >= 70.0 => "B",
        s if s >= 65.0 => "C+",
        s if s >= 60.0 => "C",
        _ => "D",
    }
}

fn recommendations(analysis: &SpaceAnalysis, efficiency_ratio: f64, floors: &[FloorPlan], rules: &RuleTables) -> Vec<String> {
    let mut out = Vec::new();

    let circulation = analysis.circulation_percent;
    if circulation > 20.0 {
        out.push("Reduce circulation space by optimizing corridor widths and layout".to_string());
    } else if circulation < 8.0 {
        out.push("Increase circulation space for better movement flow".to_string());
    }

    let living = analysis.percent_of(SpaceCategory::Living);
    if living < 25.0 {
        out.push("Consider increasing living room size for better social interaction".to_string());
    } else if living > 40.0 {
        out.push("Living space is oversized - consider adding a dining area or study".to_string());
    }

    let service = analysis.percent_of(SpaceCategory::Service);
    if service < 10.0 {
        out.push("Kitchen and utility areas may be undersized".to_string());
    } else if service > 20.0 {
        out.push("Service areas are oversized - optimize the kitchen layout".to_string());
    }

    if analysis.percent_of(SpaceCategory::Outdoor) < 5.0 {
        out.push("Consider adding a balcony or terrace for outdoor access".to_string());
    }
    if efficiency_ratio < 0.65 {
        out.push("Improve the carpet area ratio by reducing wall runs or simplifying the layout".to_string());
    }
    if analysis.room_size_efficiency < 0.7 {
        out.push("Adjust room sizes to better match functional requirements".to_string());
    }

    for room in floors.iter().flat_map(|f| f.rooms()) {
        let Ok(standard) = rules.room(room.kind) else {
            continue;
        };
        if room.area() < standard.min_area_sqft {
            out.push(format!("{} is undersized - consider expanding", room.label));
        } else if room.area() > standard.max_area_sqft {
            out.push(format!("{} is oversized - space could be better utilized", room.label));
        }
    }

    if out.is_empty() {
        out.push("Space utilization is optimal for the given requirements".to_string());
    }
    out.truncate(MAX_RECOMMENDATIONS);
    out
}
