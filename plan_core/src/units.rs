//! # Unit Types
//!
//! Lightweight newtype wrappers for plan dimensions. Geometry is stored as raw
//! `f64` feet (field names carry a unit suffix where it is not obvious); these
//! wrappers are used at the edges where a value is formatted for a drawing or
//! a report. The grid snapping helpers live here too.
//!
//! ## Conventions
//!
//! - Length: feet (ft), inches (in)
//! - Area: square feet (sq ft)
//! - Buildable dimensions snap to a 0.5 ft grid
//!
//! ## Example
//!
//! ```rust
//! use plan_core::units::{Feet, Inches, SqFt};
//!
//! let riser: Inches = Feet(0.5).into();
//! assert_eq!(riser.0, 6.0);
//! assert_eq!(Feet(12.25).to_string(), "12.3'");
//! assert_eq!(SqFt(915.0).to_string(), "915 sq ft");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when comparing snapped dimensions
pub const EPSILON: f64 = 1e-6;

// ============================================================================
// Length Units
// ============================================================================

/// Length in feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feet(pub f64);

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

impl From<Feet> for Inches {
    fn from(ft: Feet) -> Self {
        Inches(ft.0 * 12.0)
    }
}

/// Dimension-line format: one decimal and a foot mark.
impl fmt::Display for Feet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}'", round_tenth(self.0))
    }
}

impl fmt::Display for Inches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}\"", round_tenth(self.0))
    }
}

// ============================================================================
// Area Units
// ============================================================================

/// Area in square feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqFt(pub f64);

impl fmt::Display for SqFt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} sq ft", self.0)
    }
}

// ============================================================================
// Grid Snapping
// ============================================================================

/// Round to the nearest tenth, the precision of dimension labels.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Largest grid multiple not above `value`.
pub fn snap_down(value: f64, grid: f64) -> f64 {
    (value / grid + EPSILON).floor() * grid
}

/// Smallest grid multiple not below `value`.
pub fn snap_up(value: f64, grid: f64) -> f64 {
    (value / grid - EPSILON).ceil() * grid
}

/// Nearest grid multiple.
pub fn snap(value: f64, grid: f64) -> f64 {
    (value / grid).round() * grid
}

/// True when two lengths agree within [`EPSILON`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feet_to_inches() {
        let inches: Inches = Feet(10.0).into();
        assert_eq!(inches.0, 120.0);
    }

    #[test]
    fn test_snapping() {
        assert_eq!(snap_down(30.64, 0.5), 30.5);
        assert_eq!(snap_down(30.0, 0.5), 30.0);
        assert_eq!(snap_up(4.01, 0.5), 4.5);
        assert_eq!(snap_up(4.5, 0.5), 4.5);
        assert_eq!(snap(10.26, 0.5), 10.5);
        // values that land on the grid after float error stay put
        assert_eq!(snap_down(0.1 + 0.2 + 2.7, 0.5), 3.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Feet(9.96).to_string(), "10.0'");
        assert_eq!(Feet(3.0).to_string(), "3.0'");
        assert_eq!(SqFt(1799.5).to_string(), "1800 sq ft");
        assert_eq!(Inches::from(Feet(10.0 / 17.0)).to_string(), "7.1\"");
    }
}
