//! # Plan Geometry
//!
//! Compass directions and the axis-aligned primitives every later stage works
//! with. Plan-local coordinates are in feet with the origin at the
//! road-facing (front) left corner of the buildable envelope: `x` grows to the
//! right along the road, `y` grows away from the road.
//!
//! ## Zone rotation
//!
//! Placement preferences are written against true compass directions. A plot
//! facing some direction has its road on that side, so expressing a compass
//! zone in the plan frame is a pure rotation of the 8-direction ring that brings
//! the facing direction to plan-South (`y = 0`):
//!
//! ```rust
//! use plan_core::geometry::Direction;
//!
//! // East-facing plot: the road (East) is the plan's front edge.
//! let facing = Direction::East;
//! assert_eq!(Direction::East.to_plan(facing), Direction::South);
//! // Kitchen prefers South-East, which lands on the front-left corner.
//! assert_eq!(Direction::SouthEast.to_plan(facing), Direction::SouthWest);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{PlanError, PlanResult};
use crate::units::EPSILON;

// ============================================================================
// Direction
// ============================================================================

/// One of the eight compass directions, clockwise from North.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "N", alias = "North")]
    North,
    #[serde(rename = "NE", alias = "NorthEast")]
    NorthEast,
    #[serde(rename = "E", alias = "East")]
    East,
    #[serde(rename = "SE", alias = "SouthEast")]
    SouthEast,
    #[serde(rename = "S", alias = "South")]
    South,
    #[serde(rename = "SW", alias = "SouthWest")]
    SouthWest,
    #[serde(rename = "W", alias = "West")]
    West,
    #[serde(rename = "NW", alias = "NorthWest")]
    NorthWest,
}

impl Direction {
    /// All directions in clockwise order starting at North
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Position on the clockwise ring (North = 0)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction at a ring position (taken modulo 8)
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 8]
    }

    /// Rotate clockwise by `steps` eighth-turns (negative rotates counter-clockwise).
    pub fn rotate(self, steps: i32) -> Self {
        let index = (self.index() as i32 + steps).rem_euclid(8);
        Self::from_index(index as usize)
    }

    pub fn opposite(self) -> Self {
        self.rotate(4)
    }

    /// Number of clockwise steps that carries `facing` onto South.
    pub fn steps_to_front(facing: Direction) -> i32 {
        (4 - facing.index() as i32).rem_euclid(8)
    }

    /// Express this compass direction in the plan frame of a plot facing `facing`.
    pub fn to_plan(self, facing: Direction) -> Self {
        self.rotate(Self::steps_to_front(facing))
    }

    /// Inverse of [`Direction::to_plan`].
    pub fn from_plan(self, facing: Direction) -> Self {
        self.rotate(-Self::steps_to_front(facing))
    }

    /// Candidate order when widening a search around this direction: itself,
    /// its neighbors alternating clockwise/counter-clockwise at increasing
    /// distance, then the opposite direction last.
    pub fn search_order(self) -> [Direction; 8] {
        [
            self,
            self.rotate(1),
            self.rotate(-1),
            self.rotate(2),
            self.rotate(-2),
            self.rotate(3),
            self.rotate(-3),
            self.opposite(),
        ]
    }

    /// Compass bearing in degrees, clockwise from North
    pub fn bearing_degrees(self) -> f64 {
        self.index() as f64 * 45.0
    }

    pub fn is_corner(self) -> bool {
        self.index() % 2 == 1
    }

    /// Short code ("N", "SE", ...)
    pub fn code(&self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::NorthEast => "NE",
            Direction::East => "E",
            Direction::SouthEast => "SE",
            Direction::South => "S",
            Direction::SouthWest => "SW",
            Direction::West => "W",
            Direction::NorthWest => "NW",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::NorthEast => "North-East",
            Direction::East => "East",
            Direction::SouthEast => "South-East",
            Direction::South => "South",
            Direction::SouthWest => "South-West",
            Direction::West => "West",
            Direction::NorthWest => "North-West",
        }
    }

    /// Parse from common string representations ("E", "east", "North-East", "north_east")
    pub fn from_str_flexible(s: &str) -> PlanResult<Self> {
        match s.to_uppercase().replace([' ', '_', '-'], "").as_str() {
            "N" | "NORTH" => Ok(Direction::North),
            "NE" | "NORTHEAST" => Ok(Direction::NorthEast),
            "E" | "EAST" => Ok(Direction::East),
            "SE" | "SOUTHEAST" => Ok(Direction::SouthEast),
            "S" | "SOUTH" => Ok(Direction::South),
            "SW" | "SOUTHWEST" => Ok(Direction::SouthWest),
            "W" | "WEST" => Ok(Direction::West),
            "NW" | "NORTHWEST" => Ok(Direction::NorthWest),
            _ => Err(PlanError::invalid_input(
                "facing",
                s,
                "Expected one of N, NE, E, SE, S, SW, W, NW",
            )),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Points, segments, rectangles
// ============================================================================

/// A point in plan-local feet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Orientation of an axis-aligned segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Runs along x (constant y)
    Horizontal,
    /// Runs along y (constant x)
    Vertical,
}

/// Axis-aligned rectangle: origin is the minimum corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub depth: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, depth: f64) -> Self {
        Rect { x, y, width, depth }
    }

    pub fn area(&self) -> f64 {
        self.width * self.depth
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.depth
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.depth / 2.0)
    }

    /// True when the interiors intersect. Rectangles that only touch along an
    /// edge (a shared wall) do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.max_x() - EPSILON
            && other.x < self.max_x() - EPSILON
            && self.y < other.max_y() - EPSILON
            && other.y < self.max_y() - EPSILON
    }

    /// True when `other` lies entirely inside this rectangle (edges may touch).
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.max_x() <= self.max_x() + EPSILON
            && other.max_y() <= self.max_y() + EPSILON
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.depth.is_finite()
    }

    /// The rectangle shrunk by `amount` on every side (never below zero size).
    pub fn inset(&self, amount: f64) -> Rect {
        let width = (self.width - 2.0 * amount).max(0.0);
        let depth = (self.depth - 2.0 * amount).max(0.0);
        Rect::new(self.x + amount, self.y + amount, width, depth)
    }
}
