//! # Error Types
//!
//! Structured error types for plan_core. Every failure carries enough context
//! (field, room kind, zone, attempted grid cells, entity id) to reproduce it
//! deterministically, and serializes to JSON for callers that marshal results
//! over a wire.
//!
//! ## Taxonomy
//!
//! - [`PlanError::InvalidPlot`] - plot geometry cannot satisfy the regulations
//! - [`PlanError::UnsupportedConfiguration`] - no rule-table entry for the program
//! - [`PlanError::LayoutInfeasible`] - a floor cannot hold its required rooms
//! - [`PlanError::Render`] - geometry invariant violated at render time (a defect)
//!
//! ## Example
//!
//! ```rust
//! use plan_core::errors::{PlanError, PlanResult};
//!
//! fn validate_land(land_sqft: f64) -> PlanResult<()> {
//!     if !(land_sqft > 0.0) {
//!         return Err(PlanError::invalid_plot(
//!             "land_size",
//!             land_sqft.to_string(),
//!             "Land area must be a positive number",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(validate_land(0.0).unwrap_err().error_code(), "INVALID_PLOT");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for plan_core operations
pub type PlanResult<T> = Result<T, PlanError>;

/// Structured error type for design generation.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum PlanError {
    /// An input value is malformed (unparseable enum, bad bedroom string, ...)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Plot geometry cannot satisfy the regulations
    #[error("Invalid plot: '{field}' = {value} - {reason}")]
    InvalidPlot {
        field: String,
        value: String,
        reason: String,
    },

    /// The requested program has no matching rule-table entry
    #[error("Unsupported configuration: '{field}' = {value} - {reason}")]
    UnsupportedConfiguration {
        field: String,
        value: String,
        reason: String,
    },

    /// The packer could not place a required room on a floor
    #[error("Layout infeasible on floor {floor}: {room_kind} (zone {zone}) - {reason}; tried cells [{}]", .attempted_cells.join(", "))]
    LayoutInfeasible {
        floor: usize,
        room_kind: String,
        zone: String,
        attempted_cells: Vec<String>,
        reason: String,
    },

    /// A floor plan failed one of its construction checks
    #[error("Floor plan invariant violated on floor {floor}: {check} - {detail}")]
    InvariantViolation {
        floor: usize,
        check: String,
        detail: String,
    },

    /// Geometry that cannot be drawn reached the renderer
    #[error("Render error on floor {floor} at {entity}: {reason}")]
    Render {
        floor: usize,
        entity: String,
        reason: String,
    },

    /// Rule tables could not be parsed or are inconsistent
    #[error("Rule table error: {reason}")]
    RuleTable { reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl PlanError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidPlot error
    pub fn invalid_plot(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanError::InvalidPlot {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedConfiguration error
    pub fn unsupported(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanError::UnsupportedConfiguration {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a LayoutInfeasible error
    pub fn layout_infeasible(
        floor: usize,
        room_kind: impl Into<String>,
        zone: impl Into<String>,
        attempted_cells: Vec<String>,
        reason: impl Into<String>,
    ) -> Self {
        PlanError::LayoutInfeasible {
            floor,
            room_kind: room_kind.into(),
            zone: zone.into(),
            attempted_cells,
            reason: reason.into(),
        }
    }

    /// Create an InvariantViolation error
    pub fn invariant(floor: usize, check: impl Into<String>, detail: impl Into<String>) -> Self {
        PlanError::InvariantViolation {
            floor,
            check: check.into(),
            detail: detail.into(),
        }
    }

    /// Create a Render error
    pub fn render(floor: usize, entity: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanError::Render {
            floor,
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Create a RuleTable error
    pub fn rule_table(reason: impl Into<String>) -> Self {
        PlanError::RuleTable { reason: reason.into() }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        PlanError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        PlanError::SerializationError { reason: reason.into() }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlanError::FileLocked { .. })
    }

    /// Errors that can only come from a bug upstream, never from user input.
    pub fn is_defect(&self) -> bool {
        matches!(self, PlanError::Render { .. } | PlanError::InvariantViolation { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PlanError::InvalidInput { .. } => "INVALID_INPUT",
            PlanError::InvalidPlot { .. } => "INVALID_PLOT",
            PlanError::UnsupportedConfiguration { .. } => "UNSUPPORTED_CONFIGURATION",
            PlanError::LayoutInfeasible { .. } => "LAYOUT_INFEASIBLE",
            PlanError::InvariantViolation { .. } => "INVARIANT_VIOLATION",
            PlanError::Render { .. } => "RENDER_ERROR",
            PlanError::RuleTable { .. } => "RULE_TABLE_ERROR",
            PlanError::FileError { .. } => "FILE_ERROR",
            PlanError::FileLocked { .. } => "FILE_LOCKED",
            PlanError::SerializationError { .. } => "SERIALIZATION_ERROR",
            PlanError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}
