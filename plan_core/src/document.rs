//! # Design Documents
//!
//! A [`DesignDocument`] wraps a generated [`Design`] with the header needed
//! to persist it. Documents serialize to `.plan` files as human-readable JSON.
//!
//! ```text
//! DesignDocument
//! ├── meta: DocumentMeta (schema version, id, title, timestamps)
//! └── design: Design (input, regulation, floors, cost, analysis)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use plan_core::design::generate;
//! use plan_core::document::DesignDocument;
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
//! let doc = DesignDocument::new("Plot 14, East Avenue", design);
//!
//! let json = serde_json::to_string_pretty(&doc).unwrap();
//! assert!(json.contains("Plot 14"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::design::Design;

/// Current schema version for `.plan` files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// File extension for design documents
pub const FILE_EXTENSION: &str = "plan";

/// Persisted design with its header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    pub meta: DocumentMeta,
    pub design: Design,
}

/// Header stored ahead of the design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Stable identity across saves
    pub id: Uuid,

    pub title: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

impl DesignDocument {
    /// Wrap a design in a fresh document.
    pub fn new(title: impl Into<String>, design: Design) -> Self {
        let now = Utc::now();
        DesignDocument {
            meta: DocumentMeta {
                version: SCHEMA_VERSION.to_string(),
                id: Uuid::new_v4(),
                title: title.into(),
                created: now,
                modified: now,
            },
            design,
        }
    }

    /// Swap in a regenerated design, keeping id and creation time.
    pub fn replace_design(&mut self, design: Design) -> Design {
        self.touch();
        std::mem::replace(&mut self.design, design)
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.meta.title = title.into();
        self.touch();
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::generate;
    use crate::geometry::Direction;
    use crate::program::{BedroomConfig, BuildingType, DesignInput};
    use crate::rules::RuleTables;

    fn design() -> Design {
        let rules = RuleTables::builtin().unwrap();
        let input = DesignInput::new(
            1200.0,
            Direction::East,
            BuildingType::IndependentHouse,
            BedroomConfig::new(3),
            2,
        );
        generate(&input, &rules).unwrap()
    }

    #[test]
    fn test_new_document() {
        let doc = DesignDocument::new("House", design());
        assert_eq!(doc.meta.version, SCHEMA_VERSION);
        assert_eq!(doc.meta.title, "House");
        assert_eq!(doc.meta.created, doc.meta.modified);
    }

    #[test]
    fn test_replace_design_keeps_identity() {
        let mut doc = DesignDocument::new("House", design());
        let id = doc.meta.id;
        let created = doc.meta.created;
        let old = doc.replace_design(design());
        assert_eq!(old.floors.len(), doc.design.floors.len());
        assert_eq!(doc.meta.id, id);
        assert_eq!(doc.meta.created, created);
        assert!(doc.meta.modified >= created);
    }

    #[test]
    fn test_json_roundtrip() {
        let doc = DesignDocument::new("Round trip", design());
        let json = serde_json::to_string(&doc).unwrap();
        let back: DesignDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
