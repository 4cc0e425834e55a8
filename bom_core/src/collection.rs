//! # BOM Collection File
//!
//! The `BomCollection` struct is the root container written to disk by
//! [`crate::file_io`]. It serializes to human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! BomCollection
//! ├── meta: CollectionMetadata (schema version, name, timestamps)
//! ├── settings: EngineSettings (id prefix, id attempts, default header)
//! └── rows: Vec<StoredBom> (positional, the "Company BOM" rows)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use bom_core::collection::BomCollection;
//! use bom_core::settings::EngineSettings;
//!
//! let collection = BomCollection::new(EngineSettings::default());
//! let json = serde_json::to_string_pretty(&collection).unwrap();
//! assert!(json.contains("Company BOM"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::StoredBom;
use crate::settings::EngineSettings;

/// Current schema version for collection files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root collection container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomCollection {
    pub meta: CollectionMetadata,

    #[serde(default)]
    pub settings: EngineSettings,

    /// BOM rows in stored order; positions are row indexes
    #[serde(default)]
    pub rows: Vec<StoredBom>,
}

impl BomCollection {
    /// Create an empty collection named after `settings.collection`.
    pub fn new(settings: EngineSettings) -> Self {
        let now = Utc::now();
        BomCollection {
            meta: CollectionMetadata {
                version: SCHEMA_VERSION.to_string(),
                name: settings.collection.clone(),
                created: now,
                modified: now,
            },
            settings,
            rows: Vec::new(),
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl Default for BomCollection {
    fn default() -> Self {
        BomCollection::new(EngineSettings::default())
    }
}

/// Collection metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Collection name
    pub name: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}
