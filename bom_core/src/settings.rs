//! Engine settings stored with each BOM collection.

use serde::{Deserialize, Serialize};

use crate::record::BomHeader;

/// Name of the persisted collection BOM rows live in
pub const DEFAULT_COLLECTION: &str = "Company BOM";

/// Collection-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Collection name shown to users
    pub collection: String,

    /// Prefix of generated base ids (`BOM` gives `BOM-0427`)
    pub id_prefix: String,

    /// Random id attempts before falling back to a timestamp id
    pub max_id_attempts: u32,

    /// Header values new forms start with
    pub default_header: BomHeader,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            collection: DEFAULT_COLLECTION.to_string(),
            id_prefix: "BOM".to_string(),
            max_id_attempts: 100,
            default_header: BomHeader {
                format_no: "F/PRD/BOM".to_string(),
                revision_no: "00".to_string(),
                ..BomHeader::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.collection, "Company BOM");
        assert_eq!(settings.max_id_attempts, 100);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: EngineSettings = serde_json::from_str(r#"{"id_prefix":"CBL"}"#).unwrap();
        assert_eq!(settings.id_prefix, "CBL");
        assert_eq!(settings.max_id_attempts, 100);
        assert_eq!(settings.default_header.revision_no, "00");
    }
}
