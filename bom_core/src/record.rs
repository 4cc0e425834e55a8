//! # BOM Records
//!
//! A [`BomRecord`] is one persisted BOM: header metadata, a product spec
//! snapshot, the plan quantity and the material lines of its own category.
//! New BOMs are always created as a pair sharing a base id, `{base}-C` for
//! Cable and `{base}-M` for Moulding.
//!
//! On disk each record is a [`StoredBom`] row of the "Company BOM" collection.
//! The row keeps the category's lines as a JSON string under `Materials`,
//! plus the older `cableMaterials`/`mouldingMaterials` strings so rows written
//! by earlier tools still load.
//!
//! ```text
//! StoredBom
//! ├── id, category, bomCategory (legacy), revision
//! ├── header fields (formatNo, revisionNo, ...)  flattened
//! ├── spec fields (productCode, length, ...)     flattened
//! ├── plan
//! └── Materials / cableMaterials / mouldingMaterials   (JSON text)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::BomResult;
use crate::materials::{MaterialLine, MaterialRowStore};
use crate::product::{lenient, ProductSpec};

/// Production category a BOM belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BomCategory {
    Cable,
    Moulding,
    #[default]
    Unset,
}

impl BomCategory {
    /// Id suffix for records of this category
    pub fn suffix(self) -> &'static str {
        match self {
            BomCategory::Cable => "-C",
            BomCategory::Moulding => "-M",
            BomCategory::Unset => "",
        }
    }

    /// The sibling category, if this one is set
    pub fn other(self) -> Option<BomCategory> {
        match self {
            BomCategory::Cable => Some(BomCategory::Moulding),
            BomCategory::Moulding => Some(BomCategory::Cable),
            BomCategory::Unset => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BomCategory::Cable => "Cable",
            BomCategory::Moulding => "Moulding",
            BomCategory::Unset => "",
        }
    }

    /// Lenient parse; anything unrecognised is `Unset`.
    pub fn parse(raw: &str) -> BomCategory {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cable" => BomCategory::Cable,
            "moulding" | "molding" => BomCategory::Moulding,
            _ => BomCategory::Unset,
        }
    }
}

impl From<String> for BomCategory {
    fn from(raw: String) -> Self {
        BomCategory::parse(&raw)
    }
}

impl From<BomCategory> for String {
    fn from(category: BomCategory) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for BomCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BomCategory::Unset => write!(f, "Unset"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Document header printed on every BOM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BomHeader {
    #[serde(rename = "formatNo", deserialize_with = "lenient::text")]
    pub format_no: String,
    #[serde(rename = "revisionNo", deserialize_with = "lenient::text")]
    pub revision_no: String,
    #[serde(rename = "revisionDate", deserialize_with = "lenient::text")]
    pub revision_date: String,
    #[serde(rename = "bomDate", deserialize_with = "lenient::text")]
    pub bom_date: String,
    #[serde(rename = "preparedBy", deserialize_with = "lenient::text")]
    pub prepared_by: String,
    #[serde(rename = "approvedBy", deserialize_with = "lenient::text")]
    pub approved_by: String,
}

impl BomHeader {
    /// Format number, revision number and BOM date are filled in
    pub fn is_complete(&self) -> bool {
        [&self.format_no, &self.revision_no, &self.bom_date]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// One BOM of a single category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BomRecord {
    pub id: String,
    pub category: BomCategory,
    pub header: BomHeader,
    pub spec: ProductSpec,
    /// Plan quantity as entered
    pub plan: String,
    /// Bumped on every successful update
    pub revision: u64,
    pub cable_materials: MaterialRowStore,
    pub moulding_materials: MaterialRowStore,
}

impl BomRecord {
    /// Id with the category suffix removed
    pub fn base_id(&self) -> &str {
        base_id(&self.id)
    }

    /// Lines of the given category
    pub fn materials(&self, category: BomCategory) -> &MaterialRowStore {
        match category {
            BomCategory::Moulding => &self.moulding_materials,
            _ => &self.cable_materials,
        }
    }

    /// Lines of the record's own category (cable lines for unset records)
    pub fn own_materials(&self) -> &MaterialRowStore {
        self.materials(self.category)
    }

    /// Empty the list that does not belong to this record's category.
    pub fn enforce_category(&mut self) {
        match self.category {
            BomCategory::Cable => self.moulding_materials.clear(),
            BomCategory::Moulding => self.cable_materials.clear(),
            BomCategory::Unset => {}
        }
    }
}

/// Strip a trailing `-C` / `-M` category suffix.
pub fn base_id(id: &str) -> &str {
    id.strip_suffix(BomCategory::Cable.suffix())
        .or_else(|| id.strip_suffix(BomCategory::Moulding.suffix()))
        .unwrap_or(id)
}

/// Persisted row shape of a BOM in the collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredBom {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,

    #[serde(deserialize_with = "lenient::text")]
    pub category: String,

    /// Older rows carry the category under this name only
    #[serde(rename = "bomCategory", deserialize_with = "lenient::text")]
    pub bom_category: String,

    pub revision: u64,

    #[serde(flatten)]
    pub header: BomHeader,

    #[serde(flatten)]
    pub spec: ProductSpec,

    #[serde(deserialize_with = "lenient::text")]
    pub plan: String,

    /// JSON array of the category's lines
    #[serde(rename = "Materials", deserialize_with = "lenient::text")]
    pub materials: String,

    #[serde(rename = "cableMaterials", deserialize_with = "lenient::text")]
    pub cable_materials: String,

    #[serde(rename = "mouldingMaterials", deserialize_with = "lenient::text")]
    pub moulding_materials: String,
}

impl StoredBom {
    /// Encode a record for persistence.
    pub fn from_record(record: &BomRecord) -> BomResult<StoredBom> {
        let mut record = record.clone();
        record.enforce_category();

        Ok(StoredBom {
            id: record.id.clone(),
            category: record.category.as_str().to_string(),
            bom_category: record.category.as_str().to_string(),
            revision: record.revision,
            header: record.header.clone(),
            spec: record.spec.clone(),
            plan: record.plan.clone(),
            materials: serde_json::to_string(record.own_materials())?,
            cable_materials: serde_json::to_string(&record.cable_materials)?,
            moulding_materials: serde_json::to_string(&record.moulding_materials)?,
        })
    }

    /// Category from `category`, falling back to the legacy `bomCategory`.
    pub fn resolved_category(&self) -> BomCategory {
        match BomCategory::parse(&self.category) {
            BomCategory::Unset => BomCategory::parse(&self.bom_category),
            category => category,
        }
    }

    /// Decode into a record. Material JSON that does not parse is treated as
    /// an empty list.
    pub fn to_record(&self) -> BomRecord {
        let category = self.resolved_category();

        let own = parse_lines(&self.materials, &self.id, "Materials");
        let cable = || parse_lines(&self.cable_materials, &self.id, "cableMaterials");
        let moulding = || parse_lines(&self.moulding_materials, &self.id, "mouldingMaterials");

        let (cable_materials, moulding_materials) = match category {
            BomCategory::Cable => (own.filter(|l| !l.is_empty()).or_else(cable), None),
            BomCategory::Moulding => (None, own.filter(|l| !l.is_empty()).or_else(moulding)),
            BomCategory::Unset => (cable(), moulding()),
        };

        BomRecord {
            id: self.id.clone(),
            category,
            header: self.header.clone(),
            spec: self.spec.clone(),
            plan: self.plan.clone(),
            revision: self.revision,
            cable_materials: MaterialRowStore::from_lines(cable_materials.unwrap_or_default()),
            moulding_materials: MaterialRowStore::from_lines(moulding_materials.unwrap_or_default()),
        }
    }
}

/// Parse a JSON-encoded line list. Blank text is `None`; malformed text is
/// logged and also `None`.
fn parse_lines(raw: &str, id: &str, field: &str) -> Option<Vec<MaterialLine>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<Vec<MaterialLine>>(raw) {
        Ok(lines) => Some(lines),
        Err(e) => {
            tracing::warn!(bom = id, field, error = %e, "unreadable material list, treating as empty");
            None
        }
    }
}
