//! # BOM Form
//!
//! The in-progress state of the BOM wizard. A form is either creating a new
//! BOM pair (both material lists editable) or editing one persisted record
//! (only that record's category is present).
//!
//! ## Example
//!
//! ```rust
//! use bom_core::form::{BomForm, FormMode};
//! use bom_core::settings::EngineSettings;
//!
//! let form = BomForm::new_create(&EngineSettings::default());
//! assert_eq!(form.mode, FormMode::Create);
//! assert!(form.validate().is_err()); // nothing filled in yet
//! ```

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::errors::{BomError, BomResult};
use crate::materials::MaterialRowStore;
use crate::product::{lenient, PlanQuantity, ProductSpec, SpecField};
use crate::record::{BomCategory, BomHeader, BomRecord};
use crate::settings::EngineSettings;

/// Whether the wizard creates a new pair or edits an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormMode {
    #[default]
    Create,
    Edit,
}

/// Wizard state shared by the recalculation reducer, the step gate and the
/// lifecycle manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BomForm {
    pub mode: FormMode,
    /// Category being edited; `Unset` while creating
    pub category: BomCategory,
    /// Base id for a new pair; blank means "generate one"
    pub base_id: String,
    /// Revision of the record when it was opened for editing
    pub opened_revision: u64,
    pub header: BomHeader,
    pub spec: ProductSpec,
    /// Plan quantity as entered
    #[serde(deserialize_with = "lenient::text")]
    pub plan: String,
    pub cable_materials: MaterialRowStore,
    pub moulding_materials: MaterialRowStore,
}

impl BomForm {
    /// Blank create-mode form with today's date and the default header.
    pub fn new_create(settings: &EngineSettings) -> Self {
        let mut header = settings.default_header.clone();
        if header.bom_date.trim().is_empty() {
            header.bom_date = Local::now().date_naive().to_string();
        }
        BomForm {
            mode: FormMode::Create,
            header,
            ..BomForm::default()
        }
    }

    /// Edit-mode form over a persisted record. Only the record's own
    /// category is loaded.
    pub fn edit(record: &BomRecord) -> Self {
        let mut form = BomForm {
            mode: FormMode::Edit,
            category: record.category,
            base_id: record.base_id().to_string(),
            opened_revision: record.revision,
            header: record.header.clone(),
            spec: record.spec.clone(),
            plan: record.plan.clone(),
            cable_materials: record.cable_materials.clone(),
            moulding_materials: record.moulding_materials.clone(),
        };
        if let Some(hidden) = form.hidden_category() {
            form.materials_mut(hidden).clear();
        }
        form
    }

    /// The category this form may not touch (Edit mode only).
    pub fn hidden_category(&self) -> Option<BomCategory> {
        match self.mode {
            FormMode::Edit => self.category.other(),
            FormMode::Create => None,
        }
    }

    /// Whether edits to `category` are allowed.
    pub fn allows(&self, category: BomCategory) -> bool {
        category != BomCategory::Unset && self.hidden_category() != Some(category)
    }

    pub fn materials(&self, category: BomCategory) -> &MaterialRowStore {
        match category {
            BomCategory::Moulding => &self.moulding_materials,
            _ => &self.cable_materials,
        }
    }

    pub fn materials_mut(&mut self, category: BomCategory) -> &mut MaterialRowStore {
        match category {
            BomCategory::Moulding => &mut self.moulding_materials,
            _ => &mut self.cable_materials,
        }
    }

    pub fn plan_quantity(&self) -> Option<PlanQuantity> {
        PlanQuantity::parse(&self.plan)
    }

    /// Check the form for submission and report every problem at once.
    ///
    /// Create mode needs at least one material across both lists; Edit mode
    /// needs at least one in the edited category.
    pub fn validate(&self) -> BomResult<()> {
        let mut problems = Vec::new();

        if !self.spec.is_present(SpecField::ProductDescription) {
            problems.push("Product description is required".to_string());
        }
        if self.plan_quantity().is_none() {
            problems.push(format!(
                "Plan quantity must be a positive whole number (got '{}')",
                self.plan.trim()
            ));
        }

        let has_materials = match (self.mode, self.category) {
            (FormMode::Edit, BomCategory::Cable) => self.cable_materials.has_materials(),
            (FormMode::Edit, BomCategory::Moulding) => self.moulding_materials.has_materials(),
            _ => self.cable_materials.has_materials() || self.moulding_materials.has_materials(),
        };
        if !has_materials {
            problems.push(match (self.mode, self.category) {
                (FormMode::Edit, BomCategory::Cable) => "At least one cable material is required".to_string(),
                (FormMode::Edit, BomCategory::Moulding) => {
                    "At least one moulding material is required".to_string()
                }
                _ => "At least one cable or moulding material is required".to_string(),
            });
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(BomError::validation(problems))
        }
    }
}
