//! # Wizard Step Gate
//!
//! The BOM wizard has five ordered steps. Which of them can be reached
//! depends on what the form already holds, and in Edit mode on the record's
//! category: editing a Cable BOM hides the Moulding step and vice versa.
//!
//! ```text
//! Create:          Header → ProductSpec → Production → CableMaterials → MouldingMaterials
//! Edit (Cable):    Header → ProductSpec → Production → CableMaterials
//! Edit (Moulding): Header → ProductSpec → Production ──────────────────→ MouldingMaterials
//! ```
//!
//! ## Example
//!
//! ```rust
//! use bom_core::form::{BomForm, FormMode};
//! use bom_core::record::BomCategory;
//! use bom_core::steps::{Step, StepGate};
//!
//! let gate = StepGate::new(FormMode::Edit, BomCategory::Cable);
//! assert_eq!(gate.terminal(), Step::CableMaterials);
//! assert!(!gate.is_visible(Step::MouldingMaterials));
//! ```

use serde::{Deserialize, Serialize};

use crate::form::{BomForm, FormMode};
use crate::product::SpecField;
use crate::record::BomCategory;

/// Wizard steps in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    Header = 0,
    ProductSpec = 1,
    Production = 2,
    CableMaterials = 3,
    MouldingMaterials = 4,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Header,
        Step::ProductSpec,
        Step::Production,
        Step::CableMaterials,
        Step::MouldingMaterials,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Step> {
        Step::ALL.get(index).copied()
    }

    /// Material step owned by a category
    pub fn for_category(category: BomCategory) -> Option<Step> {
        match category {
            BomCategory::Cable => Some(Step::CableMaterials),
            BomCategory::Moulding => Some(Step::MouldingMaterials),
            BomCategory::Unset => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Header => "BOM Header",
            Step::ProductSpec => "Product Specification",
            Step::Production => "Production Plan",
            Step::CableMaterials => "Cable Materials",
            Step::MouldingMaterials => "Moulding Materials",
        }
    }
}

/// Navigation state of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepGate {
    active: Step,
    mode: FormMode,
    category: BomCategory,
}

impl StepGate {
    pub fn new(mode: FormMode, category: BomCategory) -> Self {
        StepGate {
            active: Step::Header,
            mode,
            category,
        }
    }

    /// Gate matching a form's mode and category
    pub fn for_form(form: &BomForm) -> Self {
        StepGate::new(form.mode, form.category)
    }

    pub fn active(&self) -> Step {
        self.active
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn category(&self) -> BomCategory {
        self.category
    }

    /// The sibling material step hidden while editing one category
    pub fn hidden_step(&self) -> Option<Step> {
        match self.mode {
            FormMode::Edit => self.category.other().and_then(Step::for_category),
            FormMode::Create => None,
        }
    }

    pub fn is_visible(&self, step: Step) -> bool {
        self.hidden_step() != Some(step)
    }

    /// Steps shown in the wizard header
    pub fn visible_steps(&self) -> Vec<Step> {
        Step::ALL.into_iter().filter(|s| self.is_visible(*s)).collect()
    }

    /// Whether the form holds enough to open `step`.
    pub fn is_accessible(&self, step: Step, form: &BomForm) -> bool {
        if !self.is_visible(step) {
            return false;
        }
        match step {
            Step::Header => true,
            Step::ProductSpec => form.header.is_complete(),
            Step::Production => {
                form.spec.is_present(SpecField::ProductDescription) && form.spec.is_present(SpecField::Length)
            }
            Step::CableMaterials | Step::MouldingMaterials => {
                form.spec.is_present(SpecField::ProductDescription) && form.plan_quantity().is_some()
            }
        }
    }

    /// Last step of the wizard for this mode and category.
    pub fn terminal(&self) -> Step {
        match (self.mode, self.category) {
            (FormMode::Edit, BomCategory::Cable) => Step::CableMaterials,
            _ => Step::MouldingMaterials,
        }
    }

    pub fn is_last(&self) -> bool {
        self.active == self.terminal()
    }

    /// Advance one step. Editing a Cable BOM stays put rather than entering
    /// the hidden Moulding step; editing a Moulding BOM skips over the hidden
    /// Cable step. Returns whether the active step changed.
    pub fn next(&mut self, form: &BomForm) -> bool {
        if self.is_last() {
            return false;
        }
        let Some(mut target) = Step::from_index(self.active.index() + 1) else {
            return false;
        };
        if self.hidden_step() == Some(target) {
            match self.category {
                BomCategory::Moulding => {
                    let Some(skipped) = Step::from_index(target.index() + 1) else {
                        return false;
                    };
                    target = skipped;
                }
                _ => return false,
            }
        }
        if target > self.terminal() || !self.is_accessible(target, form) {
            return false;
        }
        self.active = target;
        true
    }

    /// Step back one, never below the header.
    pub fn back(&mut self) {
        self.active = Step::from_index(self.active.index().saturating_sub(1)).unwrap_or(Step::Header);
    }

    /// Jump straight to a step (clicking its header) if it is reachable.
    pub fn go_to(&mut self, step: Step, form: &BomForm) -> bool {
        if step > self.terminal() || !self.is_accessible(step, form) {
            return false;
        }
        self.active = step;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EngineSettings;

    fn complete_form(mode: FormMode, category: BomCategory) -> BomForm {
        let mut form = BomForm::new_create(&EngineSettings::default());
        form.mode = mode;
        form.category = category;
        form.spec.product_description = "Flat twin cable".to_string();
        form.spec.length = "100".to_string();
        form.plan = "20".to_string();
        form
    }

    fn walk(gate: &mut StepGate, form: &BomForm) -> Vec<Step> {
        let mut path = vec![gate.active()];
        while gate.next(form) {
            path.push(gate.active());
        }
        path
    }

    #[test]
    fn test_create_walks_all_steps() {
        let form = complete_form(FormMode::Create, BomCategory::Unset);
        let mut gate = StepGate::for_form(&form);
        assert_eq!(walk(&mut gate, &form), Step::ALL.to_vec());
        assert!(gate.is_last());
        assert_eq!(gate.terminal(), Step::MouldingMaterials);
    }

    #[test]
    fn test_edit_cable_stops_before_moulding() {
        let form = complete_form(FormMode::Edit, BomCategory::Cable);
        let mut gate = StepGate::for_form(&form);
        assert_eq!(
            walk(&mut gate, &form),
            vec![Step::Header, Step::ProductSpec, Step::Production, Step::CableMaterials]
        );
        assert!(gate.is_last());
        assert!(!gate.next(&form));
        assert_eq!(gate.active(), Step::CableMaterials);
        assert!(!gate.is_accessible(Step::MouldingMaterials, &form));
    }

    #[test]
    fn test_edit_moulding_skips_cable() {
        let form = complete_form(FormMode::Edit, BomCategory::Moulding);
        let mut gate = StepGate::for_form(&form);
        assert_eq!(
            walk(&mut gate, &form),
            vec![Step::Header, Step::ProductSpec, Step::Production, Step::MouldingMaterials]
        );
        assert_eq!(gate.terminal(), Step::MouldingMaterials);
        assert_eq!(
            gate.visible_steps(),
            vec![Step::Header, Step::ProductSpec, Step::Production, Step::MouldingMaterials]
        );
    }

    #[test]
    fn test_accessibility_requirements() {
        let mut form = BomForm::new_create(&EngineSettings::default());
        form.header.bom_date.clear();
        let gate = StepGate::for_form(&form);

        assert!(gate.is_accessible(Step::Header, &form));
        assert!(!gate.is_accessible(Step::ProductSpec, &form));

        form.header.bom_date = "2026-10-17".to_string();
        assert!(gate.is_accessible(Step::ProductSpec, &form));
        assert!(!gate.is_accessible(Step::Production, &form));

        form.spec.product_description = "Cable".to_string();
        form.spec.length = "90".to_string();
        assert!(gate.is_accessible(Step::Production, &form));
        assert!(!gate.is_accessible(Step::CableMaterials, &form));

        form.plan = "0".to_string();
        assert!(!gate.is_accessible(Step::MouldingMaterials, &form));
        form.plan = "12".to_string();
        assert!(gate.is_accessible(Step::CableMaterials, &form));
        assert!(gate.is_accessible(Step::MouldingMaterials, &form));
    }

    #[test]
    fn test_next_blocked_by_missing_data() {
        let mut form = complete_form(FormMode::Create, BomCategory::Unset);
        form.plan = String::new();
        let mut gate = StepGate::for_form(&form);
        assert_eq!(
            walk(&mut gate, &form),
            vec![Step::Header, Step::ProductSpec, Step::Production]
        );
    }

    #[test]
    fn test_back_floors_at_header() {
        let form = complete_form(FormMode::Create, BomCategory::Unset);
        let mut gate = StepGate::for_form(&form);
        gate.next(&form);
        gate.back();
        assert_eq!(gate.active(), Step::Header);
        gate.back();
        assert_eq!(gate.active(), Step::Header);
    }

    #[test]
    fn test_go_to() {
        let form = complete_form(FormMode::Edit, BomCategory::Cable);
        let mut gate = StepGate::for_form(&form);
        assert!(gate.go_to(Step::CableMaterials, &form));
        assert!(!gate.go_to(Step::MouldingMaterials, &form));
        assert_eq!(gate.active(), Step::CableMaterials);
    }
}
