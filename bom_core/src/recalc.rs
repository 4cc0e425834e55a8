//! # Recalculation
//!
//! Keeps material quantities consistent with the product spec and the plan.
//! Every edit is an explicit [`FormEvent`] fed through [`reduce`], a pure
//! `(form, event) -> form` function:
//!
//! | Event                                   | Effect |
//! |-----------------------------------------|--------|
//! | spec field that drives formulas         | cable `qtyPerPc` re-derived where a formula applies, then cable totals; moulding totals refreshed |
//! | other spec field                        | stored only |
//! | plan                                    | totals of both categories refreshed from existing `qtyPerPc` |
//! | raw material picked                     | units from the stock catalog; cable rows seeded from the formula |
//! | `qtyPerPc` typed                        | that row's total only |
//! | row added / removed                     | serial numbers stay contiguous |
//!
//! After any event, every row satisfies
//! `totalQty == round5(qtyPerPc × plan)` (blank `qtyPerPc` keeps a blank total).
//!
//! In Edit mode events aimed at the hidden category are ignored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{ProductCatalog, StockCatalog};
use crate::form::BomForm;
use crate::formula::{compute, format_qty};
use crate::materials::{MaterialField, MaterialLine, MaterialRowStore};
use crate::product::{PlanQuantity, SpecField, SpecSnapshot};
use crate::record::BomCategory;

/// An edit made in the BOM wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormEvent {
    SpecFieldChanged { field: SpecField, value: String },
    PlanChanged { value: String },
    MaterialFieldChanged {
        category: BomCategory,
        index: usize,
        field: MaterialField,
        value: String,
    },
    RowAdded { category: BomCategory },
    RowRemoved { category: BomCategory, index: usize },
}

/// Apply one event to the form.
pub fn reduce(mut form: BomForm, event: &FormEvent, stock: &dyn StockCatalog) -> BomForm {
    match event {
        FormEvent::SpecFieldChanged { field, value } => {
            form.spec.set(*field, value.clone());
            if field.drives_formulas() {
                let snapshot = form.spec.snapshot();
                let plan = PlanQuantity::factor(&form.plan);
                let updated = refresh_cable_quantities(&mut form.cable_materials, &snapshot);
                refresh_totals(&mut form.cable_materials, plan);
                refresh_totals(&mut form.moulding_materials, plan);
                tracing::debug!(field = field.key(), updated, "cable quantities recalculated");
            }
        }
        FormEvent::PlanChanged { value } => {
            form.plan = value.clone();
            let plan = PlanQuantity::factor(&form.plan);
            refresh_totals(&mut form.cable_materials, plan);
            refresh_totals(&mut form.moulding_materials, plan);
        }
        FormEvent::MaterialFieldChanged {
            category,
            index,
            field,
            value,
        } => {
            if form.allows(*category) {
                edit_material(&mut form, *category, *index, *field, value, stock);
            }
        }
        FormEvent::RowAdded { category } => {
            if form.allows(*category) {
                form.materials_mut(*category).add_row();
            }
        }
        FormEvent::RowRemoved { category, index } => {
            if form.allows(*category) {
                form.materials_mut(*category).remove_row(*index);
            }
        }
    }
    form
}

impl BomForm {
    /// In-place convenience over [`reduce`].
    pub fn apply(&mut self, event: &FormEvent, stock: &dyn StockCatalog) {
        let form = std::mem::take(self);
        *self = reduce(form, event, stock);
    }

    /// Bring every quantity in line with the current spec and plan: cable
    /// rows with a formula are re-derived, then all totals are recomputed.
    /// Used for forms that arrive from outside the reducer.
    pub fn recalculate(&mut self) {
        let plan = PlanQuantity::factor(&self.plan);
        refresh_cable_quantities(&mut self.cable_materials, &self.spec.snapshot());
        refresh_totals(&mut self.cable_materials, plan);
        refresh_totals(&mut self.moulding_materials, plan);
    }

    /// Fill the spec from the product master entry for `code`.
    ///
    /// Each populated catalog field goes through the reducer as a
    /// `SpecFieldChanged`, so cable quantities and totals follow. Fields the
    /// catalog leaves blank keep the form's value. Returns false when the
    /// code is unknown.
    pub fn load_product(&mut self, code: &str, products: &dyn ProductCatalog, stock: &dyn StockCatalog) -> bool {
        let Some(spec) = products.lookup(code) else {
            tracing::debug!(code, "product code not in catalog");
            return false;
        };
        self.apply(
            &FormEvent::SpecFieldChanged {
                field: SpecField::ProductCode,
                value: code.trim().to_string(),
            },
            stock,
        );
        for field in SpecField::ALL {
            if field != SpecField::ProductCode && spec.is_present(field) {
                self.apply(
                    &FormEvent::SpecFieldChanged {
                        field,
                        value: spec.get(field).to_string(),
                    },
                    stock,
                );
            }
        }
        true
    }
}

fn edit_material(
    form: &mut BomForm,
    category: BomCategory,
    index: usize,
    field: MaterialField,
    value: &str,
    stock: &dyn StockCatalog,
) {
    let snapshot = form.spec.snapshot();
    let plan = PlanQuantity::factor(&form.plan);
    let Some(row) = form.materials_mut(category).get_mut(index) else {
        return;
    };

    match field {
        MaterialField::RawMaterial => {
            row.raw_material = value.to_string();
            if let Some(unit) = stock.unit_for(value) {
                row.units = unit;
            }
            if category == BomCategory::Cable {
                if let Some(qty) = compute(&row.raw_material, &snapshot) {
                    row.qty_per_pc = format_qty(qty);
                }
            }
        }
        MaterialField::Units => row.units = value.to_string(),
        MaterialField::QtyPerPc => row.qty_per_pc = value.to_string(),
    }
    refresh_row_total(row, plan);
}

/// Re-derive `qtyPerPc` for cable rows whose material has a formula.
/// Rows without a material or without a formula keep their value.
/// Returns how many rows were recomputed.
pub fn refresh_cable_quantities(rows: &mut MaterialRowStore, spec: &SpecSnapshot) -> usize {
    let mut updated = 0;
    for row in rows.iter_mut().filter(|row| row.has_material()) {
        if let Some(qty) = compute(&row.raw_material, spec) {
            row.qty_per_pc = format_qty(qty);
            updated += 1;
        }
    }
    updated
}

/// Recompute `totalQty` of every row from its own `qtyPerPc`.
pub fn refresh_totals(rows: &mut MaterialRowStore, plan: Decimal) {
    for row in rows.iter_mut() {
        refresh_row_total(row, plan);
    }
}

/// `totalQty = round5(qtyPerPc × plan)`; blank stays blank. A product too
/// large to represent also leaves the total blank for manual entry.
pub fn refresh_row_total(row: &mut MaterialLine, plan: Decimal) {
    if row.qty_per_pc.trim().is_empty() {
        row.total_qty = String::new();
        return;
    }
    row.total_qty = match row.qty_per_pc_value().checked_mul(plan) {
        Some(total) => format_qty(total),
        None => {
            tracing::warn!(
                sno = row.sno,
                material = %row.raw_material,
                qty_per_pc = %row.qty_per_pc,
                %plan,
                "total quantity out of range, left blank"
            );
            String::new()
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryProductCatalog, MemoryStockCatalog, StockItem};
    use crate::form::FormMode;
    use crate::formula::round5;
    use crate::product::parse_decimal;
    use crate::record::BomRecord;
    use crate::settings::EngineSettings;

    fn stock() -> MemoryStockCatalog {
        MemoryStockCatalog::new(vec![
            StockItem::new("Copper", "RM-CU", "kg"),
            StockItem::new("Core PVC", "RM-CPVC", "kg"),
            StockItem::new("Plug Pin", "RM-PIN", "nos"),
        ])
    }

    fn spec_events() -> Vec<FormEvent> {
        [
            (SpecField::ProductDescription, "3 core cable"),
            (SpecField::Strands, "7"),
            (SpecField::Copper, "0.5"),
            (SpecField::NoOfCores, "3"),
            (SpecField::Length, "100"),
            (SpecField::CoreOd, "3.0"),
        ]
        .into_iter()
        .map(|(field, value)| FormEvent::SpecFieldChanged {
            field,
            value: value.to_string(),
        })
        .collect()
    }

    fn pick(category: BomCategory, index: usize, name: &str) -> FormEvent {
        FormEvent::MaterialFieldChanged {
            category,
            index,
            field: MaterialField::RawMaterial,
            value: name.to_string(),
        }
    }

    fn typed_qty(category: BomCategory, index: usize, qty: &str) -> FormEvent {
        FormEvent::MaterialFieldChanged {
            category,
            index,
            field: MaterialField::QtyPerPc,
            value: qty.to_string(),
        }
    }

    fn run(form: BomForm, events: &[FormEvent]) -> BomForm {
        let stock = stock();
        events.iter().fold(form, |form, event| reduce(form, event, &stock))
    }

    /// Create form with spec filled, plan 10, and rows:
    /// cable [Copper, Core PVC, Binder Tape(manual 0.2)], moulding [Plug Pin(2)]
    fn populated_form() -> BomForm {
        let mut events = spec_events();
        events.push(FormEvent::PlanChanged { value: "10".to_string() });
        for _ in 0..3 {
            events.push(FormEvent::RowAdded { category: BomCategory::Cable });
        }
        events.push(FormEvent::RowAdded { category: BomCategory::Moulding });
        events.push(pick(BomCategory::Cable, 0, "Copper"));
        events.push(pick(BomCategory::Cable, 1, "Core PVC"));
        events.push(pick(BomCategory::Cable, 2, "Binder Tape"));
        events.push(typed_qty(BomCategory::Cable, 2, "0.2"));
        events.push(pick(BomCategory::Moulding, 0, "Plug Pin"));
        events.push(typed_qty(BomCategory::Moulding, 0, "2"));
        run(BomForm::new_create(&EngineSettings::default()), &events)
    }

    fn assert_totals_consistent(form: &BomForm) {
        let plan = PlanQuantity::factor(&form.plan);
        for row in form.cable_materials.iter().chain(form.moulding_materials.iter()) {
            if row.qty_per_pc.trim().is_empty() {
                assert_eq!(row.total_qty, "");
            } else {
                assert_eq!(
                    parse_decimal(&row.total_qty),
                    round5(parse_decimal(&row.qty_per_pc) * plan),
                    "row {} ({})",
                    row.sno,
                    row.raw_material
                );
            }
        }
    }

    #[test]
    fn test_material_pick_seeds_cable_quantity() {
        let form = populated_form();
        let copper = &form.cable_materials.rows()[0];
        assert_eq!(copper.units, "kg");
        assert_eq!(copper.qty_per_pc, "3.76457");
        assert_eq!(copper.total_qty, "37.64570");

        let core = &form.cable_materials.rows()[1];
        assert_eq!(core.qty_per_pc, "0.92198");
        assert_eq!(core.total_qty, "9.21980");

        let tape = &form.cable_materials.rows()[2];
        assert_eq!(tape.units, "");
        assert_eq!(tape.qty_per_pc, "0.2");
        assert_eq!(tape.total_qty, "2.00000");
        assert_totals_consistent(&form);
    }

    #[test]
    fn test_moulding_pick_fills_units_only() {
        let stock = stock();
        let mut form = populated_form();
        form.apply(&pick(BomCategory::Moulding, 0, "Copper"), &stock);
        let row = &form.moulding_materials.rows()[0];
        assert_eq!(row.units, "kg");
        assert_eq!(row.qty_per_pc, "2");
    }

    #[test]
    fn test_spec_change_cascades_to_cable_rows() {
        let form = run(
            populated_form(),
            &[FormEvent::SpecFieldChanged {
                field: SpecField::Length,
                value: "200".to_string(),
            }],
        );
        let rows = form.cable_materials.rows();
        assert_eq!(rows[0].qty_per_pc, "7.52913");
        assert_eq!(rows[1].qty_per_pc, "1.84397");
        // manual entry survives
        assert_eq!(rows[2].qty_per_pc, "0.2");
        // moulding per-piece never auto-computed
        assert_eq!(form.moulding_materials.rows()[0].qty_per_pc, "2");
        assert_totals_consistent(&form);
    }

    #[test]
    fn test_non_driving_field_does_not_recalculate() {
        let mut form = populated_form();
        form.cable_materials.get_mut(0).unwrap().qty_per_pc = "9".to_string();
        let form = run(
            form,
            &[FormEvent::SpecFieldChanged {
                field: SpecField::Colour,
                value: "Black".to_string(),
            }],
        );
        assert_eq!(form.spec.colour, "Black");
        assert_eq!(form.cable_materials.rows()[0].qty_per_pc, "9");
    }

    #[test]
    fn test_plan_change_refreshes_all_totals() {
        let form = run(populated_form(), &[FormEvent::PlanChanged { value: "250".to_string() }]);
        assert_eq!(form.cable_materials.rows()[0].qty_per_pc, "3.76457");
        assert_eq!(form.cable_materials.rows()[0].total_qty, "941.14250");
        assert_eq!(form.moulding_materials.rows()[0].total_qty, "500.00000");
        assert_totals_consistent(&form);

        let form = run(form, &[FormEvent::PlanChanged { value: "0".to_string() }]);
        assert_eq!(form.moulding_materials.rows()[0].total_qty, "0.00000");
        assert_totals_consistent(&form);
    }

    #[test]
    fn test_manual_qty_touches_only_its_row() {
        let before = populated_form();
        let after = run(before.clone(), &[typed_qty(BomCategory::Cable, 2, "1.5")]);
        assert_eq!(after.cable_materials.rows()[2].total_qty, "15.00000");
        assert_eq!(after.cable_materials.rows()[0], before.cable_materials.rows()[0]);
        assert_eq!(after.moulding_materials, before.moulding_materials);
    }

    #[test]
    fn test_row_removal_renumbers() {
        let form = run(
            populated_form(),
            &[FormEvent::RowRemoved {
                category: BomCategory::Cable,
                index: 0,
            }],
        );
        let snos: Vec<u32> = form.cable_materials.iter().map(|r| r.sno).collect();
        assert_eq!(snos, vec![1, 2]);
        assert_eq!(form.cable_materials.rows()[0].raw_material, "Core PVC");
    }

    #[test]
    fn test_out_of_range_edit_is_noop() {
        let before = populated_form();
        let after = run(before.clone(), &[pick(BomCategory::Cable, 42, "Copper")]);
        assert_eq!(after, before);
    }

    #[test]
    fn test_edit_mode_ignores_hidden_category() {
        let record = BomRecord {
            id: "BOM-7-C".to_string(),
            category: BomCategory::Cable,
            ..BomRecord::default()
        };
        let form = BomForm::edit(&record);
        assert_eq!(form.mode, FormMode::Edit);

        let form = run(
            form,
            &[
                FormEvent::RowAdded { category: BomCategory::Moulding },
                pick(BomCategory::Moulding, 0, "Plug Pin"),
                FormEvent::RowAdded { category: BomCategory::Cable },
            ],
        );
        assert!(form.moulding_materials.is_empty());
        assert_eq!(form.cable_materials.len(), 1);
    }

    #[test]
    fn test_moulding_edit_ignores_cable_category() {
        let record = BomRecord {
            id: "BOM-7-M".to_string(),
            category: BomCategory::Moulding,
            ..BomRecord::default()
        };
        let form = BomForm::edit(&record);

        let form = run(
            form,
            &[
                FormEvent::PlanChanged { value: "10".to_string() },
                FormEvent::RowAdded { category: BomCategory::Cable },
                pick(BomCategory::Cable, 0, "Copper"),
                typed_qty(BomCategory::Cable, 0, "3"),
                FormEvent::RowAdded { category: BomCategory::Moulding },
                pick(BomCategory::Moulding, 0, "Plug Pin"),
            ],
        );
        assert!(form.cable_materials.is_empty());
        assert_eq!(form.moulding_materials.len(), 1);
        assert_eq!(form.moulding_materials.rows()[0].units, "nos");

        let mut events = spec_events();
        events.push(FormEvent::SpecFieldChanged {
            field: SpecField::SheathOd,
            value: "6.0".to_string(),
        });
        let form = run(form, &events);
        assert!(form.cable_materials.is_empty());
        assert_eq!(form.spec.sheath_od, "6.0");
    }

    #[test]
    fn test_oversized_quantity_leaves_total_blank() {
        let huge = "79228162514264337593543950335";
        let form = run(
            BomForm::new_create(&EngineSettings::default()),
            &[
                FormEvent::PlanChanged { value: "2".to_string() },
                FormEvent::RowAdded { category: BomCategory::Moulding },
                typed_qty(BomCategory::Moulding, 0, huge),
            ],
        );
        let row = &form.moulding_materials.rows()[0];
        assert_eq!(row.qty_per_pc, huge);
        assert_eq!(row.total_qty, "");

        // a plan of one fits again
        let form = run(form, &[FormEvent::PlanChanged { value: "1".to_string() }]);
        assert!(form.moulding_materials.rows()[0].total_qty.starts_with(huge));
    }

    #[test]
    fn test_recalculate_repairs_stale_quantities() {
        let mut form = populated_form();
        for row in form.cable_materials.iter_mut() {
            row.total_qty = "1".to_string();
        }
        form.cable_materials.iter_mut().for_each(|row| {
            if row.raw_material == "Copper" {
                row.qty_per_pc = "999".to_string();
            }
        });
        form.moulding_materials.iter_mut().for_each(|row| row.total_qty = "0".to_string());

        form.recalculate();
        assert_eq!(form.cable_materials.rows()[0].qty_per_pc, "3.76457");
        assert_eq!(form.cable_materials.rows()[2].qty_per_pc, "0.2");
        assert_eq!(form.moulding_materials.rows()[0].total_qty, "20.00000");
        assert_totals_consistent(&form);
    }

    #[test]
    fn test_reduce_is_deterministic() {
        let events = vec![
            FormEvent::SpecFieldChanged {
                field: SpecField::SheathOd,
                value: "5.0".to_string(),
            },
            FormEvent::PlanChanged { value: "3".to_string() },
        ];
        let a = run(populated_form(), &events);
        let b = run(populated_form(), &events);
        assert_eq!(a, b);
        // replaying the same events is idempotent
        assert_eq!(run(a.clone(), &events), a);
    }

    #[test]
    fn test_load_product_fills_spec_and_recalculates() {
        let products = MemoryProductCatalog::from_json(
            r#"[{"productCode": "PC-200", "description": "2m cord", "totalLength": 200,
                 "conductorSize": "0.5", "noOfStrands": 7, "cores": 3, "coreOd": 3.0}]"#,
        )
        .unwrap();
        let stock = stock();
        let mut form = populated_form();

        assert!(form.load_product("pc-200", &products, &stock));
        assert_eq!(form.spec.product_description, "2m cord");
        assert_eq!(form.spec.length, "200");
        assert_eq!(form.cable_materials.rows()[0].qty_per_pc, "7.52913");
        assert_eq!(form.cable_materials.rows()[1].qty_per_pc, "1.84397");
        assert_totals_consistent(&form);

        let before = form.clone();
        assert!(!form.load_product("missing", &products, &stock));
        assert_eq!(form, before);
    }
}
