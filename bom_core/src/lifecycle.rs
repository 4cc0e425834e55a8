//! # BOM Lifecycle
//!
//! Create, update, duplicate and delete BOMs against a [`BomStore`].
//!
//! - **create**: a new BOM is always a pair, `{base}-C` carrying the cable
//!   lines and `{base}-M` carrying the moulding lines.
//! - **update**: replaces one record's header, spec, plan and own material
//!   list; the id is kept and the other category's list stays empty.
//! - **duplicate** (quick-add): clones a record into an unsaved Create-mode
//!   form under a fresh base id, with cable quantities re-derived from the
//!   spec and every total recomputed.
//! - **delete**: removes a record by its position in the collection.
//!
//! Validation happens before any store call, so a rejected submission
//! persists nothing. Store failures are logged and returned as-is; the
//! caller's form is borrowed, never consumed, so the user's input survives.

use std::collections::HashSet;

use chrono::Utc;
use rand::Rng;

use crate::errors::{BomError, BomResult};
use crate::form::{BomForm, FormMode};
use crate::materials::MaterialRowStore;
use crate::record::{base_id, BomCategory, BomHeader, BomRecord, StoredBom};
use crate::settings::EngineSettings;
use crate::store::BomStore;

/// Source of candidate base ids.
pub trait IdSource {
    fn candidate(&mut self, prefix: &str) -> String;
}

/// `{prefix}-NNNN` with a random four-digit number.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn candidate(&mut self, prefix: &str) -> String {
        let n: u32 = rand::rng().random_range(0..10_000);
        format!("{}-{:04}", prefix, n)
    }
}

/// The two records written by a create.
#[derive(Debug, Clone, PartialEq)]
pub struct BomPair {
    pub cable: BomRecord,
    pub moulding: BomRecord,
}

impl BomPair {
    pub fn base_id(&self) -> &str {
        self.cable.base_id()
    }
}

/// Orchestrates BOM persistence.
pub struct BomLifecycle<S: BomStore, I: IdSource = RandomIds> {
    store: S,
    ids: I,
    settings: EngineSettings,
}

impl<S: BomStore> BomLifecycle<S, RandomIds> {
    pub fn new(store: S, settings: EngineSettings) -> Self {
        BomLifecycle::with_ids(store, settings, RandomIds)
    }
}

impl<S: BomStore, I: IdSource> BomLifecycle<S, I> {
    pub fn with_ids(store: S, settings: EngineSettings, ids: I) -> Self {
        BomLifecycle { store, ids, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// All persisted records in stored order.
    pub fn list(&self) -> BomResult<Vec<BomRecord>> {
        let rows = persisted("list", self.store.rows())?;
        Ok(rows.iter().map(StoredBom::to_record).collect())
    }

    /// Load one record by id.
    pub fn find(&self, id: &str) -> BomResult<BomRecord> {
        let rows = persisted("find", self.store.rows())?;
        rows.iter()
            .find(|row| row.id == id)
            .map(StoredBom::to_record)
            .ok_or_else(|| BomError::not_found(id))
    }

    /// Open a record for editing.
    pub fn open(&self, id: &str) -> BomResult<BomForm> {
        Ok(BomForm::edit(&self.find(id)?))
    }

    /// Submit a form: create when nothing is selected, update otherwise.
    pub fn save(&mut self, form: &BomForm, selected: Option<&BomRecord>) -> BomResult<Vec<BomRecord>> {
        match selected {
            None => {
                let pair = self.create(form)?;
                Ok(vec![pair.cable, pair.moulding])
            }
            Some(selected) => Ok(vec![self.update(form, selected)?]),
        }
    }

    /// Persist a new `{base}-C` / `{base}-M` pair from a Create-mode form.
    pub fn create(&mut self, form: &BomForm) -> BomResult<BomPair> {
        if form.mode != FormMode::Create {
            return Err(BomError::invalid_input(
                "mode",
                "Edit",
                "Only a create-mode form can create a new BOM pair",
            ));
        }
        form.validate()?;

        let rows = persisted("create", self.store.rows())?;
        let existing = existing_ids(&rows);
        let base = match form.base_id.trim() {
            "" => self.generate_base_id(&existing),
            given => {
                if id_taken(given, &existing) {
                    return Err(BomError::validation(vec![format!("BOM id '{}' already exists", given)]));
                }
                given.to_string()
            }
        };

        let cable = record_from_form(form, &base, BomCategory::Cable);
        let moulding = record_from_form(form, &base, BomCategory::Moulding);
        let cable_row = StoredBom::from_record(&cable)?;
        let moulding_row = StoredBom::from_record(&moulding)?;

        persisted("create", self.store.append(cable_row))?;
        if let Err(e) = self.store.append(moulding_row) {
            tracing::error!(bom = %base, error = %e, "moulding half failed to save, rolling back cable half");
            if let Err(rollback) = self.remove_by_id(&cable.id) {
                tracing::error!(bom = %base, error = %rollback, "rollback failed");
            }
            return Err(e);
        }

        tracing::info!(bom = %base, "created BOM pair");
        Ok(BomPair { cable, moulding })
    }

    /// Write an Edit-mode form back over `selected`.
    ///
    /// Only `selected`'s category is validated and written; the persisted
    /// row supplies anything the form does not carry.
    pub fn update(&mut self, form: &BomForm, selected: &BomRecord) -> BomResult<BomRecord> {
        let mut scoped = form.clone();
        scoped.mode = FormMode::Edit;
        scoped.category = selected.category;
        scoped.validate()?;

        let rows = persisted("update", self.store.rows())?;
        let index = rows
            .iter()
            .position(|row| row.id == selected.id)
            .ok_or_else(|| BomError::not_found(&selected.id))?;

        let mut merged = rows[index].to_record();
        merged.id = selected.id.clone();
        merged.category = selected.category;
        merged.header = form.header.clone();
        merged.spec = form.spec.clone();
        merged.plan = form.plan.clone();
        merged.revision = selected.revision + 1;
        match selected.category {
            BomCategory::Unset => {
                // legacy rows without a category keep both lists
                merged.cable_materials = form.cable_materials.compacted();
                merged.moulding_materials = form.moulding_materials.compacted();
            }
            category => {
                merged.cable_materials = MaterialRowStore::new();
                merged.moulding_materials = MaterialRowStore::new();
                *merged_list(&mut merged, category) = form.materials(category).compacted();
            }
        }

        let row = StoredBom::from_record(&merged)?;
        persisted("update", self.store.update_row(index, selected.revision, row))?;

        tracing::info!(bom = %merged.id, revision = merged.revision, "updated BOM");
        Ok(merged)
    }

    /// Clone `source` into an unsaved Create-mode form under a new base id.
    pub fn duplicate(&mut self, source: &BomRecord) -> BomResult<BomForm> {
        let rows = persisted("duplicate", self.store.rows())?;
        let base = self.generate_base_id(&existing_ids(&rows));

        let mut form = BomForm::new_create(&self.settings);
        form.base_id = base;
        form.header = draft_header(&form.header, &source.header);
        form.spec = source.spec.clone();
        form.plan = source.plan.clone();
        form.cable_materials = source.cable_materials.clone();
        form.moulding_materials = source.moulding_materials.clone();

        form.recalculate();

        tracing::debug!(source = %source.id, draft = %form.base_id, "duplicated BOM into draft");
        Ok(form)
    }

    /// Same as [`duplicate`](Self::duplicate).
    pub fn quick_add(&mut self, source: &BomRecord) -> BomResult<BomForm> {
        self.duplicate(source)
    }

    /// Delete the record with `id` by its row position.
    pub fn delete(&mut self, id: &str) -> BomResult<BomRecord> {
        let (index, removed) = persisted("delete", self.remove_by_id(id))?;
        tracing::info!(bom = %id, row = index, "deleted BOM");
        Ok(removed.to_record())
    }

    fn remove_by_id(&mut self, id: &str) -> BomResult<(usize, StoredBom)> {
        let rows = self.store.rows()?;
        let index = rows
            .iter()
            .position(|row| row.id == id)
            .ok_or_else(|| BomError::not_found(id))?;
        Ok((index, self.store.delete_row(index)?))
    }

    /// Random base id not colliding with `existing`; after
    /// `max_id_attempts` collisions falls back to a timestamp id.
    fn generate_base_id(&mut self, existing: &HashSet<String>) -> String {
        let prefix = self.settings.id_prefix.as_str();
        for attempt in 1..=self.settings.max_id_attempts {
            let candidate = self.ids.candidate(prefix);
            if !id_taken(&candidate, existing) {
                return candidate;
            }
            tracing::debug!(attempt, candidate = %candidate, "generated BOM id already in use");
        }
        let fallback = format!("{}-{}", prefix, Utc::now().timestamp_millis());
        tracing::warn!(
            attempts = self.settings.max_id_attempts,
            id = %fallback,
            "random BOM ids exhausted, using timestamp id"
        );
        fallback
    }
}

/// Header for a duplicated draft: document fields from the source, dates
/// from the fresh form.
fn draft_header(fresh: &BomHeader, source: &BomHeader) -> BomHeader {
    BomHeader {
        bom_date: fresh.bom_date.clone(),
        revision_date: String::new(),
        ..source.clone()
    }
}

fn merged_list(record: &mut BomRecord, category: BomCategory) -> &mut MaterialRowStore {
    match category {
        BomCategory::Moulding => &mut record.moulding_materials,
        _ => &mut record.cable_materials,
    }
}

fn record_from_form(form: &BomForm, base: &str, category: BomCategory) -> BomRecord {
    let mut record = BomRecord {
        id: format!("{}{}", base, category.suffix()),
        category,
        header: form.header.clone(),
        spec: form.spec.clone(),
        plan: form.plan.clone(),
        revision: 0,
        cable_materials: MaterialRowStore::new(),
        moulding_materials: MaterialRowStore::new(),
    };
    *merged_list(&mut record, category) = form.materials(category).compacted();
    record
}

/// Every stored id plus every base id.
fn existing_ids(rows: &[StoredBom]) -> HashSet<String> {
    rows.iter()
        .flat_map(|row| [row.id.clone(), base_id(&row.id).to_string()])
        .collect()
}

fn id_taken(base: &str, existing: &HashSet<String>) -> bool {
    existing.contains(base)
        || existing.contains(&format!("{}{}", base, BomCategory::Cable.suffix()))
        || existing.contains(&format!("{}{}", base, BomCategory::Moulding.suffix()))
}

/// Log a store failure once at the operation boundary.
fn persisted<T>(operation: &str, result: BomResult<T>) -> BomResult<T> {
    result.map_err(|e| {
        tracing::error!(operation, code = e.error_code(), error = %e, "BOM store operation failed");
        e
    })
}
