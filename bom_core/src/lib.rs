//! # bom_core - Cable & Moulding BOM Engine
//!
//! `bom_core` is the calculation and lifecycle heart of Plugline. It keeps the
//! Bill-of-Materials of a cable/plug product consistent: per-piece material
//! quantities derived from the product geometry, totals derived from the
//! production plan, a gated five-step editing wizard, and the persistence
//! rules for paired Cable/Moulding records.
//!
//! ## Design Philosophy
//!
//! - **Pure core**: formulas, recalculation and step gating are plain
//!   functions over owned data
//! - **Explicit events**: every edit is a [`recalc::FormEvent`] fed through a reducer
//! - **Exact quantities**: decimal arithmetic, 5 places, halves away from zero
//! - **Rich Errors**: Structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use bom_core::catalog::MemoryStockCatalog;
//! use bom_core::form::BomForm;
//! use bom_core::lifecycle::BomLifecycle;
//! use bom_core::materials::MaterialField;
//! use bom_core::product::SpecField;
//! use bom_core::recalc::FormEvent;
//! use bom_core::record::BomCategory;
//! use bom_core::settings::EngineSettings;
//! use bom_core::store::MemoryStore;
//!
//! let settings = EngineSettings::default();
//! let stock = MemoryStockCatalog::default();
//! let mut form = BomForm::new_create(&settings);
//!
//! for (field, value) in [
//!     (SpecField::ProductDescription, "3 core cable"),
//!     (SpecField::Strands, "7"),
//!     (SpecField::Copper, "0.5"),
//!     (SpecField::NoOfCores, "3"),
//!     (SpecField::Length, "100"),
//! ] {
//!     form.apply(&FormEvent::SpecFieldChanged { field, value: value.to_string() }, &stock);
//! }
//! form.apply(&FormEvent::PlanChanged { value: "10".to_string() }, &stock);
//! form.apply(&FormEvent::RowAdded { category: BomCategory::Cable }, &stock);
//! form.apply(
//!     &FormEvent::MaterialFieldChanged {
//!         category: BomCategory::Cable,
//!         index: 0,
//!         field: MaterialField::RawMaterial,
//!         value: "Copper".to_string(),
//!     },
//!     &stock,
//! );
//! assert_eq!(form.cable_materials.rows()[0].total_qty, "37.64570");
//!
//! let mut bom = BomLifecycle::new(MemoryStore::new(), settings);
//! let pair = bom.create(&form).unwrap();
//! assert!(pair.cable.id.ends_with("-C"));
//! assert!(pair.moulding.id.ends_with("-M"));
//! ```
//!
//! ## Modules
//!
//! - [`formula`] - Material-name → quantity-per-piece rules
//! - [`materials`] - Material lines and the per-category row store
//! - [`recalc`] - Event reducer keeping quantities consistent
//! - [`steps`] - Wizard step gate
//! - [`lifecycle`] - Create / update / duplicate / delete
//! - [`form`] - Wizard form state and submission validation
//! - [`record`] - Persisted BOM records and their stored row shape
//! - [`product`] - Product spec, numeric snapshot, plan quantity
//! - [`catalog`] - Product and stock catalog lookups
//! - [`store`] - Row-indexed persistence interface
//! - [`collection`] / [`file_io`] - Collection file with atomic saves and locking
//! - [`settings`] - Collection-wide settings
//! - [`errors`] - Structured error types

pub mod catalog;
pub mod collection;
pub mod errors;
pub mod file_io;
pub mod form;
pub mod formula;
pub mod lifecycle;
pub mod materials;
pub mod product;
pub mod recalc;
pub mod record;
pub mod settings;
pub mod steps;
pub mod store;

// Re-export commonly used types at crate root for convenience
pub use errors::{BomError, BomResult};
pub use file_io::{load_collection, save_collection, FileLock, FileStore};
pub use form::{BomForm, FormMode};
pub use lifecycle::{BomLifecycle, BomPair};
pub use record::{BomCategory, BomRecord};
pub use settings::EngineSettings;
