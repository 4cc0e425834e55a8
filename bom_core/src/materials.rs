//! # Material Lines
//!
//! Ordered raw-material line items for one production category. Serial
//! numbers are always contiguous from 1: removing a row renumbers the rest.
//! The same raw material may appear on several rows.

use serde::{Deserialize, Serialize};

use crate::product::{lenient, parse_decimal};

/// One raw material line on a BOM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialLine {
    /// Serial number, 1-based
    #[serde(deserialize_with = "lenient::count")]
    pub sno: u32,

    /// Stock item name or code
    #[serde(rename = "rawMaterial", deserialize_with = "lenient::text")]
    pub raw_material: String,

    #[serde(deserialize_with = "lenient::text")]
    pub units: String,

    /// Quantity for one piece, decimal text
    #[serde(rename = "qtyPerPc", deserialize_with = "lenient::text")]
    pub qty_per_pc: String,

    /// Quantity for the whole plan, decimal text
    #[serde(rename = "totalQty", deserialize_with = "lenient::text")]
    pub total_qty: String,
}

impl MaterialLine {
    /// Blank line with the given serial number
    pub fn blank(sno: u32) -> Self {
        MaterialLine {
            sno,
            ..MaterialLine::default()
        }
    }

    pub fn has_material(&self) -> bool {
        !self.raw_material.trim().is_empty()
    }

    pub fn qty_per_pc_value(&self) -> rust_decimal::Decimal {
        parse_decimal(&self.qty_per_pc)
    }
}

/// Which column of a material line an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialField {
    RawMaterial,
    Units,
    QtyPerPc,
}

/// Ordered material lines for a single category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialRowStore {
    rows: Vec<MaterialLine>,
}

impl MaterialRowStore {
    pub fn new() -> Self {
        MaterialRowStore::default()
    }

    /// Wrap loaded lines, restoring contiguous serial numbers.
    pub fn from_lines(lines: Vec<MaterialLine>) -> Self {
        let mut store = MaterialRowStore { rows: lines };
        store.renumber();
        store
    }

    /// Append a blank row numbered `len + 1`; returns its index.
    pub fn add_row(&mut self) -> usize {
        let sno = self.next_sno();
        self.rows.push(MaterialLine::blank(sno));
        self.rows.len() - 1
    }

    /// Append a filled row, assigning its serial number.
    pub fn push(&mut self, mut line: MaterialLine) -> usize {
        line.sno = self.next_sno();
        self.rows.push(line);
        self.rows.len() - 1
    }

    /// Remove the row at `index` and renumber the remainder 1..N.
    ///
    /// Out-of-range indexes leave the store untouched.
    pub fn remove_row(&mut self, index: usize) -> Option<MaterialLine> {
        if index >= self.rows.len() {
            return None;
        }
        let removed = self.rows.remove(index);
        self.renumber();
        Some(removed)
    }

    pub fn renumber(&mut self) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.sno = (i + 1) as u32;
        }
    }

    /// Copy without blank rows, renumbered. This is what gets persisted.
    pub fn compacted(&self) -> MaterialRowStore {
        MaterialRowStore::from_lines(
            self.rows
                .iter()
                .filter(|row| row.has_material())
                .cloned()
                .collect(),
        )
    }

    /// At least one row names a raw material
    pub fn has_materials(&self) -> bool {
        self.rows.iter().any(MaterialLine::has_material)
    }

    pub fn rows(&self) -> &[MaterialLine] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&MaterialLine> {
        self.rows.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut MaterialLine> {
        self.rows.get_mut(index)
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, MaterialLine> {
        self.rows.iter_mut()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MaterialLine> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn into_lines(self) -> Vec<MaterialLine> {
        self.rows
    }

    fn next_sno(&self) -> u32 {
        self.rows.len() as u32 + 1
    }
}
