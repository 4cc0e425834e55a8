//! # BOM Persistence
//!
//! [`BomStore`] is the row-indexed CRUD interface of the persisted
//! "Company BOM" collection. Rows are addressed by position; updates carry
//! the revision the editor opened, and a store rejects the write with
//! [`BomError::Conflict`] when the row has moved on since.
//!
//! [`MemoryStore`] keeps rows in a `Vec`; the file-backed store lives in
//! [`crate::file_io`].

use crate::errors::{BomError, BomResult};
use crate::record::StoredBom;
use crate::settings::DEFAULT_COLLECTION;

/// Row-indexed access to a BOM collection.
pub trait BomStore {
    /// Collection name
    fn collection(&self) -> &str;

    /// All rows in stored order
    fn rows(&self) -> BomResult<Vec<StoredBom>>;

    /// Append a row; returns its index. Fails with `Validation` when a row
    /// with the same id is already stored, checked under the same exclusion
    /// as the write itself.
    fn append(&mut self, row: StoredBom) -> BomResult<usize>;

    /// Replace the row at `index`. Fails with `Conflict` unless the stored
    /// row is still at `expected_revision`.
    fn update_row(&mut self, index: usize, expected_revision: u64, row: StoredBom) -> BomResult<()>;

    /// Remove and return the row at `index`
    fn delete_row(&mut self, index: usize) -> BomResult<StoredBom>;
}

/// Check the revision stamp of the row about to be replaced.
pub(crate) fn check_revision(rows: &[StoredBom], index: usize, expected_revision: u64) -> BomResult<()> {
    let current = rows.get(index).ok_or(BomError::IndexOutOfRange {
        index,
        len: rows.len(),
    })?;
    if current.revision != expected_revision {
        return Err(BomError::Conflict {
            id: current.id.clone(),
            expected: expected_revision,
            found: current.revision,
        });
    }
    Ok(())
}

/// Reject a row whose id is already present.
pub(crate) fn check_unique(rows: &[StoredBom], id: &str) -> BomResult<()> {
    if rows.iter().any(|row| row.id == id) {
        return Err(BomError::validation(vec![format!("BOM id '{}' already exists", id)]));
    }
    Ok(())
}

/// In-memory collection.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    name: String,
    rows: Vec<StoredBom>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::named(DEFAULT_COLLECTION)
    }

    pub fn named(name: impl Into<String>) -> Self {
        MemoryStore {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(rows: Vec<StoredBom>) -> Self {
        MemoryStore {
            rows,
            ..MemoryStore::new()
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl BomStore for MemoryStore {
    fn collection(&self) -> &str {
        &self.name
    }

    fn rows(&self) -> BomResult<Vec<StoredBom>> {
        Ok(self.rows.clone())
    }

    fn append(&mut self, row: StoredBom) -> BomResult<usize> {
        check_unique(&self.rows, &row.id)?;
        self.rows.push(row);
        Ok(self.rows.len() - 1)
    }

    fn update_row(&mut self, index: usize, expected_revision: u64, row: StoredBom) -> BomResult<()> {
        check_revision(&self.rows, index, expected_revision)?;
        self.rows[index] = row;
        Ok(())
    }

    fn delete_row(&mut self, index: usize) -> BomResult<StoredBom> {
        if index >= self.rows.len() {
            return Err(BomError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        Ok(self.rows.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, revision: u64) -> StoredBom {
        StoredBom {
            id: id.to_string(),
            revision,
            ..StoredBom::default()
        }
    }

    #[test]
    fn test_append_and_delete_by_position() {
        let mut store = MemoryStore::new();
        assert_eq!(store.append(row("A-C", 0)).unwrap(), 0);
        assert_eq!(store.append(row("A-M", 0)).unwrap(), 1);
        assert_eq!(store.append(row("B-C", 0)).unwrap(), 2);

        let removed = store.delete_row(1).unwrap();
        assert_eq!(removed.id, "A-M");
        let ids: Vec<_> = store.rows().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["A-C", "B-C"]);

        assert!(matches!(store.delete_row(5), Err(BomError::IndexOutOfRange { index: 5, len: 2 })));
    }

    #[test]
    fn test_update_checks_revision() {
        let mut store = MemoryStore::with_rows(vec![row("A-C", 3)]);
        assert!(matches!(
            store.update_row(0, 2, row("A-C", 3)),
            Err(BomError::Conflict { expected: 2, found: 3, .. })
        ));
        store.update_row(0, 3, row("A-C", 4)).unwrap();
        assert_eq!(store.rows().unwrap()[0].revision, 4);
    }

    #[test]
    fn test_append_rejects_existing_id() {
        let mut store = MemoryStore::with_rows(vec![row("A-C", 0)]);
        assert!(matches!(store.append(row("A-C", 0)), Err(BomError::Validation { .. })));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_collection_name() {
        assert_eq!(MemoryStore::new().collection(), "Company BOM");
        assert_eq!(MemoryStore::named("Test BOM").collection(), "Test BOM");
    }
}
