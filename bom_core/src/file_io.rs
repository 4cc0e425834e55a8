//! # File I/O Module
//!
//! Handles collection file operations with safety features:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **File locking**: Prevent two writers interleaving on a shared drive
//! - **Version validation**: Ensure schema compatibility
//!
//! [`FileStore`] implements [`BomStore`] on top of these: every write locks
//! the file, reloads it, applies the change and saves atomically before the
//! lock is released. A lock held elsewhere fails fast with
//! [`BomError::FileLocked`]; nothing waits.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bom_core::file_io::FileStore;
//! use bom_core::settings::EngineSettings;
//! use bom_core::store::BomStore;
//! use std::path::Path;
//!
//! let store = FileStore::create(Path::new("company_bom.json"), "planner@plant", EngineSettings::default())?;
//! assert_eq!(store.rows()?.len(), 0);
//! # Ok::<(), bom_core::errors::BomError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::collection::{BomCollection, SCHEMA_VERSION};
use crate::errors::{BomError, BomResult};
use crate::record::StoredBom;
use crate::settings::EngineSettings;
use crate::store::{check_revision, check_unique, BomStore};

/// Lock file metadata stored in `.lock` files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// File lock guard that releases the lock when dropped.
///
/// Uses both:
/// 1. OS-level file locking (via fs2) for process safety
/// 2. .lock file with metadata for user visibility
pub struct FileLock {
    lock_path: PathBuf,
    /// Keeps the OS lock
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a collection file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired successfully
    /// * `Err(BomError::FileLocked)` - Another process holds the lock
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> BomResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if lock_path.exists() {
            if let Ok(existing) = read_lock_info(&lock_path) {
                if !is_lock_stale(&existing) {
                    return Err(BomError::file_locked(
                        path.display().to_string(),
                        format!("{} ({})", existing.user_id, existing.machine),
                        existing.locked_at.to_rfc3339(),
                    ));
                }
                tracing::warn!(
                    path = %path.display(),
                    holder = %existing.user_id,
                    "taking over stale lock"
                );
            }
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| BomError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        // Non-blocking
        lock_file.try_lock_exclusive().map_err(|_| {
            BomError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info)?;

        lock_file
            .write_all(lock_json.as_bytes())
            .map_err(|e| BomError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;

        lock_file
            .sync_all()
            .map_err(|e| BomError::file_error("sync lock", lock_path.display().to_string(), e.to_string()))?;

        Ok(FileLock {
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Check if a file is locked without acquiring the lock.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if lock_path.exists() {
            if let Ok(info) = read_lock_info(&lock_path) {
                if !is_lock_stale(&info) {
                    return Some(info);
                }
            }
        }
        None
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // OS lock goes with _lock_file
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `company_bom.json` -> `company_bom.json<suffix>`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn lock_path_for(collection_path: &Path) -> PathBuf {
    sibling_path(collection_path, ".lock")
}

fn read_lock_info(lock_path: &Path) -> BomResult<LockInfo> {
    let mut file = File::open(lock_path)
        .map_err(|e| BomError::file_error("read lock", lock_path.display().to_string(), e.to_string()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| BomError::file_error("read lock", lock_path.display().to_string(), e.to_string()))?;

    Ok(serde_json::from_str(&contents)?)
}

/// A lock is stale when its process is gone (same machine) or it is older
/// than 24 hours.
fn is_lock_stale(info: &LockInfo) -> bool {
    if let Some(our_machine) = hostname() {
        if info.machine == our_machine {
            #[cfg(windows)]
            {
                use std::process::Command;
                let output = Command::new("tasklist")
                    .args(["/FI", &format!("PID eq {}", info.pid), "/NH"])
                    .output();
                if let Ok(output) = output {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if stdout.contains("No tasks") || !stdout.contains(&info.pid.to_string()) {
                        return true;
                    }
                }
            }
            #[cfg(unix)]
            {
                if fs::metadata(format!("/proc/{}", info.pid)).is_err() {
                    return true;
                }
            }
        }
    }

    let age = Utc::now() - info.locked_at;
    age.num_hours() > 24
}

/// Save a collection with atomic write semantics.
///
/// 1. Serialize to JSON
/// 2. Write to `<path>.tmp`
/// 3. fsync
/// 4. Rename over the target
pub fn save_collection(collection: &BomCollection, path: &Path) -> BomResult<()> {
    let json = serde_json::to_string_pretty(collection)?;

    let tmp_path = sibling_path(path, ".tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        BomError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        BomError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        BomError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        BomError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

/// Load a collection from a file.
///
/// # Returns
///
/// * `Ok(BomCollection)` - Successfully loaded
/// * `Err(BomError::VersionMismatch)` - File version is incompatible
/// * `Err(BomError::SerializationError)` - Invalid JSON
/// * `Err(BomError::FileError)` - I/O error
pub fn load_collection(path: &Path) -> BomResult<BomCollection> {
    let mut file = File::open(path)
        .map_err(|e| BomError::file_error("open", path.display().to_string(), e.to_string()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| BomError::file_error("read", path.display().to_string(), e.to_string()))?;

    let collection: BomCollection = serde_json::from_str(&contents)
        .map_err(|e| BomError::serialization(format!("Invalid JSON in {}: {}", path.display(), e)))?;

    validate_version(&collection.meta.version)?;

    Ok(collection)
}

/// Load a collection, returning the current lock holder if any.
pub fn load_collection_with_lock_check(path: &Path) -> BomResult<(BomCollection, Option<LockInfo>)> {
    let collection = load_collection(path)?;
    let lock_info = FileLock::check(path);
    Ok((collection, lock_info))
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> BomResult<()> {
    let file_parts: Vec<u32> = file_version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    let mismatch = || BomError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // 0.x: a newer minor may carry breaking changes
    if current_parts[0] == 0
        && file_parts.len() > 1
        && current_parts.len() > 1
        && file_parts[1] > current_parts[1]
    {
        return Err(mismatch());
    }

    Ok(())
}

/// [`BomStore`] backed by a locked JSON collection file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    user_id: String,
    name: String,
    settings: EngineSettings,
}

impl FileStore {
    /// Open an existing collection file. A write in progress elsewhere is
    /// logged; reads do not wait for it.
    pub fn open(path: &Path, user_id: impl Into<String>) -> BomResult<Self> {
        let (collection, holder) = load_collection_with_lock_check(path)?;
        if let Some(holder) = holder {
            tracing::info!(
                path = %path.display(),
                holder = %holder.user_id,
                machine = %holder.machine,
                "collection is being written by another process"
            );
        }
        Ok(FileStore {
            path: path.to_path_buf(),
            user_id: user_id.into(),
            name: collection.meta.name,
            settings: collection.settings,
        })
    }

    /// Write a new, empty collection file. Refuses to overwrite.
    pub fn create(path: &Path, user_id: impl Into<String>, settings: EngineSettings) -> BomResult<Self> {
        if path.exists() {
            return Err(BomError::file_error(
                "create",
                path.display().to_string(),
                "file already exists",
            ));
        }
        let user_id = user_id.into();
        let collection = BomCollection::new(settings);
        {
            let _lock = FileLock::acquire(path, user_id.clone())?;
            save_collection(&collection, path)?;
        }
        tracing::info!(path = %path.display(), name = %collection.meta.name, "created BOM collection");
        Ok(FileStore {
            path: path.to_path_buf(),
            user_id,
            name: collection.meta.name,
            settings: collection.settings,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Settings saved with the collection
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Whoever holds the write lock right now, if anyone.
    pub fn lock_holder(&self) -> Option<LockInfo> {
        FileLock::check(&self.path)
    }

    /// Lock, reload, apply `change`, save.
    fn modify<T>(&self, change: impl FnOnce(&mut Vec<StoredBom>) -> BomResult<T>) -> BomResult<T> {
        let _lock = FileLock::acquire(&self.path, self.user_id.clone())?;
        let mut collection = load_collection(&self.path)?;
        let out = change(&mut collection.rows)?;
        collection.touch();
        save_collection(&collection, &self.path)?;
        Ok(out)
    }
}

impl BomStore for FileStore {
    fn collection(&self) -> &str {
        &self.name
    }

    fn rows(&self) -> BomResult<Vec<StoredBom>> {
        Ok(load_collection(&self.path)?.rows)
    }

    fn append(&mut self, row: StoredBom) -> BomResult<usize> {
        self.modify(|rows| {
            check_unique(rows, &row.id)?;
            rows.push(row);
            Ok(rows.len() - 1)
        })
    }

    fn update_row(&mut self, index: usize, expected_revision: u64, row: StoredBom) -> BomResult<()> {
        self.modify(|rows| {
            check_revision(rows, index, expected_revision)?;
            rows[index] = row;
            Ok(())
        })
    }

    fn delete_row(&mut self, index: usize) -> BomResult<StoredBom> {
        self.modify(|rows| {
            if index >= rows.len() {
                return Err(BomError::IndexOutOfRange {
                    index,
                    len: rows.len(),
                });
            }
            Ok(rows.remove(index))
        })
    }
}
