//! Table Store
//!
//! Owns the on-disk form of a table: one file per table holding the whole
//! record array as compact JSON.
//!
//! ## Access Pattern
//! Every mutation is a full cycle over the file:
//! ```text
//!   read file → decode array → mutate in memory → encode array → write file
//! ```
//! There is no partial update and no append log, so insertion order of
//! untouched records always survives an update or delete.
//!
//! ## Concurrency
//! Cycles issued through the same `TableStore` are serialized per table
//! path. Nothing coordinates separate processes (or separate `TableStore`
//! instances) writing the same file: both may read the old array and the
//! last writer wins.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::config::{Config, WriteMode};
use crate::error::{DbError, Result};
use crate::name::{validate_database_name, validate_table_name};
use crate::record::{kind_of, position_of, Record};

/// Result of [`TableStore::create_table`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new empty table file was written
    Created,

    /// A file was already present; it was left untouched
    AlreadyExists,
}

/// Result of [`TableStore::rename_table`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,

    /// The source table did not exist; nothing changed on disk
    SourceMissing,
}

/// Load-mutate-persist engine over table files
pub struct TableStore {
    config: Config,

    /// One lock per table path, created on first use and dropped again
    /// once no operation holds it
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl TableStore {
    /// Create a store rooted at `config.data_dir`
    pub fn new(config: Config) -> Self {
        Self {
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store with default config rooted at `path`
    pub fn open_path(path: &Path) -> Self {
        Self::new(Config::builder().data_dir(path).build())
    }

    /// Resolve `(database, table)` to the table file path
    pub fn table_path(&self, db: &str, table: &str) -> Result<PathBuf> {
        validate_database_name(db)?;
        validate_table_name(table)?;
        Ok(self.config.data_dir.join(db).join(table))
    }

    // =========================================================================
    // Table Operations
    // =========================================================================

    /// Write an empty array to a new table file.
    ///
    /// An existing file is never overwritten. A missing database directory
    /// surfaces as an I/O error.
    pub fn create_table(&self, db: &str, table: &str) -> Result<CreateOutcome> {
        let path = self.table_path(db, table)?;

        self.with_lock(&path, || {
            // Claim the name first so an existing file is never replaced
            let placeholder = OpenOptions::new().write(true).create_new(true).open(&path);
            match placeholder {
                Ok(file) => drop(file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::info!(db, table, "table already exists");
                    return Ok(CreateOutcome::AlreadyExists);
                }
                Err(e) => return Err(e.into()),
            }

            if let Err(e) = self.persist(&path, &[]) {
                let _ = fs::remove_file(&path);
                return Err(e);
            }

            tracing::info!(db, table, "table created");
            Ok(CreateOutcome::Created)
        })
    }

    /// Return all records in file order
    pub fn read_table(&self, db: &str, table: &str) -> Result<Vec<Record>> {
        let path = self.table_path(db, table)?;
        self.with_lock(&path, || self.load(&path, db, table))
    }

    /// Remove the table file
    pub fn delete_table(&self, db: &str, table: &str) -> Result<()> {
        let path = self.table_path(db, table)?;

        self.with_lock(&path, || {
            fs::remove_file(&path).map_err(|e| not_found_or_io(e, db, table))?;

            tracing::info!(db, table, "table deleted");
            Ok(())
        })
    }

    /// Rename a table within its database.
    ///
    /// A missing source is reported as [`RenameOutcome::SourceMissing`]
    /// rather than an error. An existing target is a conflict and is never
    /// overwritten.
    pub fn rename_table(&self, db: &str, old: &str, new: &str) -> Result<RenameOutcome> {
        let old_path = self.table_path(db, old)?;
        let new_path = self.table_path(db, new)?;

        if old_path == new_path {
            return Ok(if old_path.is_file() {
                RenameOutcome::Renamed
            } else {
                RenameOutcome::SourceMissing
            });
        }

        // Lock both tables in path order
        let (first, second) = if old_path < new_path {
            (&old_path, &new_path)
        } else {
            (&new_path, &old_path)
        };
        let first_lock = self.lock_for(first);
        let second_lock = self.lock_for(second);

        let result = {
            let _first = first_lock.lock();
            let _second = second_lock.lock();

            if !old_path.exists() {
                tracing::warn!(db, table = old, "rename skipped, table does not exist");
                Ok(RenameOutcome::SourceMissing)
            } else if new_path.exists() {
                Err(DbError::Conflict(format!(
                    "table \"{}\" already exists in database \"{}\"",
                    new, db
                )))
            } else {
                fs::rename(&old_path, &new_path)
                    .map(|()| {
                        tracing::info!(db, from = old, to = new, "table renamed");
                        RenameOutcome::Renamed
                    })
                    .map_err(DbError::from)
            }
        };

        self.release(first, first_lock);
        self.release(second, second_lock);
        result
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Append `record` as the last element. No id is assigned or checked.
    pub fn create_row(&self, db: &str, table: &str, record: Record) -> Result<()> {
        let path = self.table_path(db, table)?;

        self.with_lock(&path, || {
            let mut records = self.load(&path, db, table)?;
            records.push(record);
            self.persist(&path, &records)?;

            tracing::debug!(db, table, rows = records.len(), "row appended");
            Ok(())
        })
    }

    /// Replace the first record whose `id` equals `id` with `record`.
    ///
    /// Full replacement: fields missing from `record` are gone afterwards.
    /// With no match the file is not rewritten.
    pub fn update_row(&self, db: &str, table: &str, id: &Value, record: Record) -> Result<()> {
        let path = self.table_path(db, table)?;

        self.with_lock(&path, || {
            let mut records = self.load(&path, db, table)?;
            let index =
                position_of(&records, id).ok_or_else(|| record_not_found(db, table, id))?;
            records[index] = record;
            self.persist(&path, &records)?;

            tracing::debug!(db, table, %id, index, "row updated");
            Ok(())
        })
    }

    /// Remove the first record whose `id` equals `id` and return it.
    ///
    /// Remaining records keep their relative order. With no match the file
    /// is not rewritten.
    pub fn delete_row(&self, db: &str, table: &str, id: &Value) -> Result<Record> {
        let path = self.table_path(db, table)?;

        self.with_lock(&path, || {
            let mut records = self.load(&path, db, table)?;
            let index =
                position_of(&records, id).ok_or_else(|| record_not_found(db, table, id))?;
            let removed = records.remove(index);
            self.persist(&path, &records)?;

            tracing::debug!(db, table, %id, index, "row deleted");
            Ok(removed)
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of table paths that currently have a lock entry
    pub fn tracked_locks(&self) -> usize {
        self.locks.lock().len()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Run `op` while holding the lock for `path`
    fn with_lock<T>(&self, path: &Path, op: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.lock_for(path);
        let result = {
            let _guard = lock.lock();
            op()
        };
        self.release(path, lock);
        result
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    /// Give back a lock from `lock_for`, dropping the map entry if nobody
    /// else holds it. Clones are only handed out under the map lock, so the
    /// count cannot grow while it is checked here.
    fn release(&self, path: &Path, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock();
        // The map's copy plus ours
        let idle = Arc::strong_count(&lock) == 2;
        drop(lock);
        if idle {
            locks.remove(path);
        }
    }

    /// Read and decode the whole table file
    fn load(&self, path: &Path, db: &str, table: &str) -> Result<Vec<Record>> {
        let raw = fs::read(path).map_err(|e| not_found_or_io(e, db, table))?;
        decode_table(&raw, path)
    }

    /// Encode and write the whole table file
    fn persist(&self, path: &Path, records: &[Record]) -> Result<()> {
        let encoded = serde_json::to_vec(records)
            .map_err(|e| DbError::Serialization(e.to_string()))?;

        match self.config.write_mode {
            WriteMode::InPlace => write_synced(path, &encoded)?,
            WriteMode::AtomicRename => {
                // Uniquely named sibling, removed on drop unless persisted
                let dir = path.parent().unwrap_or_else(|| Path::new("."));
                let mut tmp = NamedTempFile::new_in(dir)?;
                tmp.write_all(&encoded)?;
                tmp.as_file().sync_all()?;
                tmp.persist(path).map_err(|e| DbError::Io(e.error))?;
            }
        }

        Ok(())
    }
}

/// Decode table file contents. Anything other than an array of objects is
/// a parse error.
pub fn decode_table(raw: &[u8], path: &Path) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| DbError::Parse(format!("{}: {}", path.display(), e)))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(DbError::Parse(format!(
                "{}: expected a JSON array, found {}",
                path.display(),
                kind_of(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(DbError::Parse(format!(
                "{}: element {} is {}, expected an object",
                path.display(),
                i,
                kind_of(&other)
            ))),
        })
        .collect()
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn not_found_or_io(e: io::Error, db: &str, table: &str) -> DbError {
    if e.kind() == ErrorKind::NotFound {
        DbError::TableNotFound {
            database: db.to_string(),
            table: table.to_string(),
        }
    } else {
        DbError::Io(e)
    }
}

fn record_not_found(db: &str, table: &str, id: &Value) -> DbError {
    DbError::RecordNotFound {
        database: db.to_string(),
        table: table.to_string(),
        id: id.to_string(),
    }
}
