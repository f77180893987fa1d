//! Catalog
//!
//! Database lifecycle: a database is a directory under `data_dir`. Every
//! name is validated before a path is built from it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{DbError, Result};
use crate::name::{is_valid_database_name, validate_database_name};

/// Creates, renames, drops and lists database directories
pub struct Catalog {
    data_dir: PathBuf,
}

impl Catalog {
    pub fn new(config: &Config) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
        }
    }

    /// Directory backing database `name`
    pub fn database_path(&self, name: &str) -> Result<PathBuf> {
        validate_database_name(name)?;
        Ok(self.data_dir.join(name))
    }

    pub fn database_exists(&self, name: &str) -> Result<bool> {
        Ok(self.database_path(name)?.is_dir())
    }

    /// Create an empty database directory
    pub fn create_database(&self, name: &str) -> Result<()> {
        let path = self.database_path(name)?;

        fs::create_dir(&path).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => {
                DbError::Conflict(format!("database \"{}\" already exists", name))
            }
            _ => DbError::Io(e),
        })?;

        tracing::info!(db = name, "database created");
        Ok(())
    }

    /// Remove a database and every table in it
    pub fn drop_database(&self, name: &str) -> Result<()> {
        let path = self.database_path(name)?;
        self.require_database(&path, name)?;

        fs::remove_dir_all(&path)?;

        tracing::info!(db = name, "database dropped");
        Ok(())
    }

    pub fn rename_database(&self, old: &str, new: &str) -> Result<()> {
        let old_path = self.database_path(old)?;
        let new_path = self.database_path(new)?;
        self.require_database(&old_path, old)?;

        if new_path.exists() {
            return Err(DbError::Conflict(format!(
                "database \"{}\" already exists",
                new
            )));
        }

        fs::rename(&old_path, &new_path)?;

        tracing::info!(from = old, to = new, "database renamed");
        Ok(())
    }

    /// Entry names inside a database directory, sorted
    pub fn list_tables(&self, name: &str) -> Result<Vec<String>> {
        let path = self.database_path(name)?;
        self.require_database(&path, name)?;

        let mut entries = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            entries.push(entry.file_name().to_string_lossy().into_owned());
        }
        entries.sort();

        Ok(entries)
    }

    /// Sub-directories of the data root that carry a valid database name
    pub fn list_databases(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_valid_database_name(&name) {
                names.push(name);
            }
        }
        names.sort();

        Ok(names)
    }

    fn require_database(&self, path: &Path, name: &str) -> Result<()> {
        if path.is_dir() {
            Ok(())
        } else {
            Err(DbError::DatabaseNotFound(name.to_string()))
        }
    }
}
