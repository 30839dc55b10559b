// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Controller: the only entry point front ends call
//!
//! Each operation runs validation, the record store and managed storage in a
//! fixed order. A failing step aborts the operation; earlier steps are not
//! rolled back.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::backup;
use crate::config::AppConfig;
use crate::db::{Database, FileRecord};
use crate::storage::Storage;
use crate::validation;
use crate::{DocketError, Result};

/// Keeps the record store and managed storage in step
pub struct Controller {
    config: AppConfig,
    db: Database,
    storage: Storage,
}

impl Controller {
    /// Open the store and storage named by `config`.
    ///
    /// When either the database file or the storage folder is missing, both
    /// are reset to an empty state first.
    pub fn open(config: AppConfig) -> Result<Self> {
        let first_run = !config.database.path.exists() || !config.storage.path.is_dir();

        if let Some(parent) = config.database.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let db = Database::open(&config.database.path)?;
        let storage = Storage::new(&config.storage);
        let controller = Self { config, db, storage };

        if first_run {
            info!("First run, initializing database and storage");
            controller.reset()?;
        }
        Ok(controller)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Register a document and copy `source` into storage.
    ///
    /// Nothing is copied when the record cannot be stored.
    pub fn create(&self, candidate: &FileRecord, source: &Path) -> Result<FileRecord> {
        let file = validation::format_with(candidate, &self.config.display.timestamp_format);
        validation::validate(&file)?;

        if !source.is_file() {
            return Err(DocketError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("source file {:?} not found", source),
            )));
        }

        let stored = self.db.create(&file)?;
        self.storage.copy_in(source, &stored.stored_name())?;

        info!("Added {} from {:?}", stored.stored_name(), source);
        Ok(stored)
    }

    /// Edit description, expiration and label of a stored document, renaming
    /// its stored copy to match. The extension is never changed.
    pub fn update(&self, candidate: &FileRecord) -> Result<FileRecord> {
        let id = candidate
            .id
            .ok_or_else(|| DocketError::MissingId(candidate.description.clone()))?;
        let current = self.db.get(id)?;

        let edited = candidate.clone().with_extension(current.extension.clone());
        let file = validation::format_with(&edited, &self.config.display.timestamp_format);
        validation::validate(&file)?;

        let old_name = current.stored_name();
        if !self.storage.try_lock(&old_name)? {
            return Err(DocketError::FileInUse(old_name));
        }
        self.storage.ensure_vacant(&old_name, &file.stored_name())?;

        let stored = self.db.update(&file)?;
        self.storage.rename(&old_name, &stored.stored_name())?;

        info!("Updated {} -> {}", old_name, stored.stored_name());
        Ok(stored)
    }

    /// Remove a document record and, best effort, its stored copy
    pub fn delete(&self, id: i64) -> Result<FileRecord> {
        let removed = self.db.delete(&FileRecord::default().with_id(id))?;

        if let Err(e) = self.storage.delete(&removed.stored_name()) {
            warn!("Record {} removed but stored file could not be: {}", id, e);
        }

        info!("Deleted {}", removed.stored_name());
        Ok(removed)
    }

    /// All documents ordered by description
    pub fn list(&self) -> Result<Vec<FileRecord>> {
        self.db.list_all()
    }

    /// Documents whose description contains `query`
    pub fn search(&self, query: &str) -> Result<Vec<FileRecord>> {
        self.db.find_by_description(query)
    }

    pub fn get(&self, id: i64) -> Result<FileRecord> {
        self.db.get(id)
    }

    /// Open the stored copy of a document with the OS default handler
    pub fn open_file(&self, id: i64) -> Result<FileRecord> {
        let file = self.db.get(id)?;
        self.storage.open(&file.stored_name());
        Ok(file)
    }

    /// Back up the storage folder under `destination_root`
    pub fn backup(&self, destination_root: &Path) -> Result<PathBuf> {
        if self.storage.is_empty()? {
            return Err(DocketError::NoFilesToBackup);
        }
        backup::create_backup(self.storage.root(), destination_root, Local::now().date_naive())
    }

    /// Discard every record and stored file, leaving an empty store and
    /// storage folder
    pub fn reset(&self) -> Result<()> {
        self.storage.clear()?;
        if self.db.path().exists() {
            fs::remove_file(self.db.path())?;
        }

        self.storage.initialize()?;
        self.db.reset()?;
        info!("Reset {:?} and {:?}", self.db.path(), self.storage.root());
        Ok(())
    }

    /// Write all records to `output` as JSON, returning how many were written
    pub fn export(&self, output: &Path) -> Result<usize> {
        let files = self.db.list_all()?;
        let json = serde_json::to_string_pretty(&files)?;
        fs::write(output, json)?;
        Ok(files.len())
    }
}
