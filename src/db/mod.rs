// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Record store for tracked documents
//!
//! A single `documents` table keyed by SQLite's implicit `rowid`. Every call
//! opens its own connection and closes it when done.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{DocketError, Result};

const SELECT_COLUMNS: &str =
    "SELECT rowid, description, modification, expiration, extension, label FROM documents";

/// Record store backed by a SQLite file
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

/// A tracked document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Assigned by the store, `None` until created
    pub id: Option<i64>,
    pub description: String,
    pub modification: String,
    /// `YYYY/MM/DD`, empty when the document never expires
    pub expiration: String,
    pub extension: String,
    pub label: String,
}

impl FileRecord {
    pub fn new(description: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            extension: extension.into(),
            ..Self::default()
        }
    }

    pub fn with_id(self, id: i64) -> Self {
        Self { id: Some(id), ..self }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self { description: description.into(), ..self }
    }

    pub fn with_modification(self, modification: impl Into<String>) -> Self {
        Self { modification: modification.into(), ..self }
    }

    pub fn with_expiration(self, expiration: impl Into<String>) -> Self {
        Self { expiration: expiration.into(), ..self }
    }

    pub fn with_extension(self, extension: impl Into<String>) -> Self {
        Self { extension: extension.into(), ..self }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self { label: label.into(), ..self }
    }

    /// Name of the copy kept in managed storage
    pub fn stored_name(&self) -> String {
        format!("{}.{}", self.description, self.extension)
    }

    fn require_id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| DocketError::MissingId(self.description.clone()))
    }
}

impl Database {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Self {
            path: path.as_ref().to_path_buf(),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                description TEXT,
                modification TEXT,
                expiration TEXT,
                extension TEXT,
                label TEXT
            );
        "#,
        )?;
        Ok(())
    }

    /// Insert a new record, rejecting a description already in use (in any
    /// letter case)
    pub fn create(&self, file: &FileRecord) -> Result<FileRecord> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        if description_owner(&tx, &file.description)?.is_some() {
            return Err(DocketError::DuplicateDescription(file.description.clone()));
        }

        tx.execute(
            r#"INSERT INTO documents (description, modification, expiration, extension, label)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                file.description,
                file.modification,
                file.expiration,
                file.extension,
                file.label
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!("Inserted record {} ({})", id, file.description);
        Ok(file.clone().with_id(id))
    }

    /// All records ordered by description
    pub fn list_all(&self) -> Result<Vec<FileRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY description"))?;
        let files = stmt
            .query_map([], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    /// Records whose description contains `query`, ordered by description.
    ///
    /// Matching follows SQL `LIKE`, so it ignores ASCII case. `%` and `_`
    /// in the query are matched literally.
    pub fn find_by_description(&self, query: &str) -> Result<Vec<FileRecord>> {
        let conn = self.connect()?;
        let pattern = format!("%{}%", escape_like(query));
        let mut stmt = conn.prepare(&format!(
            r"{SELECT_COLUMNS} WHERE description LIKE ?1 ESCAPE '\' ORDER BY description"
        ))?;
        let files = stmt
            .query_map(params![pattern], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    /// Fetch a single record
    pub fn get(&self, id: i64) -> Result<FileRecord> {
        let conn = self.connect()?;
        fetch(&conn, id)
    }

    /// Overwrite description, modification, expiration and label of the
    /// record with the same id. Id and extension stay as stored.
    pub fn update(&self, file: &FileRecord) -> Result<FileRecord> {
        let id = file.require_id()?;
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        fetch(&tx, id)?;
        if let Some(owner) = description_owner(&tx, &file.description)? {
            if owner != id {
                return Err(DocketError::DuplicateDescription(file.description.clone()));
            }
        }

        tx.execute(
            r#"UPDATE documents
               SET description = ?1, modification = ?2, expiration = ?3, label = ?4
               WHERE rowid = ?5"#,
            params![file.description, file.modification, file.expiration, file.label, id],
        )?;
        let updated = fetch(&tx, id)?;
        tx.commit()?;

        debug!("Updated record {} ({})", id, updated.description);
        Ok(updated)
    }

    /// Remove the record with the same id, returning it as it was stored
    pub fn delete(&self, file: &FileRecord) -> Result<FileRecord> {
        let id = file.require_id()?;
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let removed = fetch(&tx, id)?;
        tx.execute("DELETE FROM documents WHERE rowid = ?1", params![id])?;
        tx.commit()?;

        debug!("Deleted record {} ({})", id, removed.description);
        Ok(removed)
    }

    /// Drop and recreate the table, discarding every record
    pub fn reset(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS documents;
            CREATE TABLE documents (
                description TEXT,
                modification TEXT,
                expiration TEXT,
                extension TEXT,
                label TEXT
            );
        "#,
        )?;
        debug!("Reset documents table in {:?}", self.path);
        Ok(())
    }

    /// Number of stored records
    pub fn count(&self) -> Result<i64> {
        let conn = self.connect()?;
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

fn fetch(conn: &Connection, id: i64) -> Result<FileRecord> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE rowid = ?1"),
        params![id],
        row_to_record,
    )
    .optional()?
    .ok_or(DocketError::RecordNotFound(id))
}

/// Row holding `description`, compared ignoring ASCII case since stored copies
/// named `Doc.PDF` and `doc.PDF` collide on case-insensitive file systems
fn description_owner(conn: &Connection, description: &str) -> Result<Option<i64>> {
    let owner = conn
        .query_row(
            "SELECT rowid FROM documents WHERE description = ?1 COLLATE NOCASE LIMIT 1",
            params![description],
            |row| row.get(0),
        )
        .optional()?;
    Ok(owner)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: Some(row.get(0)?),
        description: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        modification: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        expiration: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        extension: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        label: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
    })
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("documents.db")).unwrap();
        (dir, db)
    }

    fn record(description: &str) -> FileRecord {
        FileRecord::new(description, "PDF")
            .with_modification("2024/01/01 9:00 AM")
            .with_label("misc")
    }

    #[test]
    fn test_create_assigns_id() {
        let (_dir, db) = open_temp();
        let created = db.create(&record("invoice")).unwrap();
        assert!(created.id.is_some());
        assert_eq!(db.get(created.id.unwrap()).unwrap(), created);
    }

    #[test]
    fn test_create_duplicate_description() {
        let (_dir, db) = open_temp();
        db.create(&record("invoice")).unwrap();
        let err = db.create(&record("invoice")).unwrap_err();
        assert!(matches!(err, DocketError::DuplicateDescription(d) if d == "invoice"));
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn test_create_duplicate_ignores_case() {
        let (_dir, db) = open_temp();
        db.create(&record("Doc")).unwrap();
        let err = db.create(&record("doc")).unwrap_err();
        assert!(matches!(err, DocketError::DuplicateDescription(d) if d == "doc"));
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn test_update_case_change_of_own_description() {
        let (_dir, db) = open_temp();
        let created = db.create(&record("Doc")).unwrap();
        db.create(&record("other")).unwrap();

        let updated = db.update(&created.clone().with_description("doc")).unwrap();
        assert_eq!(updated.description, "doc");

        let other = db.find_by_description("other").unwrap().remove(0);
        let err = db.update(&other.with_description("DOC")).unwrap_err();
        assert!(matches!(err, DocketError::DuplicateDescription(_)));
    }

    #[test]
    fn test_list_all_sorted() {
        let (_dir, db) = open_temp();
        for name in ["zeta", "alpha", "mid"] {
            db.create(&record(name)).unwrap();
        }
        let names: Vec<_> = db.list_all().unwrap().into_iter().map(|f| f.description).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_find_by_description() {
        let (_dir, db) = open_temp();
        for name in ["tax_2023", "tax_2024", "passport", "TAXI_receipt"] {
            db.create(&record(name)).unwrap();
        }

        let names: Vec<_> = db
            .find_by_description("tax")
            .unwrap()
            .into_iter()
            .map(|f| f.description)
            .collect();
        assert_eq!(names, vec!["TAXI_receipt", "tax_2023", "tax_2024"]);

        let names: Vec<_> = db
            .find_by_description("x_")
            .unwrap()
            .into_iter()
            .map(|f| f.description)
            .collect();
        assert_eq!(names, vec!["tax_2023", "tax_2024"]);

        assert_eq!(db.find_by_description("").unwrap().len(), 4);
        assert!(db.find_by_description("nothing").unwrap().is_empty());
    }

    #[test]
    fn test_update_keeps_id_and_extension() {
        let (_dir, db) = open_temp();
        let created = db.create(&record("invoice")).unwrap();
        let id = created.id.unwrap();

        let edited = created
            .clone()
            .with_description("invoice_paid")
            .with_extension("DOCX")
            .with_expiration("2030/01/01")
            .with_label("")
            .with_modification("2024/02/02 10:00 AM");
        let updated = db.update(&edited).unwrap();

        assert_eq!(updated.id, Some(id));
        assert_eq!(updated.extension, "PDF");
        assert_eq!(updated.description, "invoice_paid");
        assert_eq!(updated.expiration, "2030/01/01");
        assert_eq!(updated.label, "");
        assert_eq!(updated.modification, "2024/02/02 10:00 AM");
    }

    #[test]
    fn test_update_same_description_allowed() {
        let (_dir, db) = open_temp();
        let created = db.create(&record("invoice")).unwrap();
        let updated = db.update(&created.clone().with_label("paid")).unwrap();
        assert_eq!(updated.label, "paid");
    }

    #[test]
    fn test_update_to_taken_description() {
        let (_dir, db) = open_temp();
        db.create(&record("first")).unwrap();
        let second = db.create(&record("second")).unwrap();
        let err = db.update(&second.with_description("first")).unwrap_err();
        assert!(matches!(err, DocketError::DuplicateDescription(_)));
    }

    #[test]
    fn test_update_missing() {
        let (_dir, db) = open_temp();
        let err = db.update(&record("ghost").with_id(42)).unwrap_err();
        assert!(matches!(err, DocketError::RecordNotFound(42)));

        let err = db.update(&record("ghost")).unwrap_err();
        assert!(matches!(err, DocketError::MissingId(_)));
    }

    #[test]
    fn test_delete() {
        let (_dir, db) = open_temp();
        let created = db.create(&record("invoice")).unwrap();
        let removed = db.delete(&created).unwrap();
        assert_eq!(removed, created);
        assert_eq!(db.count().unwrap(), 0);

        let err = db.delete(&created).unwrap_err();
        assert!(matches!(err, DocketError::RecordNotFound(_)));
    }

    #[test]
    fn test_reset_empties_table() {
        let (_dir, db) = open_temp();
        db.create(&record("a")).unwrap();
        db.create(&record("b")).unwrap();
        db.reset().unwrap();
        assert_eq!(db.count().unwrap(), 0);
        db.create(&record("a")).unwrap();
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("documents.db");
        let created = Database::open(&path).unwrap().create(&record("keep")).unwrap();
        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.list_all().unwrap(), vec![created]);
    }
}
