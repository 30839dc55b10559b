// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Docket

use thiserror::Error;

/// Result type alias for Docket operations
pub type Result<T> = std::result::Result<T, DocketError>;

/// Docket error types
#[derive(Error, Debug)]
pub enum DocketError {
    #[error("Description '{0}' is already used")]
    DuplicateDescription(String),

    #[error(
        "The description '{0}' is not valid: only letters (a-z, A-Z), numbers (0-9) \
         and underscore (_) are allowed, and it cannot start with a number"
    )]
    InvalidDescription(String),

    #[error("The extension '{0}' is not valid")]
    InvalidExtension(String),

    #[error("The expiration '{0}' is not valid, expected YYYY/MM/DD or nothing")]
    InvalidExpiration(String),

    #[error("The file '{0}' is being used by another process")]
    FileInUse(String),

    #[error("No stored files found to back up")]
    NoFilesToBackup,

    #[error("Backup destination {0:?} is inside the storage folder")]
    BackupInsideStorage(std::path::PathBuf),

    #[error("No record found with id {0}")]
    RecordNotFound(i64),

    #[error("Record '{0}' has no id, it was never stored")]
    MissingId(String),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
