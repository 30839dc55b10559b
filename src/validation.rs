// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Validation and formatting rules for file records
//!
//! `format` canonicalizes a candidate record (extension casing, timestamp,
//! expiration), `validate` enforces the naming and date rules, and
//! `is_expired` is what the front end uses to flag stale documents.

use chrono::{Local, NaiveDate};
use regex::Regex;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::OnceLock;

use crate::db::FileRecord;
use crate::{DocketError, Result};

/// Display format of `modification`, e.g. `2024/03/07 4:05 PM`
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %-I:%M %p";

/// Canonical expiration format
pub const EXPIRATION_FORMAT: &str = "%Y/%m/%d";

/// What an untouched year/month/day picker produces
const EMPTY_EXPIRATION: &str = "//";

fn identifier() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("identifier pattern is valid")
    })
}

/// True when `text` is a valid description
pub fn is_identifier(text: &str) -> bool {
    identifier().is_match(text)
}

/// Format a record with the default timestamp format
pub fn format(file: &FileRecord) -> FileRecord {
    format_with(file, TIMESTAMP_FORMAT)
}

/// Produce the canonical form of a candidate record.
///
/// The extension loses its leading dots and is uppercased, `modification` is
/// stamped with the current local time, and the expiration is either emptied
/// (for the `"//"` sentinel) or zero-padded when it names a real date.
pub fn format_with(file: &FileRecord, timestamp_format: &str) -> FileRecord {
    FileRecord {
        extension: file.extension.trim().trim_start_matches('.').to_uppercase(),
        modification: timestamp(timestamp_format),
        expiration: canonical_expiration(&file.expiration),
        ..file.clone()
    }
}

/// Current local time rendered with `timestamp_format`.
///
/// A format string chrono cannot render falls back to `TIMESTAMP_FORMAT`.
pub fn timestamp(timestamp_format: &str) -> String {
    let now = Local::now();
    let mut out = String::new();
    if write!(out, "{}", now.format(timestamp_format)).is_err() {
        tracing::warn!("Invalid timestamp format {:?}, using default", timestamp_format);
        out = now.format(TIMESTAMP_FORMAT).to_string();
    }
    out
}

fn canonical_expiration(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == EMPTY_EXPIRATION {
        return String::new();
    }
    match parse_expiration(trimmed) {
        Some(date) => date.format(EXPIRATION_FORMAT).to_string(),
        None => trimmed.to_string(),
    }
}

/// Check description, extension and expiration of a record
pub fn validate(file: &FileRecord) -> Result<()> {
    if !is_identifier(&file.description) {
        return Err(DocketError::InvalidDescription(file.description.clone()));
    }

    let extension = file.extension.trim();
    if extension.is_empty()
        || !extension
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(DocketError::InvalidExtension(file.extension.clone()));
    }

    if !file.expiration.is_empty() && parse_expiration(&file.expiration).is_none() {
        return Err(DocketError::InvalidExpiration(file.expiration.clone()));
    }

    Ok(())
}

/// Parse a `YYYY/MM/DD` expiration.
///
/// Requires exactly three non-empty components naming a calendar date;
/// components need not be zero-padded.
pub fn parse_expiration(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split('/').map(str::trim).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    let year = parts[0].parse::<i32>().ok()?;
    let month = parts[1].parse::<u32>().ok()?;
    let day = parts[2].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Whether the record has expired as of today
pub fn is_expired(file: &FileRecord) -> bool {
    is_expired_on(file, Local::now().date_naive())
}

/// Whether the record has expired as of `today`: its expiration is on or
/// before that date. Records without (or with an unreadable) expiration never
/// expire.
pub fn is_expired_on(file: &FileRecord, today: NaiveDate) -> bool {
    if file.expiration.trim().is_empty() {
        return false;
    }
    match parse_expiration(&file.expiration) {
        Some(date) => date <= today,
        None => {
            tracing::debug!("Unreadable expiration {:?} on {}", file.expiration, file.description);
            false
        }
    }
}

/// Split a source path into its stem and extension (without the dot)
pub fn decompose(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (stem, extension)
}

/// Propose a description from arbitrary text: keep ASCII letters and digits,
/// lowercased. A leading digit gets an underscore in front so the result is
/// a valid identifier.
pub fn suggest_description(text: &str) -> String {
    let mut suggestion: String = text
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if suggestion.starts_with(|c: char| c.is_ascii_digit()) {
        suggestion.insert(0, '_');
    }
    suggestion
}

/// Shorten text for prompts: at most `limit` characters, then `...`
pub fn truncate_display(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let mut short: String = text.chars().take(limit).collect();
        short.push_str("...");
        short
    } else {
        text.to_string()
    }
}
