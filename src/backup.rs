// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Dated backups of the storage folder
//!
//! Backups land in `<destination>/Backups/<Y_M_D>/<n>` where `n` is the
//! smallest positive number not taken yet, so repeated runs on the same day
//! never overwrite each other.

use chrono::{Datelike, NaiveDate};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{DocketError, Result};

/// Folder collecting all backups under a destination
pub const BACKUPS_DIR: &str = "Backups";

/// Day folder name, e.g. `2024_3_7`
pub fn day_folder(date: NaiveDate) -> String {
    format!("{}_{}_{}", date.year(), date.month(), date.day())
}

/// First `<dir>/<n>` (n = 1, 2, ...) that does not exist yet
pub fn next_free_slot(dir: &Path) -> PathBuf {
    let mut count: u32 = 1;
    let mut candidate = dir.join(count.to_string());
    while candidate.exists() {
        count += 1;
        candidate = dir.join(count.to_string());
    }
    candidate
}

/// Copy `source` recursively into `destination`, returning the number of
/// files copied
pub fn copy_tree(source: &Path, destination: &Path) -> Result<u64> {
    let mut copied = 0;

    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    debug!("Copied {} files from {:?} to {:?}", copied, source, destination);
    Ok(copied)
}

/// Absolute form of `path` with symlinks resolved, for paths that may not
/// exist yet: the nearest existing ancestor is canonicalized and the rest
/// appended.
fn resolve(path: &Path) -> io::Result<PathBuf> {
    if path.exists() {
        return path.canonicalize();
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => Ok(resolve(parent)?.join(name)),
        (_, Some(name)) => Ok(std::env::current_dir()?.join(name)),
        _ => Ok(path.to_path_buf()),
    }
}

/// Copy the storage folder into the next free slot for `today` under
/// `destination_root`, returning the backup folder.
///
/// A destination inside the storage folder is refused, the copy would
/// otherwise walk into itself.
pub fn create_backup(storage_root: &Path, destination_root: &Path, today: NaiveDate) -> Result<PathBuf> {
    if resolve(destination_root)?.starts_with(resolve(storage_root)?) {
        return Err(DocketError::BackupInsideStorage(destination_root.to_path_buf()));
    }

    let day_dir = destination_root.join(BACKUPS_DIR).join(day_folder(today));
    fs::create_dir_all(&day_dir)?;

    let target = next_free_slot(&day_dir);
    let copied = copy_tree(storage_root, &target)?;
    info!("Backed up {} files to {:?}", copied, target);
    Ok(target)
}
