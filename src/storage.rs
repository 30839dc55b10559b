// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Managed storage: the hidden folder holding one copy per tracked document

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::{DocketError, Result};

/// Folder of stored copies, each named `<description>.<EXTENSION>`
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    hidden: bool,
}

impl Storage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.path.clone(),
            hidden: config.hidden,
        }
    }

    /// Storage folder path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a stored file
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Create the folder if needed and hide it
    pub fn initialize(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
            info!("Created storage folder: {:?}", self.root);
        }
        if self.hidden {
            mark_hidden(&self.root);
        }
        Ok(())
    }

    /// Copy `source` into storage as `new_name`, returning the bytes copied.
    ///
    /// Never overwrites: an existing `new_name` (in any letter case on
    /// case-insensitive file systems) fails with `AlreadyExists`.
    pub fn copy_in(&self, source: &Path, new_name: &str) -> Result<u64> {
        let destination = self.path_of(new_name);
        let mut reader = File::open(source)?;
        let mut writer = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&destination)?;

        let bytes = match io::copy(&mut reader, &mut writer) {
            Ok(bytes) => bytes,
            Err(e) => {
                drop(writer);
                let _ = fs::remove_file(&destination);
                return Err(e.into());
            }
        };
        debug!("Copied {:?} to {:?} ({} bytes)", source, destination, bytes);
        Ok(bytes)
    }

    /// Probe whether a stored file is free to be renamed or removed.
    ///
    /// Returns `false` when another process holds the file open in a way
    /// that blocks writers. A missing file is reported as free.
    ///
    /// Only a read handle is requested, so read-only copies count as free.
    pub fn try_lock(&self, name: &str) -> Result<bool> {
        let path = self.path_of(name);
        match File::open(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) if is_sharing_violation(&e) => {
                debug!("Stored file {:?} is locked: {}", path, e);
                Ok(false)
            }
            // renames and removals need the folder, not the file, to be writable
            Err(e) if !cfg!(windows) && e.kind() == ErrorKind::PermissionDenied => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    /// Rename a stored file
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return Ok(());
        }
        if !self.try_lock(old_name)? {
            return Err(DocketError::FileInUse(old_name.to_string()));
        }
        self.ensure_vacant(old_name, new_name)?;

        fs::rename(self.path_of(old_name), self.path_of(new_name))?;
        debug!("Renamed stored file {} -> {}", old_name, new_name);
        Ok(())
    }

    /// Fail with `AlreadyExists` when `new_name` is taken by a file other
    /// than `old_name`. A case-only change of the same name is allowed.
    pub fn ensure_vacant(&self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name.eq_ignore_ascii_case(new_name) || !self.path_of(new_name).exists() {
            return Ok(());
        }
        Err(DocketError::Io(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("stored file {} already exists", new_name),
        )))
    }

    /// Remove a stored file; absent files are ignored
    pub fn delete(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path_of(name)) {
            Ok(()) => {
                debug!("Deleted stored file {}", name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Launch a stored file with the OS default handler.
    ///
    /// Fire-and-forget: the handler runs detached and failures are only
    /// logged.
    pub fn open(&self, name: &str) {
        let path = self.path_of(name);
        if let Err(e) = launch(&path) {
            warn!("Failed to open {:?}: {}", path, e);
        }
    }

    /// True when the folder is missing or has no entries
    pub fn is_empty(&self) -> Result<bool> {
        if !self.exists() {
            return Ok(true);
        }
        Ok(fs::read_dir(&self.root)?.next().is_none())
    }

    /// Remove the folder and everything in it
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
            info!("Removed storage folder: {:?}", self.root);
        }
        Ok(())
    }
}

fn is_sharing_violation(e: &io::Error) -> bool {
    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(e.raw_os_error(), Some(32) | Some(33))
}

fn launch(path: &Path) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .arg("/c")
            .arg("start")
            .arg("")
            .arg(path)
            .spawn()?;
    }
    Ok(())
}

#[cfg(windows)]
fn mark_hidden(path: &Path) {
    match std::process::Command::new("attrib")
        .args(["+h", "+s"])
        .arg(path)
        .status()
    {
        Ok(status) if status.success() => debug!("Marked {:?} hidden", path),
        Ok(status) => warn!("attrib exited with {} for {:?}", status, path),
        Err(e) => warn!("Failed to hide {:?}: {}", path, e),
    }
}

#[cfg(not(windows))]
fn mark_hidden(path: &Path) {
    let dotted = path
        .file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false);
    if !dotted {
        debug!("{:?} is not dot-named, it stays visible", path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(&StorageConfig {
            path: dir.path().join(".storage"),
            hidden: true,
        });
        storage.initialize().unwrap();
        (dir, storage)
    }

    #[test]
    fn test_initialize_creates_folder() {
        let (_dir, storage) = temp_storage();
        assert!(storage.exists());
        assert!(storage.is_empty().unwrap());
        // second call is a no-op
        storage.initialize().unwrap();
    }

    #[test]
    fn test_copy_in_is_byte_for_byte() {
        let (dir, storage) = temp_storage();
        let source = dir.path().join("scan.pdf");
        fs::write(&source, b"%PDF-1.7 bytes").unwrap();

        let copied = storage.copy_in(&source, "scan.PDF").unwrap();
        assert_eq!(copied, 14);
        assert_eq!(fs::read(storage.path_of("scan.PDF")).unwrap(), b"%PDF-1.7 bytes");
        assert!(source.exists());
    }

    #[test]
    fn test_copy_in_never_overwrites() {
        let (dir, storage) = temp_storage();
        fs::write(storage.path_of("doc.PDF"), b"original").unwrap();
        let source = dir.path().join("other.pdf");
        fs::write(&source, b"replacement").unwrap();

        let err = storage.copy_in(&source, "doc.PDF").unwrap_err();
        assert!(matches!(err, DocketError::Io(ref e) if e.kind() == ErrorKind::AlreadyExists));
        assert_eq!(fs::read(storage.path_of("doc.PDF")).unwrap(), b"original");
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_copy_is_free_and_renames() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, storage) = temp_storage();
        let path = storage.path_of("scan.PDF");
        fs::write(&path, b"scan").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();

        assert!(storage.try_lock("scan.PDF").unwrap());
        storage.rename("scan.PDF", "scan_2024.PDF").unwrap();
        assert_eq!(fs::read(storage.path_of("scan_2024.PDF")).unwrap(), b"scan");
    }

    #[test]
    fn test_rename_onto_other_file_fails() {
        let (_dir, storage) = temp_storage();
        fs::write(storage.path_of("a.PDF"), b"a").unwrap();
        fs::write(storage.path_of("b.PDF"), b"b").unwrap();

        let err = storage.rename("a.PDF", "b.PDF").unwrap_err();
        assert!(matches!(err, DocketError::Io(ref e) if e.kind() == ErrorKind::AlreadyExists));
        assert_eq!(fs::read(storage.path_of("a.PDF")).unwrap(), b"a");
        assert_eq!(fs::read(storage.path_of("b.PDF")).unwrap(), b"b");
    }

    #[test]
    fn test_rename_case_only() {
        let (_dir, storage) = temp_storage();
        fs::write(storage.path_of("Doc.PDF"), b"d").unwrap();
        storage.rename("Doc.PDF", "doc.PDF").unwrap();
        assert_eq!(fs::read(storage.path_of("doc.PDF")).unwrap(), b"d");
    }

    #[test]
    fn test_copy_in_missing_source() {
        let (dir, storage) = temp_storage();
        let err = storage.copy_in(&dir.path().join("missing.pdf"), "x.PDF").unwrap_err();
        assert!(matches!(err, DocketError::Io(_)));
    }

    #[test]
    fn test_rename() {
        let (_dir, storage) = temp_storage();
        fs::write(storage.path_of("old.PDF"), b"data").unwrap();

        storage.rename("old.PDF", "new.PDF").unwrap();
        assert!(!storage.path_of("old.PDF").exists());
        assert_eq!(fs::read(storage.path_of("new.PDF")).unwrap(), b"data");

        storage.rename("new.PDF", "new.PDF").unwrap();
        assert!(storage.path_of("new.PDF").exists());
    }

    #[test]
    fn test_rename_missing_is_io_error() {
        let (_dir, storage) = temp_storage();
        let err = storage.rename("ghost.PDF", "other.PDF").unwrap_err();
        assert!(matches!(err, DocketError::Io(_)));
    }

    #[test]
    fn test_try_lock_free_file() {
        let (_dir, storage) = temp_storage();
        fs::write(storage.path_of("a.TXT"), b"x").unwrap();
        assert!(storage.try_lock("a.TXT").unwrap());
        assert!(storage.try_lock("absent.TXT").unwrap());
    }

    #[test]
    fn test_delete_present_and_absent() {
        let (_dir, storage) = temp_storage();
        fs::write(storage.path_of("a.TXT"), b"x").unwrap();
        storage.delete("a.TXT").unwrap();
        assert!(!storage.path_of("a.TXT").exists());
        storage.delete("a.TXT").unwrap();
    }

    #[test]
    fn test_clear() {
        let (_dir, storage) = temp_storage();
        fs::write(storage.path_of("a.TXT"), b"x").unwrap();
        assert!(!storage.is_empty().unwrap());
        storage.clear().unwrap();
        assert!(!storage.exists());
        assert!(storage.is_empty().unwrap());
    }
}
