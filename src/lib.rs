// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Docket: Local Document Tracker
//!
//! Registers documents with a description, expiration date and label, keeps a
//! copy of each in a hidden storage folder, and produces dated backups of
//! that folder.

pub mod backup;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod storage;
pub mod validation;

pub use config::AppConfig;
pub use controller::Controller;
pub use db::FileRecord;
pub use error::{DocketError, Result};
