//! Chart-of-accounts (PUC) code engine.
//!
//! Derives hierarchy metadata from account codes, validates and reconciles
//! bulk spreadsheet imports against an account store, rebuilds the fixed
//! spreadsheet layout on export, and assembles accounts into trees.

pub mod columns;
pub mod db;
pub mod error;
pub mod exporter;
pub mod fmt;
pub mod hierarchy;
pub mod importer;
pub mod logging;
pub mod models;
pub mod parser;
pub mod settings;
pub mod store;
pub mod tree;
pub mod validator;

pub use error::{PucError, Result};
pub use hierarchy::{level, normal_side, parent_code, segment};
