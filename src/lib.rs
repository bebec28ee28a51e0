//! # csvbridge
//!
//! Data set plumbing for an API testing workbench: converts between CSV text,
//! editable tables and JSON values.
//!
//! ## Features
//! - CSV parsing and writing with quote and backslash escaping
//! - Table to JSON objects, with nested JSON detected inside cells
//! - Any JSON value flattened into a table
//! - Editable data sets that switch between table and JSON views
//! - Data set files in CSV, JSON or YAML
//!
//! ## Architecture
//! - `csv` - pure conversion functions
//! - `dataset` - editing operations on a [`DataSet`]
//! - `storage` - settings and file I/O

pub mod constants;
pub mod csv;
pub mod dataset;
pub mod models;
pub mod storage;

// Re-export commonly used types
pub use csv::{
    escape_csv, from_csv, from_object, from_serializable, to_csv_string, to_object, unescape_csv,
};
pub use models::{Csv, CsvRow, DataSet, DataSetRow, DataSourceType};
pub use storage::{load_data_set, save_data_set, Settings};
