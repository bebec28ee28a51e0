use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::DATA_COLUMN;

/// A single CSV record, keyed by column name
pub type CsvRow = HashMap<String, String>;

/// Tabular CSV data: ordered column names plus the rows keyed by them
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Csv {
    pub columns: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl Csv {
    pub fn new(columns: Vec<String>, rows: Vec<CsvRow>) -> Self {
        Csv { columns, rows }
    }
}

/// Where a data set's content comes from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSourceType {
    /// JSON text stored inline
    #[default]
    Json,
    /// JSON file on disk
    FileJson,
    /// CSV file on disk, edited as a table
    FileCsv,
}

impl DataSourceType {
    pub fn as_str(&self) -> &str {
        match self {
            DataSourceType::Json => "JSON",
            DataSourceType::FileJson => "JSON File",
            DataSourceType::FileCsv => "CSV File",
        }
    }

    pub fn is_csv(&self) -> bool {
        matches!(self, DataSourceType::FileCsv)
    }
}

/// A table row with a stable identifier, so rows can be edited in place
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataSetRow {
    pub id: String,
    pub values: CsvRow,
}

impl DataSetRow {
    pub fn new(values: CsvRow) -> Self {
        DataSetRow {
            id: uuid::Uuid::new_v4().to_string(),
            values,
        }
    }
}

/// A named data set used to drive repeated requests
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataSet {
    pub id: String,
    pub name: String,
    pub source_type: DataSourceType,
    /// Relative file name for file-backed sources
    #[serde(default)]
    pub source_file_name: String,
    /// JSON text for `Json`/`FileJson` sources
    #[serde(default)]
    pub text: String,
    pub columns: Vec<String>,
    pub rows: Vec<DataSetRow>,
    /// Set when the data set has unsaved changes
    #[serde(skip)]
    pub dirty: bool,
}

impl DataSet {
    pub fn new(name: impl Into<String>, source_type: DataSourceType) -> Self {
        DataSet {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            source_type,
            source_file_name: String::new(),
            text: String::new(),
            columns: vec![DATA_COLUMN.to_string()],
            rows: Vec::new(),
            dirty: false,
        }
    }
}

impl Default for DataSet {
    fn default() -> Self {
        DataSet::new("New Data Set", DataSourceType::Json)
    }
}
