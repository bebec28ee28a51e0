//! Data set editing - table and JSON views of the same data set

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::Value;

use crate::constants::{DATA_COLUMN, JSON_INDENT};
use crate::csv;
use crate::models::{Csv, CsvRow, DataSet, DataSetRow, DataSourceType};

impl DataSet {
    // ========================
    // Source
    // ========================

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.mark_dirty();
    }

    /// Switch the source type, converting between table and JSON text
    ///
    /// Leaving CSV writes the table out as indented JSON. Entering CSV parses
    /// the JSON text into a table; text that is not valid JSON leaves an empty
    /// table with a single `data` column.
    pub fn set_source_type(&mut self, source_type: DataSourceType) {
        if self.source_type == source_type {
            return;
        }

        if self.source_type.is_csv() {
            let objects: Vec<Value> = csv::to_object(&self.to_csv())
                .into_iter()
                .map(Value::Object)
                .collect();
            self.text = to_indented_json(&objects);
        } else if source_type.is_csv() {
            match serde_json::from_str::<Value>(&self.text) {
                Ok(value) => {
                    let table = csv::from_object(&value);
                    self.columns = table.columns;
                    self.rows = table.rows.into_iter().map(DataSetRow::new).collect();
                }
                Err(e) => {
                    tracing::warn!(id = %self.id, error = %e, "Data set text is not valid JSON, starting empty table");
                    self.columns = vec![DATA_COLUMN.to_string()];
                    self.rows.clear();
                }
            }
        }

        tracing::info!(id = %self.id, from = self.source_type.as_str(), to = source_type.as_str(), "Changed data set source type");
        self.source_file_name.clear();
        self.source_type = source_type;
        self.mark_dirty();
    }

    pub fn set_file_name(&mut self, file_name: impl Into<String>) {
        self.source_file_name = file_name.into();
        self.mark_dirty();
    }

    /// Reset to an empty inline JSON data set
    pub fn clear(&mut self) {
        self.text.clear();
        self.source_file_name.clear();
        self.columns = vec![DATA_COLUMN.to_string()];
        self.rows.clear();
        self.source_type = DataSourceType::Json;
        self.mark_dirty();
    }

    /// Replace the table contents, assigning fresh row ids
    pub fn set_csv(&mut self, columns: Vec<String>, rows: Vec<CsvRow>) {
        self.columns = columns;
        self.rows = rows.into_iter().map(DataSetRow::new).collect();
        self.mark_dirty();
    }

    /// Replace the table contents with parsed CSV text
    pub fn load_csv_text(&mut self, text: &str) {
        let table = csv::from_csv(text);
        self.set_csv(table.columns, table.rows);
    }

    pub fn set_json(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.mark_dirty();
    }

    /// Text written when the data set is saved
    pub fn text_to_save(&self) -> String {
        match self.source_type {
            DataSourceType::Json | DataSourceType::FileJson => self.text.clone(),
            DataSourceType::FileCsv => csv::to_csv_string(&self.to_csv()),
        }
    }

    /// Table view without row ids
    pub fn to_csv(&self) -> Csv {
        Csv {
            columns: self.columns.clone(),
            rows: self.rows.iter().map(|r| r.values.clone()).collect(),
        }
    }

    // ========================
    // Columns
    // ========================

    /// Insert a column after `after`, or at the end if `after` is unknown
    pub fn add_column_after(&mut self, after: &str, name: impl Into<String>) {
        let name = name.into();
        match self.columns.iter().position(|c| c == after) {
            Some(index) => self.columns.insert(index + 1, name.clone()),
            None => self.columns.push(name.clone()),
        }
        for row in &mut self.rows {
            row.values.insert(name.clone(), String::new());
        }
        self.mark_dirty();
    }

    pub fn delete_column(&mut self, name: &str) {
        self.columns.retain(|c| c != name);
        for row in &mut self.rows {
            row.values.remove(name);
        }
        self.mark_dirty();
    }

    // ========================
    // Rows
    // ========================

    /// Append a row with every column blank, returning its id
    pub fn add_row(&mut self) -> String {
        let values: CsvRow = self
            .columns
            .iter()
            .map(|c| (c.clone(), String::new()))
            .collect();
        let row = DataSetRow::new(values);
        let id = row.id.clone();
        self.rows.push(row);
        self.mark_dirty();
        id
    }

    pub fn delete_row(&mut self, id: &str) {
        let before = self.rows.len();
        self.rows.retain(|r| r.id != id);
        if self.rows.len() < before {
            self.mark_dirty();
        }
    }

    pub fn update_row(&mut self, row: DataSetRow) -> Result<()> {
        let existing = self
            .rows
            .iter_mut()
            .find(|r| r.id == row.id)
            .ok_or_else(|| anyhow!("Unable to locate row (ID = {})", row.id))?;
        *existing = row;
        self.mark_dirty();
        Ok(())
    }

    pub fn row(&self, id: &str) -> Option<&DataSetRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// Serialize as JSON indented with three spaces
pub fn to_indented_json<T: Serialize + ?Sized>(value: &T) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if let Err(e) = value.serialize(&mut serializer) {
        tracing::error!(error = %e, "Failed to serialize data set as JSON");
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
