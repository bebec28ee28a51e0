use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_LOG_FILE};
use crate::csv;
use crate::dataset::to_indented_json;
use crate::models::{Csv, DataSet, DataSourceType};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// User settings, read from `~/.csvbridge/config.yaml`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Directory for the log file; the config directory when unset
    pub log_dir: Option<PathBuf>,
    pub log_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            pretty: true,
            log_dir: None,
            log_file: String::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Settings {
    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(config_dir)
    }
}

/// Directory holding settings and logs
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Read a JSON or YAML file into a JSON value
pub fn read_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match extension(path).as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display())),
        _ => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display())),
    }
}

/// Load a data set from a CSV, JSON or YAML file
pub fn load_data_set(path: &Path) -> Result<DataSet> {
    let name = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("Data Set");
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let mut data_set = match extension(path).as_str() {
        "csv" => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let table = csv::from_csv(&content);
            let mut data_set = DataSet::new(name, DataSourceType::FileCsv);
            data_set.set_csv(table.columns, table.rows);
            data_set
        }
        "json" => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut data_set = DataSet::new(name, DataSourceType::FileJson);
            data_set.set_json(content);
            data_set
        }
        "yaml" | "yml" => {
            let value = read_value(path)?;
            let mut data_set = DataSet::new(name, DataSourceType::FileJson);
            data_set.set_json(to_indented_json(&value));
            data_set
        }
        other => {
            return Err(anyhow!(
                "Unsupported data set file type '{}': {}",
                other,
                path.display()
            ))
        }
    };

    data_set.set_file_name(file_name);
    data_set.dirty = false;
    tracing::info!(
        path = %path.display(),
        source_type = data_set.source_type.as_str(),
        rows = data_set.rows.len(),
        "Loaded data set"
    );
    Ok(data_set)
}

/// Read a CSV, JSON or YAML file as a table
///
/// JSON and YAML content must parse; a parse error is returned rather than an
/// empty table.
pub fn load_table(path: &Path) -> Result<Csv> {
    match extension(path).as_str() {
        "csv" => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(csv::from_csv(&content))
        }
        "json" | "yaml" | "yml" => Ok(csv::from_object(&read_value(path)?)),
        other => Err(anyhow!(
            "Unsupported data set file type '{}': {}",
            other,
            path.display()
        )),
    }
}

/// Write a data set's text to disk
pub fn save_data_set(data_set: &mut DataSet, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, data_set.text_to_save())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    data_set.dirty = false;
    tracing::info!(path = %path.display(), id = %data_set.id, "Saved data set");
    Ok(())
}
