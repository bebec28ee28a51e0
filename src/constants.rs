//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Column used for scalar values that are not JSON objects
pub const DATA_COLUMN: &str = "data";

/// Field delimiter, fixed to comma
pub const CSV_DELIMITER: char = ',';

/// Quote character used to wrap fields containing delimiters or quotes
pub const CSV_QUOTE: char = '"';

/// Indentation used when pretty-printing data sets as JSON
pub const JSON_INDENT: &[u8] = b"   ";

/// Name of the settings directory under the user's home directory
pub const CONFIG_DIR_NAME: &str = ".csvbridge";

/// Settings file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default log file name
pub const DEFAULT_LOG_FILE: &str = "csvbridge.log";

/// Application name
pub const APP_NAME: &str = "csvbridge";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
