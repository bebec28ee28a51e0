//! CSV conversion between raw text, tabular [`Csv`] data and JSON values
//!
//! All functions here are pure. Malformed input never fails; it degrades to
//! whatever the line splitter and JSON sniffing can make of it.

pub mod escape;

use std::borrow::Cow;
use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::constants::{CSV_DELIMITER, DATA_COLUMN};
use crate::models::{Csv, CsvRow};

pub use escape::{escape_csv, split_line, unescape_csv, unquote_field};

/// Parse CSV text into columns and rows
///
/// The first line holds the column names. Empty lines are skipped. A row with
/// fewer values than columns leaves the trailing columns out of its map, and
/// values beyond the last column are dropped. If a column name repeats, the
/// last value for it wins.
pub fn from_csv(text: &str) -> Csv {
    let mut lines = text.split('\n');
    let header = lines.next().unwrap_or_default();
    let columns: Vec<String> = split_line(header).into_iter().map(unquote_field).collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for line in lines {
        if line.is_empty() {
            skipped += 1;
            continue;
        }

        let values = split_line(line);
        if values.len() != columns.len() {
            tracing::trace!(
                expected = columns.len(),
                found = values.len(),
                "CSV row width does not match header"
            );
        }

        let row: CsvRow = columns
            .iter()
            .zip(values)
            .map(|(column, value)| (column.clone(), unquote_field(value)))
            .collect();
        rows.push(row);
    }

    tracing::debug!(
        columns = columns.len(),
        rows = rows.len(),
        skipped,
        "Parsed CSV text"
    );

    Csv { columns, rows }
}

/// Render columns and rows as CSV text
///
/// Lines are joined with `\n` and no trailing newline is written. A row that
/// lacks one of the columns gets an empty field for it.
pub fn to_csv_string(data: &Csv) -> String {
    let header = join_fields(data.columns.iter().map(escape_csv));
    let lines = data.rows.iter().map(|row| {
        join_fields(
            data.columns
                .iter()
                .map(|column| row.get(column).map(escape_csv).unwrap_or_default()),
        )
    });

    std::iter::once(header)
        .chain(lines)
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_fields(fields: impl Iterator<Item = String>) -> String {
    fields
        .collect::<Vec<_>>()
        .join(CSV_DELIMITER.to_string().as_str())
}

/// Convert rows into JSON objects keyed by column, in column order
///
/// Cells are unescaped, and cells that look like a JSON object or array are
/// parsed so nested data survives a trip through CSV.
pub fn to_object(data: &Csv) -> Vec<Map<String, Value>> {
    data.rows
        .iter()
        .map(|row| {
            data.columns
                .iter()
                .map(|column| (column.clone(), cell_value(row.get(column).map(String::as_str))))
                .collect()
        })
        .collect()
}

fn cell_value(raw: Option<&str>) -> Value {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Value::String(String::new()),
    };

    let text = unescape_csv(raw);
    if looks_like_json(&text) {
        match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => return parsed,
            Err(e) => tracing::trace!(error = %e, "Cell looked like JSON but did not parse"),
        }
    }
    Value::String(text)
}

fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

/// Flatten any JSON value into columns and rows
///
/// A non-array value is treated as a one-element array. Elements that are not
/// objects land in the `data` column. Columns appear in the order their keys
/// are first seen, and nested objects or arrays are stored as compact JSON.
pub fn from_object(data: &Value) -> Csv {
    let items: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    if items.is_empty() {
        return Csv::default();
    }

    let records: Vec<Cow<'_, Map<String, Value>>> = items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Cow::Borrowed(map),
            Value::Null => Cow::Owned(data_record(Value::String(String::new()))),
            other => Cow::Owned(data_record(other.clone())),
        })
        .collect();

    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for record in &records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }

    let rows: Vec<CsvRow> = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| (column.clone(), cell_text(record.get(column))))
                .collect()
        })
        .collect();

    tracing::debug!(columns = columns.len(), rows = rows.len(), "Flattened JSON value");

    Csv { columns, rows }
}

/// Like [`from_object`], for any serializable value
pub fn from_serializable<T: Serialize + ?Sized>(data: &T) -> Result<Csv> {
    let value = serde_json::to_value(data).context("Failed to convert data to JSON")?;
    Ok(from_object(&value))
}

fn data_record(value: Value) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert(DATA_COLUMN.to_string(), value);
    record
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => number_text(n),
        Some(Value::Bool(b)) => b.to_string(),
        Some(nested) => serde_json::to_string(nested).unwrap_or_default(),
    }
}

/// Shortest base-10 text for a number, `10.0` as `10`
///
/// Magnitudes of 1e21 and above, or below 1e-6, use exponent form with an
/// explicit sign (`1e+21`, `1e-7`).
fn number_text(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    let f = match n.as_f64() {
        Some(f) => f,
        None => return n.to_string(),
    };
    if f == 0.0 {
        return String::from("0");
    }

    let magnitude = f.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{}", f);
    }

    let exponent = format!("{:e}", f);
    match exponent.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => exponent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, &str)]) -> CsvRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_csv_simple() {
        let result = from_csv("name,age\nAlice,30\nBob,25");
        assert_eq!(result.columns, columns(&["name", "age"]));
        assert_eq!(
            result.rows,
            vec![
                row(&[("name", "Alice"), ("age", "30")]),
                row(&[("name", "Bob"), ("age", "25")]),
            ]
        );
    }

    #[test]
    fn test_from_csv_quoted_commas_and_quotes() {
        let text = "product,description\nItem 1,\"A \"\"special\"\" item, very unique\"";
        let result = from_csv(text);
        assert_eq!(
            result.rows,
            vec![row(&[("product", "Item 1"), ("description", "A \"special\" item, very unique")])]
        );
    }

    #[test]
    fn test_from_csv_quoted_headers() {
        let text = "Full Name,\"Address, City\",\"Favorite \"\"Color\"\"\"\nAlice Smith,\"123 Main St, NYC\",Blue";
        let result = from_csv(text);
        assert_eq!(
            result.columns,
            columns(&["Full Name", "Address, City", "Favorite \"Color\""])
        );
        assert_eq!(result.rows[0]["Address, City"], "123 Main St, NYC");
        assert_eq!(result.rows[0]["Favorite \"Color\""], "Blue");
    }

    #[test]
    fn test_from_csv_mixed_fields() {
        let text = "ID,\"Name, Title\",Quote,Active,Price\n\
                    1,\"Dr. Smith, PhD\",\"He said \"\"hello, world\"\"\",true,99.99\n\
                    2,Ms. Jones,Simple text,false,49.5";
        let result = from_csv(text);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0]["Name, Title"], "Dr. Smith, PhD");
        assert_eq!(result.rows[0]["Quote"], "He said \"hello, world\"");
        assert_eq!(result.rows[1]["Price"], "49.5");
    }

    #[test]
    fn test_from_csv_empty_fields() {
        let result = from_csv("name,email,phone\nAlice,alice@example.com,\n,bob@example.com,555-1234");
        assert_eq!(
            result.rows,
            vec![
                row(&[("name", "Alice"), ("email", "alice@example.com"), ("phone", "")]),
                row(&[("name", ""), ("email", "bob@example.com"), ("phone", "555-1234")]),
            ]
        );
    }

    #[test]
    fn test_from_csv_skips_blank_lines() {
        let result = from_csv("name,value\nAlice,123\n\nBob,456\n");
        assert_eq!(result.columns, columns(&["name", "value"]));
        assert_eq!(
            result.rows,
            vec![
                row(&[("name", "Alice"), ("value", "123")]),
                row(&[("name", "Bob"), ("value", "456")]),
            ]
        );
    }

    #[test]
    fn test_from_csv_single_column() {
        let result = from_csv("name\nAlice\nBob\nCharlie");
        assert_eq!(result.columns, columns(&["name"]));
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[2]["name"], "Charlie");
    }

    #[test]
    fn test_from_csv_short_and_long_rows() {
        let result = from_csv("a,b,c\n1\n1,2,3,4");
        assert_eq!(result.rows[0], row(&[("a", "1")]));
        assert!(!result.rows[0].contains_key("b"));
        assert_eq!(result.rows[1], row(&[("a", "1"), ("b", "2"), ("c", "3")]));
    }

    #[test]
    fn test_from_csv_duplicate_columns_last_wins() {
        let result = from_csv("a,a\n1,2");
        assert_eq!(result.columns, columns(&["a", "a"]));
        assert_eq!(result.rows[0], row(&[("a", "2")]));
    }

    #[test]
    fn test_from_csv_empty_input() {
        let result = from_csv("");
        assert_eq!(result.columns, columns(&[""]));
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_from_csv_trims_carriage_returns() {
        let result = from_csv("a,b\r\n1,2\r\n");
        assert_eq!(result.columns, columns(&["a", "b"]));
        assert_eq!(result.rows[0]["b"], "2");
    }

    #[test]
    fn test_to_csv_string_simple() {
        let data = Csv::new(
            columns(&["name"]),
            vec![row(&[("name", "Alice")]), row(&[("name", "Bob")])],
        );
        assert_eq!(to_csv_string(&data), "name\nAlice\nBob");
    }

    #[test]
    fn test_to_csv_string_escapes_values_and_headers() {
        let data = Csv::new(
            columns(&["name", "Favorite \"Color\"", "notes"]),
            vec![row(&[
                ("name", "Product A"),
                ("Favorite \"Color\"", "Blue, mostly"),
                ("notes", "Line 1\nLine 2"),
            ])],
        );
        assert_eq!(
            to_csv_string(&data),
            "name,\"Favorite \"\"Color\"\"\",notes\nProduct A,\"Blue, mostly\",Line 1\\nLine 2"
        );
    }

    #[test]
    fn test_to_csv_string_missing_cell_is_empty() {
        let data = Csv::new(
            columns(&["name", "email", "phone"]),
            vec![row(&[("name", "Bob")])],
        );
        assert_eq!(to_csv_string(&data), "name,email,phone\nBob,,");
    }

    #[test]
    fn test_to_csv_string_no_rows() {
        let data = Csv::new(columns(&["a", "b"]), Vec::new());
        assert_eq!(to_csv_string(&data), "a,b");
    }

    #[test]
    fn test_table_round_trip() {
        let original = Csv::new(
            columns(&["ID", "Name, Title", "Favorite \"Color\"", "phone"]),
            vec![
                row(&[
                    ("ID", "1"),
                    ("Name, Title", "Dr. Smith, PhD"),
                    ("Favorite \"Color\"", "Blue \"Sky\""),
                    ("phone", ""),
                ]),
                row(&[
                    ("ID", "2"),
                    ("Name, Title", "Ms. Jones"),
                    ("Favorite \"Color\"", "Both \"quotes\" and, commas"),
                    ("phone", "555-1234"),
                ]),
            ],
        );
        let parsed = from_csv(&to_csv_string(&original));
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_to_object_column_order_and_missing_values() {
        let data = Csv::new(
            columns(&["z_field", "a_field", "m_field"]),
            vec![row(&[("z_field", "Z"), ("a_field", "A")])],
        );
        let result = to_object(&data);
        assert_eq!(result.len(), 1);
        let keys: Vec<&String> = result[0].keys().collect();
        assert_eq!(keys, vec!["z_field", "a_field", "m_field"]);
        assert_eq!(result[0]["m_field"], json!(""));
    }

    #[test]
    fn test_to_object_unescapes_cells() {
        let data = Csv::new(
            columns(&["description"]),
            vec![row(&[("description", "Has\\ttabs\\tand\\nnewlines")])],
        );
        let result = to_object(&data);
        assert_eq!(result[0]["description"], json!("Has\ttabs\tand\nnewlines"));
    }

    #[test]
    fn test_to_object_parses_json_cells() {
        let data = Csv::new(
            columns(&["user", "tags", "broken"]),
            vec![row(&[
                ("user", r#"{"name":"Alice"}"#),
                ("tags", "[1, 2, 3]"),
                ("broken", "{not json}"),
            ])],
        );
        let result = to_object(&data);
        assert_eq!(result[0]["user"], json!({"name": "Alice"}));
        assert_eq!(result[0]["tags"], json!([1, 2, 3]));
        assert_eq!(result[0]["broken"], json!("{not json}"));
    }

    #[test]
    fn test_to_object_empty_rows() {
        let data = Csv::new(columns(&["name", "value"]), Vec::new());
        assert!(to_object(&data).is_empty());
    }

    #[test]
    fn test_from_object_simple_objects() {
        let result = from_object(&json!([
            {"name": "Alice", "age": 30, "active": true},
            {"name": "Bob", "age": 25, "active": false}
        ]));
        assert_eq!(result.columns, columns(&["name", "age", "active"]));
        assert_eq!(
            result.rows[0],
            row(&[("name", "Alice"), ("age", "30"), ("active", "true")])
        );
        assert_eq!(result.rows[1]["active"], "false");
    }

    #[test]
    fn test_from_object_wraps_single_values() {
        let result = from_object(&json!({"name": "Alice"}));
        assert_eq!(result.columns, columns(&["name"]));
        assert_eq!(result.rows, vec![row(&[("name", "Alice")])]);

        let result = from_object(&json!(42));
        assert_eq!(result.columns, columns(&["data"]));
        assert_eq!(result.rows, vec![row(&[("data", "42")])]);

        let result = from_object(&Value::Null);
        assert_eq!(result.columns, columns(&["data"]));
        assert_eq!(result.rows, vec![row(&[("data", "")])]);
    }

    #[test]
    fn test_from_object_empty_array() {
        let result = from_object(&json!([]));
        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_from_object_mixed_elements() {
        let result = from_object(&json!([1, "x", {"a": 1}]));
        assert_eq!(result.columns, columns(&["data", "a"]));
        assert_eq!(result.rows[0], row(&[("data", "1"), ("a", "")]));
        assert_eq!(result.rows[1], row(&[("data", "x"), ("a", "")]));
        assert_eq!(result.rows[2], row(&[("data", ""), ("a", "1")]));
    }

    #[test]
    fn test_from_object_columns_in_first_occurrence_order() {
        let result = from_object(&json!([
            {"z": "Z1", "a": "A1"},
            {"a": "A2", "m": "M2", "z": "Z2"}
        ]));
        assert_eq!(result.columns, columns(&["z", "a", "m"]));
        assert_eq!(result.rows[0]["m"], "");
    }

    #[test]
    fn test_from_object_nested_values_become_json() {
        let result = from_object(&json!({
            "users": ["Alice", "Bob"],
            "owner": {"name": "Alice", "phones": ["555-1234"]},
            "missing": null
        }));
        assert_eq!(result.rows[0]["users"], r#"["Alice","Bob"]"#);
        assert_eq!(result.rows[0]["owner"], r#"{"name":"Alice","phones":["555-1234"]}"#);
        assert_eq!(result.rows[0]["missing"], "");
    }

    #[test]
    fn test_from_object_number_text() {
        let result = from_object(&json!([{
            "p": 10.0,
            "q": 2.5,
            "neg": -0.5,
            "zero": -0.0,
            "big": 1e21,
            "large": 1e20,
            "tiny": 1e-7,
            "count": 42,
            "max": u64::MAX
        }]));
        let cells = &result.rows[0];
        assert_eq!(cells["p"], "10");
        assert_eq!(cells["q"], "2.5");
        assert_eq!(cells["neg"], "-0.5");
        assert_eq!(cells["zero"], "0");
        assert_eq!(cells["big"], "1e+21");
        assert_eq!(cells["large"], "100000000000000000000");
        assert_eq!(cells["tiny"], "1e-7");
        assert_eq!(cells["count"], "42");
        assert_eq!(cells["max"], "18446744073709551615");
    }

    #[test]
    fn test_from_object_array_element_goes_to_data_column() {
        let result = from_object(&json!([[1, 2], {"a": "b"}]));
        assert_eq!(result.columns, columns(&["data", "a"]));
        assert_eq!(result.rows[0]["data"], "[1,2]");
    }

    #[test]
    fn test_object_round_trip_scalars() {
        let original = json!([
            {"name": "Alice", "age": 30, "active": true},
            {"name": "Bob", "age": 25, "active": false}
        ]);
        let result = to_object(&from_object(&original));
        assert_eq!(
            Value::Array(result.into_iter().map(Value::Object).collect()),
            json!([
                {"name": "Alice", "age": "30", "active": "true"},
                {"name": "Bob", "age": "25", "active": "false"}
            ])
        );
    }

    #[test]
    fn test_object_round_trip_nested() {
        let result = to_object(&from_object(&json!([{"a": {"x": 1}}])));
        assert_eq!(result[0]["a"], json!({"x": 1}));
    }

    #[test]
    fn test_nested_survives_csv_text() {
        let csv = from_object(&json!([{"id": 1, "user": {"name": "Alice", "tags": ["a", "b"]}}]));
        let text = to_csv_string(&csv);
        let result = to_object(&from_csv(&text));
        assert_eq!(result[0]["id"], json!("1"));
        assert_eq!(result[0]["user"], json!({"name": "Alice", "tags": ["a", "b"]}));
    }

    #[test]
    fn test_from_serializable_with_timestamps() {
        use chrono::{TimeZone, Utc};

        #[derive(Serialize)]
        struct Event {
            name: String,
            date: chrono::DateTime<Utc>,
        }

        let events = vec![Event {
            name: "Event 1".to_string(),
            date: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        }];
        let result = from_serializable(&events).unwrap();
        assert_eq!(result.columns, columns(&["name", "date"]));
        assert!(result.rows[0]["date"].starts_with("2024-01-15T10:30:00"));
    }
}
