use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::table::Table;

/// Record-oriented JSON: one object per record, NA cells as `null`
pub fn to_json_records(table: &Table) -> JsonValue {
    let names = table.column_names();
    let records = table
        .records()
        .iter()
        .map(|record| {
            let mut obj = Map::with_capacity(names.len());
            for (name, value) in names.iter().zip(record.values()) {
                obj.insert(
                    (*name).to_string(),
                    serde_json::to_value(value).unwrap_or(JsonValue::Null),
                );
            }
            JsonValue::Object(obj)
        })
        .collect();
    JsonValue::Array(records)
}

/// Write the table to a JSON file in record orientation
pub fn write_json<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &to_json_records(table))?;
    Ok(())
}
