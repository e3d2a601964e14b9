use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::config::CsvOptions;
use crate::error::{Error, Result};
use crate::na::NA;
use crate::schema::{Field, FieldType, Schema};
use crate::table::{Record, Table};
use crate::value::{Scalar, Value};

/// Token written for NA cells
pub const NA_TOKEN: &str = "NA";

/// Read a CSV file, inferring each field's type from its cells
pub fn read_csv<P: AsRef<Path>>(path: P, options: &CsvOptions) -> Result<Table> {
    let file = File::open(path.as_ref())?;
    log::debug!("reading CSV {}", path.as_ref().display());
    read_csv_from_reader(file, options)
}

/// Read CSV from any reader, inferring each field's type from its cells
///
/// A field is `int` if every present cell parses as an integer, else `float`
/// if every cell parses as a number, else `bool` if every cell spells out
/// `true` or `false` (any case), else `text`. A field with no present cells is
/// `text`.
pub fn read_csv_from_reader<R: Read>(reader: R, options: &CsvOptions) -> Result<Table> {
    let (headers, rows) = read_raw(reader, options)?;

    let fields: Vec<Field> = headers
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let cells = rows.iter().filter_map(|row| row[col].as_deref());
            Field::new(name.clone(), infer_type(cells))
        })
        .collect();
    let schema = Schema::new(fields)?;

    let columns: Vec<usize> = (0..schema.len()).collect();
    build_table(schema, &columns, rows)
}

/// Read a CSV file against a declared schema
pub fn read_csv_with_schema<P: AsRef<Path>>(
    path: P,
    schema: Schema,
    options: &CsvOptions,
) -> Result<Table> {
    let file = File::open(path.as_ref())?;
    log::debug!("reading CSV {} with declared schema", path.as_ref().display());
    read_csv_with_schema_from_reader(file, schema, options)
}

/// Read CSV from any reader against a declared schema
///
/// With a header row, every schema field must appear in it (in any order);
/// extra columns are ignored. Without one, columns map to schema fields by
/// position.
pub fn read_csv_with_schema_from_reader<R: Read>(
    reader: R,
    schema: Schema,
    options: &CsvOptions,
) -> Result<Table> {
    let (headers, mut rows) = read_raw(reader, options)?;

    let columns: Vec<usize> = if options.has_header {
        schema
            .fields()
            .iter()
            .map(|f| {
                headers
                    .iter()
                    .position(|h| *h == f.name)
                    .ok_or_else(|| Error::MissingField(f.name.clone()))
            })
            .collect::<Result<_>>()?
    } else {
        // short files still map positionally; absent columns read as NA
        for row in &mut rows {
            row.resize(row.len().max(schema.len()), None);
        }
        (0..schema.len()).collect()
    };

    build_table(schema, &columns, rows)
}

// Header names plus rows of cells, where `None` is a null token or a missing cell.
fn read_raw<R: Read>(reader: R, options: &CsvOptions) -> Result<(Vec<String>, Vec<Vec<Option<String>>>)> {
    if !options.delimiter.is_ascii() {
        return Err(Error::InvalidArgument(format!(
            "delimiter must be a single ASCII character, got {:?}",
            options.delimiter
        )));
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(options.has_header)
        .delimiter(options.delimiter as u8)
        .flexible(true)
        .trim(if options.trim { Trim::All } else { Trim::None })
        .from_reader(reader);

    let header_row: Option<Vec<String>> = if options.has_header {
        Some(rdr.headers()?.iter().map(|h| h.to_string()).collect())
    } else {
        None
    };

    let records: Vec<StringRecord> = rdr.records().collect::<std::result::Result<_, _>>()?;

    let headers = match header_row {
        Some(headers) => headers,
        None => {
            let width = records.iter().map(|r| r.len()).max().unwrap_or(0);
            (0..width).map(|i| format!("column_{}", i)).collect()
        }
    };

    let mut rows = Vec::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        if options.has_header && record.len() != headers.len() {
            log::warn!(
                "CSV row {} has {} cells, header has {}; padding or truncating",
                row,
                record.len(),
                headers.len()
            );
        }
        let cells = (0..headers.len())
            .map(|col| match record.get(col) {
                Some(cell) if !options.is_null(cell) => Some(cell.to_string()),
                _ => None,
            })
            .collect();
        rows.push(cells);
    }

    Ok((headers, rows))
}

fn build_table(schema: Schema, columns: &[usize], rows: Vec<Vec<Option<String>>>) -> Result<Table> {
    let mut records = Vec::with_capacity(rows.len());
    for (row, cells) in rows.iter().enumerate() {
        let mut values = Vec::with_capacity(schema.len());
        for (field, &col) in schema.fields().iter().zip(columns) {
            let value = match cells.get(col).and_then(|c| c.as_deref()) {
                Some(text) => parse_cell(field, text, row)?,
                None => NA::NA,
            };
            values.push(value);
        }
        records.push(Record::new(values));
    }
    log::debug!("loaded {} records with {} fields", records.len(), schema.len());
    Table::new(schema, records)
}

fn infer_type<'a>(cells: impl Iterator<Item = &'a str>) -> FieldType {
    let mut any = false;
    let (mut int_ok, mut float_ok, mut bool_ok) = (true, true, true);
    for cell in cells {
        any = true;
        int_ok = int_ok && cell.parse::<i64>().is_ok();
        float_ok = float_ok && cell.parse::<f64>().is_ok();
        bool_ok = bool_ok && infer_bool(cell).is_some();
        if !(int_ok || float_ok || bool_ok) {
            break;
        }
    }
    if !any {
        FieldType::Text
    } else if int_ok {
        FieldType::Int
    } else if float_ok {
        FieldType::Float
    } else if bool_ok {
        FieldType::Bool
    } else {
        FieldType::Text
    }
}

// Spelled-out booleans only; single letters stay text.
fn infer_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

// Declared `bool` fields also take the `T`/`F` shorthand.
fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "T" => Some(true),
        "F" => Some(false),
        _ => infer_bool(cell),
    }
}

fn parse_cell(field: &Field, text: &str, row: usize) -> Result<Value> {
    let parsed = match field.dtype {
        FieldType::Int => text.parse::<i64>().ok().map(Scalar::Int),
        FieldType::Float => text.parse::<f64>().ok().map(Scalar::Float),
        FieldType::Bool => parse_bool(text).map(Scalar::Bool),
        FieldType::Text => Some(Scalar::Text(text.to_string())),
    };
    parsed.map(NA::Value).ok_or_else(|| Error::Parse {
        row,
        field: field.name.clone(),
        dtype: field.dtype.to_string(),
        value: text.to_string(),
    })
}

/// Write the table to a CSV file with a header row; NA cells become `NA`
///
/// Float cells always keep a decimal point so they read back as `float`. A
/// text cell that reads back as missing under the default null tokens (`""`
/// or `NA`) is rejected with `InvalidArgument`.
pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_csv_to_writer(table, file)
}

/// Write the table as CSV to any writer
pub fn write_csv_to_writer<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    wtr.write_record(table.column_names())?;

    let defaults = CsvOptions::default();
    for (row, record) in table.records().iter().enumerate() {
        let cells = table
            .schema()
            .fields()
            .iter()
            .zip(record.values())
            .map(|(field, value)| format_cell(field, value, row, &defaults))
            .collect::<Result<Vec<String>>>()?;
        wtr.write_record(&cells)?;
    }

    wtr.flush()?;
    Ok(())
}

fn format_cell(field: &Field, value: &Value, row: usize, options: &CsvOptions) -> Result<String> {
    match value {
        NA::NA => Ok(NA_TOKEN.to_string()),
        NA::Value(Scalar::Float(v)) => Ok(format!("{:?}", v)),
        NA::Value(Scalar::Text(text)) if options.is_null(text.trim()) => {
            Err(Error::InvalidArgument(format!(
                "row {}, field '{}': text {:?} would read back as missing",
                row, field.name, text
            )))
        }
        NA::Value(scalar) => Ok(scalar.to_string()),
    }
}
