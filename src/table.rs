//! Schema-checked, immutable tables
//!
//! A [`Table`] is an ordered sequence of [`Record`]s that all conform to one
//! [`Schema`]. Records are validated once, when the table is built; every
//! operation afterwards returns a new table and leaves its input untouched.

use std::fmt::{self, Display};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::na::NA;
use crate::schema::{FieldType, Schema};
use crate::value::{Scalar, Value};

/// One row: cells aligned with the table schema
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Record { values }
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Record::new(values)
    }
}

/// An immutable snapshot of records sharing one schema
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Arc<Schema>,
    records: Vec<Record>,
}

impl Table {
    /// Build a table, checking every record against the schema.
    ///
    /// `Int` cells in `Float` fields are widened and `Float(NaN)` cells become
    /// NA; any other kind mismatch is a `TypeMismatch`.
    pub fn new(schema: Schema, records: Vec<Record>) -> Result<Self> {
        let mut checked = Vec::with_capacity(records.len());
        for (row, record) in records.into_iter().enumerate() {
            checked.push(check_record(&schema, row, record)?);
        }
        Ok(Table {
            schema: Arc::new(schema),
            records: checked,
        })
    }

    /// Shorthand for [`Table::new`] over plain cell vectors
    pub fn from_rows(schema: Schema, rows: Vec<Vec<Value>>) -> Result<Self> {
        Self::new(schema, rows.into_iter().map(Record::new).collect())
    }

    /// A table with a schema and no records
    pub fn empty(schema: Schema) -> Self {
        Table {
            schema: Arc::new(schema),
            records: Vec::new(),
        }
    }

    // Records produced by crate operations already conform to `schema`.
    pub(crate) fn from_parts(schema: Arc<Schema>, records: Vec<Record>) -> Self {
        Table { schema, records }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, row: usize) -> Option<&Record> {
        self.records.get(row)
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.names()
    }

    /// Cell at `row` in `field`
    pub fn value(&self, row: usize, field: &str) -> Result<&Value> {
        let idx = self.schema.index_of(field)?;
        let record = self.records.get(row).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "row {} out of bounds for table of {} rows",
                row,
                self.records.len()
            ))
        })?;
        Ok(&record.values[idx])
    }

    /// All cells of one field, in record order
    pub fn column(&self, field: &str) -> Result<Vec<&Value>> {
        let idx = self.schema.index_of(field)?;
        Ok(self.records.iter().map(|r| &r.values[idx]).collect())
    }

    /// Keep only `fields`, in the given order
    pub fn select<S: AsRef<str>>(&self, fields: &[S]) -> Result<Table> {
        let mut indices = Vec::with_capacity(fields.len());
        let mut out_fields = Vec::with_capacity(fields.len());
        for name in fields {
            let idx = self.schema.index_of(name.as_ref())?;
            indices.push(idx);
            out_fields.push(self.schema.fields()[idx].clone());
        }
        let schema = Schema::new(out_fields)?;
        let records = self
            .records
            .iter()
            .map(|r| Record::new(indices.iter().map(|&i| r.values[i].clone()).collect()))
            .collect();
        Ok(Table::from_parts(Arc::new(schema), records))
    }

    // Same schema, a subset or reordering of the records.
    pub(crate) fn with_rows(&self, rows: impl IntoIterator<Item = usize>) -> Table {
        let records = rows
            .into_iter()
            .map(|i| self.records[i].clone())
            .collect();
        Table::from_parts(Arc::clone(&self.schema), records)
    }
}

fn check_record(schema: &Schema, row: usize, record: Record) -> Result<Record> {
    if record.len() != schema.len() {
        return Err(Error::RecordArity {
            row,
            expected: schema.len(),
            found: record.len(),
        });
    }
    let mut values = Vec::with_capacity(record.len());
    for (field, value) in schema.fields().iter().zip(record.values) {
        let value = match (field.dtype, value) {
            (_, NA::NA) => NA::NA,
            (FieldType::Float, NA::Value(Scalar::Float(v))) if v.is_nan() => NA::NA,
            (FieldType::Float, NA::Value(Scalar::Int(v))) => NA::Value(Scalar::Float(v as f64)),
            (dtype, NA::Value(scalar)) => {
                if scalar.dtype() != dtype {
                    return Err(Error::type_mismatch(&field.name, dtype, scalar.dtype()));
                }
                NA::Value(scalar)
            }
        };
        values.push(value);
    }
    Ok(Record::new(values))
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.schema.names();
        let cells: Vec<Vec<String>> = self
            .records
            .iter()
            .map(|r| r.values.iter().map(|v| v.to_string()).collect())
            .collect();

        let mut widths: Vec<usize> = names.iter().map(|n| n.chars().count()).collect();
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let header: Vec<String> = names
            .iter()
            .zip(&widths)
            .map(|(n, w)| format!("{:<width$}", n, width = *w))
            .collect();
        writeln!(f, "{}", header.join("  ").trim_end())?;
        for row in &cells {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect();
            writeln!(f, "{}", line.join("  ").trim_end())?;
        }
        write!(f, "# {} rows x {} fields", self.row_count(), self.schema.len())
    }
}
