//! Declared field names and types

use std::collections::HashSet;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scalar type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Int,
    Float,
    Text,
    Bool,
}

impl FieldType {
    /// Whether arithmetic reducers accept this type
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float)
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Text => "text",
            FieldType::Bool => "bool",
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named, typed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub dtype: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, dtype: FieldType) -> Self {
        Field {
            name: name.into(),
            dtype,
        }
    }
}

/// Ordered set of uniquely named fields shared by every record of a table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Create a schema, rejecting repeated field names
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::DuplicateField(field.name.clone()));
            }
        }
        Ok(Schema { fields })
    }

    /// Shorthand for building a schema from `(name, type)` pairs
    pub fn from_pairs(pairs: &[(&str, FieldType)]) -> Result<Self> {
        Self::new(
            pairs
                .iter()
                .map(|(name, dtype)| Field::new(*name, *dtype))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Position of a field, or `MissingField`
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| Error::MissingField(name.to_string()))
    }

    /// Declared type of a field, or `MissingField`
    pub fn dtype_of(&self, name: &str) -> Result<FieldType> {
        self.index_of(name).map(|idx| self.fields[idx].dtype)
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}
