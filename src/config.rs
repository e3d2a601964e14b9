//! Configuration: CSV loading options, an optional declared schema, and a
//! pipeline, read from TOML, YAML, or JSON
//!
//! ```toml
//! [csv]
//! null_values = ["", "NA"]
//!
//! [[schema]]
//! name = "species_id"
//! type = "text"
//!
//! [[pipeline.stages]]
//! stage = "tally"
//! by = ["species_id"]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io;
use crate::pipeline::Pipeline;
use crate::schema::{Field, Schema};
use crate::table::Table;

/// Options for reading delimited text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field separator (ASCII)
    pub delimiter: char,
    /// Whether the first row names the fields
    pub has_header: bool,
    /// Trim surrounding whitespace from cells
    pub trim: bool,
    /// Cell contents that mean "missing"
    pub null_values: Vec<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: ',',
            has_header: true,
            trim: true,
            null_values: vec![String::new(), "NA".to_string()],
        }
    }
}

impl CsvOptions {
    /// Whether a cell is one of the configured null tokens
    pub fn is_null(&self, cell: &str) -> bool {
        self.null_values.iter().any(|token| token == cell)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub csv: CsvOptions,
    /// Declared fields; types are inferred from the data when absent
    pub schema: Option<Vec<Field>>,
    pub pipeline: Pipeline,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a config file, choosing the format from its extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        log::debug!("loading config {}", path.display());
        match ext.as_deref() {
            Some("toml") => Self::from_toml_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(Error::Config(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }

    /// The declared schema, if any
    pub fn declared_schema(&self) -> Result<Option<Schema>> {
        self.schema.clone().map(Schema::new).transpose()
    }

    /// Read a CSV file with these options and the declared schema, if any
    pub fn load_table<P: AsRef<Path>>(&self, path: P) -> Result<Table> {
        match self.declared_schema()? {
            Some(schema) => io::read_csv_with_schema(path, schema, &self.csv),
            None => io::read_csv(path, &self.csv),
        }
    }

    /// Load a CSV file and run the configured pipeline over it
    pub fn run<P: AsRef<Path>>(&self, path: P) -> Result<Table> {
        let table = self.load_table(path)?;
        self.pipeline.run(&table)
    }
}
