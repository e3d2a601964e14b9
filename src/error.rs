use thiserror::Error;

/// Error type for every table, pipeline, and plot operation
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("field not found: {0}")]
    MissingField(String),

    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    #[error("type mismatch on field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("record {row} has {found} values, schema has {expected} fields")]
    RecordArity {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("cannot parse {value:?} as {dtype} in field '{field}' (row {row})")]
    Parse {
        row: usize,
        field: String,
        dtype: String,
        value: String,
    },

    #[error("integer overflow computing {0}")]
    Overflow(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error")]
    Io(#[source] std::io::Error),

    #[error("CSV error")]
    Csv(#[source] csv::Error),

    #[error("JSON error")]
    Json(#[source] serde_json::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::InvalidPattern(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    pub(crate) fn type_mismatch(
        field: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Error::TypeMismatch {
            field: field.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
