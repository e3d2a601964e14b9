pub mod csv;
pub mod json;

// Re-export commonly used functions
pub use self::csv::{
    read_csv, read_csv_from_reader, read_csv_with_schema, read_csv_with_schema_from_reader,
    write_csv, write_csv_to_writer,
};
pub use self::json::{to_json_records, write_json};
