//! Split-apply-combine over schema-checked in-memory tables
//!
//! Tables are immutable: [`Table::filter`], [`Table::group_by`] +
//! [`GroupBy::aggregate`], [`Table::sort`] and [`Table::limit`] each return a
//! new table. A [`Pipeline`] chains those stages declaratively, and a
//! [`PlotSpec`] describes layered plots of the result for an external
//! renderer.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod groupby;
pub mod io;
pub mod na;
pub mod pipeline;
pub mod plot;
pub mod schema;
pub mod sort;
pub mod table;
pub mod value;

// Re-export commonly used types
pub use aggregate::{NamedAgg, NullPolicy, Reducer};
pub use config::{Config, CsvOptions};
pub use error::{Error, Result};
pub use filter::{CompareOp, Predicate};
pub use groupby::{Group, GroupBy, GroupKey};
pub use na::NA;
pub use pipeline::{Pipeline, Stage};
pub use plot::{Channel, Encoding, Geom, Layer, PlotSpec, Renderer};
pub use schema::{Field, FieldType, Schema};
pub use sort::{SortKey, SortOrder};
pub use table::{Record, Table};
pub use value::{na, val, Scalar, Value};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
