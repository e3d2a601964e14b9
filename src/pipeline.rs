//! Linear chains of table stages
//!
//! A [`Pipeline`] is a declarative list of [`Stage`]s. Running it feeds each
//! stage's output table into the next one; the first failing stage aborts the
//! chain and its error is returned as is.
//!
//! ```
//! use tallyrs::{Pipeline, Predicate};
//!
//! let top_species = Pipeline::new()
//!     .filter(Predicate::not_null("species_id"))
//!     .group_by(["species_id"])
//!     .tally("n")
//!     .sort("n", true)
//!     .limit(5);
//! assert_eq!(top_species.len(), 4);
//! ```

use serde::{Deserialize, Serialize};

use crate::aggregate::NamedAgg;
use crate::error::Result;
use crate::filter::Predicate;
use crate::sort::{SortKey, SortOrder};
use crate::table::Table;

fn default_tally_name() -> String {
    "n".to_string()
}

/// One step of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    /// Keep records for which the predicate is true
    Filter { predicate: Predicate },
    /// Keep only the listed fields
    Select { fields: Vec<String> },
    /// Reduce the whole table to one record of statistics
    Summarize { aggregations: Vec<NamedAgg> },
    /// Group by `by` and compute statistics per group
    Aggregate {
        by: Vec<String>,
        aggregations: Vec<NamedAgg>,
    },
    /// Group by `by` and count records per group
    Tally {
        by: Vec<String>,
        #[serde(default = "default_tally_name")]
        name: String,
    },
    /// Stable multi-key sort
    Sort { keys: Vec<SortKey> },
    /// Keep the first `n` records
    Limit { n: i64 },
}

impl Stage {
    /// Apply this stage to `table`, producing a new table
    pub fn apply(&self, table: &Table) -> Result<Table> {
        match self {
            Stage::Filter { predicate } => table.filter(predicate),
            Stage::Select { fields } => table.select(fields),
            Stage::Summarize { aggregations } => table.summarize(aggregations),
            Stage::Aggregate { by, aggregations } => table.group_by(by)?.aggregate(aggregations),
            Stage::Tally { by, name } => table.tally(by, name),
            Stage::Sort { keys } => table.sort_by(keys),
            Stage::Limit { n } => table.limit(*n),
        }
    }

    /// Short stage name used in log output
    pub fn kind(&self) -> &'static str {
        match self {
            Stage::Filter { .. } => "filter",
            Stage::Select { .. } => "select",
            Stage::Summarize { .. } => "summarize",
            Stage::Aggregate { .. } => "aggregate",
            Stage::Tally { .. } => "tally",
            Stage::Sort { .. } => "sort",
            Stage::Limit { .. } => "limit",
        }
    }
}

/// An ordered chain of stages
///
/// Builder methods consume the pipeline and return the extended one, so a
/// pipeline value never changes after it is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline::default()
    }

    pub fn from_stages(stages: Vec<Stage>) -> Self {
        Pipeline { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Append an arbitrary stage
    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn filter(self, predicate: Predicate) -> Self {
        self.then(Stage::Filter { predicate })
    }

    pub fn select<S: AsRef<str>>(self, fields: &[S]) -> Self {
        self.then(Stage::Select {
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
        })
    }

    /// Start a grouping; it must be closed with `aggregate` or `tally`
    pub fn group_by<I, S>(self, fields: I) -> GroupedPipeline
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        GroupedPipeline {
            pipeline: self,
            by: fields.into_iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// Statistics over the whole table
    pub fn summarize(self, aggregations: Vec<NamedAgg>) -> Self {
        self.then(Stage::Summarize { aggregations })
    }

    pub fn sort(self, field: impl Into<String>, descending: bool) -> Self {
        let order = if descending {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };
        self.sort_by(vec![SortKey {
            field: field.into(),
            order,
        }])
    }

    pub fn sort_by(self, keys: Vec<SortKey>) -> Self {
        self.then(Stage::Sort { keys })
    }

    pub fn limit(self, n: i64) -> Self {
        self.then(Stage::Limit { n })
    }

    /// Run every stage in order against `input`
    pub fn run(&self, input: &Table) -> Result<Table> {
        let mut current = input.clone();
        for (i, stage) in self.stages.iter().enumerate() {
            let rows_in = current.row_count();
            current = stage.apply(&current).map_err(|err| {
                log::warn!("stage {} ({}) failed: {}", i, stage.kind(), err);
                err
            })?;
            log::debug!(
                "stage {} ({}): {} -> {} records",
                i,
                stage.kind(),
                rows_in,
                current.row_count()
            );
        }
        log::info!(
            "pipeline of {} stages produced {} records",
            self.stages.len(),
            current.row_count()
        );
        Ok(current)
    }
}

/// A pipeline with a pending grouping
#[derive(Debug, Clone)]
pub struct GroupedPipeline {
    pipeline: Pipeline,
    by: Vec<String>,
}

impl GroupedPipeline {
    /// Close the grouping with named statistics
    pub fn aggregate(self, aggregations: Vec<NamedAgg>) -> Pipeline {
        self.pipeline.then(Stage::Aggregate {
            by: self.by,
            aggregations,
        })
    }

    /// Close the grouping with a record count per group
    pub fn tally(self, name: impl Into<String>) -> Pipeline {
        self.pipeline.then(Stage::Tally {
            by: self.by,
            name: name.into(),
        })
    }
}
