//! Per-group reducers and the split-apply-combine step
//!
//! Each [`Reducer`] declares how it treats missing values through
//! [`Reducer::null_policy`]. That table is the only place the policy is
//! decided:
//!
//! | reducer          | policy                 | output              |
//! |------------------|------------------------|---------------------|
//! | `tally`          | counts rows            | int                 |
//! | `count`          | skips NA               | int                 |
//! | `count_distinct` | skips NA               | int                 |
//! | `sum`            | any NA gives NA        | int or float        |
//! | `mean`           | any NA gives NA        | float               |
//! | `median`         | any NA gives NA        | float               |
//! | `std`            | any NA gives NA        | float               |
//! | `min` / `max`    | any NA gives NA        | same as input       |
//!
//! Missing values are never dropped implicitly by a propagating reducer. To
//! reduce over present values only, filter with
//! [`Predicate::not_null`](crate::filter::Predicate::not_null) first.

use std::collections::HashSet;
use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::groupby::GroupBy;
use crate::na::NA;
use crate::schema::{Field, FieldType, Schema};
use crate::table::{Record, Table};
use crate::value::{Scalar, Value};

/// How a reducer treats missing input values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    /// Counts records; field values are not inspected
    CountRows,
    /// Ignores NA inputs
    SkipNulls,
    /// Any NA input makes the result NA
    Propagate,
}

/// Statistic computed over the records of one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    /// Number of records
    Tally,
    /// Number of present values
    Count,
    /// Number of distinct present values
    CountDistinct,
    Sum,
    Mean,
    Median,
    /// Sample standard deviation
    Std,
    Min,
    Max,
}

impl Reducer {
    pub const ALL: [Reducer; 9] = [
        Reducer::Tally,
        Reducer::Count,
        Reducer::CountDistinct,
        Reducer::Sum,
        Reducer::Mean,
        Reducer::Median,
        Reducer::Std,
        Reducer::Min,
        Reducer::Max,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Reducer::Tally => "tally",
            Reducer::Count => "count",
            Reducer::CountDistinct => "count_distinct",
            Reducer::Sum => "sum",
            Reducer::Mean => "mean",
            Reducer::Median => "median",
            Reducer::Std => "std",
            Reducer::Min => "min",
            Reducer::Max => "max",
        }
    }

    /// Missing-value policy of this reducer
    pub fn null_policy(self) -> NullPolicy {
        match self {
            Reducer::Tally => NullPolicy::CountRows,
            Reducer::Count | Reducer::CountDistinct => NullPolicy::SkipNulls,
            Reducer::Sum
            | Reducer::Mean
            | Reducer::Median
            | Reducer::Std
            | Reducer::Min
            | Reducer::Max => NullPolicy::Propagate,
        }
    }

    /// Whether the reducer reads an input field
    pub fn needs_field(self) -> bool {
        self != Reducer::Tally
    }

    /// Output type for an input field of type `input`
    pub fn output_type(self, field: &str, input: Option<FieldType>) -> Result<FieldType> {
        match (self, input) {
            (Reducer::Tally, _) | (Reducer::Count, _) | (Reducer::CountDistinct, _) => {
                Ok(FieldType::Int)
            }
            (_, None) => Err(Error::InvalidArgument(format!(
                "reducer '{}' needs an input field",
                self
            ))),
            (Reducer::Sum, Some(t)) if t.is_numeric() => Ok(t),
            (Reducer::Mean | Reducer::Median | Reducer::Std, Some(t)) if t.is_numeric() => {
                Ok(FieldType::Float)
            }
            (Reducer::Min | Reducer::Max, Some(t)) => Ok(t),
            (_, Some(t)) => Err(Error::type_mismatch(field, "a numeric type", t)),
        }
    }
}

impl Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Reducer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tally" | "n" => Ok(Reducer::Tally),
            "count" => Ok(Reducer::Count),
            "count_distinct" | "n_distinct" => Ok(Reducer::CountDistinct),
            "sum" => Ok(Reducer::Sum),
            "mean" | "avg" => Ok(Reducer::Mean),
            "median" => Ok(Reducer::Median),
            "std" | "sd" => Ok(Reducer::Std),
            "min" => Ok(Reducer::Min),
            "max" => Ok(Reducer::Max),
            other => Err(Error::InvalidArgument(format!("unknown reducer '{}'", other))),
        }
    }
}

/// A named output statistic: `name = reducer(field)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedAgg {
    pub name: String,
    pub reducer: Reducer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl NamedAgg {
    pub fn new(name: impl Into<String>, reducer: Reducer, field: impl Into<String>) -> Self {
        NamedAgg {
            name: name.into(),
            reducer,
            field: Some(field.into()),
        }
    }

    /// Row count; reads no field
    pub fn tally(name: impl Into<String>) -> Self {
        NamedAgg {
            name: name.into(),
            reducer: Reducer::Tally,
            field: None,
        }
    }

    pub fn count(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, Reducer::Count, field)
    }

    pub fn count_distinct(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, Reducer::CountDistinct, field)
    }

    pub fn sum(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, Reducer::Sum, field)
    }

    pub fn mean(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, Reducer::Mean, field)
    }

    pub fn median(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, Reducer::Median, field)
    }

    pub fn std(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, Reducer::Std, field)
    }

    pub fn min(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, Reducer::Min, field)
    }

    pub fn max(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, Reducer::Max, field)
    }
}

struct BoundAgg<'n> {
    name: &'n str,
    reducer: Reducer,
    idx: Option<usize>,
    output: FieldType,
}

fn bind_aggs<'n>(schema: &Schema, keys: &[String], aggs: &'n [NamedAgg]) -> Result<Vec<BoundAgg<'n>>> {
    let mut names: HashSet<&str> = keys.iter().map(String::as_str).collect();
    let mut bound = Vec::with_capacity(aggs.len());
    for agg in aggs {
        if !names.insert(agg.name.as_str()) {
            return Err(Error::DuplicateField(agg.name.clone()));
        }
        let (idx, input) = match (&agg.field, agg.reducer.needs_field()) {
            (Some(field), true) => {
                let idx = schema.index_of(field)?;
                (Some(idx), Some(schema.fields()[idx].dtype))
            }
            (None, true) => {
                return Err(Error::InvalidArgument(format!(
                    "statistic '{}' uses reducer '{}' but names no field",
                    agg.name, agg.reducer
                )))
            }
            // tally counts rows, but a field it names must still exist
            (Some(field), false) => {
                schema.index_of(field)?;
                (None, None)
            }
            (None, false) => (None, None),
        };
        let field_name = agg.field.as_deref().unwrap_or(&agg.name);
        let output = agg.reducer.output_type(field_name, input)?;
        bound.push(BoundAgg {
            name: &agg.name,
            reducer: agg.reducer,
            idx,
            output,
        });
    }
    Ok(bound)
}

fn output_schema(source: &Schema, key_indices: &[usize], bound: &[BoundAgg<'_>]) -> Result<Schema> {
    let mut fields: Vec<Field> = key_indices
        .iter()
        .map(|&i| source.fields()[i].clone())
        .collect();
    fields.extend(bound.iter().map(|b| Field::new(b.name, b.output)));
    Schema::new(fields)
}

pub(crate) fn aggregate_groups(grouping: &GroupBy<'_>, aggs: &[NamedAgg]) -> Result<Table> {
    let source = grouping.source();
    let bound = bind_aggs(source.schema(), grouping.by(), aggs)?;
    let schema = output_schema(source.schema(), grouping.key_indices(), &bound)?;

    let mut records = Vec::with_capacity(grouping.group_count());
    for group in grouping.groups() {
        let members: Vec<&Record> = grouping.records(group).collect();
        let mut values = group.key().values().to_vec();
        for agg in &bound {
            values.push(reduce(agg, &members)?);
        }
        records.push(Record::new(values));
    }

    log::debug!(
        "aggregated {} groups into {} statistics",
        records.len(),
        bound.len()
    );
    Ok(Table::from_parts(Arc::new(schema), records))
}

impl Table {
    /// Reduce the whole table to a single record of statistics
    pub fn summarize(&self, aggs: &[NamedAgg]) -> Result<Table> {
        let bound = bind_aggs(self.schema(), &[], aggs)?;
        let schema = output_schema(self.schema(), &[], &bound)?;
        let members: Vec<&Record> = self.records().iter().collect();
        let values = bound
            .iter()
            .map(|agg| reduce(agg, &members))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table::from_parts(Arc::new(schema), vec![Record::new(values)]))
    }
}

fn reduce(agg: &BoundAgg<'_>, records: &[&Record]) -> Result<Value> {
    let present: Vec<&Scalar> = match (agg.reducer.null_policy(), agg.idx) {
        (NullPolicy::CountRows, _) | (_, None) => {
            return Ok(NA::Value(Scalar::Int(records.len() as i64)));
        }
        (NullPolicy::SkipNulls, Some(idx)) => records
            .iter()
            .filter_map(|r| r.values()[idx].value())
            .collect(),
        (NullPolicy::Propagate, Some(idx)) => {
            let mut present = Vec::with_capacity(records.len());
            for record in records {
                match &record.values()[idx] {
                    NA::Value(v) => present.push(v),
                    NA::NA => return Ok(NA::NA),
                }
            }
            present
        }
    };

    let result = match agg.reducer {
        Reducer::Tally => Some(Scalar::Int(records.len() as i64)),
        Reducer::Count => Some(Scalar::Int(present.len() as i64)),
        Reducer::CountDistinct => {
            let distinct: HashSet<&Scalar> = present.iter().copied().collect();
            Some(Scalar::Int(distinct.len() as i64))
        }
        Reducer::Sum => Some(sum(agg, &present)?),
        Reducer::Mean => mean(&numbers(&present)).map(Scalar::Float),
        Reducer::Median => median(numbers(&present)).map(Scalar::Float),
        Reducer::Std => std_dev(&numbers(&present)).map(Scalar::Float),
        Reducer::Min => extreme(&present, std::cmp::Ordering::Less),
        Reducer::Max => extreme(&present, std::cmp::Ordering::Greater),
    };
    Ok(result.into())
}

fn numbers(values: &[&Scalar]) -> Vec<f64> {
    values.iter().filter_map(|v| v.as_f64()).collect()
}

fn sum(agg: &BoundAgg<'_>, values: &[&Scalar]) -> Result<Scalar> {
    if agg.output == FieldType::Int {
        let mut total: i64 = 0;
        for v in values {
            if let Scalar::Int(x) = v {
                total = total
                    .checked_add(*x)
                    .ok_or_else(|| Error::Overflow(format!("sum '{}'", agg.name)))?;
            }
        }
        Ok(Scalar::Int(total))
    } else {
        Ok(Scalar::Float(numbers(values).iter().sum()))
    }
}

fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

fn median(mut xs: Vec<f64>) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    xs.sort_by(|a, b| a.total_cmp(b));
    let mid = xs.len() / 2;
    if xs.len() % 2 == 0 {
        Some((xs[mid - 1] + xs[mid]) / 2.0)
    } else {
        Some(xs[mid])
    }
}

fn std_dev(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let ss: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    Some((ss / (xs.len() - 1) as f64).sqrt())
}

// The first value that no later value beats in direction `wins`.
fn extreme(values: &[&Scalar], wins: std::cmp::Ordering) -> Option<Scalar> {
    let mut best: Option<&Scalar> = None;
    for v in values {
        best = match best {
            Some(b) if v.compare(b) != Some(wins) => Some(b),
            _ => Some(*v),
        };
    }
    best.cloned()
}
