//! Row predicates with three-valued logic
//!
//! A comparison against a missing value is *unknown*, not false. Unknown
//! propagates through `And`/`Or`/`Not` by Kleene's rules, and only rows whose
//! predicate is definitely true survive [`Table::filter`].

use std::cmp::Ordering;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::na::NA;
use crate::schema::{FieldType, Schema};
use crate::table::{Record, Table};
use crate::value::Scalar;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
        }
    }
}

/// A row predicate, referring to fields by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// `field <op> value`
    Compare {
        field: String,
        op: CompareOp,
        value: Scalar,
    },
    /// True when the field is missing
    IsNull { field: String },
    /// True when the field is present
    NotNull { field: String },
    /// True when the field equals one of `values`
    In { field: String, values: Vec<Scalar> },
    /// Regular-expression search over a text field
    Matches { field: String, pattern: String },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

#[allow(clippy::should_implement_trait)]
impl Predicate {
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Scalar>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Predicate::IsNull {
            field: field.into(),
        }
    }

    pub fn not_null(field: impl Into<String>) -> Self {
        Predicate::NotNull {
            field: field.into(),
        }
    }

    pub fn is_in<V: Into<Scalar>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Matches {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut all) => {
                all.push(other);
                Predicate::And(all)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut any) => {
                any.push(other);
                Predicate::Or(any)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Resolve field names and check literal types against `schema`
    pub fn bind(&self, schema: &Schema) -> Result<BoundPredicate> {
        Ok(match self {
            Predicate::Compare { field, op, value } => {
                let idx = schema.index_of(field)?;
                check_literal(field, schema.fields()[idx].dtype, value)?;
                BoundPredicate::Compare {
                    idx,
                    op: *op,
                    value: value.clone(),
                }
            }
            Predicate::IsNull { field } => BoundPredicate::IsNull(schema.index_of(field)?),
            Predicate::NotNull { field } => BoundPredicate::NotNull(schema.index_of(field)?),
            Predicate::In { field, values } => {
                let idx = schema.index_of(field)?;
                for value in values {
                    check_literal(field, schema.fields()[idx].dtype, value)?;
                }
                BoundPredicate::In {
                    idx,
                    values: values.clone(),
                }
            }
            Predicate::Matches { field, pattern } => {
                let idx = schema.index_of(field)?;
                let dtype = schema.fields()[idx].dtype;
                if dtype != FieldType::Text {
                    return Err(Error::type_mismatch(field, FieldType::Text, dtype));
                }
                BoundPredicate::Matches {
                    idx,
                    regex: Regex::new(pattern)?,
                }
            }
            Predicate::And(all) => BoundPredicate::And(
                all.iter()
                    .map(|p| p.bind(schema))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Predicate::Or(any) => BoundPredicate::Or(
                any.iter()
                    .map(|p| p.bind(schema))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Predicate::Not(inner) => BoundPredicate::Not(Box::new(inner.bind(schema)?)),
        })
    }
}

fn check_literal(field: &str, dtype: FieldType, literal: &Scalar) -> Result<()> {
    let found = literal.dtype();
    let compatible = found == dtype || (dtype.is_numeric() && found.is_numeric());
    if compatible {
        Ok(())
    } else {
        Err(Error::type_mismatch(field, dtype, found))
    }
}

/// A predicate resolved against a schema, ready for per-row evaluation
#[derive(Debug, Clone)]
pub enum BoundPredicate {
    Compare {
        idx: usize,
        op: CompareOp,
        value: Scalar,
    },
    IsNull(usize),
    NotNull(usize),
    In {
        idx: usize,
        values: Vec<Scalar>,
    },
    Matches {
        idx: usize,
        regex: Regex,
    },
    And(Vec<BoundPredicate>),
    Or(Vec<BoundPredicate>),
    Not(Box<BoundPredicate>),
}

impl BoundPredicate {
    /// Evaluate against one record: `Some(true)`, `Some(false)`, or `None`
    /// when the outcome is unknown because a compared value is missing
    pub fn eval(&self, record: &Record) -> Option<bool> {
        match self {
            BoundPredicate::Compare { idx, op, value } => match cell(record, *idx) {
                NA::Value(v) => v.compare(value).map(|ord| op.holds(ord)),
                NA::NA => None,
            },
            BoundPredicate::IsNull(idx) => Some(cell(record, *idx).is_na()),
            BoundPredicate::NotNull(idx) => Some(cell(record, *idx).is_value()),
            BoundPredicate::In { idx, values } => match cell(record, *idx) {
                NA::Value(v) => Some(
                    values
                        .iter()
                        .any(|candidate| v.compare(candidate) == Some(Ordering::Equal)),
                ),
                NA::NA => None,
            },
            BoundPredicate::Matches { idx, regex } => match cell(record, *idx) {
                NA::Value(v) => v.as_str().map(|s| regex.is_match(s)),
                NA::NA => None,
            },
            BoundPredicate::And(all) => {
                let mut unknown = false;
                for p in all {
                    match p.eval(record) {
                        Some(false) => return Some(false),
                        None => unknown = true,
                        Some(true) => {}
                    }
                }
                if unknown {
                    None
                } else {
                    Some(true)
                }
            }
            BoundPredicate::Or(any) => {
                let mut unknown = false;
                for p in any {
                    match p.eval(record) {
                        Some(true) => return Some(true),
                        None => unknown = true,
                        Some(false) => {}
                    }
                }
                if unknown {
                    None
                } else {
                    Some(false)
                }
            }
            BoundPredicate::Not(inner) => inner.eval(record).map(|b| !b),
        }
    }
}

fn cell(record: &Record, idx: usize) -> &NA<Scalar> {
    &record.values()[idx]
}

impl Table {
    /// Keep the records for which `predicate` is definitely true
    pub fn filter(&self, predicate: &Predicate) -> Result<Table> {
        let bound = predicate.bind(self.schema())?;
        let rows: Vec<usize> = self
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| bound.eval(record) == Some(true))
            .map(|(i, _)| i)
            .collect();
        log::debug!(
            "filter kept {} of {} records",
            rows.len(),
            self.row_count()
        );
        Ok(self.with_rows(rows))
    }
}
