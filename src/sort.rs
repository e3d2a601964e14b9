//! Stable ordering and truncation

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::na::NA;
use crate::table::{Record, Table};

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// One sort key: a field and a direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }
}

// NA sorts after every present value, whatever the direction.
fn compare_cells(a: &Record, b: &Record, idx: usize, order: SortOrder) -> Ordering {
    match (&a.values()[idx], &b.values()[idx]) {
        (NA::NA, NA::NA) => Ordering::Equal,
        (NA::NA, _) => Ordering::Greater,
        (_, NA::NA) => Ordering::Less,
        (NA::Value(x), NA::Value(y)) => {
            let ord = x.compare(y).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
    }
}

impl Table {
    /// Stable sort by one field
    pub fn sort(&self, field: &str, descending: bool) -> Result<Table> {
        let key = SortKey {
            field: field.to_string(),
            order: if descending {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            },
        };
        self.sort_by(&[key])
    }

    /// Stable sort by several keys, the first key most significant
    ///
    /// Records that tie on every key keep their relative order.
    pub fn sort_by(&self, keys: &[SortKey]) -> Result<Table> {
        if keys.is_empty() {
            return Err(Error::InvalidArgument(
                "sort requires at least one key".to_string(),
            ));
        }
        let resolved = keys
            .iter()
            .map(|k| Ok((self.schema().index_of(&k.field)?, k.order)))
            .collect::<Result<Vec<_>>>()?;

        let records = self.records();
        let mut rows: Vec<usize> = (0..records.len()).collect();
        rows.sort_by(|&a, &b| {
            resolved
                .iter()
                .map(|&(idx, order)| compare_cells(&records[a], &records[b], idx, order))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Ok(self.with_rows(rows))
    }

    /// The first `n` records; negative `n` is an `InvalidArgument`
    pub fn limit(&self, n: i64) -> Result<Table> {
        if n < 0 {
            return Err(Error::InvalidArgument(format!(
                "limit must be non-negative, got {}",
                n
            )));
        }
        let n = usize::try_from(n).unwrap_or(usize::MAX);
        Ok(self.head(n))
    }

    /// The first `n` records (all of them if there are fewer)
    pub fn head(&self, n: usize) -> Table {
        self.with_rows(0..n.min(self.row_count()))
    }
}
