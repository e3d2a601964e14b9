use std::collections::HashMap;
use std::fmt::{self, Display};

use crate::aggregate::{self, NamedAgg};
use crate::error::{Error, Result};
use crate::table::{Record, Table};
use crate::value::Value;

/// Tuple of key-field values identifying one group
///
/// A missing value is a key component of its own: rows with NA in a key field
/// never merge with rows holding a present value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(Vec<Value>);

impl GroupKey {
    pub fn new(values: Vec<Value>) -> Self {
        GroupKey(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// One bucket: its key and the positions of its records in the source table
#[derive(Debug, Clone)]
pub struct Group {
    key: GroupKey,
    rows: Vec<usize>,
}

impl Group {
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    /// Source-table positions of the records in this group, in table order
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A table partitioned by the values of one or more key fields
///
/// Groups are kept in the order their key was first seen.
#[derive(Debug)]
pub struct GroupBy<'a> {
    /// Source table
    source: &'a Table,
    /// Key field names
    by: Vec<String>,
    /// Key field positions in the source schema
    key_indices: Vec<usize>,
    /// Groups in first-seen order
    groups: Vec<Group>,
    /// Key to position in `groups`
    lookup: HashMap<GroupKey, usize>,
}

impl<'a> GroupBy<'a> {
    /// Partition `source` by the given key fields
    pub fn new<I, S>(source: &'a Table, by: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let by: Vec<String> = by.into_iter().map(|s| s.as_ref().to_string()).collect();
        if by.is_empty() {
            return Err(Error::InvalidArgument(
                "group_by requires at least one field".to_string(),
            ));
        }

        let mut key_indices = Vec::with_capacity(by.len());
        for name in &by {
            let idx = source.schema().index_of(name)?;
            if key_indices.contains(&idx) {
                return Err(Error::InvalidArgument(format!(
                    "field '{}' listed more than once in group_by",
                    name
                )));
            }
            key_indices.push(idx);
        }

        let mut groups: Vec<Group> = Vec::new();
        let mut lookup: HashMap<GroupKey, usize> = HashMap::new();
        for (row, record) in source.records().iter().enumerate() {
            let key = GroupKey(
                key_indices
                    .iter()
                    .map(|&i| record.values()[i].clone())
                    .collect(),
            );
            match lookup.get(&key) {
                Some(&pos) => groups[pos].rows.push(row),
                None => {
                    lookup.insert(key.clone(), groups.len());
                    groups.push(Group {
                        key,
                        rows: vec![row],
                    });
                }
            }
        }

        log::debug!(
            "group_by {:?}: {} records into {} groups",
            by,
            source.row_count(),
            groups.len()
        );

        Ok(GroupBy {
            source,
            by,
            key_indices,
            groups,
            lookup,
        })
    }

    pub fn source(&self) -> &'a Table {
        self.source
    }

    /// Key field names
    pub fn by(&self) -> &[String] {
        &self.by
    }

    pub(crate) fn key_indices(&self) -> &[usize] {
        &self.key_indices
    }

    /// Number of groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Groups in first-seen order
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn get(&self, key: &GroupKey) -> Option<&Group> {
        self.lookup.get(key).map(|&pos| &self.groups[pos])
    }

    /// Size of each group, in group order
    pub fn size(&self) -> Vec<(GroupKey, usize)> {
        self.groups
            .iter()
            .map(|g| (g.key.clone(), g.rows.len()))
            .collect()
    }

    /// The full records belonging to `group`
    pub fn records<'g>(&'g self, group: &'g Group) -> impl Iterator<Item = &'a Record> + 'g {
        let records = self.source.records();
        group.rows.iter().map(move |&i| &records[i])
    }

    /// One output record per group: key fields, then each named statistic
    pub fn aggregate(&self, aggs: &[NamedAgg]) -> Result<Table> {
        aggregate::aggregate_groups(self, aggs)
    }

    /// Count the records in each group into a field called `name`
    pub fn tally(&self, name: &str) -> Result<Table> {
        self.aggregate(&[NamedAgg::tally(name)])
    }
}

impl Table {
    /// Partition the table by the values of `fields`
    pub fn group_by<I, S>(&self, fields: I) -> Result<GroupBy<'_>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        GroupBy::new(self, fields)
    }

    /// `group_by(fields)` followed by a row count per group
    pub fn tally<I, S>(&self, fields: I, name: &str) -> Result<Table>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.group_by(fields)?.tally(name)
    }
}
