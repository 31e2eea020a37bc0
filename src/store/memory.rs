use crate::data::Record;
use crate::errors::SamplerError;
use crate::store::{GroupStore, group_out_of_range};
use crate::types::GroupIdx;

/// In-memory group store for tests and small datasets.
///
/// Grouping matches `FileStore`: each contiguous run of equal keys is one group.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    groups: Vec<Vec<Record>>,
}

impl InMemoryStore {
    /// Group `records` by contiguous key runs, preserving order.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut groups: Vec<Vec<Record>> = Vec::new();
        for record in records {
            match groups.last_mut() {
                Some(group) if group[0].key == record.key => group.push(record),
                _ => groups.push(vec![record]),
            }
        }
        Self { groups }
    }

    /// Total number of records across all groups.
    pub fn num_records(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

impl GroupStore for InMemoryStore {
    fn num_groups(&self) -> usize {
        self.groups.len()
    }

    fn read_group(&self, group_idx: GroupIdx) -> Result<Vec<Record>, SamplerError> {
        self.groups
            .get(group_idx)
            .cloned()
            .ok_or_else(|| group_out_of_range(group_idx, self.groups.len()))
    }
}
