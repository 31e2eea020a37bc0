//! Grouped record storage.
//!
//! The on-disk format is a bare sequence of records, each a little-endian
//! `i32`-length-prefixed key block followed by a length-prefixed value block.
//! There is no header, footer, or version tag. Writers must emit all records of
//! one key contiguously; readers address each contiguous run as a group.
//!
//! Ownership model:
//! - `GroupStore` is the sampler-facing read interface.
//! - `FileStore` owns one seekable file handle plus an in-memory `GroupIndex`.
//! - `InMemoryStore` applies the same grouping to records held in memory.
//! - `RecordStream` reads a whole file sequentially without an index.

use crate::data::{Record, Text};
use crate::errors::SamplerError;
use crate::types::GroupIdx;

mod file_store;
mod format;
mod index;
mod memory;
mod stream;
mod writer;

pub use file_store::FileStore;
pub use index::GroupIndex;
pub use memory::InMemoryStore;
pub use stream::{RecordStream, read_all, stream_store_file};
pub use writer::{write_store, write_store_file};

/// Random-access view of records grouped by contiguous key runs.
pub trait GroupStore: Send + Sync {
    /// Number of groups available.
    fn num_groups(&self) -> usize;

    /// All records of one group, in stored order.
    fn read_group(&self, group_idx: GroupIdx) -> Result<Vec<Record>, SamplerError>;

    /// Message bodies of one group, in stored order.
    fn read_texts(&self, group_idx: GroupIdx) -> Result<Vec<Text>, SamplerError> {
        Ok(self
            .read_group(group_idx)?
            .into_iter()
            .map(|record| record.value)
            .collect())
    }
}

pub(crate) fn group_out_of_range(group_idx: GroupIdx, num_groups: usize) -> SamplerError {
    SamplerError::ContractViolation(format!(
        "group index {group_idx} out of range for {num_groups} groups"
    ))
}
