use std::io::{self, Read};

use crate::constants::store::LEN_PREFIX_BYTES;
use crate::store::format::{read_block, skip_block, unexpected_eof};
use crate::types::{ByteOffset, GroupIdx};

/// In-memory index of group start offsets, one per contiguous key run.
///
/// Built by a single sequential scan. Only key bytes are read into memory;
/// value blocks are skipped. A key that reappears after a different key starts
/// a new group, so non-adjacent runs of one user are indexed separately.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupIndex {
    offsets: Vec<ByteOffset>,
    num_records: u64,
    total_bytes: ByteOffset,
}

impl GroupIndex {
    /// Scan `reader` from its current position to the end of input.
    ///
    /// Offsets are relative to where the scan started. Input that ends between
    /// records finishes the scan; input that ends inside a record is an error.
    pub fn build<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut offsets = Vec::new();
        let mut last_key: Option<Vec<u8>> = None;
        let mut offset: ByteOffset = 0;
        let mut num_records = 0u64;
        while let Some(key) = read_block(reader)? {
            let key_len = key.len() as u64;
            if last_key.as_deref() != Some(key.as_slice()) {
                offsets.push(offset);
                last_key = Some(key);
            }
            offset += LEN_PREFIX_BYTES + key_len;
            let value_len = skip_block(reader)?.ok_or_else(|| unexpected_eof("value block"))?;
            offset += LEN_PREFIX_BYTES + value_len;
            num_records += 1;
        }
        Ok(Self {
            offsets,
            num_records,
            total_bytes: offset,
        })
    }

    /// Number of groups (contiguous key runs).
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the scanned stream held no records.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Start offset of `group_idx`, if in range.
    pub fn offset(&self, group_idx: GroupIdx) -> Option<ByteOffset> {
        self.offsets.get(group_idx).copied()
    }

    /// All group start offsets in file order.
    pub fn offsets(&self) -> &[ByteOffset] {
        &self.offsets
    }

    /// Number of records seen during the scan.
    pub fn num_records(&self) -> u64 {
        self.num_records
    }

    /// Number of bytes consumed by the scan.
    pub fn total_bytes(&self) -> ByteOffset {
        self.total_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::store::write_store;
    use std::io::Cursor;

    fn encode(records: &[Record]) -> Vec<u8> {
        let mut buf = Vec::new();
        write_store(&mut buf, records).unwrap();
        buf
    }

    #[test]
    fn offsets_mark_each_key_change() {
        let buf = encode(&[
            Record::new("bob", "a"),
            Record::new("bob", "b"),
            Record::new("amy", "xyz"),
        ]);
        let index = GroupIndex::build(&mut Cursor::new(&buf)).unwrap();
        // Each bob record is 4 + 3 + 4 + 1 bytes.
        assert_eq!(index.offsets(), &[0, 24]);
        assert_eq!(index.num_records(), 3);
        assert_eq!(index.total_bytes(), buf.len() as u64);
    }

    #[test]
    fn empty_first_key_still_starts_a_group() {
        let buf = encode(&[Record::new("", "x"), Record::new("bob", "y")]);
        let index = GroupIndex::build(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.offset(0), Some(0));
    }

    #[test]
    fn non_adjacent_runs_are_separate_groups() {
        let buf = encode(&[
            Record::new("u", "1"),
            Record::new("v", "2"),
            Record::new("u", "3"),
        ]);
        let index = GroupIndex::build(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn empty_input_has_no_groups() {
        let index = GroupIndex::build(&mut Cursor::new(Vec::new())).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.offset(0), None);
    }

    #[test]
    fn missing_value_block_fails_the_scan() {
        let mut buf = encode(&[Record::new("bob", "a")]);
        buf.extend_from_slice(&3i32.to_le_bytes());
        buf.extend_from_slice(b"amy");
        let err = GroupIndex::build(&mut Cursor::new(&buf)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
