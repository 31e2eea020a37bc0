use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, trace};

use crate::constants::store::{HANDLE_LOCK_LABEL, OP_CLOSE, OP_OPEN, OP_READ_GROUP};
use crate::data::Record;
use crate::errors::SamplerError;
use crate::store::format::{read_block, unexpected_eof};
use crate::store::index::GroupIndex;
use crate::store::{GroupStore, group_out_of_range};
use crate::types::GroupIdx;

/// Read-only, file-backed record store with a group index.
///
/// Group reads seek the shared file handle, so they are serialized through an
/// internal mutex. Open a second `FileStore` for truly parallel reads.
pub struct FileStore {
    path: PathBuf,
    index: GroupIndex,
    handle: Mutex<Option<BufReader<File>>>,
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("groups", &self.index.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl FileStore {
    /// Open the store at `path` and index it in one sequential pass.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SamplerError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(SamplerError::io(OP_OPEN))?;
        let mut reader = BufReader::new(file);
        let index = GroupIndex::build(&mut reader).map_err(SamplerError::io(OP_OPEN))?;
        debug!(
            path = %path.display(),
            groups = index.len(),
            records = index.num_records(),
            bytes = index.total_bytes(),
            "indexed record store"
        );
        Ok(Self {
            path,
            index,
            handle: Mutex::new(Some(reader)),
        })
    }

    /// Path the store was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Group index built at open time.
    pub fn index(&self) -> &GroupIndex {
        &self.index
    }

    /// True once `close` has released the file handle.
    pub fn is_closed(&self) -> bool {
        self.handle
            .lock()
            .map(|guard| guard.is_none())
            .unwrap_or(true)
    }

    /// Release the file handle. Later reads and closes fail with `UseAfterClose`.
    pub fn close(&self) -> Result<(), SamplerError> {
        let mut guard = self
            .handle
            .lock()
            .map_err(|_| SamplerError::Poisoned(HANDLE_LOCK_LABEL))?;
        match guard.take() {
            Some(reader) => {
                drop(reader);
                debug!(path = %self.path.display(), "closed record store");
                Ok(())
            }
            None => Err(SamplerError::UseAfterClose {
                operation: OP_CLOSE,
            }),
        }
    }
}

impl GroupStore for FileStore {
    fn num_groups(&self) -> usize {
        self.index.len()
    }

    fn read_group(&self, group_idx: GroupIdx) -> Result<Vec<Record>, SamplerError> {
        let mut guard = self
            .handle
            .lock()
            .map_err(|_| SamplerError::Poisoned(HANDLE_LOCK_LABEL))?;
        let reader = guard.as_mut().ok_or(SamplerError::UseAfterClose {
            operation: OP_READ_GROUP,
        })?;
        let offset = self
            .index
            .offset(group_idx)
            .ok_or_else(|| group_out_of_range(group_idx, self.index.len()))?;
        // Seeking a `BufReader` discards its read-ahead buffer.
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(SamplerError::io(OP_READ_GROUP))?;
        let records = read_key_run(reader).map_err(SamplerError::io(OP_READ_GROUP))?;
        trace!(group_idx, offset, records = records.len(), "read record group");
        Ok(records)
    }
}

/// Read records until the key changes or input ends.
fn read_key_run<R: Read>(reader: &mut R) -> io::Result<Vec<Record>> {
    let mut records: Vec<Record> = Vec::new();
    while let Some(key) = read_block(reader)? {
        if records.first().is_some_and(|first| first.key != key) {
            break;
        }
        let value = read_block(reader)?.ok_or_else(|| unexpected_eof("value block"))?;
        records.push(Record { key, value });
    }
    Ok(records)
}
