use std::borrow::Borrow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::constants::store::OP_WRITE;
use crate::data::Record;
use crate::errors::SamplerError;
use crate::store::format::write_block;

/// Stream `records` into `sink` in the on-disk record format.
///
/// Records must already be grouped by key; runs are stored exactly as given.
/// Output goes through one buffered writer that is flushed once at the end, so a
/// failure part way through leaves a truncated file behind. Callers that need
/// crash safety should write to a temporary path and rename it into place.
pub fn write_store<W, I>(sink: W, records: I) -> Result<(), SamplerError>
where
    W: Write,
    I: IntoIterator,
    I::Item: Borrow<Record>,
{
    let mut writer = BufWriter::new(sink);
    let mut written = 0usize;
    for record in records {
        let record = record.borrow();
        write_block(&mut writer, &record.key).map_err(SamplerError::io(OP_WRITE))?;
        write_block(&mut writer, &record.value).map_err(SamplerError::io(OP_WRITE))?;
        written += 1;
    }
    writer.flush().map_err(SamplerError::io(OP_WRITE))?;
    debug!(records = written, "wrote record store");
    Ok(())
}

/// Create (or truncate) the file at `path` and write `records` into it.
///
/// Missing parent directories are created first.
pub fn write_store_file<P, I>(path: P, records: I) -> Result<(), SamplerError>
where
    P: AsRef<Path>,
    I: IntoIterator,
    I::Item: Borrow<Record>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(SamplerError::io(OP_WRITE))?;
    }
    let file = File::create(path).map_err(SamplerError::io(OP_WRITE))?;
    write_store(file, records)
}
