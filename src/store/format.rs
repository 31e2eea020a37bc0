//! Length-prefixed block codec shared by the writer, index builder, and readers.
//!
//! Every block is a little-endian `i32` byte count followed by that many bytes.
//! A record is two consecutive blocks: key, then value.

use std::io::{self, Read, Write};

use crate::constants::store::LEN_PREFIX_BYTES;

/// Write one length-prefixed block.
pub(crate) fn write_block<W: Write>(writer: &mut W, data: &[u8]) -> io::Result<()> {
    let len = i32::try_from(data.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "block of {} bytes does not fit an i32 length prefix",
                data.len()
            ),
        )
    })?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(data)
}

/// Read a length prefix, returning `None` on a clean end of input.
///
/// End of input inside the prefix itself is an `UnexpectedEof` error.
pub(crate) fn read_len_prefix<R: Read>(reader: &mut R) -> io::Result<Option<u64>> {
    let mut buf = [0u8; LEN_PREFIX_BYTES as usize];
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(unexpected_eof("length prefix")),
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    let len = i32::from_le_bytes(buf);
    u64::try_from(len).map(Some).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("negative block length {len}"),
        )
    })
}

/// Read one block, returning `None` on a clean end of input.
pub(crate) fn read_block<R: Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let Some(len) = read_len_prefix(reader)? else {
        return Ok(None);
    };
    // Grown by `read_to_end` so a corrupt length cannot force a huge allocation.
    let mut data = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut data)?;
    if (data.len() as u64) < len {
        return Err(unexpected_eof("block body"));
    }
    Ok(Some(data))
}

/// Skip one block without materializing it, returning its payload length.
pub(crate) fn skip_block<R: Read>(reader: &mut R) -> io::Result<Option<u64>> {
    let Some(len) = read_len_prefix(reader)? else {
        return Ok(None);
    };
    let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if skipped < len {
        return Err(unexpected_eof("block body"));
    }
    Ok(Some(len))
}

pub(crate) fn unexpected_eof(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("input ended inside {what}"),
    )
}
