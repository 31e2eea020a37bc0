use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use tracing::debug;

use crate::config::StreamConfig;
use crate::constants::store::OP_STREAM;
use crate::data::Record;
use crate::errors::SamplerError;
use crate::store::format::read_block;

type BlockResult = io::Result<Vec<u8>>;
type RecordResult = Result<Record, SamplerError>;

/// Sequential record reader built from two pipelined worker threads.
///
/// The decode stage turns raw bytes into length-prefixed blocks; the pairing
/// stage joins consecutive blocks into records. Stages hand off through bounded
/// channels, so a slow consumer blocks both workers. Records arrive in file
/// order. The first error ends the stream.
pub struct RecordStream {
    receiver: Option<Receiver<RecordResult>>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl RecordStream {
    /// Start decoding `reader` in the background.
    pub fn spawn<R>(reader: R, config: StreamConfig) -> Self
    where
        R: Read + Send + 'static,
    {
        let capacity = config.channel_capacity.max(1);
        let (block_tx, block_rx) = mpsc::sync_channel(capacity);
        let (record_tx, record_rx) = mpsc::sync_channel(capacity);
        let decoder = thread::spawn(move || decode_blocks(BufReader::new(reader), block_tx));
        let pairer = thread::spawn(move || pair_blocks(block_rx, record_tx));
        Self {
            receiver: Some(record_rx),
            handles: vec![decoder, pairer],
        }
    }
}

impl Iterator for RecordStream {
    type Item = RecordResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.as_ref()?.recv().ok()
    }
}

impl Drop for RecordStream {
    fn drop(&mut self) {
        // Hanging up makes the next send in each stage fail, which stops it.
        self.receiver.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Open the store file at `path` and stream its records in file order.
pub fn stream_store_file<P: AsRef<Path>>(
    path: P,
    config: StreamConfig,
) -> Result<RecordStream, SamplerError> {
    let file = File::open(path.as_ref()).map_err(SamplerError::io(OP_STREAM))?;
    Ok(RecordStream::spawn(file, config))
}

/// Read every record from `reader` through the streaming pipeline.
pub fn read_all<R>(reader: R) -> Result<Vec<Record>, SamplerError>
where
    R: Read + Send + 'static,
{
    RecordStream::spawn(reader, StreamConfig::default()).collect()
}

fn decode_blocks<R: Read>(mut reader: R, sender: SyncSender<BlockResult>) {
    let mut blocks = 0u64;
    loop {
        let next = match read_block(&mut reader) {
            Ok(Some(block)) => Ok(block),
            Ok(None) => break,
            Err(err) => Err(err),
        };
        let failed = next.is_err();
        if sender.send(next).is_err() {
            debug!(blocks, "stream decoder stopped: pairing stage hung up");
            return;
        }
        if failed {
            return;
        }
        blocks += 1;
    }
    debug!(blocks, "stream decoder reached end of input");
}

fn pair_blocks(receiver: Receiver<BlockResult>, sender: SyncSender<RecordResult>) {
    let mut pending_key: Option<Vec<u8>> = None;
    for block in receiver {
        let block = match block {
            Ok(block) => block,
            Err(err) => {
                let _ = sender.send(Err(SamplerError::io(OP_STREAM)(err)));
                return;
            }
        };
        match pending_key.take() {
            None => pending_key = Some(block),
            Some(key) => {
                if sender.send(Ok(Record { key, value: block })).is_err() {
                    debug!("stream pairing stage stopped: consumer hung up");
                    return;
                }
            }
        }
    }
    if pending_key.is_some() {
        let _ = sender.send(Err(SamplerError::TruncatedStream {
            operation: OP_STREAM,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::write_store;
    use std::io::Cursor;

    fn encode(records: &[Record]) -> Vec<u8> {
        let mut buf = Vec::new();
        write_store(&mut buf, records).unwrap();
        buf
    }

    #[test]
    fn streams_records_in_file_order() {
        let records = vec![
            Record::new("unixpickle", "This is a tweet."),
            Record::new("bob", ""),
            Record::new("", "Tweet, this doth be."),
            Record::new("unixpickle", "This is another tweet."),
        ];
        let out = read_all(Cursor::new(encode(&records))).unwrap();
        assert_eq!(out, records);
    }

    #[test]
    fn dangling_key_block_is_truncated_stream() {
        let mut buf = encode(&[Record::new("bob", "a")]);
        buf.extend_from_slice(&0i32.to_le_bytes());
        let mut stream = RecordStream::spawn(Cursor::new(buf), StreamConfig::default());
        assert_eq!(stream.next().unwrap().unwrap(), Record::new("bob", "a"));
        assert!(matches!(
            stream.next(),
            Some(Err(SamplerError::TruncatedStream { .. }))
        ));
        assert!(stream.next().is_none());
    }

    #[test]
    fn partial_block_is_io_error() {
        let mut buf = encode(&[Record::new("bob", "a")]);
        buf.extend_from_slice(&[9, 0, 0, 0, b'x']);
        let err = read_all(Cursor::new(buf)).unwrap_err();
        match err {
            SamplerError::Io { operation, source } => {
                assert_eq!(operation, OP_STREAM);
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn dropping_a_partially_read_stream_stops_workers() {
        let records: Vec<Record> = (0..256)
            .map(|i| Record::new(format!("user{}", i / 8), format!("text {i}")))
            .collect();
        let mut stream = RecordStream::spawn(Cursor::new(encode(&records)), StreamConfig::default());
        assert_eq!(stream.next().unwrap().unwrap(), records[0]);
        drop(stream);
    }
}
