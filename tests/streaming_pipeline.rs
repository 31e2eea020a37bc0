use std::io::Cursor;

use tempfile::tempdir;

use authorship::{
    Record, RecordStream, SamplerError, StreamConfig, read_all, stream_store_file, write_store,
    write_store_file,
};

fn numbered_records(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| Record::new(format!("user{}", i / 3), format!("message {i}")))
        .collect()
}

#[test]
fn stream_preserves_file_order() {
    let records = numbered_records(500);
    let mut buf = Vec::new();
    write_store(&mut buf, &records).unwrap();
    assert_eq!(read_all(Cursor::new(buf)).unwrap(), records);
}

#[test]
fn larger_channel_capacity_yields_same_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stream.db");
    let records = numbered_records(120);
    write_store_file(&path, &records).unwrap();

    let stream = stream_store_file(
        &path,
        StreamConfig {
            channel_capacity: 16,
        },
    )
    .unwrap();
    let out: Result<Vec<Record>, SamplerError> = stream.collect();
    assert_eq!(out.unwrap(), records);
}

#[test]
fn zero_capacity_is_raised_to_one() {
    let records = numbered_records(10);
    let mut buf = Vec::new();
    write_store(&mut buf, &records).unwrap();
    let stream = RecordStream::spawn(
        Cursor::new(buf),
        StreamConfig {
            channel_capacity: 0,
        },
    );
    assert_eq!(stream.count(), 10);
}

#[test]
fn missing_value_block_surfaces_truncated_stream() {
    let mut buf = Vec::new();
    write_store(&mut buf, [Record::new("bob", "a")]).unwrap();
    buf.extend_from_slice(&3i32.to_le_bytes());
    buf.extend_from_slice(b"amy");
    assert!(matches!(
        read_all(Cursor::new(buf)),
        Err(SamplerError::TruncatedStream { .. })
    ));
}

#[test]
fn missing_file_reports_stream_operation() {
    let dir = tempdir().unwrap();
    match stream_store_file(dir.path().join("nope.db"), StreamConfig::default()) {
        Err(SamplerError::Io { operation, .. }) => assert!(operation.contains("stream")),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("expected missing file to fail"),
    }
}
