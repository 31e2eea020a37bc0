#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Sampling and streaming configuration types.
pub mod config;
/// Centralized constants used across the store and sampler.
pub mod constants;
/// Record and batch types.
pub mod data;
/// Sample views and batch construction.
pub mod sampler;
/// Grouped record storage: writer, indexed file store, and streaming reader.
pub mod store;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::{SamplerConfig, StreamConfig};
pub use data::{Batch, PairLabel, Record};
pub use errors::SamplerError;
pub use sampler::{BatchSampler, DeterministicRng, SampleView};
pub use store::{
    FileStore, GroupIndex, GroupStore, InMemoryStore, RecordStream, read_all, stream_store_file,
    write_store, write_store_file,
};
pub use types::{ByteOffset, GroupIdx, Text, UserKey};
