//! RGB-D Records Crate
//!
//! The persisted shard-file format of the conversion pipeline: payload
//! encoding for one sample, checksummed record framing, shard planning,
//! and shard file writing and read-back. Shard files written here are the
//! sole hand-off point to the downstream training/evaluation framework,
//! so the byte layout is fixed (see [`framing`] and [`example`]).

pub mod example;
pub mod framing;
pub mod reader;
pub mod serialize;
pub mod shard;
pub mod writer;

pub use example::{Example, Feature, PayloadError};
pub use framing::{RecordError, read_record, write_record};
pub use reader::{RecordIter, read_shard};
pub use serialize::{SerializeError, serialize_sample};
pub use shard::{NUM_SHARDS, ShardRange, plan_shards, shard_file_name};
pub use writer::ShardWriter;
