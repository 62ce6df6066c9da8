//! Shard partitioning of the ordered sample sequence.
//!
//! Shard membership is pure arithmetic over sample indices: the Enumerator
//! fixes a total order, and each shard owns one contiguous half-open slice
//! of it. Nothing here touches the filesystem.

use rgbd_data::DatasetSplit;

/// Number of shard files written per split.
///
/// Compiled into the output filenames; the downstream reader depends on
/// this value, so it is not user-configurable.
pub const NUM_SHARDS: usize = 20;

/// A contiguous half-open range of sample indices owned by one shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRange {
    pub shard_id: usize,
    pub start: usize,
    pub end: usize,
}

impl ShardRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Partition `[0, total)` into `num_shards` contiguous ranges.
///
/// Every shard except possibly the trailing ones holds
/// `ceil(total / num_shards)` samples; trailing shards shrink to fit and
/// may be empty when `total < num_shards`. The ranges cover the full index
/// space with no gaps and no overlaps.
///
/// `num_shards` of zero is a programming error.
pub fn plan_shards(total: usize, num_shards: usize) -> Vec<ShardRange> {
    assert!(num_shards > 0, "num_shards must be positive");

    let size = total.div_ceil(num_shards);
    (0..num_shards)
        .map(|shard_id| ShardRange {
            shard_id,
            start: (shard_id * size).min(total),
            end: ((shard_id + 1) * size).min(total),
        })
        .collect()
}

/// Output filename for one shard of one split.
pub fn shard_file_name(split: DatasetSplit, shard_id: usize) -> String {
    format!(
        "data_{}_{:05}-of-{:05}.tfrecord",
        split.dir_name(),
        shard_id,
        NUM_SHARDS
    )
}
