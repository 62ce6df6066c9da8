//! Conversion orchestration across dataset splits.
//!
//! Runs the enumerate -> plan -> write pipeline once per split. A failure
//! in one split aborts the run immediately; conversion is an offline batch
//! job that is re-run from scratch rather than resumed.

use rgbd_data::{DatasetSplit, DepthEncoding, EnumerateError, Sample, enumerate_samples};
use rgbd_records::{
    NUM_SHARDS, SerializeError, ShardRange, ShardWriter, plan_shards, serialize_sample,
    shard_file_name,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Directory names fixed by the dataset layout.
const IMAGES_DIR: &str = "images";
const ANNOTATIONS_DIR: &str = "annotations";
const DEPTH_DIR: &str = "depth";
const RECORDS_DIR: &str = "records";

/// Errors that abort a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The output directory could not be created.
    #[error("failed to create {}: {source}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Triplet enumeration failed for a split.
    #[error("{split} split: {source}")]
    Enumerate {
        split: DatasetSplit,
        #[source]
        source: EnumerateError,
    },

    /// A sample failed to serialize.
    #[error("{split} split, sample {index} in shard {shard_id}: {source}")]
    Serialize {
        split: DatasetSplit,
        index: usize,
        shard_id: usize,
        #[source]
        source: SerializeError,
    },

    /// A shard file could not be written.
    #[error("{split} split, shard {shard_id}: {source}")]
    ShardIo {
        split: DatasetSplit,
        shard_id: usize,
        #[source]
        source: io::Error,
    },
}

/// Convert both splits of the dataset under `dataset_root`.
///
/// Creates `<root>/records/` if absent and fills it with
/// `NUM_SHARDS` shard files per split. Rerunning truncates and rewrites
/// every shard file; output is byte-identical for unchanged input.
pub fn run(dataset_root: &Path, depth_encoding: DepthEncoding) -> Result<(), ConvertError> {
    let record_dir = dataset_root.join(RECORDS_DIR);
    fs::create_dir_all(&record_dir).map_err(|source| ConvertError::CreateOutputDir {
        path: record_dir.clone(),
        source,
    })?;

    for split in DatasetSplit::ALL {
        convert_split(dataset_root, &record_dir, split, depth_encoding)?;
    }

    info!("Finished converting the RGB-D dataset");
    Ok(())
}

#[tracing::instrument(skip_all, fields(split = %split))]
fn convert_split(
    dataset_root: &Path,
    record_dir: &Path,
    split: DatasetSplit,
    depth_encoding: DepthEncoding,
) -> Result<(), ConvertError> {
    let image_dir = dataset_root.join(IMAGES_DIR).join(split.dir_name());
    let label_dir = dataset_root.join(ANNOTATIONS_DIR).join(split.dir_name());
    let depth_dir = dataset_root.join(DEPTH_DIR).join(split.dir_name());

    let samples = enumerate_samples(&image_dir, &label_dir, &depth_dir)
        .map_err(|source| ConvertError::Enumerate { split, source })?;
    info!(
        "Converting {} samples into {} shards",
        samples.len(),
        NUM_SHARDS
    );

    for range in plan_shards(samples.len(), NUM_SHARDS) {
        let path = record_dir.join(shard_file_name(split, range.shard_id));
        write_shard(&path, &samples, range, split, depth_encoding)?;
    }

    Ok(())
}

fn write_shard(
    path: &Path,
    samples: &[Sample],
    range: ShardRange,
    split: DatasetSplit,
    depth_encoding: DepthEncoding,
) -> Result<(), ConvertError> {
    let shard_io = |source| ConvertError::ShardIo {
        split,
        shard_id: range.shard_id,
        source,
    };

    // The writer owns the path until finish; a serialization failure drops
    // it and the incomplete file is removed
    let mut writer = ShardWriter::create(path).map_err(shard_io)?;
    for index in range.start..range.end {
        info!(
            "Converting sample {}/{} in shard {}",
            index + 1,
            samples.len(),
            range.shard_id
        );
        let payload =
            serialize_sample(&samples[index], depth_encoding).map_err(|source| {
                ConvertError::Serialize {
                    split,
                    index,
                    shard_id: range.shard_id,
                    source,
                }
            })?;
        writer.append(&payload).map_err(shard_io)?;
    }

    let records = writer.finish().map_err(shard_io)?;
    debug!("Shard {} complete with {} records", range.shard_id, records);
    Ok(())
}
