//! Shard file writing.
//!
//! A [`ShardWriter`] exclusively owns its output path from creation to
//! [`finish`](ShardWriter::finish). Dropping a writer that was never
//! finished deletes the file, so an aborted conversion cannot leave behind
//! a partial shard that looks complete.

use crate::framing;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Streams framed records into one shard file.
pub struct ShardWriter {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    records: usize,
    finished: bool,
}

impl ShardWriter {
    /// Open `path` for writing, truncating any previous shard.
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = File::create(&path)?;
        debug!("Opened shard file {}", path.display());
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            path,
            records: 0,
            finished: false,
        })
    }

    /// Append one payload as a framed record.
    pub fn append(&mut self, payload: &[u8]) -> io::Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(io::Error::other("shard writer already finished"));
        };
        framing::write_record(writer, payload)?;
        self.records += 1;
        Ok(())
    }

    /// Records appended so far.
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and mark the shard complete, returning the record count.
    ///
    /// If the flush fails the writer is dropped unfinished and the file is
    /// removed like any other abandoned shard.
    pub fn finish(mut self) -> io::Result<usize> {
        let Some(mut writer) = self.writer.take() else {
            return Err(io::Error::other("shard writer already finished"));
        };
        writer.flush()?;
        self.finished = true;
        debug!(
            "Finished shard file {} with {} records",
            self.path.display(),
            self.records
        );
        Ok(self.records)
    }
}

impl Drop for ShardWriter {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Release the handle before unlinking
        drop(self.writer.take());
        match std::fs::remove_file(&self.path) {
            Ok(()) => warn!("Removed incomplete shard file {}", self.path.display()),
            Err(e) => warn!(
                "Failed to remove incomplete shard file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_shard;

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shard.tfrecord");

        let mut writer = ShardWriter::create(&path).unwrap();
        writer.append(b"one").unwrap();
        writer.append(b"two").unwrap();
        assert_eq!(writer.records(), 2);
        assert_eq!(writer.finish().unwrap(), 2);

        let payloads = read_shard(&path).unwrap();
        assert_eq!(payloads, [b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn test_finished_empty_shard_is_a_valid_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shard.tfrecord");

        let writer = ShardWriter::create(&path).unwrap();
        assert_eq!(writer.finish().unwrap(), 0);

        assert!(path.exists());
        assert!(read_shard(&path).unwrap().is_empty());
    }

    #[test]
    fn test_dropped_writer_removes_its_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shard.tfrecord");

        let mut writer = ShardWriter::create(&path).unwrap();
        writer.append(b"partial").unwrap();
        assert!(path.exists());
        drop(writer);

        assert!(!path.exists());
    }

    #[test]
    fn test_create_truncates_previous_shard() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shard.tfrecord");

        let mut writer = ShardWriter::create(&path).unwrap();
        writer.append(b"old contents").unwrap();
        writer.finish().unwrap();

        let writer = ShardWriter::create(&path).unwrap();
        writer.finish().unwrap();

        assert!(read_shard(&path).unwrap().is_empty());
    }
}
