//! Shard file read-back.
//!
//! The conversion pipeline only writes. Reading exists to validate
//! finished archives and to back the ordering and round-trip properties
//! in the test suite; it verifies both checksums of every record.

use crate::framing::{self, RecordError};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Iterator over the framed payloads of a record stream.
pub struct RecordIter<R: Read> {
    reader: R,
    failed: bool,
}

impl RecordIter<BufReader<File>> {
    /// Open a shard file for iteration.
    pub fn open(path: &Path) -> Result<Self, RecordError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> RecordIter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            failed: false,
        }
    }
}

impl<R: Read> Iterator for RecordIter<R> {
    type Item = Result<Vec<u8>, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match framing::read_record(&mut self.reader) {
            Ok(Some(payload)) => Some(Ok(payload)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Read every record payload from a shard file, verifying checksums.
pub fn read_shard(path: &Path) -> Result<Vec<Vec<u8>>, RecordError> {
    RecordIter::open(path)?.collect()
}
