//! Binary read index
//!
//! The index file holds one [`StoreHeader`] followed by one [`ReadRecord`]
//! per read, so record `i` lives at `SIZE_STORE_HEADER + i * SIZE_READ_RECORD`
//! and random access never scans. [`IndexFile`] is the single-writer handle
//! used by ingestion and partitioning (append, header rewrite, rollback
//! truncation); [`load`] is the read-only path that maps the whole file and
//! parses the record array out of the mapping.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{IndexError, Result};
use crate::header::{StoreHeader, SIZE_STORE_HEADER};
use crate::record::{ReadRecord, SIZE_READ_RECORD};

/// Read-write handle on an index file
#[derive(Debug)]
pub struct IndexFile {
    file: File,
}

impl IndexFile {
    /// Creates a fresh index file holding an empty store header
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut index = Self { file };
        index.write_header(&StoreHeader::new())?;
        Ok(index)
    }

    /// Opens an existing index file for appending and header rewrite
    pub fn open_rw<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::options().read(true).write(true).open(path)?;
        Ok(Self { file })
    }

    /// Reads the header record at the start of the file
    pub fn read_header(&mut self) -> Result<StoreHeader> {
        self.file.seek(SeekFrom::Start(0))?;
        StoreHeader::from_reader(&mut self.file)
    }

    /// Rewrites the header record in place
    pub fn write_header(&mut self, header: &StoreHeader) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        header.write_bytes(&mut self.file)?;
        Ok(())
    }

    /// Byte length of the file; the append offset for new records
    pub fn end_offset(&mut self) -> Result<u64> {
        Ok(self.file.seek(SeekFrom::End(0))?)
    }

    /// Number of records currently in the file
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Misaligned`] if the file length is not a whole
    /// number of records past the header.
    pub fn n_records(&mut self) -> Result<usize> {
        let len = self.file.metadata()?.len();
        record_count(len)
    }

    /// Appends records at the end of the file, in the given order
    pub fn append_records(&mut self, records: &[ReadRecord]) -> Result<()> {
        self.file.seek(SeekFrom::End(0))?;
        let mut writer = BufWriter::new(&mut self.file);
        for record in records {
            record.write_bytes(&mut writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads the record with the given id
    pub fn read_record(&mut self, index: usize) -> Result<ReadRecord> {
        let max_index = self.n_records()?;
        if index >= max_index {
            return Err(IndexError::OutOfRange {
                requested_index: index,
                max_index,
            }
            .into());
        }
        self.file.seek(SeekFrom::Start(record_offset(index)))?;
        ReadRecord::from_reader(&mut self.file)
    }

    /// Reads every record from `start` through the end of the file
    pub fn read_records_from(&mut self, start: usize) -> Result<Vec<ReadRecord>> {
        let total = self.n_records()?;
        if start > total {
            return Err(IndexError::OutOfRange {
                requested_index: start,
                max_index: total,
            }
            .into());
        }
        self.file.seek(SeekFrom::Start(record_offset(start)))?;
        let mut records = Vec::with_capacity(total - start);
        for _ in start..total {
            records.push(ReadRecord::from_reader(&mut self.file)?);
        }
        Ok(records)
    }

    /// Truncates the file back to `offset` bytes (rollback support)
    pub fn truncate(&mut self, offset: u64) -> Result<()> {
        self.file.set_len(offset)?;
        self.file.sync_all()?;
        Ok(())
    }
}

/// Byte offset of record `index` within the index file
#[must_use]
pub fn record_offset(index: usize) -> u64 {
    (SIZE_STORE_HEADER + index * SIZE_READ_RECORD) as u64
}

fn record_count(byte_len: u64) -> Result<usize> {
    let body = byte_len
        .checked_sub(SIZE_STORE_HEADER as u64)
        .ok_or(IndexError::Misaligned(byte_len))?;
    if body % SIZE_READ_RECORD as u64 != 0 {
        return Err(IndexError::Misaligned(byte_len).into());
    }
    Ok((body / SIZE_READ_RECORD as u64) as usize)
}

/// Loads a full index read-only: the header and every record
///
/// The file is memory-mapped and the record array is parsed out of the
/// mapping; committed records are immutable so concurrent readers need no
/// coordination.
pub fn load<P: AsRef<Path>>(path: P) -> Result<(StoreHeader, Vec<ReadRecord>)> {
    let file = File::open(path)?;
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    let header = StoreHeader::from_buffer(&mmap)?;
    let total = record_count(mmap.len() as u64)?;

    let mut records = Vec::with_capacity(total);
    let mut pos = SIZE_STORE_HEADER;
    for _ in 0..total {
        records.push(ReadRecord::from_bytes(&mmap[pos..pos + SIZE_READ_RECORD])?);
        pos += SIZE_READ_RECORD;
    }
    Ok((header, records))
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::error::Error;
    use crate::test_util::scratch_dir;
    use anyhow::Result;

    #[test]
    fn test_create_append_read() -> Result<()> {
        let dir = scratch_dir("index-create");
        let path = dir.join(".t.idx");

        let mut index = IndexFile::create(&path)?;
        assert_eq!(index.n_records()?, 0);
        assert_eq!(index.end_offset()?, SIZE_STORE_HEADER as u64);

        let records = vec![
            ReadRecord::new(1, 0, 500, 0, 750),
            ReadRecord::new(1, 0, 300, 125, 750),
            ReadRecord::new(2, 100, 300, 200, 0),
        ];
        index.append_records(&records)?;
        assert_eq!(index.n_records()?, 3);
        assert_eq!(index.read_record(0)?, records[0]);
        assert_eq!(index.read_record(2)?, records[2]);
        assert_eq!(index.read_records_from(1)?, records[1..]);

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_out_of_range() -> Result<()> {
        let dir = scratch_dir("index-range");
        let path = dir.join(".t.idx");
        let mut index = IndexFile::create(&path)?;
        index.append_records(&[ReadRecord::new(1, 0, 10, 0, 0)])?;
        let err = index.read_record(1).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexError(IndexError::OutOfRange {
                requested_index: 1,
                max_index: 1
            })
        ));
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_truncate_rollback() -> Result<()> {
        let dir = scratch_dir("index-truncate");
        let path = dir.join(".t.idx");
        let mut index = IndexFile::create(&path)?;
        index.append_records(&[ReadRecord::new(1, 0, 10, 0, 0)])?;
        let entry = index.end_offset()?;
        index.append_records(&[ReadRecord::new(2, 0, 20, 3, 0); 4])?;
        assert_eq!(index.n_records()?, 5);

        index.truncate(entry)?;
        assert_eq!(index.n_records()?, 1);
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_header_rewrite_in_place() -> Result<()> {
        let dir = scratch_dir("index-header");
        let path = dir.join(".t.idx");
        let mut index = IndexFile::create(&path)?;
        index.append_records(&[ReadRecord::new(1, 0, 10, 0, 0)])?;

        let mut header = index.read_header()?;
        header.ureads = 1;
        header.totlen = 10;
        index.write_header(&header)?;

        assert_eq!(index.read_header()?, header);
        assert_eq!(index.n_records()?, 1);
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_mmap_load_matches_file() -> Result<()> {
        let dir = scratch_dir("index-load");
        let path = dir.join(".t.idx");
        let mut index = IndexFile::create(&path)?;
        let records = vec![
            ReadRecord::new(7, 0, 400, 0, 10),
            ReadRecord::new(8, 10, 110, 100, 20),
        ];
        index.append_records(&records)?;
        let mut header = index.read_header()?;
        header.ureads = 2;
        index.write_header(&header)?;
        drop(index);

        let (readout_header, readout_records) = load(&path)?;
        assert_eq!(readout_header, header);
        assert_eq!(readout_records, records);
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_misaligned_file_rejected() -> Result<()> {
        let dir = scratch_dir("index-misaligned");
        let path = dir.join(".t.idx");
        let mut index = IndexFile::create(&path)?;
        index.append_records(&[ReadRecord::new(1, 0, 10, 0, 0)])?;
        let end = index.end_offset()?;
        index.truncate(end - 3)?;
        let err = index.n_records().unwrap_err();
        assert!(matches!(err, Error::IndexError(IndexError::Misaligned(_))));
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
