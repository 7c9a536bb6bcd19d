//! Store header
//!
//! The index file opens with a single fixed-size [`StoreHeader`] record that
//! carries the store's aggregate statistics, the partition parameters once a
//! partition exists, and the fields describing the currently active view
//! (whole store, or one block, trimmed or not). The active-view fields are
//! recomputed whenever a view is materialized; the aggregates are only
//! touched by ingestion and partitioning.

use byteorder::{ByteOrder, LittleEndian};
use std::io::{Read, Write};

use crate::error::{IndexError, Result};

/// Current magic number: "SIDX" in ASCII (in little-endian byte order)
#[allow(clippy::unreadable_literal)]
const MAGIC: u32 = 0x58444953;

/// Current format version of the index file
const FORMAT: u8 = 1;

/// Size of the store header in bytes
pub const SIZE_STORE_HEADER: usize = 80;

/// Reserved bytes in the store header
pub const RESERVED: [u8; 17] = [42; 17];

/// Header record of the binary read index
///
/// Serialized as 80 little-endian bytes:
/// - Bytes 0-3: magic number
/// - Byte 4: format version
/// - Bytes 5-8: `ureads` (u32)
/// - Bytes 9-12: `treads` (u32)
/// - Bytes 13-16: `cutoff` (i32)
/// - Byte 17: `all` (bool)
/// - Bytes 18-33: `freq` ([f32; 4])
/// - Bytes 34-37: `maxlen` (u32)
/// - Bytes 38-45: `totlen` (u64)
/// - Bytes 46-49: `nreads` (u32)
/// - Byte 50: `trimmed` (bool)
/// - Bytes 51-54: `part` (u32)
/// - Bytes 55-58: `ufirst` (u32)
/// - Bytes 59-62: `tfirst` (u32)
/// - Bytes 63-79: reserved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreHeader {
    /// Total number of reads in the store (untrimmed)
    pub ureads: u32,
    /// Total number of reads surviving the trim predicate
    pub treads: u32,
    /// Minimum read length in a block (-1 if the store was never partitioned)
    pub cutoff: i32,
    /// Whether multiple reads from a given well are kept when trimming
    pub all: bool,
    /// Frequency of A, C, G, T respectively; sums to 1.0 up to rounding
    pub freq: [f32; 4],
    /// Length of the maximum read in the active view
    pub maxlen: u32,
    /// Total number of bases in the active view
    pub totlen: u64,
    /// Number of reads in the active view
    pub nreads: u32,
    /// Whether the active view has been trimmed
    pub trimmed: bool,
    /// Active block id (0 = whole store)
    pub part: u32,
    /// Index of the active block's first read, untrimmed numbering
    pub ufirst: u32,
    /// Index of the active block's first read, trimmed numbering
    pub tfirst: u32,
}

impl Default for StoreHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreHeader {
    /// Creates the header of an empty, never-partitioned store
    #[must_use]
    pub fn new() -> Self {
        Self {
            ureads: 0,
            treads: 0,
            cutoff: -1,
            all: false,
            freq: [0.0; 4],
            maxlen: 0,
            totlen: 0,
            nreads: 0,
            trimmed: false,
            part: 0,
            ufirst: 0,
            tfirst: 0,
        }
    }

    /// Whether a partition has been computed for this store at least once
    #[must_use]
    pub fn is_partitioned(&self) -> bool {
        self.cutoff >= 0
    }

    /// Parses a header from a fixed-size byte array
    ///
    /// # Errors
    ///
    /// Returns an error if the magic number, format version, or reserved
    /// bytes are invalid.
    pub fn from_bytes(buffer: &[u8; SIZE_STORE_HEADER]) -> Result<Self> {
        let magic = LittleEndian::read_u32(&buffer[0..4]);
        if magic != MAGIC {
            return Err(IndexError::InvalidMagicNumber(magic).into());
        }
        let format = buffer[4];
        if format != FORMAT {
            return Err(IndexError::InvalidFormatVersion(format).into());
        }
        let mut freq = [0f32; 4];
        LittleEndian::read_f32_into(&buffer[18..34], &mut freq);
        if buffer[63..80] != RESERVED {
            return Err(IndexError::InvalidReservedBytes.into());
        }
        Ok(Self {
            ureads: LittleEndian::read_u32(&buffer[5..9]),
            treads: LittleEndian::read_u32(&buffer[9..13]),
            cutoff: LittleEndian::read_i32(&buffer[13..17]),
            all: buffer[17] != 0,
            freq,
            maxlen: LittleEndian::read_u32(&buffer[34..38]),
            totlen: LittleEndian::read_u64(&buffer[38..46]),
            nreads: LittleEndian::read_u32(&buffer[46..50]),
            trimmed: buffer[50] != 0,
            part: LittleEndian::read_u32(&buffer[51..55]),
            ufirst: LittleEndian::read_u32(&buffer[55..59]),
            tfirst: LittleEndian::read_u32(&buffer[59..63]),
        })
    }

    /// Parses a header from the front of an arbitrarily sized buffer
    pub fn from_buffer(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < SIZE_STORE_HEADER {
            return Err(IndexError::InvalidSize(buffer.len(), SIZE_STORE_HEADER).into());
        }
        let mut bytes = [0u8; SIZE_STORE_HEADER];
        bytes.copy_from_slice(&buffer[..SIZE_STORE_HEADER]);
        Self::from_bytes(&bytes)
    }

    /// Writes the header to a writer
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut buffer = [0u8; SIZE_STORE_HEADER];
        LittleEndian::write_u32(&mut buffer[0..4], MAGIC);
        buffer[4] = FORMAT;
        LittleEndian::write_u32(&mut buffer[5..9], self.ureads);
        LittleEndian::write_u32(&mut buffer[9..13], self.treads);
        LittleEndian::write_i32(&mut buffer[13..17], self.cutoff);
        buffer[17] = u8::from(self.all);
        LittleEndian::write_f32_into(&self.freq, &mut buffer[18..34]);
        LittleEndian::write_u32(&mut buffer[34..38], self.maxlen);
        LittleEndian::write_u64(&mut buffer[38..46], self.totlen);
        LittleEndian::write_u32(&mut buffer[46..50], self.nreads);
        buffer[50] = u8::from(self.trimmed);
        LittleEndian::write_u32(&mut buffer[51..55], self.part);
        LittleEndian::write_u32(&mut buffer[55..59], self.ufirst);
        LittleEndian::write_u32(&mut buffer[59..63], self.tfirst);
        buffer[63..80].copy_from_slice(&RESERVED);
        writer.write_all(&buffer)?;
        Ok(())
    }

    /// Reads a header from a reader
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buffer = [0u8; SIZE_STORE_HEADER];
        reader.read_exact(&mut buffer)?;
        Self::from_bytes(&buffer)
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::error::Error;
    use anyhow::Result;
    use std::io::Cursor;

    #[test]
    fn test_header_roundtrip() -> Result<()> {
        let header = StoreHeader {
            ureads: 1000,
            treads: 750,
            cutoff: 500,
            all: true,
            freq: [0.3, 0.2, 0.2, 0.3],
            maxlen: 40000,
            totlen: 12_345_678,
            nreads: 1000,
            trimmed: false,
            part: 2,
            ufirst: 400,
            tfirst: 300,
        };
        let mut buf = Vec::new();
        header.write_bytes(&mut buf)?;
        assert_eq!(buf.len(), SIZE_STORE_HEADER);

        let readout = StoreHeader::from_reader(&mut Cursor::new(&buf))?;
        assert_eq!(readout, header);
        assert!(readout.is_partitioned());
        Ok(())
    }

    #[test]
    fn test_new_header_is_unpartitioned() {
        let header = StoreHeader::new();
        assert_eq!(header.cutoff, -1);
        assert!(!header.is_partitioned());
        assert_eq!(header.ureads, 0);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let header = StoreHeader::new();
        let mut buf = Vec::new();
        header.write_bytes(&mut buf).unwrap();
        buf[0] ^= 0xFF;
        let err = StoreHeader::from_buffer(&buf).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexError(IndexError::InvalidMagicNumber(_))
        ));
    }

    #[test]
    fn test_rejects_bad_version() {
        let header = StoreHeader::new();
        let mut buf = Vec::new();
        header.write_bytes(&mut buf).unwrap();
        buf[4] = 99;
        let err = StoreHeader::from_buffer(&buf).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexError(IndexError::InvalidFormatVersion(99))
        ));
    }

    #[test]
    fn test_rejects_short_buffer() {
        let err = StoreHeader::from_buffer(&[0u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexError(IndexError::InvalidSize(16, SIZE_STORE_HEADER))
        ));
    }
}
