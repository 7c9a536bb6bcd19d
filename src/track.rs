//! Annotation tracks
//!
//! A track attaches one annotation per read to a store, held in side files
//! next to the index (`.<root>.<track>.anno`, plus `.<track>.data` when the
//! payloads are variable length). The annotation array always holds
//! `nreads + 1` entries; for variable tracks `data[anno[i]..anno[i+1])` is
//! the payload of read `i`.
//!
//! The quality-value information is a *pseudo-track* under the reserved name
//! [`QUALITY_TRACK_NAME`]: instead of annotation offsets it carries a small
//! table of coding schemes and a per-read index selecting which scheme
//! decodes that read's quality stream in the `.qvs` file. Normal track names
//! cannot begin with a `.`, so the pseudo-track can never be confused with a
//! user track, and it is always the head of the loaded track list.
//!
//! Tracks remember the read count of the view they were loaded against;
//! accessing one through a view with a different read count is rejected as
//! stale rather than silently returning mismatched data.

use byteorder::{ByteOrder, LittleEndian};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Result, TrackError};

/// Reserved name of the quality-value pseudo-track
pub const QUALITY_TRACK_NAME: &str = ".qvs";

/// Current magic number: "STRK" in ASCII (in little-endian byte order)
#[allow(clippy::unreadable_literal)]
const MAGIC: u32 = 0x4B525453;

/// Current format version of the track annotation file
const FORMAT: u8 = 1;

/// Size of the annotation file header in bytes
pub const SIZE_TRACK_HEADER: usize = 16;

const KIND_FIXED: u8 = 0;
const KIND_VAR32: u8 = 1;
const KIND_VAR64: u8 = 2;

/// Annotation payload of a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackData {
    /// `nreads + 1` fixed-size annotation records, `size` bytes each
    Fixed { size: usize, anno: Vec<u8> },
    /// `nreads + 1` 32-bit offsets into a variable-length data stream
    Variable32 { anno: Vec<u32>, data: Vec<u8> },
    /// `nreads + 1` 64-bit offsets into a variable-length data stream
    Variable64 { anno: Vec<u64>, data: Vec<u8> },
}

impl TrackData {
    fn n_anno(&self) -> usize {
        match self {
            Self::Fixed { size, anno } => {
                if *size == 0 {
                    0
                } else {
                    anno.len() / size
                }
            }
            Self::Variable32 { anno, .. } => anno.len(),
            Self::Variable64 { anno, .. } => anno.len(),
        }
    }
}

/// A named per-read annotation container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    name: String,
    /// Read count of the view this track was loaded against
    nreads: usize,
    data: TrackData,
}

impl Track {
    /// Builds a track over a view of `nreads` reads
    ///
    /// # Errors
    ///
    /// Rejects reserved names and annotation arrays that do not hold exactly
    /// `nreads + 1` entries.
    pub fn new(name: &str, nreads: usize, data: TrackData) -> Result<Self> {
        validate_name(name)?;
        let n_anno = data.n_anno();
        if n_anno != nreads + 1 {
            return Err(TrackError::BadAnnotationCount(n_anno, nreads + 1).into());
        }
        Ok(Self {
            name: name.to_string(),
            nreads,
            data,
        })
    }

    /// The track's symbolic name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read count of the view this track was loaded against
    #[must_use]
    pub fn nreads(&self) -> usize {
        self.nreads
    }

    /// The annotation payload
    #[must_use]
    pub fn data(&self) -> &TrackData {
        &self.data
    }

    /// Rejects the track if it was loaded against a different view
    pub fn check_view(&self, nreads: usize) -> Result<()> {
        if self.nreads == nreads {
            Ok(())
        } else {
            Err(TrackError::Stale(self.nreads, nreads).into())
        }
    }

    /// The annotation payload of read `i`
    ///
    /// For a fixed track this is its `size`-byte record; for a variable
    /// track, the `data[anno[i]..anno[i+1])` slice.
    pub fn payload(&self, i: usize) -> Result<&[u8]> {
        if i >= self.nreads {
            return Err(TrackError::OutOfRange {
                requested_index: i,
                max_index: self.nreads,
            }
            .into());
        }
        let slice = match &self.data {
            TrackData::Fixed { size, anno } => &anno[i * size..(i + 1) * size],
            TrackData::Variable32 { anno, data } => {
                &data[anno[i] as usize..anno[i + 1] as usize]
            }
            TrackData::Variable64 { anno, data } => {
                &data[anno[i] as usize..anno[i + 1] as usize]
            }
        };
        Ok(slice)
    }

    /// Loads a track from its annotation file (and data file, when the
    /// annotation header says the payloads are variable length)
    pub fn load<P: AsRef<Path>>(name: &str, anno_path: P, data_path: P) -> Result<Self> {
        let bytes = fs::read(anno_path)?;
        if bytes.len() < SIZE_TRACK_HEADER {
            return Err(TrackError::BadAnnotationCount(0, 1).into());
        }
        let magic = LittleEndian::read_u32(&bytes[0..4]);
        if magic != MAGIC {
            return Err(TrackError::InvalidMagicNumber(magic).into());
        }
        let _format = bytes[4];
        let kind = bytes[5];
        let size = LittleEndian::read_u16(&bytes[6..8]) as usize;
        let nreads = LittleEndian::read_u32(&bytes[8..12]) as usize;
        let body = &bytes[SIZE_TRACK_HEADER..];

        let data = match kind {
            KIND_FIXED => {
                let expected = (nreads + 1) * size;
                if body.len() != expected {
                    return Err(
                        TrackError::BadAnnotationCount(body.len() / size.max(1), nreads + 1).into(),
                    );
                }
                TrackData::Fixed {
                    size,
                    anno: body.to_vec(),
                }
            }
            KIND_VAR32 => {
                let mut anno = vec![0u32; nreads + 1];
                if body.len() != anno.len() * 4 {
                    return Err(TrackError::BadAnnotationCount(body.len() / 4, nreads + 1).into());
                }
                LittleEndian::read_u32_into(body, &mut anno);
                let data = fs::read(data_path)?;
                TrackData::Variable32 { anno, data }
            }
            KIND_VAR64 => {
                let mut anno = vec![0u64; nreads + 1];
                if body.len() != anno.len() * 8 {
                    return Err(TrackError::BadAnnotationCount(body.len() / 8, nreads + 1).into());
                }
                LittleEndian::read_u64_into(body, &mut anno);
                let data = fs::read(data_path)?;
                TrackData::Variable64 { anno, data }
            }
            other => return Err(TrackError::InvalidKind(other).into()),
        };
        Self::new(name, nreads, data)
    }

    /// Saves the track to its annotation file (and data file where needed)
    pub fn save<P: AsRef<Path>>(&self, anno_path: P, data_path: P) -> Result<()> {
        let mut header = [0u8; SIZE_TRACK_HEADER];
        LittleEndian::write_u32(&mut header[0..4], MAGIC);
        header[4] = FORMAT;
        let (kind, size) = match &self.data {
            TrackData::Fixed { size, .. } => (KIND_FIXED, *size as u16),
            TrackData::Variable32 { .. } => (KIND_VAR32, 4),
            TrackData::Variable64 { .. } => (KIND_VAR64, 8),
        };
        header[5] = kind;
        LittleEndian::write_u16(&mut header[6..8], size);
        LittleEndian::write_u32(&mut header[8..12], self.nreads as u32);

        let mut out = fs::File::create(anno_path)?;
        out.write_all(&header)?;
        match &self.data {
            TrackData::Fixed { anno, .. } => out.write_all(anno)?,
            TrackData::Variable32 { anno, data } => {
                let mut buf = vec![0u8; anno.len() * 4];
                LittleEndian::write_u32_into(anno, &mut buf);
                out.write_all(&buf)?;
                fs::write(data_path, data)?;
            }
            TrackData::Variable64 { anno, data } => {
                let mut buf = vec![0u8; anno.len() * 8];
                LittleEndian::write_u64_into(anno, &mut buf);
                out.write_all(&buf)?;
                fs::write(data_path, data)?;
            }
        }
        Ok(())
    }
}

/// Rejects names that would collide with the pseudo-track convention
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('.') {
        return Err(TrackError::ReservedName(name.to_string()).into());
    }
    Ok(())
}

/// One opaque quality-value coding scheme
///
/// The coding tables themselves are outside this crate's scope; a scheme is
/// carried as an opaque blob so the storage contract round-trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QvScheme(pub Vec<u8>);

/// The reserved quality-value pseudo-track
///
/// Holds the coding-scheme table of the `.qvs` file and, per read, the index
/// of the scheme that decodes that read's quality stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityTrack {
    schemes: Vec<QvScheme>,
    table: Vec<u16>,
}

impl QualityTrack {
    /// Builds the pseudo-track from a scheme table and per-read selectors
    ///
    /// # Errors
    ///
    /// Rejects a table entry that selects a scheme beyond the coding table.
    pub fn new(schemes: Vec<QvScheme>, table: Vec<u16>) -> Result<Self> {
        let ncodes = schemes.len();
        if let Some(&bad) = table.iter().find(|&&t| usize::from(t) >= ncodes) {
            return Err(TrackError::OutOfRange {
                requested_index: usize::from(bad),
                max_index: ncodes,
            }
            .into());
        }
        Ok(Self { schemes, table })
    }

    /// Number of coding schemes
    #[must_use]
    pub fn ncodes(&self) -> usize {
        self.schemes.len()
    }

    /// Read count of the view this pseudo-track was loaded against
    #[must_use]
    pub fn nreads(&self) -> usize {
        self.table.len()
    }

    /// The coding scheme that decodes read `i`'s quality stream
    pub fn scheme_for(&self, i: usize) -> Result<&QvScheme> {
        let selector = self.table.get(i).ok_or(TrackError::OutOfRange {
            requested_index: i,
            max_index: self.table.len(),
        })?;
        Ok(&self.schemes[usize::from(*selector)])
    }

    /// Rejects the pseudo-track if it was loaded against a different view
    pub fn check_view(&self, nreads: usize) -> Result<()> {
        if self.table.len() == nreads {
            Ok(())
        } else {
            Err(TrackError::Stale(self.table.len(), nreads).into())
        }
    }

    /// Reads the coding table at the head of a `.qvs` file
    ///
    /// Layout: scheme count (u16), then each scheme as a length-prefixed
    /// blob (u32 + bytes), then the read count (u32) and the per-read
    /// selector table (u16 each). The compressed streams follow; their
    /// offsets live in the read records.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let mut short = [0u8; 2];
        reader.read_exact(&mut short)?;
        let ncodes = LittleEndian::read_u16(&short) as usize;

        let mut schemes = Vec::with_capacity(ncodes);
        for _ in 0..ncodes {
            let mut word = [0u8; 4];
            reader.read_exact(&mut word)?;
            let len = LittleEndian::read_u32(&word) as usize;
            let mut blob = vec![0u8; len];
            reader.read_exact(&mut blob)?;
            schemes.push(QvScheme(blob));
        }

        let mut word = [0u8; 4];
        reader.read_exact(&mut word)?;
        let nreads = LittleEndian::read_u32(&word) as usize;
        let mut raw = vec![0u8; nreads * 2];
        reader.read_exact(&mut raw)?;
        let mut table = vec![0u16; nreads];
        LittleEndian::read_u16_into(&raw, &mut table);

        Self::new(schemes, table)
    }

    /// Writes the coding table to the head of a `.qvs` file
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut short = [0u8; 2];
        LittleEndian::write_u16(&mut short, self.schemes.len() as u16);
        writer.write_all(&short)?;
        for scheme in &self.schemes {
            let mut word = [0u8; 4];
            LittleEndian::write_u32(&mut word, scheme.0.len() as u32);
            writer.write_all(&word)?;
            writer.write_all(&scheme.0)?;
        }
        let mut word = [0u8; 4];
        LittleEndian::write_u32(&mut word, self.table.len() as u32);
        writer.write_all(&word)?;
        let mut raw = vec![0u8; self.table.len() * 2];
        LittleEndian::write_u16_into(&self.table, &mut raw);
        writer.write_all(&raw)?;
        Ok(())
    }
}

/// The tracks loaded for one open store
///
/// The quality pseudo-track, when loaded, is the head of the list; user
/// tracks follow in load order. The set is owned by the store and dropped
/// with it.
#[derive(Debug, Clone, Default)]
pub struct TrackSet {
    quality: Option<QualityTrack>,
    tracks: Vec<Track>,
}

impl TrackSet {
    /// Adds a user track, replacing any loaded track of the same name
    pub fn insert(&mut self, track: Track) -> Result<()> {
        validate_name(track.name())?;
        if let Some(existing) = self.tracks.iter_mut().find(|t| t.name == track.name) {
            *existing = track;
        } else {
            self.tracks.push(track);
        }
        Ok(())
    }

    /// The loaded user track of the given name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name)
    }

    /// Removes and returns the loaded user track of the given name
    pub fn remove(&mut self, name: &str) -> Option<Track> {
        let pos = self.tracks.iter().position(|t| t.name == name)?;
        Some(self.tracks.remove(pos))
    }

    /// Installs the quality pseudo-track at the head of the list
    pub fn set_quality(&mut self, quality: QualityTrack) {
        self.quality = Some(quality);
    }

    /// The quality pseudo-track, if loaded
    #[must_use]
    pub fn quality(&self) -> Option<&QualityTrack> {
        self.quality.as_ref()
    }

    /// Removes the quality pseudo-track
    pub fn close_quality(&mut self) -> Option<QualityTrack> {
        self.quality.take()
    }

    /// Drops every loaded track, quality included
    pub fn clear(&mut self) {
        self.quality = None;
        self.tracks.clear();
    }

    /// Number of loaded tracks, quality pseudo-track included
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len() + usize::from(self.quality.is_some())
    }

    /// Whether no track is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the loaded user tracks in list order
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::error::Error;
    use crate::test_util::scratch_dir;
    use anyhow::Result;
    use std::io::Cursor;

    #[test]
    fn test_variable_track_payloads() -> Result<()> {
        let track = Track::new(
            "pulses",
            3,
            TrackData::Variable32 {
                anno: vec![0, 2, 2, 5],
                data: b"abcde".to_vec(),
            },
        )?;
        assert_eq!(track.payload(0)?, b"ab");
        assert_eq!(track.payload(1)?, b"");
        assert_eq!(track.payload(2)?, b"cde");
        assert!(track.payload(3).is_err());
        Ok(())
    }

    #[test]
    fn test_fixed_track_payloads() -> Result<()> {
        let track = Track::new(
            "score",
            2,
            TrackData::Fixed {
                size: 2,
                anno: vec![1, 2, 3, 4, 5, 6],
            },
        )?;
        assert_eq!(track.payload(0)?, &[1, 2]);
        assert_eq!(track.payload(1)?, &[3, 4]);
        Ok(())
    }

    #[test]
    fn test_reserved_names_rejected() {
        let data = TrackData::Fixed {
            size: 1,
            anno: vec![0; 2],
        };
        let err = Track::new(".qvs", 1, data.clone()).unwrap_err();
        assert!(matches!(
            err,
            Error::TrackError(TrackError::ReservedName(_))
        ));
        let err = Track::new(".hidden", 1, data).unwrap_err();
        assert!(matches!(
            err,
            Error::TrackError(TrackError::ReservedName(_))
        ));
    }

    #[test]
    fn test_anno_count_must_match_view() {
        let err = Track::new(
            "pulses",
            3,
            TrackData::Variable32 {
                anno: vec![0, 2],
                data: Vec::new(),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::TrackError(TrackError::BadAnnotationCount(2, 4))
        ));
    }

    #[test]
    fn test_stale_track_rejected() -> Result<()> {
        let track = Track::new(
            "score",
            2,
            TrackData::Fixed {
                size: 1,
                anno: vec![0; 3],
            },
        )?;
        assert!(track.check_view(2).is_ok());
        let err = track.check_view(1).unwrap_err();
        assert!(matches!(err, Error::TrackError(TrackError::Stale(2, 1))));
        Ok(())
    }

    #[test]
    fn test_track_file_roundtrip() -> Result<()> {
        let dir = scratch_dir("track-roundtrip");
        let track = Track::new(
            "pulses",
            2,
            TrackData::Variable64 {
                anno: vec![0, 3, 7],
                data: b"0123456".to_vec(),
            },
        )?;
        let anno = dir.join(".t.pulses.anno");
        let data = dir.join(".t.pulses.data");
        track.save(&anno, &data)?;
        let readout = Track::load("pulses", &anno, &data)?;
        assert_eq!(readout, track);
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_quality_track_roundtrip() -> Result<()> {
        let quality = QualityTrack::new(
            vec![QvScheme(vec![1, 2, 3]), QvScheme(vec![9])],
            vec![0, 1, 0],
        )?;
        assert_eq!(quality.ncodes(), 2);
        assert_eq!(quality.scheme_for(1)?.0, vec![9]);

        let mut buf = Vec::new();
        quality.write_bytes(&mut buf)?;
        let readout = QualityTrack::from_reader(&mut Cursor::new(&buf))?;
        assert_eq!(readout, quality);
        Ok(())
    }

    #[test]
    fn test_quality_track_rejects_bad_selector() {
        let err = QualityTrack::new(vec![QvScheme(vec![1])], vec![0, 1]).unwrap_err();
        assert!(matches!(
            err,
            Error::TrackError(TrackError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_track_set_keeps_quality_at_head() -> Result<()> {
        let mut set = TrackSet::default();
        assert!(set.is_empty());
        set.insert(Track::new(
            "score",
            1,
            TrackData::Fixed {
                size: 1,
                anno: vec![0; 2],
            },
        )?)?;
        set.set_quality(QualityTrack::new(vec![QvScheme(Vec::new())], vec![0])?);
        assert_eq!(set.len(), 2);
        assert!(set.quality().is_some());
        assert!(set.get("score").is_some());

        set.close_quality();
        assert_eq!(set.len(), 1);
        set.clear();
        assert!(set.is_empty());
        Ok(())
    }
}
