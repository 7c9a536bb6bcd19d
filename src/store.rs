//! Store facade
//!
//! [`StorePaths`] centralizes the naming scheme of a store's files: the
//! visible catalog `<root>.db` and its staging twin `<root>.dbx`, and the
//! hidden (dot-prefixed) index, bases, quality, and track files that live
//! beside it.
//!
//! [`SeqStore`] is the read-side handle: it opens the whole store or one
//! partition block as the active view, materializes a trimmed view on
//! demand, fetches reads out of the packed bases file in any alphabet, and
//! owns the annotation tracks loaded for the view. Committed records and
//! sequence bytes are immutable, so any number of `SeqStore` readers may
//! coexist with one writer that only ever appends and atomically swaps the
//! catalog.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::codec::{self, Alphabet};
use crate::error::{IndexError, Result, StoreError};
use crate::header::StoreHeader;
use crate::index;
use crate::record::ReadRecord;
use crate::track::{self, QualityTrack, Track, TrackSet};

/// File naming for a store rooted at `<dir>/<root>`
#[derive(Debug, Clone)]
pub struct StorePaths {
    dir: PathBuf,
    root: String,
}

impl StorePaths {
    /// Derives the store file names from a path, with or without the `.db`
    /// extension
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let root = name.strip_suffix(".db").unwrap_or(&name).to_string();
        if root.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a database path: {}", path.display()),
            )
            .into());
        }
        let dir = match path.parent() {
            Some(parent) if parent != Path::new("") => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self { dir, root })
    }

    /// Root name of the store
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The visible catalog file `<root>.db`
    #[must_use]
    pub fn stub(&self) -> PathBuf {
        self.dir.join(format!("{}.db", self.root))
    }

    /// The staging file the catalog is rewritten into before the atomic swap
    #[must_use]
    pub fn staging(&self) -> PathBuf {
        self.dir.join(format!("{}.dbx", self.root))
    }

    fn hidden(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!(".{}.{}", self.root, suffix))
    }

    /// The binary read index `.<root>.idx`
    #[must_use]
    pub fn index(&self) -> PathBuf {
        self.hidden("idx")
    }

    /// The packed sequence file `.<root>.bps`
    #[must_use]
    pub fn bases(&self) -> PathBuf {
        self.hidden("bps")
    }

    /// The compressed quality-stream file `.<root>.qvs`
    #[must_use]
    pub fn quality(&self) -> PathBuf {
        self.hidden("qvs")
    }

    /// The annotation file of the named track
    #[must_use]
    pub fn track_anno(&self, track: &str) -> PathBuf {
        self.hidden(&format!("{track}.anno"))
    }

    /// The data file of the named track
    #[must_use]
    pub fn track_data(&self, track: &str) -> PathBuf {
        self.hidden(&format!("{track}.data"))
    }
}

/// An open store with one active view
#[derive(Debug)]
pub struct SeqStore {
    paths: StorePaths,
    catalog: Catalog,
    header: StoreHeader,
    records: Vec<ReadRecord>,
    bases: File,
    tracks: TrackSet,
    packed: Vec<u8>,
}

impl SeqStore {
    /// Opens the whole store as the active view
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_view(path, 0)
    }

    /// Opens one partition block (1-based) as the active view
    ///
    /// Block 0 is the whole store. The block shares the bases file with the
    /// whole store; only the view's slice of the index is kept.
    pub fn open_block<P: AsRef<Path>>(path: P, part: usize) -> Result<Self> {
        Self::open_view(path, part)
    }

    fn open_view<P: AsRef<Path>>(path: P, part: usize) -> Result<Self> {
        let paths = StorePaths::new(path)?;
        let catalog = Catalog::load(paths.stub())?;
        let (mut header, mut records) = index::load(paths.index())?;

        if catalog.total_reads() != header.ureads {
            return Err(StoreError::ReadCountMismatch {
                catalog: catalog.total_reads(),
                header: header.ureads,
            }
            .into());
        }
        if records.len() != header.ureads as usize {
            return Err(StoreError::RecordCountMismatch {
                expected: header.ureads,
                found: records.len() as u32,
            }
            .into());
        }
        if header.is_partitioned() && catalog.partition.is_none() {
            return Err(StoreError::MissingPartition.into());
        }
        if !header.is_partitioned() && catalog.partition.is_some() {
            return Err(StoreError::UnexpectedPartition.into());
        }

        if part == 0 {
            header.nreads = header.ureads;
            header.trimmed = false;
            header.part = 0;
            header.ufirst = 0;
            header.tfirst = 0;
        } else {
            let partition = catalog.partition.as_ref().ok_or(StoreError::NotPartitioned)?;
            let nblocks = partition.n_blocks();
            if part > nblocks {
                return Err(StoreError::InvalidBlock {
                    requested: part,
                    nblocks,
                }
                .into());
            }
            let first = partition.spans[part - 1];
            let next = partition.spans[part];
            records = records[first.ufirst as usize..next.ufirst as usize].to_vec();

            header.nreads = next.ufirst - first.ufirst;
            header.trimmed = false;
            header.part = part as u32;
            header.ufirst = first.ufirst;
            header.tfirst = first.tfirst;
            header.totlen = records.iter().map(|r| r.len() as u64).sum();
            header.maxlen = records.iter().map(|r| r.len() as u32).max().unwrap_or(0);
        }

        let bases = File::open(paths.bases())?;
        Ok(Self {
            paths,
            catalog,
            header,
            records,
            bases,
            tracks: TrackSet::default(),
            packed: Vec::new(),
        })
    }

    /// The store's file naming
    #[must_use]
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// The catalog the store was opened with
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The header of the active view
    #[must_use]
    pub fn header(&self) -> &StoreHeader {
        &self.header
    }

    /// Number of reads in the active view
    #[must_use]
    pub fn n_reads(&self) -> usize {
        self.records.len()
    }

    /// Number of partition blocks, 0 when the store was never partitioned
    #[must_use]
    pub fn n_blocks(&self) -> usize {
        self.catalog
            .partition
            .as_ref()
            .map_or(0, crate::catalog::Partition::n_blocks)
    }

    /// The records of the active view, in read order
    #[must_use]
    pub fn records(&self) -> &[ReadRecord] {
        &self.records
    }

    /// The record of read `i` in the active view
    pub fn record(&self, i: usize) -> Result<&ReadRecord> {
        self.records.get(i).ok_or_else(|| {
            IndexError::OutOfRange {
                requested_index: i,
                max_index: self.records.len(),
            }
            .into()
        })
    }

    /// Materializes the trimmed view: keeps only reads meeting the store's
    /// length cutoff and well policy, and rebases the view statistics
    ///
    /// Loaded tracks were annotated against the untrimmed view and become
    /// stale; they are dropped and must be reloaded against the new view.
    pub fn trim(&mut self) -> Result<()> {
        if !self.header.is_partitioned() {
            return Err(StoreError::NotPartitioned.into());
        }
        if self.header.trimmed {
            return Err(StoreError::AlreadyTrimmed.into());
        }
        let cutoff = self.header.cutoff as usize;
        let all = self.header.all;
        self.records
            .retain(|r| r.len() >= cutoff && (all || r.is_best()));

        let kept = self.records.len() as u32;
        let expected = if self.header.part == 0 {
            self.header.treads
        } else {
            let partition = self
                .catalog
                .partition
                .as_ref()
                .ok_or(StoreError::MissingPartition)?;
            let part = self.header.part as usize;
            partition.spans[part].tfirst - partition.spans[part - 1].tfirst
        };
        if kept != expected {
            return Err(StoreError::TrimCountMismatch {
                part: self.header.part as usize,
                found: kept as usize,
                expected: expected as usize,
            }
            .into());
        }

        self.header.nreads = kept;
        self.header.trimmed = true;
        self.header.totlen = self.records.iter().map(|r| r.len() as u64).sum();
        self.header.maxlen = self.records.iter().map(|r| r.len() as u32).max().unwrap_or(0);
        self.tracks.clear();
        Ok(())
    }

    /// Loads read `i` of the active view into `buf` in the given alphabet
    pub fn load_read(&mut self, i: usize, buf: &mut Vec<u8>, alphabet: Alphabet) -> Result<()> {
        let record = *self.record(i)?;
        let len = record.len();
        self.packed.resize(codec::compressed_len(len), 0);
        self.bases.seek(SeekFrom::Start(record.boff as u64))?;
        self.bases.read_exact(&mut self.packed)?;

        buf.clear();
        codec::decode_into(&self.packed, len, buf)?;
        codec::render(buf, alphabet);
        Ok(())
    }

    /// Allocates a buffer big enough for the longest read in the view
    #[must_use]
    pub fn max_read_buffer(&self) -> Vec<u8> {
        Vec::with_capacity(self.header.maxlen as usize)
    }

    /// Loads the named track from its files and attaches it to the view
    ///
    /// The track must annotate exactly this view's reads; a track written
    /// against a different view is rejected as stale.
    pub fn load_track(&mut self, name: &str) -> Result<&Track> {
        track::validate_name(name)?;
        let loaded = Track::load(
            name,
            self.paths.track_anno(name),
            self.paths.track_data(name),
        )?;
        loaded.check_view(self.records.len())?;
        self.tracks.insert(loaded)?;
        Ok(self.tracks.get(name).expect("track was just inserted"))
    }

    /// The already-loaded track of the given name, view-checked
    pub fn track(&self, name: &str) -> Result<&Track> {
        let track = self
            .tracks
            .get(name)
            .ok_or_else(|| crate::error::TrackError::NoSuchTrack(name.to_string()))?;
        track.check_view(self.records.len())?;
        Ok(track)
    }

    /// Unloads the named track
    pub fn close_track(&mut self, name: &str) -> Result<()> {
        self.tracks
            .remove(name)
            .map(drop)
            .ok_or_else(|| crate::error::TrackError::NoSuchTrack(name.to_string()).into())
    }

    /// Loads the quality pseudo-track from the head of the `.qvs` file
    pub fn load_quality(&mut self) -> Result<&QualityTrack> {
        let mut file = File::open(self.paths.quality())?;
        let quality = QualityTrack::from_reader(&mut file)?;
        quality.check_view(self.records.len())?;
        self.tracks.set_quality(quality);
        Ok(self.tracks.quality().expect("quality was just loaded"))
    }

    /// The loaded quality pseudo-track, if any
    #[must_use]
    pub fn quality(&self) -> Option<&QualityTrack> {
        self.tracks.quality()
    }

    /// Unloads the quality pseudo-track
    pub fn close_quality(&mut self) {
        self.tracks.close_quality();
    }

    /// The tracks loaded for this view
    #[must_use]
    pub fn tracks(&self) -> &TrackSet {
        &self.tracks
    }
}
