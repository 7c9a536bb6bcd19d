//! Ingestion engine
//!
//! Ingestion streams one or more text-formatted source files into a store,
//! appending packed sequences to the bases file and one index record per
//! read, then commits the result atomically: the catalog is rewritten into a
//! staging file that replaces the live one by rename, and on any error the
//! bases and index files are truncated back to their entry offsets (or
//! removed outright when the store was newly created) so the store is left
//! byte-identical to its pre-call state.
//!
//! Source files are line-oriented text. Each read opens with a header line
//!
//! ```text
//! >prolog/well/beg_end RQ=0.qv
//! ```
//!
//! followed by one or more sequence lines, terminated by the next header or
//! end of input. The prolog is shared by every read of a file; the optional
//! `RQ` annotation carries the read's quality value (0 when absent). Reads
//! from one well arrive contiguously; each maximal same-well run is buffered
//! so the longest read of the run can be tagged best before the run is
//! flushed to the index in arrival order.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::Path;

use crate::catalog::{Catalog, CatalogFile, MAX_NAME};
use crate::codec;
use crate::error::{IngestError, Result, StoreError};
use crate::header::StoreHeader;
use crate::index::IndexFile;
use crate::partition::{self, PartitionParams};
use crate::record::{ReadRecord, MAX_READ_LEN};
use crate::store::StorePaths;

/// Cap on the well-group buffer, in records
///
/// A run of same-well reads longer than this is flushed early; the best tag
/// is then chosen over each buffered subset independently. This run-local
/// selection is the documented policy, not an approximation of a global one.
pub const WELL_GROUP_LIMIT: usize = 8192;

/// What an ingestion call added to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of source files appended
    pub files_added: usize,
    /// Number of reads appended
    pub reads_added: usize,
    /// Number of bases appended
    pub bases_added: u64,
}

/// Appends the given source files to the store at `db`, creating it if absent
///
/// Files are processed in the given order and reads in file order. The whole
/// call commits or rolls back as a unit: a malformed line in the last file
/// undoes the appends of every file before it.
pub fn ingest<P, Q>(db: P, inputs: &[Q]) -> Result<IngestReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let paths = StorePaths::new(db)?;
    let created = !paths.stub().exists();

    let (catalog, index, bases) = if created {
        let index = IndexFile::create(paths.index())?;
        let bases = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(paths.bases())?;
        (Catalog::default(), index, bases)
    } else {
        let catalog = Catalog::load(paths.stub())?;
        let index = IndexFile::open_rw(paths.index())?;
        let bases = File::options().read(true).write(true).open(paths.bases())?;
        (catalog, index, bases)
    };

    let mut engine = Ingestor::new(paths, catalog, index, bases, created)?;
    match engine.run(inputs) {
        Ok(report) => Ok(report),
        Err(err) => {
            engine.rollback();
            Err(err)
        }
    }
}

/// Offsets and header captured at entry, for rollback
#[derive(Debug, Clone, Copy)]
struct EntryState {
    header: StoreHeader,
    ioff: u64,
    boff: u64,
}

struct Ingestor {
    paths: StorePaths,
    catalog: Catalog,
    index: IndexFile,
    bases: File,
    header: StoreHeader,
    entry: EntryState,
    created: bool,

    /// Running append offset in the bases file
    offset: i64,
    /// Running cumulative read count (store numbering)
    oreads: u32,
    /// Buffer of records for the current well run
    group: Vec<ReadRecord>,
    /// Scratch buffers reused across reads
    seq: Vec<u8>,
    packed: Vec<u8>,

    /// Statistics over the newly ingested reads only
    count: [u64; 4],
    new_totlen: u64,
    new_maxlen: u32,
}

impl Ingestor {
    fn new(
        paths: StorePaths,
        catalog: Catalog,
        mut index: IndexFile,
        mut bases: File,
        created: bool,
    ) -> Result<Self> {
        let header = index.read_header()?;
        let ioff = index.end_offset()?;
        let boff = bases.seek(SeekFrom::End(0))?;

        if catalog.total_reads() != header.ureads {
            return Err(StoreError::ReadCountMismatch {
                catalog: catalog.total_reads(),
                header: header.ureads,
            }
            .into());
        }
        if header.is_partitioned() && catalog.partition.is_none() {
            return Err(StoreError::MissingPartition.into());
        }
        if !header.is_partitioned() && catalog.partition.is_some() {
            return Err(StoreError::UnexpectedPartition.into());
        }

        Ok(Self {
            paths,
            catalog,
            index,
            bases,
            entry: EntryState { header, ioff, boff },
            created,
            offset: boff as i64,
            oreads: header.ureads,
            group: Vec::new(),
            seq: Vec::new(),
            packed: Vec::new(),
            count: [0; 4],
            new_totlen: 0,
            new_maxlen: 0,
            header,
        })
    }

    fn run<Q: AsRef<Path>>(&mut self, inputs: &[Q]) -> Result<IngestReport> {
        for input in inputs {
            self.add_file(input.as_ref())?;
        }
        self.merge_statistics();
        if self.header.is_partitioned() {
            self.extend_partition()?;
        } else {
            self.header.treads = self.oreads;
        }

        self.bases.sync_all()?;
        self.index.write_header(&self.header)?;
        self.catalog
            .save(&self.paths.stub(), &self.paths.staging())?;

        Ok(IngestReport {
            files_added: inputs.len(),
            reads_added: (self.oreads - self.entry.header.ureads) as usize,
            bases_added: self.new_totlen,
        })
    }

    /// Parses one source file and appends its reads
    fn add_file(&mut self, input: &Path) -> Result<()> {
        let name = source_root(input);
        if name.len() >= MAX_NAME {
            return Err(IngestError::NameTooLong {
                file: name,
                max: MAX_NAME,
            }
            .into());
        }
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(IngestError::NameInvalid { file: name }.into());
        }
        if self.catalog.contains_file(&name) {
            return Err(IngestError::DuplicateFile { file: name }.into());
        }

        let file = File::open(input)?;
        let mut src = SourceReader::new(file, name.clone());

        let Some(first) = src.next_line()? else {
            return Err(IngestError::MissingHeader { file: name }.into());
        };
        if !first.starts_with('>') {
            return Err(IngestError::MissingHeader { file: name }.into());
        }
        let prolog = {
            let head = parse_read_header(&first).ok_or_else(|| src.bad_header())?;
            head.prolog.to_string()
        };

        let mut pending = first;
        let mut pwell: Option<i32> = None;
        loop {
            let head_line = src.line;
            let head = parse_read_header(&pending).ok_or_else(|| IngestError::BadHeader {
                file: src.file.clone(),
                line: head_line,
            })?;
            if head.prolog != prolog {
                return Err(IngestError::PrologMismatch {
                    file: src.file.clone(),
                    line: head_line,
                }
                .into());
            }

            let next = self.read_sequence(&mut src)?;
            self.push_read(&src, head_line, &head, &mut pwell)?;

            match next {
                Some(line) => pending = line,
                None => break,
            }
        }
        self.flush_group()?;

        self.catalog.files.push(CatalogFile {
            nreads: self.oreads,
            name,
            prolog,
        });
        Ok(())
    }

    /// Accumulates sequence lines into the numeric scratch buffer until the
    /// next header line or end of input, counting base composition as it goes
    fn read_sequence(&mut self, src: &mut SourceReader) -> Result<Option<String>> {
        self.seq.clear();
        loop {
            match src.next_line()? {
                None => return Ok(None),
                Some(line) if line.starts_with('>') => return Ok(Some(line)),
                Some(line) => {
                    for &base in line.as_bytes() {
                        let sym = codec::numeric_base(base).map_err(|_| {
                            IngestError::InvalidBase {
                                file: src.file.clone(),
                                line: src.line,
                                base,
                            }
                        })?;
                        self.count[sym as usize] += 1;
                        self.seq.push(sym);
                    }
                }
            }
        }
    }

    /// Validates one parsed read, appends its packed sequence, and folds its
    /// record into the current well group
    fn push_read(
        &mut self,
        src: &SourceReader,
        head_line: usize,
        head: &ReadHeader,
        pwell: &mut Option<i32>,
    ) -> Result<()> {
        let rlen = self.seq.len();
        if rlen > MAX_READ_LEN || head.end as usize > MAX_READ_LEN {
            return Err(IngestError::ReadTooLong {
                file: src.file.clone(),
                line: head_line,
                len: rlen.max(head.end as usize),
            }
            .into());
        }
        if head.beg > head.end {
            return Err(IngestError::BadHeader {
                file: src.file.clone(),
                line: head_line,
            }
            .into());
        }
        let interval = (head.end - head.beg) as usize;
        if interval != rlen {
            return Err(IngestError::LengthMismatch {
                file: src.file.clone(),
                line: head_line,
                seq: rlen,
                interval,
            }
            .into());
        }

        self.oreads += 1;
        self.new_totlen += rlen as u64;
        self.new_maxlen = self.new_maxlen.max(rlen as u32);

        self.packed.clear();
        codec::encode_into(&self.seq, &mut self.packed)?;
        self.bases.write_all(&self.packed)?;

        let mut record = ReadRecord::new(
            head.well,
            head.beg as u16,
            head.end as u16,
            self.offset,
            head.qv,
        );
        self.offset += self.packed.len() as i64;

        if *pwell == Some(head.well) {
            record.set_continuation();
            self.group.push(record);
            if self.group.len() >= WELL_GROUP_LIMIT {
                self.flush_group()?;
            }
        } else {
            self.flush_group()?;
            self.group.push(record);
        }
        *pwell = Some(head.well);
        Ok(())
    }

    /// Tags the longest buffered read as best and flushes the group to the
    /// index in arrival order
    fn flush_group(&mut self) -> Result<()> {
        if self.group.is_empty() {
            return Ok(());
        }
        let mut best = 0;
        for i in 1..self.group.len() {
            if self.group[i].len() > self.group[best].len() {
                best = i;
            }
        }
        self.group[best].set_best();
        self.index.append_records(&self.group)?;
        self.group.clear();
        Ok(())
    }

    /// Folds the new reads' statistics into the header aggregates
    ///
    /// Base frequencies merge by a length-weighted average so re-ingestion
    /// into a populated store keeps them consistent with the full base count.
    fn merge_statistics(&mut self) {
        let old = self.entry.header;
        self.header.ureads = self.oreads;
        if self.created || old.totlen == 0 {
            if self.new_totlen > 0 {
                for c in 0..4 {
                    self.header.freq[c] = self.count[c] as f32 / self.new_totlen as f32;
                }
            }
            self.header.totlen = self.new_totlen;
            self.header.maxlen = self.new_maxlen;
        } else {
            for c in 0..4 {
                self.header.freq[c] = (old.freq[c] * old.totlen as f32 + self.count[c] as f32)
                    / (old.totlen + self.new_totlen) as f32;
            }
            self.header.totlen = old.totlen + self.new_totlen;
            self.header.maxlen = old.maxlen.max(self.new_maxlen);
        }
        // commit leaves the whole untrimmed store as the active view
        self.header.nreads = self.header.ureads;
        self.header.trimmed = false;
        self.header.part = 0;
        self.header.ufirst = 0;
        self.header.tfirst = 0;
    }

    /// Extends the existing partition over the appended reads, preserving
    /// every previously closed block boundary
    fn extend_partition(&mut self) -> Result<()> {
        let part = self
            .catalog
            .partition
            .as_mut()
            .ok_or(StoreError::MissingPartition)?;
        let params = PartitionParams {
            size: part.size,
            cutoff: part.cutoff,
            all: part.all,
        };
        let index = &mut self.index;
        let treads = partition::extend(&mut part.spans, &params, |from| {
            index.read_records_from(from)
        })?;
        self.header.treads = treads;
        Ok(())
    }

    /// Restores the store to its entry state after a failure
    fn rollback(self) {
        let Self {
            paths,
            mut index,
            bases,
            entry,
            created,
            ..
        } = self;
        let _ = std::fs::remove_file(paths.staging());
        if created {
            drop(index);
            drop(bases);
            let _ = std::fs::remove_file(paths.index());
            let _ = std::fs::remove_file(paths.bases());
        } else {
            let _ = index.truncate(entry.ioff);
            let _ = index.write_header(&entry.header);
            let _ = bases.set_len(entry.boff);
            let _ = bases.sync_all();
        }
    }
}

/// Root name of a source file: the file stem, with a `.fasta` extension
/// stripped when present
fn source_root(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_suffix(".fasta").unwrap_or(&name).to_string()
}

/// Parsed fields of a read header line
#[derive(Debug)]
struct ReadHeader<'a> {
    prolog: &'a str,
    well: i32,
    beg: u32,
    end: u32,
    qv: u32,
}

/// Parses `>prolog/well/beg_end [RQ=0.qv]`
///
/// The quality annotation is optional and defaults to 0; a malformed
/// annotation is treated as absent, but a quality value above 999 does not
/// fit the 10-bit flags field and rejects the header.
fn parse_read_header(line: &str) -> Option<ReadHeader<'_>> {
    let rest = line.strip_prefix('>')?;
    let slash = rest.find('/')?;
    let prolog = &rest[..slash];
    if prolog.is_empty() || prolog.contains(char::is_whitespace) {
        return None;
    }

    let (well_str, tail) = rest[slash + 1..].split_once('/')?;
    let well: i32 = well_str.parse().ok()?;

    let (interval, annot) = match tail.find(char::is_whitespace) {
        Some(i) => (&tail[..i], tail[i..].trim_start()),
        None => (tail, ""),
    };
    let (beg_str, end_str) = interval.split_once('_')?;
    let beg: u32 = beg_str.parse().ok()?;
    let end: u32 = end_str.parse().ok()?;

    let qv = annot
        .strip_prefix("RQ=0.")
        .and_then(|digits| digits.trim_end().parse::<u32>().ok())
        .unwrap_or(0);
    if qv > 999 {
        return None;
    }

    Some(ReadHeader {
        prolog,
        well,
        beg,
        end,
        qv,
    })
}

/// Line reader over a source file, tracking line numbers and enforcing the
/// maximum line length
struct SourceReader {
    reader: BufReader<File>,
    file: String,
    line: usize,
}

impl SourceReader {
    fn new(file: File, name: String) -> Self {
        Self {
            reader: BufReader::new(file),
            file: name,
            line: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        let n = self.reader.read_line(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.line += 1;
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        if buf.len() > MAX_NAME - 2 {
            return Err(IngestError::LineTooLong {
                file: self.file.clone(),
                line: self.line,
                max: MAX_NAME - 2,
            }
            .into());
        }
        Ok(Some(buf))
    }

    fn bad_header(&self) -> crate::Error {
        IngestError::BadHeader {
            file: self.file.clone(),
            line: self.line,
        }
        .into()
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::error::Error;
    use crate::index;
    use crate::test_util::scratch_dir;
    use anyhow::Result;
    use std::path::PathBuf;

    fn seq_line(len: usize) -> String {
        "ACGT".chars().cycle().take(len).collect()
    }

    fn write_input(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_scenario_three_reads() -> Result<()> {
        let dir = scratch_dir("ingest-scenario");
        let body = format!(
            ">m1/1/0_500 RQ=0.750\n{}\n>m1/1/0_300\n{}\n>m1/2/0_200\n{}\n",
            seq_line(500),
            seq_line(300),
            seq_line(200)
        );
        let input = write_input(&dir, "movie.fasta", &body);
        let report = ingest(dir.join("store"), &[&input])?;
        assert_eq!(report.files_added, 1);
        assert_eq!(report.reads_added, 3);
        assert_eq!(report.bases_added, 1000);

        let (header, records) = index::load(dir.join(".store.idx"))?;
        assert_eq!(header.ureads, 3);
        assert_eq!(header.totlen, 1000);
        assert_eq!(header.maxlen, 500);
        assert_eq!(header.cutoff, -1);
        for f in header.freq {
            assert!((f - 0.25).abs() < 1e-5);
        }

        assert_eq!(records.len(), 3);
        assert!(records[0].is_best());
        assert!(!records[0].is_continuation());
        assert_eq!(records[0].qv(), 750);
        assert!(records[1].is_continuation());
        assert!(!records[1].is_best());
        assert!(records[2].is_best());
        assert!(!records[2].is_continuation());
        assert_eq!(records[2].qv(), 0);

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_monotonic_offsets() -> Result<()> {
        let dir = scratch_dir("ingest-offsets");
        let body = format!(
            ">m1/1/0_10\n{}\n>m1/2/0_7\n{}\n>m1/3/0_4\n{}\n",
            seq_line(10),
            seq_line(7),
            seq_line(4)
        );
        let input = write_input(&dir, "movie.fasta", &body);
        ingest(dir.join("store"), &[&input])?;

        let (_, records) = index::load(dir.join(".store.idx"))?;
        assert_eq!(records[0].boff, 0);
        assert_eq!(records[1].boff, 3); // ceil(10/4)
        assert_eq!(records[2].boff, 5); // + ceil(7/4)
        let bps = std::fs::metadata(dir.join(".store.bps"))?.len();
        assert_eq!(bps, 6); // + ceil(4/4)

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_multi_line_sequences() -> Result<()> {
        let dir = scratch_dir("ingest-multiline");
        let body = format!(">m1/1/0_10\n{}\n{}\n", seq_line(6), seq_line(4));
        let input = write_input(&dir, "movie.fasta", &body);
        ingest(dir.join("store"), &[&input])?;
        let (header, records) = index::load(dir.join(".store.idx"))?;
        assert_eq!(header.ureads, 1);
        assert_eq!(records[0].len(), 10);
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_duplicate_file_rejected() -> Result<()> {
        let dir = scratch_dir("ingest-duplicate");
        let body = format!(">m1/1/0_4\n{}\n", seq_line(4));
        let input = write_input(&dir, "movie.fasta", &body);
        ingest(dir.join("store"), &[&input])?;
        let err = ingest(dir.join("store"), &[&input]).unwrap_err();
        assert!(matches!(
            err,
            Error::IngestError(IngestError::DuplicateFile { .. })
        ));
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_prolog_mismatch_rejected() -> Result<()> {
        let dir = scratch_dir("ingest-prolog");
        let body = format!(
            ">m1/1/0_4\n{}\n>other/2/0_4\n{}\n",
            seq_line(4),
            seq_line(4)
        );
        let input = write_input(&dir, "movie.fasta", &body);
        let err = ingest(dir.join("store"), &[&input]).unwrap_err();
        assert!(matches!(
            err,
            Error::IngestError(IngestError::PrologMismatch { line: 3, .. })
        ));
        // the newly created store was removed again
        assert!(!dir.join("store.db").exists());
        assert!(!dir.join(".store.idx").exists());
        assert!(!dir.join(".store.bps").exists());
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_missing_header_rejected() -> Result<()> {
        let dir = scratch_dir("ingest-noheader");
        let input = write_input(&dir, "movie.fasta", "ACGT\n");
        let err = ingest(dir.join("store"), &[&input]).unwrap_err();
        assert!(matches!(
            err,
            Error::IngestError(IngestError::MissingHeader { .. })
        ));
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_invalid_base_rejected() -> Result<()> {
        let dir = scratch_dir("ingest-invalid-base");
        let input = write_input(&dir, "movie.fasta", ">m1/1/0_4\nACNT\n");
        let err = ingest(dir.join("store"), &[&input]).unwrap_err();
        assert!(matches!(
            err,
            Error::IngestError(IngestError::InvalidBase {
                line: 2,
                base: b'N',
                ..
            })
        ));
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_length_mismatch_rejected() -> Result<()> {
        let dir = scratch_dir("ingest-lenmismatch");
        let body = format!(">m1/1/0_10\n{}\n", seq_line(8));
        let input = write_input(&dir, "movie.fasta", &body);
        let err = ingest(dir.join("store"), &[&input]).unwrap_err();
        assert!(matches!(
            err,
            Error::IngestError(IngestError::LengthMismatch {
                seq: 8,
                interval: 10,
                ..
            })
        ));
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_second_ingest_appends_and_merges() -> Result<()> {
        let dir = scratch_dir("ingest-append");
        let one = write_input(
            &dir,
            "one.fasta",
            &format!(">m1/1/0_100\n{}\n", seq_line(100)),
        );
        let two = write_input(
            &dir,
            "two.fasta",
            &format!(">m2/5/0_300\n{}\n", seq_line(300)),
        );
        ingest(dir.join("store"), &[&one])?;
        ingest(dir.join("store"), &[&two])?;

        let (header, records) = index::load(dir.join(".store.idx"))?;
        assert_eq!(header.ureads, 2);
        assert_eq!(header.totlen, 400);
        assert_eq!(header.maxlen, 300);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].boff, 25);
        // both reads are sole members of their wells
        assert!(records.iter().all(ReadRecord::is_best));

        let catalog = Catalog::load(dir.join("store.db"))?;
        assert_eq!(catalog.files.len(), 2);
        assert_eq!(catalog.files[0].nreads, 1);
        assert_eq!(catalog.files[1].nreads, 2);

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_well_group_limit_flush() -> Result<()> {
        let dir = scratch_dir("ingest-group-limit");
        let mut body = String::new();
        for i in 0..=WELL_GROUP_LIMIT {
            // lengths rise so the overall longest read sits past the cap
            let len = 4 + 4 * (i % 2) + 8 * usize::from(i == WELL_GROUP_LIMIT);
            body.push_str(&format!(">m1/9/0_{len}\n{}\n", seq_line(len)));
        }
        let input = write_input(&dir, "movie.fasta", &body);
        ingest(dir.join("store"), &[&input])?;

        let (_, records) = index::load(dir.join(".store.idx"))?;
        assert_eq!(records.len(), WELL_GROUP_LIMIT + 1);
        // one best per buffered subset: the capped run and the remainder
        let bests: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_best())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(bests.len(), 2);
        assert!(bests[0] < WELL_GROUP_LIMIT);
        assert_eq!(bests[1], WELL_GROUP_LIMIT);
        // all but the first read continue the well run
        assert!(records[1..].iter().all(ReadRecord::is_continuation));

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_line_too_long_rejected() -> Result<()> {
        let dir = scratch_dir("ingest-longline");
        let len = MAX_NAME + 100;
        let body = format!(">m1/1/0_{len}\n{}\n", seq_line(len));
        let input = write_input(&dir, "movie.fasta", &body);
        let err = ingest(dir.join("store"), &[&input]).unwrap_err();
        assert!(matches!(
            err,
            Error::IngestError(IngestError::LineTooLong { line: 2, .. })
        ));
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_parse_read_header() {
        let head = parse_read_header(">m54119_170201/42/250_1250 RQ=0.853").unwrap();
        assert_eq!(head.prolog, "m54119_170201");
        assert_eq!(head.well, 42);
        assert_eq!(head.beg, 250);
        assert_eq!(head.end, 1250);
        assert_eq!(head.qv, 853);

        let head = parse_read_header(">p/7/0_99").unwrap();
        assert_eq!(head.qv, 0);

        assert!(parse_read_header("no leading marker").is_none());
        assert!(parse_read_header(">noslash").is_none());
        assert!(parse_read_header(">p/x/0_99").is_none());
        assert!(parse_read_header(">p/7/0-99").is_none());
        // an over-range quality value does not fit the flags field
        assert!(parse_read_header(">p/7/0_99 RQ=0.1853").is_none());
    }
}
