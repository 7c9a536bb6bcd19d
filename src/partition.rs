//! Block partition planner
//!
//! Partitioning divides the read index into contiguous blocks bounded by a
//! total-base cap and a hard per-block read count, so downstream batch
//! consumers can work one block at a time. A read enters the running block
//! if its trim interval meets the length cutoff and it is either the best of
//! its well or the all-wells flag is set. The planner is a deterministic
//! scan: re-running it over the same records and parameters reproduces the
//! boundary table bit for bit, which is what lets ingestion extend an
//! existing partition without disturbing closed blocks.

use std::path::Path;

use crate::catalog::{BlockSpan, Catalog, Partition};
use crate::error::{PartitionError, Result, StoreError};
use crate::index::IndexFile;
use crate::record::ReadRecord;
use crate::store::StorePaths;

/// Hard cap on reads per block; per-block read ids are stored in a 16-bit
/// field downstream
pub const MAX_BLOCK_READS: usize = 65535;

/// Parameters of a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionParams {
    /// Block size cap in total included bases
    pub size: u64,
    /// Minimum trim-interval length for a read to be included
    pub cutoff: u32,
    /// Include every read of a well, not just the best of each run
    pub all: bool,
}

/// Outcome of a partitioning pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSummary {
    /// Number of blocks in the new table
    pub n_blocks: usize,
    /// Number of reads surviving the trim predicate
    pub treads: u32,
}

impl PartitionParams {
    /// Whether a record enters a block under these parameters
    #[must_use]
    pub fn includes(&self, record: &ReadRecord) -> bool {
        record.len() >= self.cutoff as usize && (self.all || record.is_best())
    }
}

/// Plans a boundary table from scratch over the full record array
///
/// Returns the table (leading `(0, 0)` entry included) and the trimmed read
/// count.
pub fn plan(records: &[ReadRecord], params: &PartitionParams) -> Result<(Vec<BlockSpan>, u32)> {
    if params.size == 0 {
        return Err(PartitionError::ZeroBlockSize.into());
    }
    let mut spans = vec![BlockSpan::default()];
    let treads = scan_from(records, BlockSpan::default(), params, &mut spans);
    Ok((spans, treads))
}

/// Extends an existing boundary table over newly appended records
///
/// The trailing sentinel entry is dropped and the scan resumes from the
/// first read of the last block; that block's reads are unchanged, so the
/// deterministic scan reproduces its prior close (or extends it if it was
/// still open) before walking into the new reads. Closed boundaries are
/// never disturbed. `read_tail` is handed the store index to resume from
/// and must return every record from there to the end of the index.
///
/// Returns the updated trimmed read count.
pub fn extend<F>(
    spans: &mut Vec<BlockSpan>,
    params: &PartitionParams,
    read_tail: F,
) -> Result<u32>
where
    F: FnOnce(usize) -> Result<Vec<ReadRecord>>,
{
    if params.size == 0 {
        return Err(PartitionError::ZeroBlockSize.into());
    }
    if spans.is_empty() {
        return Err(PartitionError::EmptyTable.into());
    }
    // Never drop the leading (0, 0) entry of a partitioned-but-empty store.
    if spans.len() > 1 {
        spans.pop();
    }
    let resume = *spans.last().expect("leading boundary entry");
    let tail = read_tail(resume.ufirst as usize)?;
    Ok(scan_from(&tail, resume, params, spans))
}

/// The core scan: walk `records` (store indices `resume.ufirst` onward),
/// accumulate included reads, and close a block whenever the base cap or the
/// read cap is reached. A trailing partial block with at least one included
/// read is closed at end of scan.
fn scan_from(
    records: &[ReadRecord],
    resume: BlockSpan,
    params: &PartitionParams,
    spans: &mut Vec<BlockSpan>,
) -> u32 {
    let mut totlen = 0u64;
    let mut ireads = 0usize;
    let mut tfirst = resume.tfirst;

    for (i, record) in records.iter().enumerate() {
        if !params.includes(record) {
            continue;
        }
        ireads += 1;
        tfirst += 1;
        totlen += record.len() as u64;
        if totlen >= params.size || ireads >= MAX_BLOCK_READS {
            spans.push(BlockSpan {
                ufirst: resume.ufirst + i as u32 + 1,
                tfirst,
            });
            totlen = 0;
            ireads = 0;
        }
    }

    if ireads > 0 {
        spans.push(BlockSpan {
            ufirst: resume.ufirst + records.len() as u32,
            tfirst,
        });
    }
    tfirst
}

/// Computes a full partition of the store and rewrites its catalog
///
/// This is the full-repartition entry point: legal on a store that was never
/// partitioned, or when the parameters are intentionally changed (any prior
/// block table is overwritten, which invalidates derivative files). The
/// incremental path used by ingestion is [`extend`].
pub fn partition<P: AsRef<Path>>(db: P, params: &PartitionParams) -> Result<PartitionSummary> {
    let paths = StorePaths::new(db)?;
    let mut catalog = Catalog::load(paths.stub())?;
    let mut index = IndexFile::open_rw(paths.index())?;
    let mut header = index.read_header()?;

    if catalog.total_reads() != header.ureads {
        return Err(StoreError::ReadCountMismatch {
            catalog: catalog.total_reads(),
            header: header.ureads,
        }
        .into());
    }

    let records = index.read_records_from(0)?;
    if records.len() != header.ureads as usize {
        return Err(StoreError::RecordCountMismatch {
            expected: header.ureads,
            found: records.len() as u32,
        }
        .into());
    }
    let (spans, treads) = plan(&records, params)?;
    let n_blocks = spans.len() - 1;

    catalog.partition = Some(Partition {
        size: params.size,
        cutoff: params.cutoff,
        all: params.all,
        spans,
    });
    header.cutoff = params.cutoff as i32;
    header.all = params.all;
    header.treads = treads;

    index.write_header(&header)?;
    catalog.save(&paths.stub(), &paths.staging())?;

    Ok(PartitionSummary { n_blocks, treads })
}
