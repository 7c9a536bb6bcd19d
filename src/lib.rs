//! # seqstore
//!
//! An append-only, partitioned binary store for nucleotide sequencing reads.
//!
//! A store keeps large collections of reads over the ACGT alphabet with
//! per-read metadata and optional annotation tracks. Sequences are packed at
//! 2 bits per base; metadata lives in a fixed-record binary index; a small
//! text catalog lists the ingested source files and, once the store has been
//! partitioned, the block boundary table that splits the reads into
//! bounded-size work units for downstream batch consumers.
//!
//! ## On-disk layout
//!
//! A store rooted at `path/reads` comprises:
//!
//! ```text
//! ┌──────────────────────┐
//! │ reads.db             │  text catalog: files, partition, block table
//! ├──────────────────────┤
//! │ .reads.idx           │  StoreHeader + one ReadRecord per read
//! ├──────────────────────┤
//! │ .reads.bps           │  packed 2-bit sequences, offsets authoritative
//! ├──────────────────────┤
//! │ .reads.qvs           │  compressed quality streams (optional)
//! ├──────────────────────┤
//! │ .reads.<track>.anno  │  per-read annotation tracks (optional)
//! │ .reads.<track>.data  │
//! └──────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use seqstore::{ingest, partition, Alphabet, PartitionParams, SeqStore};
//!
//! // append two source files, creating the store on first use
//! ingest("reads", &["movie_a.fasta", "movie_b.fasta"])?;
//!
//! // split the reads into ~200 Mbp blocks of best reads >= 1 kbp
//! partition(
//!     "reads",
//!     &PartitionParams { size: 200_000_000, cutoff: 1000, all: false },
//! )?;
//!
//! // read block 2 back
//! let mut store = SeqStore::open_block("reads", 2)?;
//! let mut buf = store.max_read_buffer();
//! for i in 0..store.n_reads() {
//!     store.load_read(i, &mut buf, Alphabet::Upper)?;
//! }
//! # Ok::<(), seqstore::Error>(())
//! ```
//!
//! ## Guarantees
//!
//! * Ingestion is atomic: on any error the store is left byte-identical to
//!   its pre-call state, offsets, header, and catalog included.
//! * Committed records and sequence bytes are immutable; the catalog is
//!   replaced by rename, so read-only consumers never observe a half-written
//!   store and need no coordination with the single writer.
//! * Partitioning is deterministic: re-planning unchanged data reproduces
//!   the boundary table bit for bit, and appending to a partitioned store
//!   extends the table without disturbing closed blocks.

mod catalog;
mod codec;
mod error;
mod header;
mod index;
mod ingest;
mod partition;
mod record;
mod store;
mod track;

pub use catalog::{BlockSpan, Catalog, CatalogFile, Partition, MAX_NAME};
pub use codec::{
    ascii_to_numeric, compressed_len, decode, decode_into, encode, encode_into, numeric_to_lower,
    numeric_to_upper, Alphabet,
};
pub use error::{
    CatalogError, CodecError, Error, IndexError, IngestError, PartitionError, Result, StoreError,
    TrackError,
};
pub use header::{StoreHeader, SIZE_STORE_HEADER};
pub use index::IndexFile;
pub use ingest::{ingest, IngestReport, WELL_GROUP_LIMIT};
pub use partition::{partition, PartitionParams, PartitionSummary, MAX_BLOCK_READS};
pub use record::{
    ReadRecord, FLAG_BEST, FLAG_CONTINUATION, MAX_READ_LEN, QV_MASK, SIZE_READ_RECORD,
};
pub use store::{SeqStore, StorePaths};
pub use track::{
    QualityTrack, QvScheme, Track, TrackData, TrackSet, QUALITY_TRACK_NAME, SIZE_TRACK_HEADER,
};

#[cfg(test)]
pub(crate) mod test_util {
    use std::path::PathBuf;

    /// A fresh per-test scratch directory under the system temp dir
    pub fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("seqstore-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("creating scratch dir");
        dir
    }
}
