/// Custom Result type for seqstore operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the seqstore library, encompassing all possible error
/// cases that can occur while building, extending, or reading a sequence store.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Errors from the 2-bit sequence codec
    CodecError(#[from] CodecError),
    /// Errors from parsing or rewriting the text catalog
    CatalogError(#[from] CatalogError),
    /// Errors from the binary read index
    IndexError(#[from] IndexError),
    /// Errors raised while ingesting source files
    IngestError(#[from] IngestError),
    /// Errors from the block partition planner
    PartitionError(#[from] PartitionError),
    /// Errors from annotation tracks
    TrackError(#[from] TrackError),
    /// Store-level consistency errors
    StoreError(#[from] StoreError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
    /// UTF-8 encoding/decoding errors
    Utf8Error(#[from] std::str::Utf8Error),
    /// Generic errors that can occur in any part of the system
    AnyhowError(#[from] anyhow::Error),
}

/// Errors from packing, unpacking, or re-alphabeting sequences
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// A numeric sequence contained a symbol outside {0,1,2,3}
    ///
    /// # Arguments
    /// * `u8` - The invalid symbol that was found
    #[error("Invalid symbol in numeric sequence: {0}")]
    InvalidSymbol(u8),

    /// A textual sequence contained a byte that is not one of ACGT/acgt
    ///
    /// # Arguments
    /// * `u8` - The invalid byte that was found
    #[error("Invalid base in sequence: {:?}", *.0 as char)]
    InvalidBase(u8),

    /// The packed buffer is too short for the requested symbol count
    ///
    /// # Arguments
    /// * First `usize` - The number of bytes provided
    /// * Second `usize` - The number of bytes required
    #[error("Packed buffer holds {0} bytes but {1} are required")]
    TruncatedInput(usize, usize),
}

/// Errors specific to the binary index file (header and read records)
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// The magic number in the index header does not match the expected value
    ///
    /// # Arguments
    /// * `u32` - The invalid magic number that was found
    #[error("Invalid magic number: {0}")]
    InvalidMagicNumber(u32),

    /// The format version in the index header is not supported
    ///
    /// # Arguments
    /// * `u8` - The unsupported version number that was found
    #[error("Invalid format version: {0}")]
    InvalidFormatVersion(u8),

    /// The reserved bytes in the index header contain unexpected values
    #[error("Invalid reserved bytes")]
    InvalidReservedBytes,

    /// The size of the data does not match what was expected
    ///
    /// # Arguments
    /// * First `usize` - The actual number of bytes provided
    /// * Second `usize` - The expected number of bytes
    #[error("Invalid number of bytes provided: {0}. Expected: {1}")]
    InvalidSize(usize, usize),

    /// The index file length is not a whole number of records past the header
    ///
    /// # Arguments
    /// * `u64` - The offending file length in bytes
    #[error("Index file length ({0} bytes) is not record aligned - possibly truncated")]
    Misaligned(u64),

    /// Attempted to access a record index beyond the available range
    #[error("Requested record index ({requested_index}) is out of record range ({max_index})")]
    OutOfRange {
        requested_index: usize,
        max_index: usize,
    },
}

/// Errors from parsing or validating the text catalog ("stub" file)
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// The leading `files = <N>` line is missing or malformed
    #[error("Catalog line {0}: expected 'files = <count>'")]
    BadFileCount(usize),

    /// A per-file line did not hold the (count, name, prolog) triple
    #[error("Catalog line {0}: expected '<count> <name> <prolog>'")]
    BadFileLine(usize),

    /// The `blocks = <M>` line is malformed
    #[error("Catalog line {0}: expected 'blocks = <count>'")]
    BadBlockCount(usize),

    /// A partition section is present but its parameter line is missing or malformed
    #[error("Catalog line {0}: expected 'size = <bases> cutoff = <len> all = <0|1>'")]
    MissingPartitionParams(usize),

    /// A block boundary line did not hold the (untrimmed, trimmed) index pair
    #[error("Catalog line {0}: expected '<untrimmed index> <trimmed index>'")]
    BadBlockLine(usize),

    /// The catalog held fewer per-file or boundary lines than it declared
    #[error("Catalog ended early: expected {expected} entries, found {found}")]
    TruncatedCatalog { expected: usize, found: usize },

    /// Content remained after the last expected catalog line
    #[error("Catalog line {0}: unexpected trailing content")]
    TrailingContent(usize),

    /// Cumulative read counts must be non-decreasing across file entries
    #[error("Catalog line {0}: cumulative read count decreases")]
    NonMonotonicCount(usize),
}

/// Errors raised while ingesting source sequence files
///
/// Every variant identifies the offending file (and line where one exists) so
/// a caller can fix the input and re-invoke; the store itself is rolled back.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    /// The first line of a source file is not a header line
    #[error("File {file}, Line 1: First header in input file is missing")]
    MissingHeader { file: String },

    /// An input line exceeded the maximum permitted length
    #[error("File {file}, Line {line}: Input line is too long (> {max} chars)")]
    LineTooLong { file: String, line: usize, max: usize },

    /// A read header did not match `>prolog/well/beg_end [RQ=0.qv]`
    #[error("File {file}, Line {line}: Header line format error")]
    BadHeader { file: String, line: usize },

    /// A read header named a different prolog than the file's first header
    #[error("File {file}, Line {line}: Header line name inconsistent")]
    PrologMismatch { file: String, line: usize },

    /// The source file is already listed in the catalog
    #[error("File {file} is already in the database")]
    DuplicateFile { file: String },

    /// The source file name exceeds the maximum name length
    #[error("File name over {max} chars: '{file}'")]
    NameTooLong { file: String, max: usize },

    /// The source file name cannot be stored in the catalog
    #[error("File name cannot contain whitespace: '{file}'")]
    NameInvalid { file: String },

    /// A sequence line contained a byte that is not one of ACGT/acgt
    #[error("File {file}, Line {line}: Invalid base {:?} in sequence", *.base as char)]
    InvalidBase { file: String, line: usize, base: u8 },

    /// A read exceeded the 16-bit length cap
    #[error("File {file}, Line {line}: Read length {len} exceeds the 65535 cap")]
    ReadTooLong { file: String, line: usize, len: usize },

    /// A read's sequence length did not match its header trim interval
    #[error(
        "File {file}, Line {line}: Sequence length ({seq}) does not match header interval ({interval})"
    )]
    LengthMismatch {
        file: String,
        line: usize,
        seq: usize,
        interval: usize,
    },
}

/// Errors from the block partition planner
#[derive(thiserror::Error, Debug)]
pub enum PartitionError {
    /// The block size cap must be positive
    #[error("Block size cap must be positive")]
    ZeroBlockSize,

    /// The boundary table lost its leading (0, 0) entry
    #[error("Partition boundary table is empty")]
    EmptyTable,
}

/// Errors from loading or validating annotation tracks
#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    /// Normal track names cannot begin with a '.'
    #[error("Track name is reserved: '{0}'")]
    ReservedName(String),

    /// The track was loaded against a different view of the store
    ///
    /// The first parameter is the read count the track was loaded for, the
    /// second is the read count of the current view.
    #[error("Track is stale: loaded for {0} reads but the active view holds {1}")]
    Stale(usize, usize),

    /// The magic number in the track file does not match the expected value
    #[error("Invalid track magic number: {0}")]
    InvalidMagicNumber(u32),

    /// The track kind tag in the track file is unknown
    #[error("Invalid track kind: {0}")]
    InvalidKind(u8),

    /// The annotation array does not hold nreads+1 entries
    #[error("Track annotation holds {0} entries but {1} were expected")]
    BadAnnotationCount(usize, usize),

    /// The named track is not loaded or its file does not exist
    #[error("No such track: '{0}'")]
    NoSuchTrack(String),

    /// Requested a payload for a read index beyond the annotation range
    #[error("Requested read index ({requested_index}) is out of track range ({max_index})")]
    OutOfRange {
        requested_index: usize,
        max_index: usize,
    },
}

/// Store-level consistency errors
///
/// These indicate disagreement between the catalog, the index header, and the
/// partition table. They are fatal: the store is never silently repaired.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The catalog's cumulative read count disagrees with the index header
    #[error("Catalog lists {catalog} reads but the index header holds {header}")]
    ReadCountMismatch { catalog: u32, header: u32 },

    /// The index record array disagrees with the header's read count
    #[error("Index holds {found} records but the header expects {expected}")]
    RecordCountMismatch { expected: u32, found: u32 },

    /// The header says the store is partitioned but the catalog has no block table
    #[error("Index header expects a partition but the catalog has none")]
    MissingPartition,

    /// The catalog carries a block table but the header was never partitioned
    #[error("Catalog carries a partition but the index header has none")]
    UnexpectedPartition,

    /// Requested a block id outside the partition table
    #[error("Requested block {requested} of a store with {nblocks} blocks")]
    InvalidBlock { requested: usize, nblocks: usize },

    /// The requested operation needs partition parameters that were never set
    #[error("Store has not been partitioned")]
    NotPartitioned,

    /// The active view was already trimmed
    #[error("Store view is already trimmed")]
    AlreadyTrimmed,

    /// A block's trimmed read count disagrees with the partition table
    #[error("Block {part}: trimmed view holds {found} reads but the partition table expects {expected}")]
    TrimCountMismatch {
        part: usize,
        found: usize,
        expected: usize,
    },
}
