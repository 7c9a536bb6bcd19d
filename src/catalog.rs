//! Text catalog ("stub" file)
//!
//! The catalog is the human-readable manifest of a store: one line per
//! ingested source file carrying the cumulative read count, the file's name,
//! and its header prolog, followed (once a partition exists) by the
//! partition parameters and the block boundary table. It is the only store
//! file a user is expected to look at, and the only one that is ever
//! rewritten: every rewrite goes through a staging file that atomically
//! replaces the live catalog, so a concurrent reader never observes a
//! half-written manifest.
//!
//! ```text
//! files =         2
//!        847 movie_a m54119_170201
//!       1792 movie_b m54119_170202
//! blocks =         3
//! size = 200000000 cutoff =      1000 all = 0
//!          0         0
//!        601       512
//!       1204      1027
//!       1792      1489
//! ```

use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;

use crate::error::{CatalogError, Result};

/// Longest permitted file name or input header line
pub const MAX_NAME: usize = 10000;

/// One catalog entry per ingested source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFile {
    /// Cumulative read count: the index of this file's last read, plus one
    pub nreads: u32,
    /// Source file name (root, without directory or extension)
    pub name: String,
    /// Header prolog shared by every read in the file
    pub prolog: String,
}

/// One block boundary: the first read of the next block in both numberings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockSpan {
    /// First read index, untrimmed numbering
    pub ufirst: u32,
    /// First read index, trimmed numbering
    pub tfirst: u32,
}

/// The partition section of a catalog
///
/// `spans` holds `n_blocks + 1` boundary entries: a leading `(0, 0)` and one
/// entry per closed block, the final entry being the sentinel equal to the
/// store totals. Block `k` (1-based) covers untrimmed reads
/// `spans[k-1].ufirst .. spans[k].ufirst`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Block size cap in total bases
    pub size: u64,
    /// Minimum read length for a read to enter a block
    pub cutoff: u32,
    /// Whether non-best reads of a well enter blocks
    pub all: bool,
    /// Boundary table, leading `(0, 0)` included
    pub spans: Vec<BlockSpan>,
}

impl Partition {
    /// Number of blocks described by the boundary table
    #[must_use]
    pub fn n_blocks(&self) -> usize {
        self.spans.len().saturating_sub(1)
    }
}

/// In-memory image of a catalog file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Ingested source files, in ingestion order
    pub files: Vec<CatalogFile>,
    /// Partition section, present once the store has been partitioned
    pub partition: Option<Partition>,
}

impl Catalog {
    /// Total number of reads recorded by the file list
    #[must_use]
    pub fn total_reads(&self) -> u32 {
        self.files.last().map_or(0, |f| f.nreads)
    }

    /// Whether a source file of this name was already ingested
    #[must_use]
    pub fn contains_file(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }

    /// Loads and parses the catalog at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses a catalog from its text form
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().enumerate();

        let nfiles = {
            let (lineno, line) = lines.next().ok_or(CatalogError::BadFileCount(1))?;
            parse_labeled(line, "files").ok_or(CatalogError::BadFileCount(lineno + 1))?
        };

        let mut files = Vec::with_capacity(nfiles);
        for _ in 0..nfiles {
            let (lineno, line) = lines.next().ok_or(CatalogError::TruncatedCatalog {
                expected: nfiles,
                found: files.len(),
            })?;
            let mut tokens = line.split_whitespace();
            let entry = match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
                (Some(count), Some(name), Some(prolog), None) => CatalogFile {
                    nreads: count
                        .parse()
                        .map_err(|_| CatalogError::BadFileLine(lineno + 1))?,
                    name: name.to_string(),
                    prolog: prolog.to_string(),
                },
                _ => return Err(CatalogError::BadFileLine(lineno + 1).into()),
            };
            if files.last().is_some_and(|prev: &CatalogFile| prev.nreads > entry.nreads) {
                return Err(CatalogError::NonMonotonicCount(lineno + 1).into());
            }
            files.push(entry);
        }

        let partition = match lines.next() {
            None => None,
            Some((lineno, line)) => {
                let nblocks: usize =
                    parse_labeled(line, "blocks").ok_or(CatalogError::BadBlockCount(lineno + 1))?;
                let (params_lineno, params_line) =
                    lines
                        .next()
                        .ok_or(CatalogError::MissingPartitionParams(lineno + 2))?;
                let (size, cutoff, all) = parse_params(params_line)
                    .ok_or(CatalogError::MissingPartitionParams(params_lineno + 1))?;

                let mut spans = Vec::with_capacity(nblocks + 1);
                for _ in 0..=nblocks {
                    let (span_lineno, span_line) =
                        lines.next().ok_or(CatalogError::TruncatedCatalog {
                            expected: nblocks + 1,
                            found: spans.len(),
                        })?;
                    let mut tokens = span_line.split_whitespace();
                    match (tokens.next(), tokens.next(), tokens.next()) {
                        (Some(ufirst), Some(tfirst), None) => spans.push(BlockSpan {
                            ufirst: ufirst
                                .parse()
                                .map_err(|_| CatalogError::BadBlockLine(span_lineno + 1))?,
                            tfirst: tfirst
                                .parse()
                                .map_err(|_| CatalogError::BadBlockLine(span_lineno + 1))?,
                        }),
                        _ => return Err(CatalogError::BadBlockLine(span_lineno + 1).into()),
                    }
                }
                Some(Partition {
                    size,
                    cutoff,
                    all,
                    spans,
                })
            }
        };

        if let Some((lineno, _)) = lines.find(|(_, l)| !l.trim().is_empty()) {
            return Err(CatalogError::TrailingContent(lineno + 1).into());
        }

        Ok(Self { files, partition })
    }

    /// Renders the catalog into its text form
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "files = {:9}", self.files.len());
        for file in &self.files {
            let _ = writeln!(out, "  {:9} {} {}", file.nreads, file.name, file.prolog);
        }
        if let Some(partition) = &self.partition {
            let _ = writeln!(out, "blocks = {:9}", partition.n_blocks());
            let _ = writeln!(
                out,
                "size = {:9} cutoff = {:9} all = {}",
                partition.size,
                partition.cutoff,
                u8::from(partition.all)
            );
            for span in &partition.spans {
                let _ = writeln!(out, " {:9} {:9}", span.ufirst, span.tfirst);
            }
        }
        out
    }

    /// Atomically replaces the live catalog
    ///
    /// The full text is written to `staging` and then renamed over `live`,
    /// so a reader observes either the prior or the new manifest, never a
    /// partial one.
    pub fn save(&self, live: &Path, staging: &Path) -> Result<()> {
        fs::write(staging, self.render())?;
        if let Err(err) = fs::rename(staging, live) {
            let _ = fs::remove_file(staging);
            return Err(err.into());
        }
        Ok(())
    }
}

/// Parses `<label> = <value>` where value is a right-aligned integer
fn parse_labeled<T: std::str::FromStr>(line: &str, label: &str) -> Option<T> {
    let rest = line.strip_prefix(label)?.trim_start().strip_prefix('=')?;
    rest.trim().parse().ok()
}

/// Parses `size = <bases> cutoff = <len> all = <0|1>`
fn parse_params(line: &str) -> Option<(u64, u32, bool)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["size", "=", size, "cutoff", "=", cutoff, "all", "=", all] => {
            let all = match *all {
                "0" => false,
                "1" => true,
                _ => return None,
            };
            Some((size.parse().ok()?, cutoff.parse().ok()?, all))
        }
        _ => None,
    }
}
