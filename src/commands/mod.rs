//! Command implementations for bioshed.
//!
//! Commands are generic over [`Format`](crate::formats::Format) where the
//! same operation applies to several formats, so `compress-vcf` and
//! `compress-sam` share one implementation.

pub mod compress;
pub mod disinterleave;
pub mod fasta_to_parquet;
pub mod fastq_to_fasta;
pub mod filter;
pub mod interleave;
pub mod rename;
pub mod segments_to_fasta;
pub mod split;

pub use compress::CompressCommand;
pub use disinterleave::{DisinterleaveCommand, DisinterleaveStats};
pub use fasta_to_parquet::{Alphabet, FastaToParquetCommand, FastaToParquetConfig, ParquetStats};
pub use fastq_to_fasta::FastqToFastaCommand;
pub use filter::FilterCommand;
pub use interleave::InterleaveCommand;
pub use rename::RenameReferencesCommand;
pub use segments_to_fasta::SegmentsToFastaCommand;
pub use split::{SplitCommand, SplitStats};

use std::fmt;

/// Records read and written by a streaming command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordStats {
    pub records_read: u64,
    pub records_written: u64,
}

impl RecordStats {
    /// Records that were read but not written.
    pub fn records_dropped(&self) -> u64 {
        self.records_read.saturating_sub(self.records_written)
    }
}

impl fmt::Display for RecordStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Read: {}, Written: {}, Dropped: {}",
            self.records_read,
            self.records_written,
            self.records_dropped()
        )
    }
}
