//! Convert FASTQ to FASTA, dropping quality scores.

use super::RecordStats;
use crate::error::Result;
use crate::formats::{FastaFormat, FastqFormat, Format, RecordReader};
use log::info;
use std::io::{BufRead, Write};

/// FASTQ to FASTA command configuration.
#[derive(Debug, Clone, Default)]
pub struct FastqToFastaCommand {
    pub fasta: FastaFormat,
}

impl FastqToFastaCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the FASTA line width (0 disables wrapping).
    pub fn with_line_width(mut self, line_width: usize) -> Self {
        self.fasta = FastaFormat::with_line_width(line_width);
        self
    }

    pub fn run<R: BufRead, W: Write + ?Sized>(&self, input: R, output: &mut W) -> Result<RecordStats> {
        let mut reader = FastqFormat.reader(input);
        let mut stats = RecordStats::default();
        while let Some(record) = reader.read_record()? {
            stats.records_read += 1;
            self.fasta.write_record(&record.into_fasta(), output)?;
            stats.records_written += 1;
        }
        info!("fastq-to-fasta: {}", stats);
        Ok(stats)
    }
}
