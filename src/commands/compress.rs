//! Compress command: re-write records unchanged.
//!
//! The codec comes from the output stream, so this both compresses and
//! decompresses depending on the input and output file names.

use super::RecordStats;
use crate::error::Result;
use crate::formats::{Format, RecordReader};
use log::info;
use std::io::{BufRead, Write};

/// Compress command configuration.
#[derive(Debug, Clone, Default)]
pub struct CompressCommand<F: Format> {
    pub format: F,
}

impl<F: Format> CompressCommand<F> {
    pub fn new(format: F) -> Self {
        Self { format }
    }

    /// Copy header and records from `input` to `output`.
    pub fn run<R: BufRead, W: Write + ?Sized>(&self, input: R, output: &mut W) -> Result<RecordStats> {
        let mut reader = self.format.reader(input);
        self.format.write_header(reader.header()?, output)?;

        let mut stats = RecordStats::default();
        while let Some(record) = reader.read_record()? {
            stats.records_read += 1;
            self.format.write_record(&record, output)?;
            stats.records_written += 1;
        }

        info!("compress-{}: {}", F::NAME.to_ascii_lowercase(), stats);
        Ok(stats)
    }
}
