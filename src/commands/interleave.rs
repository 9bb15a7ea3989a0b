//! Interleave paired FASTQ files into one stream.

use super::RecordStats;
use crate::error::{Error, Result};
use crate::formats::{FastqFormat, Format, RecordReader};
use log::info;
use std::io::{BufRead, Write};

/// Interleave command.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterleaveCommand;

impl InterleaveCommand {
    pub fn new() -> Self {
        Self
    }

    /// Write first and second reads alternately. Both inputs must hold the
    /// same number of reads.
    pub fn run<R1: BufRead, R2: BufRead, W: Write + ?Sized>(
        &self,
        first: R1,
        second: R2,
        output: &mut W,
    ) -> Result<RecordStats> {
        let mut first = FastqFormat.reader(first);
        let mut second = FastqFormat.reader(second);
        let mut stats = RecordStats::default();

        loop {
            match (first.read_record()?, second.read_record()?) {
                (Some(a), Some(b)) => {
                    stats.records_read += 2;
                    FastqFormat.write_record(&a, output)?;
                    FastqFormat.write_record(&b, output)?;
                    stats.records_written += 2;
                }
                (None, None) => {
                    info!("interleave-fastq: {}", stats);
                    return Ok(stats);
                }
                (Some(_), None) | (None, Some(_)) => {
                    return Err(Error::InvalidFormat(format!(
                        "Paired inputs have different numbers of reads (mismatch after {} pairs)",
                        stats.records_written / 2
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave() {
        let first = "@a/1\nAC\n+\nII\n@b/1\nGG\n+\nII\n";
        let second = "@a/2\nTT\n+\nII\n@b/2\nCC\n+\nII\n";
        let mut out = Vec::new();
        let stats = InterleaveCommand::new()
            .run(first.as_bytes(), second.as_bytes(), &mut out)
            .unwrap();

        assert_eq!(stats.records_written, 4);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "@a/1\nAC\n+\nII\n@a/2\nTT\n+\nII\n@b/1\nGG\n+\nII\n@b/2\nCC\n+\nII\n"
        );
    }

    #[test]
    fn test_mismatched_counts_fail() {
        let first = "@a/1\nAC\n+\nII\n@b/1\nGG\n+\nII\n";
        let second = "@a/2\nTT\n+\nII\n";
        let mut out = Vec::new();
        let result = InterleaveCommand::new().run(first.as_bytes(), second.as_bytes(), &mut out);
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
    }
}
