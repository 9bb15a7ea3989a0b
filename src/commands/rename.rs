//! Rename references command: switch between `chr1` and `1` naming.

use super::RecordStats;
use crate::error::Result;
use crate::formats::{RecordReader, RenameReferences};
use crate::rename::ReferenceRenamer;
use log::info;
use std::io::{BufRead, Write};

/// Rename references command configuration.
pub struct RenameReferencesCommand<F: RenameReferences> {
    pub format: F,
    pub renamer: ReferenceRenamer,
}

impl<F: RenameReferences> RenameReferencesCommand<F> {
    /// `add_chr` adds the `chr` prefix; otherwise it is removed.
    pub fn new(format: F, add_chr: bool) -> Result<Self> {
        Ok(Self {
            format,
            renamer: ReferenceRenamer::new(add_chr)?,
        })
    }

    /// Rename references in header lines and records.
    pub fn run<R: BufRead, W: Write + ?Sized>(&self, input: R, output: &mut W) -> Result<RecordStats> {
        let mut reader = self.format.reader(input);
        let header: Vec<String> = reader
            .header()?
            .iter()
            .map(|line| self.format.rename_header_line(line, &self.renamer))
            .collect();
        self.format.write_header(&header, output)?;

        let mut stats = RecordStats::default();
        while let Some(mut record) = reader.read_record()? {
            stats.records_read += 1;
            self.format.rename_record(&mut record, &self.renamer);
            self.format.write_record(&record, output)?;
            stats.records_written += 1;
        }

        info!(
            "rename-{}-references ({}): {}",
            F::NAME.to_ascii_lowercase(),
            if self.renamer.adds_chr() { "add chr" } else { "remove chr" },
            stats
        );
        Ok(stats)
    }
}
