//! Filter command: keep records accepted by every configured filter.

use super::RecordStats;
use crate::error::Result;
use crate::filter::{Filter, FilterChain};
use crate::formats::{Format, RecordReader};
use log::{debug, info};
use std::io::{BufRead, Write};

/// Filter command configuration.
pub struct FilterCommand<F: Format> {
    pub format: F,
    pub filters: FilterChain<F::Record>,
}

impl<F: Format> FilterCommand<F> {
    pub fn new(format: F) -> Self {
        Self {
            format,
            filters: FilterChain::new(),
        }
    }

    /// Append a filter; filters run in the order they were added.
    pub fn with_filter(mut self, filter: impl Filter<F::Record> + 'static) -> Self
    where
        F::Record: 'static,
    {
        self.filters.push(filter);
        self
    }

    /// Replace the filter chain.
    pub fn with_filters(mut self, filters: FilterChain<F::Record>) -> Self {
        self.filters = filters;
        self
    }

    /// Stream records from `input` to `output`, dropping rejected records.
    /// The header is always written.
    pub fn run<R: BufRead, W: Write + ?Sized>(&self, input: R, output: &mut W) -> Result<RecordStats> {
        if self.filters.is_empty() {
            debug!("No {} filters configured, all records pass", F::NAME);
        } else {
            debug!("{} filters: {}", F::NAME, self.filters.names().join(", "));
        }

        let mut reader = self.format.reader(input);
        self.format.write_header(reader.header()?, output)?;

        let mut stats = RecordStats::default();
        while let Some(record) = reader.read_record()? {
            stats.records_read += 1;
            if self.filters.accept(&record)? {
                self.format.write_record(&record, output)?;
                stats.records_written += 1;
            }
        }

        info!("filter-{}: {}", F::NAME.to_ascii_lowercase(), stats);
        Ok(stats)
    }
}
