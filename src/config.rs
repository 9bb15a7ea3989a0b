//! Defaults shared by the tools.
//!
//! Buffer sizes control memory usage vs I/O throughput. Every tool streams
//! one record at a time, so these buffers dominate the resident footprint.

/// Default output buffer size (256 KB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 256 * 1024;

/// Default input buffer size (256 KB).
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Default line buffer capacity (1 KB).
/// Sufficient for most tab-delimited lines.
pub const DEFAULT_LINE_BUFFER: usize = 1024;

/// Number of leading bytes inspected when sniffing a compression codec.
/// A BGZF header is recognisable within the first 14 bytes.
pub const SNIFF_LENGTH: usize = 18;

/// Default FASTA sequence line width.
pub const DEFAULT_LINE_WIDTH: usize = 70;

/// Default Parquet row group size, in rows.
pub const DEFAULT_ROW_GROUP_SIZE: usize = 122_880;

/// Default prefix for split output files when reading standard input.
pub const DEFAULT_SPLIT_PREFIX: &str = "x";

/// Map the repeatable `-v` flag to a log level filter.
///
/// Zero keeps the `warn` default, one enables `info`, two or more `debug`.
pub fn log_level(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0), log::LevelFilter::Warn);
        assert_eq!(log_level(1), log::LevelFilter::Info);
        assert_eq!(log_level(5), log::LevelFilter::Debug);
    }
}
