//! Split interleaved FASTQ into first and second reads.
//!
//! Consecutive records form a pair when their names agree once a trailing
//! `/1` or `/2` is removed. Records without a mate go to the unpaired
//! output when one is given and are dropped otherwise.

use crate::error::Result;
use crate::formats::{FastqFormat, FastqRecord, Format, RecordReader};
use log::{info, warn};
use std::fmt;
use std::io::{BufRead, Write};

/// Disinterleave command.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisinterleaveCommand;

/// Disinterleave statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisinterleaveStats {
    pub pairs: u64,
    pub unpaired: u64,
    pub dropped: u64,
}

impl fmt::Display for DisinterleaveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pairs: {}, Unpaired: {}, Dropped: {}",
            self.pairs, self.unpaired, self.dropped
        )
    }
}

/// Read name without a `/1` or `/2` mate suffix.
pub fn pair_name(name: &str) -> &str {
    name.strip_suffix("/1")
        .or_else(|| name.strip_suffix("/2"))
        .unwrap_or(name)
}

impl DisinterleaveCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn run<R, W1, W2, W3>(
        &self,
        input: R,
        first: &mut W1,
        second: &mut W2,
        mut unpaired: Option<&mut W3>,
    ) -> Result<DisinterleaveStats>
    where
        R: BufRead,
        W1: Write + ?Sized,
        W2: Write + ?Sized,
        W3: Write + ?Sized,
    {
        let mut reader = FastqFormat.reader(input);
        let mut stats = DisinterleaveStats::default();
        let mut pending: Option<FastqRecord> = None;

        loop {
            let current = match pending.take() {
                Some(record) => record,
                None => match reader.read_record()? {
                    Some(record) => record,
                    None => break,
                },
            };
            match reader.read_record()? {
                Some(mate) if pair_name(&mate.name) == pair_name(&current.name) => {
                    FastqFormat.write_record(&current, first)?;
                    FastqFormat.write_record(&mate, second)?;
                    stats.pairs += 1;
                }
                next => {
                    match unpaired.as_deref_mut() {
                        Some(out) => {
                            FastqFormat.write_record(&current, out)?;
                            stats.unpaired += 1;
                        }
                        None => {
                            warn!("Dropping unpaired read {}", current.name);
                            stats.dropped += 1;
                        }
                    }
                    match next {
                        Some(next) => pending = Some(next),
                        None => break,
                    }
                }
            }
        }

        info!("disinterleave-fastq: {}", stats);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERLEAVED: &str = "@a/1\nAC\n+\nII\n@a/2\nTT\n+\nII\n\
@orphan\nNN\n+\nII\n\
@b 1:N\nGG\n+\nII\n@b 2:N\nCC\n+\nII\n\
@tail/1\nAA\n+\nII\n";

    #[test]
    fn test_pair_name() {
        assert_eq!(pair_name("read/1"), "read");
        assert_eq!(pair_name("read/2"), "read");
        assert_eq!(pair_name("read"), "read");
        assert_eq!(pair_name("read/3"), "read/3");
    }

    #[test]
    fn test_disinterleave_with_unpaired_output() {
        let (mut first, mut second, mut unpaired) = (Vec::new(), Vec::new(), Vec::new());
        let stats = DisinterleaveCommand::new()
            .run(INTERLEAVED.as_bytes(), &mut first, &mut second, Some(&mut unpaired))
            .unwrap();

        assert_eq!(
            stats,
            DisinterleaveStats {
                pairs: 2,
                unpaired: 2,
                dropped: 0
            }
        );
        assert_eq!(String::from_utf8(first).unwrap(), "@a/1\nAC\n+\nII\n@b 1:N\nGG\n+\nII\n");
        assert_eq!(String::from_utf8(second).unwrap(), "@a/2\nTT\n+\nII\n@b 2:N\nCC\n+\nII\n");
        assert_eq!(
            String::from_utf8(unpaired).unwrap(),
            "@orphan\nNN\n+\nII\n@tail/1\nAA\n+\nII\n"
        );
    }

    #[test]
    fn test_disinterleave_drops_unpaired() {
        let (mut first, mut second) = (Vec::new(), Vec::new());
        let stats = DisinterleaveCommand::new()
            .run(INTERLEAVED.as_bytes(), &mut first, &mut second, None::<&mut Vec<u8>>)
            .unwrap();
        assert_eq!(stats.pairs, 2);
        assert_eq!(stats.dropped, 2);
    }
}
