//! Genomic intervals and region strings used by range filters.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A genomic interval with reference name, start and end positions.
/// Uses 0-based, half-open coordinates (BED style).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    /// Create a new interval.
    #[inline]
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Returns the length of the interval.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the interval has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this interval overlaps the span `[start, end)` on `chrom`.
    ///
    /// Zero-length spans are widened to one base so that insertions and
    /// point features still intersect the region they sit in.
    #[inline]
    pub fn overlaps(&self, chrom: &str, start: u64, end: u64) -> bool {
        let end = end.max(start.saturating_add(1));
        self.chrom == chrom && self.start < end && start < self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.end == u64::MAX {
            write!(f, "{}:{}-", self.chrom, self.start + 1)
        } else {
            write!(f, "{}:{}-{}", self.chrom, self.start + 1, self.end)
        }
    }
}

/// Parses samtools-style region strings.
///
/// Accepts `chrom`, `chrom:start` and `chrom:start-end`, with 1-based
/// inclusive coordinates and optional thousands separators. Reference names
/// containing `:` are written in braces, as in `{HLA-A*01:01}:1-100`.
impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (chrom, range) = match s.strip_prefix('{') {
            Some(quoted) => {
                let (chrom, rest) = quoted.split_once('}').ok_or_else(|| {
                    Error::argument(format!("Invalid region '{}': unclosed '{{'", s))
                })?;
                match rest {
                    "" => (chrom, None),
                    _ => match rest.strip_prefix(':') {
                        Some(range) => (chrom, Some(range)),
                        None => {
                            return Err(Error::argument(format!(
                                "Invalid region '{}': expected ':' after '}}'",
                                s
                            )))
                        }
                    },
                }
            }
            None => match s.rfind(':') {
                Some(colon) => (&s[..colon], Some(&s[colon + 1..])),
                None => (s, None),
            },
        };
        if chrom.is_empty() {
            return Err(Error::argument(format!("Invalid region '{}': missing reference name", s)));
        }

        let (start, end) = match range {
            None => (0, u64::MAX),
            Some(range) => {
                let (start, end) = match range.split_once('-') {
                    Some((start, end)) => (start, Some(end)),
                    None => (range, None),
                };
                let start = parse_position(start, s)?;
                if start == 0 {
                    return Err(Error::argument(format!(
                        "Invalid region '{}': positions are 1-based",
                        s
                    )));
                }
                let end = match end {
                    Some(end) if !end.is_empty() => parse_position(end, s)?,
                    _ => u64::MAX,
                };
                if end < start {
                    return Err(Error::argument(format!(
                        "Invalid region '{}': end before start",
                        s
                    )));
                }
                (start - 1, end)
            }
        };

        Ok(Interval::new(chrom, start, end))
    }
}

fn parse_position(value: &str, region: &str) -> Result<u64> {
    value
        .replace(',', "")
        .parse()
        .map_err(|_| Error::argument(format!("Invalid region '{}': bad position '{}'", region, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_region() {
        let region: Interval = "chr1:100-200".parse().unwrap();
        assert_eq!(region, Interval::new("chr1", 99, 200));
        assert_eq!(region.len(), 101);
        assert_eq!(region.to_string(), "chr1:100-200");
    }

    #[test]
    fn test_parse_whole_reference() {
        let region: Interval = "chrX".parse().unwrap();
        assert_eq!(region.start, 0);
        assert_eq!(region.end, u64::MAX);
    }

    #[test]
    fn test_parse_open_ended_and_separators() {
        let region: Interval = "2:1,000".parse().unwrap();
        assert_eq!(region, Interval::new("2", 999, u64::MAX));
        assert_eq!(region.to_string(), "2:1000-");
    }

    #[test]
    fn test_parse_braced_reference_names() {
        let region: Interval = "{HLA-A*01:01:01:01}".parse().unwrap();
        assert_eq!(region, Interval::new("HLA-A*01:01:01:01", 0, u64::MAX));

        let region: Interval = "{HLA-A*01:01}:5-10".parse().unwrap();
        assert_eq!(region, Interval::new("HLA-A*01:01", 4, 10));

        assert!("{HLA-A*01:01".parse::<Interval>().is_err());
        assert!("{HLA}5-10".parse::<Interval>().is_err());
        assert!("{}:1-2".parse::<Interval>().is_err());
    }

    #[test]
    fn test_parse_invalid_regions() {
        assert!("".parse::<Interval>().is_err());
        assert!(":1-2".parse::<Interval>().is_err());
        assert!("chr1:0-10".parse::<Interval>().is_err());
        assert!("chr1:20-10".parse::<Interval>().is_err());
        assert!("chr1:a-b".parse::<Interval>().unwrap_err().is_argument());
    }

    #[test]
    fn test_overlaps() {
        let region = Interval::new("chr1", 100, 200);
        assert!(region.overlaps("chr1", 150, 250));
        assert!(!region.overlaps("chr1", 200, 300)); // Adjacent, not overlapping
        assert!(!region.overlaps("chr2", 150, 250)); // Different reference
        assert!(region.overlaps("chr1", 120, 120)); // Zero-length widened
        assert!(!region.overlaps("chr1", 200, 200));
    }

    #[test]
    fn test_empty() {
        assert!(Interval::new("chr1", 5, 5).is_empty());
        assert!(!Interval::new("chr1", 5, 6).is_empty());
    }
}
