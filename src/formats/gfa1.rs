//! GFA1 graphs. Segment lines are parsed; every other line is carried
//! through untouched.

use super::fasta::FastaRecord;
use super::{split_fields, Format, LineParser, LineReader, SegmentSequences};
use crate::expr::{Fields, Value};
use crate::filter::{Filter, MissingField, ProjectedFilter, ThresholdFilter};
use std::io::{self, BufRead, Write};

/// An `S` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gfa1Segment {
    pub name: String,
    /// Sequence, or `*` when not stored.
    pub sequence: String,
    /// Optional `TAG:TYPE:VALUE` fields.
    pub tags: Vec<String>,
}

impl Gfa1Segment {
    /// Segment length from the sequence, else from the `LN:i` tag.
    pub fn length(&self) -> Option<u64> {
        if self.sequence != "*" {
            return Some(self.sequence.len() as u64);
        }
        self.tags
            .iter()
            .find_map(|tag| tag.strip_prefix("LN:i:"))
            .and_then(|value| value.parse().ok())
    }
}

impl Fields for Gfa1Segment {
    fn field(&self, name: &str) -> Option<Value> {
        Some(match name {
            "name" => Value::text(&self.name),
            "sequence" => Value::text(&self.sequence),
            "length" => self
                .length()
                .map_or(Value::Missing, |len| Value::Number(len as f64)),
            _ => return None,
        })
    }
}

/// One GFA1 line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gfa1Record {
    Segment(Gfa1Segment),
    /// Header, link, containment, path, walk, comment or unknown lines.
    Other(String),
}

impl Gfa1Record {
    pub fn as_segment(&self) -> Option<&Gfa1Segment> {
        match self {
            Gfa1Record::Segment(segment) => Some(segment),
            Gfa1Record::Other(_) => None,
        }
    }
}

/// Line parser for GFA1.
#[derive(Debug, Default)]
pub struct Gfa1Parser;

impl LineParser for Gfa1Parser {
    type Record = Gfa1Record;

    fn is_header(&self, _line: &str) -> bool {
        false
    }

    fn parse(&mut self, line: &str) -> Result<Gfa1Record, String> {
        if !line.starts_with("S\t") {
            return Ok(Gfa1Record::Other(line.to_string()));
        }
        let fields = split_fields(line, 3)?;
        Ok(Gfa1Record::Segment(Gfa1Segment {
            name: fields[1].to_string(),
            sequence: fields[2].to_string(),
            tags: fields[3..].iter().map(|s| s.to_string()).collect(),
        }))
    }
}

/// The GFA1 format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gfa1Format;

impl Format for Gfa1Format {
    type Record = Gfa1Record;
    type Reader<R: BufRead> = LineReader<R, Gfa1Parser>;

    const NAME: &'static str = "GFA1";
    const EXTENSIONS: &'static [&'static str] = &["gfa", "gfa1"];

    fn reader<R: BufRead>(&self, input: R) -> Self::Reader<R> {
        LineReader::new(input, Gfa1Parser)
    }

    fn write_record<W: Write + ?Sized>(&self, record: &Gfa1Record, out: &mut W) -> io::Result<()> {
        match record {
            Gfa1Record::Segment(segment) => {
                out.write_all(b"S\t")?;
                out.write_all(segment.name.as_bytes())?;
                out.write_all(b"\t")?;
                out.write_all(segment.sequence.as_bytes())?;
                for tag in &segment.tags {
                    out.write_all(b"\t")?;
                    out.write_all(tag.as_bytes())?;
                }
            }
            Gfa1Record::Other(line) => out.write_all(line.as_bytes())?,
        }
        out.write_all(b"\n")
    }
}

impl SegmentSequences for Gfa1Format {
    fn segment_sequence(&self, record: Gfa1Record) -> Option<FastaRecord> {
        match record {
            Gfa1Record::Segment(segment) if segment.sequence != "*" => {
                Some(FastaRecord::new(segment.name, segment.sequence))
            }
            _ => None,
        }
    }
}

fn segment_of(record: &Gfa1Record) -> Option<&Gfa1Segment> {
    record.as_segment()
}

/// Restrict a segment filter to `S` lines; everything else passes.
pub fn for_segments(filter: impl Filter<Gfa1Segment> + 'static) -> ProjectedFilter<Gfa1Record, Gfa1Segment> {
    ProjectedFilter::new(filter, segment_of)
}

/// Keep segments of at least `min` bases; segments of unknown length and
/// all non-segment lines are kept.
pub fn length_filter(min: u64) -> ProjectedFilter<Gfa1Record, Gfa1Segment> {
    for_segments(ThresholdFilter::new(
        "length",
        min as f64,
        |s: &Gfa1Segment| s.length().map(|len| len as f64),
        MissingField::Accept,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ExpressionFilter;
    use crate::formats::read_all;

    const GFA: &str = "H\tVN:Z:1.0\n\
S\t1\tACGTACGT\n\
S\t2\t*\tLN:i:3\n\
S\t3\t*\n\
L\t1\t+\t2\t+\t0M\n\
P\tp1\t1+,2+\t*\n";

    fn records() -> Vec<Gfa1Record> {
        read_all(&mut Gfa1Format.reader(GFA.as_bytes())).unwrap()
    }

    #[test]
    fn test_parse_and_write_verbatim() {
        let records = records();
        assert_eq!(records.len(), 6);
        assert!(matches!(records[0], Gfa1Record::Other(_)));
        assert_eq!(records[1].as_segment().unwrap().length(), Some(8));
        assert_eq!(records[2].as_segment().unwrap().length(), Some(3));
        assert_eq!(records[3].as_segment().unwrap().length(), None);

        let mut out = Vec::new();
        for record in &records {
            Gfa1Format.write_record(record, &mut out).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), GFA);
    }

    #[test]
    fn test_length_filter() {
        let filter = length_filter(5);
        let kept: Vec<bool> = records()
            .iter()
            .map(|r| filter.accept(r).unwrap())
            .collect();
        assert_eq!(kept, vec![true, true, false, true, true, true]);
    }

    #[test]
    fn test_fields() {
        let records = records();
        let segment = records[2].as_segment().unwrap();
        assert_eq!(segment.field("length"), Some(Value::Number(3.0)));
        assert_eq!(segment.field("sequence"), Some(Value::Missing));
        assert_eq!(records[3].as_segment().unwrap().field("length"), Some(Value::Missing));
        assert_eq!(segment.field("bogus"), None);
    }

    #[test]
    fn test_segment_sequences() {
        let names: Vec<String> = records()
            .into_iter()
            .filter_map(|r| Gfa1Format.segment_sequence(r))
            .map(|fasta| fasta.name)
            .collect();
        assert_eq!(names, vec!["1"]);
    }

    #[test]
    fn test_expression_on_segments() {
        let filter = for_segments(ExpressionFilter::parse("name != '2'").unwrap());
        let kept: Vec<bool> = records().iter().map(|r| filter.accept(r).unwrap()).collect();
        assert_eq!(kept, vec![true, true, false, true, true, true]);
    }
}
