//! GFA2 graphs. Segment lines are parsed; edges, gaps, fragments, groups
//! and everything else are carried through untouched.

use super::fasta::FastaRecord;
use super::{parse_field, split_fields, Format, LineParser, LineReader, SegmentSequences};
use crate::expr::{Fields, Value};
use crate::filter::{Filter, MissingField, ProjectedFilter, ThresholdFilter};
use std::io::{self, BufRead, Write};

/// An `S` line: `S <sid> <slen> <sequence> <tags>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gfa2Segment {
    pub name: String,
    /// Declared segment length.
    pub length: u64,
    /// Sequence, or `*` when not stored.
    pub sequence: String,
    pub tags: Vec<String>,
}

impl Fields for Gfa2Segment {
    fn field(&self, name: &str) -> Option<Value> {
        Some(match name {
            "name" => Value::text(&self.name),
            "sequence" => Value::text(&self.sequence),
            "length" => Value::Number(self.length as f64),
            _ => return None,
        })
    }
}

/// One GFA2 line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gfa2Record {
    Segment(Gfa2Segment),
    Other(String),
}

impl Gfa2Record {
    pub fn as_segment(&self) -> Option<&Gfa2Segment> {
        match self {
            Gfa2Record::Segment(segment) => Some(segment),
            Gfa2Record::Other(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Gfa2Parser;

impl LineParser for Gfa2Parser {
    type Record = Gfa2Record;

    fn is_header(&self, _line: &str) -> bool {
        false
    }

    fn parse(&mut self, line: &str) -> Result<Gfa2Record, String> {
        if !line.starts_with("S\t") {
            return Ok(Gfa2Record::Other(line.to_string()));
        }
        let fields = split_fields(line, 4)?;
        Ok(Gfa2Record::Segment(Gfa2Segment {
            name: fields[1].to_string(),
            length: parse_field(fields[2], "segment length")?,
            sequence: fields[3].to_string(),
            tags: fields[4..].iter().map(|s| s.to_string()).collect(),
        }))
    }
}

/// The GFA2 format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gfa2Format;

impl Format for Gfa2Format {
    type Record = Gfa2Record;
    type Reader<R: BufRead> = LineReader<R, Gfa2Parser>;

    const NAME: &'static str = "GFA2";
    const EXTENSIONS: &'static [&'static str] = &["gfa2", "gfa"];

    fn reader<R: BufRead>(&self, input: R) -> Self::Reader<R> {
        LineReader::new(input, Gfa2Parser)
    }

    fn write_record<W: Write + ?Sized>(&self, record: &Gfa2Record, out: &mut W) -> io::Result<()> {
        match record {
            Gfa2Record::Segment(segment) => {
                let mut buf = itoa::Buffer::new();
                out.write_all(b"S\t")?;
                out.write_all(segment.name.as_bytes())?;
                out.write_all(b"\t")?;
                out.write_all(buf.format(segment.length).as_bytes())?;
                out.write_all(b"\t")?;
                out.write_all(segment.sequence.as_bytes())?;
                for tag in &segment.tags {
                    out.write_all(b"\t")?;
                    out.write_all(tag.as_bytes())?;
                }
            }
            Gfa2Record::Other(line) => out.write_all(line.as_bytes())?,
        }
        out.write_all(b"\n")
    }
}

impl SegmentSequences for Gfa2Format {
    fn segment_sequence(&self, record: Gfa2Record) -> Option<FastaRecord> {
        match record {
            Gfa2Record::Segment(segment) if segment.sequence != "*" => {
                Some(FastaRecord::new(segment.name, segment.sequence))
            }
            _ => None,
        }
    }
}

fn segment_of(record: &Gfa2Record) -> Option<&Gfa2Segment> {
    record.as_segment()
}

/// Restrict a segment filter to `S` lines; everything else passes.
pub fn for_segments(filter: impl Filter<Gfa2Segment> + 'static) -> ProjectedFilter<Gfa2Record, Gfa2Segment> {
    ProjectedFilter::new(filter, segment_of)
}

/// Keep segments whose declared length is at least `min`; non-segment
/// lines are kept.
pub fn length_filter(min: u64) -> ProjectedFilter<Gfa2Record, Gfa2Segment> {
    for_segments(ThresholdFilter::new(
        "length",
        min as f64,
        |s: &Gfa2Segment| Some(s.length as f64),
        MissingField::Accept,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ExpressionFilter;
    use crate::formats::{read_all, RecordReader};

    const GFA: &str = "H\tVN:Z:2.0\n\
S\ts1\t8\tACGTACGT\n\
S\ts2\t3\t*\tRC:i:4\n\
E\te1\ts1+\ts2-\t6\t8$\t0\t2\t2M\n\
O\tp1\ts1+ s2-\n";

    fn records() -> Vec<Gfa2Record> {
        read_all(&mut Gfa2Format.reader(GFA.as_bytes())).unwrap()
    }

    #[test]
    fn test_parse_and_write_verbatim() {
        let records = records();
        assert_eq!(records.len(), 5);
        let s2 = records[2].as_segment().unwrap();
        assert_eq!(s2.length, 3);
        assert_eq!(s2.tags, vec!["RC:i:4"]);

        let mut out = Vec::new();
        for record in &records {
            Gfa2Format.write_record(record, &mut out).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), GFA);
    }

    #[test]
    fn test_invalid_segment_length() {
        let mut reader = Gfa2Format.reader("S\ts1\tlong\tACGT\n".as_bytes());
        assert!(reader.read_record().is_err());
    }

    #[test]
    fn test_filters() {
        let length = length_filter(5);
        let kept: Vec<bool> = records().iter().map(|r| length.accept(r).unwrap()).collect();
        assert_eq!(kept, vec![true, true, false, true, true]);

        let script = for_segments(ExpressionFilter::parse("sequence == 'ACGTACGT'").unwrap());
        let kept: Vec<bool> = records().iter().map(|r| script.accept(r).unwrap()).collect();
        assert_eq!(kept, vec![true, true, false, true, true]);
    }

    #[test]
    fn test_segment_sequences() {
        let fasta: Vec<FastaRecord> = records()
            .into_iter()
            .filter_map(|r| Gfa2Format.segment_sequence(r))
            .collect();
        assert_eq!(fasta, vec![FastaRecord::new("s1", "ACGTACGT")]);
    }
}
