//! PAF pairwise alignments.

use super::{parse_field, split_fields, tag_value, write_columns, Format, LineParser, LineReader};
use crate::expr::{Fields, Value};
use crate::filter::{MissingField, ThresholdFilter};
use std::io::{self, BufRead, Write};

/// Mapping quality meaning "not available".
pub const MAPQ_MISSING: u8 = 255;

/// A PAF line: twelve mandatory columns plus optional tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PafRecord {
    pub query_name: String,
    pub query_length: u64,
    pub query_start: u64,
    pub query_end: u64,
    pub strand: String,
    pub target_name: String,
    pub target_length: u64,
    pub target_start: u64,
    pub target_end: u64,
    pub matches: u64,
    pub alignment_block_length: u64,
    pub mapping_quality: u8,
    pub tags: Vec<String>,
}

impl PafRecord {
    /// Mapping quality, `None` when 255.
    pub fn mapq(&self) -> Option<u8> {
        (self.mapping_quality != MAPQ_MISSING).then_some(self.mapping_quality)
    }
}

impl Fields for PafRecord {
    fn field(&self, name: &str) -> Option<Value> {
        if let Some(key) = name.strip_prefix("tags.") {
            return Some(tag_value(&self.tags, key));
        }
        let number = |n: u64| Value::Number(n as f64);
        Some(match name {
            "query_name" => Value::text(&self.query_name),
            "query_length" => number(self.query_length),
            "query_start" => number(self.query_start),
            "query_end" => number(self.query_end),
            "strand" => Value::text(&self.strand),
            "target_name" => Value::text(&self.target_name),
            "target_length" => number(self.target_length),
            "target_start" => number(self.target_start),
            "target_end" => number(self.target_end),
            "matches" => number(self.matches),
            "alignment_block_length" => number(self.alignment_block_length),
            "mapping_quality" => self
                .mapq()
                .map_or(Value::Missing, |q| Value::Number(q as f64)),
            _ => return None,
        })
    }
}

/// Line parser for PAF.
#[derive(Debug, Default)]
pub struct PafParser;

impl LineParser for PafParser {
    type Record = PafRecord;

    fn is_header(&self, _line: &str) -> bool {
        false
    }

    fn parse(&mut self, line: &str) -> Result<PafRecord, String> {
        let fields = split_fields(line, 12)?;
        Ok(PafRecord {
            query_name: fields[0].to_string(),
            query_length: parse_field(fields[1], "query length")?,
            query_start: parse_field(fields[2], "query start")?,
            query_end: parse_field(fields[3], "query end")?,
            strand: fields[4].to_string(),
            target_name: fields[5].to_string(),
            target_length: parse_field(fields[6], "target length")?,
            target_start: parse_field(fields[7], "target start")?,
            target_end: parse_field(fields[8], "target end")?,
            matches: parse_field(fields[9], "number of matches")?,
            alignment_block_length: parse_field(fields[10], "alignment block length")?,
            mapping_quality: parse_field(fields[11], "mapping quality")?,
            tags: fields[12..].iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// The PAF format.
#[derive(Debug, Clone, Copy, Default)]
pub struct PafFormat;

impl Format for PafFormat {
    type Record = PafRecord;
    type Reader<R: BufRead> = LineReader<R, PafParser>;

    const NAME: &'static str = "PAF";
    const EXTENSIONS: &'static [&'static str] = &["paf"];

    fn reader<R: BufRead>(&self, input: R) -> Self::Reader<R> {
        LineReader::new(input, PafParser)
    }

    fn write_record<W: Write + ?Sized>(&self, r: &PafRecord, out: &mut W) -> io::Result<()> {
        let mut buf = itoa::Buffer::new();
        out.write_all(r.query_name.as_bytes())?;
        for n in [r.query_length, r.query_start, r.query_end] {
            out.write_all(b"\t")?;
            out.write_all(buf.format(n).as_bytes())?;
        }
        out.write_all(b"\t")?;
        out.write_all(r.strand.as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(r.target_name.as_bytes())?;
        for n in [
            r.target_length,
            r.target_start,
            r.target_end,
            r.matches,
            r.alignment_block_length,
            u64::from(r.mapping_quality),
        ] {
            out.write_all(b"\t")?;
            out.write_all(buf.format(n).as_bytes())?;
        }
        write_columns(&r.tags, out)?;
        out.write_all(b"\n")
    }
}

/// Keep alignments with mapping quality of at least `min`; 255 is dropped.
pub fn mapping_quality_filter(min: u8) -> ThresholdFilter<PafRecord> {
    ThresholdFilter::new(
        "mapping_quality",
        f64::from(min),
        |r| r.mapq().map(f64::from),
        MissingField::Reject,
    )
}

/// Keep alignments with a block length of at least `min`.
pub fn alignment_block_length_filter(min: u64) -> ThresholdFilter<PafRecord> {
    ThresholdFilter::new(
        "alignment_block_length",
        min as f64,
        |r| Some(r.alignment_block_length as f64),
        MissingField::Reject,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::formats::read_all;

    const PAF: &str = "q1\t1000\t10\t990\t+\tt1\t5000\t100\t1080\t950\t980\t60\ttp:A:P\tNM:i:30\n\
q2\t500\t0\t500\t-\tt1\t5000\t0\t500\t400\t500\t255\n";

    fn records() -> Vec<PafRecord> {
        read_all(&mut PafFormat.reader(PAF.as_bytes())).unwrap()
    }

    #[test]
    fn test_parse_and_write_verbatim() {
        let records = records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].alignment_block_length, 980);
        assert_eq!(records[0].tags.len(), 2);
        assert_eq!(records[1].mapq(), None);

        let mut out = Vec::new();
        for record in &records {
            PafFormat.write_record(record, &mut out).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), PAF);
    }

    #[test]
    fn test_filters() {
        let records = records();
        let mapq = mapping_quality_filter(30);
        assert!(mapq.accept(&records[0]).unwrap());
        assert!(!mapq.accept(&records[1]).unwrap());

        let block = alignment_block_length_filter(600);
        assert!(block.accept(&records[0]).unwrap());
        assert!(!block.accept(&records[1]).unwrap());
    }

    #[test]
    fn test_fields() {
        let records = records();
        assert_eq!(records[0].field("tags.NM"), Some(Value::Number(30.0)));
        assert_eq!(records[1].field("mapping_quality"), Some(Value::Missing));
        assert_eq!(records[0].field("path"), None);
    }

    #[test]
    fn test_short_line_is_error() {
        let mut reader = PafFormat.reader("q1\t1000\t10\n".as_bytes());
        assert!(read_all(&mut reader).is_err());
    }
}
