//! GAF graph alignments.
//!
//! Same column layout as PAF, with the target replaced by a path through
//! the graph.

use super::paf::MAPQ_MISSING;
use super::{parse_field, split_fields, tag_value, write_columns, Format, LineParser, LineReader};
use crate::expr::{Fields, Value};
use crate::filter::{MissingField, ThresholdFilter};
use std::io::{self, BufRead, Write};

/// A GAF line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GafRecord {
    pub query_name: String,
    pub query_length: u64,
    pub query_start: u64,
    pub query_end: u64,
    pub strand: String,
    /// Path matching `([><][^\s><]+(:\d+-\d+)?)+` or a stable id.
    pub path: String,
    pub path_length: u64,
    pub path_start: u64,
    pub path_end: u64,
    pub matches: u64,
    pub alignment_block_length: u64,
    pub mapping_quality: u8,
    pub tags: Vec<String>,
}

impl GafRecord {
    /// Mapping quality, `None` when 255.
    pub fn mapq(&self) -> Option<u8> {
        (self.mapping_quality != MAPQ_MISSING).then_some(self.mapping_quality)
    }
}

impl Fields for GafRecord {
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
            "path" => Value::text(&self.path),
            "path_length" => number(self.path_length),
            "path_start" => number(self.path_start),
            "path_end" => number(self.path_end),
            "matches" => number(self.matches),
            "alignment_block_length" => number(self.alignment_block_length),
            "mapping_quality" => self
                .mapq()
                .map_or(Value::Missing, |q| Value::Number(q as f64)),
            _ => return None,
        })
    }
}

/// Line parser for GAF.
#[derive(Debug, Default)]
pub struct GafParser;

impl LineParser for GafParser {
    type Record = GafRecord;

    fn is_header(&self, _line: &str) -> bool {
        false
    }

    fn parse(&mut self, line: &str) -> Result<GafRecord, String> {
        let fields = split_fields(line, 12)?;
        Ok(GafRecord {
            query_name: fields[0].to_string(),
            query_length: parse_field(fields[1], "query length")?,
            query_start: parse_field(fields[2], "query start")?,
            query_end: parse_field(fields[3], "query end")?,
            strand: fields[4].to_string(),
            path: fields[5].to_string(),
            path_length: parse_field(fields[6], "path length")?,
            path_start: parse_field(fields[7], "path start")?,
            path_end: parse_field(fields[8], "path end")?,
            matches: parse_field(fields[9], "number of matches")?,
            alignment_block_length: parse_field(fields[10], "alignment block length")?,
            mapping_quality: parse_field(fields[11], "mapping quality")?,
            tags: fields[12..].iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// The GAF format.
#[derive(Debug, Clone, Copy, Default)]
pub struct GafFormat;

impl Format for GafFormat {
    type Record = GafRecord;
    type Reader<R: BufRead> = LineReader<R, GafParser>;

    const NAME: &'static str = "GAF";
    const EXTENSIONS: &'static [&'static str] = &["gaf"];

    fn reader<R: BufRead>(&self, input: R) -> Self::Reader<R> {
        LineReader::new(input, GafParser)
    }

    fn write_record<W: Write + ?Sized>(&self, r: &GafRecord, out: &mut W) -> io::Result<()> {
        let mut buf = itoa::Buffer::new();
        out.write_all(r.query_name.as_bytes())?;
        for n in [r.query_length, r.query_start, r.query_end] {
            out.write_all(b"\t")?;
            out.write_all(buf.format(n).as_bytes())?;
        }
        for column in [&r.strand, &r.path] {
            out.write_all(b"\t")?;
            out.write_all(column.as_bytes())?;
        }
        for n in [
            r.path_length,
            r.path_start,
            r.path_end,
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
pub fn mapping_quality_filter(min: u8) -> ThresholdFilter<GafRecord> {
    ThresholdFilter::new(
        "mapping_quality",
        f64::from(min),
        |r| r.mapq().map(f64::from),
        MissingField::Reject,
    )
}

/// Keep alignments with a block length of at least `min`.
pub fn alignment_block_length_filter(min: u64) -> ThresholdFilter<GafRecord> {
    ThresholdFilter::new(
        "alignment_block_length",
        min as f64,
        |r| Some(r.alignment_block_length as f64),
        MissingField::Reject,
    )
}
