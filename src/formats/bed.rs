//! BED records, from BED3 up to BED12 plus any extra columns.

use super::{
    parse_field, split_fields, write_columns, write_optional_float, Format, LineParser, LineReader,
    RenameReferences,
};
use crate::expr::{Fields, Value};
use crate::filter::{MissingField, RangeFilter, Span, ThresholdFilter};
use crate::region::Interval;
use crate::rename::ReferenceRenamer;
use std::fmt;
use std::io::{self, BufRead, Write};

/// Strand orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => Strand::Plus,
            '-' => Strand::Minus,
            _ => Strand::Unknown,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}

/// A BED record.
///
/// Columns after strand (thickStart, thickEnd, itemRgb, blocks and any
/// custom columns) are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct BedRecord {
    pub interval: Interval,
    pub name: Option<String>,
    pub score: Option<f64>,
    pub strand: Option<Strand>,
    pub extra_fields: Vec<String>,
    /// Number of columns present in the input, at least 3.
    columns: usize,
    /// Score and strand columns as read, written back while they still
    /// agree with `score` and `strand`.
    score_text: Option<String>,
    strand_text: Option<String>,
}

impl BedRecord {
    /// Create a minimal BED3 record.
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            interval: Interval::new(chrom, start, end),
            name: None,
            score: None,
            strand: None,
            extra_fields: Vec::new(),
            columns: 3,
            score_text: None,
            strand_text: None,
        }
    }

    /// Get the chromosome.
    #[inline]
    pub fn chrom(&self) -> &str {
        &self.interval.chrom
    }

    /// Get the start position.
    #[inline]
    pub fn start(&self) -> u64 {
        self.interval.start
    }

    /// Get the end position.
    #[inline]
    pub fn end(&self) -> u64 {
        self.interval.end
    }

    /// Get the interval length.
    #[inline]
    pub fn len(&self) -> u64 {
        self.interval.len()
    }

    /// Check if the interval is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.interval.is_empty()
    }

    /// Set the name column.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.columns = self.columns.max(4);
        self
    }

    /// Set the score column.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self.columns = self.columns.max(5);
        self
    }

    /// Set the strand column.
    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = Some(strand);
        self.columns = self.columns.max(6);
        self
    }
}

impl fmt::Display for BedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = Vec::with_capacity(64);
        write_bed(self, &mut line).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&line))
    }
}

/// Write the columns the record was read with (or built up to), without a
/// trailing newline. Missing name and score are written as `.`.
fn write_bed<W: Write + ?Sized>(record: &BedRecord, out: &mut W) -> io::Result<()> {
    let mut buf = itoa::Buffer::new();
    out.write_all(record.chrom().as_bytes())?;
    out.write_all(b"\t")?;
    out.write_all(buf.format(record.start()).as_bytes())?;
    out.write_all(b"\t")?;
    out.write_all(buf.format(record.end()).as_bytes())?;
    if record.columns > 3 {
        out.write_all(b"\t")?;
        out.write_all(record.name.as_deref().unwrap_or(".").as_bytes())?;
    }
    if record.columns > 4 {
        out.write_all(b"\t")?;
        match &record.score_text {
            Some(text) if same_score(text, record.score) => out.write_all(text.as_bytes())?,
            _ => write_optional_float(out, record.score)?,
        }
    }
    if record.columns > 5 {
        out.write_all(b"\t")?;
        match &record.strand_text {
            Some(text) if parse_strand(text) == record.strand => out.write_all(text.as_bytes())?,
            _ => write!(out, "{}", record.strand.unwrap_or(Strand::Unknown))?,
        }
    }
    write_columns(&record.extra_fields, out)
}

fn parse_score(text: &str) -> Option<f64> {
    text.parse().ok()
}

fn same_score(text: &str, score: Option<f64>) -> bool {
    parse_score(text).map(f64::to_bits) == score.map(f64::to_bits)
}

fn parse_strand(text: &str) -> Option<Strand> {
    text.chars().next().map(Strand::from_char)
}

impl Fields for BedRecord {
    fn field(&self, name: &str) -> Option<Value> {
        Some(match name {
            "chrom" => Value::text(self.chrom()),
            "start" => Value::Number(self.start() as f64),
            "end" => Value::Number(self.end() as f64),
            "length" => Value::Number(self.len() as f64),
            "name" => self.name.as_deref().map_or(Value::Missing, Value::text),
            "score" => self.score.map_or(Value::Missing, Value::Number),
            "strand" => self
                .strand
                .map_or(Value::Missing, |s| Value::text(&s.to_string())),
            _ => return None,
        })
    }
}

/// Line parser for BED.
#[derive(Debug, Default)]
pub struct BedParser;

impl LineParser for BedParser {
    type Record = BedRecord;

    fn is_header(&self, line: &str) -> bool {
        line.starts_with('#') || line.starts_with("track") || line.starts_with("browser")
    }

    fn parse(&mut self, line: &str) -> Result<BedRecord, String> {
        let fields = split_fields(line, 3)?;

        let start: u64 = parse_field(fields[1], "start position")?;
        let end: u64 = parse_field(fields[2], "end position")?;
        if start > end {
            return Err(format!("Start ({}) > end ({})", start, end));
        }

        let mut record = BedRecord::new(fields[0], start, end);
        record.columns = fields.len();

        // Parse optional fields
        if fields.len() > 3 && fields[3] != "." {
            record.name = Some(fields[3].to_string());
        }
        if fields.len() > 4 {
            record.score = parse_score(fields[4]);
            record.score_text = Some(fields[4].to_string());
        }
        if fields.len() > 5 {
            record.strand = parse_strand(fields[5]);
            record.strand_text = Some(fields[5].to_string());
        }
        if fields.len() > 6 {
            record.extra_fields = fields[6..].iter().map(|s| s.to_string()).collect();
        }

        Ok(record)
    }
}

/// The BED format.
#[derive(Debug, Clone, Copy, Default)]
pub struct BedFormat;

impl Format for BedFormat {
    type Record = BedRecord;
    type Reader<R: BufRead> = LineReader<R, BedParser>;

    const NAME: &'static str = "BED";
    const EXTENSIONS: &'static [&'static str] = &["bed"];

    fn reader<R: BufRead>(&self, input: R) -> Self::Reader<R> {
        LineReader::new(input, BedParser)
    }

    fn write_record<W: Write + ?Sized>(&self, record: &BedRecord, out: &mut W) -> io::Result<()> {
        write_bed(record, out)?;
        out.write_all(b"\n")
    }
}

impl RenameReferences for BedFormat {
    fn rename_record(&self, record: &mut BedRecord, renamer: &ReferenceRenamer) {
        record.interval.chrom = renamer.rename_str(&record.interval.chrom);
    }
}

fn locate(record: &BedRecord) -> Option<Span<'_>> {
    Some((record.chrom(), record.start(), record.end()))
}

/// Keep records overlapping any of `regions`.
pub fn range_filter(regions: Vec<Interval>) -> RangeFilter<BedRecord> {
    RangeFilter::new(regions, locate, MissingField::Reject)
}

/// Keep records scoring at least `min`; records without a score are dropped.
pub fn score_filter(min: f64) -> ThresholdFilter<BedRecord> {
    ThresholdFilter::new("score", min, |r| r.score, MissingField::Reject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::formats::{read_all, RecordReader};

    fn parse(content: &str) -> Vec<BedRecord> {
        let mut reader = BedFormat.reader(content.as_bytes());
        read_all(&mut reader).unwrap()
    }

    #[test]
    fn test_parse_bed3() {
        let records = parse("chr1\t100\t200\nchr1\t300\t400\n");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chrom(), "chr1");
        assert_eq!(records[0].start(), 100);
        assert_eq!(records[0].end(), 200);
        assert_eq!(records[0].to_string(), "chr1\t100\t200");
    }

    #[test]
    fn test_parse_bed6() {
        let records = parse("chr1\t100\t200\tgene1\t500\t+\n");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, Some("gene1".to_string()));
        assert_eq!(records[0].score, Some(500.0));
        assert_eq!(records[0].strand, Some(Strand::Plus));
        assert_eq!(records[0].to_string(), "chr1\t100\t200\tgene1\t500\t+");
    }

    #[test]
    fn test_bed12_round_trips_verbatim() {
        let line = "chr2\t10\t90\ttx\t0\t-\t20\t80\t255,0,0\t2\t10,20,\t0,60,";
        let records = parse(&format!("{}\n", line));
        assert_eq!(records[0].to_string(), line);
        assert_eq!(records[0].extra_fields.len(), 6);
    }

    #[test]
    fn test_score_and_strand_written_as_read() {
        let content = "chr1\t10\t20\ta\t960.0\t+\n\
chr1\t30\t40\tb\tabc\t-\n\
chr1\t50\t60\tc\t0.50\t\tx\n";
        let records = parse(content);
        assert_eq!(records[0].score, Some(960.0));
        assert_eq!(records[1].score, None);
        assert_eq!(records[2].score, Some(0.5));
        assert_eq!(records[2].strand, None);

        let mut out = Vec::new();
        for record in &records {
            BedFormat.write_record(record, &mut out).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), content);
    }

    #[test]
    fn test_changed_score_is_reformatted() {
        let mut record = parse("chr1\t10\t20\ta\t960.0\t+\n").remove(0);
        record.score = Some(12.5);
        record.strand = Some(Strand::Minus);
        assert_eq!(record.to_string(), "chr1\t10\t20\ta\t12.5\t-");
    }

    #[test]
    fn test_skip_header_lines() {
        let content = "track name=test\nbrowser position chr1:1-1000\n# comment\nchr1\t100\t200\n";
        let mut reader = BedFormat.reader(content.as_bytes());

        assert_eq!(reader.header().unwrap().len(), 3);
        assert_eq!(read_all(&mut reader).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_bed() {
        let mut reader = BedFormat.reader("chr1\t100\n".as_bytes());
        assert!(reader.read_record().is_err());

        let mut reader = BedFormat.reader("chr1\t300\t200\n".as_bytes());
        assert!(reader.read_record().is_err());
    }

    #[test]
    fn test_score_filter_rejects_missing() {
        let filter = score_filter(10.0);
        assert!(filter
            .accept(&BedRecord::new("chr1", 0, 1).with_score(10.0))
            .unwrap());
        assert!(!filter
            .accept(&BedRecord::new("chr1", 0, 1).with_score(9.0))
            .unwrap());
        assert!(!filter.accept(&BedRecord::new("chr1", 0, 1)).unwrap());
    }

    #[test]
    fn test_range_filter() {
        let filter = range_filter(vec!["chr1:101-200".parse().unwrap()]);
        assert!(filter.accept(&BedRecord::new("chr1", 150, 300)).unwrap());
        assert!(!filter.accept(&BedRecord::new("chr1", 200, 300)).unwrap());
    }

    #[test]
    fn test_rename() {
        let renamer = ReferenceRenamer::new(false).unwrap();
        let mut record = BedRecord::new("chr7", 1, 2).with_name("a");
        BedFormat.rename_record(&mut record, &renamer);
        assert_eq!(record.to_string(), "7\t1\t2\ta");
    }

    #[test]
    fn test_fields() {
        let record = BedRecord::new("chr1", 100, 250)
            .with_name("peak")
            .with_strand(Strand::Minus);
        assert_eq!(record.field("length"), Some(Value::Number(150.0)));
        assert_eq!(record.field("strand"), Some(Value::Text("-".to_string())));
        assert_eq!(record.field("score"), Some(Value::Missing));
        assert_eq!(record.field("nope"), None);
        assert_eq!(record.to_string(), "chr1\t100\t250\tpeak\t.\t-");
    }
}
