//! FASTA sequences.

use super::{Format, RecordReader};
use crate::config::{DEFAULT_LINE_BUFFER, DEFAULT_LINE_WIDTH};
use crate::error::{Error, Result};
use crate::expr::{Fields, Value};
use crate::filter::{MissingField, ThresholdFilter};
use std::io::{self, BufRead, Write};

/// A FASTA record: name, optional description and the unwrapped sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub name: String,
    /// Everything after the first space or tab of the definition line, as read.
    pub description: Option<String>,
    pub sequence: String,
    /// The byte between name and description.
    pub(crate) separator: u8,
}

impl FastaRecord {
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            sequence: sequence.into(),
            separator: b' ',
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sequence length in residues.
    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Split a definition line (without the leading `>`) into name,
    /// separator and description. The description is not trimmed.
    pub(crate) fn split_definition(definition: &str) -> (String, u8, Option<String>) {
        match memchr::memchr2(b' ', b'\t', definition.as_bytes()) {
            Some(pos) => (
                definition[..pos].to_string(),
                definition.as_bytes()[pos],
                Some(definition[pos + 1..].to_string()),
            ),
            None => (definition.to_string(), b' ', None),
        }
    }
}

/// Field value of a description: trimmed, missing when blank.
pub(crate) fn description_value(description: Option<&str>) -> Value {
    match description.map(str::trim) {
        Some(d) if !d.is_empty() => Value::Text(d.to_string()),
        _ => Value::Missing,
    }
}

impl Fields for FastaRecord {
    fn field(&self, name: &str) -> Option<Value> {
        Some(match name {
            "name" => Value::Text(self.name.clone()),
            "description" => description_value(self.description.as_deref()),
            "sequence" => Value::Text(self.sequence.clone()),
            "length" => Value::Number(self.len() as f64),
            _ => return None,
        })
    }
}

/// Streaming FASTA reader. Sequence lines are joined; whitespace inside
/// lines is kept as-is.
pub struct FastaReader<R> {
    reader: R,
    buffer: String,
    line_number: usize,
    /// Definition line of the next record, already consumed.
    next_definition: Option<String>,
    header: Vec<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::with_capacity(DEFAULT_LINE_BUFFER),
            line_number: 0,
            next_definition: None,
            header: Vec::new(),
        }
    }

    fn next_line(&mut self) -> Result<bool> {
        self.buffer.clear();
        if self.reader.read_line(&mut self.buffer)? == 0 {
            return Ok(false);
        }
        self.line_number += 1;
        let trimmed = self.buffer.trim_end_matches(&['\n', '\r'][..]).len();
        self.buffer.truncate(trimmed);
        Ok(true)
    }
}

impl<R: BufRead> RecordReader for FastaReader<R> {
    type Record = FastaRecord;

    fn header(&mut self) -> Result<&[String]> {
        Ok(&self.header)
    }

    fn read_record(&mut self) -> Result<Option<FastaRecord>> {
        let definition = match self.next_definition.take() {
            Some(definition) => definition,
            None => loop {
                if !self.next_line()? {
                    return Ok(None);
                }
                if self.buffer.trim().is_empty() {
                    continue;
                }
                match self.buffer.strip_prefix('>') {
                    Some(definition) => break definition.to_string(),
                    None => {
                        return Err(Error::Parse {
                            line: self.line_number,
                            message: "Expected '>' at start of FASTA record".to_string(),
                        })
                    }
                }
            },
        };

        let (name, separator, description) = FastaRecord::split_definition(&definition);
        let mut sequence = String::new();
        while self.next_line()? {
            if let Some(next) = self.buffer.strip_prefix('>') {
                self.next_definition = Some(next.to_string());
                break;
            }
            sequence.push_str(self.buffer.trim());
        }

        Ok(Some(FastaRecord {
            name,
            description,
            sequence,
            separator,
        }))
    }
}

/// Write `name`, then the separator and description if there is one.
pub(crate) fn write_name_and_description<W: Write + ?Sized>(
    name: &str,
    separator: u8,
    description: Option<&str>,
    out: &mut W,
) -> io::Result<()> {
    out.write_all(name.as_bytes())?;
    if let Some(description) = description {
        out.write_all(&[separator])?;
        out.write_all(description.as_bytes())?;
    }
    Ok(())
}

/// The FASTA format. Sequences are wrapped at `line_width` residues on
/// output; a width of 0 writes each sequence on one line.
#[derive(Debug, Clone, Copy)]
pub struct FastaFormat {
    pub line_width: usize,
}

impl Default for FastaFormat {
    fn default() -> Self {
        Self {
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

impl FastaFormat {
    pub fn with_line_width(line_width: usize) -> Self {
        Self { line_width }
    }

    /// Write a `>` definition line.
    pub fn write_definition<W: Write + ?Sized>(record: &FastaRecord, out: &mut W) -> io::Result<()> {
        out.write_all(b">")?;
        write_name_and_description(&record.name, record.separator, record.description.as_deref(), out)?;
        out.write_all(b"\n")
    }

    /// Write sequence lines wrapped at this format's line width.
    pub fn write_sequence<W: Write + ?Sized>(&self, sequence: &[u8], out: &mut W) -> io::Result<()> {
        if sequence.is_empty() {
            return Ok(());
        }
        if self.line_width == 0 {
            out.write_all(sequence)?;
            return out.write_all(b"\n");
        }
        for chunk in sequence.chunks(self.line_width) {
            out.write_all(chunk)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl Format for FastaFormat {
    type Record = FastaRecord;
    type Reader<R: BufRead> = FastaReader<R>;

    const NAME: &'static str = "FASTA";
    const EXTENSIONS: &'static [&'static str] = &["fa", "fasta", "fna", "faa", "ffn"];

    fn reader<R: BufRead>(&self, input: R) -> Self::Reader<R> {
        FastaReader::new(input)
    }

    fn write_record<W: Write + ?Sized>(&self, record: &FastaRecord, out: &mut W) -> io::Result<()> {
        Self::write_definition(record, out)?;
        self.write_sequence(record.sequence.as_bytes(), out)
    }
}

/// Keep sequences of at least `min` residues.
pub fn length_filter(min: usize) -> ThresholdFilter<FastaRecord> {
    ThresholdFilter::new(
        "length",
        min as f64,
        |r| Some(r.len() as f64),
        MissingField::Accept,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::formats::read_all;

    fn parse(content: &str) -> Vec<FastaRecord> {
        read_all(&mut FastaFormat::default().reader(content.as_bytes())).unwrap()
    }

    fn write(format: FastaFormat, record: &FastaRecord) -> String {
        let mut out = Vec::new();
        format.write_record(record, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_multiline_records() {
        let records = parse(">seq1 first sequence\nACGT\nAC\n\n>seq2\nGGG\n");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "seq1");
        assert_eq!(records[0].description.as_deref(), Some("first sequence"));
        assert_eq!(records[0].sequence, "ACGTAC");
        assert_eq!(records[1].description, None);
        assert_eq!(records[1].sequence, "GGG");
    }

    #[test]
    fn test_definition_line_written_as_read() {
        let content = ">s1\tdesc with tab\nACGT\n>s2  two spaces \nGG\n>s3 \nT\n";
        let records = parse(content);
        assert_eq!(records[0].description.as_deref(), Some("desc with tab"));
        assert_eq!(records[1].field("description"), Some(Value::Text("two spaces".to_string())));
        assert_eq!(records[2].field("description"), Some(Value::Missing));

        let mut out = Vec::new();
        for record in &records {
            FastaFormat::default().write_record(record, &mut out).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), content);
    }

    #[test]
    fn test_parse_crlf_and_empty_sequence() {
        let records = parse(">a\r\n>b desc\r\nAC\r\nGT\r\n");
        assert_eq!(records.len(), 2);
        assert!(records[0].is_empty());
        assert_eq!(records[1].sequence, "ACGT");
    }

    #[test]
    fn test_missing_definition_line() {
        let mut reader = FastaFormat::default().reader("ACGT\n".as_bytes());
        match reader.read_record() {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_write_wraps_sequence() {
        let record = FastaRecord::new("s", "ACGTACGTAC").with_description("d e");
        assert_eq!(
            write(FastaFormat::with_line_width(4), &record),
            ">s d e\nACGT\nACGT\nAC\n"
        );
        assert_eq!(
            write(FastaFormat::with_line_width(0), &record),
            ">s d e\nACGTACGTAC\n"
        );
        assert_eq!(write(FastaFormat::default(), &FastaRecord::new("e", "")), ">e\n");
    }

    #[test]
    fn test_length_filter() {
        let filter = length_filter(100);
        assert!(!filter.accept(&FastaRecord::new("a", "A".repeat(50))).unwrap());
        assert!(filter.accept(&FastaRecord::new("b", "A".repeat(150))).unwrap());
        assert!(filter.accept(&FastaRecord::new("c", "A".repeat(100))).unwrap());
    }

    #[test]
    fn test_fields() {
        let record = FastaRecord::new("chr1", "ACGTN");
        assert_eq!(record.field("length"), Some(Value::Number(5.0)));
        assert_eq!(record.field("description"), Some(Value::Missing));
        assert_eq!(record.field("quality"), None);
    }
}
