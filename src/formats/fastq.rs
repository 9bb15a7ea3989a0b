//! FASTQ reads (four-line records).

use super::fasta::{description_value, write_name_and_description, FastaRecord};
use super::{Format, RecordReader};
use crate::config::DEFAULT_LINE_BUFFER;
use crate::error::{Error, Result};
use crate::expr::{Fields, Value};
use crate::filter::{MissingField, ThresholdFilter};
use std::io::{self, BufRead, Write};

/// A FASTQ read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    pub name: String,
    /// Everything after the first space or tab of the `@` line, as read.
    pub description: Option<String>,
    pub sequence: String,
    pub quality: String,
    separator: u8,
}

impl FastqRecord {
    pub fn new(
        name: impl Into<String>,
        sequence: impl Into<String>,
        quality: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            sequence: sequence.into(),
            quality: quality.into(),
            separator: b' ',
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Drop the qualities.
    pub fn into_fasta(self) -> FastaRecord {
        FastaRecord {
            name: self.name,
            description: self.description,
            sequence: self.sequence,
            separator: self.separator,
        }
    }
}

impl Fields for FastqRecord {
    fn field(&self, name: &str) -> Option<Value> {
        Some(match name {
            "name" => Value::Text(self.name.clone()),
            "description" => description_value(self.description.as_deref()),
            "sequence" => Value::Text(self.sequence.clone()),
            "quality" => Value::Text(self.quality.clone()),
            "length" => Value::Number(self.len() as f64),
            _ => return None,
        })
    }
}

/// Streaming FASTQ reader.
pub struct FastqReader<R> {
    reader: R,
    buffer: String,
    line_number: usize,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::with_capacity(DEFAULT_LINE_BUFFER),
            line_number: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        self.buffer.clear();
        if self.reader.read_line(&mut self.buffer)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some(
            self.buffer.trim_end_matches(&['\n', '\r'][..]).to_string(),
        ))
    }

    fn required_line(&mut self, what: &str) -> Result<String> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(self.error(format!("Truncated record: missing {}", what))),
        }
    }

    fn error(&self, message: String) -> Error {
        Error::Parse {
            line: self.line_number,
            message,
        }
    }
}

impl<R: BufRead> RecordReader for FastqReader<R> {
    type Record = FastqRecord;

    fn header(&mut self) -> Result<&[String]> {
        Ok(&[])
    }

    fn read_record(&mut self) -> Result<Option<FastqRecord>> {
        let definition = loop {
            match self.next_line()? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => break line,
            }
        };
        let definition = match definition.strip_prefix('@') {
            Some(definition) => definition,
            None => return Err(self.error("Expected '@' at start of FASTQ record".to_string())),
        };
        let (name, separator, description) = FastaRecord::split_definition(definition);

        let sequence = self.required_line("sequence")?;
        let plus_line = self.required_line("'+' separator")?;
        if !plus_line.starts_with('+') {
            return Err(self.error(format!("Expected '+' separator, got '{}'", plus_line)));
        }
        let quality = self.required_line("quality")?;
        if quality.len() != sequence.len() {
            return Err(self.error(format!(
                "Sequence length ({}) != quality length ({})",
                sequence.len(),
                quality.len()
            )));
        }

        Ok(Some(FastqRecord {
            name,
            description,
            sequence,
            quality,
            separator,
        }))
    }
}

/// The FASTQ format.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastqFormat;

impl Format for FastqFormat {
    type Record = FastqRecord;
    type Reader<R: BufRead> = FastqReader<R>;

    const NAME: &'static str = "FASTQ";
    const EXTENSIONS: &'static [&'static str] = &["fq", "fastq"];

    fn reader<R: BufRead>(&self, input: R) -> Self::Reader<R> {
        FastqReader::new(input)
    }

    fn write_record<W: Write + ?Sized>(&self, record: &FastqRecord, out: &mut W) -> io::Result<()> {
        out.write_all(b"@")?;
        write_name_and_description(&record.name, record.separator, record.description.as_deref(), out)?;
        out.write_all(b"\n")?;
        out.write_all(record.sequence.as_bytes())?;
        out.write_all(b"\n+\n")?;
        out.write_all(record.quality.as_bytes())?;
        out.write_all(b"\n")
    }
}

/// Keep reads of at least `min` bases.
pub fn length_filter(min: usize) -> ThresholdFilter<FastqRecord> {
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
    use crate::formats::{read_all, FastaFormat};

    #[test]
    fn test_parse_and_write() {
        let input = "@r1 1:N:0\nACGT\n+\nIIII\n@r2\nGG\n+r2\n##\n";
        let records = read_all(&mut FastqFormat.reader(input.as_bytes())).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "r1");
        assert_eq!(records[0].description.as_deref(), Some("1:N:0"));
        assert_eq!(records[1].quality, "##");

        let mut out = Vec::new();
        for record in &records {
            FastqFormat.write_record(record, &mut out).unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "@r1 1:N:0\nACGT\n+\nIIII\n@r2\nGG\n+\n##\n"
        );
    }

    #[test]
    fn test_tab_separated_description_kept() {
        let input = "@r1\tBC:Z:ACGT  \nAC\n+\nII\n";
        let records = read_all(&mut FastqFormat.reader(input.as_bytes())).unwrap();
        assert_eq!(records[0].field("description"), Some(Value::Text("BC:Z:ACGT".to_string())));

        let mut out = Vec::new();
        FastqFormat.write_record(&records[0], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), input);

        let mut fasta = Vec::new();
        FastaFormat::default()
            .write_record(&records[0].clone().into_fasta(), &mut fasta)
            .unwrap();
        assert_eq!(String::from_utf8(fasta).unwrap(), ">r1\tBC:Z:ACGT  \nAC\n");
    }

    #[test]
    fn test_quality_length_mismatch() {
        let mut reader = FastqFormat.reader("@r\nACGT\n+\nIII\n".as_bytes());
        match reader.read_record() {
            Err(Error::Parse { line, message }) => {
                assert_eq!(line, 4);
                assert!(message.contains("quality length"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_record() {
        let mut reader = FastqFormat.reader("@r\nACGT\n".as_bytes());
        assert!(reader.read_record().is_err());

        let mut reader = FastqFormat.reader(">r\nACGT\n+\nIIII\n".as_bytes());
        assert!(reader.read_record().is_err());
    }

    #[test]
    fn test_into_fasta() {
        let record = FastqRecord::new("r", "AC", "II").with_description("x");
        let fasta = record.into_fasta();
        assert_eq!(fasta.name, "r");
        assert_eq!(fasta.description.as_deref(), Some("x"));
        assert_eq!(fasta.sequence, "AC");
    }

    #[test]
    fn test_length_filter() {
        let filter = length_filter(3);
        assert!(filter.accept(&FastqRecord::new("a", "ACG", "III")).unwrap());
        assert!(!filter.accept(&FastqRecord::new("b", "AC", "II")).unwrap());
    }
}
