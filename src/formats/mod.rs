//! Record formats.
//!
//! Every format implements [`Format`]: a reader that yields an optional
//! header block followed by records, and writers for both. Line-oriented
//! formats share [`LineReader`], which only needs a [`LineParser`].

pub mod bed;
pub mod fasta;
pub mod fastq;
pub mod gaf;
pub mod gff3;
pub mod gfa1;
pub mod gfa2;
pub mod paf;
pub mod sam;
pub mod vcf;

use crate::config::DEFAULT_LINE_BUFFER;
use crate::error::{Error, Result};
use crate::expr::Value;
use crate::rename::ReferenceRenamer;
use std::io::{self, BufRead, Write};

pub use bed::{BedFormat, BedRecord};
pub use fasta::{FastaFormat, FastaRecord};
pub use fastq::{FastqFormat, FastqRecord};
pub use gaf::{GafFormat, GafRecord};
pub use gff3::{Gff3Format, Gff3Record};
pub use gfa1::{Gfa1Format, Gfa1Record};
pub use gfa2::{Gfa2Format, Gfa2Record};
pub use paf::{PafFormat, PafRecord};
pub use sam::{SamFormat, SamRecord};
pub use vcf::{VcfFormat, VcfRecord};

/// Sequential record reader.
pub trait RecordReader {
    type Record;

    /// Header lines preceding the first record. Reads them on first call.
    fn header(&mut self) -> Result<&[String]>;

    /// Read the next record, or `None` at end of input.
    fn read_record(&mut self) -> Result<Option<Self::Record>>;
}

/// A record format with its reader and writers.
pub trait Format {
    type Record;
    type Reader<R: BufRead>: RecordReader<Record = Self::Record>;

    /// Short name used in log messages.
    const NAME: &'static str;

    /// Known file extensions; the first one names split output files.
    const EXTENSIONS: &'static [&'static str];

    /// Wrap a (decompressed) input stream.
    fn reader<R: BufRead>(&self, input: R) -> Self::Reader<R>;

    /// Write one record.
    fn write_record<W: Write + ?Sized>(&self, record: &Self::Record, out: &mut W)
        -> io::Result<()>;

    /// Whether `record` counts toward split thresholds and may open a new
    /// split file. Other records stay in the file of the record before them.
    fn is_split_point(&self, _record: &Self::Record) -> bool {
        true
    }

    /// Write a header block, one line per entry.
    fn write_header<W: Write + ?Sized>(&self, header: &[String], out: &mut W) -> io::Result<()> {
        for line in header {
            out.write_all(line.as_bytes())?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// Formats whose records (and header) carry reference names.
pub trait RenameReferences: Format {
    /// Rename reference names mentioned in a header line.
    fn rename_header_line(&self, line: &str, _renamer: &ReferenceRenamer) -> String {
        line.to_string()
    }

    /// Rename reference names in a record.
    fn rename_record(&self, record: &mut Self::Record, renamer: &ReferenceRenamer);
}

/// Graph formats whose segments can carry their sequence.
pub trait SegmentSequences: Format {
    /// The segment as a FASTA record, or `None` for other lines and for
    /// segments without a stored sequence.
    fn segment_sequence(&self, record: Self::Record) -> Option<FastaRecord>;
}

/// Parses single lines of a line-oriented format.
pub trait LineParser {
    type Record;

    /// True for lines that belong to the leading header block.
    fn is_header(&self, line: &str) -> bool;

    /// Parse a record line. Errors carry a message; the caller adds the line.
    fn parse(&mut self, line: &str) -> std::result::Result<Self::Record, String>;
}

/// Streaming reader for line-oriented formats.
///
/// Blank lines are skipped. Leading lines accepted by
/// [`LineParser::is_header`] form the header; everything after is parsed
/// as records.
pub struct LineReader<R, P> {
    reader: R,
    parser: P,
    buffer: String,
    line_number: usize,
    header: Vec<String>,
    header_read: bool,
    pending: Option<(usize, String)>,
}

impl<R: BufRead, P: LineParser> LineReader<R, P> {
    pub fn new(reader: R, parser: P) -> Self {
        Self {
            reader,
            parser,
            buffer: String::with_capacity(DEFAULT_LINE_BUFFER),
            line_number: 0,
            header: Vec::new(),
            header_read: false,
            pending: None,
        }
    }

    /// Read the next non-blank line, without its line terminator.
    fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let line = self.buffer.trim_end_matches(&['\n', '\r'][..]);
            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some((self.line_number, line.to_string())));
        }
    }

    fn read_header(&mut self) -> Result<()> {
        if self.header_read {
            return Ok(());
        }
        self.header_read = true;
        while let Some((line_number, line)) = self.next_line()? {
            if self.parser.is_header(&line) {
                self.header.push(line);
            } else {
                self.pending = Some((line_number, line));
                break;
            }
        }
        Ok(())
    }
}

impl<R: BufRead, P: LineParser> RecordReader for LineReader<R, P> {
    type Record = P::Record;

    fn header(&mut self) -> Result<&[String]> {
        self.read_header()?;
        Ok(&self.header)
    }

    fn read_record(&mut self) -> Result<Option<P::Record>> {
        self.read_header()?;
        let next = match self.pending.take() {
            Some(pending) => Some(pending),
            None => self.next_line()?,
        };
        match next {
            None => Ok(None),
            Some((line, text)) => self
                .parser
                .parse(&text)
                .map(Some)
                .map_err(|message| Error::Parse { line, message }),
        }
    }
}

/// Split a tab-delimited line, requiring at least `min` fields.
pub(crate) fn split_fields(line: &str, min: usize) -> std::result::Result<Vec<&str>, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < min {
        return Err(format!(
            "Expected at least {} fields, got {}",
            min,
            fields.len()
        ));
    }
    Ok(fields)
}

/// Parse a numeric column, naming it in the error message.
pub(crate) fn parse_field<T: std::str::FromStr>(
    value: &str,
    name: &str,
) -> std::result::Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid {}: '{}'", name, value))
}

/// Parse a column that uses `.` for a missing value.
pub(crate) fn parse_optional<T: std::str::FromStr>(
    value: &str,
    name: &str,
) -> std::result::Result<Option<T>, String> {
    if value == "." {
        Ok(None)
    } else {
        parse_field(value, name).map(Some)
    }
}

/// Write a float column. Integral values are written without a fraction.
pub(crate) fn write_float<W: Write + ?Sized>(out: &mut W, value: f64) -> io::Result<()> {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        out.write_all(itoa::Buffer::new().format(value as i64).as_bytes())
    } else {
        out.write_all(ryu::Buffer::new().format(value).as_bytes())
    }
}

/// Write an optional float column, `.` when absent.
pub(crate) fn write_optional_float<W: Write + ?Sized>(
    out: &mut W,
    value: Option<f64>,
) -> io::Result<()> {
    match value {
        Some(v) => write_float(out, v),
        None => out.write_all(b"."),
    }
}

/// Look up an optional `TAG:TYPE:VALUE` field as an expression value.
/// Integer and float types become numbers.
pub(crate) fn tag_value(tags: &[String], key: &str) -> Value {
    for tag in tags {
        let mut parts = tag.splitn(3, ':');
        if let (Some(name), Some(kind), Some(value)) = (parts.next(), parts.next(), parts.next()) {
            if name == key {
                return match kind {
                    "i" | "f" => Value::number(value),
                    _ => Value::text(value),
                };
            }
        }
    }
    Value::Missing
}

/// Write tab-prefixed columns.
pub(crate) fn write_columns<W: Write + ?Sized>(columns: &[String], out: &mut W) -> io::Result<()> {
    for column in columns {
        out.write_all(b"\t")?;
        out.write_all(column.as_bytes())?;
    }
    Ok(())
}

/// Read every record of `reader` into memory (useful for testing).
pub fn read_all<T: RecordReader>(reader: &mut T) -> Result<Vec<T::Record>> {
    let mut records = Vec::new();
    while let Some(record) = reader.read_record()? {
        records.push(record);
    }
    Ok(records)
}
