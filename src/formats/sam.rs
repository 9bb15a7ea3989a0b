//! SAM alignments.

use super::{parse_field, split_fields, tag_value, write_columns, Format, LineParser, LineReader, RenameReferences};
use crate::expr::{Fields, Value};
use crate::filter::{MissingField, PredicateFilter, RangeFilter, Span, ThresholdFilter};
use crate::region::Interval;
use crate::rename::ReferenceRenamer;
use std::io::{self, BufRead, Write};

/// Segment unmapped.
pub const FLAG_UNMAPPED: u16 = 0x4;

const MAPQ_MISSING: u8 = 255;

/// A SAM alignment line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamRecord {
    pub qname: String,
    pub flag: u16,
    pub rname: String,
    /// 1-based leftmost position, 0 when unavailable.
    pub pos: u64,
    pub mapq: u8,
    pub cigar: String,
    pub rnext: String,
    pub pnext: u64,
    pub tlen: i64,
    pub seq: String,
    pub qual: String,
    pub tags: Vec<String>,
}

impl SamRecord {
    #[inline]
    pub fn is_unmapped(&self) -> bool {
        self.flag & FLAG_UNMAPPED != 0
    }

    /// Number of reference bases covered by the CIGAR string.
    pub fn reference_length(&self) -> Option<u64> {
        cigar_reference_length(&self.cigar)
    }

    /// 0-based half-open span on the reference; `None` for unplaced reads.
    pub fn span(&self) -> Option<(u64, u64)> {
        if self.is_unmapped() || self.rname == "*" || self.pos == 0 {
            return None;
        }
        let start = self.pos - 1;
        Some((start, start + self.reference_length().unwrap_or(0)))
    }

    /// Mapping quality, `None` when 255.
    pub fn mapping_quality(&self) -> Option<u8> {
        (self.mapq != MAPQ_MISSING).then_some(self.mapq)
    }
}

/// Sum the lengths of reference-consuming CIGAR operations (`M D N = X`).
/// Returns `None` for `*` or a malformed string.
pub fn cigar_reference_length(cigar: &str) -> Option<u64> {
    if cigar == "*" {
        return None;
    }
    let mut total = 0u64;
    let mut length: Option<u64> = None;
    for &b in cigar.as_bytes() {
        match b {
            b'0'..=b'9' => {
                let digit = u64::from(b - b'0');
                length = Some(length.unwrap_or(0).checked_mul(10)?.checked_add(digit)?);
            }
            b'M' | b'D' | b'N' | b'=' | b'X' => total += length.take()?,
            b'I' | b'S' | b'H' | b'P' => {
                length.take()?;
            }
            _ => return None,
        }
    }
    match length {
        None => Some(total),
        Some(_) => None,
    }
}

impl Fields for SamRecord {
    fn field(&self, name: &str) -> Option<Value> {
        if let Some(key) = name.strip_prefix("tags.") {
            return Some(tag_value(&self.tags, key));
        }
        Some(match name {
            "qname" => Value::text(&self.qname),
            "flag" => Value::Number(f64::from(self.flag)),
            "rname" => Value::text(&self.rname),
            "pos" => Value::Number(self.pos as f64),
            "mapq" => self
                .mapping_quality()
                .map_or(Value::Missing, |q| Value::Number(f64::from(q))),
            "cigar" => Value::text(&self.cigar),
            "rnext" => Value::text(&self.rnext),
            "pnext" => Value::Number(self.pnext as f64),
            "tlen" => Value::Number(self.tlen as f64),
            "seq" => Value::text(&self.seq),
            "qual" => Value::text(&self.qual),
            _ => return None,
        })
    }
}

/// Line parser for SAM.
#[derive(Debug, Default)]
pub struct SamParser;

impl LineParser for SamParser {
    type Record = SamRecord;

    fn is_header(&self, line: &str) -> bool {
        line.starts_with('@')
    }

    fn parse(&mut self, line: &str) -> Result<SamRecord, String> {
        let fields = split_fields(line, 11)?;
        Ok(SamRecord {
            qname: fields[0].to_string(),
            flag: parse_field(fields[1], "flag")?,
            rname: fields[2].to_string(),
            pos: parse_field(fields[3], "position")?,
            mapq: parse_field(fields[4], "mapping quality")?,
            cigar: fields[5].to_string(),
            rnext: fields[6].to_string(),
            pnext: parse_field(fields[7], "mate position")?,
            tlen: parse_field(fields[8], "template length")?,
            seq: fields[9].to_string(),
            qual: fields[10].to_string(),
            tags: fields[11..].iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// The SAM format.
#[derive(Debug, Clone, Copy, Default)]
pub struct SamFormat;

impl Format for SamFormat {
    type Record = SamRecord;
    type Reader<R: BufRead> = LineReader<R, SamParser>;

    const NAME: &'static str = "SAM";
    const EXTENSIONS: &'static [&'static str] = &["sam"];

    fn reader<R: BufRead>(&self, input: R) -> Self::Reader<R> {
        LineReader::new(input, SamParser)
    }

    fn write_record<W: Write + ?Sized>(&self, r: &SamRecord, out: &mut W) -> io::Result<()> {
        let mut buf = itoa::Buffer::new();
        out.write_all(r.qname.as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(buf.format(r.flag).as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(r.rname.as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(buf.format(r.pos).as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(buf.format(r.mapq).as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(r.cigar.as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(r.rnext.as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(buf.format(r.pnext).as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(buf.format(r.tlen).as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(r.seq.as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(r.qual.as_bytes())?;
        write_columns(&r.tags, out)?;
        out.write_all(b"\n")
    }
}

impl RenameReferences for SamFormat {
    /// Renames the `SN` field of `@SQ` lines.
    fn rename_header_line(&self, line: &str, renamer: &ReferenceRenamer) -> String {
        if !line.starts_with("@SQ\t") {
            return line.to_string();
        }
        line.split('\t')
            .map(|field| match field.strip_prefix("SN:") {
                Some(name) => format!("SN:{}", renamer.rename_str(name)),
                None => field.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\t")
    }

    fn rename_record(&self, record: &mut SamRecord, renamer: &ReferenceRenamer) {
        if record.rname != "*" {
            record.rname = renamer.rename_str(&record.rname);
        }
        if record.rnext != "*" && record.rnext != "=" {
            record.rnext = renamer.rename_str(&record.rnext);
        }
    }
}

fn locate(record: &SamRecord) -> Option<Span<'_>> {
    record
        .span()
        .map(|(start, end)| (record.rname.as_str(), start, end))
}

/// Keep alignments overlapping any of `regions`; unplaced reads are dropped.
pub fn range_filter(regions: Vec<Interval>) -> RangeFilter<SamRecord> {
    RangeFilter::new(regions, locate, MissingField::Reject)
}

/// Keep alignments with mapping quality of at least `min`; 255 is dropped.
pub fn mapping_quality_filter(min: u8) -> ThresholdFilter<SamRecord> {
    ThresholdFilter::new(
        "mapping_quality",
        f64::from(min),
        |r| r.mapping_quality().map(f64::from),
        MissingField::Reject,
    )
}

/// Drop alignments with any of the `mask` flag bits set.
pub fn exclude_flags_filter(mask: u16) -> PredicateFilter<SamRecord> {
    PredicateFilter::new("exclude_flags", move |r: &SamRecord| r.flag & mask == 0)
}
