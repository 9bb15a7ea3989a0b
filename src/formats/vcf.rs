//! VCF variant lines.
//!
//! Columns are kept as text and parsed on access, so records are written
//! back exactly as read apart from renamed references.

use super::{parse_field, parse_optional, split_fields, Format, LineParser, LineReader, RenameReferences};
use crate::expr::{Fields, Value};
use crate::filter::{MissingField, PredicateFilter, RangeFilter, Span, ThresholdFilter};
use crate::region::Interval;
use crate::rename::ReferenceRenamer;
use rustc_hash::FxHashSet;
use std::io::{self, BufRead, Write};

/// A VCF data line.
#[derive(Debug, Clone, PartialEq)]
pub struct VcfRecord {
    pub chrom: String,
    /// 1-based position.
    pub pos: u64,
    pub id: String,
    pub reference: String,
    pub alternate: String,
    pub qual: Option<f64>,
    qual_text: String,
    pub filter: String,
    pub info: String,
    /// FORMAT and sample columns, verbatim.
    pub samples: Vec<String>,
}

impl VcfRecord {
    /// 0-based half-open span covered by the reference allele.
    pub fn span(&self) -> (u64, u64) {
        let start = self.pos.saturating_sub(1);
        (start, start + self.reference.len() as u64)
    }

    /// Identifiers in the ID column, none when `.`.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.id.split(';').filter(|id| !id.is_empty() && *id != ".")
    }

    /// True unless the FILTER column names a failed filter.
    pub fn is_passing(&self) -> bool {
        self.filter == "PASS" || self.filter == "."
    }

    /// Look up an INFO entry. Flags yield `Some(None)`.
    pub fn info_value(&self, key: &str) -> Option<Option<&str>> {
        if self.info == "." {
            return None;
        }
        self.info.split(';').find_map(|entry| match entry.split_once('=') {
            Some((k, v)) if k == key => Some(Some(v)),
            None if entry == key => Some(None),
            _ => None,
        })
    }
}

impl Fields for VcfRecord {
    fn field(&self, name: &str) -> Option<Value> {
        if let Some(key) = name.strip_prefix("info.") {
            return Some(match self.info_value(key) {
                Some(Some(value)) => Value::number(value),
                Some(None) => Value::Bool(true),
                None => Value::Missing,
            });
        }
        Some(match name {
            "chrom" => Value::text(&self.chrom),
            "pos" => Value::Number(self.pos as f64),
            "id" => Value::text(&self.id),
            "ref" => Value::text(&self.reference),
            "alt" => Value::text(&self.alternate),
            "qual" => self.qual.map_or(Value::Missing, Value::Number),
            "filter" => Value::text(&self.filter),
            "info" => Value::text(&self.info),
            _ => return None,
        })
    }
}

/// Line parser for VCF data lines.
#[derive(Debug, Default)]
pub struct VcfParser;

impl LineParser for VcfParser {
    type Record = VcfRecord;

    fn is_header(&self, line: &str) -> bool {
        line.starts_with('#')
    }

    fn parse(&mut self, line: &str) -> Result<VcfRecord, String> {
        let fields = split_fields(line, 8)?;
        Ok(VcfRecord {
            chrom: fields[0].to_string(),
            pos: parse_field(fields[1], "position")?,
            id: fields[2].to_string(),
            reference: fields[3].to_string(),
            alternate: fields[4].to_string(),
            qual: parse_optional(fields[5], "quality")?,
            qual_text: fields[5].to_string(),
            filter: fields[6].to_string(),
            info: fields[7].to_string(),
            samples: fields[8..].iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// The VCF format.
#[derive(Debug, Clone, Copy, Default)]
pub struct VcfFormat;

impl Format for VcfFormat {
    type Record = VcfRecord;
    type Reader<R: BufRead> = LineReader<R, VcfParser>;

    const NAME: &'static str = "VCF";
    const EXTENSIONS: &'static [&'static str] = &["vcf"];

    fn reader<R: BufRead>(&self, input: R) -> Self::Reader<R> {
        LineReader::new(input, VcfParser)
    }

    fn write_record<W: Write + ?Sized>(&self, record: &VcfRecord, out: &mut W) -> io::Result<()> {
        let mut buf = itoa::Buffer::new();
        out.write_all(record.chrom.as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(buf.format(record.pos).as_bytes())?;
        for column in [
            &record.id,
            &record.reference,
            &record.alternate,
            &record.qual_text,
            &record.filter,
            &record.info,
        ] {
            out.write_all(b"\t")?;
            out.write_all(column.as_bytes())?;
        }
        for sample in &record.samples {
            out.write_all(b"\t")?;
            out.write_all(sample.as_bytes())?;
        }
        out.write_all(b"\n")
    }
}

impl RenameReferences for VcfFormat {
    /// Renames `##contig=<ID=...>` lines.
    fn rename_header_line(&self, line: &str, renamer: &ReferenceRenamer) -> String {
        const CONTIG: &str = "##contig=<ID=";
        let Some(rest) = line.strip_prefix(CONTIG) else {
            return line.to_string();
        };
        let end = rest.find([',', '>']).unwrap_or(rest.len());
        format!(
            "{}{}{}",
            CONTIG,
            renamer.rename_str(&rest[..end]),
            &rest[end..]
        )
    }

    fn rename_record(&self, record: &mut VcfRecord, renamer: &ReferenceRenamer) {
        record.chrom = renamer.rename_str(&record.chrom);
    }
}

fn locate(record: &VcfRecord) -> Option<Span<'_>> {
    let (start, end) = record.span();
    Some((record.chrom.as_str(), start, end))
}

/// Keep variants overlapping any of `regions`.
pub fn range_filter(regions: Vec<Interval>) -> RangeFilter<VcfRecord> {
    RangeFilter::new(regions, locate, MissingField::Reject)
}

/// Keep variants with QUAL of at least `min`; `.` is dropped.
pub fn quality_filter(min: f64) -> ThresholdFilter<VcfRecord> {
    ThresholdFilter::new("qual", min, |r| r.qual, MissingField::Reject)
}

/// Keep variants whose FILTER is `PASS` (or `.`).
pub fn passing_filter() -> PredicateFilter<VcfRecord> {
    PredicateFilter::new("passing", VcfRecord::is_passing)
}

/// Keep variants carrying any of `ids`.
pub fn id_filter(ids: Vec<String>) -> PredicateFilter<VcfRecord> {
    let ids: FxHashSet<String> = ids.into_iter().collect();
    PredicateFilter::new("id", move |r: &VcfRecord| r.ids().any(|id| ids.contains(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::formats::{read_all, RecordReader};

    const VCF: &str = "##fileformat=VCFv4.3\n\
##contig=<ID=chr1,length=248956422>\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
chr1\t100\trs1\tA\tG\t50\tPASS\tDP=10;DB\tGT\t0/1\n\
chr1\t200\t.\tACG\tA\t.\tq10\tDP=3\tGT\t1/1\n";

    fn records() -> Vec<VcfRecord> {
        read_all(&mut VcfFormat.reader(VCF.as_bytes())).unwrap()
    }

    #[test]
    fn test_parse_and_write_verbatim() {
        let mut reader = VcfFormat.reader(VCF.as_bytes());
        assert_eq!(reader.header().unwrap().len(), 3);
        let records = read_all(&mut reader).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].qual, None);
        assert_eq!(records[1].span(), (199, 202));

        let mut out = Vec::new();
        for record in &records {
            VcfFormat.write_record(record, &mut out).unwrap();
        }
        let body: String = VCF.lines().skip(3).map(|l| format!("{}\n", l)).collect();
        assert_eq!(String::from_utf8(out).unwrap(), body);
    }

    #[test]
    fn test_info_fields() {
        let records = records();
        assert_eq!(records[0].field("info.DP"), Some(Value::Number(10.0)));
        assert_eq!(records[0].field("info.DB"), Some(Value::Bool(true)));
        assert_eq!(records[1].field("info.DB"), Some(Value::Missing));
        assert_eq!(records[1].field("qual"), Some(Value::Missing));
        assert_eq!(records[1].field("bogus"), None);
    }

    #[test]
    fn test_filters() {
        let records = records();
        let qual = quality_filter(20.0);
        assert!(qual.accept(&records[0]).unwrap());
        assert!(!qual.accept(&records[1]).unwrap());

        let passing = passing_filter();
        assert!(passing.accept(&records[0]).unwrap());
        assert!(!passing.accept(&records[1]).unwrap());

        let ids = id_filter(vec!["rs1".to_string(), "rs2".to_string()]);
        assert!(ids.accept(&records[0]).unwrap());
        assert!(!ids.accept(&records[1]).unwrap());

        let range = range_filter(vec!["chr1:150-201".parse().unwrap()]);
        assert!(!range.accept(&records[0]).unwrap());
        assert!(range.accept(&records[1]).unwrap());
    }

    #[test]
    fn test_rename_header_and_records() {
        let renamer = ReferenceRenamer::new(false).unwrap();
        assert_eq!(
            VcfFormat.rename_header_line("##contig=<ID=chr1,length=248956422>", &renamer),
            "##contig=<ID=1,length=248956422>"
        );
        assert_eq!(
            VcfFormat.rename_header_line("##contig=<ID=chrM>", &renamer),
            "##contig=<ID=MT>"
        );
        assert_eq!(
            VcfFormat.rename_header_line("##fileformat=VCFv4.3", &renamer),
            "##fileformat=VCFv4.3"
        );

        let mut record = records().remove(0);
        VcfFormat.rename_record(&mut record, &renamer);
        assert_eq!(record.chrom, "1");
    }
}
