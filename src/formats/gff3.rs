//! GFF3 features, directives and the trailing `##FASTA` section.

use super::fasta::FastaRecord;
use super::{parse_field, parse_optional, split_fields, Format, LineParser, LineReader, RenameReferences};
use crate::expr::{Fields, Value};
use crate::filter::{Filter, MissingField, PredicateFilter, ProjectedFilter, RangeFilter, Span, ThresholdFilter};
use crate::region::Interval;
use crate::rename::ReferenceRenamer;
use rustc_hash::FxHashSet;
use std::io::{self, BufRead, Write};

const FASTA_DIRECTIVE: &str = "##FASTA";
const SEQUENCE_REGION: &str = "##sequence-region";

/// A GFF3 feature line. Text columns are kept as read.
#[derive(Debug, Clone, PartialEq)]
pub struct Gff3Feature {
    pub seqid: String,
    pub source: String,
    pub feature_type: String,
    /// 1-based inclusive start.
    pub start: u64,
    /// 1-based inclusive end.
    pub end: u64,
    pub score: Option<f64>,
    score_text: String,
    pub strand: String,
    pub phase: String,
    pub attributes: String,
}

impl Gff3Feature {
    /// Look up an attribute value (still percent-encoded).
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

impl Fields for Gff3Feature {
    fn field(&self, name: &str) -> Option<Value> {
        if let Some(key) = name.strip_prefix("attributes.") {
            return Some(self.attribute(key).map_or(Value::Missing, Value::number));
        }
        Some(match name {
            "seqid" => Value::text(&self.seqid),
            "source" => Value::text(&self.source),
            "type" => Value::text(&self.feature_type),
            "start" => Value::Number(self.start as f64),
            "end" => Value::Number(self.end as f64),
            "length" => Value::Number((self.end + 1).saturating_sub(self.start) as f64),
            "score" => self.score.map_or(Value::Missing, Value::Number),
            "strand" => Value::text(&self.strand),
            "phase" => Value::text(&self.phase),
            "attributes" => Value::text(&self.attributes),
            _ => return None,
        })
    }
}

/// One line of a GFF3 file after the leading header.
#[derive(Debug, Clone, PartialEq)]
pub enum Gff3Record {
    Feature(Gff3Feature),
    /// A comment or directive, including `###` and `##FASTA`.
    Directive(String),
    /// A line inside the `##FASTA` section.
    Sequence(String),
}

impl Gff3Record {
    pub fn as_feature(&self) -> Option<&Gff3Feature> {
        match self {
            Gff3Record::Feature(feature) => Some(feature),
            _ => None,
        }
    }
}

/// Line parser for GFF3. Switches to sequence lines after `##FASTA`.
#[derive(Debug, Default)]
pub struct Gff3Parser {
    in_fasta: bool,
}

impl LineParser for Gff3Parser {
    type Record = Gff3Record;

    fn is_header(&self, line: &str) -> bool {
        line.starts_with('#') && line != FASTA_DIRECTIVE
    }

    fn parse(&mut self, line: &str) -> Result<Gff3Record, String> {
        if self.in_fasta {
            return Ok(Gff3Record::Sequence(line.to_string()));
        }
        if line.starts_with('#') {
            if line == FASTA_DIRECTIVE {
                self.in_fasta = true;
            }
            return Ok(Gff3Record::Directive(line.to_string()));
        }

        let fields = split_fields(line, 9)?;
        let start: u64 = parse_field(fields[3], "start position")?;
        let end: u64 = parse_field(fields[4], "end position")?;
        if start > end {
            return Err(format!("Start ({}) > end ({})", start, end));
        }
        Ok(Gff3Record::Feature(Gff3Feature {
            seqid: fields[0].to_string(),
            source: fields[1].to_string(),
            feature_type: fields[2].to_string(),
            start,
            end,
            score: parse_optional(fields[5], "score")?,
            score_text: fields[5].to_string(),
            strand: fields[6].to_string(),
            phase: fields[7].to_string(),
            attributes: fields[8..].join("\t"),
        }))
    }
}

/// The GFF3 format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gff3Format;

impl Format for Gff3Format {
    type Record = Gff3Record;
    type Reader<R: BufRead> = LineReader<R, Gff3Parser>;

    const NAME: &'static str = "GFF3";
    const EXTENSIONS: &'static [&'static str] = &["gff3", "gff"];

    fn reader<R: BufRead>(&self, input: R) -> Self::Reader<R> {
        LineReader::new(input, Gff3Parser::default())
    }

    /// Only features split; directives and the `##FASTA` section follow
    /// the feature before them.
    fn is_split_point(&self, record: &Gff3Record) -> bool {
        matches!(record, Gff3Record::Feature(_))
    }

    fn write_record<W: Write + ?Sized>(&self, record: &Gff3Record, out: &mut W) -> io::Result<()> {
        match record {
            Gff3Record::Feature(f) => {
                let mut buf = itoa::Buffer::new();
                for column in [&f.seqid, &f.source, &f.feature_type] {
                    out.write_all(column.as_bytes())?;
                    out.write_all(b"\t")?;
                }
                out.write_all(buf.format(f.start).as_bytes())?;
                out.write_all(b"\t")?;
                out.write_all(buf.format(f.end).as_bytes())?;
                for column in [&f.score_text, &f.strand, &f.phase, &f.attributes] {
                    out.write_all(b"\t")?;
                    out.write_all(column.as_bytes())?;
                }
            }
            Gff3Record::Directive(line) | Gff3Record::Sequence(line) => {
                out.write_all(line.as_bytes())?;
            }
        }
        out.write_all(b"\n")
    }
}

impl RenameReferences for Gff3Format {
    /// Renames the seqid of `##sequence-region` directives.
    fn rename_header_line(&self, line: &str, renamer: &ReferenceRenamer) -> String {
        let Some(rest) = line.strip_prefix(SEQUENCE_REGION) else {
            return line.to_string();
        };
        let mut parts = rest.split_whitespace();
        match parts.next() {
            Some(seqid) => {
                let mut renamed = format!("{} {}", SEQUENCE_REGION, renamer.rename_str(seqid));
                for part in parts {
                    renamed.push(' ');
                    renamed.push_str(part);
                }
                renamed
            }
            None => line.to_string(),
        }
    }

    fn rename_record(&self, record: &mut Gff3Record, renamer: &ReferenceRenamer) {
        match record {
            Gff3Record::Feature(feature) => feature.seqid = renamer.rename_str(&feature.seqid),
            Gff3Record::Directive(line) => *line = self.rename_header_line(line, renamer),
            Gff3Record::Sequence(line) => {
                if let Some(definition) = line.strip_prefix('>') {
                    let (name, separator, description) = FastaRecord::split_definition(definition);
                    let mut renamed = format!(">{}", renamer.rename_str(&name));
                    if let Some(description) = description {
                        renamed.push(char::from(separator));
                        renamed.push_str(&description);
                    }
                    *line = renamed;
                }
            }
        }
    }
}

fn feature_of(record: &Gff3Record) -> Option<&Gff3Feature> {
    record.as_feature()
}

fn locate(feature: &Gff3Feature) -> Option<Span<'_>> {
    Some((
        feature.seqid.as_str(),
        feature.start.saturating_sub(1),
        feature.end,
    ))
}

/// Restrict a feature filter to feature lines; everything else passes.
pub fn for_features(filter: impl Filter<Gff3Feature> + 'static) -> ProjectedFilter<Gff3Record, Gff3Feature> {
    ProjectedFilter::new(filter, feature_of)
}

/// Keep features overlapping any of `regions`.
pub fn range_filter(regions: Vec<Interval>) -> ProjectedFilter<Gff3Record, Gff3Feature> {
    for_features(RangeFilter::new(regions, locate, MissingField::Reject))
}

/// Keep features scoring at least `min`; features without a score are kept.
pub fn score_filter(min: f64) -> ProjectedFilter<Gff3Record, Gff3Feature> {
    for_features(ThresholdFilter::new(
        "score",
        min,
        |f: &Gff3Feature| f.score,
        MissingField::Accept,
    ))
}

/// Keep features whose type is one of `types`.
pub fn type_filter(types: Vec<String>) -> ProjectedFilter<Gff3Record, Gff3Feature> {
    let types: FxHashSet<String> = types.into_iter().collect();
    for_features(PredicateFilter::new("types", move |f: &Gff3Feature| {
        types.contains(&f.feature_type)
    }))
}
