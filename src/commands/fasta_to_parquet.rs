//! Export FASTA records to Parquet.
//!
//! Schema: `name: Utf8, sequence: Utf8, length: Int64, alphabet: Utf8`.
//! Rows are buffered into Arrow record batches of `row_group_size` rows,
//! each written as one row group. With a partition size, records are spread
//! over `part-<start>-<end>.parquet` files in an output directory, where
//! `start` is the index of the first record and `end` is one past the last.

use crate::config::DEFAULT_ROW_GROUP_SIZE;
use crate::error::{Error, Result};
use crate::formats::{FastaFormat, FastaRecord, Format, RecordReader};
use arrow::array::{ArrayRef, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use log::{debug, info};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression as ParquetCompression;
use parquet::file::properties::WriterProperties;
use std::fmt;
use std::fs::{self, File};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Sequence alphabet recorded in the `alphabet` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alphabet {
    #[default]
    Dna,
    Protein,
}

impl Alphabet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alphabet::Dna => "dna",
            Alphabet::Protein => "protein",
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alphabet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dna" => Ok(Alphabet::Dna),
            "protein" => Ok(Alphabet::Protein),
            _ => Err(Error::argument(format!(
                "Invalid alphabet '{}': expected dna or protein",
                s
            ))),
        }
    }
}

/// FASTA to Parquet configuration.
#[derive(Debug, Clone)]
pub struct FastaToParquetConfig {
    pub alphabet: Alphabet,
    pub row_group_size: usize,
    /// Records per output file; `None` writes a single file.
    pub partition_size: Option<u64>,
}

impl Default for FastaToParquetConfig {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::Dna,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            partition_size: None,
        }
    }
}

impl FastaToParquetConfig {
    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    pub fn with_row_group_size(mut self, row_group_size: usize) -> Self {
        self.row_group_size = row_group_size;
        self
    }

    pub fn with_partition_size(mut self, partition_size: Option<u64>) -> Self {
        self.partition_size = partition_size;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.row_group_size == 0 {
            return Err(Error::argument("--row-group-size must be greater than 0"));
        }
        if self.partition_size == Some(0) {
            return Err(Error::argument("--partition-size must be greater than 0"));
        }
        Ok(())
    }
}

/// Export statistics.
#[derive(Debug, Clone, Default)]
pub struct ParquetStats {
    pub records: u64,
    pub files: Vec<PathBuf>,
}

impl fmt::Display for ParquetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Records: {}, Files: {}", self.records, self.files.len())
    }
}

/// Arrow schema of the exported table.
pub fn fasta_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("sequence", DataType::Utf8, false),
        Field::new("length", DataType::Int64, false),
        Field::new("alphabet", DataType::Utf8, false),
    ]))
}

/// Column builders for one record batch.
struct BatchBuilder {
    schema: SchemaRef,
    names: StringBuilder,
    sequences: StringBuilder,
    lengths: Int64Builder,
    alphabets: StringBuilder,
    rows: usize,
}

impl BatchBuilder {
    fn new(schema: SchemaRef) -> Self {
        Self {
            schema,
            names: StringBuilder::new(),
            sequences: StringBuilder::new(),
            lengths: Int64Builder::new(),
            alphabets: StringBuilder::new(),
            rows: 0,
        }
    }

    fn append(&mut self, record: &FastaRecord, alphabet: Alphabet) {
        self.names.append_value(&record.name);
        self.sequences.append_value(&record.sequence);
        self.lengths.append_value(record.len() as i64);
        self.alphabets.append_value(alphabet.as_str());
        self.rows += 1;
    }

    /// Take the buffered rows as a batch, resetting the builders.
    fn finish(&mut self) -> Result<RecordBatch> {
        self.rows = 0;
        let columns: Vec<ArrayRef> = vec![
            Arc::new(self.names.finish()) as ArrayRef,
            Arc::new(self.sequences.finish()) as ArrayRef,
            Arc::new(self.lengths.finish()) as ArrayRef,
            Arc::new(self.alphabets.finish()) as ArrayRef,
        ];
        Ok(RecordBatch::try_new(self.schema.clone(), columns)?)
    }
}

/// An open Parquet file and where it ends up once closed.
struct ParquetFile {
    writer: ArrowWriter<File>,
    path: PathBuf,
    start: u64,
}

/// FASTA to Parquet command.
#[derive(Debug, Clone, Default)]
pub struct FastaToParquetCommand {
    pub config: FastaToParquetConfig,
}

impl FastaToParquetCommand {
    pub fn new(config: FastaToParquetConfig) -> Self {
        Self { config }
    }

    fn properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_max_row_group_size(self.config.row_group_size)
            .set_compression(ParquetCompression::SNAPPY)
            .build()
    }

    fn open(&self, path: PathBuf, start: u64, schema: &SchemaRef) -> Result<ParquetFile> {
        debug!("Opening {}", path.display());
        let file = File::create(&path)?;
        let writer = ArrowWriter::try_new(file, schema.clone(), Some(self.properties()))?;
        Ok(ParquetFile {
            writer,
            path,
            start,
        })
    }

    /// Write the footer. Partitions are renamed to their final
    /// `part-<start>-<end>.parquet` name here.
    fn close(&self, file: ParquetFile, end: u64, directory: Option<&Path>) -> Result<PathBuf> {
        file.writer.close()?;
        let path = match directory {
            Some(directory) => {
                let path = directory.join(format!("part-{}-{}.parquet", file.start, end));
                fs::rename(&file.path, &path)?;
                path
            }
            None => file.path,
        };
        info!(
            "Wrote {} records to {}",
            end - file.start,
            path.display()
        );
        Ok(path)
    }

    /// Export `input`. `output` is a file, or a directory when partitioning.
    pub fn run<R: BufRead>(&self, input: R, output: &Path) -> Result<ParquetStats> {
        self.config.validate()?;
        let schema = fasta_schema();
        let directory = match self.config.partition_size {
            Some(_) => {
                fs::create_dir_all(output)?;
                Some(output)
            }
            None => None,
        };

        let mut reader = FastaFormat::default().reader(input);
        let mut batch = BatchBuilder::new(schema.clone());
        let mut stats = ParquetStats::default();
        let mut current = match directory {
            None => Some(self.open(output.to_path_buf(), 0, &schema)?),
            Some(_) => None,
        };

        while let Some(record) = reader.read_record()? {
            let mut file = match current.take() {
                Some(file) => file,
                None => {
                    let path = output.join(format!(".part-{}.parquet.tmp", stats.records));
                    self.open(path, stats.records, &schema)?
                }
            };

            batch.append(&record, self.config.alphabet);
            stats.records += 1;

            let partition_full = self
                .config
                .partition_size
                .is_some_and(|size| stats.records - file.start >= size);
            if batch.rows >= self.config.row_group_size || partition_full {
                file.writer.write(&batch.finish()?)?;
            }
            if partition_full {
                stats.files.push(self.close(file, stats.records, directory)?);
            } else {
                current = Some(file);
            }
        }

        if let Some(mut file) = current {
            if batch.rows > 0 {
                file.writer.write(&batch.finish()?)?;
            }
            stats.files.push(self.close(file, stats.records, directory)?);
        }

        info!("fasta-to-parquet: {}", stats);
        Ok(stats)
    }
}
