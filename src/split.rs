//! Splitting a record stream across numbered output files.
//!
//! A [`Splitter`] opens output files lazily: a full file is only closed
//! when the next split point arrives, so no empty trailing file is created
//! and lines attached to a record (see [`Format::is_split_point`]) stay
//! with it. A file is full once it holds `records` records or `bytes` bytes
//! (counted as written through the format writer, headers included). With
//! neither threshold every record goes to file 0.

use crate::compression::{create_output, Compression, OutputStream};
use crate::config::DEFAULT_SPLIT_PREFIX;
use crate::counting::CountingWriter;
use crate::error::Result;
use crate::formats::Format;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// How split output files are named: `<directory>/<prefix><index>.<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNaming {
    pub directory: Option<PathBuf>,
    pub prefix: String,
    pub suffix: String,
    /// Zero-pad the index to this many digits; 0 disables padding.
    pub left_pad: usize,
}

impl FileNaming {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            directory: None,
            prefix: prefix.into(),
            suffix: suffix.into(),
            left_pad: 0,
        }
    }

    /// Derive a prefix and suffix from the input.
    ///
    /// For a named input, the compression and format extensions are
    /// stripped from the file name: `reads.fq.gz` gives `reads.` and
    /// `fq.gz`. For standard input the prefix is `x` and the suffix is the
    /// canonical format extension plus the sniffed codec's extension.
    pub fn infer(input: Option<&Path>, sniffed: Compression, extensions: &[&str]) -> Self {
        let canonical = extensions.first().copied().unwrap_or("txt");

        let file_name = input
            .filter(|p| !crate::compression::is_stdio(p))
            .and_then(|p| p.file_name())
            .and_then(|name| name.to_str());

        match file_name {
            Some(name) => {
                let (name, compression) = Compression::strip_extension(name);
                let (stem, format_extension) = match name.rsplit_once('.') {
                    Some((stem, ext))
                        if !stem.is_empty()
                            && extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) =>
                    {
                        (stem, ext)
                    }
                    _ => (name, canonical),
                };
                let suffix = match compression {
                    Some(compression) => format!("{}.{}", format_extension, compression),
                    None => format_extension.to_string(),
                };
                Self::new(format!("{}.", stem), suffix)
            }
            None => {
                let suffix = match sniffed.extension() {
                    Some(compression) => format!("{}.{}", canonical, compression),
                    None => canonical.to_string(),
                };
                Self::new(DEFAULT_SPLIT_PREFIX, suffix)
            }
        }
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_left_pad(mut self, left_pad: usize) -> Self {
        self.left_pad = left_pad;
        self
    }

    /// Path of the file with the given index.
    pub fn path(&self, index: u64) -> PathBuf {
        let mut name = format!("{}{:0width$}", self.prefix, index, width = self.left_pad);
        if !self.suffix.is_empty() {
            name.push('.');
            name.push_str(&self.suffix);
        }
        match &self.directory {
            Some(directory) => directory.join(name),
            None => PathBuf::from(name),
        }
    }
}

/// Rollover thresholds and file naming.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub records: Option<u64>,
    pub bytes: Option<u64>,
    pub naming: FileNaming,
}

impl SplitConfig {
    pub fn new(naming: FileNaming) -> Self {
        Self {
            records: None,
            bytes: None,
            naming,
        }
    }

    pub fn with_records(mut self, records: Option<u64>) -> Self {
        self.records = records;
        self
    }

    pub fn with_bytes(mut self, bytes: Option<u64>) -> Self {
        self.bytes = bytes;
        self
    }

    #[inline]
    fn rolls_over(&self, records: u64, bytes: u64) -> bool {
        self.records.is_some_and(|limit| records >= limit)
            || self.bytes.is_some_and(|limit| bytes >= limit)
    }
}

/// The file currently being written.
struct ActiveFile {
    path: PathBuf,
    writer: CountingWriter<OutputStream>,
    records: u64,
}

/// Writes records of format `F` across numbered files.
pub struct Splitter<F: Format> {
    format: F,
    config: SplitConfig,
    header: Vec<String>,
    /// `None` between files (no active file).
    active: Option<ActiveFile>,
    next_index: u64,
    written: Vec<PathBuf>,
    records: u64,
}

impl<F: Format> Splitter<F> {
    /// `header` is repeated at the top of every output file.
    pub fn new(format: F, config: SplitConfig, header: Vec<String>) -> Self {
        Self {
            format,
            config,
            header,
            active: None,
            next_index: 0,
            written: Vec::new(),
            records: 0,
        }
    }

    fn open_next(&mut self) -> Result<ActiveFile> {
        let path = self.config.naming.path(self.next_index);
        self.next_index += 1;
        debug!("Opening split file {}", path.display());

        let mut writer = CountingWriter::new(create_output(Some(&path))?);
        self.format.write_header(&self.header, &mut writer)?;
        self.written.push(path.clone());
        Ok(ActiveFile {
            path,
            writer,
            records: 0,
        })
    }

    /// Finish a file. Failures are logged, not returned.
    fn close(file: ActiveFile) {
        let bytes = file.writer.count();
        match file.writer.into_inner().finish() {
            Ok(()) => info!(
                "Wrote {} records ({} bytes) to {}",
                file.records,
                bytes,
                file.path.display()
            ),
            Err(e) => warn!("Failed to close {}: {}", file.path.display(), e),
        }
    }

    /// Write one record, opening or rolling over files as needed.
    pub fn write(&mut self, record: &F::Record) -> Result<()> {
        let split_point = self.format.is_split_point(record);
        let full = self.active.as_ref().is_some_and(|file| {
            split_point && self.config.rolls_over(file.records, file.writer.count())
        });
        if full {
            if let Some(file) = self.active.take() {
                Self::close(file);
            }
        }

        let mut file = match self.active.take() {
            Some(file) => file,
            None => self.open_next()?,
        };
        self.format.write_record(record, &mut file.writer)?;
        if split_point {
            file.records += 1;
            self.records += 1;
        }
        self.active = Some(file);
        Ok(())
    }

    /// Split points written so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Close the open file, if any, and return every path written.
    pub fn finish(mut self) -> Vec<PathBuf> {
        if let Some(file) = self.active.take() {
            Self::close(file);
        }
        self.written
    }
}
