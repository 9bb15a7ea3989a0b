//! Split command: distribute records across numbered files.

use crate::error::Result;
use crate::formats::{Format, RecordReader};
use crate::split::{SplitConfig, Splitter};
use log::info;
use std::fmt;
use std::fs;
use std::io::BufRead;
use std::path::PathBuf;

/// Split command configuration.
#[derive(Debug, Clone)]
pub struct SplitCommand<F: Format> {
    pub format: F,
    pub config: SplitConfig,
}

/// Split statistics.
#[derive(Debug, Clone, Default)]
pub struct SplitStats {
    pub records: u64,
    pub files: Vec<PathBuf>,
}

impl fmt::Display for SplitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Records: {}, Files: {}", self.records, self.files.len())
    }
}

impl<F: Format> SplitCommand<F> {
    pub fn new(format: F, config: SplitConfig) -> Self {
        Self { format, config }
    }

    /// Split `input`. Every output file starts with the input's header.
    pub fn run<R: BufRead>(self, input: R) -> Result<SplitStats> {
        if let Some(directory) = &self.config.naming.directory {
            fs::create_dir_all(directory)?;
        }

        let mut reader = self.format.reader(input);
        let header = reader.header()?.to_vec();
        let mut splitter = Splitter::new(self.format, self.config, header);

        while let Some(record) = reader.read_record()? {
            splitter.write(&record)?;
        }

        let stats = SplitStats {
            records: splitter.records(),
            files: splitter.finish(),
        };
        info!("split-{}: {}", F::NAME.to_ascii_lowercase(), stats);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{FastqFormat, Gff3Format};
    use crate::split::FileNaming;
    use tempfile::TempDir;

    #[test]
    fn test_split_fastq_into_subdirectory() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("parts");
        let input: String = (0..5)
            .map(|i| format!("@r{}\nACGT\n+\nIIII\n", i))
            .collect();

        let config = SplitConfig::new(
            FileNaming::new("reads.", "fq")
                .with_directory(&out_dir)
                .with_left_pad(3),
        )
        .with_records(Some(2));
        let stats = SplitCommand::new(FastqFormat, config)
            .run(input.as_bytes())
            .unwrap();

        assert_eq!(stats.records, 5);
        assert_eq!(
            stats.files,
            vec![
                out_dir.join("reads.000.fq"),
                out_dir.join("reads.001.fq"),
                out_dir.join("reads.002.fq"),
            ]
        );
        assert_eq!(
            fs::read_to_string(&stats.files[2]).unwrap(),
            "@r4\nACGT\n+\nIIII\n"
        );
    }

    #[test]
    fn test_split_gff3_keeps_fasta_section_whole() {
        let dir = TempDir::new().unwrap();
        let input = "##gff-version 3\n\
chr1\tsrc\tgene\t1\t10\t.\t+\t.\tID=g1\n\
###\n\
chr1\tsrc\tgene\t20\t30\t.\t+\t.\tID=g2\n\
chr1\tsrc\tgene\t40\t50\t.\t-\t.\tID=g3\n\
##FASTA\n\
>chr1\n\
ACGTACGT\n\
ACGT\n";

        let config = SplitConfig::new(FileNaming::new("x", "gff3").with_directory(dir.path()))
            .with_records(Some(2));
        let stats = SplitCommand::new(Gff3Format, config)
            .run(input.as_bytes())
            .unwrap();

        assert_eq!(stats.records, 3);
        assert_eq!(stats.files.len(), 2);
        assert_eq!(
            fs::read_to_string(&stats.files[0]).unwrap(),
            "##gff-version 3\n\
chr1\tsrc\tgene\t1\t10\t.\t+\t.\tID=g1\n\
###\n\
chr1\tsrc\tgene\t20\t30\t.\t+\t.\tID=g2\n"
        );
        assert_eq!(
            fs::read_to_string(&stats.files[1]).unwrap(),
            "##gff-version 3\n\
chr1\tsrc\tgene\t40\t50\t.\t-\t.\tID=g3\n\
##FASTA\n\
>chr1\n\
ACGTACGT\n\
ACGT\n"
        );
    }
}
