// Clippy allows for the whole crate
#![allow(clippy::should_implement_trait)]
#![allow(clippy::type_complexity)]

//! bioshed: streaming command line tools for bioinformatics file formats
//!
//! This library reads, filters, splits, renames and converts FASTA, FASTQ,
//! BED, VCF, GFF3, GFA1, GFA2, PAF, GAF and SAM records one at a time, with
//! transparent gzip, bzip2 and BGZF compression on both ends.
//!
//! # Features
//!
//! - **Streaming I/O**: one record in memory at a time
//! - **Compression sniffing**: inputs are decoded by magic bytes, outputs
//!   are encoded by file extension
//! - **Composable filters**: typed threshold, range and predicate filters
//!   plus a small expression language over named record fields
//!
//! # Example
//!
//! ```rust,no_run
//! use bioshed::commands::FilterCommand;
//! use bioshed::compression::{create_output, open_input};
//! use bioshed::formats::{fasta, FastaFormat};
//! use std::path::Path;
//!
//! let (input, _) = open_input(Some(Path::new("reads.fa.gz"))).unwrap();
//! let mut output = create_output(Some(Path::new("long.fa.gz"))).unwrap();
//!
//! let cmd = FilterCommand::new(FastaFormat::default()).with_filter(fasta::length_filter(100));
//! let stats = cmd.run(input, &mut output).unwrap();
//! output.finish().unwrap();
//! eprintln!("{}", stats);
//! ```

pub mod commands;
pub mod compression;
pub mod config;
pub mod counting;
pub mod error;
pub mod expr;
pub mod filter;
pub mod formats;
pub mod region;
pub mod rename;
pub mod split;

// Re-export commonly used types
pub use compression::{create_output, open_input, Compression};
pub use error::{Error, Result};
pub use filter::{Filter, FilterChain};
pub use formats::{Format, RecordReader};
pub use region::Interval;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{
        CompressCommand, DisinterleaveCommand, FastaToParquetCommand, FastqToFastaCommand,
        FilterCommand, InterleaveCommand, RenameReferencesCommand, SegmentsToFastaCommand,
        SplitCommand,
    };
    pub use crate::compression::{create_output, open_input, Compression};
    pub use crate::error::{Error, Result};
    pub use crate::filter::{ExpressionFilter, Filter, FilterChain};
    pub use crate::formats::{
        BedFormat, FastaFormat, FastqFormat, Format, GafFormat, Gff3Format, Gfa1Format,
        Gfa2Format, PafFormat, RecordReader, SamFormat, VcfFormat,
    };
    pub use crate::region::Interval;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_filter_workflow() {
        use crate::commands::FilterCommand;
        use crate::filter::ExpressionFilter;
        use crate::formats::{bed, BedFormat};

        let content = "#track\nchr1\t100\t200\ta\t10\nchr1\t150\t250\tb\t90\nchr2\t300\t400\tc\t50\n";
        let cmd = FilterCommand::new(BedFormat)
            .with_filter(bed::range_filter(vec!["chr1".parse().unwrap()]))
            .with_filter(ExpressionFilter::parse("score >= 50").unwrap());

        let mut out = Vec::new();
        let stats = cmd.run(content.as_bytes(), &mut out).unwrap();

        assert_eq!(stats.records_read, 3);
        assert_eq!(stats.records_written, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "#track\nchr1\t150\t250\tb\t90\n");
    }

    #[test]
    fn test_rename_then_split_workflow() {
        use crate::commands::{RenameReferencesCommand, SplitCommand};
        use crate::formats::VcfFormat;
        use crate::split::{FileNaming, SplitConfig};

        let vcf = "##fileformat=VCFv4.2\n\
##contig=<ID=1,length=100>\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
1\t10\t.\tA\tG\t50\tPASS\t.\n\
1\t20\t.\tC\tT\t50\tPASS\t.\n\
1\t30\t.\tG\tA\t50\tPASS\t.\n";

        let mut renamed = Vec::new();
        RenameReferencesCommand::new(VcfFormat, true)
            .unwrap()
            .run(vcf.as_bytes(), &mut renamed)
            .unwrap();
        let renamed = String::from_utf8(renamed).unwrap();
        assert!(renamed.contains("##contig=<ID=chr1,length=100>"));

        let dir = tempfile::tempdir().unwrap();
        let naming = FileNaming::new("calls", "vcf").with_directory(dir.path());
        let config = SplitConfig::new(naming).with_records(Some(2));
        let stats = SplitCommand::new(VcfFormat, config)
            .run(renamed.as_bytes())
            .unwrap();

        assert_eq!(stats.records, 3);
        assert_eq!(stats.files.len(), 2);
        let second = std::fs::read_to_string(&stats.files[1]).unwrap();
        assert!(second.starts_with("##fileformat=VCFv4.2\n"));
        assert!(second.ends_with("chr1\t30\t.\tG\tA\t50\tPASS\t.\n"));
    }
}
