//! bioshed: streaming command line tools for bioinformatics file formats
//!
//! Usage: bioshed <COMMAND> [OPTIONS]

use clap::error::ErrorKind;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use bioshed::commands::{
    Alphabet, CompressCommand, DisinterleaveCommand, FastaToParquetCommand, FastaToParquetConfig,
    FastqToFastaCommand, FilterCommand, InterleaveCommand, RenameReferencesCommand,
    SegmentsToFastaCommand, SplitCommand,
};
use bioshed::compression::{create_output, open_input};
use bioshed::config;
use bioshed::error::Result;
use bioshed::filter::{ExpressionFilter, FilterChain};
use bioshed::formats::{
    bed, fasta, fastq, gaf, gfa1, gfa2, gff3, paf, sam, vcf, BedFormat, BedRecord, FastaFormat,
    FastaRecord, FastqFormat, FastqRecord, Format, GafFormat, GafRecord, Gff3Format, Gff3Record,
    Gfa1Format, Gfa1Record, Gfa2Format, Gfa2Record, PafFormat, PafRecord, RenameReferences, SamFormat, SegmentSequences, SamRecord,
    VcfFormat, VcfRecord,
};
use bioshed::region::Interval;
use bioshed::split::{FileNaming, SplitConfig};

#[derive(Parser)]
#[command(name = "bioshed")]
#[command(version)]
#[command(about = "Streaming tools for FASTA, FASTQ, BED, VCF, GFF3, GFA1, GFA2, PAF, GAF and SAM files", long_about = None)]
struct Cli {
    /// Print a name and version banner and exit
    #[arg(short = 'a', long, global = true)]
    about: bool,

    /// Increase logging verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Input and output paths; `-` or absent means standard input/output.
#[derive(Args)]
struct IoArgs {
    /// Input file, optionally gzip, bzip2 or BGZF compressed [default: stdin]
    #[arg(short = 'i', long = "input-path")]
    input: Option<PathBuf>,

    /// Output file, compressed according to its extension [default: stdout]
    #[arg(short = 'o', long = "output-path")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct LineWidthArgs {
    /// FASTA sequence line width (0 disables wrapping)
    #[arg(long, default_value_t = config::DEFAULT_LINE_WIDTH)]
    line_width: usize,
}

impl LineWidthArgs {
    fn format(&self) -> FastaFormat {
        FastaFormat::with_line_width(self.line_width)
    }
}

#[derive(Args)]
struct SplitArgs {
    /// Input file [default: stdin]
    #[arg(short = 'i', long = "input-path")]
    input: Option<PathBuf>,

    /// Start a new file after this many records
    #[arg(short = 'r', long)]
    records: Option<u64>,

    /// Start a new file once this many bytes have been written
    #[arg(short = 'b', long)]
    bytes: Option<u64>,

    /// Output file name prefix [default: input file stem, or "x"]
    #[arg(short = 'p', long)]
    prefix: Option<String>,

    /// Output file name suffix [default: input extensions]
    #[arg(short = 's', long)]
    suffix: Option<String>,

    /// Zero-pad file indexes to this many digits
    #[arg(short = 'l', long, default_value_t = 0)]
    left_pad: usize,

    /// Directory for the output files
    #[arg(short = 'd', long)]
    directory: Option<PathBuf>,
}

#[derive(Args)]
struct RenameArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Add a "chr" prefix instead of removing it
    #[arg(long)]
    chr: bool,
}

#[derive(Args)]
struct ScriptArgs {
    /// Filter expression, e.g. "length >= 100 && name =~ '^chr'"
    #[arg(long)]
    script: Option<String>,
}

impl ScriptArgs {
    fn filter(&self) -> Result<Option<ExpressionFilter>> {
        self.script.as_deref().map(ExpressionFilter::parse).transpose()
    }
}

#[derive(Args)]
struct RangeArgs {
    /// Keep records overlapping a region (chrom, chrom:start or chrom:start-end, names with colons as {name}); repeatable
    #[arg(long = "range")]
    ranges: Vec<String>,
}

impl RangeArgs {
    fn regions(&self) -> Result<Option<Vec<Interval>>> {
        if self.ranges.is_empty() {
            return Ok(None);
        }
        self.ranges
            .iter()
            .map(|range| range.parse())
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

#[derive(Args)]
struct FastaFilterArgs {
    /// Minimum sequence length
    #[arg(long)]
    length: Option<usize>,

    #[command(flatten)]
    script: ScriptArgs,
}

#[derive(Args)]
struct FastqFilterArgs {
    /// Minimum sequence length
    #[arg(long)]
    length: Option<usize>,

    #[command(flatten)]
    script: ScriptArgs,
}

#[derive(Args)]
struct BedFilterArgs {
    /// Minimum score; records without a score are dropped
    #[arg(long)]
    score: Option<f64>,

    #[command(flatten)]
    range: RangeArgs,

    #[command(flatten)]
    script: ScriptArgs,
}

#[derive(Args)]
struct VcfFilterArgs {
    /// Minimum QUAL; records with QUAL "." are dropped
    #[arg(long)]
    qual: Option<f64>,

    #[command(flatten)]
    range: RangeArgs,

    /// Keep records whose FILTER is PASS or "."
    #[arg(long)]
    passing: bool,

    /// Keep records with one of these IDs (comma separated)
    #[arg(long = "id", value_delimiter = ',')]
    ids: Vec<String>,

    #[command(flatten)]
    script: ScriptArgs,
}

#[derive(Args)]
struct Gff3FilterArgs {
    /// Minimum score; features without a score are kept
    #[arg(long)]
    score: Option<f64>,

    #[command(flatten)]
    range: RangeArgs,

    /// Keep features of these types (comma separated)
    #[arg(long, value_delimiter = ',')]
    types: Vec<String>,

    #[command(flatten)]
    script: ScriptArgs,
}

#[derive(Args)]
struct GfaFilterArgs {
    /// Minimum segment length; segments of unknown length are kept
    #[arg(long)]
    length: Option<u64>,

    #[command(flatten)]
    script: ScriptArgs,
}

#[derive(Args)]
struct AlignmentFilterArgs {
    /// Minimum mapping quality; 255 (missing) is dropped
    #[arg(long)]
    mapping_quality: Option<u8>,

    /// Minimum alignment block length
    #[arg(long)]
    alignment_block_length: Option<u64>,

    #[command(flatten)]
    script: ScriptArgs,
}

#[derive(Args)]
struct SamFilterArgs {
    /// Minimum mapping quality; 255 (missing) is dropped
    #[arg(long)]
    mapping_quality: Option<u8>,

    #[command(flatten)]
    range: RangeArgs,

    /// Drop records with any of these flag bits set (decimal or 0x hex)
    #[arg(long, value_parser = parse_flags)]
    exclude_flags: Option<u16>,

    #[command(flatten)]
    script: ScriptArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-write FASTA, compressing by output extension
    CompressFasta {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        width: LineWidthArgs,
    },

    /// Re-write FASTQ, compressing by output extension
    CompressFastq {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Re-write BED, compressing by output extension
    CompressBed {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Re-write VCF, compressing by output extension
    CompressVcf {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Re-write GFF3, compressing by output extension
    CompressGff3 {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Re-write GFA1, compressing by output extension
    CompressGfa1 {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Re-write GFA2, compressing by output extension
    CompressGfa2 {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Re-write PAF, compressing by output extension
    CompressPaf {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Re-write GAF, compressing by output extension
    CompressGaf {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Re-write SAM, compressing by output extension
    CompressSam {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Filter FASTA records
    FilterFasta {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        width: LineWidthArgs,
        #[command(flatten)]
        filters: FastaFilterArgs,
    },

    /// Filter FASTQ records
    FilterFastq {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filters: FastqFilterArgs,
    },

    /// Filter BED records
    FilterBed {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filters: BedFilterArgs,
    },

    /// Filter VCF records
    FilterVcf {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filters: VcfFilterArgs,
    },

    /// Filter GFF3 features; directives and sequences pass through
    FilterGff3 {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filters: Gff3FilterArgs,
    },

    /// Filter GFA1 segments; other lines pass through
    FilterGfa1 {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filters: GfaFilterArgs,
    },

    /// Filter GFA2 segments; other lines pass through
    FilterGfa2 {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filters: GfaFilterArgs,
    },

    /// Filter PAF records
    FilterPaf {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filters: AlignmentFilterArgs,
    },

    /// Filter GAF records
    FilterGaf {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filters: AlignmentFilterArgs,
    },

    /// Filter SAM records
    FilterSam {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filters: SamFilterArgs,
    },

    /// Split FASTA into numbered files
    SplitFasta {
        #[command(flatten)]
        split: SplitArgs,
        #[command(flatten)]
        width: LineWidthArgs,
    },

    /// Split FASTQ into numbered files
    SplitFastq {
        #[command(flatten)]
        split: SplitArgs,
    },

    /// Split BED into numbered files
    SplitBed {
        #[command(flatten)]
        split: SplitArgs,
    },

    /// Split VCF into numbered files, repeating the header in each
    SplitVcf {
        #[command(flatten)]
        split: SplitArgs,
    },

    /// Split GFF3 into numbered files, repeating the header in each
    SplitGff3 {
        #[command(flatten)]
        split: SplitArgs,
    },

    /// Split GAF into numbered files
    SplitGaf {
        #[command(flatten)]
        split: SplitArgs,
    },

    /// Split PAF into numbered files
    SplitPaf {
        #[command(flatten)]
        split: SplitArgs,
    },

    /// Split SAM into numbered files, repeating the header in each
    SplitSam {
        #[command(flatten)]
        split: SplitArgs,
    },

    /// Add or remove the "chr" prefix of BED chromosome names
    RenameBedReferences {
        #[command(flatten)]
        args: RenameArgs,
    },

    /// Add or remove the "chr" prefix of VCF chromosome names and contigs
    RenameVcfReferences {
        #[command(flatten)]
        args: RenameArgs,
    },

    /// Add or remove the "chr" prefix of GFF3 sequence ids
    RenameGff3References {
        #[command(flatten)]
        args: RenameArgs,
    },

    /// Add or remove the "chr" prefix of SAM reference names
    RenameSamReferences {
        #[command(flatten)]
        args: RenameArgs,
    },

    /// Convert FASTQ to FASTA
    FastqToFasta {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        width: LineWidthArgs,
    },

    /// Write GFA1 segment sequences as FASTA
    Gfa1ToFasta {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        width: LineWidthArgs,
    },

    /// Write GFA2 segment sequences as FASTA
    Gfa2ToFasta {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        width: LineWidthArgs,
    },

    /// Interleave first and second reads from two FASTQ files
    InterleaveFastq {
        /// First reads
        #[arg(short = '1', long = "first-fastq-path")]
        first: PathBuf,

        /// Second reads
        #[arg(short = '2', long = "second-fastq-path")]
        second: PathBuf,

        /// Output file [default: stdout]
        #[arg(short = 'o', long = "output-path")]
        output: Option<PathBuf>,
    },

    /// Split interleaved FASTQ into first and second reads
    DisinterleaveFastq {
        /// Interleaved input [default: stdin]
        #[arg(short = 'i', long = "input-path")]
        input: Option<PathBuf>,

        /// Output for first reads
        #[arg(short = '1', long = "first-fastq-path")]
        first: PathBuf,

        /// Output for second reads
        #[arg(short = '2', long = "second-fastq-path")]
        second: PathBuf,

        /// Output for reads without a mate [default: drop them]
        #[arg(short = 'u', long = "unpaired-path", alias = "unpaired")]
        unpaired: Option<PathBuf>,
    },

    /// Convert FASTA to Parquet
    FastaToParquet {
        /// Input FASTA [default: stdin]
        #[arg(short = 'i', long = "input-path")]
        input: Option<PathBuf>,

        /// Output file, or directory when partitioning
        #[arg(short = 'o', long = "output-path")]
        output: PathBuf,

        /// Sequence alphabet recorded in each row
        #[arg(long, default_value = "dna", value_parser = ["dna", "protein"])]
        alphabet: String,

        /// Maximum rows per row group
        #[arg(long, default_value_t = config::DEFAULT_ROW_GROUP_SIZE)]
        row_group_size: usize,

        /// Records per output file; writes part-<start>-<end>.parquet files
        #[arg(long)]
        partition_size: Option<u64>,
    },
}

fn parse_flags(value: &str) -> std::result::Result<u16, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid flag mask '{}': {}", value, e))
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => -1,
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    env_logger::Builder::new()
        .filter_level(config::log_level(cli.verbose))
        .parse_default_env()
        .init();

    if cli.about {
        println!("bioshed {}", bioshed::VERSION);
        println!("Streaming tools for bioinformatics file formats");
        process::exit(0);
    }

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        eprintln!();
        process::exit(-1);
    };

    if let Err(e) = run(command) {
        if e.is_broken_pipe() {
            process::exit(0);
        }
        eprintln!("Error: {}", e);
        if e.is_argument() {
            eprintln!("\n{}", Cli::command().render_usage());
            process::exit(-1);
        }
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::CompressFasta { io, width } => run_compress(width.format(), io),
        Commands::CompressFastq { io } => run_compress(FastqFormat, io),
        Commands::CompressBed { io } => run_compress(BedFormat, io),
        Commands::CompressVcf { io } => run_compress(VcfFormat, io),
        Commands::CompressGff3 { io } => run_compress(Gff3Format, io),
        Commands::CompressGfa1 { io } => run_compress(Gfa1Format, io),
        Commands::CompressGfa2 { io } => run_compress(Gfa2Format, io),
        Commands::CompressPaf { io } => run_compress(PafFormat, io),
        Commands::CompressGaf { io } => run_compress(GafFormat, io),
        Commands::CompressSam { io } => run_compress(SamFormat, io),

        Commands::FilterFasta { io, width, filters } => {
            run_filter(width.format(), fasta_filters(&filters)?, io)
        }
        Commands::FilterFastq { io, filters } => {
            run_filter(FastqFormat, fastq_filters(&filters)?, io)
        }
        Commands::FilterBed { io, filters } => run_filter(BedFormat, bed_filters(&filters)?, io),
        Commands::FilterVcf { io, filters } => run_filter(VcfFormat, vcf_filters(&filters)?, io),
        Commands::FilterGff3 { io, filters } => {
            run_filter(Gff3Format, gff3_filters(&filters)?, io)
        }
        Commands::FilterGfa1 { io, filters } => {
            run_filter(Gfa1Format, gfa1_filters(&filters)?, io)
        }
        Commands::FilterGfa2 { io, filters } => {
            run_filter(Gfa2Format, gfa2_filters(&filters)?, io)
        }
        Commands::FilterPaf { io, filters } => run_filter(PafFormat, paf_filters(&filters)?, io),
        Commands::FilterGaf { io, filters } => run_filter(GafFormat, gaf_filters(&filters)?, io),
        Commands::FilterSam { io, filters } => run_filter(SamFormat, sam_filters(&filters)?, io),

        Commands::SplitFasta { split, width } => run_split(width.format(), split),
        Commands::SplitFastq { split } => run_split(FastqFormat, split),
        Commands::SplitBed { split } => run_split(BedFormat, split),
        Commands::SplitVcf { split } => run_split(VcfFormat, split),
        Commands::SplitGff3 { split } => run_split(Gff3Format, split),
        Commands::SplitGaf { split } => run_split(GafFormat, split),
        Commands::SplitPaf { split } => run_split(PafFormat, split),
        Commands::SplitSam { split } => run_split(SamFormat, split),

        Commands::RenameBedReferences { args } => run_rename(BedFormat, args),
        Commands::RenameVcfReferences { args } => run_rename(VcfFormat, args),
        Commands::RenameGff3References { args } => run_rename(Gff3Format, args),
        Commands::RenameSamReferences { args } => run_rename(SamFormat, args),

        Commands::FastqToFasta { io, width } => run_fastq_to_fasta(io, width.line_width),
        Commands::Gfa1ToFasta { io, width } => run_segments_to_fasta(Gfa1Format, io, width.line_width),
        Commands::Gfa2ToFasta { io, width } => run_segments_to_fasta(Gfa2Format, io, width.line_width),
        Commands::InterleaveFastq {
            first,
            second,
            output,
        } => run_interleave(first, second, output),
        Commands::DisinterleaveFastq {
            input,
            first,
            second,
            unpaired,
        } => run_disinterleave(input, first, second, unpaired),
        Commands::FastaToParquet {
            input,
            output,
            alphabet,
            row_group_size,
            partition_size,
        } => run_fasta_to_parquet(input, output, &alphabet, row_group_size, partition_size),
    }
}

fn run_compress<F: Format>(format: F, io: IoArgs) -> Result<()> {
    let (input, _) = open_input(io.input.as_deref())?;
    let mut output = create_output(io.output.as_deref())?;
    CompressCommand::new(format).run(input, &mut output)?;
    output.finish()?;
    Ok(())
}

fn run_filter<F: Format>(format: F, filters: FilterChain<F::Record>, io: IoArgs) -> Result<()> {
    let (input, _) = open_input(io.input.as_deref())?;
    let mut output = create_output(io.output.as_deref())?;
    FilterCommand::new(format)
        .with_filters(filters)
        .run(input, &mut output)?;
    output.finish()?;
    Ok(())
}

fn run_split<F: Format>(format: F, args: SplitArgs) -> Result<()> {
    let (input, sniffed) = open_input(args.input.as_deref())?;

    let mut naming = FileNaming::infer(args.input.as_deref(), sniffed, F::EXTENSIONS)
        .with_left_pad(args.left_pad);
    if let Some(prefix) = args.prefix {
        naming = naming.with_prefix(prefix);
    }
    if let Some(suffix) = args.suffix {
        naming = naming.with_suffix(suffix);
    }
    if let Some(directory) = args.directory {
        naming = naming.with_directory(directory);
    }

    let config = SplitConfig::new(naming)
        .with_records(args.records)
        .with_bytes(args.bytes);
    SplitCommand::new(format, config).run(input)?;
    Ok(())
}

fn run_rename<F: RenameReferences>(format: F, args: RenameArgs) -> Result<()> {
    let (input, _) = open_input(args.io.input.as_deref())?;
    let mut output = create_output(args.io.output.as_deref())?;
    RenameReferencesCommand::new(format, args.chr)?.run(input, &mut output)?;
    output.finish()?;
    Ok(())
}

fn run_fastq_to_fasta(io: IoArgs, line_width: usize) -> Result<()> {
    let (input, _) = open_input(io.input.as_deref())?;
    let mut output = create_output(io.output.as_deref())?;
    FastqToFastaCommand::new()
        .with_line_width(line_width)
        .run(input, &mut output)?;
    output.finish()?;
    Ok(())
}

fn run_segments_to_fasta<F: SegmentSequences>(format: F, io: IoArgs, line_width: usize) -> Result<()> {
    let (input, _) = open_input(io.input.as_deref())?;
    let mut output = create_output(io.output.as_deref())?;
    SegmentsToFastaCommand::new(format)
        .with_line_width(line_width)
        .run(input, &mut output)?;
    output.finish()?;
    Ok(())
}

fn run_interleave(first: PathBuf, second: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let (first, _) = open_input(Some(&first))?;
    let (second, _) = open_input(Some(&second))?;
    let mut output = create_output(output.as_deref())?;
    InterleaveCommand::new().run(first, second, &mut output)?;
    output.finish()?;
    Ok(())
}

fn run_disinterleave(
    input: Option<PathBuf>,
    first: PathBuf,
    second: PathBuf,
    unpaired: Option<PathBuf>,
) -> Result<()> {
    let (input, _) = open_input(input.as_deref())?;
    let mut first = create_output(Some(&first))?;
    let mut second = create_output(Some(&second))?;
    let mut unpaired = unpaired
        .as_deref()
        .map(|path| create_output(Some(path)))
        .transpose()?;

    DisinterleaveCommand::new().run(input, &mut first, &mut second, unpaired.as_mut())?;

    first.finish()?;
    second.finish()?;
    if let Some(unpaired) = unpaired {
        unpaired.finish()?;
    }
    Ok(())
}

fn run_fasta_to_parquet(
    input: Option<PathBuf>,
    output: PathBuf,
    alphabet: &str,
    row_group_size: usize,
    partition_size: Option<u64>,
) -> Result<()> {
    let alphabet: Alphabet = alphabet.parse()?;
    let config = FastaToParquetConfig::default()
        .with_alphabet(alphabet)
        .with_row_group_size(row_group_size)
        .with_partition_size(partition_size);

    let (input, _) = open_input(input.as_deref())?;
    FastaToParquetCommand::new(config).run(input, &output)?;
    Ok(())
}

// Filter chains are built in flag declaration order.

fn fasta_filters(args: &FastaFilterArgs) -> Result<FilterChain<FastaRecord>> {
    let mut chain = FilterChain::new();
    chain.push_opt(args.length.map(fasta::length_filter));
    chain.push_opt(args.script.filter()?);
    Ok(chain)
}

fn fastq_filters(args: &FastqFilterArgs) -> Result<FilterChain<FastqRecord>> {
    let mut chain = FilterChain::new();
    chain.push_opt(args.length.map(fastq::length_filter));
    chain.push_opt(args.script.filter()?);
    Ok(chain)
}

fn bed_filters(args: &BedFilterArgs) -> Result<FilterChain<BedRecord>> {
    let mut chain = FilterChain::new();
    chain.push_opt(args.score.map(bed::score_filter));
    chain.push_opt(args.range.regions()?.map(bed::range_filter));
    chain.push_opt(args.script.filter()?);
    Ok(chain)
}

fn vcf_filters(args: &VcfFilterArgs) -> Result<FilterChain<VcfRecord>> {
    let mut chain = FilterChain::new();
    chain.push_opt(args.qual.map(vcf::quality_filter));
    chain.push_opt(args.range.regions()?.map(vcf::range_filter));
    if args.passing {
        chain.push(vcf::passing_filter());
    }
    if !args.ids.is_empty() {
        chain.push(vcf::id_filter(args.ids.clone()));
    }
    chain.push_opt(args.script.filter()?);
    Ok(chain)
}

fn gff3_filters(args: &Gff3FilterArgs) -> Result<FilterChain<Gff3Record>> {
    let mut chain = FilterChain::new();
    chain.push_opt(args.score.map(gff3::score_filter));
    chain.push_opt(args.range.regions()?.map(gff3::range_filter));
    if !args.types.is_empty() {
        chain.push(gff3::type_filter(args.types.clone()));
    }
    chain.push_opt(args.script.filter()?.map(gff3::for_features));
    Ok(chain)
}

fn gfa1_filters(args: &GfaFilterArgs) -> Result<FilterChain<Gfa1Record>> {
    let mut chain = FilterChain::new();
    chain.push_opt(args.length.map(gfa1::length_filter));
    chain.push_opt(args.script.filter()?.map(gfa1::for_segments));
    Ok(chain)
}

fn gfa2_filters(args: &GfaFilterArgs) -> Result<FilterChain<Gfa2Record>> {
    let mut chain = FilterChain::new();
    chain.push_opt(args.length.map(gfa2::length_filter));
    chain.push_opt(args.script.filter()?.map(gfa2::for_segments));
    Ok(chain)
}

fn paf_filters(args: &AlignmentFilterArgs) -> Result<FilterChain<PafRecord>> {
    let mut chain = FilterChain::new();
    chain.push_opt(args.mapping_quality.map(paf::mapping_quality_filter));
    chain.push_opt(
        args.alignment_block_length
            .map(paf::alignment_block_length_filter),
    );
    chain.push_opt(args.script.filter()?);
    Ok(chain)
}

fn gaf_filters(args: &AlignmentFilterArgs) -> Result<FilterChain<GafRecord>> {
    let mut chain = FilterChain::new();
    chain.push_opt(args.mapping_quality.map(gaf::mapping_quality_filter));
    chain.push_opt(
        args.alignment_block_length
            .map(gaf::alignment_block_length_filter),
    );
    chain.push_opt(args.script.filter()?);
    Ok(chain)
}

fn sam_filters(args: &SamFilterArgs) -> Result<FilterChain<SamRecord>> {
    let mut chain = FilterChain::new();
    chain.push_opt(args.mapping_quality.map(sam::mapping_quality_filter));
    chain.push_opt(args.range.regions()?.map(sam::range_filter));
    chain.push_opt(args.exclude_flags.map(sam::exclude_flags_filter));
    chain.push_opt(args.script.filter()?);
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(parse_flags("4"), Ok(4));
        assert_eq!(parse_flags("0x904"), Ok(0x904));
        assert!(parse_flags("0xZZ").is_err());
        assert!(parse_flags("70000").is_err());
    }

    #[test]
    fn test_subcommand_names() {
        let cli = Cli::try_parse_from(["bioshed", "rename-vcf-references", "--chr"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::RenameVcfReferences { args }) if args.chr
        ));

        let cli = Cli::try_parse_from([
            "bioshed",
            "filter-vcf",
            "--id",
            "rs1,rs2",
            "--range",
            "chr1:1-100",
            "--range",
            "chr2",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::FilterVcf { filters, .. }) => {
                assert_eq!(filters.ids, vec!["rs1", "rs2"]);
                assert_eq!(filters.range.regions().unwrap().unwrap().len(), 2);
            }
            _ => panic!("expected filter-vcf"),
        }
    }

    #[test]
    fn test_invalid_range_is_argument_error() {
        let args = RangeArgs {
            ranges: vec!["chr1:10-5".to_string()],
        };
        assert!(args.regions().unwrap_err().is_argument());
    }
}
