// Clippy allows
#![allow(clippy::too_many_arguments)]

//! annocov: coverage of genomic intervals by annotation categories
//!
//! Usage: annocov <COMMAND> [OPTIONS]

use clap::{ArgAction, Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process;

use annocov::bed::BedError;
use annocov::commands::{
    Category, EntrywiseCommand, GeneStatsCommand, MergeCommand, WindowsCommand,
};
use annocov::config::{ChromFilter, CoverageConfig, ReferencePolicy, ZeroLengthPolicy};
use annocov::gene_model::TranscriptColumns;

#[derive(Parser)]
#[command(name = "annocov")]
#[command(version)]
#[command(about = "Streaming coverage of genomic intervals by annotation categories", long_about = None)]
struct Cli {
    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-entry and per-chromosome coverage of a BED file by annotation categories
    Entrywise {
        /// Merged promoter regions
        promoter: PathBuf,

        /// Merged exon regions
        exon: PathBuf,

        /// Merged intron regions
        intron: PathBuf,

        /// Merged repeat regions
        repeat: PathBuf,

        /// Sorted query BED file
        input: PathBuf,

        /// Entrywise output table
        entry_out: PathBuf,

        /// Per-chromosome summary table
        summary_out: PathBuf,

        /// Merged 5' UTR regions
        #[arg(long, requires = "tp_utr")]
        fp_utr: Option<PathBuf>,

        /// Merged 3' UTR regions
        #[arg(long, requires = "fp_utr")]
        tp_utr: Option<PathBuf>,

        /// UTRs split into exonic and intronic parts
        #[arg(
            long,
            num_args = 4,
            value_names = ["FP_EXON", "FP_INTRON", "TP_EXON", "TP_INTRON"],
            conflicts_with_all = ["fp_utr", "tp_utr"]
        )]
        full_utrs: Option<Vec<PathBuf>>,

        /// Extra category as name=path (repeatable)
        #[arg(long = "category", value_name = "NAME=PATH")]
        categories: Vec<String>,

        /// Treat (chromosome, strand) as the grouping key
        #[arg(long)]
        stranded: bool,

        /// Skip unplaced, alternate and mitochondrial chromosomes
        #[arg(long, conflicts_with = "skip_chroms")]
        skip_nonref: bool,

        /// Skip chromosomes matching this regex
        #[arg(long, value_name = "REGEX")]
        skip_chroms: Option<String>,

        /// What to report for zero-length entries
        #[arg(long, value_enum, default_value_t = ZeroLengthPolicy::Error)]
        zero_length: ZeroLengthPolicy,

        /// How to treat overlapping intervals in the category files
        #[arg(long, value_enum, default_value_t = ReferencePolicy::Validate)]
        reference_policy: ReferencePolicy,

        /// Skip sort validation of the query file
        #[arg(long)]
        assume_sorted: bool,

        /// Print statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Per-transcript peak coverage of exons, introns and UTRs
    GeneStats {
        /// Transcript table (refGene layout unless --ref-format is given), sorted like the peaks
        reference: PathBuf,

        /// BED6 peak file sorted by chrom, strand, then start (LC_ALL=C sort)
        bed: PathBuf,

        /// Output table
        output: PathBuf,

        /// File whose first line names the transcript table columns
        #[arg(long, value_name = "HEADER_FILE")]
        ref_format: Option<PathBuf>,

        /// Skip unplaced, alternate and mitochondrial chromosomes
        #[arg(long, conflicts_with = "skip_chroms")]
        skip_nonref: bool,

        /// Skip chromosomes matching this regex
        #[arg(long, value_name = "REGEX")]
        skip_chroms: Option<String>,

        /// Skip sort validation of the inputs
        #[arg(long)]
        assume_sorted: bool,

        /// Print statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Merge overlapping intervals of each file into <stem>.merged.bed
    Merge {
        /// Sorted BED files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Maximum distance between intervals to merge
        #[arg(short, long, default_value = "0")]
        distance: u64,

        /// Require strand to match for merging (input sorted by chrom, strand, then start)
        #[arg(short, long)]
        strand: bool,

        /// Report count of merged intervals
        #[arg(short = 'c', long)]
        count: bool,
    },

    /// Exon and intron windows of a transcript table as BED6
    Windows {
        /// Transcript table
        reference: PathBuf,

        /// Output BED file
        output: PathBuf,

        /// File whose first line names the transcript table columns
        #[arg(long, value_name = "HEADER_FILE")]
        ref_format: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let result = match cli.command {
        Commands::Entrywise {
            promoter,
            exon,
            intron,
            repeat,
            input,
            entry_out,
            summary_out,
            fp_utr,
            tp_utr,
            full_utrs,
            categories,
            stranded,
            skip_nonref,
            skip_chroms,
            zero_length,
            reference_policy,
            assume_sorted,
            stats,
        } => chrom_filter(skip_nonref, skip_chroms).and_then(|filter| {
            let config = CoverageConfig::new()
                .with_stranded(stranded)
                .with_zero_length(zero_length)
                .with_chrom_filter(filter)
                .with_reference_policy(reference_policy)
                .with_assume_sorted(assume_sorted);
            let utrs = match (fp_utr, tp_utr, full_utrs) {
                (Some(fp), Some(tp), _) => Utrs::Whole(fp, tp),
                (_, _, Some(split)) => Utrs::Split(split),
                _ => Utrs::None,
            };
            run_entrywise(
                [promoter, exon, intron, repeat],
                utrs,
                categories,
                config,
                input,
                entry_out,
                summary_out,
                stats,
            )
        }),

        Commands::GeneStats {
            reference,
            bed,
            output,
            ref_format,
            skip_nonref,
            skip_chroms,
            assume_sorted,
            stats,
        } => chrom_filter(skip_nonref, skip_chroms).and_then(|filter| {
            let config = CoverageConfig::new()
                .with_chrom_filter(filter)
                .with_assume_sorted(assume_sorted);
            run_gene_stats(reference, bed, output, ref_format, config, stats)
        }),

        Commands::Merge {
            files,
            distance,
            strand,
            count,
        } => run_merge(files, distance, strand, count),

        Commands::Windows {
            reference,
            output,
            ref_format,
        } => run_windows(reference, output, ref_format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// UTR categories placed in front of the standard four.
enum Utrs {
    None,
    Whole(PathBuf, PathBuf),
    Split(Vec<PathBuf>),
}

fn chrom_filter(
    skip_nonref: bool,
    skip_chroms: Option<String>,
) -> Result<Option<ChromFilter>, BedError> {
    let filter = if skip_nonref {
        Some(ChromFilter::non_reference()?)
    } else {
        skip_chroms.map(|pattern| ChromFilter::new(&pattern)).transpose()?
    };
    if let Some(f) = filter.as_ref() {
        info!("Skipping chromosomes matching {}", f.as_str());
    }
    Ok(filter)
}

fn transcript_columns(ref_format: Option<PathBuf>) -> Result<TranscriptColumns, BedError> {
    match ref_format {
        Some(path) => TranscriptColumns::from_header_file(path),
        None => Ok(TranscriptColumns::refgene()),
    }
}

fn run_entrywise(
    standard: [PathBuf; 4],
    utrs: Utrs,
    extra: Vec<String>,
    config: CoverageConfig,
    input: PathBuf,
    entry_out: PathBuf,
    summary_out: PathBuf,
    stats: bool,
) -> Result<(), BedError> {
    let [promoter, exon, intron, repeat] = standard;
    let mut cmd = EntrywiseCommand::standard(promoter, exon, intron, repeat);
    cmd = match utrs {
        Utrs::None => cmd,
        Utrs::Whole(fp, tp) => cmd.with_utrs(fp, tp),
        Utrs::Split(split) => match <[PathBuf; 4]>::try_from(split) {
            Ok([fpe, fpi, tpe, tpi]) => cmd.with_split_utrs(fpe, fpi, tpe, tpi),
            Err(_) => {
                return Err(BedError::InvalidFormat(
                    "--full-utrs takes exactly four files".to_string(),
                ))
            }
        },
    };
    for arg in &extra {
        cmd = cmd.with_category(Category::parse(arg)?);
    }
    let cmd = cmd.with_config(config);

    info!(
        "Scoring {} against {}",
        input.display(),
        cmd.category_names().join(", ")
    );
    let result = cmd.run(input, entry_out, summary_out)?;
    info!("Finished entrywise coverage");

    if stats {
        eprintln!("{}", result);
    }
    Ok(())
}

fn run_gene_stats(
    reference: PathBuf,
    bed: PathBuf,
    output: PathBuf,
    ref_format: Option<PathBuf>,
    config: CoverageConfig,
    stats: bool,
) -> Result<(), BedError> {
    let cmd = GeneStatsCommand::new()
        .with_columns(transcript_columns(ref_format)?)
        .with_config(config);

    info!("Scoring transcripts of {} against {}", reference.display(), bed.display());
    let result = cmd.run(reference, bed, output)?;
    info!("Finished gene stats");

    if stats {
        eprintln!("{}", result);
    }
    Ok(())
}

fn run_merge(files: Vec<PathBuf>, distance: u64, strand: bool, count: bool) -> Result<(), BedError> {
    let cmd = MergeCommand::new()
        .with_distance(distance)
        .with_strand(strand)
        .with_count(count);

    for file in files {
        let (output, stats) = cmd.run_beside(&file)?;
        info!("Merged {} into {} ({})", file.display(), output.display(), stats);
    }
    Ok(())
}

fn run_windows(
    reference: PathBuf,
    output: PathBuf,
    ref_format: Option<PathBuf>,
) -> Result<(), BedError> {
    let cmd = WindowsCommand::new().with_columns(transcript_columns(ref_format)?);
    let stats = cmd.run(&reference, &output)?;
    info!("Wrote windows of {} to {} ({})", reference.display(), output.display(), stats);
    Ok(())
}
