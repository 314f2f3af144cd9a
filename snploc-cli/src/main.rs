//! snploc: SNP positional indexing, QC and colocalization pipelines.
//!
//! CLI entry point using clap for argument parsing.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "snploc",
    version,
    about = "SNP positional indexing, missing-data QC and gene colocalization",
    long_about = "Batch pipelines over GWAS flat files: build SNP/gene positional\n\
                   indexes, attach missingness reports, test gene-set colocalization\n\
                   around SNP loci, and analyze similarity graphs."
)]
struct Cli {
    /// Number of threads to use
    #[arg(long, default_value = "1", global = true)]
    threads: usize,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a SNP database and report per-chromosome statistics
    SnpStats(commands::snp_stats::SnpStatsArgs),

    /// Aggregate missingness reports and derive confidence thresholds
    Missing(commands::missing::MissingArgs),

    /// Test gene-set colocalization around SNP loci
    Coloc(commands::coloc::ColocArgs),

    /// Summarize probe intensities by pedigree class
    Intensities(commands::intensities::IntensitiesArgs),

    /// Analyze similarity matrices and their graphs
    Similarity(commands::similarity::SimilarityArgs),

    /// Convert PED/MAP genotypes to ARFF
    PedToArff(commands::ped_to_arff::PedToArffArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    // Set up thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()
        .ok();

    tracing::info!("snploc v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Using {} threads", cli.threads);

    match cli.command {
        Commands::SnpStats(args) => commands::snp_stats::run(args),
        Commands::Missing(args) => commands::missing::run(args),
        Commands::Coloc(args) => commands::coloc::run(args),
        Commands::Intensities(args) => commands::intensities::run(args),
        Commands::Similarity(args) => commands::similarity::run(args),
        Commands::PedToArff(args) => commands::ped_to_arff::run(args),
    }
}
