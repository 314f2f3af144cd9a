//! Per-probe intensity summaries split by pedigree class.
//!
//! snploc intensities --summary-file summary.txt.gz --tfam study.tfam \
//!     --output summaries.tsv

use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use snploc_core::intensity;
use snploc_geno::birdseed;
use snploc_geno::tfam::Tfam;

#[derive(Args)]
pub struct IntensitiesArgs {
    /// Birdseed summary intensity file
    #[arg(long)]
    summary_file: PathBuf,

    /// TFAM pedigree file
    #[arg(long)]
    tfam: PathBuf,

    /// Cap the number of probes read (0 = all)
    #[arg(long, default_value = "0")]
    limit: usize,

    /// Output TSV path
    #[arg(long)]
    output: PathBuf,
}

pub fn run(args: IntensitiesArgs) -> Result<()> {
    let tfam = Tfam::parse(&args.tfam)?;

    let limit = if args.limit == 0 {
        None
    } else {
        Some(args.limit)
    };
    let matrix = birdseed::parse_summary_intensities(&args.summary_file, limit)?;
    info!(
        "Intensity matrix: {} probes x {} subjects",
        matrix.n_probes(),
        matrix.subjects.len()
    );

    let parent_indices = tfam.parent_indices(&matrix.subjects)?;
    let offspring_indices = tfam.offspring_indices(&matrix.subjects)?;
    info!(
        "{} parent columns, {} offspring columns",
        parent_indices.len(),
        offspring_indices.len()
    );

    let summaries = intensity::summarize(&matrix, &parent_indices, &offspring_indices);

    let file = std::fs::File::create(&args.output)?;
    let mut writer = BufWriter::new(file);
    intensity::write_summary(&mut writer, &summaries)?;
    info!("Summaries written to {}", args.output.display());

    Ok(())
}
