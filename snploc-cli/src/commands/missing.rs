//! Missing-data pipeline: per-chromosome summaries and confidence
//! thresholds.
//!
//! snploc missing --birdseed-dir ... --subject ... --tfam ... \
//!     [--lmiss-parents-dir ... --lmiss-offspring-dir ... --stats-out ...] \
//!     [--lmiss-dir ... --confidences ... --chrom N --thresholds-out ...]

use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use snploc_core::{missing, SnpDatabase};
use snploc_geno::confidence;
use snploc_geno::lmiss;
use snploc_geno::tfam::Tfam;

#[derive(Args)]
pub struct MissingArgs {
    /// Directory of per-chromosome Birdseed call files
    #[arg(long)]
    birdseed_dir: PathBuf,

    /// Subject prefix of the Birdseed call files
    #[arg(long)]
    subject: String,

    /// TFAM pedigree file
    #[arg(long)]
    tfam: PathBuf,

    /// Dataset label written into the stats output
    #[arg(long, default_value = "dataset")]
    dataset: String,

    /// Directory of parent-only .lmiss reports
    #[arg(long)]
    lmiss_parents_dir: Option<PathBuf>,

    /// Directory of offspring-only .lmiss reports
    #[arg(long)]
    lmiss_offspring_dir: Option<PathBuf>,

    /// Output path for the per-chromosome missing_stats TSV
    #[arg(long)]
    stats_out: Option<PathBuf>,

    /// Directory of whole-cohort .lmiss reports (for thresholds)
    #[arg(long)]
    lmiss_dir: Option<PathBuf>,

    /// Genotype-confidence matrix file
    #[arg(long)]
    confidences: Option<PathBuf>,

    /// Chromosome to compute thresholds for
    #[arg(long, default_value = "1")]
    chrom: String,

    /// Output path for the per-probe thresholds TSV
    #[arg(long)]
    thresholds_out: Option<PathBuf>,
}

pub fn run(args: MissingArgs) -> Result<()> {
    let tfam = Tfam::parse(&args.tfam)?;
    info!(
        "Pedigree: {} parents, {} offspring",
        tfam.parents().len(),
        tfam.offspring().len()
    );

    let mut db = SnpDatabase::new();
    db.load_birdseed_dir(&args.birdseed_dir, &args.subject)?;

    if let (Some(parents_dir), Some(offspring_dir)) =
        (&args.lmiss_parents_dir, &args.lmiss_offspring_dir)
    {
        let stats_out = args
            .stats_out
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("--lmiss-parents-dir requires --stats-out"))?;

        let parent_files = lmiss::chromosome_files(parents_dir)?;
        let offspring_files = lmiss::chromosome_files(offspring_dir)?;

        let mut rows = Vec::new();
        for ((chro, parent_path), (_, offspring_path)) in
            parent_files.iter().zip(offspring_files.iter())
        {
            let parents = lmiss::parse_lmiss(parent_path)?;
            let offspring = lmiss::parse_lmiss(offspring_path)?;
            rows.push(missing::aggregate_missing(chro, &tfam, &parents, &offspring));
        }

        let file = std::fs::File::create(stats_out)?;
        let mut writer = BufWriter::new(file);
        lmiss::write_missing_stats(&mut writer, &args.dataset, &rows)?;
        info!("Missing stats written to {}", stats_out.display());
    }

    if let Some(ref confs_path) = args.confidences {
        let lmiss_dir = args
            .lmiss_dir
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("--confidences requires --lmiss-dir"))?;
        let thresholds_out = args
            .thresholds_out
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("--confidences requires --thresholds-out"))?;

        let n_unmatched = db.attach_lmiss_dir(lmiss_dir)?;
        if n_unmatched > 0 {
            warn!("{} lmiss rows had no matching SNP", n_unmatched);
        }

        let confidences = confidence::parse_confidences(confs_path)?;
        info!(
            "Confidence matrix: {} probes x {} subjects",
            confidences.n_probes(),
            confidences.subjects.len()
        );

        let (records, n_skipped) = missing::confidence_thresholds(&args.chrom, &db, &confidences);
        info!(
            "Chr {}: {} thresholds, {} probes skipped",
            args.chrom,
            records.len(),
            n_skipped
        );

        let file = std::fs::File::create(thresholds_out)?;
        let mut writer = BufWriter::new(file);
        missing::write_thresholds(&mut writer, &args.chrom, &records)?;
        info!("Thresholds written to {}", thresholds_out.display());
    }

    Ok(())
}
