//! Build a SNP database from one source and report per-chromosome stats.
//!
//! snploc snp-stats --ucsc-file dbsnp.txt.gz [--write-positions out.tsv]

use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use snploc_core::SnpDatabase;

#[derive(Args)]
pub struct SnpStatsArgs {
    /// UCSC dbSNP common-variant table (.txt or .txt.gz)
    #[arg(long)]
    ucsc_file: Option<PathBuf>,

    /// Directory of per-chromosome Birdseed call files
    #[arg(long)]
    birdseed_dir: Option<PathBuf>,

    /// Subject prefix of the Birdseed call files
    #[arg(long)]
    subject: Option<String>,

    /// Directory of per-chromosome .map files
    #[arg(long)]
    map_dir: Option<PathBuf>,

    /// Map file pattern with a {chr} placeholder, e.g. study_merged{chr}
    #[arg(long)]
    map_pattern: Option<String>,

    /// Merge a second UCSC table under this position field name
    #[arg(long)]
    add_position_field: Option<String>,

    /// UCSC table to merge positions from (with --add-position-field)
    #[arg(long)]
    add_position_file: Option<PathBuf>,

    /// Merge a positions TSV (rsID, chr, pos) under this field name
    #[arg(long)]
    positions_field: Option<String>,

    /// Positions TSV to merge (with --positions-field)
    #[arg(long)]
    positions_file: Option<PathBuf>,

    /// Write positions TSV to this path
    #[arg(long)]
    write_positions: Option<PathBuf>,

    /// Position field to write (default: primary positions)
    #[arg(long)]
    write_field: Option<String>,
}

/// Build a database from whichever source the args name.
fn build_database(args: &SnpStatsArgs) -> Result<SnpDatabase> {
    let mut db = SnpDatabase::new();

    if let Some(ref path) = args.ucsc_file {
        info!("Loading dbSNP table {}", path.display());
        db.load_ucsc_table(path)?;
    } else if let Some(ref dir) = args.birdseed_dir {
        let subject = args
            .subject
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("--birdseed-dir requires --subject"))?;
        info!("Loading birdseed calls from {}", dir.display());
        db.load_birdseed_dir(dir, subject)?;
    } else if let Some(ref dir) = args.map_dir {
        let pattern = args
            .map_pattern
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("--map-dir requires --map-pattern"))?;
        info!("Loading map files from {}", dir.display());
        db.load_map_dir(dir, pattern)?;
    } else {
        anyhow::bail!("Must specify --ucsc-file, --birdseed-dir, or --map-dir");
    }

    Ok(db)
}

pub fn run(args: SnpStatsArgs) -> Result<()> {
    let mut db = build_database(&args)?;

    if let Some(ref field) = args.add_position_field {
        let path = args
            .add_position_file
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("--add-position-field requires --add-position-file"))?;
        let n = db.merge_position_field(path, field)?;
        info!("Merged {} '{}' positions from {}", n, field, path.display());
    }

    if let Some(ref field) = args.positions_field {
        let path = args
            .positions_file
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("--positions-field requires --positions-file"))?;
        let n = db.read_positions(path, field)?;
        info!("Merged {} '{}' positions from {}", n, field, path.display());
    }

    let mut total = 0;
    for (chro, n_snps) in db.stats() {
        println!("Chr {}: {} snps", chro, n_snps);
        total += n_snps;
    }
    println!("Total: {} snps", total);

    if let Some(ref path) = args.write_positions {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        db.write_positions(&mut writer, args.write_field.as_deref())?;
        info!("Positions written to {}", path.display());
    }

    Ok(())
}
