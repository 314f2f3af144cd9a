//! Convert PED/MAP genotypes to ARFF.
//!
//! snploc ped-to-arff --ped study.ped --map study.map --output study.arff

use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use snploc_geno::{arff, plink_text};

#[derive(Args)]
pub struct PedToArffArgs {
    /// PED genotype file
    #[arg(long)]
    ped: PathBuf,

    /// MAP variant file
    #[arg(long)]
    map: PathBuf,

    /// Relation name (default: output file stem)
    #[arg(long)]
    relation: Option<String>,

    /// Output ARFF path
    #[arg(long)]
    output: PathBuf,
}

pub fn run(args: PedToArffArgs) -> Result<()> {
    let variants = plink_text::parse_map(&args.map)?;
    info!("{} variants in {}", variants.len(), args.map.display());

    let subjects = plink_text::parse_ped(&args.ped, variants.len())?;
    info!("{} subjects in {}", subjects.len(), args.ped.display());

    let relation = match args.relation {
        Some(r) => r,
        None => args
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "genotypes".to_string()),
    };

    let file = std::fs::File::create(&args.output)?;
    let mut writer = BufWriter::new(file);
    arff::write_arff(&mut writer, &relation, &variants, &subjects)?;
    info!("ARFF written to {}", args.output.display());

    Ok(())
}
