//! Gene-set colocalization around SNP loci.
//!
//! snploc coloc --loci-file loci.tsv --mart-file mart_export.txt.gz \
//!     --library-file GO_BP.txt.gz --window-size 1000000 --output out.tsv

use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use snploc_core::region::{self, Locus};
use snploc_core::{coloc, GeneDatabase, LocusWindows, SnpDatabase};
use snploc_geno::enrichr;
use snploc_geno::reader::{numbered_lines, open_text};

#[derive(Args)]
pub struct ColocArgs {
    /// Loci TSV (rsID, chr, pos; no header)
    #[arg(long)]
    loci_file: Option<PathBuf>,

    /// File of rsIDs (one per line) to resolve against --ucsc-file
    #[arg(long)]
    rsids_file: Option<PathBuf>,

    /// UCSC dbSNP table used to resolve --rsids-file
    #[arg(long)]
    ucsc_file: Option<PathBuf>,

    /// Biomart gene export (.txt or .txt.gz)
    #[arg(long)]
    mart_file: PathBuf,

    /// Enrichment library file (repeatable)
    #[arg(long)]
    library_file: Vec<PathBuf>,

    /// Directory of .txt.gz enrichment libraries
    #[arg(long)]
    library_dir: Option<PathBuf>,

    /// Window size in base pairs, centred on each locus
    #[arg(long, default_value = "1000000")]
    window_size: u64,

    /// Output TSV path
    #[arg(long)]
    output: PathBuf,
}

pub fn run(args: ColocArgs) -> Result<()> {
    let loci = load_loci(&args)?;
    if loci.is_empty() {
        anyhow::bail!("No loci to test");
    }
    info!("{} loci loaded", loci.len());

    let windows = LocusWindows::build(&loci, args.window_size);
    info!(
        "{} windows of {} bp after coalescing",
        windows.n_windows(),
        args.window_size
    );

    let gene_db = GeneDatabase::load_mart_export(&args.mart_file)?;
    info!("{} genes indexed", gene_db.n_genes());

    let mut library_paths = args.library_file.clone();
    if let Some(ref dir) = args.library_dir {
        library_paths.extend(enrichr::list_libraries(dir)?);
    }
    if library_paths.is_empty() {
        anyhow::bail!("Must specify --library-file or --library-dir");
    }

    let mut libraries = Vec::new();
    for path in &library_paths {
        let library = enrichr::parse_library(path)?;
        info!("Library {}: {} gene sets", library.name, library.sets.len());
        libraries.push(library);
    }

    let results = coloc::test_libraries(&gene_db, &windows, &libraries)?;
    info!("{} gene sets tested", results.len());

    let file = std::fs::File::create(&args.output)?;
    let mut writer = BufWriter::new(file);
    coloc::write_results(&mut writer, &results)?;
    info!("Results written to {}", args.output.display());

    Ok(())
}

/// Loci from a TSV, or rsIDs resolved against a dbSNP table.
fn load_loci(args: &ColocArgs) -> Result<Vec<Locus>> {
    if let Some(ref path) = args.loci_file {
        return region::read_loci_tsv(path);
    }

    let rsids_path = args
        .rsids_file
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Must specify --loci-file or --rsids-file"))?;
    let ucsc_path = args
        .ucsc_file
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("--rsids-file requires --ucsc-file"))?;

    let mut db = SnpDatabase::new();
    db.load_ucsc_table(ucsc_path)?;

    let reader = open_text(rsids_path)?;
    let mut loci = Vec::new();
    for item in numbered_lines(reader) {
        let (_, line) = item?;
        let rs_id = line.trim();
        match find_locus(&db, rs_id) {
            Some(locus) => loci.push(locus),
            None => warn!("rsID {} not found in {}", rs_id, ucsc_path.display()),
        }
    }

    Ok(loci)
}

/// Scan the chromosomes for an rsID's coordinates.
fn find_locus(db: &SnpDatabase, rs_id: &str) -> Option<Locus> {
    for chro in db.chromosomes() {
        if let Some(pos) = db.position(chro, rs_id) {
            return Some(Locus {
                rs_id: rs_id.to_string(),
                chro: chro.to_string(),
                pos,
            });
        }
    }
    None
}
