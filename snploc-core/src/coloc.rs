//! Gene-set colocalization testing.
//!
//! For each gene set of an enrichment library, counts member genes falling
//! inside the locus windows against the rest of the gene database, tests
//! the 2x2 table with Fisher's exact test, and corrects across every set
//! of the run with Benjamini-Hochberg.

use std::collections::{BTreeSet, HashSet};
use std::io::Write;

use anyhow::Result;
use rayon::prelude::*;
use tracing::debug;

use snploc_geno::enrichr::Library;

use crate::gene_db::GeneDatabase;
use crate::region::LocusWindows;
use crate::stats::{self, ContingencyTable};

/// Result of testing one gene set against the locus windows.
#[derive(Debug, Clone)]
pub struct SetResult {
    pub library: String,
    pub term: String,
    /// Unique database genes resolved from the set's symbols.
    pub n_genes: usize,
    /// Set symbols with no database entry.
    pub n_unknown: usize,
    /// Set genes overlapping a window.
    pub n_in_window: usize,
    /// Background genes (database minus the set).
    pub n_background: usize,
    /// Background genes overlapping a window.
    pub n_background_in_window: usize,
    pub odds_ratio: f64,
    pub p_value: f64,
    /// Benjamini-Hochberg adjusted p-value across the whole run.
    pub fdr: f64,
}

/// Genes of the database flagged by window overlap, computed once per run.
struct WindowedGenes {
    in_window: HashSet<String>,
    n_total: usize,
}

impl WindowedGenes {
    fn compute(db: &GeneDatabase, windows: &LocusWindows) -> Self {
        let mut in_window = HashSet::new();
        for chro in db.chromosomes() {
            for gene in db.chr_genes(chro) {
                if windows.overlaps(chro, gene.start, gene.end) {
                    in_window.insert(gene.id.clone());
                }
            }
        }
        WindowedGenes {
            in_window,
            n_total: db.n_genes(),
        }
    }
}

/// Test every gene set of the given libraries against the windows.
///
/// Results carry run-wide FDR and come back sorted by ascending p-value,
/// ties broken by term name.
pub fn test_libraries(
    db: &GeneDatabase,
    windows: &LocusWindows,
    libraries: &[Library],
) -> Result<Vec<SetResult>> {
    let windowed = WindowedGenes::compute(db, windows);
    debug!(
        "{} of {} database genes fall inside the {} windows",
        windowed.in_window.len(),
        windowed.n_total,
        windows.n_windows()
    );

    let mut results: Vec<SetResult> = libraries
        .par_iter()
        .flat_map(|library| {
            library
                .sets
                .par_iter()
                .map(|set| test_set(db, &windowed, &library.name, set))
                .collect::<Vec<_>>()
        })
        .collect();

    let pvalues: Vec<f64> = results.iter().map(|r| r.p_value).collect();
    let fdr = stats::benjamini_hochberg(&pvalues);
    for (result, q) in results.iter_mut().zip(fdr) {
        result.fdr = q;
    }

    results.sort_by(|a, b| {
        a.p_value
            .total_cmp(&b.p_value)
            .then_with(|| a.term.cmp(&b.term))
    });
    Ok(results)
}

fn test_set(
    db: &GeneDatabase,
    windowed: &WindowedGenes,
    library: &str,
    set: &snploc_geno::enrichr::GeneSet,
) -> SetResult {
    // Resolve symbols to unique gene IDs; a symbol shared by several
    // database entries contributes all of them.
    let mut ids: BTreeSet<&str> = BTreeSet::new();
    let mut n_unknown = 0;
    for gene in &set.genes {
        let records = db.by_symbol(&gene.symbol);
        if records.is_empty() {
            n_unknown += 1;
        } else {
            ids.extend(records.iter().map(|r| r.id.as_str()));
        }
    }

    let n_genes = ids.len();
    let n_in_window = ids
        .iter()
        .filter(|id| windowed.in_window.contains(**id))
        .count();

    let n_background = windowed.n_total - n_genes;
    let n_background_in_window = windowed.in_window.len() - n_in_window;

    let table = ContingencyTable {
        a: n_in_window as u64,
        b: (n_genes - n_in_window) as u64,
        c: n_background_in_window as u64,
        d: (n_background - n_background_in_window) as u64,
    };

    SetResult {
        library: library.to_string(),
        term: set.term.clone(),
        n_genes,
        n_unknown,
        n_in_window,
        n_background,
        n_background_in_window,
        odds_ratio: table.odds_ratio(),
        p_value: stats::fisher_exact(&table),
        fdr: f64::NAN, // filled in after the run-wide correction
    }
}

/// Write colocalization results as TSV.
pub fn write_results<W: Write>(writer: &mut W, results: &[SetResult]) -> Result<()> {
    writeln!(
        writer,
        "library\tterm\tn_genes\tn_unknown\tn_in_window\tn_background\tn_background_in_window\todds_ratio\tp_value\tfdr"
    )?;
    for r in results {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.6}\t{:.6e}\t{:.6e}",
            r.library,
            r.term,
            r.n_genes,
            r.n_unknown,
            r.n_in_window,
            r.n_background,
            r.n_background_in_window,
            r.odds_ratio,
            r.p_value,
            r.fdr
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Locus;
    use snploc_geno::enrichr::{GeneSet, WeightedGene};
    use snploc_geno::mart::{GeneRecord, Strand};

    fn gene(id: &str, name: &str, chro: &str, start: u64, end: u64) -> GeneRecord {
        GeneRecord {
            id: id.to_string(),
            name: name.to_string(),
            chro: chro.to_string(),
            start,
            end,
            strand: Strand::Forward,
            biotype: "protein_coding".to_string(),
        }
    }

    fn weighted(symbol: &str) -> WeightedGene {
        WeightedGene {
            symbol: symbol.to_string(),
            weight: 1.0,
        }
    }

    fn library(name: &str, sets: Vec<(&str, Vec<&str>)>) -> Library {
        Library {
            name: name.to_string(),
            sets: sets
                .into_iter()
                .map(|(term, symbols)| GeneSet {
                    term: term.to_string(),
                    genes: symbols.into_iter().map(weighted).collect(),
                })
                .collect(),
        }
    }

    /// Ten genes on chr1 at 1000, 2000, ..., 10000, spans of 100 bp.
    fn test_db() -> GeneDatabase {
        let records = (1..=10)
            .map(|i| {
                gene(
                    &format!("G{}", i),
                    &format!("SYM{}", i),
                    "1",
                    i * 1000,
                    i * 1000 + 100,
                )
            })
            .collect();
        GeneDatabase::from_records(records)
    }

    #[test]
    fn test_enriched_set_ranks_first() {
        let db = test_db();
        // Windows covering genes G1..G4.
        let loci = vec![Locus {
            rs_id: "rs1".to_string(),
            chro: "1".to_string(),
            pos: 2500,
        }];
        let windows = LocusWindows::build(&loci, 4000); // [500, 4500)

        let libs = vec![library(
            "test_lib",
            vec![
                ("in_windows", vec!["SYM1", "SYM2", "SYM3", "SYM4"]),
                ("outside", vec!["SYM7", "SYM8", "SYM9", "SYM10"]),
            ],
        )];

        let results = test_libraries(&db, &windows, &libs).unwrap();
        assert_eq!(results.len(), 2);

        let top = &results[0];
        assert_eq!(top.term, "in_windows");
        assert_eq!(top.n_genes, 4);
        assert_eq!(top.n_in_window, 4);
        assert_eq!(top.n_background, 6);
        assert_eq!(top.n_background_in_window, 0);
        assert!(top.p_value < 0.01);

        let bottom = &results[1];
        assert_eq!(bottom.term, "outside");
        assert_eq!(bottom.n_in_window, 0);
        assert!(bottom.p_value > top.p_value);

        // FDR is filled and at least the raw p-value.
        for r in &results {
            assert!(r.fdr >= r.p_value);
        }
    }

    #[test]
    fn test_unknown_symbols_counted() {
        let db = test_db();
        let windows = LocusWindows::build(&[], 1000);
        let libs = vec![library("lib", vec![("set", vec!["SYM1", "NOT_A_GENE"])])];

        let results = test_libraries(&db, &windows, &libs).unwrap();
        assert_eq!(results[0].n_genes, 1);
        assert_eq!(results[0].n_unknown, 1);
        assert_eq!(results[0].n_in_window, 0);
        assert_eq!(results[0].p_value, 1.0);
    }

    #[test]
    fn test_write_results_header() {
        let mut out = Vec::new();
        write_results(&mut out, &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("library\tterm\t"));
        assert_eq!(text.lines().count(), 1);
    }
}
