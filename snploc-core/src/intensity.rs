//! Per-probe intensity summaries split by pedigree class.

use std::io::Write;

use anyhow::Result;
use rayon::prelude::*;

use snploc_geno::birdseed::IntensityMatrix;

use crate::stats;

/// Mean/variance summary of one probe over one subject class.
#[derive(Debug, Clone, Copy)]
pub struct ClassStats {
    pub n: usize,
    pub mean: f64,
    pub variance: f64,
}

fn class_stats(row: &[f64], indices: &[usize]) -> ClassStats {
    let values: Vec<f64> = indices.iter().map(|&i| row[i]).collect();
    ClassStats {
        n: values.len(),
        mean: stats::mean(&values),
        variance: stats::sample_variance(&values),
    }
}

/// Summary of one probe across both classes.
#[derive(Debug, Clone)]
pub struct ProbeSummary {
    pub probe_id: String,
    pub parents: ClassStats,
    pub offspring: ClassStats,
}

/// Summarize every probe of an intensity matrix.
///
/// `parent_indices` and `offspring_indices` are column indices into the
/// matrix's subject order, as resolved by `Tfam::parent_indices`.
pub fn summarize(
    matrix: &IntensityMatrix,
    parent_indices: &[usize],
    offspring_indices: &[usize],
) -> Vec<ProbeSummary> {
    matrix
        .probes
        .par_iter()
        .zip(matrix.values.par_iter())
        .map(|(probe_id, row)| ProbeSummary {
            probe_id: probe_id.clone(),
            parents: class_stats(row, parent_indices),
            offspring: class_stats(row, offspring_indices),
        })
        .collect()
}

/// Write probe summaries as TSV.
pub fn write_summary<W: Write>(writer: &mut W, summaries: &[ProbeSummary]) -> Result<()> {
    writeln!(
        writer,
        "probe_id\tn_parents\tparent_mean\tparent_var\tn_offspring\toffspring_mean\toffspring_var"
    )?;
    for s in summaries {
        writeln!(
            writer,
            "{}\t{}\t{:.6}\t{:.6}\t{}\t{:.6}\t{:.6}",
            s.probe_id,
            s.parents.n,
            s.parents.mean,
            s.parents.variance,
            s.offspring.n,
            s.offspring.mean,
            s.offspring.variance
        )?;
    }
    Ok(())
}
