//! Missing-data analysis.
//!
//! Two products: the per-chromosome missingness summary split by pedigree
//! class, and per-probe confidence thresholds — the k-th smallest
//! confidence of a probe's calls, where k is the number of missing calls
//! reported for its SNP. Pushing calls below that threshold to no-call
//! reproduces the observed missingness pattern on a re-clustered dataset.

use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use tracing::debug;

use snploc_geno::confidence::ConfidenceMatrix;
use snploc_geno::lmiss::{LmissRecord, MissingStats};
use snploc_geno::tfam::Tfam;

use crate::snp_db::SnpDatabase;
use crate::stats;

/// Aggregate one chromosome's lmiss reports for both pedigree classes.
///
/// `parents` and `offspring` are the class-restricted PLINK runs over the
/// same SNP set; class sizes come from the pedigree.
pub fn aggregate_missing(
    chro: &str,
    tfam: &Tfam,
    parents: &[LmissRecord],
    offspring: &[LmissRecord],
) -> MissingStats {
    let parent_rates: Vec<f64> = parents.iter().map(|r| r.f_miss).collect();
    let offspring_rates: Vec<f64> = offspring.iter().map(|r| r.f_miss).collect();

    MissingStats {
        chro: chro.to_string(),
        n_parents: tfam.parents().len() as u32,
        n_offspring: tfam.offspring().len() as u32,
        mean_parent_f_miss: zero_if_nan(stats::mean(&parent_rates)),
        mean_offspring_f_miss: zero_if_nan(stats::mean(&offspring_rates)),
    }
}

fn zero_if_nan(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x
    }
}

/// Per-probe confidence threshold.
#[derive(Debug, Clone)]
pub struct ThresholdRecord {
    pub probe_id: String,
    pub rs_id: String,
    /// None when the SNP has no missing calls (no order statistic exists).
    pub threshold: Option<f64>,
}

/// Compute confidence thresholds for every probe of a chromosome.
///
/// Probes lacking an rsID mapping, a confidence row, or an attached lmiss
/// record are skipped; the skip count is returned alongside the records.
pub fn confidence_thresholds(
    chro: &str,
    db: &SnpDatabase,
    confidences: &ConfidenceMatrix,
) -> (Vec<ThresholdRecord>, usize) {
    let mut records = Vec::new();
    let mut n_skipped = 0;

    for probe_id in db.probe_ids(chro) {
        let resolved = db.rs_id_for_probe(Some(chro), probe_id).and_then(|rs_id| {
            let lmiss = db.record(chro, rs_id)?.lmiss.as_ref()?;
            let values = confidences.row(probe_id)?;
            Some((rs_id, lmiss.n_miss, values))
        });

        let (rs_id, n_miss, values) = match resolved {
            Some(r) => r,
            None => {
                n_skipped += 1;
                continue;
            }
        };

        records.push(ThresholdRecord {
            probe_id: probe_id.to_string(),
            rs_id: rs_id.to_string(),
            threshold: kth_smallest(values, n_miss as usize),
        });
    }

    debug!(
        "chr {}: {} thresholds computed, {} probes skipped",
        chro,
        records.len(),
        n_skipped
    );
    (records, n_skipped)
}

/// The k-th order statistic (1-based); None for k == 0 or k beyond the
/// sample.
fn kth_smallest(values: &[f64], k: usize) -> Option<f64> {
    if k == 0 || k > values.len() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted[k - 1])
}

/// Write threshold records as TSV. Absent thresholds are written as -1,
/// the sentinel downstream tooling expects.
pub fn write_thresholds<W: Write>(
    writer: &mut W,
    chro: &str,
    records: &[ThresholdRecord],
) -> Result<()> {
    writeln!(writer, "chro\tprobe_id\tsnp_id\tthreshold")?;
    for r in records {
        match r.threshold {
            Some(t) => writeln!(writer, "{}\t{}\t{}\t{:.6}", chro, r.probe_id, r.rs_id, t)?,
            None => writeln!(writer, "{}\t{}\t{}\t-1", chro, r.probe_id, r.rs_id)?,
        }
    }
    Ok(())
}
