//! Birdseed genotyping output parsers.
//!
//! Two Birdseed products are consumed:
//! - per-chromosome call files (`<subject>.birdseed-v2.<chr>.txt.gz`) carrying
//!   the probe-to-rsID-to-position mapping of the array,
//! - the summary intensity matrix (`probeset_id` header plus one row of f64
//!   intensities per probe).
//!
//! Call files embed the chromosome in the file name, not in the rows, so
//! loading a whole study means discovering one file per autosome.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::reader::{numbered_lines, open_text};

/// Call-file columns of interest.
const F_PROBE_ID: usize = 0;
const F_RS_ID: usize = 8;
const F_POS: usize = 9;

/// One row of a Birdseed call file.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub probe_id: String,
    pub rs_id: String,
    pub pos: u64,
}

/// Parse a single per-chromosome call file.
///
/// Comment lines (`#`) and the column header (starting with `Probe`) are
/// skipped, matching the files as Birdseed writes them.
pub fn parse_calls(path: &Path) -> Result<Vec<CallRecord>> {
    let reader = open_text(path)?;
    let mut records = Vec::new();

    for item in numbered_lines(reader) {
        let (line_num, line) = item?;
        if line.starts_with('#') || line.starts_with("Probe") {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() <= F_POS {
            bail!(
                "{}: line {} has {} fields, expected at least {}",
                path.display(),
                line_num,
                fields.len(),
                F_POS + 1
            );
        }

        let pos: u64 = fields[F_POS].trim().parse().with_context(|| {
            format!("{}: line {}: invalid position '{}'", path.display(), line_num, fields[F_POS])
        })?;

        records.push(CallRecord {
            probe_id: fields[F_PROBE_ID].to_string(),
            rs_id: fields[F_RS_ID].to_string(),
            pos,
        });
    }

    Ok(records)
}

/// Locate the per-chromosome call files for a subject under `dir`.
///
/// Returns `(chromosome, path)` pairs for autosomes 1..=22. A missing
/// chromosome file is an error naming the chromosome.
pub fn chromosome_files(dir: &Path, subject: &str) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for chr in 1..=22u8 {
        let chro = chr.to_string();
        let name = format!("{}.birdseed-v2.{}.txt.gz", subject, chro);
        let path = dir.join(&name);
        if !path.is_file() {
            // Uncompressed variants show up in reprocessed drops.
            let alt = dir.join(format!("{}.birdseed-v2.{}.txt", subject, chro));
            if alt.is_file() {
                files.push((chro, alt));
                continue;
            }
            bail!(
                "Missing birdseed call file for chromosome {} (expected {})",
                chro,
                path.display()
            );
        }
        files.push((chro, path));
    }
    Ok(files)
}

/// Summary intensity matrix: probes x subjects.
#[derive(Debug, Clone)]
pub struct IntensityMatrix {
    /// Subject names from the header, file extensions stripped.
    pub subjects: Vec<String>,
    /// Probe IDs in file order.
    pub probes: Vec<String>,
    /// One row of intensities per probe, `subjects.len()` wide.
    pub values: Vec<Vec<f64>>,
    index: HashMap<String, usize>,
}

impl IntensityMatrix {
    /// Intensities for one probe, if present.
    pub fn row(&self, probe_id: &str) -> Option<&[f64]> {
        self.index.get(probe_id).map(|&i| self.values[i].as_slice())
    }

    pub fn n_probes(&self) -> usize {
        self.probes.len()
    }
}

/// Parse a Birdseed summary intensity file.
///
/// `limit` caps the number of probe rows read (None = all); the original
/// exploratory runs used it to keep memory bounded on the full array.
pub fn parse_summary_intensities(path: &Path, limit: Option<usize>) -> Result<IntensityMatrix> {
    let reader = open_text(path)?;

    let mut subjects: Option<Vec<String>> = None;
    let mut probes = Vec::new();
    let mut values = Vec::new();
    let mut index = HashMap::new();

    for item in numbered_lines(reader) {
        let (line_num, line) = item?;
        if line.starts_with('#') {
            continue;
        }

        if line.starts_with("probeset_id") {
            let names: Vec<String> = line
                .split('\t')
                .skip(1)
                .map(|s| strip_extension(s).to_string())
                .collect();
            subjects = Some(names);
            continue;
        }

        let subjects = subjects.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "{}: line {}: data row before the probeset_id header",
                path.display(),
                line_num
            )
        })?;

        let mut fields = line.split('\t');
        let probe_id = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("{}: line {}: empty row", path.display(), line_num))?;

        let row: Vec<f64> = fields
            .map(|v| {
                v.trim().parse::<f64>().with_context(|| {
                    format!("{}: line {}: invalid intensity '{}'", path.display(), line_num, v)
                })
            })
            .collect::<Result<_>>()?;

        if row.len() != subjects.len() {
            bail!(
                "{}: line {}: {} intensities for {} subjects",
                path.display(),
                line_num,
                row.len(),
                subjects.len()
            );
        }

        index.insert(probe_id.to_string(), probes.len());
        probes.push(probe_id.to_string());
        values.push(row);

        if let Some(limit) = limit {
            if probes.len() == limit {
                break;
            }
        }
    }

    let subjects = subjects
        .ok_or_else(|| anyhow::anyhow!("{}: no probeset_id header found", path.display()))?;

    Ok(IntensityMatrix {
        subjects,
        probes,
        values,
        index,
    })
}

/// Drop a trailing file extension ("S1.CEL" -> "S1").
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}
