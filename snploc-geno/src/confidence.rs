//! Genotype-confidence matrix parser.
//!
//! CRLMM writes its per-call confidence matrix space-separated with quoted
//! names: a header of quoted subject file paths, then one row per probe with
//! the quoted probe ID followed by one confidence per subject.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::reader::{numbered_lines, open_text};

/// Confidence matrix: probes x subjects.
#[derive(Debug, Clone)]
pub struct ConfidenceMatrix {
    /// Subject names from the header, paths and extensions stripped.
    pub subjects: Vec<String>,
    /// Probe IDs in file order.
    pub probes: Vec<String>,
    /// One row of confidences per probe, `subjects.len()` wide.
    pub values: Vec<Vec<f64>>,
    index: HashMap<String, usize>,
}

impl ConfidenceMatrix {
    /// Confidences for one probe, if present.
    pub fn row(&self, probe_id: &str) -> Option<&[f64]> {
        self.index.get(probe_id).map(|&i| self.values[i].as_slice())
    }

    pub fn n_probes(&self) -> usize {
        self.probes.len()
    }
}

/// Parse a confidence matrix file.
pub fn parse_confidences(path: &Path) -> Result<ConfidenceMatrix> {
    let reader = open_text(path)?;

    let mut subjects: Option<Vec<String>> = None;
    let mut probes = Vec::new();
    let mut values = Vec::new();
    let mut index = HashMap::new();

    for item in numbered_lines(reader) {
        let (line_num, line) = item?;

        if subjects.is_none() {
            let names: Vec<String> = line
                .split_whitespace()
                .map(|s| subject_stem(unquote(s)).to_string())
                .collect();
            if names.is_empty() {
                bail!("{}: empty header", path.display());
            }
            subjects = Some(names);
            continue;
        }

        let subjects = subjects
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("{}: data row before header", path.display()))?;
        let mut fields = line.split_whitespace();
        let probe_id = unquote(fields.next().unwrap_or_default());
        if probe_id.is_empty() {
            bail!("{}: line {}: empty probe id", path.display(), line_num);
        }

        let row: Vec<f64> = fields
            .map(|v| {
                v.parse::<f64>().with_context(|| {
                    format!("{}: line {}: invalid confidence '{}'", path.display(), line_num, v)
                })
            })
            .collect::<Result<_>>()?;

        if row.len() != subjects.len() {
            bail!(
                "{}: line {}: {} confidences for {} subjects",
                path.display(),
                line_num,
                row.len(),
                subjects.len()
            );
        }

        index.insert(probe_id.to_string(), probes.len());
        probes.push(probe_id.to_string());
        values.push(row);
    }

    let subjects =
        subjects.ok_or_else(|| anyhow::anyhow!("{}: empty confidence file", path.display()))?;

    Ok(ConfidenceMatrix {
        subjects,
        probes,
        values,
        index,
    })
}

fn unquote(s: &str) -> &str {
    s.trim_matches('"')
}

/// Reduce a subject header entry to its stem:
/// `/data/cel/S1.CEL` -> `S1`.
fn subject_stem(s: &str) -> &str {
    let base = s.rsplit('/').next().unwrap_or(s);
    match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    }
}
