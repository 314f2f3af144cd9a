//! PLINK missingness report parsers.
//!
//! `.lmiss` files are whitespace-aligned with one row per SNP:
//! `CHR SNP N_MISS N_GENO F_MISS`. The aggregated `missing_stats.txt` is a
//! TSV with one row per chromosome carrying the parent/offspring split.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::reader::{numbered_lines, open_text};

/// Per-SNP missingness from a `.lmiss` row.
#[derive(Debug, Clone, PartialEq)]
pub struct LmissRecord {
    pub rs_id: String,
    /// Number of missing genotype calls.
    pub n_miss: u32,
    /// Number of attempted calls.
    pub n_geno: u32,
    /// Missing fraction (n_miss / n_geno as PLINK reports it).
    pub f_miss: f64,
}

/// Parse a single `.lmiss` file. The header row is mandatory.
pub fn parse_lmiss(path: &Path) -> Result<Vec<LmissRecord>> {
    let reader = open_text(path)?;
    let mut records = Vec::new();
    let mut saw_header = false;

    for item in numbered_lines(reader) {
        let (line_num, line) = item?;
        let fields: Vec<&str> = line.split_whitespace().collect();

        if !saw_header {
            if fields.first() != Some(&"CHR") {
                bail!("{}: missing CHR SNP N_MISS N_GENO F_MISS header", path.display());
            }
            saw_header = true;
            continue;
        }

        if fields.len() < 5 {
            bail!(
                "{}: line {} has {} fields, expected 5",
                path.display(),
                line_num,
                fields.len()
            );
        }

        records.push(LmissRecord {
            rs_id: fields[1].to_string(),
            n_miss: fields[2].parse().with_context(|| {
                format!("{}: line {}: invalid N_MISS '{}'", path.display(), line_num, fields[2])
            })?,
            n_geno: fields[3].parse().with_context(|| {
                format!("{}: line {}: invalid N_GENO '{}'", path.display(), line_num, fields[3])
            })?,
            f_miss: fields[4].parse().with_context(|| {
                format!("{}: line {}: invalid F_MISS '{}'", path.display(), line_num, fields[4])
            })?,
        });
    }

    if !saw_header {
        bail!("{}: empty lmiss file", path.display());
    }
    Ok(records)
}

/// Locate per-chromosome `.lmiss` files under `dir` by the `_<chr>.lmiss`
/// suffix convention. A missing autosome is an error naming it.
pub fn chromosome_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut by_chr: HashMap<String, PathBuf> = HashMap::new();

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(stem) = name.strip_suffix(".lmiss") {
            if let Some(idx) = stem.rfind('_') {
                let chro = &stem[idx + 1..];
                if !chro.is_empty() && chro.chars().all(|c| c.is_ascii_digit()) {
                    by_chr.insert(chro.to_string(), entry.path());
                }
            }
        }
    }

    let mut files = Vec::new();
    for chr in 1..=22u8 {
        let chro = chr.to_string();
        match by_chr.remove(&chro) {
            Some(path) => files.push((chro, path)),
            None => bail!("Missing .lmiss file for chromosome {} under {}", chro, dir.display()),
        }
    }
    Ok(files)
}

/// One row of `missing_stats.txt`: per-chromosome missingness split by
/// pedigree class.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingStats {
    pub chro: String,
    pub n_parents: u32,
    pub n_offspring: u32,
    pub mean_parent_f_miss: f64,
    pub mean_offspring_f_miss: f64,
}

const MISSING_STATS_HEADER: &str = "dataset\tchro\tnparents\tnchildren\tavgMissPar\tavgMissChild";

/// Read a `missing_stats.txt` summary into a chromosome-keyed map.
pub fn read_missing_stats(path: &Path) -> Result<HashMap<String, MissingStats>> {
    let reader = open_text(path)?;
    let mut stats = HashMap::new();
    let mut saw_header = false;

    for item in numbered_lines(reader) {
        let (line_num, line) = item?;
        if !saw_header {
            saw_header = true;
            continue; // header
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 6 {
            bail!(
                "{}: line {} has {} fields, expected 6",
                path.display(),
                line_num,
                fields.len()
            );
        }

        let chro = fields[1].to_string();
        let parse_err = |what: &str, val: &str| {
            format!("{}: line {}: invalid {} '{}'", path.display(), line_num, what, val)
        };
        stats.insert(
            chro.clone(),
            MissingStats {
                chro,
                n_parents: fields[2].parse().with_context(|| parse_err("nparents", fields[2]))?,
                n_offspring: fields[3].parse().with_context(|| parse_err("nchildren", fields[3]))?,
                mean_parent_f_miss: fields[4]
                    .parse()
                    .with_context(|| parse_err("avgMissPar", fields[4]))?,
                mean_offspring_f_miss: fields[5]
                    .parse()
                    .with_context(|| parse_err("avgMissChild", fields[5]))?,
            },
        );
    }

    Ok(stats)
}

/// Write a `missing_stats.txt` summary. Rows are written in the given order.
pub fn write_missing_stats<W: Write>(
    writer: &mut W,
    dataset: &str,
    rows: &[MissingStats],
) -> Result<()> {
    writeln!(writer, "{}", MISSING_STATS_HEADER)?;
    for row in rows {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.6}\t{:.6}",
            dataset,
            row.chro,
            row.n_parents,
            row.n_offspring,
            row.mean_parent_f_miss,
            row.mean_offspring_f_miss
        )?;
    }
    Ok(())
}
