//! PLINK text MAP/PED parsers.
//!
//! MAP: one variant per line — chromosome, rsID, genetic distance, bp
//! position. PED: one subject per line — the six TFAM columns followed by
//! two allele calls per variant, in MAP order.
//!
//! Allele calls are recoded per variant to minor-allele dosage {0, 1, 2};
//! `0`, `?` and `N` calls are missing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::reader::{numbered_lines, open_text};
use crate::tfam::{Phenotype, Sex};

/// One MAP row.
#[derive(Debug, Clone)]
pub struct MapEntry {
    pub chro: String,
    pub rs_id: String,
    pub cm: f64,
    pub pos: u64,
}

/// Parse a .map file.
pub fn parse_map(path: &Path) -> Result<Vec<MapEntry>> {
    let reader = open_text(path)?;
    let mut entries = Vec::new();

    for item in numbered_lines(reader) {
        let (line_num, line) = item?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            bail!(
                "{}: line {} has {} fields, expected 4",
                path.display(),
                line_num,
                fields.len()
            );
        }

        entries.push(MapEntry {
            chro: fields[0].to_string(),
            rs_id: fields[1].to_string(),
            cm: fields[2].parse().unwrap_or(0.0),
            pos: fields[3].parse().with_context(|| {
                format!("{}: line {}: invalid position '{}'", path.display(), line_num, fields[3])
            })?,
        });
    }

    Ok(entries)
}

/// Locate per-chromosome .map files under `dir`.
///
/// `pattern` carries a `{chr}` placeholder, e.g. `study_merged{chr}`;
/// chromosomes whose file is absent are skipped. At least one match is
/// required.
pub fn map_files(dir: &Path, pattern: &str) -> Result<Vec<(String, PathBuf)>> {
    if !pattern.contains("{chr}") {
        bail!("Map file pattern '{}' has no {{chr}} placeholder", pattern);
    }

    let chromosomes: Vec<String> = (1..=22u8)
        .map(|c| c.to_string())
        .chain(["X".to_string(), "Y".to_string()])
        .collect();

    let mut files = Vec::new();
    for chro in &chromosomes {
        let name = format!("{}.map", pattern.replace("{chr}", chro));
        let path = dir.join(&name);
        if path.is_file() {
            files.push((chro.clone(), path));
        }
    }

    if files.is_empty() {
        bail!(
            "No map files matching '{}' under {}",
            pattern,
            dir.display()
        );
    }
    Ok(files)
}

/// One PED subject after dosage recoding.
#[derive(Debug, Clone)]
pub struct PedSubject {
    pub fid: String,
    pub iid: String,
    pub sex: Sex,
    pub phenotype: Phenotype,
    /// Minor-allele dosage per variant, MAP order. None = missing call.
    pub dosages: Vec<Option<u8>>,
}

const MISSING_ALLELES: [&str; 3] = ["0", "?", "N"];

/// Parse a .ped file against its MAP variant list and recode genotypes to
/// minor-allele dosages.
pub fn parse_ped(path: &Path, n_variants: usize) -> Result<Vec<PedSubject>> {
    let reader = open_text(path)?;

    // First pass over rows keeps raw allele pairs; minor alleles are only
    // known once the whole column has been seen.
    struct RawSubject {
        fid: String,
        iid: String,
        sex: Sex,
        phenotype: Phenotype,
        alleles: Vec<(String, String)>,
    }

    let mut raw: Vec<RawSubject> = Vec::new();

    for item in numbered_lines(reader) {
        let (line_num, line) = item?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let expected = 6 + 2 * n_variants;
        if fields.len() != expected {
            bail!(
                "{}: line {} has {} fields, expected {} (6 + 2 x {} variants)",
                path.display(),
                line_num,
                fields.len(),
                expected,
                n_variants
            );
        }

        let alleles: Vec<(String, String)> = (0..n_variants)
            .map(|i| {
                (
                    fields[6 + 2 * i].to_string(),
                    fields[6 + 2 * i + 1].to_string(),
                )
            })
            .collect();

        raw.push(RawSubject {
            fid: fields[0].to_string(),
            iid: fields[1].to_string(),
            sex: parse_sex(fields[4]),
            phenotype: parse_phenotype(fields[5]),
            alleles,
        });
    }

    // Determine the minor allele per variant from the full column.
    let minor: Vec<Option<String>> = (0..n_variants)
        .map(|v| minor_allele(raw.iter().map(|s| &s.alleles[v])))
        .collect();

    let subjects = raw
        .into_iter()
        .map(|s| {
            let dosages = s
                .alleles
                .iter()
                .zip(minor.iter())
                .map(|((a1, a2), minor)| recode(a1, a2, minor.as_deref()))
                .collect();
            PedSubject {
                fid: s.fid,
                iid: s.iid,
                sex: s.sex,
                phenotype: s.phenotype,
                dosages,
            }
        })
        .collect();

    Ok(subjects)
}

fn parse_sex(s: &str) -> Sex {
    match s {
        "1" => Sex::Male,
        "2" => Sex::Female,
        _ => Sex::Unknown,
    }
}

fn parse_phenotype(s: &str) -> Phenotype {
    match s {
        "1" => Phenotype::Control,
        "2" => Phenotype::Case,
        _ => Phenotype::Missing,
    }
}

/// The less frequent allele of a variant column; None if every call is
/// missing. Ties resolve lexicographically for stable output.
fn minor_allele<'a>(pairs: impl Iterator<Item = &'a (String, String)>) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (a1, a2) in pairs {
        for a in [a1.as_str(), a2.as_str()] {
            if !MISSING_ALLELES.contains(&a) {
                *counts.entry(a).or_insert(0) += 1;
            }
        }
    }

    counts
        .into_iter()
        .min_by(|(a, ca), (b, cb)| ca.cmp(cb).then(a.cmp(b)))
        .map(|(allele, _)| allele.to_string())
}

fn recode(a1: &str, a2: &str, minor: Option<&str>) -> Option<u8> {
    if MISSING_ALLELES.contains(&a1) || MISSING_ALLELES.contains(&a2) {
        return None;
    }
    let minor = minor?;
    Some((a1 == minor) as u8 + (a2 == minor) as u8)
}
