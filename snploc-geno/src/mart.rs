//! Biomart gene export parser.
//!
//! Tab-separated export with a header line; columns:
//! Gene stable ID, Chromosome/scaffold name, Gene start (bp), Gene end (bp),
//! Strand, Gene name, Gene type. Usually shipped gzipped.
//!
//! Non-primary scaffolds are skipped at parse time like the dbSNP loader.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::chrom;
use crate::reader::{numbered_lines, open_text};

/// Transcription strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

/// One gene row of a mart export.
#[derive(Debug, Clone)]
pub struct GeneRecord {
    pub id: String,
    pub name: String,
    pub chro: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub biotype: String,
}

/// Parse a mart export file, keeping primary-chromosome genes only.
pub fn parse_mart_export(path: &Path) -> Result<Vec<GeneRecord>> {
    let reader = open_text(path)?;
    let mut genes = Vec::new();
    let mut saw_header = false;

    for item in numbered_lines(reader) {
        let (line_num, line) = item?;
        if !saw_header {
            saw_header = true;
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 7 {
            bail!(
                "{}: line {} has {} fields, expected 7",
                path.display(),
                line_num,
                fields.len()
            );
        }

        let chro = fields[1];
        if !chrom::is_primary(chro) {
            continue;
        }

        let start: u64 = fields[2].parse().with_context(|| {
            format!("{}: line {}: invalid gene start '{}'", path.display(), line_num, fields[2])
        })?;
        let end: u64 = fields[3].parse().with_context(|| {
            format!("{}: line {}: invalid gene end '{}'", path.display(), line_num, fields[3])
        })?;
        if end < start {
            bail!(
                "{}: line {}: gene end {} before start {}",
                path.display(),
                line_num,
                end,
                start
            );
        }

        let strand = match fields[4].trim() {
            "1" | "+" => Strand::Forward,
            "-1" | "-" => Strand::Reverse,
            other => bail!("{}: line {}: invalid strand '{}'", path.display(), line_num, other),
        };

        genes.push(GeneRecord {
            id: fields[0].to_string(),
            name: fields[5].to_string(),
            chro: chro.to_string(),
            start,
            end,
            strand,
            biotype: fields[6].to_string(),
        });
    }

    if !saw_header {
        bail!("{}: empty mart export", path.display());
    }
    Ok(genes)
}
