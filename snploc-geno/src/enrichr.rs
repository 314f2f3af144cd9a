//! Enrichment library file parser.
//!
//! Library files follow the GMT convention: one gene set per line,
//! `term<TAB>description<TAB>gene[,weight]<TAB>gene[,weight]...`.
//! Genes without an explicit weight get 1.0. Libraries are distributed as
//! `.txt.gz`, one file per library.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::reader::{numbered_lines, open_text};

/// A member gene of a set, with its library weight.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedGene {
    pub symbol: String,
    pub weight: f64,
}

/// One gene set (a library term).
#[derive(Debug, Clone)]
pub struct GeneSet {
    pub term: String,
    pub genes: Vec<WeightedGene>,
}

impl GeneSet {
    /// Member symbols without weights.
    pub fn symbols(&self) -> Vec<&str> {
        self.genes.iter().map(|g| g.symbol.as_str()).collect()
    }
}

/// A parsed library, gene sets in file order.
#[derive(Debug, Clone)]
pub struct Library {
    pub name: String,
    pub sets: Vec<GeneSet>,
}

/// Parse one library file. The library name is the file stem.
pub fn parse_library(path: &Path) -> Result<Library> {
    let reader = open_text(path)?;
    let mut sets = Vec::new();

    for item in numbered_lines(reader) {
        let (line_num, line) = item?;
        let mut fields = line.split('\t');
        let term = fields
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("{}: line {}: empty term", path.display(), line_num))?;
        // Description column is unused but must be present.
        if fields.next().is_none() {
            bail!("{}: line {}: missing description column", path.display(), line_num);
        }

        let mut genes = Vec::new();
        for entry in fields {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let mut parts = entry.split(',');
            let symbol = parts.next().unwrap_or_default();
            let weight = match parts.next() {
                Some(w) => w.parse::<f64>().with_context(|| {
                    format!("{}: line {}: invalid weight '{}'", path.display(), line_num, w)
                })?,
                None => 1.0,
            };
            genes.push(WeightedGene {
                symbol: symbol.to_string(),
                weight,
            });
        }

        sets.push(GeneSet {
            term: term.to_string(),
            genes,
        });
    }

    let name = library_name(path);
    Ok(Library { name, sets })
}

/// Library name from the file path: stem with `.txt[.gz]` stripped.
fn library_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    name.trim_end_matches(".gz")
        .trim_end_matches(".txt")
        .to_string()
}

/// List the `.txt.gz` library files in a directory, sorted by name.
pub fn list_libraries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut libs = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if path.is_file() && name.ends_with(".txt.gz") {
            libs.push(path);
        }
    }
    libs.sort();
    Ok(libs)
}
