//! Gene database with positional overlap lookup.
//!
//! Genes are indexed by stable ID and by symbol, and stored per chromosome
//! sorted by start position. Overlap queries binary-search the start
//! coordinate and scan back far enough to catch genes that start before
//! the window but extend into it; the scan-back distance is bounded by the
//! longest gene seen on that chromosome.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Result;

use snploc_geno::chrom;
use snploc_geno::mart::{self, GeneRecord};

/// Location of a gene inside the database: (chromosome, index into the
/// chromosome's start-sorted vector).
type GeneSlot = (String, usize);

/// The gene database. Built fresh from a mart export on every run.
#[derive(Debug, Default)]
pub struct GeneDatabase {
    /// Start-sorted genes per chromosome.
    chr_index: HashMap<String, Vec<GeneRecord>>,
    /// Longest gene span per chromosome, for the overlap scan-back bound.
    max_span: HashMap<String, u64>,
    by_id: HashMap<String, GeneSlot>,
    by_symbol: HashMap<String, Vec<GeneSlot>>,
    n_genes: usize,
}

impl GeneDatabase {
    /// Load a biomart export file.
    pub fn load_mart_export(path: &Path) -> Result<Self> {
        Ok(Self::from_records(mart::parse_mart_export(path)?))
    }

    /// Build from already-parsed gene records. Duplicate gene IDs keep the
    /// first occurrence.
    pub fn from_records(records: Vec<GeneRecord>) -> Self {
        let mut db = GeneDatabase::default();

        let mut seen: HashSet<String> = HashSet::new();
        let mut per_chr: HashMap<String, Vec<GeneRecord>> = HashMap::new();
        for record in records {
            if !seen.insert(record.id.clone()) {
                continue;
            }
            per_chr.entry(record.chro.clone()).or_default().push(record);
        }

        for (chro, mut genes) in per_chr {
            genes.sort_by_key(|g| (g.start, g.end, g.id.clone()));

            let max_span = genes.iter().map(|g| g.end - g.start).max().unwrap_or(0);
            db.max_span.insert(chro.clone(), max_span);

            for (i, gene) in genes.iter().enumerate() {
                db.by_id.insert(gene.id.clone(), (chro.clone(), i));
                if !gene.name.is_empty() {
                    db.by_symbol
                        .entry(gene.name.clone())
                        .or_default()
                        .push((chro.clone(), i));
                }
            }
            db.n_genes += genes.len();
            db.chr_index.insert(chro, genes);
        }

        db
    }

    pub fn n_genes(&self) -> usize {
        self.n_genes
    }

    pub fn by_id(&self, id: &str) -> Option<&GeneRecord> {
        let (chro, i) = self.by_id.get(id)?;
        Some(&self.chr_index[chro][*i])
    }

    /// All genes carrying a symbol (symbols are not unique across
    /// assemblies' readthrough/paralog entries).
    pub fn by_symbol(&self, symbol: &str) -> Vec<&GeneRecord> {
        match self.by_symbol.get(symbol) {
            Some(slots) => slots
                .iter()
                .map(|(chro, i)| &self.chr_index[chro][*i])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Genes on a chromosome, start-sorted.
    pub fn chr_genes(&self, chro: &str) -> &[GeneRecord] {
        self.chr_index.get(chro).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Chromosomes present, in karyotype order.
    pub fn chromosomes(&self) -> Vec<&str> {
        let mut chrs: Vec<&str> = self.chr_index.keys().map(|s| s.as_str()).collect();
        chrs.sort_by_key(|c| chrom::sort_key(c));
        chrs
    }

    /// Genes whose `[start, end]` span intersects `[min_pos, max_pos)`.
    pub fn genes_overlapping(&self, chro: &str, min_pos: u64, max_pos: u64) -> Vec<&GeneRecord> {
        let genes = match self.chr_index.get(chro) {
            Some(g) => g,
            None => return Vec::new(),
        };
        if min_pos >= max_pos {
            return Vec::new();
        }

        // A gene overlapping the window starts no earlier than
        // min_pos - max_span, so seek there and scan forward.
        let max_span = self.max_span.get(chro).copied().unwrap_or(0);
        let scan_from = min_pos.saturating_sub(max_span);
        let start_idx = genes.partition_point(|g| g.start < scan_from);

        let mut hits = Vec::new();
        for gene in &genes[start_idx..] {
            if gene.start >= max_pos {
                break;
            }
            if gene.end >= min_pos {
                hits.push(gene);
            }
        }
        hits
    }

    /// Gene IDs in the database that are absent from the given set — the
    /// background universe for enrichment contingency tables.
    pub fn difference(&self, gene_ids: &HashSet<String>) -> Vec<&str> {
        let mut diff: Vec<&str> = self
            .by_id
            .keys()
            .filter(|id| !gene_ids.contains(*id))
            .map(|s| s.as_str())
            .collect();
        diff.sort_unstable();
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snploc_geno::mart::Strand;

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

    fn test_db() -> GeneDatabase {
        GeneDatabase::from_records(vec![
            gene("G1", "ALPHA", "1", 100, 500),
            gene("G2", "BETA", "1", 1000, 1200),
            gene("G3", "GAMMA", "1", 2000, 9000), // long gene
            gene("G4", "DELTA", "2", 50, 80),
        ])
    }

    #[test]
    fn test_lookup() {
        let db = test_db();
        assert_eq!(db.n_genes(), 4);
        assert_eq!(db.by_id("G2").unwrap().name, "BETA");
        assert!(db.by_id("G9").is_none());
        assert_eq!(db.by_symbol("DELTA")[0].id, "G4");
        assert!(db.by_symbol("OMEGA").is_empty());
        assert_eq!(db.chromosomes(), vec!["1", "2"]);
    }

    #[test]
    fn test_chr_genes_sorted() {
        let db = GeneDatabase::from_records(vec![
            gene("B", "B", "1", 500, 600),
            gene("A", "A", "1", 100, 200),
        ]);
        let starts: Vec<u64> = db.chr_genes("1").iter().map(|g| g.start).collect();
        assert_eq!(starts, vec![100, 500]);
    }

    #[test]
    fn test_overlap_basic() {
        let db = test_db();

        // Window inside G2 only.
        let hits = db.genes_overlapping("1", 1100, 1150);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "G2");

        // Window covering end of G1 and start of G2.
        let hits = db.genes_overlapping("1", 400, 1001);
        let ids: Vec<&str> = hits.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["G1", "G2"]);

        // Empty window.
        assert!(db.genes_overlapping("1", 600, 600).is_empty());
        assert!(db.genes_overlapping("7", 0, 10_000).is_empty());
    }

    #[test]
    fn test_overlap_spanning_gene() {
        let db = test_db();
        // G3 spans 2000..9000; a window strictly inside it must match.
        let hits = db.genes_overlapping("1", 5000, 5100);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "G3");
    }

    #[test]
    fn test_overlap_boundaries() {
        let db = test_db();
        // Half-open window: a gene starting exactly at max_pos is out.
        assert!(db.genes_overlapping("1", 900, 1000).is_empty());
        // A gene ending exactly at min_pos is in (gene span is inclusive).
        let hits = db.genes_overlapping("1", 500, 600);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "G1");
    }

    #[test]
    fn test_difference() {
        let db = test_db();
        let study: HashSet<String> = ["G1", "G3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(db.difference(&study), vec!["G2", "G4"]);
    }

    #[test]
    fn test_duplicate_id_keeps_first() {
        let db = GeneDatabase::from_records(vec![
            gene("G1", "FIRST", "1", 100, 200),
            gene("G1", "SECOND", "1", 300, 400),
        ]);
        assert_eq!(db.n_genes(), 1);
        assert_eq!(db.by_id("G1").unwrap().name, "FIRST");
    }
}
