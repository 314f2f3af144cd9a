//! In-memory SNP database with per-chromosome multi-key indexing.
//!
//! Records are keyed three ways per chromosome: rsID -> record,
//! position -> rsID, and probe ID -> rsID (plus a global probe map for
//! lookups when the chromosome is unknown). The position key doubles as a
//! sorted index, so region queries are range scans instead of full-table
//! filters.
//!
//! All loaders keep the first occurrence of a key and ignore repeats, so
//! merged multi-source loads stay deterministic.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use snploc_geno::lmiss::LmissRecord;
use snploc_geno::reader::{numbered_lines, open_text};
use snploc_geno::{birdseed, chrom, lmiss, plink_text, ucsc};

/// One SNP with everything the pipelines attach to it.
#[derive(Debug, Clone)]
pub struct SnpRecord {
    pub rs_id: String,
    /// Primary base-pair position.
    pub pos: u64,
    /// Probe ID on the genotyping array, when loaded from array output.
    pub probe_id: Option<String>,
    /// Per-SNP missingness, when an lmiss report has been attached.
    pub lmiss: Option<LmissRecord>,
    /// Named secondary positions (e.g. an alternative assembly).
    extra_positions: HashMap<String, u64>,
}

impl SnpRecord {
    fn new(rs_id: &str, pos: u64) -> Self {
        SnpRecord {
            rs_id: rs_id.to_string(),
            pos,
            probe_id: None,
            lmiss: None,
            extra_positions: HashMap::new(),
        }
    }

    /// Position under a named field; `None` asks for the primary position.
    pub fn position(&self, field: Option<&str>) -> Option<u64> {
        match field {
            None => Some(self.pos),
            Some(name) => self.extra_positions.get(name).copied(),
        }
    }

    pub fn set_position(&mut self, field: &str, pos: u64) {
        self.extra_positions.insert(field.to_string(), pos);
    }
}

#[derive(Debug, Default)]
struct ChromIndex {
    by_rs_id: HashMap<String, SnpRecord>,
    /// Sorted positional index; first rsID seen at a position wins.
    by_pos: BTreeMap<u64, String>,
    by_probe: HashMap<String, String>,
}

impl ChromIndex {
    fn insert(&mut self, record: SnpRecord) {
        if self.by_rs_id.contains_key(&record.rs_id) {
            return;
        }
        self.by_pos.entry(record.pos).or_insert_with(|| record.rs_id.clone());
        if let Some(probe_id) = &record.probe_id {
            self.by_probe
                .entry(probe_id.clone())
                .or_insert_with(|| record.rs_id.clone());
        }
        self.by_rs_id.insert(record.rs_id.clone(), record);
    }
}

/// The SNP database. Built fresh from flat files on every run.
#[derive(Debug, Default)]
pub struct SnpDatabase {
    chromosomes: HashMap<String, ChromIndex>,
    /// Probe ID -> rsID across all chromosomes.
    probe_to_rs: HashMap<String, String>,
}

impl SnpDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a UCSC dbSNP common-variant table (primary chromosomes only).
    pub fn load_ucsc_table(&mut self, path: &Path) -> Result<()> {
        let snps = ucsc::parse_table(path)?;
        let n = snps.len();
        for snp in snps {
            self.chromosomes
                .entry(snp.chro.clone())
                .or_default()
                .insert(SnpRecord::new(&snp.rs_id, snp.pos));
        }
        debug!("Indexed {} dbSNP rows from {}", n, path.display());
        Ok(())
    }

    /// Merge a second UCSC table as a named position field.
    ///
    /// Only rsIDs already indexed are touched: the field is an extra
    /// annotation (e.g. positions on another assembly), not a new source
    /// of records.
    pub fn merge_position_field(&mut self, path: &Path, field: &str) -> Result<usize> {
        let snps = ucsc::parse_table(path)?;
        let mut n_merged = 0;
        for snp in snps {
            if let Some(index) = self.chromosomes.get_mut(&snp.chro) {
                if let Some(record) = index.by_rs_id.get_mut(&snp.rs_id) {
                    record.set_position(field, snp.pos);
                    n_merged += 1;
                }
            }
        }
        Ok(n_merged)
    }

    /// Load Birdseed per-chromosome call files for a subject.
    pub fn load_birdseed_dir(&mut self, dir: &Path, subject: &str) -> Result<()> {
        for (chro, path) in birdseed::chromosome_files(dir, subject)? {
            let calls = birdseed::parse_calls(&path)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            let index = self.chromosomes.entry(chro).or_default();
            for call in calls {
                let mut record = SnpRecord::new(&call.rs_id, call.pos);
                record.probe_id = Some(call.probe_id.clone());
                index.insert(record);
                self.probe_to_rs
                    .entry(call.probe_id)
                    .or_insert(call.rs_id);
            }
        }
        Ok(())
    }

    /// Load per-chromosome PLINK .map files matching a `{chr}` pattern.
    pub fn load_map_dir(&mut self, dir: &Path, pattern: &str) -> Result<()> {
        for (chro, path) in plink_text::map_files(dir, pattern)? {
            let entries = plink_text::parse_map(&path)?;
            let index = self.chromosomes.entry(chro).or_default();
            for entry in entries {
                index.insert(SnpRecord::new(&entry.rs_id, entry.pos));
            }
        }
        Ok(())
    }

    /// Attach per-chromosome .lmiss reports found under `dir`.
    ///
    /// Rows for rsIDs the database does not know are warned about and
    /// counted, never fatal: the array content and the genotyped set
    /// rarely match exactly.
    pub fn attach_lmiss_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut n_unmatched = 0;
        for (chro, path) in lmiss::chromosome_files(dir)? {
            let records = lmiss::parse_lmiss(&path)?;
            let index = self.chromosomes.entry(chro.clone()).or_default();
            for record in records {
                match index.by_rs_id.get_mut(&record.rs_id) {
                    Some(snp) => snp.lmiss = Some(record),
                    None => {
                        warn!("lmiss: {} in chr {} not found", record.rs_id, chro);
                        n_unmatched += 1;
                    }
                }
            }
        }
        Ok(n_unmatched)
    }

    /// Resolve a probe ID to its rsID; with `chro` given the lookup stays
    /// inside that chromosome's index.
    pub fn rs_id_for_probe(&self, chro: Option<&str>, probe_id: &str) -> Option<&str> {
        match chro {
            None => self.probe_to_rs.get(probe_id).map(|s| s.as_str()),
            Some(chro) => self
                .chromosomes
                .get(chro)?
                .by_probe
                .get(probe_id)
                .map(|s| s.as_str()),
        }
    }

    pub fn record(&self, chro: &str, rs_id: &str) -> Option<&SnpRecord> {
        self.chromosomes.get(chro)?.by_rs_id.get(rs_id)
    }

    /// The rsID at an exact position, if any.
    pub fn rs_id_at(&self, chro: &str, pos: u64) -> Option<&str> {
        self.chromosomes
            .get(chro)?
            .by_pos
            .get(&pos)
            .map(|s| s.as_str())
    }

    pub fn position(&self, chro: &str, rs_id: &str) -> Option<u64> {
        self.record(chro, rs_id).map(|r| r.pos)
    }

    /// Chromosomes present, in karyotype order.
    pub fn chromosomes(&self) -> Vec<&str> {
        let mut chrs: Vec<&str> = self.chromosomes.keys().map(|s| s.as_str()).collect();
        chrs.sort_by_key(|c| chrom::sort_key(c));
        chrs
    }

    /// rsIDs on a chromosome, sorted by position.
    pub fn snp_ids(&self, chro: &str) -> Vec<&str> {
        match self.chromosomes.get(chro) {
            Some(index) => index.by_pos.values().map(|s| s.as_str()).collect(),
            None => Vec::new(),
        }
    }

    /// Probe IDs on a chromosome, sorted for deterministic iteration.
    pub fn probe_ids(&self, chro: &str) -> Vec<&str> {
        match self.chromosomes.get(chro) {
            Some(index) => {
                let mut ids: Vec<&str> = index.by_probe.keys().map(|s| s.as_str()).collect();
                ids.sort_unstable();
                ids
            }
            None => Vec::new(),
        }
    }

    pub fn n_snps(&self, chro: &str) -> usize {
        self.chromosomes
            .get(chro)
            .map(|i| i.by_rs_id.len())
            .unwrap_or(0)
    }

    /// SNPs with primary position in `[min_pos, max_pos)`, position order.
    pub fn snps_in_region(&self, chro: &str, min_pos: u64, max_pos: u64) -> Vec<&SnpRecord> {
        let index = match self.chromosomes.get(chro) {
            Some(i) => i,
            None => return Vec::new(),
        };
        index
            .by_pos
            .range(min_pos..max_pos)
            .filter_map(|(_, rs_id)| index.by_rs_id.get(rs_id))
            .collect()
    }

    /// SNPs whose position under a named field lies in `[min_pos, max_pos)`.
    ///
    /// Secondary fields are not position-indexed, so this is a scan over
    /// the chromosome.
    pub fn snps_in_region_by_field(
        &self,
        chro: &str,
        field: &str,
        min_pos: u64,
        max_pos: u64,
    ) -> Vec<&SnpRecord> {
        let index = match self.chromosomes.get(chro) {
            Some(i) => i,
            None => return Vec::new(),
        };
        let mut hits: Vec<&SnpRecord> = index
            .by_rs_id
            .values()
            .filter(|r| {
                r.position(Some(field))
                    .map(|p| p >= min_pos && p < max_pos)
                    .unwrap_or(false)
            })
            .collect();
        hits.sort_by_key(|r| r.position(Some(field)));
        hits
    }

    /// Per-chromosome SNP counts, karyotype order.
    pub fn stats(&self) -> Vec<(String, usize)> {
        self.chromosomes()
            .into_iter()
            .map(|c| (c.to_string(), self.n_snps(c)))
            .collect()
    }

    /// Write `rsID chr pos` rows for every record carrying the field
    /// (`None` = primary position, which every record has).
    pub fn write_positions<W: Write>(&self, writer: &mut W, field: Option<&str>) -> Result<()> {
        for chro in self.chromosomes() {
            let index = &self.chromosomes[chro];
            for rs_id in index.by_pos.values() {
                let record = &index.by_rs_id[rs_id];
                if let Some(pos) = record.position(field) {
                    writeln!(writer, "{}\t{}\t{}", record.rs_id, chro, pos)?;
                }
            }
        }
        Ok(())
    }

    /// Merge a positions TSV written by `write_positions` back in as a
    /// named field. Unknown rsIDs are skipped.
    pub fn read_positions(&mut self, path: &Path, field: &str) -> Result<usize> {
        let reader = open_text(path)?;
        let mut n_merged = 0;

        for item in numbered_lines(reader) {
            let (line_num, line) = item?;
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 {
                bail!(
                    "{}: line {} has {} fields, expected 3",
                    path.display(),
                    line_num,
                    fields.len()
                );
            }
            let pos: u64 = fields[2].parse().with_context(|| {
                format!("{}: line {}: invalid position '{}'", path.display(), line_num, fields[2])
            })?;

            match self
                .chromosomes
                .get_mut(fields[1])
                .and_then(|i| i.by_rs_id.get_mut(fields[0]))
            {
                Some(record) => {
                    record.set_position(field, pos);
                    n_merged += 1;
                }
                None => debug!("positions: {} in chr {} not found", fields[0], fields[1]),
            }
        }

        Ok(n_merged)
    }
}
