//! Locus windows for colocalization.
//!
//! A window of configurable size is centred on each SNP locus; windows on
//! the same chromosome are sorted and coalesced when they touch, so overlap
//! checks are binary searches over disjoint half-open intervals.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

use snploc_geno::reader::{numbered_lines, open_text};

/// A SNP locus: rsID plus genomic coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locus {
    pub rs_id: String,
    pub chro: String,
    pub pos: u64,
}

/// Read a loci TSV (`rsID chr pos`, no header).
pub fn read_loci_tsv(path: &Path) -> Result<Vec<Locus>> {
    let reader = open_text(path)?;
    let mut loci = Vec::new();

    for item in numbered_lines(reader) {
        let (line_num, line) = item?;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            bail!(
                "{}: line {} has {} fields, expected 3 (rsID, chr, pos)",
                path.display(),
                line_num,
                fields.len()
            );
        }
        loci.push(Locus {
            rs_id: fields[0].to_string(),
            chro: fields[1].to_string(),
            pos: fields[2].parse().with_context(|| {
                format!("{}: line {}: invalid position '{}'", path.display(), line_num, fields[2])
            })?,
        });
    }

    Ok(loci)
}

/// Coalesced per-chromosome windows around a set of loci.
#[derive(Debug, Clone)]
pub struct LocusWindows {
    /// Disjoint half-open `[start, end)` intervals, sorted by start.
    by_chr: HashMap<String, Vec<(u64, u64)>>,
    window_size: u64,
}

impl LocusWindows {
    /// Build windows of `window_size` base pairs centred on each locus
    /// (`pos - size/2` saturating at 0, `pos + size/2`).
    pub fn build(loci: &[Locus], window_size: u64) -> Self {
        let half = window_size / 2;
        let mut raw: HashMap<String, Vec<(u64, u64)>> = HashMap::new();

        for locus in loci {
            let start = locus.pos.saturating_sub(half);
            let end = locus.pos + half;
            raw.entry(locus.chro.clone()).or_default().push((start, end));
        }

        let by_chr = raw
            .into_iter()
            .map(|(chro, mut windows)| {
                windows.sort_unstable();
                (chro, coalesce(windows))
            })
            .collect();

        LocusWindows {
            by_chr,
            window_size,
        }
    }

    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    /// Number of coalesced windows across all chromosomes.
    pub fn n_windows(&self) -> usize {
        self.by_chr.values().map(|w| w.len()).sum()
    }

    /// Windows on one chromosome.
    pub fn chr_windows(&self, chro: &str) -> &[(u64, u64)] {
        self.by_chr.get(chro).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Is a single position inside any window?
    pub fn contains(&self, chro: &str, pos: u64) -> bool {
        self.overlaps(chro, pos, pos)
    }

    /// Does the inclusive span `[start, end]` intersect any window?
    ///
    /// Interval overlap, not endpoint distance: a gene fully spanning a
    /// window counts as colocalized.
    pub fn overlaps(&self, chro: &str, start: u64, end: u64) -> bool {
        let windows = match self.by_chr.get(chro) {
            Some(w) => w,
            None => return false,
        };

        // First window that could reach the span: the one before the first
        // window starting after `end`.
        let idx = windows.partition_point(|&(w_start, _)| w_start <= end);
        if idx == 0 {
            return false;
        }
        let (_, w_end) = windows[idx - 1];
        w_end > start
    }
}

/// Merge sorted intervals that overlap or touch.
fn coalesce(windows: Vec<(u64, u64)>) -> Vec<(u64, u64)> {
    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(windows.len());
    for (start, end) in windows {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end => {
                *last_end = (*last_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn locus(rs_id: &str, chro: &str, pos: u64) -> Locus {
        Locus {
            rs_id: rs_id.to_string(),
            chro: chro.to_string(),
            pos,
        }
    }

    #[test]
    fn test_read_loci_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loci.tsv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "rs12722489\t10\t6060000").unwrap();
        writeln!(f, "rs6897932\t5\t35910000").unwrap();

        let loci = read_loci_tsv(&path).unwrap();
        assert_eq!(loci.len(), 2);
        assert_eq!(loci[0], locus("rs12722489", "10", 6060000));
    }

    #[test]
    fn test_build_coalesces_overlapping() {
        let loci = vec![
            locus("rs1", "1", 1000),
            locus("rs2", "1", 1400), // overlaps rs1's window at size 1000
            locus("rs3", "1", 5000),
            locus("rs4", "2", 1000),
        ];
        let windows = LocusWindows::build(&loci, 1000);

        assert_eq!(windows.n_windows(), 3);
        assert_eq!(windows.chr_windows("1"), &[(500, 1900), (4500, 5500)]);
        assert_eq!(windows.chr_windows("2"), &[(500, 1500)]);
    }

    #[test]
    fn test_window_saturates_at_origin() {
        let windows = LocusWindows::build(&[locus("rs1", "1", 100)], 1000);
        assert_eq!(windows.chr_windows("1"), &[(0, 600)]);
    }

    #[test]
    fn test_contains() {
        let windows = LocusWindows::build(&[locus("rs1", "1", 1000)], 200);
        assert!(windows.contains("1", 900));
        assert!(windows.contains("1", 1099));
        assert!(!windows.contains("1", 1100)); // half-open end
        assert!(!windows.contains("1", 899));
        assert!(!windows.contains("2", 1000));
    }

    #[test]
    fn test_overlaps_interval() {
        let windows = LocusWindows::build(&[locus("rs1", "1", 1000)], 200);
        // window is [900, 1100)

        assert!(windows.overlaps("1", 1050, 1200)); // starts inside
        assert!(windows.overlaps("1", 800, 950)); // ends inside
        assert!(windows.overlaps("1", 800, 1200)); // spans the window
        assert!(windows.overlaps("1", 950, 1050)); // inside the window
        assert!(!windows.overlaps("1", 1100, 1300)); // starts at half-open end
        assert!(!windows.overlaps("1", 100, 899));
        assert!(windows.overlaps("1", 100, 900)); // inclusive span end touches start
    }

    #[test]
    fn test_empty_loci() {
        let windows = LocusWindows::build(&[], 1_000_000);
        assert_eq!(windows.n_windows(), 0);
        assert!(!windows.contains("1", 0));
    }
}
