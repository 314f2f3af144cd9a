//! End-to-end pipeline tests over generated fixtures.
//!
//! Each module builds a small but complete study layout in a temp
//! directory (birdseed calls, lmiss reports, pedigree, confidence matrix,
//! gene export, enrichment library) and drives the same call sequences
//! the CLI subcommands use.

use std::io::Write;
use std::path::Path;

use tempfile::TempDir;

/// Write per-chromosome birdseed call files: 3 probes per autosome.
fn write_birdseed_dir(dir: &Path, subject: &str) {
    for chr in 1..=22u32 {
        let path = dir.join(format!("{}.birdseed-v2.{}.txt", subject, chr));
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "# birdseed-dev calls").unwrap();
        writeln!(f, "Probe\tc1\tc2\tc3\tc4\tc5\tAA\tBB\trsid\tpos").unwrap();
        for i in 0..3u32 {
            writeln!(
                f,
                "P{}_{}\tx\tx\tx\tx\tx\tAA\tBB\trs{}{:02}\t{}",
                chr,
                i,
                chr,
                i,
                1000 * (i + 1)
            )
            .unwrap();
        }
    }
}

/// Write per-chromosome lmiss files matching the birdseed rsIDs.
fn write_lmiss_dir(dir: &Path, n_miss: [u32; 3]) {
    for chr in 1..=22u32 {
        let path = dir.join(format!("study_{}.lmiss", chr));
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, " CHR  SNP  N_MISS  N_GENO  F_MISS").unwrap();
        for (i, nm) in n_miss.iter().enumerate() {
            writeln!(
                f,
                "{} rs{}{:02} {} 100 {}",
                chr,
                chr,
                i,
                nm,
                *nm as f64 / 100.0
            )
            .unwrap();
        }
    }
}

mod snp_database {
    use super::*;
    use snploc_core::SnpDatabase;

    #[test]
    fn test_birdseed_load_and_region_query() {
        let dir = TempDir::new().unwrap();
        write_birdseed_dir(dir.path(), "8090939");

        let mut db = SnpDatabase::new();
        db.load_birdseed_dir(dir.path(), "8090939").unwrap();

        assert_eq!(db.stats().len(), 22);
        assert_eq!(db.n_snps("1"), 3);
        assert_eq!(db.rs_id_for_probe(Some("7"), "P7_0"), Some("rs700"));
        assert_eq!(db.rs_id_for_probe(None, "P7_0"), Some("rs700"));
        assert_eq!(db.position("7", "rs700"), Some(1000));

        // Positions are 1000, 2000, 3000 on every chromosome.
        let hits = db.snps_in_region("3", 1500, 3000);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].rs_id, "rs301");
    }

    #[test]
    fn test_lmiss_attachment() {
        let dir = TempDir::new().unwrap();
        write_birdseed_dir(dir.path(), "8090939");
        let lmiss_dir = TempDir::new().unwrap();
        write_lmiss_dir(lmiss_dir.path(), [2, 0, 5]);

        let mut db = SnpDatabase::new();
        db.load_birdseed_dir(dir.path(), "8090939").unwrap();
        let n_unmatched = db.attach_lmiss_dir(lmiss_dir.path()).unwrap();

        assert_eq!(n_unmatched, 0);
        let record = db.record("4", "rs400").unwrap();
        assert_eq!(record.lmiss.as_ref().unwrap().n_miss, 2);
        let record = db.record("4", "rs401").unwrap();
        assert_eq!(record.lmiss.as_ref().unwrap().n_miss, 0);
    }

    #[test]
    fn test_positions_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        write_birdseed_dir(dir.path(), "8090939");

        let mut db = SnpDatabase::new();
        db.load_birdseed_dir(dir.path(), "8090939").unwrap();

        let out = TempDir::new().unwrap();
        let positions_path = out.path().join("positions.tsv");
        {
            let mut f = std::fs::File::create(&positions_path).unwrap();
            db.write_positions(&mut f, None).unwrap();
        }

        let n = db.read_positions(&positions_path, "copy").unwrap();
        assert_eq!(n, 22 * 3);
        assert_eq!(
            db.record("1", "rs100").unwrap().position(Some("copy")),
            Some(1000)
        );
    }
}

mod missing_pipeline {
    use super::*;
    use snploc_core::{missing, SnpDatabase};
    use snploc_geno::confidence;
    use snploc_geno::tfam::Tfam;

    #[test]
    fn test_confidence_thresholds_end_to_end() {
        let dir = TempDir::new().unwrap();
        write_birdseed_dir(dir.path(), "8090939");
        let lmiss_dir = TempDir::new().unwrap();
        write_lmiss_dir(lmiss_dir.path(), [2, 0, 5]);

        let mut db = SnpDatabase::new();
        db.load_birdseed_dir(dir.path(), "8090939").unwrap();
        db.attach_lmiss_dir(lmiss_dir.path()).unwrap();

        // Confidence rows for chr 1 probes only; P1_2 has no row.
        let confs_dir = TempDir::new().unwrap();
        let confs_path = confs_dir.path().join("confs.txt");
        {
            let mut f = std::fs::File::create(&confs_path).unwrap();
            writeln!(f, "\"S1.CEL\" \"S2.CEL\" \"S3.CEL\" \"S4.CEL\"").unwrap();
            writeln!(f, "\"P1_0\" 0.40 0.10 0.30 0.20").unwrap();
            writeln!(f, "\"P1_1\" 0.90 0.80 0.70 0.60").unwrap();
        }
        let confidences = confidence::parse_confidences(&confs_path).unwrap();

        let (records, n_skipped) = missing::confidence_thresholds("1", &db, &confidences);

        // P1_2 is skipped (no confidence row).
        assert_eq!(n_skipped, 1);
        assert_eq!(records.len(), 2);

        // P1_0: N_MISS = 2 -> 2nd smallest of [0.40, 0.10, 0.30, 0.20].
        let p10 = records.iter().find(|r| r.probe_id == "P1_0").unwrap();
        assert_eq!(p10.rs_id, "rs100");
        assert_eq!(p10.threshold, Some(0.20));

        // P1_1: N_MISS = 0 -> no threshold.
        let p11 = records.iter().find(|r| r.probe_id == "P1_1").unwrap();
        assert_eq!(p11.threshold, None);
    }

    #[test]
    fn test_missing_stats_aggregation() {
        let dir = TempDir::new().unwrap();
        let tfam_path = dir.path().join("study.tfam");
        {
            let mut f = std::fs::File::create(&tfam_path).unwrap();
            writeln!(f, "F1\tP1\t0\t0\t1\t1").unwrap();
            writeln!(f, "F1\tP2\t0\t0\t2\t1").unwrap();
            writeln!(f, "F1\tC1\tP1\tP2\t1\t2").unwrap();
        }
        let tfam = Tfam::parse(&tfam_path).unwrap();

        let parents_dir = TempDir::new().unwrap();
        write_lmiss_dir(parents_dir.path(), [2, 4, 0]);
        let offspring_dir = TempDir::new().unwrap();
        write_lmiss_dir(offspring_dir.path(), [1, 1, 1]);

        let parent_files = snploc_geno::lmiss::chromosome_files(parents_dir.path()).unwrap();
        let offspring_files = snploc_geno::lmiss::chromosome_files(offspring_dir.path()).unwrap();

        let (chro, parent_path) = &parent_files[0];
        let (_, offspring_path) = &offspring_files[0];
        let parents = snploc_geno::lmiss::parse_lmiss(parent_path).unwrap();
        let offspring = snploc_geno::lmiss::parse_lmiss(offspring_path).unwrap();

        let stats = missing::aggregate_missing(chro, &tfam, &parents, &offspring);
        assert_eq!(stats.chro, "1");
        assert_eq!(stats.n_parents, 2);
        assert_eq!(stats.n_offspring, 1);
        assert!((stats.mean_parent_f_miss - 0.02).abs() < 1e-12);
        assert!((stats.mean_offspring_f_miss - 0.01).abs() < 1e-12);
    }
}

mod coloc_pipeline {
    use super::*;
    use snploc_core::region::{read_loci_tsv, LocusWindows};
    use snploc_core::{coloc, GeneDatabase};
    use snploc_geno::enrichr;

    #[test]
    fn test_coloc_end_to_end() {
        let dir = TempDir::new().unwrap();

        // Gene export: ten genes spaced 100 kb apart on chr 6.
        let mart_path = dir.path().join("mart_export.txt");
        {
            let mut f = std::fs::File::create(&mart_path).unwrap();
            writeln!(f, "Gene stable ID\tChromosome\tStart\tEnd\tStrand\tName\tType").unwrap();
            for i in 1..=10u64 {
                writeln!(
                    f,
                    "ENSG{:03}\t6\t{}\t{}\t1\tGENE{}\tprotein_coding",
                    i,
                    i * 100_000,
                    i * 100_000 + 10_000,
                    i
                )
                .unwrap();
            }
        }

        // Loci: one SNP at 250 kb, window 400 kb -> covers genes 1..4.
        let loci_path = dir.path().join("loci.tsv");
        {
            let mut f = std::fs::File::create(&loci_path).unwrap();
            writeln!(f, "rs6897932\t6\t250000").unwrap();
        }

        // Library: one set of covered genes, one set of uncovered ones,
        // one symbol absent from the export.
        let lib_path = dir.path().join("test_library.txt");
        {
            let mut f = std::fs::File::create(&lib_path).unwrap();
            writeln!(f, "covered\t\tGENE1\tGENE2\tGENE3\tGENE4").unwrap();
            writeln!(f, "uncovered\t\tGENE7\tGENE8\tGENE9\tGENE10\tNOT_A_GENE").unwrap();
        }

        let gene_db = GeneDatabase::load_mart_export(&mart_path).unwrap();
        assert_eq!(gene_db.n_genes(), 10);

        let loci = read_loci_tsv(&loci_path).unwrap();
        let windows = LocusWindows::build(&loci, 400_000);
        assert_eq!(windows.n_windows(), 1);

        let library = enrichr::parse_library(&lib_path).unwrap();
        let results = coloc::test_libraries(&gene_db, &windows, &[library]).unwrap();

        assert_eq!(results.len(), 2);
        let covered = &results[0];
        assert_eq!(covered.term, "covered");
        assert_eq!(covered.n_in_window, 4);
        assert_eq!(covered.n_genes, 4);
        assert!(covered.p_value < 0.05);

        let uncovered = &results[1];
        assert_eq!(uncovered.term, "uncovered");
        assert_eq!(uncovered.n_in_window, 0);
        assert_eq!(uncovered.n_unknown, 1);
        assert!(uncovered.p_value > covered.p_value);

        // FDR column is populated and ordered with the p-values.
        assert!(covered.fdr <= uncovered.fdr);

        // TSV writer round-trips the header and one line per set.
        let mut out = Vec::new();
        coloc::write_results(&mut out, &results).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(1).unwrap().starts_with("test_library\tcovered"));
    }
}

mod intensity_pipeline {
    use super::*;
    use snploc_core::intensity;
    use snploc_geno::birdseed;
    use snploc_geno::tfam::Tfam;

    #[test]
    fn test_intensity_summary_end_to_end() {
        let dir = TempDir::new().unwrap();

        let tfam_path = dir.path().join("study.tfam");
        {
            let mut f = std::fs::File::create(&tfam_path).unwrap();
            writeln!(f, "F1\tS1\t0\t0\t1\t1").unwrap();
            writeln!(f, "F1\tS2\t0\t0\t2\t1").unwrap();
            writeln!(f, "F1\tS3\tS1\tS2\t1\t2").unwrap();
        }
        let tfam = Tfam::parse(&tfam_path).unwrap();

        let summary_path = dir.path().join("summary.txt");
        {
            let mut f = std::fs::File::create(&summary_path).unwrap();
            writeln!(f, "probeset_id\tS3.CEL\tS1.CEL\tS2.CEL").unwrap();
            writeln!(f, "P1\t9.0\t1.0\t3.0").unwrap();
        }
        let matrix = birdseed::parse_summary_intensities(&summary_path, None).unwrap();

        let parent_idx = tfam.parent_indices(&matrix.subjects).unwrap();
        let offspring_idx = tfam.offspring_indices(&matrix.subjects).unwrap();
        assert_eq!(parent_idx, vec![1, 2]);
        assert_eq!(offspring_idx, vec![0]);

        let summaries = intensity::summarize(&matrix, &parent_idx, &offspring_idx);
        assert_eq!(summaries.len(), 1);
        assert!((summaries[0].parents.mean - 2.0).abs() < 1e-12);
        assert!((summaries[0].offspring.mean - 9.0).abs() < 1e-12);
    }
}
