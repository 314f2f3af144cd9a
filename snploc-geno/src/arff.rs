//! ARFF export for PED/MAP genotype data.
//!
//! Writes one nominal attribute `'chr:rsid' {0,1,2}` per variant in MAP
//! order, a class attribute `phenotype {1,2}`, and one data row per subject
//! preceded by a `%` comment carrying the subject ID. Missing dosages and
//! missing phenotypes are written as `?`.

use std::io::Write;

use anyhow::{bail, Result};

use crate::plink_text::{MapEntry, PedSubject};
use crate::tfam::Phenotype;

/// Write an ARFF document for the given variants and subjects.
pub fn write_arff<W: Write>(
    writer: &mut W,
    relation: &str,
    variants: &[MapEntry],
    subjects: &[PedSubject],
) -> Result<()> {
    writeln!(writer, "@RELATION {}", relation)?;
    writeln!(writer)?;

    for v in variants {
        writeln!(writer, "@ATTRIBUTE '{}:{}' {{0,1,2}}", v.chro, v.rs_id)?;
    }
    writeln!(writer, "@ATTRIBUTE phenotype {{1,2}}")?;
    writeln!(writer)?;
    writeln!(writer, "@DATA")?;

    for subject in subjects {
        if subject.dosages.len() != variants.len() {
            bail!(
                "Subject {} has {} dosages for {} variants",
                subject.iid,
                subject.dosages.len(),
                variants.len()
            );
        }

        writeln!(writer, "% {}", subject.iid)?;
        for dosage in &subject.dosages {
            match dosage {
                Some(d) => write!(writer, "{},", d)?,
                None => write!(writer, "?,")?,
            }
        }
        match subject.phenotype {
            Phenotype::Missing => writeln!(writer, "?")?,
            ref p => writeln!(writer, "{}", p.code())?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfam::Sex;

    fn variant(chro: &str, rs_id: &str, pos: u64) -> MapEntry {
        MapEntry {
            chro: chro.to_string(),
            rs_id: rs_id.to_string(),
            cm: 0.0,
            pos,
        }
    }

    fn subject(iid: &str, phenotype: Phenotype, dosages: Vec<Option<u8>>) -> PedSubject {
        PedSubject {
            fid: "F1".to_string(),
            iid: iid.to_string(),
            sex: Sex::Unknown,
            phenotype,
            dosages,
        }
    }

    #[test]
    fn test_write_arff() {
        let variants = vec![variant("1", "rs1", 100), variant("2", "rs9", 500)];
        let subjects = vec![
            subject("S1", Phenotype::Control, vec![Some(0), Some(2)]),
            subject("S2", Phenotype::Case, vec![Some(1), None]),
            subject("S3", Phenotype::Missing, vec![None, Some(1)]),
        ];

        let mut out = Vec::new();
        write_arff(&mut out, "study", &variants, &subjects).unwrap();
        let text = String::from_utf8(out).unwrap();

        let expected = "\
@RELATION study

@ATTRIBUTE '1:rs1' {0,1,2}
@ATTRIBUTE '2:rs9' {0,1,2}
@ATTRIBUTE phenotype {1,2}

@DATA
% S1
0,2,1
% S2
1,?,2
% S3
?,1,?
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_dosage_count_mismatch() {
        let variants = vec![variant("1", "rs1", 100)];
        let subjects = vec![subject("S1", Phenotype::Case, vec![Some(0), Some(1)])];

        let mut out = Vec::new();
        assert!(write_arff(&mut out, "study", &variants, &subjects).is_err());
    }
}
