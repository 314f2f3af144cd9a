//! PLINK TFAM pedigree file parser.
//!
//! TFAM fields (one subject per line):
//! 1. Family ID ('FID')
//! 2. Within-family ID ('IID'; cannot be '0')
//! 3. Within-family ID of father ('0' if father isn't in dataset)
//! 4. Within-family ID of mother ('0' if mother isn't in dataset)
//! 5. Sex code ('1' = male, '2' = female, '0' = unknown)
//! 6. Phenotype value ('1' = control, '2' = case, '-9'/'0'/non-numeric = missing)
//!
//! Subjects with no recorded father and mother are founders ("parents");
//! everyone else is offspring. Trio designs lean on that split for the
//! per-class missingness and intensity summaries.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::reader::{numbered_lines, open_text};

/// Sex code from column 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

impl Sex {
    fn parse(s: &str) -> Sex {
        match s {
            "1" => Sex::Male,
            "2" => Sex::Female,
            _ => Sex::Unknown,
        }
    }
}

/// Case/control phenotype from column 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phenotype {
    Control,
    Case,
    Missing,
}

impl Phenotype {
    fn parse(s: &str) -> Phenotype {
        match s {
            "1" => Phenotype::Control,
            "2" => Phenotype::Case,
            _ => Phenotype::Missing,
        }
    }

    /// The value written back out in PED/ARFF exports.
    pub fn code(&self) -> &'static str {
        match self {
            Phenotype::Control => "1",
            Phenotype::Case => "2",
            Phenotype::Missing => "-9",
        }
    }
}

/// One TFAM row.
#[derive(Debug, Clone)]
pub struct Subject {
    pub fid: String,
    pub iid: String,
    pub father: String,
    pub mother: String,
    pub sex: Sex,
    pub phenotype: Phenotype,
}

impl Subject {
    /// A founder has neither parent in the dataset.
    pub fn is_parent(&self) -> bool {
        self.father == "0" && self.mother == "0"
    }
}

/// Parsed TFAM pedigree with the parent/offspring split precomputed.
#[derive(Debug, Clone)]
pub struct Tfam {
    subjects: HashMap<String, Subject>,
    parents: Vec<String>,
    offspring: Vec<String>,
}

impl Tfam {
    /// Parse a TFAM file.
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = open_text(path)
            .with_context(|| format!("Failed to open tfam file: {}", path.display()))?;

        let mut subjects = HashMap::new();
        let mut parents = Vec::new();
        let mut offspring = Vec::new();

        for item in numbered_lines(reader) {
            let (line_num, line) = item?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 6 {
                bail!(
                    "{}: line {} has {} fields, expected 6",
                    path.display(),
                    line_num,
                    fields.len()
                );
            }

            let iid = fields[1];
            if iid == "0" || iid.is_empty() {
                bail!("{}: line {} has an invalid IID '{}'", path.display(), line_num, iid);
            }

            let subject = Subject {
                fid: fields[0].to_string(),
                iid: iid.to_string(),
                father: fields[2].to_string(),
                mother: fields[3].to_string(),
                sex: Sex::parse(fields[4]),
                phenotype: Phenotype::parse(fields[5]),
            };

            if subjects.contains_key(iid) {
                bail!("{}: line {} duplicates subject '{}'", path.display(), line_num, iid);
            }

            if subject.is_parent() {
                parents.push(subject.iid.clone());
            } else {
                offspring.push(subject.iid.clone());
            }
            subjects.insert(subject.iid.clone(), subject);
        }

        Ok(Tfam {
            subjects,
            parents,
            offspring,
        })
    }

    pub fn subject(&self, iid: &str) -> Option<&Subject> {
        self.subjects.get(iid)
    }

    pub fn n_subjects(&self) -> usize {
        self.subjects.len()
    }

    /// Founder IDs, in file order.
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// Non-founder IDs, in file order.
    pub fn offspring(&self) -> &[String] {
        &self.offspring
    }

    /// Resolve founder IDs to indices in an external subject ordering,
    /// e.g. the column order of an intensity matrix.
    pub fn parent_indices(&self, ordering: &[String]) -> Result<Vec<usize>> {
        Self::resolve_indices(&self.parents, ordering)
    }

    /// Resolve offspring IDs to indices in an external subject ordering.
    pub fn offspring_indices(&self, ordering: &[String]) -> Result<Vec<usize>> {
        Self::resolve_indices(&self.offspring, ordering)
    }

    fn resolve_indices(ids: &[String], ordering: &[String]) -> Result<Vec<usize>> {
        let lookup: HashMap<&str, usize> = ordering
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        ids.iter()
            .map(|id| {
                lookup.get(id.as_str()).copied().ok_or_else(|| {
                    anyhow::anyhow!("Subject '{}' not present in the given ordering", id)
                })
            })
            .collect()
    }
}
