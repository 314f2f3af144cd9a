//! Subcommand implementations.

pub mod coloc;
pub mod intensities;
pub mod missing;
pub mod ped_to_arff;
pub mod similarity;
pub mod snp_stats;
