//! snploc-core: Databases and statistics for snploc
//!
//! The positional-indexing core (SnpDatabase, GeneDatabase), locus window
//! construction and region overlap, colocalization enrichment testing with
//! Fisher's exact test and FDR correction, missing-data and intensity
//! summaries, and similarity matrix/graph analysis.

pub mod coloc;
pub mod gene_db;
pub mod intensity;
pub mod missing;
pub mod region;
pub mod simgraph;
pub mod snp_db;
pub mod stats;

pub use gene_db::GeneDatabase;
pub use region::LocusWindows;
pub use snp_db::SnpDatabase;
