//! snploc-geno: Flat-file I/O for snploc
//!
//! Parsers for the file formats the pipelines consume: Birdseed call and
//! intensity files, PLINK TFAM/MAP/PED text, UCSC dbSNP tables, PLINK
//! missingness reports, biomart gene exports, enrichment libraries and
//! genotype-confidence matrices, plus the ARFF export writer.

pub mod arff;
pub mod birdseed;
pub mod chrom;
pub mod confidence;
pub mod enrichr;
pub mod lmiss;
pub mod mart;
pub mod plink_text;
pub mod reader;
pub mod tfam;
pub mod ucsc;

pub use reader::open_text;
