//! UCSC dbSNP common-variant table parser.
//!
//! The `snpNNNCommon.txt.gz` dumps are tab-separated with the chromosome in
//! column 1 (with a `chr` prefix), the position in column 2 and the rsID in
//! column 4. Rows on non-primary chromosomes are skipped, not rejected:
//! the dumps carry alt contigs we never index.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::chrom;
use crate::reader::{numbered_lines, open_text};

const F_CHR: usize = 1;
const F_POS: usize = 2;
const F_RS_ID: usize = 4;

/// One indexed row of a dbSNP table.
#[derive(Debug, Clone)]
pub struct UcscSnp {
    pub chro: String,
    pub rs_id: String,
    pub pos: u64,
}

/// Parse a UCSC dbSNP table, keeping primary-chromosome rows only.
pub fn parse_table(path: &Path) -> Result<Vec<UcscSnp>> {
    let reader = open_text(path)?;
    let mut snps = Vec::new();

    for item in numbered_lines(reader) {
        let (line_num, line) = item?;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() <= F_RS_ID {
            bail!(
                "{}: line {} has {} fields, expected at least {}",
                path.display(),
                line_num,
                fields.len(),
                F_RS_ID + 1
            );
        }

        let chro = chrom::strip_chr_prefix(fields[F_CHR]);
        if !chrom::is_primary(chro) {
            continue;
        }

        let pos: u64 = fields[F_POS].trim().parse().with_context(|| {
            format!("{}: line {}: invalid position '{}'", path.display(), line_num, fields[F_POS])
        })?;

        snps.push(UcscSnp {
            chro: chro.to_string(),
            rs_id: fields[F_RS_ID].to_string(),
            pos,
        });
    }

    Ok(snps)
}
