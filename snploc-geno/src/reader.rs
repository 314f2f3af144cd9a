//! Buffered text reading with transparent gzip support.
//!
//! Every input format in this crate is line-oriented text, optionally
//! gzip-compressed with a `.gz` extension. Readers are selected by
//! extension so the same parser handles both.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

/// Open a text file for buffered line reading, decompressing on the fly
/// when the path ends in `.gz`.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let is_gz = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    let reader: Box<dyn Read> = if is_gz {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    Ok(Box::new(BufReader::new(reader)))
}

/// Iterate non-empty, trimmed lines with 1-based line numbers.
///
/// Parsers use the line number in error context so a bad row can be
/// located in multi-million-line dbSNP dumps.
pub fn numbered_lines(
    reader: Box<dyn BufRead>,
) -> impl Iterator<Item = Result<(usize, String)>> {
    reader.lines().enumerate().filter_map(|(i, line)| match line {
        Ok(l) => {
            let trimmed = l.trim_end_matches(['\n', '\r']);
            if trimmed.trim().is_empty() {
                None
            } else {
                Some(Ok((i + 1, trimmed.to_string())))
            }
        }
        Err(e) => Some(Err(anyhow::Error::new(e).context("I/O error while reading line"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "hello").unwrap();
        writeln!(f, "world").unwrap();

        let reader = open_text(&path).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[test]
    fn test_open_gzip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt.gz");
        let f = File::create(&path).unwrap();
        let mut enc = GzEncoder::new(f, Compression::default());
        writeln!(enc, "rs1\t1\t100").unwrap();
        enc.finish().unwrap();

        let reader = open_text(&path).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["rs1\t1\t100"]);
    }

    #[test]
    fn test_numbered_lines_skip_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaps.txt");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "a").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "b").unwrap();

        let reader = open_text(&path).unwrap();
        let lines: Vec<(usize, String)> =
            numbered_lines(reader).map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec![(1, "a".to_string()), (3, "b".to_string())]);
    }

    #[test]
    fn test_open_missing_file() {
        let err = match open_text(Path::new("/nonexistent/no.txt")) {
            Ok(_) => panic!("expected open_text to fail"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("Failed to open"));
    }
}
