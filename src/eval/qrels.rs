//! Relevance judgments (qrels) in the BEIR tab-separated layout:
//! a header row, then `query-id<TAB>corpus-id<TAB>score` rows.

use crate::error::{BenchError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Graded relevance: query id -> document id -> grade.
pub type Qrels = HashMap<String, HashMap<String, i32>>;

/// Load a qrels file from disk.
pub fn load_qrels(path: &Path) -> Result<Qrels> {
    let file = File::open(path)?;
    let qrels = read_qrels(file)?;
    log::info!(
        "Loaded {} judgments for {} queries from {}",
        qrels.values().map(HashMap::len).sum::<usize>(),
        qrels.len(),
        path.display()
    );
    Ok(qrels)
}

/// Parse qrels from any reader. The first row is treated as a header and skipped.
///
/// Rows with fewer than three columns or a non-integer grade are errors; a repeated
/// (query, document) pair keeps the last grade seen.
pub fn read_qrels<R: Read>(reader: R) -> Result<Qrels> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut qrels = Qrels::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.len() < 3 {
            return Err(BenchError::Parse(format!(
                "qrels line {}: expected 3 columns (query-id, corpus-id, score), found {}",
                line,
                record.len()
            )));
        }

        let grade: i32 = record[2].trim().parse().map_err(|e| {
            BenchError::Parse(format!(
                "qrels line {}: invalid relevance grade {:?}: {}",
                line, &record[2], e
            ))
        })?;

        qrels
            .entry(record[0].to_string())
            .or_default()
            .insert(record[1].to_string(), grade);
    }

    if qrels.is_empty() {
        log::warn!("qrels contain no relevance rows");
    }

    Ok(qrels)
}
