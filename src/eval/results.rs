//! Run files: query id -> document id -> retrieval score, stored as JSON.

use crate::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Retrieval results for a set of queries.
pub type Results = HashMap<String, HashMap<String, f64>>;

/// Load a run file written by [`save_results`] (or any JSON object of the same shape).
pub fn load_results(path: &Path) -> Result<Results> {
    let file = File::open(path)?;
    let results: Results = serde_json::from_reader(BufReader::new(file))?;
    log::info!("Loaded results for {} queries from {}", results.len(), path.display());
    Ok(results)
}

/// Save results as pretty-printed JSON with sorted keys, creating parent directories.
pub fn save_results(results: &Results, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    // Sorted keys keep run files diffable between runs
    let sorted: BTreeMap<&str, BTreeMap<&str, f64>> = results
        .iter()
        .map(|(qid, docs)| {
            (
                qid.as_str(),
                docs.iter().map(|(doc, score)| (doc.as_str(), *score)).collect(),
            )
        })
        .collect();

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &sorted)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    log::info!("Saved results for {} queries to {}", results.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_results() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scifact.json");
        fs::write(&path, r#"{"q1": {"d1": 2.0, "d2": 1}, "q2": {}}"#).unwrap();

        let results = load_results(&path).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results["q1"]["d1"], 2.0);
        assert_eq!(results["q1"]["d2"], 1.0);
        assert!(results["q2"].is_empty());
    }

    #[test]
    fn test_load_results_malformed_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, r#"{"q1": {"d1": "high"}}"#).unwrap();

        let err = load_results(&path).unwrap_err();
        assert!(matches!(err, BenchError::Json(_)));
    }

    #[test]
    fn test_load_results_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_results(&temp_dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, BenchError::Io(_)));
    }

    #[test]
    fn test_save_creates_directories_and_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("results/nested/nfcorpus.json");

        let mut results = Results::new();
        results
            .entry("q2".to_string())
            .or_default()
            .insert("d9".to_string(), 7.25);
        results
            .entry("q1".to_string())
            .or_default()
            .insert("d1".to_string(), 12.5);

        save_results(&results, &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.find("\"q1\"").unwrap() < written.find("\"q2\"").unwrap());

        let reloaded = load_results(&path).unwrap();
        assert_eq!(reloaded, results);
    }
}
