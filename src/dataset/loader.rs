//! BEIR dataset loader: `corpus.jsonl`, `queries.jsonl` and `qrels/{split}.tsv`.

use crate::error::{BenchError, Result};
use crate::eval::qrels::{load_qrels, Qrels};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A corpus document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub title: String,
    pub text: String,
}

/// Document id -> document.
pub type Corpus = HashMap<String, Document>;

/// Query id -> query text.
pub type Queries = HashMap<String, String>;

/// Corpus, queries and relevance judgments of one split.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub corpus: Corpus,
    pub queries: Queries,
    pub qrels: Qrels,
}

impl Dataset {
    pub fn num_documents(&self) -> usize {
        self.corpus.len()
    }

    pub fn num_queries(&self) -> usize {
        self.queries.len()
    }

    /// Total number of relevance judgments
    pub fn num_qrels(&self) -> usize {
        self.qrels.values().map(HashMap::len).sum()
    }
}

#[derive(Deserialize)]
struct JsonlRecord {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    text: String,
}

/// Load a BEIR dataset folder, e.g.
/// `load(Path::new("dataset/scifact"), "corpus.jsonl", "queries.jsonl", "qrels", "test")`.
pub fn load(
    folder: &Path,
    corpus_file: &str,
    query_file: &str,
    qrels_folder: &str,
    split: &str,
) -> Result<Dataset> {
    let qrels_path = folder.join(qrels_folder).join(format!("{}.tsv", split));
    let corpus_path = folder.join(corpus_file);
    let query_path = folder.join(query_file);

    check(&qrels_path, "tsv")?;
    check(&corpus_path, "jsonl")?;
    check(&query_path, "jsonl")?;

    let corpus = load_corpus(&corpus_path)?;
    let queries = load_queries(&query_path)?;
    let qrels = load_qrels(&qrels_path)?;

    log::info!(
        "Loaded {} documents, {} queries, {} judged queries from {}",
        corpus.len(),
        queries.len(),
        qrels.len(),
        folder.display()
    );

    Ok(Dataset {
        corpus,
        queries,
        qrels,
    })
}

/// Ensure a file has the expected extension and exists.
pub fn check(path: &Path, ext: &str) -> Result<()> {
    if path.extension().and_then(|e| e.to_str()) != Some(ext) {
        return Err(BenchError::InvalidInput(format!(
            "File {} must have .{} extension",
            path.display(),
            ext
        )));
    }
    if !path.is_file() {
        return Err(BenchError::InvalidInput(format!(
            "File does not exist: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Load `corpus.jsonl`. Invalid lines are skipped with a warning.
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let mut corpus = Corpus::new();
    for record in read_jsonl(path, "corpus")? {
        corpus.insert(
            record.id,
            Document {
                title: record.title,
                text: record.text,
            },
        );
    }
    Ok(corpus)
}

/// Load `queries.jsonl`. Invalid lines are skipped with a warning.
pub fn load_queries(path: &Path) -> Result<Queries> {
    Ok(read_jsonl(path, "queries")?
        .into_iter()
        .map(|record| (record.id, record.text))
        .collect())
}

fn read_jsonl(path: &Path, kind: &str) -> Result<Vec<JsonlRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JsonlRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("[{}] Skipping line {} of {}: {}", kind, idx + 1, path.display(), e),
        }
    }

    Ok(records)
}
