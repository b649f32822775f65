//! Corpus-level metrics: NDCG@K, MAP@K, Recall@K and P@K averaged over evaluated queries.

use crate::error::{BenchError, Result};
use crate::eval::evaluator::RelevanceEvaluator;
use crate::eval::measures::{normalize_cutoffs, MetricFamily};
use crate::eval::qrels::{load_qrels, Qrels};
use crate::eval::results::{load_results, Results};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::Path;

/// Averaged scores of one metric family, in cutoff order (`NDCG@10`, `NDCG@100`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricScores {
    family: MetricFamily,
    entries: Vec<(String, f64)>,
}

impl MetricScores {
    pub fn family(&self) -> MetricFamily {
        self.family
    }

    /// Score for a label such as `MAP@10`.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MetricScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Result of an evaluation run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EvalReport {
    pub ndcg: MetricScores,
    pub map: MetricScores,
    pub recall: MetricScores,
    pub precision: MetricScores,
    /// Number of queries the averages were taken over.
    pub num_queries: usize,
}

impl EvalReport {
    /// Families in report order: NDCG, MAP, Recall, Precision.
    pub fn families(&self) -> [&MetricScores; 4] {
        [&self.ndcg, &self.map, &self.recall, &self.precision]
    }

    /// `LABEL: value` lines with 4 decimal places, in report order.
    pub fn to_lines(&self) -> Vec<String> {
        self.families()
            .iter()
            .flat_map(|scores| scores.iter())
            .map(|(label, value)| format!("{}: {:.4}", label, value))
            .collect()
    }
}

fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

/// Evaluate a run already in memory.
///
/// Requests every cutoff of a family with a single measure string, sums the
/// per-query values, and divides by the number of evaluated queries (rounded to
/// 5 decimals). Fails with [`BenchError::EmptyEvaluation`] when no query could be
/// evaluated.
pub fn aggregate(results: &Results, qrels: &Qrels, k_values: &[usize]) -> Result<EvalReport> {
    let k_values = normalize_cutoffs(k_values)?;

    let measures: Vec<String> = MetricFamily::ALL
        .iter()
        .map(|family| family.measure_spec(&k_values))
        .collect();
    let evaluator = RelevanceEvaluator::new(qrels, &measures)?;
    let per_query = evaluator.evaluate(results)?;

    let mut sums = [
        vec![0.0; k_values.len()],
        vec![0.0; k_values.len()],
        vec![0.0; k_values.len()],
        vec![0.0; k_values.len()],
    ];
    for (query_id, values) in &per_query {
        for (family, family_sums) in MetricFamily::ALL.iter().zip(sums.iter_mut()) {
            for (sum, &k) in family_sums.iter_mut().zip(&k_values) {
                let key = family.measure_key(k);
                let value = values.get(&key).ok_or_else(|| {
                    BenchError::Evaluator(format!("missing {} for query {}", key, query_id))
                })?;
                *sum += value;
            }
        }
    }

    let num_queries = per_query.len();
    if num_queries == 0 {
        return Err(BenchError::EmptyEvaluation);
    }

    let [ndcg, map, recall, precision] = sums;
    let average = |family: MetricFamily, family_sums: Vec<f64>| MetricScores {
        family,
        entries: k_values
            .iter()
            .zip(family_sums)
            .map(|(&k, sum)| (family.label_for(k), round5(sum / num_queries as f64)))
            .collect(),
    };

    Ok(EvalReport {
        ndcg: average(MetricFamily::Ndcg, ndcg),
        map: average(MetricFamily::Map, map),
        recall: average(MetricFamily::Recall, recall),
        precision: average(MetricFamily::Precision, precision),
        num_queries,
    })
}

/// Load a run file and a qrels file and evaluate them at the given cutoffs.
pub fn evaluate(result_path: &Path, qrels_path: &Path, k_values: &[usize]) -> Result<EvalReport> {
    let results = load_results(result_path)?;
    let qrels = load_qrels(qrels_path)?;
    let report = aggregate(&results, &qrels, k_values)?;
    log::info!("Evaluated {} queries", report.num_queries);
    Ok(report)
}
