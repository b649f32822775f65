//! Relevance evaluator: scores a run against qrels for a set of measure strings.
//!
//! Metric values are computed by `elinor`; this type only translates between the
//! string-keyed run/qrels maps and elinor's relevance stores, and lays the output
//! out per query as `measure_key -> value` (`ndcg_cut_10`, `P_100`, ...).
//!
//! Two trec_eval conventions are enforced here rather than left to elinor: ties
//! in score are broken by document id descending, and a query with no relevant
//! judgment scores 0 on every measure.

use crate::error::{BenchError, Result};
use crate::eval::measures::Measure;
use crate::eval::qrels::Qrels;
use crate::eval::results::Results;
use elinor::{PredRelStoreBuilder, TrueRelStoreBuilder};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Per-query measure values: query id -> measure key -> value.
pub type QueryScores = BTreeMap<String, BTreeMap<String, f64>>;

pub struct RelevanceEvaluator<'a> {
    qrels: &'a Qrels,
    measures: Vec<Measure>,
}

impl<'a> RelevanceEvaluator<'a> {
    /// Build an evaluator for the given measure strings (`ndcg_cut.10,100`, `P.5`, ...).
    pub fn new<S: AsRef<str>>(qrels: &'a Qrels, measures: &[S]) -> Result<Self> {
        let measures = measures
            .iter()
            .map(|m| m.as_ref().parse::<Measure>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { qrels, measures })
    }

    /// Evaluate a run. Only queries that have judgments and at least one retrieved
    /// document are scored; documents are ranked by descending score, ties by
    /// descending document id.
    pub fn evaluate(&self, results: &Results) -> Result<QueryScores> {
        let mut true_builder = TrueRelStoreBuilder::new();
        let mut pred_builder = PredRelStoreBuilder::new();
        let mut evaluated = 0usize;
        let mut without_relevant = BTreeSet::new();

        for (qid, docs) in results {
            let judged = match self.qrels.get(qid) {
                Some(judged) => judged,
                None => {
                    log::debug!("Skipping query {}: no relevance judgments", qid);
                    continue;
                }
            };
            if docs.is_empty() {
                log::debug!("Skipping query {}: no retrieved documents", qid);
                continue;
            }

            if !judged.values().any(|&grade| grade > 0) {
                without_relevant.insert(qid.clone());
            }
            for (doc_id, &grade) in judged {
                // Negative grades are non-relevant
                true_builder
                    .add_record(qid.clone(), doc_id.clone(), grade.max(0) as u32)
                    .map_err(|e| BenchError::Evaluator(e.to_string()))?;
            }
            for (doc_id, rank_score) in rank_scores(docs) {
                pred_builder
                    .add_record(qid.clone(), doc_id.clone(), rank_score.into())
                    .map_err(|e| BenchError::Evaluator(e.to_string()))?;
            }
            evaluated += 1;
        }

        let mut scores = QueryScores::new();
        if evaluated == 0 {
            return Ok(scores);
        }

        let true_rels = true_builder.build();
        let pred_rels = pred_builder.build();

        for measure in &self.measures {
            for &k in &measure.cutoffs {
                let evaluation = elinor::evaluate(&true_rels, &pred_rels, measure.family.metric(k))
                    .map_err(|e| BenchError::Evaluator(e.to_string()))?;
                let key = measure.family.measure_key(k);
                for (qid, value) in evaluation.scores() {
                    // elinor reports NDCG 1.0 when the ideal DCG is 0
                    let value = if without_relevant.contains(qid) { 0.0 } else { *value };
                    scores
                        .entry(qid.clone())
                        .or_default()
                        .insert(key.clone(), value);
                }
            }
        }

        log::debug!(
            "Evaluated {} of {} queries over {} measure(s)",
            scores.len(),
            results.len(),
            self.measures.len()
        );
        Ok(scores)
    }
}

/// Replace raw scores with strictly decreasing rank scores so that elinor sees
/// the trec_eval order: score descending, then document id descending.
fn rank_scores(docs: &HashMap<String, f64>) -> Vec<(&String, f64)> {
    let mut ranked: Vec<(&String, f64)> = docs.iter().map(|(id, &score)| (id, score)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(a.0)));

    let len = ranked.len();
    ranked
        .into_iter()
        .enumerate()
        .map(|(rank, (id, _))| (id, (len - rank) as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qrels(rows: &[(&str, &str, i32)]) -> Qrels {
        let mut qrels = Qrels::new();
        for (q, d, g) in rows {
            qrels
                .entry(q.to_string())
                .or_default()
                .insert(d.to_string(), *g);
        }
        qrels
    }

    fn run(rows: &[(&str, &str, f64)]) -> Results {
        let mut results = Results::new();
        for (q, d, s) in rows {
            results
                .entry(q.to_string())
                .or_default()
                .insert(d.to_string(), *s);
        }
        results
    }

    #[test]
    fn rejects_unknown_measure() {
        let qrels = qrels(&[("q1", "d1", 1)]);
        assert!(RelevanceEvaluator::new(&qrels, &["success.1"]).is_err());
    }

    #[test]
    fn one_measure_string_yields_every_cutoff() {
        let qrels = qrels(&[("q1", "d1", 1), ("q1", "d2", 0)]);
        let results = run(&[("q1", "d1", 2.0), ("q1", "d2", 1.0)]);
        let evaluator = RelevanceEvaluator::new(&qrels, &["P.1,2", "recall.1,2"]).unwrap();

        let scores = evaluator.evaluate(&results).unwrap();
        let q1 = &scores["q1"];
        assert_eq!(q1.len(), 4);
        assert!((q1["P_1"] - 1.0).abs() < 1e-9);
        assert!((q1["P_2"] - 0.5).abs() < 1e-9);
        assert!((q1["recall_1"] - 1.0).abs() < 1e-9);
        assert!((q1["recall_2"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ranks_by_score_not_insertion_order() {
        let qrels = qrels(&[("q1", "d1", 1), ("q1", "d2", 0)]);
        // d2 scores higher, so the relevant d1 lands at rank 2
        let results = run(&[("q1", "d1", 0.5), ("q1", "d2", 3.0)]);
        let evaluator = RelevanceEvaluator::new(&qrels, &["P.1"]).unwrap();

        let scores = evaluator.evaluate(&results).unwrap();
        assert_eq!(scores["q1"]["P_1"], 0.0);
    }

    #[test]
    fn ties_break_by_descending_doc_id() {
        let qrels = qrels(&[("q1", "b", 1)]);
        let results = run(&[("q1", "a", 1.0), ("q1", "b", 1.0)]);
        let evaluator = RelevanceEvaluator::new(&qrels, &["P.1"]).unwrap();

        let scores = evaluator.evaluate(&results).unwrap();
        assert_eq!(scores["q1"]["P_1"], 1.0);
    }

    #[test]
    fn rank_scores_follow_score_then_doc_id() {
        let docs: HashMap<String, f64> = [("a", 1.0), ("c", 0.5), ("b", 1.0)]
            .into_iter()
            .map(|(d, s)| (d.to_string(), s))
            .collect();
        let ranked: Vec<(String, f64)> = rank_scores(&docs)
            .into_iter()
            .map(|(d, s)| (d.clone(), s))
            .collect();
        assert_eq!(
            ranked,
            vec![("b".to_string(), 3.0), ("a".to_string(), 2.0), ("c".to_string(), 1.0)]
        );
    }

    #[test]
    fn query_without_relevant_judgment_scores_zero() {
        let qrels = qrels(&[("q1", "d1", 1), ("q2", "d3", 0), ("q3", "d4", -1)]);
        let results = run(&[("q1", "d1", 2.0), ("q2", "d3", 1.0), ("q3", "d4", 1.0)]);
        let evaluator =
            RelevanceEvaluator::new(&qrels, &["ndcg_cut.10", "map_cut.10", "recall.10", "P.10"])
                .unwrap();

        let scores = evaluator.evaluate(&results).unwrap();
        assert!((scores["q1"]["ndcg_cut_10"] - 1.0).abs() < 1e-9);
        for qid in ["q2", "q3"] {
            assert_eq!(scores[qid].len(), 4);
            assert!(scores[qid].values().all(|&v| v == 0.0), "{}: {:?}", qid, scores[qid]);
        }
    }

    #[test]
    fn skips_queries_without_judgments() {
        let qrels = qrels(&[("q1", "d1", 1)]);
        let results = run(&[("q1", "d1", 1.0), ("q9", "d1", 1.0)]);
        let evaluator = RelevanceEvaluator::new(&qrels, &["ndcg_cut.10"]).unwrap();

        let scores = evaluator.evaluate(&results).unwrap();
        assert_eq!(scores.len(), 1);
        assert!(scores.contains_key("q1"));
    }

    #[test]
    fn empty_run_yields_no_scores() {
        let qrels = qrels(&[("q1", "d1", 1)]);
        let evaluator = RelevanceEvaluator::new(&qrels, &["map_cut.10"]).unwrap();
        assert!(evaluator.evaluate(&Results::new()).unwrap().is_empty());
    }
}
