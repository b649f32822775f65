//! Evaluation framework: run files, qrels, relevance evaluator, and NDCG/MAP/Recall/P@K aggregation.

pub mod evaluator;
pub mod measures;
pub mod metrics;
pub mod qrels;
pub mod results;

pub use evaluator::{QueryScores, RelevanceEvaluator};
pub use measures::{Measure, MetricFamily};
pub use metrics::{aggregate, evaluate, EvalReport, MetricScores};
pub use qrels::{load_qrels, read_qrels, Qrels};
pub use results::{load_results, save_results, Results};
