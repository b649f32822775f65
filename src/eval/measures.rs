//! Metric families and trec_eval-style measure strings (`ndcg_cut.10,100`).

use crate::error::{BenchError, Result};
use elinor::Metric;
use std::str::FromStr;

/// Cutoffs trec_eval uses when a measure is requested without any.
pub const DEFAULT_CUTOFFS: [usize; 9] = [5, 10, 15, 20, 30, 100, 200, 500, 1000];

/// The four reported metric families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricFamily {
    Ndcg,
    Map,
    Recall,
    Precision,
}

impl MetricFamily {
    /// Report order: NDCG, MAP, Recall, Precision.
    pub const ALL: [MetricFamily; 4] = [
        MetricFamily::Ndcg,
        MetricFamily::Map,
        MetricFamily::Recall,
        MetricFamily::Precision,
    ];

    /// trec_eval measure name.
    pub fn measure_name(self) -> &'static str {
        match self {
            MetricFamily::Ndcg => "ndcg_cut",
            MetricFamily::Map => "map_cut",
            MetricFamily::Recall => "recall",
            MetricFamily::Precision => "P",
        }
    }

    /// Prefix used in report labels (`NDCG@10`).
    pub fn label(self) -> &'static str {
        match self {
            MetricFamily::Ndcg => "NDCG",
            MetricFamily::Map => "MAP",
            MetricFamily::Recall => "Recall",
            MetricFamily::Precision => "P",
        }
    }

    pub fn from_measure_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.measure_name() == name)
    }

    /// One request string covering every cutoff, e.g. `ndcg_cut.10,100`.
    pub fn measure_spec(self, k_values: &[usize]) -> String {
        let cutoffs: Vec<String> = k_values.iter().map(|k| k.to_string()).collect();
        format!("{}.{}", self.measure_name(), cutoffs.join(","))
    }

    /// Key of one cutoff in the evaluator's per-query output, e.g. `ndcg_cut_10`.
    pub fn measure_key(self, k: usize) -> String {
        format!("{}_{}", self.measure_name(), k)
    }

    /// Report label for one cutoff, e.g. `NDCG@10`.
    pub fn label_for(self, k: usize) -> String {
        format!("{}@{}", self.label(), k)
    }

    pub(crate) fn metric(self, k: usize) -> Metric {
        match self {
            MetricFamily::Ndcg => Metric::NDCG { k },
            MetricFamily::Map => Metric::AP { k },
            MetricFamily::Recall => Metric::Recall { k },
            MetricFamily::Precision => Metric::Precision { k },
        }
    }
}

/// A parsed measure request: one family at one or more cutoffs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measure {
    pub family: MetricFamily,
    pub cutoffs: Vec<usize>,
}

impl FromStr for Measure {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, params) = match s.split_once('.') {
            Some((name, params)) => (name, Some(params)),
            None => (s, None),
        };

        let family = MetricFamily::from_measure_name(name)
            .ok_or_else(|| BenchError::Parse(format!("unsupported measure: {}", s)))?;

        let cutoffs = match params {
            None => DEFAULT_CUTOFFS.to_vec(),
            Some(params) => params
                .split(',')
                .map(|p| match p.trim().parse::<usize>() {
                    Ok(k) if k > 0 => Ok(k),
                    _ => Err(BenchError::Parse(format!(
                        "invalid cutoff {:?} in measure {}",
                        p, s
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(Measure { family, cutoffs })
    }
}

/// Validate caller-supplied cutoffs: non-empty, positive, duplicates dropped (first kept).
pub fn normalize_cutoffs(k_values: &[usize]) -> Result<Vec<usize>> {
    if k_values.is_empty() {
        return Err(BenchError::InvalidInput("at least one cutoff is required".to_string()));
    }
    if k_values.contains(&0) {
        return Err(BenchError::InvalidInput("cutoffs must be positive".to_string()));
    }
    let mut out = Vec::with_capacity(k_values.len());
    for &k in k_values {
        if !out.contains(&k) {
            out.push(k);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_spec_joins_cutoffs() {
        assert_eq!(MetricFamily::Ndcg.measure_spec(&[10, 100]), "ndcg_cut.10,100");
        assert_eq!(MetricFamily::Map.measure_spec(&[10, 100]), "map_cut.10,100");
        assert_eq!(MetricFamily::Recall.measure_spec(&[10, 100]), "recall.10,100");
        assert_eq!(MetricFamily::Precision.measure_spec(&[5]), "P.5");
    }

    #[test]
    fn keys_and_labels() {
        assert_eq!(MetricFamily::Precision.measure_key(100), "P_100");
        assert_eq!(MetricFamily::Map.measure_key(10), "map_cut_10");
        assert_eq!(MetricFamily::Recall.label_for(10), "Recall@10");
        assert_eq!(MetricFamily::Precision.label_for(1), "P@1");
    }

    #[test]
    fn parse_measure_with_cutoffs() {
        let m: Measure = "ndcg_cut.1,3,5".parse().unwrap();
        assert_eq!(m.family, MetricFamily::Ndcg);
        assert_eq!(m.cutoffs, vec![1, 3, 5]);
    }

    #[test]
    fn parse_measure_without_cutoffs_uses_defaults() {
        let m: Measure = "recall".parse().unwrap();
        assert_eq!(m.family, MetricFamily::Recall);
        assert_eq!(m.cutoffs, DEFAULT_CUTOFFS.to_vec());
    }

    #[test]
    fn parse_measure_rejects_unknown_name() {
        assert!("bpref".parse::<Measure>().is_err());
        assert!("NDCG.10".parse::<Measure>().is_err());
    }

    #[test]
    fn parse_measure_rejects_bad_cutoff() {
        assert!("P.0".parse::<Measure>().is_err());
        assert!("P.ten".parse::<Measure>().is_err());
        assert!("P.".parse::<Measure>().is_err());
    }

    #[test]
    fn normalize_cutoffs_keeps_order_and_drops_duplicates() {
        assert_eq!(normalize_cutoffs(&[100, 10, 100]).unwrap(), vec![100, 10]);
        assert!(normalize_cutoffs(&[]).is_err());
        assert!(normalize_cutoffs(&[10, 0]).is_err());
    }
}
