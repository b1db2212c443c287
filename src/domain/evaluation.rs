//! Offline retrieval quality metrics over ranked results.
//!
//! Relevance judgments (`Qrels`) map query id → document id → graded
//! relevance, where anything above zero counts as relevant. A `Run` maps
//! query id → document id → run score; higher means ranked earlier.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::domain::{
    errors::{DomainError, Result},
    RankedDocument,
};

pub type Qrels = HashMap<String, HashMap<String, u32>>;
pub type Run = HashMap<String, HashMap<String, f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Ndcg(usize),
    Recall(usize),
    Precision(usize),
    Hits(usize),
    Map(Option<usize>),
    Mrr(Option<usize>),
}

impl Metric {
    /// `ndcg@10` plus `hits@{1,2,3,4,5,10}`.
    pub fn defaults() -> Vec<Metric> {
        let mut metrics = vec![Metric::Ndcg(10)];
        metrics.extend([1, 2, 3, 4, 5, 10].map(Metric::Hits));
        metrics
    }

    fn cutoff(&self) -> Option<usize> {
        match *self {
            Self::Ndcg(k) | Self::Recall(k) | Self::Precision(k) | Self::Hits(k) => Some(k),
            Self::Map(k) | Self::Mrr(k) => k,
        }
    }

    fn compute(&self, ranking: &[&str], judgments: &HashMap<String, u32>) -> f64 {
        let relevance = |doc: &str| judgments.get(doc).copied().unwrap_or(0);
        let total_relevant = judgments.values().filter(|&&r| r > 0).count();

        let ranking = match self.cutoff() {
            Some(k) => &ranking[..k.min(ranking.len())],
            None => ranking,
        };
        let hits = ranking.iter().filter(|&&d| relevance(d) > 0).count();

        match *self {
            Self::Hits(_) => hits as f64,
            Self::Precision(k) => {
                if k == 0 {
                    0.0
                } else {
                    hits as f64 / k as f64
                }
            }
            Self::Recall(_) => {
                if total_relevant == 0 {
                    0.0
                } else {
                    hits as f64 / total_relevant as f64
                }
            }
            Self::Mrr(_) => ranking
                .iter()
                .position(|&d| relevance(d) > 0)
                .map(|rank| 1.0 / (rank + 1) as f64)
                .unwrap_or(0.0),
            Self::Map(_) => {
                if total_relevant == 0 {
                    return 0.0;
                }
                let mut seen = 0usize;
                let mut precision_sum = 0.0;
                for (rank, &doc) in ranking.iter().enumerate() {
                    if relevance(doc) > 0 {
                        seen += 1;
                        precision_sum += seen as f64 / (rank + 1) as f64;
                    }
                }
                precision_sum / total_relevant as f64
            }
            Self::Ndcg(k) => {
                let dcg: f64 = ranking
                    .iter()
                    .enumerate()
                    .map(|(rank, &doc)| discounted(relevance(doc), rank))
                    .sum();

                let mut ideal: Vec<u32> =
                    judgments.values().copied().filter(|&r| r > 0).collect();
                ideal.sort_unstable_by(|a, b| b.cmp(a));
                let idcg: f64 = ideal
                    .into_iter()
                    .take(k)
                    .enumerate()
                    .map(|(rank, rel)| discounted(rel, rank))
                    .sum();

                if idcg == 0.0 {
                    0.0
                } else {
                    dcg / idcg
                }
            }
        }
    }
}

/// Gain of a document at zero-based `rank`: `rel / log2(rank + 2)`.
fn discounted(relevance: u32, rank: usize) -> f64 {
    relevance as f64 / ((rank + 2) as f64).log2()
}

impl FromStr for Metric {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, cutoff) = match s.split_once('@') {
            Some((name, k)) => {
                let k = k
                    .parse::<usize>()
                    .map_err(|_| DomainError::validation(format!("invalid metric cutoff: {s}")))?;
                (name, Some(k))
            }
            None => (s, None),
        };

        let with_cutoff = |build: fn(usize) -> Metric| {
            cutoff
                .map(build)
                .ok_or_else(|| DomainError::validation(format!("metric {name} needs a cutoff")))
        };

        match name.to_ascii_lowercase().as_str() {
            "ndcg" => with_cutoff(Metric::Ndcg),
            "recall" => with_cutoff(Metric::Recall),
            "precision" => with_cutoff(Metric::Precision),
            "hits" => with_cutoff(Metric::Hits),
            "map" => Ok(Metric::Map(cutoff)),
            "mrr" => Ok(Metric::Mrr(cutoff)),
            _ => Err(DomainError::validation(format!("unknown metric: {s}"))),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ndcg(_) => "ndcg",
            Self::Recall(_) => "recall",
            Self::Precision(_) => "precision",
            Self::Hits(_) => "hits",
            Self::Map(_) => "map",
            Self::Mrr(_) => "mrr",
        };
        match self.cutoff() {
            Some(k) => write!(f, "{name}@{k}"),
            None => f.write_str(name),
        }
    }
}

/// Converts ranked results into a run, scoring the document at zero-based
/// rank `r` as `1 - r / k`.
pub fn build_run(query_ids: &[String], results: &[Vec<RankedDocument>], k: usize) -> Run {
    let k = k.max(1) as f64;
    query_ids
        .iter()
        .zip(results)
        .map(|(query_id, ranked)| {
            let scores: HashMap<String, f64> = ranked
                .iter()
                .enumerate()
                .map(|(rank, doc)| (doc.record.id.clone(), 1.0 - rank as f64 / k))
                .collect();
            (query_id.clone(), scores)
        })
        .collect()
}

/// Mean of every metric over the judged queries.
///
/// Judged queries absent from the run count as zero; run queries without
/// judgments are ignored.
pub fn evaluate(qrels: &Qrels, run: &Run, metrics: &[Metric]) -> BTreeMap<String, f64> {
    let metrics = if metrics.is_empty() {
        Metric::defaults()
    } else {
        metrics.to_vec()
    };

    let mut totals = vec![0.0; metrics.len()];
    for (query_id, judgments) in qrels {
        let ranking = run.get(query_id).map(ordered).unwrap_or_default();
        for (total, metric) in totals.iter_mut().zip(&metrics) {
            *total += metric.compute(&ranking, judgments);
        }
    }

    let queries = qrels.len().max(1) as f64;
    metrics
        .iter()
        .zip(totals)
        .map(|(metric, total)| (metric.to_string(), total / queries))
        .collect()
}

/// Document ids by descending run score, ties broken by id.
fn ordered(scores: &HashMap<String, f64>) -> Vec<&str> {
    let mut docs: Vec<(&str, f64)> = scores.iter().map(|(d, s)| (d.as_str(), *s)).collect();
    docs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    docs.into_iter().map(|(d, _)| d).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentRecord;
    use std::sync::Arc;

    fn qrels(entries: Vec<(&str, Vec<(&str, u32)>)>) -> Qrels {
        entries
            .into_iter()
            .map(|(q, docs)| {
                (
                    q.to_string(),
                    docs.into_iter().map(|(d, r)| (d.to_string(), r)).collect(),
                )
            })
            .collect()
    }

    fn ranked(ids: &[&str]) -> Vec<RankedDocument> {
        ids.iter()
            .map(|id| RankedDocument {
                record: Arc::new(DocumentRecord::new(*id)),
                similarity: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_parse_metrics() {
        assert_eq!("ndcg@10".parse::<Metric>().unwrap(), Metric::Ndcg(10));
        assert_eq!("Recall@100".parse::<Metric>().unwrap(), Metric::Recall(100));
        assert_eq!("map".parse::<Metric>().unwrap(), Metric::Map(None));
        assert_eq!("mrr@5".parse::<Metric>().unwrap(), Metric::Mrr(Some(5)));
        assert!("hits".parse::<Metric>().is_err());
        assert!("ndcg@x".parse::<Metric>().is_err());
        assert!("bleu@4".parse::<Metric>().is_err());
        assert_eq!(Metric::Precision(3).to_string(), "precision@3");
    }

    #[test]
    fn test_build_run_scores_by_rank() {
        let run = build_run(&["q".to_string()], &[ranked(&["a", "b", "c"])], 30);
        let scores = &run["q"];
        assert_eq!(scores["a"], 1.0);
        assert!((scores["b"] - (1.0 - 1.0 / 30.0)).abs() < 1e-12);
        assert!(scores["b"] > scores["c"]);
    }

    #[test]
    fn test_metrics_single_query() {
        let judgments = qrels(vec![("q", vec![("a", 1), ("c", 1)])]);
        let run = build_run(&["q".to_string()], &[ranked(&["b", "a", "c", "d"])], 4);

        let scores = evaluate(
            &judgments,
            &run,
            &[
                Metric::Hits(1),
                Metric::Hits(3),
                Metric::Recall(2),
                Metric::Precision(2),
                Metric::Mrr(None),
                Metric::Map(None),
                Metric::Ndcg(3),
            ],
        );

        assert_eq!(scores["hits@1"], 0.0);
        assert_eq!(scores["hits@3"], 2.0);
        assert_eq!(scores["recall@2"], 0.5);
        assert_eq!(scores["precision@2"], 0.5);
        assert_eq!(scores["mrr"], 0.5);
        // (1/2 + 2/3) / 2
        assert!((scores["map"] - 7.0 / 12.0).abs() < 1e-12);
        // dcg = 1/log2(3) + 1/log2(4), idcg = 1 + 1/log2(3)
        let expected = (1.0 / 3f64.log2() + 0.5) / (1.0 + 1.0 / 3f64.log2());
        assert!((scores["ndcg@3"] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_missing_run_query_counts_as_zero() {
        let judgments = qrels(vec![("q1", vec![("a", 1)]), ("q2", vec![("b", 1)])]);
        let run = build_run(
            &["q1".to_string(), "extra".to_string()],
            &[ranked(&["a"]), ranked(&["b"])],
            10,
        );

        let scores = evaluate(&judgments, &run, &[Metric::Hits(1)]);
        assert_eq!(scores["hits@1"], 0.5);
    }

    #[test]
    fn test_default_metrics() {
        let judgments = qrels(vec![("q", vec![("a", 1)])]);
        let run = build_run(&["q".to_string()], &[ranked(&["a"])], 10);

        let scores = evaluate(&judgments, &run, &[]);
        assert_eq!(scores.len(), 7);
        assert_eq!(scores["ndcg@10"], 1.0);
        assert_eq!(scores["hits@10"], 1.0);
    }
}
