use std::cmp::Ordering;

use tracing::debug;

use crate::domain::{
    errors::{DomainError, Result},
    RankedDocument, StoredDocument,
};

/// Turns a requested `k` into a result length.
///
/// `None` means every document. A `k` above `available` is clamped.
pub fn resolve_k(k: Option<i64>, available: usize) -> Result<usize> {
    match k {
        None => Ok(available),
        Some(k) if k < 0 => Err(DomainError::InvalidK(k)),
        Some(k) => {
            let k = usize::try_from(k).unwrap_or(usize::MAX);
            if k > available {
                debug!(requested = k, available, "k exceeds document count, clamping");
            }
            Ok(k.min(available))
        }
    }
}

/// Score order with every NaN above every number, whatever its sign bit.
fn score_cmp(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

/// Descending by score, then ascending by position. Total, so the result is
/// deterministic even for NaN and bit-identical scores.
fn by_score_desc(scores: &[f32]) -> impl Fn(&usize, &usize) -> Ordering + '_ {
    move |a: &usize, b: &usize| score_cmp(scores[*b], scores[*a]).then(a.cmp(b))
}

/// Indices of the `k` highest scores, best first. Equal scores keep their
/// original relative order.
pub fn top_k_indices(scores: &[f32], k: usize) -> Vec<usize> {
    let k = k.min(scores.len());
    if k == 0 {
        return Vec::new();
    }

    let compare = by_score_desc(scores);
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    if k < indices.len() {
        indices.select_nth_unstable_by(k - 1, &compare);
        indices.truncate(k);
    }
    indices.sort_unstable_by(&compare);
    indices
}

/// Ranks `documents` by `scores`, which must be aligned with them
/// position by position.
pub fn rank(
    scores: &[f32],
    documents: &[StoredDocument],
    k: Option<i64>,
) -> Result<Vec<RankedDocument>> {
    if scores.len() != documents.len() {
        return Err(DomainError::internal(format!(
            "{} scores for {} documents",
            scores.len(),
            documents.len()
        )));
    }

    let k = resolve_k(k, documents.len())?;

    Ok(top_k_indices(scores, k)
        .into_iter()
        .map(|index| RankedDocument {
            record: documents[index].record.clone(),
            similarity: scores[index],
        })
        .collect())
}
