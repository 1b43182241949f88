//! Exact brute-force top-K cosine search.
//!
//! Favors an exact, deterministic O(rows · dim) scan over an approximate
//! index, in the manner of a flat-file linear scan over a journal: at
//! the row counts this system targets (event/user catalogs, not
//! web-scale corpora) the scan is cheap and the determinism is load-
//! bearing, since two identical queries against the same published
//! snapshot must return the same ranked ids.

use crate::embeddings::cosine_similarity;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow {
    pub id: String,
    pub score: f32,
    pub row: usize,
}

/// Score every row against `query`, keep the top `k` by score descending,
/// breaking ties by `id` ascending so results are stable across runs and
/// across store implementations.
///
/// `filter`, if given, is evaluated against each row's index before scoring
/// (a row a filter rejects never enters the ranking, so `k` results are
/// drawn only from eligible rows).
pub fn top_k(
    query: &[f32],
    dim: usize,
    ids: &[String],
    matrix: &[f32],
    k: usize,
    filter: Option<&dyn Fn(usize) -> bool>,
) -> Vec<ScoredRow> {
    let rows = ids.len();
    let mut scored: Vec<ScoredRow> = (0..rows)
        .filter(|&row| filter.map(|f| f(row)).unwrap_or(true))
        .map(|row| {
            let start = row * dim;
            let vector = &matrix[start..start + dim];
            ScoredRow {
                id: ids[row].clone(),
                score: cosine_similarity(query, vector),
                row,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> (Vec<String>, Vec<f32>) {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        // a and b are identical, both score 1.0 against query [1,0]; tie
        // must resolve to "a" before "b".
        let matrix = vec![1.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        (ids, matrix)
    }

    #[test]
    fn top_k_orders_by_score_descending() {
        let (ids, matrix) = matrix();
        let results = top_k(&[1.0, 0.0], 2, &ids, &matrix, 3, None);
        assert_eq!(results[2].id, "c");
    }

    #[test]
    fn ties_break_by_id_ascending() {
        let (ids, matrix) = matrix();
        let results = top_k(&[1.0, 0.0], 2, &ids, &matrix, 2, None);
        assert_eq!(results[0].id, "a");
        assert_eq!(results[1].id, "b");
    }

    #[test]
    fn filter_excludes_rows_before_ranking() {
        let (ids, matrix) = matrix();
        let filter: &dyn Fn(usize) -> bool = &|row| row != 0;
        let results = top_k(&[1.0, 0.0], 2, &ids, &matrix, 3, Some(filter));
        assert!(results.iter().all(|r| r.id != "a"));
    }

    #[test]
    fn k_larger_than_rows_returns_all() {
        let (ids, matrix) = matrix();
        let results = top_k(&[1.0, 0.0], 2, &ids, &matrix, 100, None);
        assert_eq!(results.len(), 3);
    }
}
