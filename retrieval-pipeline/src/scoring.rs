use std::cmp::Ordering;

use common::storage::types::content_item::ContentItem;
use serde::{Deserialize, Serialize};

/// Additive score adjustment per priority step.
pub const PRIORITY_BOOST_STEP: f32 = 0.05;
/// Items scoring at or below this never reach a result set.
pub const SCORE_FLOOR: f32 = 0.3;

/// One item with its final relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedItem {
    pub score: f32,
    pub item: ContentItem,
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot = x.mul_add(*y, dot);
        norm_a = x.mul_add(*x, norm_a);
        norm_b = y.mul_add(*y, norm_b);
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Similarity plus the priority boost, capped at 1.
pub fn boosted_score(similarity: f32, priority: i64) -> f32 {
    (priority as f32).mul_add(PRIORITY_BOOST_STEP, similarity).min(1.0)
}

/// Scores the corpus against a query embedding and keeps the best matches.
///
/// Items without an embedding are skipped rather than scored at zero, so a
/// backlog of unembedded items can never crowd a result set. Ordering is
/// score, then priority, then recency, with the id as a final tie break to
/// keep repeated runs stable.
pub fn rank(items: Vec<ContentItem>, query_embedding: &[f32], limit: usize) -> Vec<RankedItem> {
    let mut ranked: Vec<RankedItem> = items
        .into_iter()
        .filter_map(|item| {
            let embedding = item.embedding.as_deref()?;
            let similarity = cosine_similarity(query_embedding, embedding);
            let score = boosted_score(similarity, item.priority);
            (score > SCORE_FLOOR).then(|| RankedItem { score, item })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.item.priority.cmp(&a.item.priority))
            .then_with(|| b.item.updated_at.cmp(&a.item.updated_at))
            .then_with(|| a.item.id.cmp(&b.item.id))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::utils::text::sha256_hex;

    fn item(id: &str, priority: i64, embedding: Option<Vec<f32>>) -> ContentItem {
        use chrono::Utc;

        let now = Utc::now();
        ContentItem {
            id: id.to_string(),
            created_at: now,
            updated_at: now,
            external_id: id.to_string(),
            title: format!("Item {id}"),
            slug: format!("item-{id}"),
            excerpt: "An excerpt.".to_string(),
            body: String::new(),
            category: "general".to_string(),
            tags: vec![],
            priority,
            embedding,
            content_hash: sha256_hex(id),
            synced_at: now,
        }
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        let a = vec![0.6, 0.8];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);

        let orthogonal = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(orthogonal.abs() < 1e-6);

        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_boost_is_additive_and_capped() {
        assert!((boosted_score(0.5, 2) - 0.6).abs() < 1e-6);
        assert!((boosted_score(0.9, 10) - 1.0).abs() < 1e-6);
        assert!(boosted_score(0.4, 1) > boosted_score(0.4, 0));
    }

    #[test]
    fn test_rank_drops_low_scores_and_unembedded_items() {
        let query = vec![0.0, 1.0];
        let items = vec![
            // Orthogonal: similarity 0, filtered even with a moderate boost.
            item("a", 4, Some(vec![1.0, 0.0])),
            // Orthogonal but boosted well past the floor.
            item("b", 8, Some(vec![1.0, 0.0])),
            // Perfect match.
            item("c", 0, Some(vec![0.0, 1.0])),
            // No embedding yet.
            item("d", 9, None),
        ];

        let ranked = rank(items, &query, 10);
        let ids: Vec<&str> = ranked.iter().map(|r| r.item.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_rank_mixes_similarity_and_priority() {
        // Unit vectors against [1, 0]: a sits at similarity 0.5 and gets a
        // +0.10 boost, b sits at 0.92 unboosted. b must still win.
        let query = vec![1.0, 0.0];
        let a = item("a", 2, Some(vec![0.5, 0.866_025_4]));
        let b = item("b", 0, Some(vec![0.92, 0.391_918_4]));

        let ranked = rank(vec![a, b], &query, 10);
        assert_eq!(ranked[0].item.id, "b");
        assert!((ranked[0].score - 0.92).abs() < 1e-3);
        assert_eq!(ranked[1].item.id, "a");
        assert!((ranked[1].score - 0.60).abs() < 1e-3);
    }

    #[test]
    fn test_rank_breaks_ties_deterministically() {
        let query = vec![1.0, 0.0];
        let embedding = Some(vec![1.0, 0.0]);
        let first = item("beta", 0, embedding.clone());
        let mut second = item("alfa", 0, embedding);
        second.updated_at = first.updated_at;

        let ranked = rank(vec![first, second], &query, 10);
        assert_eq!(ranked[0].item.id, "alfa");
        assert_eq!(ranked[1].item.id, "beta");
    }

    #[test]
    fn test_rank_truncates_to_limit() {
        let query = vec![1.0, 0.0];
        let items: Vec<ContentItem> = (0..8)
            .map(|n| item(&format!("i{n}"), 0, Some(vec![1.0, 0.0])))
            .collect();

        let ranked = rank(items, &query, 3);
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn test_rank_on_empty_corpus_is_empty() {
        assert!(rank(vec![], &[1.0, 0.0], 5).is_empty());
    }
}
