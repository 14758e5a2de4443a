//! Per-category score aggregation for candidate descriptions.
//!
//! Read-only helper on top of [`KeywordRepository::lookup`]: sums the
//! normalized weights a description's tokens contribute to each category.
//! The final selection (confidence thresholds, tie-breaks) belongs to the
//! classifier, not to this crate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use centavo_core::{KeywordRepository, Result};

use crate::extract::extract;

/// Aggregated score of one category for a candidate description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category_id: Uuid,
    /// Sum of normalized weights contributed by matching tokens.
    pub score: f64,
    /// How many of the description's tokens matched this category.
    pub matched_tokens: usize,
}

/// Score every category of the account against a description, ordered by
/// score descending. Categories with no matching token are absent.
pub async fn score_description(
    keywords: &dyn KeywordRepository,
    account_id: Uuid,
    description: &str,
) -> Result<Vec<CategoryScore>> {
    let mut by_category: std::collections::HashMap<Uuid, CategoryScore> =
        std::collections::HashMap::new();

    for token in extract(description) {
        for hit in keywords.lookup(account_id, &token).await? {
            let entry = by_category
                .entry(hit.category_id)
                .or_insert_with(|| CategoryScore {
                    category_id: hit.category_id,
                    score: 0.0,
                    matched_tokens: 0,
                });
            entry.score += hit.normalized_weight;
            entry.matched_tokens += 1;
        }
    }

    let mut scores: Vec<CategoryScore> = by_category.into_values().collect();
    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(scores)
}
