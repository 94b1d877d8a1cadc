use std::collections::HashSet;

use crate::catalog::{Catalog, Item, ItemId};
use crate::dataset::{InteractionRecord, RecommendationRecord};
use crate::errors::CalibrationError;

/// An immutable catalog item paired with the relevance score the external
/// recommender assigned it for one user. Catalog entries are never mutated,
/// so pools for different users can coexist over the same catalog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub item: &'a Item,
    pub score: f64,
}

/// Builds one user's candidate pool from their raw recommendation rows.
///
/// Pool order is the recommendation row order (descending score upstream);
/// the first occurrence wins when an item is listed twice. With
/// `filter_seen`, items already present in the user's interaction history
/// are excluded.
pub fn assemble_candidates<'a>(
    recommendations: &[RecommendationRecord],
    interactions: &[InteractionRecord],
    catalog: &'a Catalog,
    filter_seen: bool,
) -> Result<Vec<ScoredCandidate<'a>>, CalibrationError> {
    let seen: HashSet<&ItemId> = if filter_seen {
        interactions.iter().map(|record| &record.item_id).collect()
    } else {
        HashSet::new()
    };

    let mut picked: HashSet<&ItemId> = HashSet::with_capacity(recommendations.len());
    let mut pool = Vec::with_capacity(recommendations.len());

    for record in recommendations {
        if seen.contains(&record.item_id) || !picked.insert(&record.item_id) {
            continue;
        }
        if !record.score.is_finite() {
            return Err(CalibrationError::MissingScore { item_id: record.item_id.clone() });
        }

        let item = catalog.require(&record.item_id)?;
        pool.push(ScoredCandidate { item, score: record.score });
    }

    Ok(pool)
}
