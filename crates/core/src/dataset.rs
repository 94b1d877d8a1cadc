//! Typed rows for the three tabular inputs and per-user grouping.
//!
//! Rows are headerless in the source files; field order here matches the
//! column order (`item,title,attributes`, `user,item,rating,timestamp`,
//! `user,item,score`) so the CLI can deserialize them positionally.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::ItemId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub item_id: ItemId,
    pub title: String,
    pub attributes: String,
}

/// One historical interaction. Only `user_id`/`item_id` feed the engine;
/// rating and timestamp pass through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub rating: f64,
    pub timestamp: i64,
}

/// One row of the externally produced recommendation list, pre-sorted by
/// descending score within each user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub score: f64,
}

/// Interaction and recommendation rows grouped per user, preserving input
/// order within each group. The user list follows first appearance in the
/// recommendation rows: users without recommendations have nothing to
/// calibrate.
#[derive(Debug, Default)]
pub struct Dataset {
    users: Vec<UserId>,
    interactions: HashMap<UserId, Vec<InteractionRecord>>,
    recommendations: HashMap<UserId, Vec<RecommendationRecord>>,
}

impl Dataset {
    pub fn new(
        interactions: Vec<InteractionRecord>,
        recommendations: Vec<RecommendationRecord>,
    ) -> Self {
        let mut grouped_interactions: HashMap<UserId, Vec<InteractionRecord>> = HashMap::new();
        for record in interactions {
            grouped_interactions.entry(record.user_id.clone()).or_default().push(record);
        }

        let mut users = Vec::new();
        let mut grouped_recommendations: HashMap<UserId, Vec<RecommendationRecord>> =
            HashMap::new();
        for record in recommendations {
            let per_user = grouped_recommendations.entry(record.user_id.clone()).or_default();
            if per_user.is_empty() {
                users.push(record.user_id.clone());
            }
            per_user.push(record);
        }

        Self { users, interactions: grouped_interactions, recommendations: grouped_recommendations }
    }

    /// Users in first-seen recommendation order.
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn interactions_for(&self, user_id: &UserId) -> &[InteractionRecord] {
        self.interactions.get(user_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn recommendations_for(&self, user_id: &UserId) -> &[RecommendationRecord] {
        self.recommendations.get(user_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.values().map(Vec::len).sum()
    }

    pub fn recommendation_count(&self) -> usize {
        self.recommendations.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{Dataset, InteractionRecord, RecommendationRecord, UserId};
    use crate::catalog::ItemId;

    fn interaction(user: &str, item: &str) -> InteractionRecord {
        InteractionRecord {
            user_id: UserId::from(user),
            item_id: ItemId::from(item),
            rating: 4.0,
            timestamp: 964_982_703,
        }
    }

    fn recommendation(user: &str, item: &str, score: f64) -> RecommendationRecord {
        RecommendationRecord { user_id: UserId::from(user), item_id: ItemId::from(item), score }
    }

    #[test]
    fn users_follow_first_seen_recommendation_order() {
        let dataset = Dataset::new(
            vec![interaction("b", "1")],
            vec![
                recommendation("b", "1", 0.9),
                recommendation("a", "2", 0.8),
                recommendation("b", "3", 0.7),
            ],
        );

        assert_eq!(dataset.users(), &[UserId::from("b"), UserId::from("a")]);
    }

    #[test]
    fn grouping_preserves_row_order_within_user() {
        let dataset = Dataset::new(
            Vec::new(),
            vec![
                recommendation("u", "5", 0.9),
                recommendation("u", "7", 0.8),
                recommendation("u", "2", 0.7),
            ],
        );

        let items: Vec<&str> = dataset
            .recommendations_for(&UserId::from("u"))
            .iter()
            .map(|record| record.item_id.0.as_str())
            .collect();
        assert_eq!(items, vec!["5", "7", "2"]);
    }

    #[test]
    fn unknown_user_yields_empty_slices() {
        let dataset = Dataset::new(Vec::new(), Vec::new());

        assert!(dataset.interactions_for(&UserId::from("missing")).is_empty());
        assert!(dataset.recommendations_for(&UserId::from("missing")).is_empty());
    }

    #[test]
    fn counts_cover_all_grouped_rows() {
        let dataset = Dataset::new(
            vec![interaction("a", "1"), interaction("b", "2")],
            vec![recommendation("a", "3", 0.5)],
        );

        assert_eq!(dataset.interaction_count(), 2);
        assert_eq!(dataset.recommendation_count(), 1);
    }
}
