//! Pre-calibration screening: which users are worth re-ranking at all.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::dataset::{Dataset, UserId};
use crate::distribution::{divergence, AttributeDistribution};
use crate::errors::CalibrationError;

/// One user's pre-calibration miscalibration score.
#[derive(Clone, Debug, PartialEq)]
pub struct UserDivergence {
    pub user_id: UserId,
    pub divergence: f64,
}

/// Output of the screening pass over every user.
#[derive(Debug, Default)]
pub struct PreCalibration {
    /// Historical-interaction distribution per usable user.
    pub historical: BTreeMap<UserId, AttributeDistribution>,
    /// Raw top-k recommendation distribution per usable user.
    pub recommended: BTreeMap<UserId, AttributeDistribution>,
    /// All usable users ranked by descending divergence.
    pub ranked: Vec<UserDivergence>,
    /// The worst decile, in rank order. Calibration runs only for these.
    pub worst_case: Vec<UserId>,
    /// Users whose rows could not produce both distributions, with the
    /// error that disqualified them. They never abort the batch.
    pub skipped: Vec<(UserId, CalibrationError)>,
}

struct EvaluatedUser {
    historical: AttributeDistribution,
    recommended: AttributeDistribution,
    divergence: f64,
}

/// Computes every user's divergence between their historical distribution
/// (reference) and their raw top-`top_k` recommendation distribution, then
/// selects the worst `floor(usable_users / 10)` for calibration. With fewer
/// than ten usable users the selection is empty, which is accepted.
pub fn select_worst_case(
    dataset: &Dataset,
    catalog: &Catalog,
    top_k: usize,
    smoothing: f64,
) -> Result<PreCalibration, CalibrationError> {
    if top_k == 0 {
        return Err(CalibrationError::InvalidParameter("top_k must be at least 1".to_string()));
    }

    let mut pre = PreCalibration::default();

    for user_id in dataset.users() {
        match evaluate_user(dataset, catalog, user_id, top_k, smoothing) {
            Ok(evaluated) => {
                pre.historical.insert(user_id.clone(), evaluated.historical);
                pre.recommended.insert(user_id.clone(), evaluated.recommended);
                pre.ranked.push(UserDivergence {
                    user_id: user_id.clone(),
                    divergence: evaluated.divergence,
                });
            }
            Err(error) => pre.skipped.push((user_id.clone(), error)),
        }
    }

    // Stable sort: equal divergences keep first-seen user order.
    pre.ranked.sort_by(|a, b| {
        b.divergence.partial_cmp(&a.divergence).unwrap_or(Ordering::Equal)
    });

    let worst_count = pre.ranked.len() / 10;
    pre.worst_case =
        pre.ranked.iter().take(worst_count).map(|entry| entry.user_id.clone()).collect();

    Ok(pre)
}

fn evaluate_user(
    dataset: &Dataset,
    catalog: &Catalog,
    user_id: &UserId,
    top_k: usize,
    smoothing: f64,
) -> Result<EvaluatedUser, CalibrationError> {
    let interactions = dataset.interactions_for(user_id);
    let mut historical_items = Vec::with_capacity(interactions.len());
    for record in interactions {
        historical_items.push(catalog.require(&record.item_id)?);
    }
    let historical = AttributeDistribution::from_items(historical_items)?;

    let recommendations = dataset.recommendations_for(user_id);
    let mut recommended_items = Vec::with_capacity(top_k.min(recommendations.len()));
    for record in recommendations.iter().take(top_k) {
        recommended_items.push(catalog.require(&record.item_id)?);
    }
    let recommended = AttributeDistribution::from_items(recommended_items)?;

    let score = divergence(&historical, &recommended, smoothing)?;
    Ok(EvaluatedUser { historical, recommended, divergence: score })
}

#[cfg(test)]
mod tests {
    use super::select_worst_case;
    use crate::catalog::{Catalog, ItemId, DEFAULT_ATTRIBUTE_DELIMITER};
    use crate::dataset::{
        CatalogRecord, Dataset, InteractionRecord, RecommendationRecord, UserId,
    };
    use crate::distribution::DEFAULT_SMOOTHING;
    use crate::errors::CalibrationError;

    fn catalog() -> Catalog {
        let records = vec![
            CatalogRecord {
                item_id: ItemId::from("x-item"),
                title: "X".to_string(),
                attributes: "x".to_string(),
            },
            CatalogRecord {
                item_id: ItemId::from("y-item"),
                title: "Y".to_string(),
                attributes: "y".to_string(),
            },
        ];
        Catalog::from_records(&records, DEFAULT_ATTRIBUTE_DELIMITER)
    }

    fn interaction(user: &str, item: &str) -> InteractionRecord {
        InteractionRecord {
            user_id: UserId::from(user),
            item_id: ItemId::from(item),
            rating: 4.0,
            timestamp: 0,
        }
    }

    fn recommendation(user: &str, item: &str, score: f64) -> RecommendationRecord {
        RecommendationRecord { user_id: UserId::from(user), item_id: ItemId::from(item), score }
    }

    /// Twenty users interacting with `x`; two of them are recommended pure
    /// `y` lists and everyone else stays on `x`.
    fn twenty_user_dataset() -> Dataset {
        let mut interactions = Vec::new();
        let mut recommendations = Vec::new();

        for index in 1..=20 {
            let user = format!("u{index:02}");
            interactions.push(interaction(&user, "x-item"));
            let recommended = if index >= 19 { "y-item" } else { "x-item" };
            recommendations.push(recommendation(&user, recommended, 0.9));
        }

        Dataset::new(interactions, recommendations)
    }

    #[test]
    fn worst_decile_of_twenty_users_is_exactly_two() {
        let catalog = catalog();
        let dataset = twenty_user_dataset();

        let pre = select_worst_case(&dataset, &catalog, 10, DEFAULT_SMOOTHING).unwrap();

        assert_eq!(pre.ranked.len(), 20);
        assert_eq!(pre.worst_case, vec![UserId::from("u19"), UserId::from("u20")]);
        assert!(pre.skipped.is_empty());
    }

    #[test]
    fn ranking_is_descending_by_divergence() {
        let catalog = catalog();
        let dataset = twenty_user_dataset();

        let pre = select_worst_case(&dataset, &catalog, 10, DEFAULT_SMOOTHING).unwrap();

        for window in pre.ranked.windows(2) {
            assert!(window[0].divergence >= window[1].divergence);
        }
        assert!(pre.ranked[0].divergence > pre.ranked[19].divergence);
    }

    #[test]
    fn fewer_than_ten_users_selects_nobody() {
        let catalog = catalog();
        let dataset = Dataset::new(
            vec![interaction("a", "x-item")],
            vec![recommendation("a", "y-item", 0.9)],
        );

        let pre = select_worst_case(&dataset, &catalog, 5, DEFAULT_SMOOTHING).unwrap();

        assert_eq!(pre.ranked.len(), 1);
        assert!(pre.worst_case.is_empty());
    }

    #[test]
    fn users_without_usable_rows_are_skipped_not_fatal() {
        let catalog = catalog();
        // `b` has recommendations but no interaction history.
        let dataset = Dataset::new(
            vec![interaction("a", "x-item")],
            vec![recommendation("a", "x-item", 0.9), recommendation("b", "y-item", 0.8)],
        );

        let pre = select_worst_case(&dataset, &catalog, 5, DEFAULT_SMOOTHING).unwrap();

        assert_eq!(pre.ranked.len(), 1);
        assert_eq!(pre.skipped.len(), 1);
        assert_eq!(pre.skipped[0].0, UserId::from("b"));
        assert_eq!(pre.skipped[0].1, CalibrationError::EmptyItemSet);
    }

    #[test]
    fn recommendation_distribution_is_truncated_to_top_k() {
        let catalog = catalog();
        let dataset = Dataset::new(
            vec![interaction("a", "x-item")],
            vec![recommendation("a", "x-item", 0.9), recommendation("a", "y-item", 0.1)],
        );

        let pre = select_worst_case(&dataset, &catalog, 1, DEFAULT_SMOOTHING).unwrap();

        let recommended = &pre.recommended[&UserId::from("a")];
        assert_eq!(recommended.weight("x"), 1.0);
        assert_eq!(recommended.weight("y"), 0.0);
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let catalog = catalog();
        let dataset = Dataset::new(Vec::new(), Vec::new());

        assert!(select_worst_case(&dataset, &catalog, 0, DEFAULT_SMOOTHING).is_err());
    }
}
