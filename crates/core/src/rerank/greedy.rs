//! Greedy forward selection of the calibrated top-k list.

use crate::distribution::AttributeDistribution;
use crate::errors::CalibrationError;

use super::candidates::ScoredCandidate;
use super::scoring::UtilityScorer;

#[derive(Clone, Copy, Debug)]
pub struct GreedyCalibrator {
    top_k: usize,
    scorer: UtilityScorer,
}

impl GreedyCalibrator {
    pub fn new(top_k: usize, scorer: UtilityScorer) -> Result<Self, CalibrationError> {
        if top_k == 0 {
            return Err(CalibrationError::InvalidParameter(
                "top_k must be at least 1".to_string(),
            ));
        }
        Ok(Self { top_k, scorer })
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Builds an ordered list of up to `top_k` candidates. Each round scores
    /// every remaining candidate appended to the current selection and keeps
    /// the strict maximum, so the first-seen candidate wins ties.
    ///
    /// The utility is not submodular: the divergence term can reward or
    /// penalize an addition depending on everything already selected, so
    /// every round re-scores the full remaining pool. No lazy-greedy
    /// shortcut is valid here.
    ///
    /// Running out of candidates before `top_k` rounds is normal; the
    /// partial list is returned as-is.
    pub fn rerank<'a>(
        &self,
        pool: &[ScoredCandidate<'a>],
        reference: &AttributeDistribution,
    ) -> Result<Vec<ScoredCandidate<'a>>, CalibrationError> {
        let mut selected: Vec<ScoredCandidate<'a>> =
            Vec::with_capacity(self.top_k.min(pool.len()));
        let mut taken = vec![false; pool.len()];

        for _ in 0..self.top_k {
            let mut best: Option<(usize, f64)> = None;

            for (index, candidate) in pool.iter().enumerate() {
                if taken[index] {
                    continue;
                }

                selected.push(*candidate);
                let utility = self.scorer.utility(&selected, reference);
                selected.pop();
                let utility = utility?;

                let improves = match best {
                    Some((_, best_utility)) => utility > best_utility,
                    None => true,
                };
                if improves {
                    best = Some((index, utility));
                }
            }

            match best {
                Some((index, _)) => {
                    taken[index] = true;
                    selected.push(pool[index]);
                }
                None => break,
            }
        }

        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::collections::HashSet;

    use super::{GreedyCalibrator, ScoredCandidate, UtilityScorer};
    use crate::catalog::{Item, ItemId};
    use crate::distribution::AttributeDistribution;

    fn item(id: &str, attributes: &str) -> Item {
        Item::new(ItemId::from(id), id, attributes, '|')
    }

    fn reference(pairs: &[(&str, f64)]) -> AttributeDistribution {
        let weights: BTreeMap<String, f64> =
            pairs.iter().map(|(attribute, weight)| (attribute.to_string(), *weight)).collect();
        AttributeDistribution::from_weights(weights)
    }

    fn calibrator(top_k: usize, tradeoff: f64) -> GreedyCalibrator {
        GreedyCalibrator::new(top_k, UtilityScorer::new(tradeoff).unwrap()).unwrap()
    }

    #[test]
    fn output_is_bounded_and_free_of_duplicates() {
        let items = [item("1", "x"), item("2", "y"), item("3", "x|y")];
        let pool: Vec<ScoredCandidate<'_>> = items
            .iter()
            .enumerate()
            .map(|(index, item)| ScoredCandidate { item, score: 1.0 - index as f64 * 0.1 })
            .collect();

        let selection = calibrator(2, 0.5).rerank(&pool, &reference(&[("x", 1.0)])).unwrap();

        assert!(selection.len() <= 2);
        let distinct: HashSet<&ItemId> =
            selection.iter().map(|candidate| &candidate.item.id).collect();
        assert_eq!(distinct.len(), selection.len());
    }

    #[test]
    fn zero_tradeoff_selects_by_descending_score() {
        let items = [item("1", "y"), item("2", "x"), item("3", "y")];
        let pool = [
            ScoredCandidate { item: &items[0], score: 0.4 },
            ScoredCandidate { item: &items[1], score: 0.9 },
            ScoredCandidate { item: &items[2], score: 0.6 },
        ];

        let selection = calibrator(3, 0.0).rerank(&pool, &reference(&[("x", 1.0)])).unwrap();

        let order: Vec<&str> =
            selection.iter().map(|candidate| candidate.item.id.0.as_str()).collect();
        assert_eq!(order, vec!["2", "3", "1"]);
    }

    #[test]
    fn full_tradeoff_selects_by_divergence_regardless_of_score() {
        let items = [item("1", "y"), item("2", "x")];
        let pool = [
            ScoredCandidate { item: &items[0], score: 100.0 },
            ScoredCandidate { item: &items[1], score: 0.001 },
        ];

        let selection = calibrator(1, 1.0).rerank(&pool, &reference(&[("x", 1.0)])).unwrap();

        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].item.id, ItemId::from("2"));
    }

    #[test]
    fn partial_overlap_plus_higher_score_beats_no_overlap() {
        // History is all-x; B covers x partially with a higher score than
        // the x-free C, so the calibrated top-1 list is [B].
        let b = item("B", "x|y");
        let c = item("C", "y");
        let pool =
            [ScoredCandidate { item: &b, score: 0.9 }, ScoredCandidate { item: &c, score: 0.5 }];

        let selection = calibrator(1, 0.5).rerank(&pool, &reference(&[("x", 1.0)])).unwrap();

        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].item.id, ItemId::from("B"));
    }

    #[test]
    fn exhausted_pool_returns_partial_list_without_error() {
        let only = item("1", "x");
        let pool = [ScoredCandidate { item: &only, score: 0.5 }];

        let selection = calibrator(5, 0.5).rerank(&pool, &reference(&[("x", 1.0)])).unwrap();
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn empty_pool_returns_empty_list_without_error() {
        let selection = calibrator(3, 0.5).rerank(&[], &reference(&[("x", 1.0)])).unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn ties_keep_the_first_candidate_in_pool_order() {
        let items = [item("1", "x"), item("2", "x")];
        let pool = [
            ScoredCandidate { item: &items[0], score: 0.5 },
            ScoredCandidate { item: &items[1], score: 0.5 },
        ];

        let selection = calibrator(1, 0.5).rerank(&pool, &reference(&[("x", 1.0)])).unwrap();
        assert_eq!(selection[0].item.id, ItemId::from("1"));
    }

    #[test]
    fn zero_top_k_is_rejected_at_construction() {
        assert!(GreedyCalibrator::new(0, UtilityScorer::new(0.5).unwrap()).is_err());
    }
}
