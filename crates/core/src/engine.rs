//! End-to-end orchestration: screen every user, then calibrate the worst
//! decile.

use std::collections::BTreeMap;

use crate::catalog::{Catalog, ItemId};
use crate::config::EngineConfig;
use crate::dataset::{Dataset, UserId};
use crate::distribution::AttributeDistribution;
use crate::errors::CalibrationError;
use crate::rerank::{assemble_candidates, GreedyCalibrator, UtilityScorer};
use crate::selection::{select_worst_case, UserDivergence};

/// Everything one batch run produces. Distribution maps cover all usable
/// users; `calibrated`/`calibrated_items` cover only worst-case users whose
/// calibration succeeded.
#[derive(Debug, Default)]
pub struct CalibrationRun {
    pub historical: BTreeMap<UserId, AttributeDistribution>,
    pub recommended: BTreeMap<UserId, AttributeDistribution>,
    pub calibrated: BTreeMap<UserId, AttributeDistribution>,
    pub calibrated_items: BTreeMap<UserId, Vec<ItemId>>,
    pub ranked: Vec<UserDivergence>,
    pub worst_case: Vec<UserId>,
    pub skipped: Vec<(UserId, CalibrationError)>,
}

/// Per-user processing is sequential and pure: the only state shared across
/// users is the read-only catalog, so a failing user cannot corrupt anyone
/// else's results.
pub struct CalibrationEngine<'a> {
    catalog: &'a Catalog,
    calibrator: GreedyCalibrator,
    smoothing: f64,
    top_k: usize,
    filter_seen: bool,
}

impl<'a> CalibrationEngine<'a> {
    pub fn new(catalog: &'a Catalog, config: &EngineConfig) -> Result<Self, CalibrationError> {
        let scorer = UtilityScorer::with_smoothing(config.tradeoff, config.smoothing)?;
        let calibrator = GreedyCalibrator::new(config.top_k, scorer)?;

        Ok(Self {
            catalog,
            calibrator,
            smoothing: config.smoothing,
            top_k: config.top_k,
            filter_seen: config.filter_seen,
        })
    }

    pub fn run(&self, dataset: &Dataset) -> Result<CalibrationRun, CalibrationError> {
        let pre = select_worst_case(dataset, self.catalog, self.top_k, self.smoothing)?;

        let mut calibrated = BTreeMap::new();
        let mut calibrated_items = BTreeMap::new();
        let mut skipped = pre.skipped;

        for user_id in &pre.worst_case {
            let Some(reference) = pre.historical.get(user_id) else {
                continue;
            };

            match self.calibrate_user(dataset, user_id, reference) {
                Ok((distribution, items)) => {
                    calibrated.insert(user_id.clone(), distribution);
                    calibrated_items.insert(user_id.clone(), items);
                }
                Err(error) => skipped.push((user_id.clone(), error)),
            }
        }

        Ok(CalibrationRun {
            historical: pre.historical,
            recommended: pre.recommended,
            calibrated,
            calibrated_items,
            ranked: pre.ranked,
            worst_case: pre.worst_case,
            skipped,
        })
    }

    fn calibrate_user(
        &self,
        dataset: &Dataset,
        user_id: &UserId,
        reference: &AttributeDistribution,
    ) -> Result<(AttributeDistribution, Vec<ItemId>), CalibrationError> {
        let pool = assemble_candidates(
            dataset.recommendations_for(user_id),
            dataset.interactions_for(user_id),
            self.catalog,
            self.filter_seen,
        )?;

        let selection = self.calibrator.rerank(&pool, reference)?;
        if selection.is_empty() {
            // Exhausted pool: an empty list with an empty distribution, not
            // an EmptyItemSet error.
            return Ok((AttributeDistribution::default(), Vec::new()));
        }

        let distribution =
            AttributeDistribution::from_items(selection.iter().map(|candidate| candidate.item))?;
        let items = selection.iter().map(|candidate| candidate.item.id.clone()).collect();
        Ok((distribution, items))
    }
}
