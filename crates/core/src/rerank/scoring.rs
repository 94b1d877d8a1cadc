//! The scalar objective balancing relevance and calibration.

use crate::distribution::{divergence, AttributeDistribution, DEFAULT_SMOOTHING};
use crate::errors::CalibrationError;

use super::candidates::ScoredCandidate;
use super::DEFAULT_TRADEOFF;

/// Scores a candidate list as
/// `(1 - tradeoff) * Σ relevance - tradeoff * divergence(reference, list)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UtilityScorer {
    tradeoff: f64,
    smoothing: f64,
}

impl UtilityScorer {
    pub fn new(tradeoff: f64) -> Result<Self, CalibrationError> {
        Self::with_smoothing(tradeoff, DEFAULT_SMOOTHING)
    }

    pub fn with_smoothing(tradeoff: f64, smoothing: f64) -> Result<Self, CalibrationError> {
        if !tradeoff.is_finite() || !(0.0..=1.0).contains(&tradeoff) {
            return Err(CalibrationError::InvalidParameter(format!(
                "tradeoff must be in [0, 1], got {tradeoff}"
            )));
        }
        if !smoothing.is_finite() || smoothing <= 0.0 || smoothing >= 1.0 {
            return Err(CalibrationError::InvalidParameter(format!(
                "smoothing must be in (0, 1), got {smoothing}"
            )));
        }
        Ok(Self { tradeoff, smoothing })
    }

    pub fn tradeoff(&self) -> f64 {
        self.tradeoff
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    pub fn utility(
        &self,
        selection: &[ScoredCandidate<'_>],
        reference: &AttributeDistribution,
    ) -> Result<f64, CalibrationError> {
        if let Some(unscored) =
            selection.iter().find(|candidate| !candidate.score.is_finite())
        {
            return Err(CalibrationError::MissingScore { item_id: unscored.item.id.clone() });
        }

        let selection_distribution =
            AttributeDistribution::from_items(selection.iter().map(|candidate| candidate.item))?;
        let miscalibration = divergence(reference, &selection_distribution, self.smoothing)?;
        let total_score: f64 = selection.iter().map(|candidate| candidate.score).sum();

        Ok((1.0 - self.tradeoff) * total_score - self.tradeoff * miscalibration)
    }
}

impl Default for UtilityScorer {
    fn default() -> Self {
        Self { tradeoff: DEFAULT_TRADEOFF, smoothing: DEFAULT_SMOOTHING }
    }
}
