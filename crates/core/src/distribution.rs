//! Normalized attribute distributions and the miscalibration metric.

use std::collections::BTreeMap;

use crate::catalog::Item;
use crate::errors::CalibrationError;

/// Default smoothing factor for [`divergence`]. Keeps the metric finite
/// when the candidate distribution fully omits a reference attribute.
pub const DEFAULT_SMOOTHING: f64 = 0.01;

/// Accumulated weights are normalized by item count and rounded to ten
/// decimal digits, matching the precision the result tables are reported at.
fn round_weight(value: f64) -> f64 {
    (value * 1e10).round() / 1e10
}

/// Label -> weight mapping produced from a set of items. Weights are
/// non-negative and sum to 1.0 (within floating rounding) for any non-empty
/// input. A label absent from the map reads as weight zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeDistribution {
    weights: BTreeMap<String, f64>,
}

impl AttributeDistribution {
    /// Accumulates the per-item attribute weights and normalizes by the
    /// item count (not the attribute count).
    pub fn from_items<'a, I>(items: I) -> Result<Self, CalibrationError>
    where
        I: IntoIterator<Item = &'a Item>,
    {
        let mut accumulated: BTreeMap<String, f64> = BTreeMap::new();
        let mut count = 0usize;

        for item in items {
            count += 1;
            for (attribute, weight) in item.attribute_weights() {
                *accumulated.entry(attribute.clone()).or_insert(0.0) += weight;
            }
        }

        if count == 0 {
            return Err(CalibrationError::EmptyItemSet);
        }

        let weights = accumulated
            .into_iter()
            .map(|(attribute, total)| (attribute, round_weight(total / count as f64)))
            .collect();
        Ok(Self { weights })
    }

    pub fn from_weights(weights: BTreeMap<String, f64>) -> Self {
        Self { weights }
    }

    pub fn weight(&self, attribute: &str) -> f64 {
        self.weights.get(attribute).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(attribute, weight)| (attribute.as_str(), *weight))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }
}

/// Smoothed asymmetric KL divergence of `candidate` from `reference`.
///
/// For each reference attribute with weight `p`, the candidate weight `q`
/// is smoothed to `(1 - smoothing) * q + smoothing * p` before accumulating
/// `p * log2(p / q')`. Attributes present only in the candidate contribute
/// nothing: the metric measures how well the candidate covers the
/// reference, not the reverse. That asymmetry is deliberate and must stay.
pub fn divergence(
    reference: &AttributeDistribution,
    candidate: &AttributeDistribution,
    smoothing: f64,
) -> Result<f64, CalibrationError> {
    let mut total = 0.0;
    for (attribute, p) in reference.iter() {
        if !p.is_finite() || p <= 0.0 {
            return Err(CalibrationError::InvalidDistribution {
                attribute: attribute.to_string(),
                weight: p,
            });
        }

        let q = candidate.weight(attribute);
        let smoothed = (1.0 - smoothing) * q + smoothing * p;
        total += p * (p / smoothed).log2();
    }
    Ok(total)
}
