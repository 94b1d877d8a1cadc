//! Greedy calibrated re-ranking of a per-user candidate pool.

mod candidates;
mod greedy;
mod scoring;

pub use candidates::{assemble_candidates, ScoredCandidate};
pub use greedy::GreedyCalibrator;
pub use scoring::UtilityScorer;

pub use crate::distribution::DEFAULT_SMOOTHING;

/// Default relevance/calibration trade-off. 0 ranks purely by relevance
/// score, 1 purely by calibration.
pub const DEFAULT_TRADEOFF: f64 = 0.5;
