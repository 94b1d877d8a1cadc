pub mod catalog;
pub mod config;
pub mod dataset;
pub mod distribution;
pub mod engine;
pub mod errors;
pub mod report;
pub mod rerank;
pub mod selection;

pub use catalog::{Catalog, Item, ItemId, DEFAULT_ATTRIBUTE_DELIMITER};
pub use dataset::{
    CatalogRecord, Dataset, InteractionRecord, RecommendationRecord, UserId,
};
pub use distribution::{divergence, AttributeDistribution, DEFAULT_SMOOTHING};
pub use engine::{CalibrationEngine, CalibrationRun};
pub use errors::CalibrationError;
pub use report::{average_table, single_table, AverageTable, SingleTable};
pub use rerank::{
    assemble_candidates, GreedyCalibrator, ScoredCandidate, UtilityScorer, DEFAULT_TRADEOFF,
};
pub use selection::{select_worst_case, PreCalibration, UserDivergence};
