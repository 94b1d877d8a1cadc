use thiserror::Error;

use crate::catalog::ItemId;

/// Contract violations detected at the boundary of an engine operation.
///
/// None of these are recoverable by the engine itself; they signal upstream
/// data inconsistency and propagate to the caller. A per-user failure must
/// not abort the batch: the engine records it and continues with the next
/// user.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CalibrationError {
    #[error("cannot compute an attribute distribution over zero items")]
    EmptyItemSet,
    #[error("reference distribution carries degenerate weight {weight} for attribute `{attribute}`")]
    InvalidDistribution { attribute: String, weight: f64 },
    #[error("candidate item `{item_id}` has no usable relevance score")]
    MissingScore { item_id: ItemId },
    #[error("record references item `{item_id}` that is absent from the catalog")]
    UnknownItem { item_id: ItemId },
    #[error("invalid engine parameter: {0}")]
    InvalidParameter(String),
}
