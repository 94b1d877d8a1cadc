//! Summary tables over the calibrated worst-case users.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::dataset::UserId;
use crate::distribution::AttributeDistribution;
use crate::engine::CalibrationRun;

/// Attribute-level averages across every worst-case user that produced a
/// calibrated list. Deltas are accumulated separately by sign so that
/// over- and under-exposure do not cancel out in the mean.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AverageTable {
    pub historical: BTreeMap<String, f64>,
    pub recommended: BTreeMap<String, f64>,
    pub calibrated: BTreeMap<String, f64>,
    pub negative_pre_delta: BTreeMap<String, f64>,
    pub positive_pre_delta: BTreeMap<String, f64>,
    pub negative_post_delta: BTreeMap<String, f64>,
    pub positive_post_delta: BTreeMap<String, f64>,
}

/// One worst-case user's distributions side by side, zero weights filtered.
/// Always the first user in worst-case rank order, so reports are
/// reproducible run to run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SingleTable {
    pub user_id: UserId,
    pub historical: BTreeMap<String, f64>,
    pub recommended: BTreeMap<String, f64>,
    pub calibrated: BTreeMap<String, f64>,
    pub pre_delta: BTreeMap<String, f64>,
    pub post_delta: BTreeMap<String, f64>,
    pub recom_delta: BTreeMap<String, f64>,
}

pub fn average_table(run: &CalibrationRun) -> AverageTable {
    let users: Vec<&UserId> =
        run.worst_case.iter().filter(|user| run.calibrated.contains_key(*user)).collect();

    let mut table = AverageTable::default();
    if users.is_empty() {
        return table;
    }

    for user_id in &users {
        let historical = &run.historical[*user_id];
        let recommended = &run.recommended[*user_id];
        let calibrated = &run.calibrated[*user_id];

        accumulate(&mut table.historical, historical);
        accumulate(&mut table.recommended, recommended);
        accumulate(&mut table.calibrated, calibrated);

        accumulate_signed_deltas(
            &mut table.negative_pre_delta,
            &mut table.positive_pre_delta,
            historical,
            recommended,
        );
        accumulate_signed_deltas(
            &mut table.negative_post_delta,
            &mut table.positive_post_delta,
            historical,
            calibrated,
        );
    }

    let count = users.len() as f64;
    for map in [
        &mut table.historical,
        &mut table.recommended,
        &mut table.calibrated,
        &mut table.negative_pre_delta,
        &mut table.positive_pre_delta,
        &mut table.negative_post_delta,
        &mut table.positive_post_delta,
    ] {
        for value in map.values_mut() {
            *value /= count;
        }
    }

    table
}

pub fn single_table(run: &CalibrationRun) -> Option<SingleTable> {
    let user_id =
        run.worst_case.iter().find(|user| run.calibrated.contains_key(*user))?.clone();

    let historical = non_zero_weights(&run.historical[&user_id]);
    let recommended = non_zero_weights(&run.recommended[&user_id]);
    let calibrated = non_zero_weights(&run.calibrated[&user_id]);

    let pre_delta = deltas(&historical, &recommended);
    let post_delta = deltas(&historical, &calibrated);
    let recom_delta = deltas(&recommended, &calibrated);

    Some(SingleTable {
        user_id,
        historical,
        recommended,
        calibrated,
        pre_delta,
        post_delta,
        recom_delta,
    })
}

fn accumulate(target: &mut BTreeMap<String, f64>, distribution: &AttributeDistribution) {
    for (attribute, weight) in distribution.iter() {
        *target.entry(attribute.to_string()).or_insert(0.0) += weight;
    }
}

fn accumulate_signed_deltas(
    negative: &mut BTreeMap<String, f64>,
    positive: &mut BTreeMap<String, f64>,
    reference: &AttributeDistribution,
    other: &AttributeDistribution,
) {
    let attributes: BTreeSet<&str> =
        reference.iter().map(|(attribute, _)| attribute).chain(
            other.iter().map(|(attribute, _)| attribute),
        )
        .collect();

    for attribute in attributes {
        let delta = other.weight(attribute) - reference.weight(attribute);
        let bucket = if delta < 0.0 { &mut *negative } else { &mut *positive };
        *bucket.entry(attribute.to_string()).or_insert(0.0) += delta;
    }
}

fn non_zero_weights(distribution: &AttributeDistribution) -> BTreeMap<String, f64> {
    distribution
        .iter()
        .filter(|(_, weight)| *weight != 0.0)
        .map(|(attribute, weight)| (attribute.to_string(), weight))
        .collect()
}

fn deltas(
    reference: &BTreeMap<String, f64>,
    other: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    let attributes: BTreeSet<&String> = reference.keys().chain(other.keys()).collect();
    attributes
        .into_iter()
        .map(|attribute| {
            let delta = other.get(attribute).copied().unwrap_or(0.0)
                - reference.get(attribute).copied().unwrap_or(0.0);
            (attribute.clone(), delta)
        })
        .collect()
}
