use anyhow::Result;
use serde::Serialize;

use recal_core::config::AppConfig;
use recal_core::{Catalog, Dataset, DEFAULT_ATTRIBUTE_DELIMITER};

use crate::commands::CommandResult;
use crate::loader;

#[derive(Debug, Serialize)]
struct InspectSummary {
    items: usize,
    attributes: usize,
    users: usize,
    interactions: usize,
    recommendations: usize,
}

/// Loads the configured inputs and reports dataset shape without reranking.
pub fn run(config: &AppConfig, json: bool) -> CommandResult {
    let summary = match summarize(config) {
        Ok(summary) => summary,
        Err(error) => return CommandResult::failure(format!("{error:#}"), 3),
    };

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(output) => CommandResult::success(output),
            Err(error) => CommandResult::failure(error.to_string(), 1),
        }
    } else {
        CommandResult::success(format!(
            "catalog: {} items, {} attributes\nusers: {}\ninteractions: {}\nrecommendations: {}",
            summary.items,
            summary.attributes,
            summary.users,
            summary.interactions,
            summary.recommendations,
        ))
    }
}

fn summarize(config: &AppConfig) -> Result<InspectSummary> {
    let format = config.inputs.format;

    let catalog_records = loader::load_catalog_records(&config.inputs.catalog, format)?;
    let catalog = Catalog::from_records(&catalog_records, DEFAULT_ATTRIBUTE_DELIMITER);

    let interactions = loader::load_interaction_records(&config.inputs.interactions, format)?;
    let recommendations =
        loader::load_recommendation_records(&config.inputs.recommendations, format)?;
    let dataset = Dataset::new(interactions, recommendations);

    let attributes: std::collections::BTreeSet<&str> = catalog
        .items()
        .flat_map(|item| item.attribute_weights().keys())
        .map(String::as_str)
        .collect();

    Ok(InspectSummary {
        items: catalog.len(),
        attributes: attributes.len(),
        users: dataset.users().len(),
        interactions: dataset.interaction_count(),
        recommendations: dataset.recommendation_count(),
    })
}
