use anyhow::Result;

use recal_core::config::AppConfig;
use recal_core::{Catalog, CalibrationEngine, Dataset, DEFAULT_ATTRIBUTE_DELIMITER};

use crate::commands::CommandResult;
use crate::{export, loader};

/// Exit codes: 3 input loading, 4 engine, 5 export.
pub fn run(config: &AppConfig) -> CommandResult {
    let (catalog, dataset) = match load_inputs(config) {
        Ok(loaded) => loaded,
        Err(error) => return CommandResult::failure(format!("{error:#}"), 3),
    };

    tracing::info!(
        items = catalog.len(),
        users = dataset.users().len(),
        interactions = dataset.interaction_count(),
        recommendations = dataset.recommendation_count(),
        "inputs loaded"
    );

    let engine = match CalibrationEngine::new(&catalog, &config.engine) {
        Ok(engine) => engine,
        Err(error) => return CommandResult::failure(error.to_string(), 4),
    };

    let outcome = match engine.run(&dataset) {
        Ok(outcome) => outcome,
        Err(error) => return CommandResult::failure(error.to_string(), 4),
    };

    for (user_id, error) in &outcome.skipped {
        tracing::warn!(user_id = %user_id, error = %error, "user skipped");
    }
    tracing::info!(
        evaluated = outcome.ranked.len(),
        worst_case = outcome.worst_case.len(),
        calibrated = outcome.calibrated_items.len(),
        "calibration finished"
    );

    let written = match export::export_run(&outcome, &config.output.dir) {
        Ok(written) => written,
        Err(error) => return CommandResult::failure(format!("{error:#}"), 5),
    };

    CommandResult::success(format!(
        "evaluated {} users, calibrated {} of {} worst-case ({} skipped); wrote {} tables to {}",
        outcome.ranked.len(),
        outcome.calibrated_items.len(),
        outcome.worst_case.len(),
        outcome.skipped.len(),
        written.len(),
        config.output.dir.display(),
    ))
}

fn load_inputs(config: &AppConfig) -> Result<(Catalog, Dataset)> {
    let format = config.inputs.format;

    let catalog_records = loader::load_catalog_records(&config.inputs.catalog, format)?;
    let catalog = Catalog::from_records(&catalog_records, DEFAULT_ATTRIBUTE_DELIMITER);

    let interactions = loader::load_interaction_records(&config.inputs.interactions, format)?;
    let recommendations =
        loader::load_recommendation_records(&config.inputs.recommendations, format)?;

    Ok((catalog, Dataset::new(interactions, recommendations)))
}
