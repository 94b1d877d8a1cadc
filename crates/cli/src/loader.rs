//! Headerless CSV/TSV ingestion for the three tabular inputs.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use recal_core::config::InputFormat;
use recal_core::{CatalogRecord, InteractionRecord, RecommendationRecord};

pub fn load_catalog_records(path: &Path, format: InputFormat) -> Result<Vec<CatalogRecord>> {
    load_records(path, format, "catalog")
}

pub fn load_interaction_records(
    path: &Path,
    format: InputFormat,
) -> Result<Vec<InteractionRecord>> {
    load_records(path, format, "interaction")
}

pub fn load_recommendation_records(
    path: &Path,
    format: InputFormat,
) -> Result<Vec<RecommendationRecord>> {
    load_records(path, format, "recommendation")
}

fn load_records<T: DeserializeOwned>(
    path: &Path,
    format: InputFormat,
    label: &str,
) -> Result<Vec<T>> {
    let mut reader = open_reader(path, format)?;

    let mut records = Vec::new();
    for (row, result) in reader.deserialize().enumerate() {
        let record: T = result.with_context(|| {
            format!("invalid {label} row {} in `{}`", row + 1, path.display())
        })?;
        records.push(record);
    }
    Ok(records)
}

fn open_reader(path: &Path, format: InputFormat) -> Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(format.delimiter())
        .flexible(false)
        .from_path(path)
        .with_context(|| format!("could not open input file `{}`", path.display()))
}
