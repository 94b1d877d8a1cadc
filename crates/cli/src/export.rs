//! Tidy long-format CSV export of run results and summary tables.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use recal_core::{average_table, single_table, AttributeDistribution, CalibrationRun, UserId};

/// Writes every result table under `dir`, returning the written paths.
pub fn export_run(run: &CalibrationRun, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("could not create output directory `{}`", dir.display()))?;

    let mut written = Vec::new();

    written.push(write_distributions(&dir.join("inter_distr.csv"), &run.historical)?);
    written.push(write_distributions(&dir.join("recom_distr.csv"), &run.recommended)?);
    written.push(write_distributions(&dir.join("calib_distr.csv"), &run.calibrated)?);
    written.push(write_calibrated_items(&dir.join("calib_items.csv"), run)?);
    written.push(write_average_table(&dir.join("average_table.csv"), run)?);
    written.push(write_single_table(&dir.join("single_table.csv"), run)?);

    Ok(written)
}

fn write_distributions(
    path: &Path,
    distributions: &BTreeMap<UserId, AttributeDistribution>,
) -> Result<PathBuf> {
    let mut writer = open_writer(path)?;
    writer.write_record(["user_id", "attribute", "weight"])?;

    for (user_id, distribution) in distributions {
        for (attribute, weight) in distribution.iter() {
            writer.write_record([user_id.0.as_str(), attribute, &weight.to_string()])?;
        }
    }

    finish(writer, path)
}

fn write_calibrated_items(path: &Path, run: &CalibrationRun) -> Result<PathBuf> {
    let mut writer = open_writer(path)?;
    writer.write_record(["user_id", "rank", "item_id"])?;

    for (user_id, items) in &run.calibrated_items {
        for (rank, item_id) in items.iter().enumerate() {
            writer.write_record([
                user_id.0.as_str(),
                &(rank + 1).to_string(),
                item_id.0.as_str(),
            ])?;
        }
    }

    finish(writer, path)
}

fn write_average_table(path: &Path, run: &CalibrationRun) -> Result<PathBuf> {
    let table = average_table(run);
    let sections: [(&str, &BTreeMap<String, f64>); 7] = [
        ("inter_distr", &table.historical),
        ("recom_distr", &table.recommended),
        ("calib_distr", &table.calibrated),
        ("neg_pre_delta", &table.negative_pre_delta),
        ("pos_pre_delta", &table.positive_pre_delta),
        ("neg_post_delta", &table.negative_post_delta),
        ("pos_post_delta", &table.positive_post_delta),
    ];

    let mut writer = open_writer(path)?;
    writer.write_record(["table", "attribute", "value"])?;
    for (name, section) in sections {
        for (attribute, value) in section {
            writer.write_record([name, attribute.as_str(), &value.to_string()])?;
        }
    }

    finish(writer, path)
}

fn write_single_table(path: &Path, run: &CalibrationRun) -> Result<PathBuf> {
    let mut writer = open_writer(path)?;
    writer.write_record(["user_id", "table", "attribute", "value"])?;

    if let Some(table) = single_table(run) {
        let sections: [(&str, &BTreeMap<String, f64>); 6] = [
            ("inter_distr", &table.historical),
            ("recom_distr", &table.recommended),
            ("calib_distr", &table.calibrated),
            ("pre_delta", &table.pre_delta),
            ("post_delta", &table.post_delta),
            ("recom_delta", &table.recom_delta),
        ];
        for (name, section) in sections {
            for (attribute, value) in section {
                writer.write_record([
                    table.user_id.0.as_str(),
                    name,
                    attribute.as_str(),
                    &value.to_string(),
                ])?;
            }
        }
    }

    finish(writer, path)
}

fn open_writer(path: &Path) -> Result<csv::Writer<fs::File>> {
    csv::Writer::from_path(path)
        .with_context(|| format!("could not create output file `{}`", path.display()))
}

fn finish(mut writer: csv::Writer<fs::File>, path: &Path) -> Result<PathBuf> {
    writer.flush().with_context(|| format!("could not flush `{}`", path.display()))?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;

    use recal_core::{AttributeDistribution, CalibrationRun, ItemId, UserId};
    use tempfile::TempDir;

    use super::export_run;

    fn small_run() -> CalibrationRun {
        let mut run = CalibrationRun::default();
        let user = UserId::from("7");
        let weights: BTreeMap<String, f64> = [("x".to_string(), 1.0)].into_iter().collect();

        run.worst_case.push(user.clone());
        run.historical.insert(user.clone(), AttributeDistribution::from_weights(weights.clone()));
        run.recommended
            .insert(user.clone(), AttributeDistribution::from_weights(weights.clone()));
        run.calibrated.insert(user.clone(), AttributeDistribution::from_weights(weights));
        run.calibrated_items.insert(user, vec![ItemId::from("9"), ItemId::from("4")]);
        run
    }

    #[test]
    fn export_writes_all_six_tables() {
        let dir = TempDir::new().unwrap();

        let written = export_run(&small_run(), dir.path()).unwrap();

        assert_eq!(written.len(), 6);
        for path in &written {
            assert!(path.exists(), "missing export {}", path.display());
        }
    }

    #[test]
    fn calibrated_items_are_ranked_from_one() {
        let dir = TempDir::new().unwrap();

        export_run(&small_run(), dir.path()).unwrap();
        let contents = fs::read_to_string(dir.path().join("calib_items.csv")).unwrap();

        assert!(contents.contains("7,1,9"));
        assert!(contents.contains("7,2,4"));
    }

    #[test]
    fn distribution_rows_are_user_attribute_weight() {
        let dir = TempDir::new().unwrap();

        export_run(&small_run(), dir.path()).unwrap();
        let contents = fs::read_to_string(dir.path().join("inter_distr.csv")).unwrap();

        assert!(contents.starts_with("user_id,attribute,weight"));
        assert!(contents.contains("7,x,1"));
    }

    #[test]
    fn empty_run_still_writes_headers() {
        let dir = TempDir::new().unwrap();

        export_run(&CalibrationRun::default(), dir.path()).unwrap();
        let contents = fs::read_to_string(dir.path().join("single_table.csv")).unwrap();

        assert_eq!(contents.trim(), "user_id,table,attribute,value");
    }
}
