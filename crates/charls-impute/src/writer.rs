//! Persistence of imputed datasets and fitted models.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use tracing::debug;

use charls_ingest::{ensure_dir, write_csv_frame};
use charls_model::FittedModel;

use crate::error::{PipelineError, Result};

/// Subdirectory of the output root holding the imputed datasets.
pub const IMPUTED_DIR: &str = "imputed";

/// Subdirectory of the output root holding the fitted-model blob.
pub const MODELS_DIR: &str = "models";

/// File name of the fitted-model blob.
pub const MODELS_FILE: &str = "fitted_models.json";

/// File name of the `index`-th imputed dataset (1-based).
pub fn imputed_dataset_filename(index: usize) -> String {
    format!("imputed_dataset_{index}.csv")
}

/// Write each dataset to `dir/imputed_dataset_{i}.csv`, `i` starting at 1.
pub fn write_imputed_datasets(dir: &Path, datasets: &[DataFrame]) -> Result<Vec<PathBuf>> {
    ensure_dir(dir)?;
    let mut written = Vec::with_capacity(datasets.len());
    for (idx, dataset) in datasets.iter().enumerate() {
        let path = dir.join(imputed_dataset_filename(idx + 1));
        write_csv_frame(dataset, &path)?;
        written.push(path);
    }
    debug!(dir = %dir.display(), count = written.len(), "wrote imputed datasets");
    Ok(written)
}

/// Write the target-to-model map to `dir/fitted_models.json`.
pub fn write_fitted_models(dir: &Path, models: &BTreeMap<String, FittedModel>) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join(MODELS_FILE);
    let json = serde_json::to_vec_pretty(models)?;
    fs::write(&path, json).map_err(|source| PipelineError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), models = models.len(), "wrote fitted models");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use charls_ingest::read_csv_frame;
    use charls_model::{McmcControls, ModelFamily};
    use polars::prelude::{Column, IntoColumn, NamedFrom, Series};

    #[test]
    fn datasets_are_numbered_from_one() {
        let dir = tempfile::tempdir().unwrap();
        let columns: Vec<Column> = vec![
            Series::new("ID".into(), vec!["1", "2"]).into_column(),
            Series::new("srh".into(), vec![3i64, 4]).into_column(),
        ];
        let df = DataFrame::new(columns).unwrap();

        let paths = write_imputed_datasets(dir.path(), &[df.clone(), df]).unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("imputed_dataset_1.csv"));
        assert!(paths[1].ends_with("imputed_dataset_2.csv"));
        let back = read_csv_frame(&paths[1]).unwrap();
        assert_eq!(back.shape(), (2, 2));
    }

    #[test]
    fn models_blob_is_keyed_by_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut models = BTreeMap::new();
        models.insert(
            "srh".to_string(),
            FittedModel {
                target: "srh".to_string(),
                family: ModelFamily::OrdinalMixed,
                formula: "srh ~ age + wave + (1 | ID)".to_string(),
                backend: "test".to_string(),
                controls: McmcControls::default(),
                payload: vec![1, 2, 255],
            },
        );

        let path = write_fitted_models(&dir.path().join("models"), &models).unwrap();

        let text = fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["srh"]["payload"], "0102ff");
        assert_eq!(value["srh"]["family"], "ordinal_mixed");
    }
}
