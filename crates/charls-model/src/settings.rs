//! Run configuration.
//!
//! Settings are read once at process start from a TOML file and passed by
//! reference to every stage afterwards. Every section falls back to the
//! built-in CHARLS defaults, so a config file only needs the keys it changes.
//!
//! ```toml
//! [vocabulary]
//! binary = ["gender", "nation"]
//! ordinal = ["srh"]
//!
//! [vocabulary.ordinal_levels]
//! srh = ["very poor", "poor", "fair", "good", "very good"]
//!
//! [mcmc]
//! chains = 3
//! draws = 5000
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classification::VariableCategory;
use crate::error::{ConfigError, Result};
use crate::model::McmcControls;

/// Environment variable pointing at a config file.
pub const CONFIG_ENV_VAR: &str = "CHARLS_CONFIG";

/// File name written by `init` and looked up in the project root.
pub const DEFAULT_CONFIG_FILENAME: &str = "charls.toml";

/// Complete run configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub vocabulary: Vocabulary,
    pub columns: ColumnSettings,
    pub targets: TargetSettings,
    pub mcmc: McmcControls,
    pub paths: PathSettings,
}

/// Static domain vocabulary: the five category name lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub binary: Vec<String>,
    pub ordinal: Vec<String>,
    pub continuous: Vec<String>,
    pub required: Vec<String>,
    pub excluded: Vec<String>,
    /// Explicit level order per ordinal variable, lowest first.
    pub ordinal_levels: BTreeMap<String, Vec<String>>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            binary: names(&[
                "gender", "nation", "hukou", "married", "rural", "smoke", "drink", "hibpe",
                "diabe", "hearte", "stroke",
            ]),
            ordinal: names(&["srh", "edu", "adl", "iadl"]),
            continuous: names(&["age", "bmi", "cesd10", "sleep", "income"]),
            required: names(&["ID", "wave", "age"]),
            excluded: names(&["num", "householdID", "communityID"]),
            ordinal_levels: BTreeMap::new(),
        }
    }
}

impl Vocabulary {
    pub fn list(&self, category: VariableCategory) -> &[String] {
        match category {
            VariableCategory::Binary => &self.binary,
            VariableCategory::Ordinal => &self.ordinal,
            VariableCategory::Continuous => &self.continuous,
            VariableCategory::Required => &self.required,
            VariableCategory::Excluded => &self.excluded,
        }
    }

    /// Reject names listed as both binary and ordinal.
    ///
    /// Overlap with the other categories is allowed; exclusion always wins.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = self.binary.iter().find(|name| self.ordinal.contains(name)) {
            return Err(ConfigError::ConflictingCategories {
                name: name.clone(),
                first: VariableCategory::Binary.as_str(),
                second: VariableCategory::Ordinal.as_str(),
            });
        }
        Ok(())
    }
}

/// Names of the structural columns of a longitudinal table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSettings {
    /// Subject identifier; grouping factor of the random intercept.
    pub subject: String,
    /// Wave (time) index.
    pub wave: String,
    pub age: String,
    /// Row-index columns left behind by earlier exports; dropped on load.
    pub legacy_index: Vec<String>,
}

impl Default for ColumnSettings {
    fn default() -> Self {
        Self {
            subject: "ID".to_string(),
            wave: "wave".to_string(),
            age: "age".to_string(),
            legacy_index: names(&["", "Unnamed: 0", "X", "...1", "rownames"]),
        }
    }
}

/// Target-variable selection policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSettings {
    /// Preferred imputation targets, tried in order.
    pub preference: Vec<String>,
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            preference: names(&["srh", "cesd10", "adl"]),
        }
    }
}

/// Project directory layout, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub raw: PathBuf,
    pub processed: PathBuf,
    /// Root for `imputed/` and `models/` outputs.
    pub output: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            raw: PathBuf::from("data/raw"),
            processed: PathBuf::from("data/processed"),
            output: PathBuf::from("output"),
        }
    }
}

impl PathSettings {
    pub fn imputed_dir(&self) -> PathBuf {
        self.output.join("imputed")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.output.join("models")
    }

    /// Every directory of the layout, inputs first.
    pub fn layout(&self) -> Vec<PathBuf> {
        vec![
            self.raw.clone(),
            self.processed.clone(),
            self.imputed_dir(),
            self.models_dir(),
        ]
    }
}

impl Settings {
    /// Load and validate settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Resolve settings from an explicit path, then `CHARLS_CONFIG`, then defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
            && !path.trim().is_empty()
        {
            return Self::load(Path::new(&path));
        }
        tracing::debug!("no config file given, using built-in defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        self.vocabulary.validate()?;
        self.mcmc.validate()
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}
