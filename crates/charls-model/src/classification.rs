//! Vocabulary categories and model families.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Category label a vocabulary list assigns to a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableCategory {
    Binary,
    Ordinal,
    Continuous,
    Required,
    Excluded,
}

impl VariableCategory {
    /// All categories in reporting order.
    pub const ALL: [VariableCategory; 5] = [
        VariableCategory::Binary,
        VariableCategory::Ordinal,
        VariableCategory::Continuous,
        VariableCategory::Required,
        VariableCategory::Excluded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariableCategory::Binary => "binary",
            VariableCategory::Ordinal => "ordinal",
            VariableCategory::Continuous => "continuous",
            VariableCategory::Required => "required",
            VariableCategory::Excluded => "excluded",
        }
    }
}

impl fmt::Display for VariableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External model family used to impute a target variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Linear mixed-effects model (continuous targets).
    #[default]
    LinearMixed,
    /// Binomial generalized linear mixed model (binary targets).
    BinomialMixed,
    /// Cumulative-logit ordinal mixed model (ordinal targets).
    OrdinalMixed,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::LinearMixed => "linear_mixed",
            ModelFamily::BinomialMixed => "binomial_mixed",
            ModelFamily::OrdinalMixed => "ordinal_mixed",
        }
    }

    /// The family a variable in `category` is imputed with.
    pub fn for_category(category: VariableCategory) -> Self {
        match category {
            VariableCategory::Ordinal => ModelFamily::OrdinalMixed,
            VariableCategory::Binary => ModelFamily::BinomialMixed,
            VariableCategory::Continuous | VariableCategory::Required | VariableCategory::Excluded => {
                ModelFamily::LinearMixed
            }
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vocabulary categories matched against the columns of one frame.
///
/// Each list keeps vocabulary order. `excluded` lists the excluded columns
/// the frame has or had; those names never appear in another list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub binary: Vec<String>,
    pub ordinal: Vec<String>,
    pub continuous: Vec<String>,
    pub required: Vec<String>,
    pub excluded: Vec<String>,
    /// Model family tag for every binary and ordinal column.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub families: BTreeMap<String, ModelFamily>,
}

impl Classification {
    pub fn members(&self, category: VariableCategory) -> &[String] {
        match category {
            VariableCategory::Binary => &self.binary,
            VariableCategory::Ordinal => &self.ordinal,
            VariableCategory::Continuous => &self.continuous,
            VariableCategory::Required => &self.required,
            VariableCategory::Excluded => &self.excluded,
        }
    }

    pub fn members_mut(&mut self, category: VariableCategory) -> &mut Vec<String> {
        match category {
            VariableCategory::Binary => &mut self.binary,
            VariableCategory::Ordinal => &mut self.ordinal,
            VariableCategory::Continuous => &mut self.continuous,
            VariableCategory::Required => &mut self.required,
            VariableCategory::Excluded => &mut self.excluded,
        }
    }

    pub fn contains(&self, category: VariableCategory, name: &str) -> bool {
        self.members(category).iter().any(|member| member == name)
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.contains(VariableCategory::Excluded, name)
    }

    /// Model family for `name`; columns without a tag use the linear family.
    pub fn family_for(&self, name: &str) -> ModelFamily {
        self.families.get(name).copied().unwrap_or_default()
    }

    /// Number of matched columns per category.
    pub fn sizes(&self) -> BTreeMap<VariableCategory, usize> {
        VariableCategory::ALL
            .iter()
            .map(|category| (*category, self.members(*category).len()))
            .collect()
    }
}
