//! Fitted-model handles and MCMC control parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classification::ModelFamily;
use crate::error::{ConfigError, Result};

/// MCMC control parameters passed through to the external fitting routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct McmcControls {
    /// Number of independent chains.
    pub chains: usize,
    /// Adaptation (burn-in) iterations per chain.
    pub adapt_steps: usize,
    /// Sampling iterations per chain.
    pub draws: usize,
    /// Seed forwarded to the sampler for reproducible draws.
    pub seed: Option<u64>,
    /// Worker-count hint for the external routine. Not interpreted here.
    pub workers: Option<usize>,
}

impl Default for McmcControls {
    fn default() -> Self {
        Self {
            chains: 3,
            adapt_steps: 1000,
            draws: 5000,
            seed: None,
            workers: None,
        }
    }
}

impl McmcControls {
    pub fn validate(&self) -> Result<()> {
        if self.chains == 0 {
            return Err(ConfigError::InvalidMcmc {
                field: "chains",
                message: "at least one chain is required".to_string(),
            });
        }
        if self.draws == 0 {
            return Err(ConfigError::InvalidMcmc {
                field: "draws",
                message: "at least one draw is required".to_string(),
            });
        }
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidMcmc {
                field: "workers",
                message: "worker hint must be positive when set".to_string(),
            });
        }
        Ok(())
    }
}

/// Regression formula `target ~ fixed + ... + (1 | group)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFormula {
    pub target: String,
    pub fixed_effects: Vec<String>,
    /// Grouping factor of the random intercept.
    pub group: String,
}

impl fmt::Display for ModelFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ ", self.target)?;
        for effect in &self.fixed_effects {
            write!(f, "{effect} + ")?;
        }
        write!(f, "(1 | {})", self.group)
    }
}

/// Opaque handle to a model fitted by the external library.
///
/// `payload` is whatever the backend needs to draw completions later (for the
/// R backend, the serialized fit object). It is stored hex-encoded when the
/// handle is written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedModel {
    pub target: String,
    pub family: ModelFamily,
    pub formula: String,
    /// Name of the backend that produced the handle.
    pub backend: String,
    pub controls: McmcControls,
    #[serde(with = "hex_payload")]
    pub payload: Vec<u8>,
}

mod hex_payload {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}
