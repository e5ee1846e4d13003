use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::rmq::{DEFAULT_CAPACITY, FastRmq, RmqValue};

/// What a run does with a query or close naming a mark that is not open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidMarkPolicy {
    /// Fail the whole run; nothing is printed.
    #[default]
    Abort,
    /// Log a warning and move on without an output line.
    Skip,
}

impl FromStr for InvalidMarkPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(InvalidMarkPolicy::Abort),
            "skip" => Ok(InvalidMarkPolicy::Skip),
            other => Err(format!("unknown invalid-mark policy `{other}`")),
        }
    }
}

impl fmt::Display for InvalidMarkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidMarkPolicy::Abort => write!(f, "abort"),
            InvalidMarkPolicy::Skip => write!(f, "skip"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RmqConfig {
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
    #[serde(default)]
    pub check_invariants: bool,
    #[serde(default)]
    pub on_invalid_mark: InvalidMarkPolicy,
}

impl Default for RmqConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
            check_invariants: false,
            on_invalid_mark: InvalidMarkPolicy::default(),
        }
    }
}

impl RmqConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fresh structure configured by `self`.
    pub fn build<T: RmqValue>(&self) -> FastRmq<T> {
        FastRmq::with_capacity(self.initial_capacity).with_invariant_checks(self.check_invariants)
    }
}

fn default_initial_capacity() -> usize {
    DEFAULT_CAPACITY
}
