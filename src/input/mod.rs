//! Migration loading
//!
//! Discovers dbmate-style migration files and splits them into their up and
//! down blocks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::protocol::null_as_default;

pub mod dbmate;

/// One versioned unit of schema change.
///
/// This is also the `migration` object of the analyzer wire protocol, so the
/// field names follow the JSON envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Migration {
    #[serde(default)]
    pub applied: bool,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub relative_file_path: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub up: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub up_options: MigrationOptions,
    #[serde(default)]
    pub down: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub down_options: MigrationOptions,
}

/// Options attached to one direction of a migration.
///
/// Up and down options are independent: `-- migrate:up transaction:false`
/// does not affect the down block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationOptions(BTreeMap<String, String>);

impl MigrationOptions {
    pub const TRANSACTION: &'static str = "transaction";

    pub fn new() -> Self {
        Self::default()
    }

    /// Options carrying only the normalized `transaction` flag.
    pub fn with_transaction(run_in_transaction: bool) -> Self {
        let mut options = Self::new();
        options.insert(Self::TRANSACTION, run_in_transaction.to_string());
        options
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// dbmate wraps each direction in a transaction unless it is explicitly
    /// disabled with `transaction:false`.
    pub fn runs_in_transaction(&self) -> bool {
        self.get(Self::TRANSACTION) != Some("false")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MigrationOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Trait for migration loaders. Each migration tool's layout implements this.
pub trait MigrationLoader {
    /// Load all migrations found in `dir`, in application order.
    fn load(&self, dir: &Path) -> Result<Vec<Migration>, LoadError>;
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },
}
