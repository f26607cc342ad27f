//! Generator configuration, loaded from TOML.
//!
//! ```toml
//! policy = "native"
//! tag_key = "json"
//! context_types = ["context.Context"]
//! error_types = ["error"]
//!
//! [substitutions]
//! "example.com/money.Amount" = "decimal"
//! "example.com/db.NullUUID" = "uuid?"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::ir::TypeId;
use crate::substitution::{Substitute, SubstitutionTable};

/// Exclusion policy of the reachability collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectPolicy {
    /// The host has native equivalents for well-known runtime types; stop at
    /// them.
    #[default]
    Native,
    /// Collect everything; the resolver decides native-vs-materialize.
    Materialize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub policy: CollectPolicy,
    /// Struct tag key carrying wire names.
    pub tag_key: String,
    /// Types of the implicit leading context parameter.
    pub context_types: Vec<TypeId>,
    /// Types of the trailing error result.
    pub error_types: Vec<TypeId>,
    /// Start from the built-in substitution table.
    pub builtin_substitutions: bool,
    /// Extra substitutions keyed by qualified name; override built-ins.
    pub substitutions: BTreeMap<String, Substitute>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            policy: CollectPolicy::Native,
            tag_key: "json".to_string(),
            context_types: vec![TypeId::from("context.Context")],
            error_types: vec![TypeId::from("error")],
            builtin_substitutions: true,
            substitutions: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn with_policy(mut self, policy: CollectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The effective substitution table.
    pub fn substitution_table(&self) -> SubstitutionTable {
        let mut table = if self.builtin_substitutions {
            SubstitutionTable::builtin()
        } else {
            SubstitutionTable::empty()
        };
        for (key, substitute) in &self.substitutions {
            table.insert(key.clone(), *substitute);
        }
        table
    }
}
