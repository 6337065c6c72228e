//! History configuration.
//!
//! Either a single root history:
//!
//! ```toml
//! ignore_mutations = ["setCursor"]
//! ```
//!
//! or one history per managed module:
//!
//! ```toml
//! [[paths]]
//! namespace = "doc"
//! ignore_mutations = ["setSelection"]
//!
//! [[paths]]
//! namespace = "sidebar"
//! ```
//!
//! Names in `ignore_mutations` are local to their module; they are
//! qualified with the namespace when the histories are built.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path_config::PathConfig;
use crate::types::Namespace;

/// Options for one managed module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathOptions {
    /// Module name, with or without the trailing `/`.
    pub namespace: String,
    /// Local mutation names never recorded.
    #[serde(default, alias = "ignoreMutations")]
    pub ignore_mutations: Vec<String>,
}

impl PathOptions {
    /// Create options for a module.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ignore_mutations: Vec::new(),
        }
    }

    /// Add a mutation to the ignore list.
    #[must_use]
    pub fn ignore(mut self, mutation: impl Into<String>) -> Self {
        self.ignore_mutations.push(mutation.into());
        self
    }
}

/// Construction-time history options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryOptions {
    /// Root-history ignore list, used when `paths` is absent.
    #[serde(alias = "ignoreMutations")]
    pub ignore_mutations: Vec<String>,
    /// One entry per managed module.
    pub paths: Option<Vec<PathOptions>>,
}

impl HistoryOptions {
    /// A single root history with the given ignore list.
    pub fn root<I, S>(ignore_mutations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignore_mutations: ignore_mutations.into_iter().map(Into::into).collect(),
            paths: None,
        }
    }

    /// Add a managed module.
    #[must_use]
    pub fn with_path(mut self, path: PathOptions) -> Self {
        self.paths.get_or_insert_with(Vec::new).push(path);
        self
    }

    /// Load options from a `.toml` or `.json` file and validate them.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or if validation fails.
    pub fn from_file(path: &Path) -> Result<Self> {
        let options: Self = rewind_core::read_config(path)?;
        options.validate()?;
        Ok(options)
    }

    /// Parse options from a TOML string and validate them.
    ///
    /// # Errors
    ///
    /// Returns error if the TOML is malformed or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let options: Self = rewind_core::parse_toml(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Check that module namespaces are non-empty and unique.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the offending namespace.
    pub fn validate(&self) -> Result<()> {
        let Some(paths) = &self.paths else {
            return Ok(());
        };

        let mut seen = BTreeSet::new();
        for path in paths {
            let namespace = Namespace::named(&path.namespace);
            if namespace.is_root() {
                return Err(Error::invalid_config("module paths need a non-empty namespace"));
            }
            if namespace.module_name().contains(Namespace::SEPARATOR) {
                return Err(Error::invalid_config(format!(
                    "namespace '{}' must be a single module name",
                    path.namespace
                )));
            }
            if !seen.insert(namespace.clone()) {
                return Err(Error::invalid_config(format!(
                    "duplicate namespace '{namespace}'"
                )));
            }
        }
        Ok(())
    }

    /// Build the initial, empty histories.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if validation fails.
    pub fn path_configs(&self) -> Result<Vec<PathConfig>> {
        self.validate()?;

        let configs = match &self.paths {
            Some(paths) => paths
                .iter()
                .map(|path| {
                    let namespace = Namespace::named(&path.namespace);
                    let ignore = path
                        .ignore_mutations
                        .iter()
                        .map(|mutation| namespace.qualify(mutation))
                        .collect::<Vec<_>>();
                    PathConfig::new(namespace, ignore)
                })
                .collect(),
            None => vec![PathConfig::new(
                Namespace::root(),
                self.ignore_mutations.iter().cloned(),
            )],
        };
        Ok(configs)
    }
}
