//! Translation model registry: maps host types to translation model types.
//!
//! Type paths are registered up front. Resolution first honours explicit
//! bindings, then probes each configured namespace in order for
//! `{namespace}::{Host}Translation` and returns the first registered path.

use crate::error::ConfigurationError;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Suffix appended to a host's simple name to guess its translation model.
pub const TRANSLATION_MODEL_SUFFIX: &str = "Translation";

/// Ordered namespace prefixes. A single value is a one-element list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelNamespaces(Vec<String>);

impl ModelNamespaces {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for ModelNamespaces {
    fn from(namespace: &str) -> Self {
        Self(vec![namespace.to_string()])
    }
}

impl From<String> for ModelNamespaces {
    fn from(namespace: String) -> Self {
        Self(vec![namespace])
    }
}

impl From<Vec<String>> for ModelNamespaces {
    fn from(namespaces: Vec<String>) -> Self {
        Self(namespaces)
    }
}

impl From<Vec<&str>> for ModelNamespaces {
    fn from(namespaces: Vec<&str>) -> Self {
        Self(namespaces.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ModelNamespaces {
    fn from(namespaces: [&str; N]) -> Self {
        Self(namespaces.iter().map(|ns| ns.to_string()).collect())
    }
}

/// Registry of known translation model paths and namespace configuration.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    namespaces: ModelNamespaces,

    /// Every loadable translation model path (e.g. `app::models::PostTranslation`)
    models: BTreeSet<String>,

    /// Explicit host simple name -> translation model path
    bindings: HashMap<String, String>,
}

impl ModelRegistry {
    pub fn new(namespaces: impl Into<ModelNamespaces>) -> Self {
        Self {
            namespaces: namespaces.into(),
            ..Self::default()
        }
    }

    /// Replace the namespaces to search.
    pub fn set_namespaces(&mut self, namespaces: impl Into<ModelNamespaces>) {
        self.namespaces = namespaces.into();
    }

    pub fn namespaces(&self) -> &[String] {
        self.namespaces.as_slice()
    }

    /// Register a loadable translation model path.
    pub fn register(&mut self, path: impl Into<String>) -> &mut Self {
        self.models.insert(path.into());
        self
    }

    /// Wire a host type to a translation model explicitly.
    ///
    /// Bindings win over namespace guessing.
    pub fn bind(&mut self, host: impl Into<String>, path: impl Into<String>) -> &mut Self {
        self.bindings.insert(host.into(), path.into());
        self
    }

    /// Check if a path has been registered.
    pub fn contains(&self, path: &str) -> bool {
        self.models.contains(path)
    }

    /// `Post` -> `PostTranslation`
    pub fn guess_model_name(host: &str) -> String {
        format!("{host}{TRANSLATION_MODEL_SUFFIX}")
    }

    /// Resolve the translation model path for a host's simple name.
    ///
    /// # Errors
    /// `ConfigurationError` naming the guessed model and every namespace
    /// probed when no candidate is registered.
    pub fn resolve(&self, host: &str) -> Result<String, ConfigurationError> {
        if let Some(path) = self.bindings.get(host) {
            debug!("Using bound translation model {} for {}", path, host);
            return Ok(path.clone());
        }

        let model = Self::guess_model_name(host);

        for namespace in self.namespaces() {
            let candidate = qualify(namespace, &model);
            if self.contains(&candidate) {
                debug!("Resolved translation model {} for {}", candidate, host);
                return Ok(candidate);
            }
            debug!("Translation model {} is not registered", candidate);
        }

        Err(ConfigurationError::helper_model_not_found(
            model,
            self.namespaces(),
        ))
    }
}

fn qualify(namespace: &str, model: &str) -> String {
    let namespace = namespace.trim_end_matches("::");
    if namespace.is_empty() {
        model.to_string()
    } else {
        format!("{namespace}::{model}")
    }
}
