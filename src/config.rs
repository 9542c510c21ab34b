use crate::i18n::LocaleContext;
use crate::registry::ModelRegistry;
use anyhow::{ensure, Result};

/// Namespace searched when `TRANSLATABLE_MODEL_NAMESPACES` isn't set.
pub const DEFAULT_MODEL_NAMESPACE: &str = "app::models";

#[derive(Debug, Clone)]
pub struct Config {
    // Translation model lookup
    pub model_namespaces: Vec<String>,

    // Locales
    pub locale: String,
    pub fallback_locale: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let model_namespaces: Vec<String> = lookup("TRANSLATABLE_MODEL_NAMESPACES")
            .unwrap_or_else(|| DEFAULT_MODEL_NAMESPACE.to_string())
            .split(',')
            .map(|namespace| namespace.trim().to_string())
            .filter(|namespace| !namespace.is_empty())
            .collect();

        let locale = lookup("APP_LOCALE")
            .map(|locale| locale.trim().to_string())
            .unwrap_or_else(|| "en".to_string());
        ensure!(!locale.is_empty(), "APP_LOCALE must not be empty");

        let fallback_locale = lookup("APP_FALLBACK_LOCALE")
            .map(|locale| locale.trim().to_string())
            .filter(|locale| !locale.is_empty());

        Ok(Self {
            model_namespaces,
            locale,
            fallback_locale,
        })
    }

    /// Locale context for resolution calls.
    pub fn locale_context(&self) -> LocaleContext {
        let ctx = LocaleContext::new(&self.locale);
        match &self.fallback_locale {
            Some(fallback) => ctx.with_fallback(fallback),
            None => ctx,
        }
    }

    /// Empty registry searching the configured namespaces.
    pub fn registry(&self) -> ModelRegistry {
        ModelRegistry::new(self.model_namespaces.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.model_namespaces, vec!["app::models"]);
        assert_eq!(config.locale, "en");
        assert!(config.fallback_locale.is_none());
    }

    #[test]
    fn test_namespace_list_is_split_and_trimmed() {
        let config = config_from(&[(
            "TRANSLATABLE_MODEL_NAMESPACES",
            "app::models, app::models::sub ,",
        )])
        .unwrap();
        assert_eq!(config.model_namespaces, vec!["app::models", "app::models::sub"]);
    }

    #[test]
    fn test_single_namespace_is_one_element_list() {
        let config = config_from(&[("TRANSLATABLE_MODEL_NAMESPACES", "blog::models")]).unwrap();
        assert_eq!(config.registry().namespaces(), ["blog::models".to_string()]);
    }

    #[test]
    fn test_locale_context() {
        let config = config_from(&[("APP_LOCALE", "nl"), ("APP_FALLBACK_LOCALE", "en")]).unwrap();
        let ctx = config.locale_context();
        assert_eq!(ctx.locale(), "nl");
        assert_eq!(ctx.fallback_locale(), Some("en"));
    }

    #[test]
    fn test_empty_fallback_is_unset() {
        let config = config_from(&[("APP_FALLBACK_LOCALE", " ")]).unwrap();
        assert!(config.locale_context().fallback_locale().is_none());
    }

    #[test]
    fn test_empty_locale_is_rejected() {
        let result = config_from(&[("APP_LOCALE", "")]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("APP_LOCALE"));
    }
}
