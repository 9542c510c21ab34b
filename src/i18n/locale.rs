//! Locale context: the active and fallback locale for a resolution call.
//!
//! Instead of reading a process-wide "current locale", callers thread a
//! `LocaleContext` through every lookup. Switching the active locale is an
//! explicit mutation of the context the caller owns.

use serde::{Deserialize, Serialize};

/// Active locale plus the optional process-configured fallback locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleContext {
    /// Locale used when a lookup doesn't name one (e.g. "en")
    locale: String,

    /// Locale consulted once when the requested locale yields no value
    fallback_locale: Option<String>,
}

impl LocaleContext {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            fallback_locale: None,
        }
    }

    /// Set the fallback locale.
    pub fn with_fallback(mut self, fallback_locale: impl Into<String>) -> Self {
        self.fallback_locale = Some(fallback_locale.into());
        self
    }

    /// The active locale.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// The configured fallback locale, if any.
    pub fn fallback_locale(&self) -> Option<&str> {
        self.fallback_locale.as_deref()
    }

    /// Switch the active locale.
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
    }
}

impl Default for LocaleContext {
    fn default() -> Self {
        Self::new("en")
    }
}

/// A locale constraint: one locale (equality) or a set (membership).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Locales {
    One(String),
    Many(Vec<String>),
}

impl Locales {
    /// Check whether `locale` satisfies this constraint.
    pub fn contains(&self, locale: &str) -> bool {
        match self {
            Locales::One(code) => code == locale,
            Locales::Many(codes) => codes.iter().any(|code| code == locale),
        }
    }
}

impl From<&str> for Locales {
    fn from(locale: &str) -> Self {
        Locales::One(locale.to_string())
    }
}

impl From<String> for Locales {
    fn from(locale: String) -> Self {
        Locales::One(locale)
    }
}

impl From<&String> for Locales {
    fn from(locale: &String) -> Self {
        Locales::One(locale.clone())
    }
}

impl From<Vec<String>> for Locales {
    fn from(locales: Vec<String>) -> Self {
        Locales::Many(locales)
    }
}

impl From<Vec<&str>> for Locales {
    fn from(locales: Vec<&str>) -> Self {
        Locales::Many(locales.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Locales {
    fn from(locales: [&str; N]) -> Self {
        Locales::Many(locales.iter().map(|code| code.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== LocaleContext Tests ====================

    #[test]
    fn test_default_context_is_english_without_fallback() {
        let ctx = LocaleContext::default();
        assert_eq!(ctx.locale(), "en");
        assert!(ctx.fallback_locale().is_none());
    }

    #[test]
    fn test_with_fallback() {
        let ctx = LocaleContext::new("nl").with_fallback("en");
        assert_eq!(ctx.locale(), "nl");
        assert_eq!(ctx.fallback_locale(), Some("en"));
    }

    #[test]
    fn test_set_locale_keeps_fallback() {
        let mut ctx = LocaleContext::new("nl").with_fallback("en");
        ctx.set_locale("fr");
        assert_eq!(ctx.locale(), "fr");
        assert_eq!(ctx.fallback_locale(), Some("en"));
    }

    // ==================== Locales Tests ====================

    #[test]
    fn test_single_locale_uses_equality() {
        let locales = Locales::from("nl");
        assert!(locales.contains("nl"));
        assert!(!locales.contains("nl-BE"));
    }

    #[test]
    fn test_locale_list_uses_membership() {
        let locales = Locales::from(["nl", "fr"]);
        assert!(locales.contains("fr"));
        assert!(!locales.contains("en"));
    }

    #[test]
    fn test_empty_locale_list_matches_nothing() {
        let locales = Locales::Many(Vec::new());
        assert!(!locales.contains("en"));
    }

    #[test]
    fn test_locales_deserialize_scalar_or_list() {
        let one: Locales = serde_json::from_str(r#""nl""#).unwrap();
        let many: Locales = serde_json::from_str(r#"["nl", "fr"]"#).unwrap();
        assert_eq!(one, Locales::One("nl".to_string()));
        assert_eq!(many, Locales::from(vec!["nl", "fr"]));
    }
}
