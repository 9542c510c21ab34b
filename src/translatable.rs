//! Translation resolution for host entities.
//!
//! A host entity implements [`Translatable`] by exposing its declared
//! translatable attributes, its loaded translation collections and its raw
//! stored attributes. Everything else (lookup by locale, fallback, attribute
//! interception, relationship wiring, route binding) comes from provided
//! methods.

use crate::error::ConfigurationError;
use crate::i18n::LocaleContext;
use crate::model::{
    foreign_key_for, is_blank, table_for, HasMany, HelperModelRelation, TranslationModel,
};
use crate::registry::ModelRegistry;
use crate::scope::{Operator, Query};
use serde_json::Value;
use std::borrow::Cow;
use tracing::debug;

pub trait Translatable {
    type Translation: TranslationModel;

    /// Simple type name of the host (e.g. "Post").
    fn class_basename(&self) -> &str;

    /// Declared translatable attribute names. Undeclared means none.
    fn translatable(&self) -> &[String] {
        &[]
    }

    /// Per-instance relationship name state.
    fn helper_relation(&self) -> &HelperModelRelation;

    fn helper_relation_mut(&mut self) -> &mut HelperModelRelation;

    /// Loaded translation collection for `relation`, in load order.
    fn related(&self, relation: &str) -> Option<&[Self::Translation]>;

    /// The entity's own stored attribute, bypassing translation.
    fn raw_attribute(&self, key: &str) -> Option<Value>;

    /// Field used for route binding when none is given.
    fn route_key_name(&self) -> &str {
        "id"
    }

    /// Locale consulted once when `locale` yields no value.
    ///
    /// Defaults to the context's fallback locale, or `locale` itself when none
    /// is configured (which makes the fallback a no-op).
    fn fallback_locale(&self, ctx: &LocaleContext, locale: &str) -> Option<String> {
        Some(ctx.fallback_locale().unwrap_or(locale).to_string())
    }

    /// Translation model path. Override to bypass namespace search.
    fn helper_model_class(&self, registry: &ModelRegistry) -> Result<String, ConfigurationError> {
        registry.resolve(self.class_basename())
    }

    /// Foreign key on the translation table. Override to bypass the convention.
    fn helper_model_foreign_key(&self) -> String {
        foreign_key_for(self.class_basename())
    }

    /// Describe the one-to-many translations relationship.
    fn translations(&self, registry: &ModelRegistry) -> Result<HasMany, ConfigurationError> {
        let related = self.helper_model_class(registry)?;
        Ok(HasMany {
            table: table_for(&related),
            related,
            foreign_key: self.helper_model_foreign_key(),
            local_key: "id".to_string(),
        })
    }

    fn is_translatable_attribute(&self, key: &str) -> bool {
        self.translatable().iter().any(|attribute| attribute == key)
    }

    fn translatable_attributes(&self) -> &[String] {
        self.translatable()
    }

    /// First loaded translation record in `locale` (default: active locale).
    fn translation_model(
        &self,
        ctx: &LocaleContext,
        locale: Option<&str>,
    ) -> Option<&Self::Translation> {
        let locale = locale.unwrap_or(ctx.locale());
        self.related(self.helper_relation().name())?
            .iter()
            .find(|translation| translation.language() == locale)
    }

    /// Resolve `key` in `locale` (default: active locale).
    ///
    /// With `use_fallback`, a blank result is retried once in the fallback
    /// locale. A fallback equal to the requested locale is not retried.
    fn translation(
        &self,
        ctx: &LocaleContext,
        key: &str,
        locale: Option<&str>,
        use_fallback: bool,
    ) -> Option<Value> {
        let locale = locale.unwrap_or(ctx.locale());
        let value = self
            .translation_model(ctx, Some(locale))
            .and_then(|translation| translation.attribute(key));

        if !use_fallback || value.as_ref().is_some_and(|v| !is_blank(v)) {
            return value;
        }

        match self.fallback_locale(ctx, locale) {
            Some(fallback) if fallback != locale => {
                debug!(
                    "No {} translation for '{}', falling back to {}",
                    locale, key, fallback
                );
                self.translation(ctx, key, Some(&fallback), false)
            }
            _ => value,
        }
    }

    fn translation_with_fallback(
        &self,
        ctx: &LocaleContext,
        key: &str,
        locale: Option<&str>,
    ) -> Option<Value> {
        self.translation(ctx, key, locale, true)
    }

    fn translation_without_fallback(
        &self,
        ctx: &LocaleContext,
        key: &str,
        locale: Option<&str>,
    ) -> Option<Value> {
        self.translation(ctx, key, locale, false)
    }

    fn has_translation(&self, ctx: &LocaleContext, key: &str, locale: Option<&str>) -> bool {
        self.translation_without_fallback(ctx, key, locale)
            .is_some_and(|value| !is_blank(&value))
    }

    fn has_translation_model(&self, ctx: &LocaleContext, locale: Option<&str>) -> bool {
        self.translation_model(ctx, locale).is_some()
    }

    /// Generic attribute read: translatable keys resolve in the active
    /// locale without fallback, everything else reads the stored attribute.
    fn attribute(&self, ctx: &LocaleContext, key: &str) -> Option<Value> {
        if self.is_translatable_attribute(key) {
            return self.translation(ctx, key, None, false);
        }
        self.raw_attribute(key)
    }

    fn use_helper_model_relation(&mut self, relation: impl Into<Cow<'static, str>>) -> &mut Self
    where
        Self: Sized,
    {
        self.helper_relation_mut().set(relation);
        self
    }

    fn use_default_helper_model_relation(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self.helper_relation_mut().reset();
        self
    }

    /// Start a query scoped to this entity's translation relationship.
    fn query(&self) -> Query {
        Query::new(self.helper_relation().name())
    }

    /// Find the entity a route parameter refers to among `candidates`.
    ///
    /// Translatable fields match a translation record in the active locale;
    /// other fields match the stored attribute.
    fn resolve_route_binding<'a>(
        &self,
        candidates: &'a [Self],
        ctx: &LocaleContext,
        value: &Value,
        field: Option<&str>,
    ) -> Option<&'a Self>
    where
        Self: Sized,
    {
        let field = field.unwrap_or(self.route_key_name());

        let bound = if self.is_translatable_attribute(field) {
            self.query()
                .where_translation_in(field, Operator::Eq, value.clone(), ctx.locale())
                .first(candidates)
        } else {
            candidates.iter().find(|candidate| {
                candidate
                    .raw_attribute(field)
                    .is_some_and(|stored| route_value_eq(&stored, value))
            })
        };

        if bound.is_some() {
            debug!("Route binding resolved {}={} in {}", field, value, ctx.locale());
        }
        bound
    }
}

/// Route parameters arrive as text. Compare them the way the database casts
/// a text literal to the stored column's type.
fn route_value_eq(stored: &Value, param: &Value) -> bool {
    match (stored, param) {
        (Value::Number(number), Value::String(text)) | (Value::String(text), Value::Number(number)) => {
            let text = text.trim();
            match (number.as_i64(), text.parse::<i64>()) {
                (Some(a), Ok(b)) => a == b,
                _ => number
                    .as_f64()
                    .zip(text.parse::<f64>().ok())
                    .is_some_and(|(a, b)| a == b),
            }
        }
        (Value::Bool(flag), Value::String(text)) | (Value::String(text), Value::Bool(flag)) => {
            text.trim().parse::<bool>().is_ok_and(|parsed| parsed == *flag)
        }
        _ => stored == param,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DynamicModel, TranslationRecord};
    use serde_json::json;

    fn post() -> DynamicModel {
        DynamicModel::new("Post")
            .with_attribute("id", 1)
            .with_attribute("body", "Body")
            .with_translatable(&["title", "slug", "tags"])
            .with_translation(TranslationRecord::new("en").with("title", "Test en"))
            .with_translation(TranslationRecord::new("nl").with("title", "Test nl"))
    }

    // ==================== Attribute Declaration Tests ====================

    #[test]
    fn test_is_translatable_attribute_exact_match() {
        let post = post();
        assert!(post.is_translatable_attribute("title"));
        assert!(!post.is_translatable_attribute("Title"));
        assert!(!post.is_translatable_attribute("body"));
    }

    #[test]
    fn test_undeclared_translatable_is_empty() {
        let post = DynamicModel::new("Post");
        assert!(post.translatable_attributes().is_empty());
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn test_translation_model_defaults_to_active_locale() {
        let post = post();
        let ctx = LocaleContext::new("nl");
        assert_eq!(post.translation_model(&ctx, None).unwrap().language, "nl");
        assert!(post.translation_model(&ctx, Some("fr")).is_none());
    }

    #[test]
    fn test_translation_model_first_duplicate_wins() {
        let post = post().with_translation(TranslationRecord::new("en").with("title", "Second"));
        let ctx = LocaleContext::default();
        assert_eq!(post.translation(&ctx, "title", None, false), Some(json!("Test en")));
    }

    #[test]
    fn test_missing_field_is_none() {
        let post = post();
        let ctx = LocaleContext::default();
        assert_eq!(post.translation(&ctx, "slug", Some("en"), false), None);
    }

    // ==================== Fallback Tests ====================

    #[test]
    fn test_fallback_applies_once() {
        let post = post();
        let ctx = LocaleContext::new("fr").with_fallback("en");
        assert_eq!(post.translation_with_fallback(&ctx, "title", None), Some(json!("Test en")));
        assert_eq!(post.translation_without_fallback(&ctx, "title", None), None);
    }

    #[test]
    fn test_fallback_missing_too_is_empty() {
        let post = post();
        let ctx = LocaleContext::new("fr").with_fallback("de");
        assert_eq!(post.translation_with_fallback(&ctx, "title", None), None);
    }

    #[test]
    fn test_fallback_to_same_locale_is_noop() {
        let post = DynamicModel::new("Post")
            .with_translatable(&["title"])
            .with_translation(TranslationRecord::new("en").with("title", ""));
        let ctx = LocaleContext::new("en");
        assert_eq!(post.translation_with_fallback(&ctx, "title", None), Some(json!("")));
    }

    /// Host that opts out of fallback entirely.
    struct WithoutFallback(DynamicModel);

    impl Translatable for WithoutFallback {
        type Translation = TranslationRecord;

        fn class_basename(&self) -> &str {
            self.0.class_basename()
        }

        fn translatable(&self) -> &[String] {
            self.0.translatable()
        }

        fn helper_relation(&self) -> &HelperModelRelation {
            self.0.helper_relation()
        }

        fn helper_relation_mut(&mut self) -> &mut HelperModelRelation {
            self.0.helper_relation_mut()
        }

        fn related(&self, relation: &str) -> Option<&[TranslationRecord]> {
            self.0.related(relation)
        }

        fn raw_attribute(&self, key: &str) -> Option<Value> {
            self.0.raw_attribute(key)
        }

        fn fallback_locale(&self, _ctx: &LocaleContext, _locale: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_absent_fallback_locale_is_noop() {
        let post = WithoutFallback(
            post().with_translation(TranslationRecord::new("fr").with("title", "")),
        );
        let ctx = LocaleContext::new("fr").with_fallback("en");

        assert_eq!(post.translation_with_fallback(&ctx, "title", None), Some(json!("")));
        assert_eq!(post.translation_with_fallback(&ctx, "title", Some("de")), None);
        assert!(!post.has_translation(&ctx, "title", None));
    }

    #[test]
    fn test_blank_string_triggers_fallback() {
        let post = post().with_translation(TranslationRecord::new("fr").with("title", ""));
        let ctx = LocaleContext::new("fr").with_fallback("nl");
        assert_eq!(post.translation_with_fallback(&ctx, "title", None), Some(json!("Test nl")));
    }

    #[test]
    fn test_false_and_zero_do_not_trigger_fallback() {
        let post = post().with_translation(
            TranslationRecord::new("fr")
                .with("title", 0)
                .with("slug", false),
        );
        let ctx = LocaleContext::new("fr").with_fallback("en");
        assert_eq!(post.translation_with_fallback(&ctx, "title", None), Some(json!(0)));
        assert_eq!(post.translation_with_fallback(&ctx, "slug", None), Some(json!(false)));
        assert!(post.has_translation(&ctx, "title", None));
        assert!(post.has_translation(&ctx, "slug", None));
    }

    #[test]
    fn test_entity_fallback_overrides_context() {
        let post = post()
            .with_translation(TranslationRecord::new("fr").with("title", "Test fr"))
            .with_fallback_locale("fr");
        let ctx = LocaleContext::new("de").with_fallback("en");
        assert_eq!(post.translation_with_fallback(&ctx, "title", None), Some(json!("Test fr")));
    }

    // ==================== Interception Tests ====================

    #[test]
    fn test_attribute_intercepts_translatable_keys_only() {
        let post = post();
        let ctx = LocaleContext::new("nl");
        assert_eq!(post.attribute(&ctx, "title"), Some(json!("Test nl")));
        assert_eq!(post.attribute(&ctx, "body"), Some(json!("Body")));
    }

    #[test]
    fn test_attribute_never_falls_back() {
        let post = post();
        let ctx = LocaleContext::new("fr").with_fallback("en");
        assert_eq!(post.attribute(&ctx, "title"), None);
    }

    // ==================== Relation Override Tests ====================

    #[test]
    fn test_use_helper_model_relation() {
        let mut post = post().with_related(
            "secondaryTranslations",
            TranslationRecord::new("en").with("title", "Secondary en"),
        );
        let ctx = LocaleContext::default();

        let title = post
            .use_helper_model_relation("secondaryTranslations")
            .translation(&ctx, "title", Some("en"), false);
        assert_eq!(title, Some(json!("Secondary en")));

        let title = post
            .use_default_helper_model_relation()
            .translation(&ctx, "title", Some("en"), false);
        assert_eq!(title, Some(json!("Test en")));
    }

    #[test]
    fn test_unloaded_relation_has_no_translations() {
        let mut post = post();
        post.use_helper_model_relation("missing");
        assert!(!post.has_translation_model(&LocaleContext::default(), None));
    }

    // ==================== Route Binding Tests ====================

    #[test]
    fn test_route_binding_casts_text_parameters() {
        let posts = vec![
            DynamicModel::new("Post").with_attribute("id", 1).with_attribute("published", true),
            DynamicModel::new("Post").with_attribute("id", 2).with_attribute("published", false),
        ];
        let ctx = LocaleContext::default();
        let prototype = DynamicModel::new("Post");

        let bound = prototype.resolve_route_binding(&posts, &ctx, &json!("2"), None);
        assert_eq!(bound.and_then(|post| post.raw_attribute("id")), Some(json!(2)));

        let bound = prototype.resolve_route_binding(&posts, &ctx, &json!("false"), Some("published"));
        assert_eq!(bound.and_then(|post| post.raw_attribute("id")), Some(json!(2)));

        assert!(prototype.resolve_route_binding(&posts, &ctx, &json!("two"), None).is_none());
        assert!(prototype.resolve_route_binding(&posts, &ctx, &json!("3"), None).is_none());
    }

    #[test]
    fn test_route_value_eq() {
        assert!(route_value_eq(&json!(2), &json!(" 2")));
        assert!(route_value_eq(&json!(2.5), &json!("2.5")));
        assert!(route_value_eq(&json!("post"), &json!("post")));
        assert!(!route_value_eq(&json!(2), &json!("2x")));
        assert!(!route_value_eq(&json!("post"), &json!(2)));
    }

    // ==================== Relationship Wiring Tests ====================

    #[test]
    fn test_translations_relationship_by_convention() {
        let mut registry = ModelRegistry::new("app::models");
        registry.register("app::models::PostTranslation");

        let relation = post().translations(&registry).unwrap();
        assert_eq!(
            relation,
            HasMany {
                related: "app::models::PostTranslation".to_string(),
                table: "post_translations".to_string(),
                foreign_key: "post_id".to_string(),
                local_key: "id".to_string(),
            }
        );
    }

    #[test]
    fn test_translations_relationship_unresolvable() {
        let registry = ModelRegistry::new("app::nowhere");
        let error = post().translations(&registry).unwrap_err();
        assert_eq!(error.model, "PostTranslation");
    }

    // ==================== Property Tests ====================

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn undeclared_keys_read_the_stored_value(
                key in "[a-z]{1,8}",
                value in any::<i64>(),
                locale in "[a-z]{2}",
            ) {
                prop_assume!(key != "title" && key != "language");
                let post = DynamicModel::new("Post")
                    .with_translatable(&["title"])
                    .with_attribute(key.clone(), value)
                    .with_translation(TranslationRecord::new(locale.clone()).with(key.clone(), "translated"));
                let ctx = LocaleContext::new(locale);

                prop_assert_eq!(post.attribute(&ctx, &key), Some(json!(value)));
            }

            #[test]
            fn fallback_is_consulted_at_most_once(
                requested in "a[a-z]",
                fallback in "b[a-z]",
                other in "c[a-z]",
                title in "[A-Za-z ]{1,16}",
            ) {
                let post = DynamicModel::new("Post")
                    .with_translatable(&["title"])
                    .with_translation(TranslationRecord::new(other).with("title", title.clone()));
                let ctx = LocaleContext::new(requested.clone()).with_fallback(fallback.clone());
                prop_assert_eq!(post.translation_with_fallback(&ctx, "title", None), None);

                let post = post.with_translation(TranslationRecord::new(fallback).with("title", title.clone()));
                prop_assert_eq!(
                    post.translation_with_fallback(&ctx, "title", Some(&requested)),
                    Some(json!(title))
                );
            }
        }
    }
}
