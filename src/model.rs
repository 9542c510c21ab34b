//! Host entity and translation record building blocks.
//!
//! The persistence layer owns loading; everything here only reads records
//! that are already materialized in memory.

use crate::error::ConfigurationError;
use crate::i18n::LocaleContext;
use crate::registry::ModelRegistry;
use crate::translatable::Translatable;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Column holding a translation record's locale code.
pub const LANGUAGE_COLUMN: &str = "language";

/// Relationship that holds translations unless an instance overrides it.
pub const DEFAULT_HELPER_MODEL_RELATION: &str = "translations";

/// Emptiness rule shared by fallback and `has_translation`.
///
/// `null`, `""`, `[]` and `{}` are blank. `false` and `0` are real values.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// One locale's values for a host entity.
///
/// Implementations may transform field values on read (accessors); resolution
/// always goes through `attribute`.
pub trait TranslationModel {
    /// Locale code of this record (e.g. "en", "nl")
    fn language(&self) -> &str;

    /// Read a translated field. `None` when the field doesn't exist.
    fn attribute(&self, key: &str) -> Option<Value>;
}

/// Schema-less translation record: a locale plus arbitrary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub language: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TranslationRecord {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            id: None,
            language: language.into(),
            fields: Map::new(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set a translated field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

impl TranslationModel for TranslationRecord {
    fn language(&self) -> &str {
        &self.language
    }

    fn attribute(&self, key: &str) -> Option<Value> {
        if key == LANGUAGE_COLUMN {
            return Some(Value::String(self.language.clone()));
        }
        self.fields.get(key).cloned()
    }
}

/// Per-instance name of the relationship holding translations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperModelRelation(Cow<'static, str>);

impl HelperModelRelation {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn set(&mut self, relation: impl Into<Cow<'static, str>>) {
        self.0 = relation.into();
    }

    pub fn reset(&mut self) {
        self.0 = Cow::Borrowed(DEFAULT_HELPER_MODEL_RELATION);
    }
}

impl Default for HelperModelRelation {
    fn default() -> Self {
        Self(Cow::Borrowed(DEFAULT_HELPER_MODEL_RELATION))
    }
}

/// One-to-many relationship descriptor handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HasMany {
    /// Fully qualified translation model path (e.g. `app::models::PostTranslation`)
    pub related: String,
    /// Table backing the translation model (e.g. `post_translations`)
    pub table: String,
    /// Column on the translation table referencing the host (e.g. `post_id`)
    pub foreign_key: String,
    /// Column on the host table the foreign key references
    pub local_key: String,
}

/// Last segment of a `::` separated type path.
pub fn class_basename(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// `PostTranslation` -> `post_translation`
pub fn snake_case(name: &str) -> String {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    let boundary =
        BOUNDARY.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static regex is valid"));

    boundary.replace_all(name, "${1}_${2}").to_lowercase()
}

/// Conventional foreign key for a host type: `BlogPost` -> `blog_post_id`.
pub fn foreign_key_for(host: &str) -> String {
    format!("{}_id", snake_case(class_basename(host)))
}

/// Conventional table for a model type: `PostTranslation` -> `post_translations`.
pub fn table_for(model: &str) -> String {
    format!("{}s", snake_case(class_basename(model)))
}

/// Host entity whose schema is only known at runtime (fixtures, tooling).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicModel {
    /// Simple type name of the host (e.g. "Post")
    pub class: String,

    #[serde(default)]
    pub attributes: Map<String, Value>,

    #[serde(default)]
    pub translatable: Vec<String>,

    /// Loaded one-to-many collections keyed by relationship name
    #[serde(default)]
    pub relations: BTreeMap<String, Vec<TranslationRecord>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_key: Option<String>,

    /// Fallback locale overriding the context's one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_locale: Option<String>,

    /// Explicit translation model path, bypassing namespace search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helper_model: Option<String>,

    /// Explicit foreign key, bypassing the naming convention
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,

    #[serde(skip)]
    relation: HelperModelRelation,
}

impl DynamicModel {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_translatable(mut self, attributes: &[&str]) -> Self {
        self.translatable = attributes.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Attach a record to the default `translations` relationship.
    pub fn with_translation(self, record: TranslationRecord) -> Self {
        self.with_related(DEFAULT_HELPER_MODEL_RELATION, record)
    }

    pub fn with_related(mut self, relation: &str, record: TranslationRecord) -> Self {
        self.relations
            .entry(relation.to_string())
            .or_default()
            .push(record);
        self
    }

    pub fn with_fallback_locale(mut self, locale: impl Into<String>) -> Self {
        self.fallback_locale = Some(locale.into());
        self
    }
}

impl Translatable for DynamicModel {
    type Translation = TranslationRecord;

    fn class_basename(&self) -> &str {
        class_basename(&self.class)
    }

    fn translatable(&self) -> &[String] {
        &self.translatable
    }

    fn helper_relation(&self) -> &HelperModelRelation {
        &self.relation
    }

    fn helper_relation_mut(&mut self) -> &mut HelperModelRelation {
        &mut self.relation
    }

    fn related(&self, relation: &str) -> Option<&[TranslationRecord]> {
        self.relations.get(relation).map(Vec::as_slice)
    }

    fn raw_attribute(&self, key: &str) -> Option<Value> {
        self.attributes.get(key).cloned()
    }

    fn route_key_name(&self) -> &str {
        self.route_key.as_deref().unwrap_or("id")
    }

    fn fallback_locale(&self, ctx: &LocaleContext, locale: &str) -> Option<String> {
        match &self.fallback_locale {
            Some(fallback) => Some(fallback.clone()),
            None => Some(ctx.fallback_locale().unwrap_or(locale).to_string()),
        }
    }

    fn helper_model_class(&self, registry: &ModelRegistry) -> Result<String, ConfigurationError> {
        match &self.helper_model {
            Some(path) => Ok(path.clone()),
            None => registry.resolve(self.class_basename()),
        }
    }

    fn helper_model_foreign_key(&self) -> String {
        self.foreign_key
            .clone()
            .unwrap_or_else(|| foreign_key_for(&self.class))
    }
}
