//! Per-locale translated attributes for host entities.
//!
//! A host entity (e.g. a `Post`) keeps its translatable attributes in a
//! companion translation table with one row per locale. [`Translatable`]
//! resolves those attributes with locale fallback, [`ModelRegistry`] finds
//! the translation model for a host type, and [`Query`] filters hosts by
//! their translated content.
//!
//! ```rust
//! use helpermodel_translatable::model::{DynamicModel, TranslationRecord};
//! use helpermodel_translatable::{LocaleContext, Translatable};
//! use serde_json::json;
//!
//! let post = DynamicModel::new("Post")
//!     .with_translatable(&["title"])
//!     .with_translation(TranslationRecord::new("en").with("title", "Hello"));
//!
//! let ctx = LocaleContext::new("nl").with_fallback("en");
//! assert_eq!(post.attribute(&ctx, "title"), None);
//! assert_eq!(post.translation_with_fallback(&ctx, "title", None), Some(json!("Hello")));
//! ```

pub mod collection;
pub mod config;
pub mod error;
pub mod fixture;
pub mod i18n;
pub mod model;
pub mod registry;
pub mod scope;
pub mod sql;
pub mod translatable;

pub use error::{ConfigurationError, Error, Result, UsageError};
pub use i18n::{LocaleContext, Locales};
pub use model::{TranslationModel, TranslationRecord};
pub use registry::ModelRegistry;
pub use scope::{Filter, Operator, Query};
pub use translatable::Translatable;
