//! Internationalization (i18n) primitives shared by resolution and scopes.
//!
//! # Example
//!
//! ```rust
//! use helpermodel_translatable::i18n::{LocaleContext, Locales};
//!
//! let mut ctx = LocaleContext::new("nl").with_fallback("en");
//! ctx.set_locale("fr");
//!
//! let wanted = Locales::from(["nl", "fr"]);
//! assert!(wanted.contains(ctx.locale()));
//! ```

mod locale;

pub use locale::{LocaleContext, Locales};
