//! Errors raised by translation model wiring and scope usage.
//!
//! Missing translations are not errors: resolution returns `None` for an
//! absent record or field, and blank values (`null`, `""`, `[]`) come back
//! as they are stored. `has_translation` is the emptiness check.

use thiserror::Error;

/// No configured namespace yields a registered translation model for a host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to find helper model `{model}` in namespaces [{}]", .namespaces.join(", "))]
pub struct ConfigurationError {
    /// The guessed translation model name (e.g. `PostTranslation`)
    pub model: String,
    /// Every namespace that was probed, in probe order
    pub namespaces: Vec<String>,
}

impl ConfigurationError {
    pub fn helper_model_not_found(model: impl Into<String>, namespaces: &[String]) -> Self {
        Self {
            model: model.into(),
            namespaces: namespaces.to_vec(),
        }
    }
}

/// Misuse of the query scope surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// `locale` is deliberately not provided as a scope
    #[error("Call to undefined scope `{0}`: scopeLocale() is reserved and not provided by translatable models")]
    ReservedScope(String),

    #[error("Call to undefined scope `{0}`")]
    UndefinedScope(String),

    #[error("Invalid arguments for scope `{scope}`: {reason}")]
    InvalidArguments { scope: String, reason: String },

    #[error("Unknown comparison operator `{0}`")]
    UnknownOperator(String),

    #[error("Invalid SQL identifier `{0}`")]
    InvalidIdentifier(String),

    #[error("Call to undefined relationship `{0}`")]
    UndefinedRelation(String),
}

impl UsageError {
    pub(crate) fn invalid_arguments(scope: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            scope: scope.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Usage(#[from] UsageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
