//! Query scopes over translated content.
//!
//! Scopes build an immutable predicate tree. A [`Query`] never touches
//! storage: it is either evaluated against loaded entities
//! (see `collection`) or rendered to SQL (see `sql`).

use crate::error::UsageError;
use crate::i18n::Locales;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Comparison operators accepted by `where` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
        }
    }
}

impl FromStr for Operator {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "=" | "==" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::NotEq),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "like" => Ok(Operator::Like),
            "not like" => Ok(Operator::NotLike),
            _ => Err(UsageError::UnknownOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// How a clause joins the clauses before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boolean {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column operator value` on the current row
    Comparison {
        column: String,
        operator: Operator,
        value: Value,
    },

    /// Parenthesized sub-filter
    Nested(Filter),

    /// The row's `language` column equals / is in the locales
    Locale(Locales),

    /// At least one row of `relation` satisfies `filter`
    Has { relation: String, filter: Filter },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub boolean: Boolean,
    pub predicate: Predicate,
}

/// Ordered list of clauses. AND binds tighter than OR, as in SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    fn push(mut self, boolean: Boolean, predicate: Predicate) -> Self {
        self.clauses.push(Clause { boolean, predicate });
        self
    }

    pub fn where_column(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.push(Boolean::And, comparison(column, operator, value))
    }

    pub fn or_where_column(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.push(Boolean::Or, comparison(column, operator, value))
    }

    /// Group the clauses built by `build` in parentheses.
    pub fn where_nested(self, build: impl FnOnce(Filter) -> Filter) -> Self {
        self.push(Boolean::And, Predicate::Nested(build(Filter::new())))
    }

    pub fn or_where_nested(self, build: impl FnOnce(Filter) -> Filter) -> Self {
        self.push(Boolean::Or, Predicate::Nested(build(Filter::new())))
    }

    /// Constrain the `language` column (equality for one, membership for many).
    pub fn where_locale(self, locales: impl Into<Locales>) -> Self {
        self.push(Boolean::And, Predicate::Locale(locales.into()))
    }

    pub fn or_where_locale(self, locales: impl Into<Locales>) -> Self {
        self.push(Boolean::Or, Predicate::Locale(locales.into()))
    }

    pub fn where_has(self, relation: impl Into<String>, filter: Filter) -> Self {
        self.push(
            Boolean::And,
            Predicate::Has {
                relation: relation.into(),
                filter,
            },
        )
    }

    pub fn or_where_has(self, relation: impl Into<String>, filter: Filter) -> Self {
        self.push(
            Boolean::Or,
            Predicate::Has {
                relation: relation.into(),
                filter,
            },
        )
    }
}

fn comparison(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Predicate {
    Predicate::Comparison {
        column: column.into(),
        operator,
        value: value.into(),
    }
}

/// Host-level query built from translation scopes and plain column filters.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Relationship holding translations
    relation: String,
    filter: Filter,
}

impl Query {
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            filter: Filter::new(),
        }
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    fn has(self, boolean: Boolean, translation: Filter) -> Self {
        let Query { relation, filter } = self;
        let filter = match boolean {
            Boolean::And => filter.where_has(relation.clone(), translation),
            Boolean::Or => filter.or_where_has(relation.clone(), translation),
        };
        Query { relation, filter }
    }

    /// Entities with a translation where `column operator value`.
    pub fn where_translation(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.has(
            Boolean::And,
            Filter::new().where_column(column, operator, value),
        )
    }

    /// Two-argument form: `column = value`.
    pub fn where_translation_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_translation(column, Operator::Eq, value)
    }

    /// Entities with a translation where `column operator value` in one of `locales`.
    ///
    /// The comparison and the locale must hold on the same translation record.
    pub fn where_translation_in(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
        locales: impl Into<Locales>,
    ) -> Self {
        self.has(
            Boolean::And,
            Filter::new()
                .where_column(column, operator, value)
                .where_locale(locales),
        )
    }

    /// Entities with a translation satisfying an arbitrary sub-filter.
    pub fn where_translation_with(self, build: impl FnOnce(Filter) -> Filter) -> Self {
        self.has(Boolean::And, build(Filter::new()))
    }

    pub fn or_where_translation(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.has(
            Boolean::Or,
            Filter::new().where_column(column, operator, value),
        )
    }

    pub fn or_where_translation_eq(
        self,
        column: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.or_where_translation(column, Operator::Eq, value)
    }

    pub fn or_where_translation_in(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
        locales: impl Into<Locales>,
    ) -> Self {
        self.has(
            Boolean::Or,
            Filter::new()
                .where_column(column, operator, value)
                .where_locale(locales),
        )
    }

    pub fn or_where_translation_with(self, build: impl FnOnce(Filter) -> Filter) -> Self {
        self.has(Boolean::Or, build(Filter::new()))
    }

    /// Entities translated in `locales`.
    pub fn translated_in(self, locales: impl Into<Locales>) -> Self {
        self.has(Boolean::And, Filter::new().where_locale(locales))
    }

    pub fn or_translated_in(self, locales: impl Into<Locales>) -> Self {
        self.has(Boolean::Or, Filter::new().where_locale(locales))
    }

    /// Plain filter on the host's own columns.
    pub fn where_column(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        let Query { relation, filter } = self;
        Query {
            relation,
            filter: filter.where_column(column, operator, value),
        }
    }

    pub fn or_where_column(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        let Query { relation, filter } = self;
        Query {
            relation,
            filter: filter.or_where_column(column, operator, value),
        }
    }

    /// Apply a scope by name with JSON arguments.
    ///
    /// Recognized: `whereTranslation(column, [operator,] value[, locale])`,
    /// `orWhereTranslation(...)`, `translatedIn(locale)`, `orTranslatedIn(locale)`
    /// and their snake_case spellings. `locale` is reserved and always fails.
    ///
    /// A second argument that isn't an operator is the value itself, compared
    /// with `=`; the third argument is then ignored.
    pub fn scope(self, name: &str, args: &[Value]) -> Result<Self, UsageError> {
        match name {
            "whereTranslation" | "where_translation" => {
                let (translation, locales) = translation_args(name, args)?;
                Ok(self.has(Boolean::And, with_locales(translation, locales)))
            }
            "orWhereTranslation" | "or_where_translation" => {
                let (translation, locales) = translation_args(name, args)?;
                Ok(self.has(Boolean::Or, with_locales(translation, locales)))
            }
            "translatedIn" | "translated_in" => Ok(self.translated_in(locale_arg(name, args)?)),
            "orTranslatedIn" | "or_translated_in" => {
                Ok(self.or_translated_in(locale_arg(name, args)?))
            }
            "locale" => {
                warn!("Refusing to apply reserved scope `locale`");
                Err(UsageError::ReservedScope(name.to_string()))
            }
            _ => {
                warn!("Refusing to apply undefined scope `{}`", name);
                Err(UsageError::UndefinedScope(name.to_string()))
            }
        }
    }
}

fn with_locales(filter: Filter, locales: Option<Locales>) -> Filter {
    match locales {
        Some(locales) => filter.where_locale(locales),
        None => filter,
    }
}

fn translation_args(scope: &str, args: &[Value]) -> Result<(Filter, Option<Locales>), UsageError> {
    let column = match args.first() {
        Some(Value::String(column)) => column.clone(),
        _ => return Err(UsageError::invalid_arguments(scope, "column must be a string")),
    };

    if !(2..=4).contains(&args.len()) {
        return Err(UsageError::invalid_arguments(
            scope,
            "expected 2 to 4 arguments",
        ));
    }

    let (operator, value) = match args {
        [_, value] => (Operator::Eq, value.clone()),
        [_, operator, value, ..] => match operator.as_str().map(str::parse::<Operator>) {
            Some(Ok(operator)) => (operator, value.clone()),
            // not an operator: shorthand for `column = <second argument>`
            _ => (Operator::Eq, operator.clone()),
        },
        _ => return Err(UsageError::invalid_arguments(scope, "expected 2 to 4 arguments")),
    };

    let locales = match args.get(3) {
        Some(locales) => Some(parse_locales(scope, locales)?),
        None => None,
    };

    Ok((Filter::new().where_column(column, operator, value), locales))
}

fn locale_arg(scope: &str, args: &[Value]) -> Result<Locales, UsageError> {
    match args {
        [locales] => parse_locales(scope, locales),
        _ => Err(UsageError::invalid_arguments(scope, "expected 1 argument")),
    }
}

fn parse_locales(scope: &str, value: &Value) -> Result<Locales, UsageError> {
    serde_json::from_value(value.clone()).map_err(|_| {
        UsageError::invalid_arguments(scope, "locale must be a string or a list of strings")
    })
}
