//! PostgreSQL rendering of translation scopes.
//!
//! Translation predicates become correlated `EXISTS` sub-selects against the
//! translation table; every value is a bound parameter. Identifiers can't be
//! bound, so they are validated instead.

use crate::error::{ConfigurationError, UsageError};
use crate::i18n::Locales;
use crate::model::{HasMany, LANGUAGE_COLUMN};
use crate::registry::ModelRegistry;
use crate::scope::{Boolean, Filter, Operator, Predicate, Query};
use crate::translatable::Translatable;
use regex::Regex;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Tables and relationships a query is rendered against.
#[derive(Debug, Clone)]
pub struct SqlSchema {
    host_table: String,
    relations: HashMap<String, HasMany>,
}

impl SqlSchema {
    pub fn new(host_table: impl Into<String>) -> Self {
        Self {
            host_table: host_table.into(),
            relations: HashMap::new(),
        }
    }

    pub fn with_relation(mut self, name: impl Into<String>, relation: HasMany) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    /// Schema for `entity`'s current translation relationship.
    pub fn for_model<E: Translatable>(
        entity: &E,
        host_table: impl Into<String>,
        registry: &ModelRegistry,
    ) -> Result<Self, ConfigurationError> {
        let relation = entity.translations(registry)?;
        Ok(Self::new(host_table).with_relation(entity.helper_relation().name(), relation))
    }

    fn relation(&self, name: &str) -> Result<&HasMany, UsageError> {
        self.relations
            .get(name)
            .ok_or_else(|| UsageError::UndefinedRelation(name.to_string()))
    }
}

/// Render `SELECT {host}.* FROM {host} WHERE ...` for `query`.
pub fn select(query: &Query, schema: &SqlSchema) -> Result<QueryBuilder<'static, Postgres>, UsageError> {
    let host = identifier(&schema.host_table)?;
    let mut builder = QueryBuilder::new(format!("SELECT {host}.* FROM {host}"));

    if !query.filter().is_empty() {
        builder.push(" WHERE ");
        push_filter(&mut builder, query.filter(), host, schema)?;
    }

    Ok(builder)
}

fn push_filter(
    builder: &mut QueryBuilder<'static, Postgres>,
    filter: &Filter,
    table: &str,
    schema: &SqlSchema,
) -> Result<(), UsageError> {
    for (i, clause) in filter.clauses().iter().enumerate() {
        if i > 0 {
            builder.push(match clause.boolean {
                Boolean::And => " AND ",
                Boolean::Or => " OR ",
            });
        }
        push_predicate(builder, &clause.predicate, table, schema)?;
    }
    Ok(())
}

fn push_predicate(
    builder: &mut QueryBuilder<'static, Postgres>,
    predicate: &Predicate,
    table: &str,
    schema: &SqlSchema,
) -> Result<(), UsageError> {
    match predicate {
        Predicate::Comparison {
            column,
            operator,
            value,
        } => {
            let column = format!("{table}.{}", identifier(column)?);
            match (operator, value) {
                (Operator::Eq, Value::Null) => {
                    builder.push(format!("{column} IS NULL"));
                }
                (Operator::NotEq, Value::Null) => {
                    builder.push(format!("{column} IS NOT NULL"));
                }
                (_, Value::Null) => {
                    builder.push("FALSE");
                }
                _ => {
                    builder.push(format!("{column} {} ", operator.as_sql()));
                    push_value(builder, value);
                }
            }
        }
        Predicate::Nested(inner) if inner.is_empty() => {
            builder.push("TRUE");
        }
        Predicate::Nested(inner) => {
            builder.push("(");
            push_filter(builder, inner, table, schema)?;
            builder.push(")");
        }
        Predicate::Locale(Locales::One(locale)) => {
            builder.push(format!("{table}.{LANGUAGE_COLUMN} = "));
            builder.push_bind(locale.clone());
        }
        Predicate::Locale(Locales::Many(locales)) if locales.is_empty() => {
            builder.push("FALSE");
        }
        Predicate::Locale(Locales::Many(locales)) => {
            builder.push(format!("{table}.{LANGUAGE_COLUMN} IN ("));
            let mut separated = builder.separated(", ");
            for locale in locales {
                separated.push_bind(locale.clone());
            }
            separated.push_unseparated(")");
        }
        Predicate::Has { relation, filter } => {
            let related = schema.relation(relation)?;
            let related_table = identifier(&related.table)?;
            builder.push(format!(
                "EXISTS (SELECT 1 FROM {related_table} WHERE {related_table}.{} = {table}.{}",
                identifier(&related.foreign_key)?,
                identifier(&related.local_key)?,
            ));
            if !filter.is_empty() {
                builder.push(" AND (");
                push_filter(builder, filter, related_table, schema)?;
                builder.push(")");
            }
            builder.push(")");
        }
    }
    Ok(())
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    match value {
        Value::String(text) => {
            builder.push_bind(text.clone());
        }
        Value::Bool(flag) => {
            builder.push_bind(*flag);
        }
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(int), _) => {
                builder.push_bind(int);
            }
            (None, Some(float)) => {
                builder.push_bind(float);
            }
            (None, None) => {
                builder.push_bind(number.to_string());
            }
        },
        other => {
            builder.push_bind(other.to_string());
        }
    }
}

fn identifier(name: &str) -> Result<&str, UsageError> {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    let pattern = IDENTIFIER
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex is valid"));

    if pattern.is_match(name) {
        Ok(name)
    } else {
        Err(UsageError::InvalidIdentifier(name.to_string()))
    }
}
