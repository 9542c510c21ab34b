//! In-memory evaluation of scopes against loaded host entities.
//!
//! Clauses combine with SQL precedence (AND before OR), so a query selects
//! the same entities here as its rendered SQL would in the database.

use crate::i18n::Locales;
use crate::model::{TranslationModel, LANGUAGE_COLUMN};
use crate::scope::{Boolean, Filter, Operator, Predicate, Query};
use crate::translatable::Translatable;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

impl Query {
    /// Check whether `entity` satisfies this query.
    pub fn matches<E: Translatable>(&self, entity: &E) -> bool {
        Compiled::new(self.filter()).matches_host(entity)
    }

    /// Every matching entity, in input order.
    pub fn get<'a, E: Translatable>(&self, entities: &'a [E]) -> Vec<&'a E> {
        let compiled = Compiled::new(self.filter());
        entities
            .iter()
            .filter(|entity| compiled.matches_host(*entity))
            .collect()
    }

    /// First matching entity.
    pub fn first<'a, E: Translatable>(&self, entities: &'a [E]) -> Option<&'a E> {
        let compiled = Compiled::new(self.filter());
        entities.iter().find(|entity| compiled.matches_host(*entity))
    }
}

/// A filter with its `LIKE` patterns compiled up front.
struct Compiled<'q> {
    clauses: Vec<(Boolean, Check<'q>)>,
}

enum Check<'q> {
    Comparison {
        column: &'q str,
        operator: Operator,
        value: &'q Value,
        /// Set for `LIKE` / `NOT LIKE` with a text pattern
        pattern: Option<Regex>,
    },
    Nested(Compiled<'q>),
    Locale(&'q Locales),
    Has {
        relation: &'q str,
        filter: Compiled<'q>,
    },
}

impl<'q> Compiled<'q> {
    fn new(filter: &'q Filter) -> Self {
        let clauses = filter
            .clauses()
            .iter()
            .map(|clause| (clause.boolean, Check::new(&clause.predicate)))
            .collect();
        Self { clauses }
    }

    fn matches_host<E: Translatable>(&self, entity: &E) -> bool {
        self.eval(|check| match check {
            Check::Comparison {
                column,
                operator,
                value,
                pattern,
            } => compare(
                entity.raw_attribute(column).as_ref(),
                *operator,
                value,
                pattern.as_ref(),
            ),
            Check::Nested(inner) => inner.matches_host(entity),
            Check::Locale(locales) => entity
                .raw_attribute(LANGUAGE_COLUMN)
                .as_ref()
                .and_then(Value::as_str)
                .is_some_and(|language| locales.contains(language)),
            Check::Has { relation, filter } => entity
                .related(relation)
                .is_some_and(|rows| rows.iter().any(|row| filter.matches_translation(row))),
        })
    }

    fn matches_translation<T: TranslationModel>(&self, row: &T) -> bool {
        self.eval(|check| match check {
            Check::Comparison {
                column,
                operator,
                value,
                pattern,
            } => compare(
                row.attribute(column).as_ref(),
                *operator,
                value,
                pattern.as_ref(),
            ),
            Check::Nested(inner) => inner.matches_translation(row),
            Check::Locale(locales) => locales.contains(row.language()),
            // translation records carry no relationships of their own
            Check::Has { .. } => false,
        })
    }

    /// Fold clauses with AND binding tighter than OR. An empty filter matches.
    fn eval(&self, mut test: impl FnMut(&Check<'q>) -> bool) -> bool {
        let mut any = false;
        let mut current = true;

        for (i, (boolean, check)) in self.clauses.iter().enumerate() {
            if i > 0 && *boolean == Boolean::Or {
                any |= current;
                current = true;
            }
            // short-circuit like SQL would, but keep walking for later OR groups
            if current {
                current = test(check);
            }
        }

        any || current
    }
}

impl<'q> Check<'q> {
    fn new(predicate: &'q Predicate) -> Self {
        match predicate {
            Predicate::Comparison {
                column,
                operator,
                value,
            } => {
                let pattern = match operator {
                    Operator::Like | Operator::NotLike => value.as_str().and_then(like_regex),
                    _ => None,
                };
                Check::Comparison {
                    column: column.as_str(),
                    operator: *operator,
                    value,
                    pattern,
                }
            }
            Predicate::Nested(inner) => Check::Nested(Compiled::new(inner)),
            Predicate::Locale(locales) => Check::Locale(locales),
            Predicate::Has { relation, filter } => Check::Has {
                relation: relation.as_str(),
                filter: Compiled::new(filter),
            },
        }
    }
}

/// Compare a row value against a scope value with SQL-like semantics.
///
/// `= null` and `<> null` test for (non-)nullness; any other comparison with
/// a missing or null row value is false. `LIKE` operators match `pattern`,
/// the compiled form of `expected`.
fn compare(
    actual: Option<&Value>,
    operator: Operator,
    expected: &Value,
    pattern: Option<&Regex>,
) -> bool {
    let actual = actual.filter(|value| !value.is_null());

    if expected.is_null() {
        return match operator {
            Operator::Eq => actual.is_none(),
            Operator::NotEq => actual.is_some(),
            _ => false,
        };
    }

    let Some(actual) = actual else {
        return false;
    };

    match operator {
        Operator::Like | Operator::NotLike => match (actual.as_str(), pattern) {
            (Some(text), Some(pattern)) => pattern.is_match(text) == (operator == Operator::Like),
            _ => false,
        },
        Operator::Eq => ordering(actual, expected) == Some(Ordering::Equal),
        Operator::NotEq => ordering(actual, expected) != Some(Ordering::Equal),
        Operator::Lt => ordering(actual, expected) == Some(Ordering::Less),
        Operator::Lte => matches!(
            ordering(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Gt => ordering(actual, expected) == Some(Ordering::Greater),
        Operator::Gte => matches!(
            ordering(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

fn ordering(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                return Some(a.cmp(&b));
            }
            if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                return Some(a.cmp(&b));
            }
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (a, b) if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

/// SQL `LIKE` pattern as an anchored regex.
///
/// `%` matches any run, `_` one character and a backslash makes the next
/// character literal (the PostgreSQL default escape). Case-sensitive.
fn like_regex(pattern: &str) -> Option<Regex> {
    let mut expression = String::from("(?s)^");
    let mut chars = pattern.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '%' => expression.push_str(".*"),
            '_' => expression.push('.'),
            '\\' => {
                let literal = chars.next().unwrap_or('\\');
                expression.push_str(&regex::escape(&literal.to_string()));
            }
            other => expression.push_str(&regex::escape(&other.to_string())),
        }
    }
    expression.push('$');

    Regex::new(&expression).ok()
}
