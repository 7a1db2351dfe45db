//! Search Expression Compiler
//!
//! Turns raw `filter` tokens of the form `field operator value` into a typed
//! [`Filter`] that can be evaluated against records in memory or pushed down
//! to a database by [`crate::storage::sql`].
//!
//! # Grammar
//! ```text
//! filter=tenantName eq ADAMS
//! filter=createdAt gte 2024-01-01T00:00:00Z
//! filter=worldName co north   (value may contain spaces: "north east")
//! ```
//! The first whitespace-separated token is the field, the second the operator
//! and everything after it the value.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::descriptor::{FieldDescriptor, FieldSet, FieldSource, Searchable};
use crate::core::error::ValidationError;
use crate::core::field::{FieldValue, ValueKind};
use crate::core::registry::FieldRegistry;

/// Comparison operator of a filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    StartsWith,
}

const STRING_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::Contains,
    Operator::StartsWith,
];

const ORDERED_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::Gt,
    Operator::Ge,
    Operator::Lt,
    Operator::Le,
];

const EQUALITY_OPERATORS: &[Operator] = &[Operator::Eq, Operator::Ne];

impl Operator {
    /// Parse an operator name, accepting the short aliases
    ///
    /// Matching is case-insensitive: `eq`, `ne`, `gt`, `ge`/`gte`, `lt`,
    /// `le`/`lte`, `contains`/`co`, `startsWith`/`sw`.
    pub fn parse(raw: &str) -> Option<Self> {
        let op = match raw.to_ascii_lowercase().as_str() {
            "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            "gt" => Operator::Gt,
            "ge" | "gte" => Operator::Ge,
            "lt" => Operator::Lt,
            "le" | "lte" => Operator::Le,
            "contains" | "co" => Operator::Contains,
            "startswith" | "sw" => Operator::StartsWith,
            _ => return None,
        };
        Some(op)
    }

    /// Canonical name
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
        }
    }

    /// Operator set of a value kind
    pub fn supported_by(kind: ValueKind) -> &'static [Operator] {
        match kind {
            ValueKind::String => STRING_OPERATORS,
            ValueKind::Integer | ValueKind::Decimal | ValueKind::DateTimeOffset => {
                ORDERED_OPERATORS
            }
            ValueKind::Boolean | ValueKind::Uuid => EQUALITY_OPERATORS,
        }
    }

    /// Whether a value kind accepts this operator
    pub fn is_supported_by(self, kind: ValueKind) -> bool {
        Self::supported_by(kind).contains(&self)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A syntactically split filter token, not yet checked against any field table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl FilterClause {
    /// Split a raw `field operator value` token
    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        let malformed = || ValidationError::MalformedFilter {
            token: token.to_string(),
        };

        let rest = token.trim_start();
        let (field, rest) = rest.split_once(char::is_whitespace).ok_or_else(malformed)?;
        let rest = rest.trim_start();
        let (operator, value) = rest.split_once(char::is_whitespace).ok_or_else(malformed)?;
        let value = value.trim();

        if value.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        })
    }
}

impl FromStr for FilterClause {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One compiled predicate: a field, an operator and a typed value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    /// Wire name of the field
    pub field: &'static str,

    /// Record field the predicate reads
    pub source: &'static str,

    pub kind: ValueKind,
    pub operator: Operator,
    pub value: FieldValue,
}

impl Condition {
    /// Build a condition, checking the operator against the field's kind
    pub fn new(
        descriptor: &FieldDescriptor,
        operator: Operator,
        value: FieldValue,
    ) -> Result<Self, ValidationError> {
        if !operator.is_supported_by(descriptor.kind) {
            return Err(ValidationError::UnsupportedOperator {
                field: descriptor.name.to_string(),
                operator: operator.to_string(),
                kind: descriptor.kind.to_string(),
            });
        }

        let value = match value {
            FieldValue::String(s) if descriptor.kind == ValueKind::String => {
                FieldValue::String(s.to_lowercase())
            }
            other => other,
        };

        Ok(Self {
            field: descriptor.name,
            source: descriptor.source,
            kind: descriptor.kind,
            operator,
            value,
        })
    }

    /// Evaluate against a record
    ///
    /// A missing or null record value never matches.
    pub fn matches<E: FieldSource + ?Sized>(&self, record: &E) -> bool {
        match record.field_value(self.source) {
            None | Some(FieldValue::Null) => false,
            Some(actual) => self.test(&actual),
        }
    }

    fn test(&self, actual: &FieldValue) -> bool {
        if let (FieldValue::String(actual), FieldValue::String(expected)) = (actual, &self.value) {
            let actual = actual.to_lowercase();
            return match self.operator {
                Operator::Eq => actual == *expected,
                Operator::Ne => actual != *expected,
                Operator::Contains => actual.contains(expected.as_str()),
                Operator::StartsWith => actual.starts_with(expected.as_str()),
                _ => false,
            };
        }

        let Some(ordering) = actual.partial_cmp_value(&self.value) else {
            return false;
        };
        match self.operator {
            Operator::Eq => ordering.is_eq(),
            Operator::Ne => ordering.is_ne(),
            Operator::Gt => ordering.is_gt(),
            Operator::Ge => ordering.is_ge(),
            Operator::Lt => ordering.is_lt(),
            Operator::Le => ordering.is_le(),
            Operator::Contains | Operator::StartsWith => false,
        }
    }
}

/// A conjunction of compiled conditions
///
/// An empty filter accepts every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Filter that accepts everything
    pub fn accept_all() -> Self {
        Self::default()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether every condition holds for the record
    pub fn matches<E: FieldSource + ?Sized>(&self, record: &E) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// Conjunction of two filters
    pub fn and(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }
}

/// Compiles filter tokens against one resource's field table
#[derive(Debug, Clone)]
pub struct SearchCompiler {
    fields: Arc<FieldSet>,
}

impl SearchCompiler {
    pub fn new(fields: Arc<FieldSet>) -> Self {
        Self { fields }
    }

    /// Compiler for a resource type, using the global registry
    pub fn for_resource<T: Searchable>() -> Self {
        Self::new(FieldRegistry::global().register::<T>())
    }

    /// Compile a set of filter tokens
    ///
    /// The first invalid token aborts compilation; no partial filter is
    /// returned.
    pub fn compile<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Filter, ValidationError> {
        let conditions = tokens
            .iter()
            .map(|token| {
                let clause = FilterClause::parse(token.as_ref())?;
                self.compile_clause(&clause)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            resource = self.fields.resource(),
            conditions = conditions.len(),
            "compiled search filter"
        );
        Ok(Filter { conditions })
    }

    /// Compile one already split clause
    pub fn compile_clause(&self, clause: &FilterClause) -> Result<Condition, ValidationError> {
        let descriptor = self.fields.searchable(&clause.field)?;
        let operator =
            Operator::parse(&clause.operator).ok_or_else(|| ValidationError::UnsupportedOperator {
                field: descriptor.name.to_string(),
                operator: clause.operator.clone(),
                kind: descriptor.kind.to_string(),
            })?;
        let value = descriptor.kind.parse(descriptor.name, &clause.value)?;
        Condition::new(descriptor, operator, value)
    }
}
