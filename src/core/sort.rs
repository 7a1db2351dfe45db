//! Sort Compiler
//!
//! Sort tokens name a sortable field and an optional direction:
//! `worldName`, `worldName:asc`, `createdAt:desc`. The space separated form
//! `createdAt desc` is accepted too.

use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::descriptor::{FieldSet, FieldSource, Searchable};
use crate::core::error::ValidationError;
use crate::core::field::{FieldValue, ValueKind};
use crate::core::registry::FieldRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if raw.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// A syntactically split sort token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub direction: SortDirection,
}

impl SortClause {
    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        let malformed = || ValidationError::MalformedSort {
            token: token.to_string(),
        };

        let trimmed = token.trim();
        let (field, direction) = match trimmed.split_once(|c: char| c == ':' || c.is_whitespace())
        {
            Some((field, direction)) => {
                let direction = SortDirection::parse(direction.trim()).ok_or_else(malformed)?;
                (field.trim(), direction)
            }
            None => (trimmed, SortDirection::Asc),
        };

        if field.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

impl FromStr for SortClause {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One compiled sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    /// Wire name of the field
    pub field: &'static str,

    /// Record field the key reads
    pub source: &'static str,

    /// Kind of the field; string keys order ordinally
    pub kind: ValueKind,

    pub direction: SortDirection,
}

/// An ordered list of sort keys
///
/// An empty plan leaves source order untouched. Ties on every key also keep
/// source order, so the same query over the same data always pages the same
/// way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SortPlan {
    keys: Vec<SortKey>,
}

impl SortPlan {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compare two records key by key
    pub fn compare<E: FieldSource + ?Sized>(&self, a: &E, b: &E) -> Ordering {
        for key in &self.keys {
            let left = a.field_value(key.source).unwrap_or(FieldValue::Null);
            let right = b.field_value(key.source).unwrap_or(FieldValue::Null);
            let ordering = key.direction.apply(left.total_cmp(&right));
            if ordering.is_ne() {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable in-place sort
    pub fn sort<E: FieldSource>(&self, records: &mut [E]) {
        if !self.is_empty() {
            records.sort_by(|a, b| self.compare(a, b));
        }
    }

    /// Stable in-place sort of borrowed records
    pub fn sort_refs<E: FieldSource + ?Sized>(&self, records: &mut [&E]) {
        if !self.is_empty() {
            records.sort_by(|a, b| self.compare(*a, *b));
        }
    }
}

/// Compiles sort tokens against one resource's field table
#[derive(Debug, Clone)]
pub struct SortCompiler {
    fields: Arc<FieldSet>,
}

impl SortCompiler {
    pub fn new(fields: Arc<FieldSet>) -> Self {
        Self { fields }
    }

    pub fn for_resource<T: Searchable>() -> Self {
        Self::new(FieldRegistry::global().register::<T>())
    }

    /// Compile sort tokens in priority order
    ///
    /// When a field is named twice the first occurrence wins.
    pub fn compile<S: AsRef<str>>(&self, tokens: &[S]) -> Result<SortPlan, ValidationError> {
        let mut keys: Vec<SortKey> = Vec::with_capacity(tokens.len());
        for token in tokens {
            let clause = SortClause::parse(token.as_ref())?;
            let descriptor = self.fields.sortable(&clause.field)?;
            if keys.iter().any(|k| k.field == descriptor.name) {
                continue;
            }
            keys.push(SortKey {
                field: descriptor.name,
                source: descriptor.source,
                kind: descriptor.kind,
                direction: clause.direction,
            });
        }

        tracing::debug!(
            resource = self.fields.resource(),
            keys = keys.len(),
            "compiled sort plan"
        );
        Ok(SortPlan { keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::FieldDescriptor;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        name: Option<&'static str>,
        rank: i64,
    }

    impl FieldSource for Row {
        fn field_value(&self, source: &str) -> Option<FieldValue> {
            match source {
                "id" => Some(self.id.into()),
                "name" => Some(self.name.into()),
                "rank" => Some(self.rank.into()),
                _ => None,
            }
        }
    }

    fn compiler() -> SortCompiler {
        SortCompiler::new(Arc::new(FieldSet::new(
            "rows",
            vec![
                FieldDescriptor::new("name", "name", ValueKind::String).sortable(),
                FieldDescriptor::new("rank", "rank", ValueKind::Integer).sortable(),
                FieldDescriptor::new("id", "id", ValueKind::Integer).searchable(),
            ],
        )))
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, name: Some("b"), rank: 2 },
            Row { id: 2, name: None, rank: 1 },
            Row { id: 3, name: Some("a"), rank: 2 },
            Row { id: 4, name: Some("b"), rank: 1 },
        ]
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_clause_forms() {
        assert_eq!(
            SortClause::parse("name").unwrap(),
            SortClause { field: "name".to_string(), direction: SortDirection::Asc }
        );
        assert_eq!(SortClause::parse("name:DESC").unwrap().direction, SortDirection::Desc);
        assert_eq!(SortClause::parse("name desc").unwrap().direction, SortDirection::Desc);
        assert!(matches!(
            SortClause::parse("name:sideways"),
            Err(ValidationError::MalformedSort { .. })
        ));
        assert!(matches!(
            SortClause::parse(":desc"),
            Err(ValidationError::MalformedSort { .. })
        ));
        assert!(SortClause::parse("   ").is_err());
    }

    #[test]
    fn test_nulls_sort_first_ascending() {
        let plan = compiler().compile(&["name"]).unwrap();
        let mut data = rows();
        plan.sort(&mut data);
        assert_eq!(ids(&data), vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_multi_key_with_stable_ties() {
        let plan = compiler().compile(&["rank:desc", "name"]).unwrap();
        let mut data = rows();
        plan.sort(&mut data);
        assert_eq!(ids(&data), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_ties_keep_source_order() {
        let plan = compiler().compile(&["rank"]).unwrap();
        let mut data = rows();
        plan.sort(&mut data);
        assert_eq!(ids(&data), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_duplicate_field_first_wins() {
        let plan = compiler().compile(&["rank:desc", "RANK:asc"]).unwrap();
        assert_eq!(plan.keys().len(), 1);
        assert_eq!(plan.keys()[0].direction, SortDirection::Desc);
    }

    #[test]
    fn test_empty_plan_keeps_order() {
        let plan = compiler().compile::<&str>(&[]).unwrap();
        let mut data = rows();
        plan.sort(&mut data);
        assert_eq!(data, rows());
    }

    #[test]
    fn test_unsortable_field_rejected() {
        assert!(matches!(
            compiler().compile(&["id"]),
            Err(ValidationError::NotSortable { .. })
        ));
        assert!(matches!(
            compiler().compile(&["missing"]),
            Err(ValidationError::UnknownField { .. })
        ));
    }
}
