//! Field value types and per-kind value parsing

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

use crate::core::error::ValidationError;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<FixedOffset>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Total order used by sorting
    ///
    /// Values of the same kind compare naturally (strings ordinally, date
    /// times by instant). `Null` sorts before everything else. Mismatched kinds
    /// never happen for a registered field, but are ordered by kind rank so the
    /// comparator stays total.
    pub fn total_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => a.cmp(b),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => a.total_cmp(b),
            (FieldValue::Integer(a), FieldValue::Decimal(b)) => (*a as f64).total_cmp(b),
            (FieldValue::Decimal(a), FieldValue::Integer(b)) => a.total_cmp(&(*b as f64)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => a.cmp(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    /// Comparison used by range operators (`gt`, `ge`, `lt`, `le`)
    ///
    /// Returns `None` when either side is null or the kinds differ, in which
    /// case the range predicate does not match.
    pub fn partial_cmp_value(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Null, _) | (_, FieldValue::Null) => None,
            (a, b) if a.rank() == b.rank() || (a.is_numeric() && b.is_numeric()) => {
                Some(a.total_cmp(b))
            }
            _ => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, FieldValue::Integer(_) | FieldValue::Decimal(_))
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Boolean(_) => 1,
            FieldValue::Integer(_) | FieldValue::Decimal(_) => 2,
            FieldValue::DateTime(_) => 3,
            FieldValue::Uuid(_) => 4,
            FieldValue::String(_) => 5,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        FieldValue::DateTime(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// The kind of value a searchable field holds
///
/// The kind selects both the parser applied to raw filter values and the set
/// of operators the field supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    String,
    Integer,
    Decimal,
    Boolean,
    DateTimeOffset,
    Uuid,
}

impl ValueKind {
    /// Parse a raw filter value into this kind's native representation
    ///
    /// Parsing is strict: surrounding whitespace is the only thing tolerated.
    /// Date times must carry an explicit offset; a timestamp without one is
    /// ambiguous and rejected.
    pub fn parse(self, field: &str, raw: &str) -> Result<FieldValue, ValidationError> {
        let trimmed = raw.trim();
        let invalid = || ValidationError::InvalidValue {
            field: field.to_string(),
            kind: self.to_string(),
            value: raw.to_string(),
        };

        match self {
            ValueKind::String => Ok(FieldValue::String(trimmed.to_string())),
            ValueKind::Integer => trimmed
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| invalid()),
            ValueKind::Decimal => match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(FieldValue::Decimal(n)),
                _ => Err(invalid()),
            },
            ValueKind::Boolean => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(FieldValue::Boolean(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(FieldValue::Boolean(false))
                } else {
                    Err(invalid())
                }
            }
            ValueKind::DateTimeOffset => DateTime::parse_from_rfc3339(trimmed)
                .map(FieldValue::DateTime)
                .map_err(|_| invalid()),
            ValueKind::Uuid => Uuid::parse_str(trimmed)
                .map(FieldValue::Uuid)
                .map_err(|_| invalid()),
        }
    }

    /// Form field type advertised to clients
    pub fn form_type(self) -> &'static str {
        match self {
            ValueKind::String | ValueKind::Uuid => "string",
            ValueKind::Integer => "integer",
            ValueKind::Decimal => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::DateTimeOffset => "datetime",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Decimal => "decimal",
            ValueKind::Boolean => "boolean",
            ValueKind::DateTimeOffset => "date-time",
            ValueKind::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_string() {
        let value = FieldValue::String("test".to_string());
        assert_eq!(value.as_string(), Some("test"));
        assert_eq!(value.as_integer(), None);
        assert!(!value.is_null());
    }

    #[test]
    fn test_field_value_from_option() {
        let none: Option<i64> = None;
        assert!(FieldValue::from(none).is_null());
        assert_eq!(FieldValue::from(Some(4_i64)), FieldValue::Integer(4));
    }

    #[test]
    fn test_parse_string_passes_through() {
        let value = ValueKind::String.parse("tenantName", " WASHINGTON ").unwrap();
        assert_eq!(value, FieldValue::String("WASHINGTON".to_string()));
    }

    #[test]
    fn test_parse_integer_is_strict() {
        assert_eq!(
            ValueKind::Integer.parse("age", "42").unwrap(),
            FieldValue::Integer(42)
        );
        assert!(ValueKind::Integer.parse("age", "42abc").is_err());
        assert!(ValueKind::Integer.parse("age", "4.2").is_err());
        assert!(ValueKind::Integer.parse("age", "").is_err());
    }

    #[test]
    fn test_parse_decimal_rejects_non_finite() {
        assert_eq!(
            ValueKind::Decimal.parse("score", "2.5").unwrap(),
            FieldValue::Decimal(2.5)
        );
        assert!(ValueKind::Decimal.parse("score", "NaN").is_err());
        assert!(ValueKind::Decimal.parse("score", "inf").is_err());
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(
            ValueKind::Boolean.parse("active", "TRUE").unwrap(),
            FieldValue::Boolean(true)
        );
        assert_eq!(
            ValueKind::Boolean.parse("active", "false").unwrap(),
            FieldValue::Boolean(false)
        );
        assert!(ValueKind::Boolean.parse("active", "yes").is_err());
        assert!(ValueKind::Boolean.parse("active", "1").is_err());
    }

    #[test]
    fn test_parse_datetime_requires_offset() {
        let parsed = ValueKind::DateTimeOffset
            .parse("createdAt", "2024-03-01T10:00:00+02:00")
            .unwrap();
        assert!(matches!(parsed, FieldValue::DateTime(_)));

        let err = ValueKind::DateTimeOffset
            .parse("createdAt", "2024-03-01T10:00:00")
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidValue {
                field: "createdAt".to_string(),
                kind: "date-time".to_string(),
                value: "2024-03-01T10:00:00".to_string(),
            }
        );
        assert!(ValueKind::DateTimeOffset.parse("createdAt", "03/01/2024").is_err());
    }

    #[test]
    fn test_parse_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(
            ValueKind::Uuid.parse("id", &id.to_string()).unwrap(),
            FieldValue::Uuid(id)
        );
        assert!(ValueKind::Uuid.parse("id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_total_cmp_orders_nulls_first() {
        let null = FieldValue::Null;
        let name = FieldValue::from("ADAMS");
        assert_eq!(null.total_cmp(&name), Ordering::Less);
        assert_eq!(name.total_cmp(&null), Ordering::Greater);
    }

    #[test]
    fn test_datetime_compares_by_instant() {
        let a = ValueKind::DateTimeOffset
            .parse("t", "2024-03-01T10:00:00+02:00")
            .unwrap();
        let b = ValueKind::DateTimeOffset
            .parse("t", "2024-03-01T08:00:00Z")
            .unwrap();
        assert_eq!(a.total_cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_range_comparison_skips_nulls_and_mismatches() {
        let five = FieldValue::Integer(5);
        assert_eq!(five.partial_cmp_value(&FieldValue::Null), None);
        assert_eq!(five.partial_cmp_value(&FieldValue::from("5")), None);
        assert_eq!(
            five.partial_cmp_value(&FieldValue::Decimal(4.5)),
            Some(Ordering::Greater)
        );
    }
}
