//! Declarative per-field metadata for output resources
//!
//! An output resource declares, once, which of its wire fields can be
//! filtered and sorted, which field of the underlying record each one reads,
//! and what kind of value it holds. The compilers in [`crate::core::search`]
//! and [`crate::core::sort`] work entirely from these tables, so no resource
//! needs hand-written query logic.

use serde::Serialize;

use crate::core::error::ValidationError;
use crate::core::field::{FieldValue, ValueKind};
use crate::core::search::Operator;

/// Metadata describing one queryable attribute of an output resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Name of the field on the wire (e.g. "tenantName")
    pub name: &'static str,

    /// Name of the field on the underlying record (e.g. "tenant_name")
    ///
    /// Used both by [`FieldSource::field_value`] for in-memory evaluation and
    /// as the column name when a plan is pushed down to a database.
    pub source: &'static str,

    /// Kind of value, selects parser and operator set
    pub kind: ValueKind,

    /// Whether filter clauses may reference this field
    pub searchable: bool,

    /// Whether sort clauses may reference this field
    pub sortable: bool,
}

impl FieldDescriptor {
    /// Declare a field that is neither searchable nor sortable yet
    pub const fn new(name: &'static str, source: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            source,
            kind,
            searchable: false,
            sortable: false,
        }
    }

    /// Allow filtering on this field
    pub const fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Allow sorting on this field
    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Operators this field accepts
    pub fn operators(&self) -> &'static [Operator] {
        Operator::supported_by(self.kind)
    }
}

/// The complete, immutable field table of one resource type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSet {
    resource: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl FieldSet {
    /// Build a field table
    ///
    /// When two descriptors share a wire name the first declaration wins.
    pub fn new(resource: &'static str, declared: Vec<FieldDescriptor>) -> Self {
        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(declared.len());
        for descriptor in declared {
            if fields
                .iter()
                .any(|f| f.name.eq_ignore_ascii_case(descriptor.name))
            {
                tracing::warn!(
                    resource,
                    field = descriptor.name,
                    "duplicate field declaration ignored"
                );
                continue;
            }
            fields.push(descriptor);
        }
        Self { resource, fields }
    }

    /// Resource name this table belongs to
    pub fn resource(&self) -> &'static str {
        self.resource
    }

    /// All declared fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by wire name (ASCII case-insensitive)
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Look up a field, reporting unknown names
    pub fn lookup(&self, name: &str) -> Result<&FieldDescriptor, ValidationError> {
        self.get(name).ok_or_else(|| ValidationError::UnknownField {
            resource: self.resource.to_string(),
            field: name.to_string(),
        })
    }

    /// Look up a field that filter clauses may reference
    pub fn searchable(&self, name: &str) -> Result<&FieldDescriptor, ValidationError> {
        let descriptor = self.lookup(name)?;
        if !descriptor.searchable {
            return Err(ValidationError::NotSearchable {
                resource: self.resource.to_string(),
                field: descriptor.name.to_string(),
            });
        }
        Ok(descriptor)
    }

    /// Look up a field that sort clauses may reference
    pub fn sortable(&self, name: &str) -> Result<&FieldDescriptor, ValidationError> {
        let descriptor = self.lookup(name)?;
        if !descriptor.sortable {
            return Err(ValidationError::NotSortable {
                resource: self.resource.to_string(),
                field: descriptor.name.to_string(),
            });
        }
        Ok(descriptor)
    }

    /// Iterator over searchable fields
    pub fn searchable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.searchable)
    }

    /// Iterator over sortable fields
    pub fn sortable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.sortable)
    }
}

/// An output resource type that exposes searchable/sortable fields
///
/// Usually implemented through [`impl_searchable!`](crate::impl_searchable).
///
/// # Example
/// ```rust,ignore
/// impl Searchable for WorldRest {
///     fn resource_name() -> &'static str {
///         "worlds"
///     }
///
///     fn field_descriptors() -> Vec<FieldDescriptor> {
///         vec![
///             FieldDescriptor::new("tenantName", "tenant_name", ValueKind::String)
///                 .searchable()
///                 .sortable(),
///         ]
///     }
/// }
/// ```
pub trait Searchable: 'static {
    /// Resource name used in errors and for name-based lookup
    fn resource_name() -> &'static str;

    /// Declare the field table
    ///
    /// Called at most once per process by the
    /// [`FieldRegistry`](crate::core::registry::FieldRegistry).
    fn field_descriptors() -> Vec<FieldDescriptor>;
}

/// An underlying record that compiled plans can be evaluated against
pub trait FieldSource {
    /// Read the value of a record field by its source name
    ///
    /// Returns `None` for unknown fields.
    fn field_value(&self, source: &str) -> Option<FieldValue>;
}
