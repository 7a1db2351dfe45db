//! Process-wide Field Metadata Registry
//!
//! Field tables are computed lazily on first use and then shared read-only.
//! Each resource type gets its own `OnceLock`, so concurrent first requests
//! for the same type run the declaration exactly once; the losers of the
//! race block on the winner and see the fully built table.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::TypeId;
use std::sync::{Arc, OnceLock};

use crate::core::descriptor::{FieldDescriptor, FieldSet, Searchable};
use crate::core::error::ValidationError;

/// Registry of field tables keyed by resource type
#[derive(Default)]
pub struct FieldRegistry {
    by_type: DashMap<TypeId, Arc<OnceLock<Arc<FieldSet>>>>,
    by_name: DashMap<&'static str, Arc<FieldSet>>,
}

impl FieldRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by the whole process
    pub fn global() -> &'static FieldRegistry {
        static GLOBAL: OnceLock<FieldRegistry> = OnceLock::new();
        GLOBAL.get_or_init(FieldRegistry::new)
    }

    /// Register a resource type, returning its field table
    ///
    /// Idempotent: every call after the first returns the same table. When two
    /// types share a resource name, name-based lookup keeps answering for the
    /// one registered first.
    pub fn register<T: Searchable>(&self) -> Arc<FieldSet> {
        // Clone the cell out so the map shard is not held while declaring.
        let cell = self.by_type.entry(TypeId::of::<T>()).or_default().clone();

        cell.get_or_init(|| {
            let set = Arc::new(FieldSet::new(T::resource_name(), T::field_descriptors()));
            tracing::debug!(
                resource = set.resource(),
                fields = set.fields().len(),
                "registered field metadata"
            );
            // first registration of a name wins
            match self.by_name.entry(set.resource()) {
                Entry::Occupied(_) => tracing::warn!(
                    resource = set.resource(),
                    type_name = std::any::type_name::<T>(),
                    "resource name already registered by another type, lookup by name keeps the first"
                ),
                Entry::Vacant(slot) => {
                    slot.insert(set.clone());
                }
            }
            set
        })
        .clone()
    }

    /// Whether a resource type has been registered
    pub fn is_registered<T: Searchable>(&self) -> bool {
        self.by_type
            .get(&TypeId::of::<T>())
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Look up one field of a resource type, registering the type if needed
    pub fn lookup<T: Searchable>(&self, field: &str) -> Result<FieldDescriptor, ValidationError> {
        self.register::<T>().lookup(field).cloned()
    }

    /// Field table of an already registered resource, by resource name
    pub fn field_set_by_name(&self, resource: &str) -> Result<Arc<FieldSet>, ValidationError> {
        self.by_name
            .get(resource)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ValidationError::UnknownResourceType {
                resource: resource.to_string(),
            })
    }

    /// Look up one field of an already registered resource, by resource name
    pub fn lookup_by_name(
        &self,
        resource: &str,
        field: &str,
    ) -> Result<FieldDescriptor, ValidationError> {
        self.field_set_by_name(resource)?.lookup(field).cloned()
    }

    /// Names of all registered resources, sorted
    pub fn resources(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.by_name.iter().map(|entry| *entry.key()).collect();
        names.sort_unstable();
        names
    }
}
