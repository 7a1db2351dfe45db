//! Late-bound hypermedia links
//!
//! A [`Link`] is created while building a resource and only names an
//! endpoint plus its parameters. It becomes an absolute or root-relative
//! `href` when a [`LinkResolver`](crate::links::resolver::LinkResolver) walks
//! the finished resource just before it is written out.

use axum::http::Method;
use indexmap::IndexMap;
use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};

use crate::core::error::ResolutionError;
use crate::core::etag;

/// Well-known link relations
pub mod relation {
    pub const COLLECTION: &str = "collection";
    pub const FORM: &str = "form";
    pub const CREATE_FORM: &str = "create-form";
    pub const EDIT_FORM: &str = "edit-form";
    pub const QUERY_FORM: &str = "query-form";
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Unresolved {
        endpoint: String,
        params: IndexMap<String, String>,
    },
    Resolved {
        endpoint: String,
        href: String,
    },
}

/// A link to a named endpoint
///
/// Serializes as `{"href": ..., "method": ..., "rel": [...]}` once resolved.
/// `method` is omitted for GET and `rel` when empty. Serializing an
/// unresolved link fails, except while an entity tag is computed, where it
/// contributes an empty object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    target: Target,
    method: Method,
    relations: Vec<String>,
}

impl Link {
    /// GET link to an endpoint
    pub fn to(endpoint: impl Into<String>) -> Self {
        Self {
            target: Target::Unresolved {
                endpoint: endpoint.into(),
                params: IndexMap::new(),
            },
            method: Method::GET,
            relations: Vec::new(),
        }
    }

    /// GET link to a collection endpoint, tagged with the `collection` relation
    pub fn to_collection(endpoint: impl Into<String>) -> Self {
        Self::to(endpoint).with_relation(relation::COLLECTION)
    }

    /// Link describing where and how a form is submitted
    pub fn to_form(endpoint: impl Into<String>, method: Method, relation: &str) -> Self {
        Self::to(endpoint)
            .with_method(method)
            .with_relation(relation)
    }

    /// Set a route parameter
    ///
    /// Parameters the route template does not consume end up in the query
    /// string, in insertion order. Has no effect on a resolved link.
    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        if let Target::Unresolved { params, .. } = &mut self.target {
            params.insert(name.into(), value.to_string());
        }
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a relation; duplicates are ignored
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        let relation = relation.into();
        if !self.relations.contains(&relation) {
            self.relations.push(relation);
        }
        self
    }

    pub fn endpoint(&self) -> &str {
        match &self.target {
            Target::Unresolved { endpoint, .. } | Target::Resolved { endpoint, .. } => endpoint,
        }
    }

    /// Route parameters, while still unresolved
    pub fn params(&self) -> Option<&IndexMap<String, String>> {
        match &self.target {
            Target::Unresolved { params, .. } => Some(params),
            Target::Resolved { .. } => None,
        }
    }

    pub fn href(&self) -> Option<&str> {
        match &self.target {
            Target::Resolved { href, .. } => Some(href),
            Target::Unresolved { .. } => None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.target, Target::Resolved { .. })
    }

    /// Bind the link to a concrete href
    pub(crate) fn bind(&mut self, href: String) -> Result<(), ResolutionError> {
        match &mut self.target {
            Target::Resolved { href: existing, .. } => Err(ResolutionError::AlreadyResolved {
                href: existing.clone(),
            }),
            Target::Unresolved { endpoint, .. } => {
                let endpoint = std::mem::take(endpoint);
                self.target = Target::Resolved { endpoint, href };
                Ok(())
            }
        }
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Target::Resolved { href, .. } = &self.target else {
            if etag::in_canonical_form() {
                return serializer.serialize_map(Some(0))?.end();
            }
            return Err(S::Error::custom(format!(
                "link to endpoint '{}' serialized before resolution",
                self.endpoint()
            )));
        };

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("href", href)?;
        if self.method != Method::GET {
            map.serialize_entry("method", self.method.as_str())?;
        }
        if !self.relations.is_empty() {
            map.serialize_entry("rel", &self.relations)?;
        }
        map.end()
    }
}
