//! Route table mapping endpoint identifiers to URL templates

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::core::error::ResolutionError;
use crate::links::template::UrlTemplate;

/// Registry of named endpoints
///
/// Links refer to endpoints by identifier (e.g. `"GetWorldById"`); the table
/// knows where each one is mounted.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, UrlTemplate>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `endpoint -> template` pairs
    pub fn from_routes<'a, I>(routes: I) -> Result<Self, ResolutionError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut table = Self::new();
        for (endpoint, template) in routes {
            table.insert(endpoint.clone(), template)?;
        }
        Ok(table)
    }

    /// Build a table from the `routes` section of a configuration
    pub fn from_config(routes: &IndexMap<String, String>) -> Result<Self, ResolutionError> {
        Self::from_routes(routes)
    }

    /// Register or replace an endpoint
    pub fn insert(
        &mut self,
        endpoint: impl Into<String>,
        template: &str,
    ) -> Result<(), ResolutionError> {
        let endpoint = endpoint.into();
        let template = UrlTemplate::parse(template)?;
        tracing::debug!(endpoint = %endpoint, template = template.as_str(), "registered route");
        self.routes.insert(endpoint, template);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn route(mut self, endpoint: impl Into<String>, template: &str) -> Result<Self, ResolutionError> {
        self.insert(endpoint, template)?;
        Ok(self)
    }

    pub fn get(&self, endpoint: &str) -> Result<&UrlTemplate, ResolutionError> {
        self.routes
            .get(endpoint)
            .ok_or_else(|| ResolutionError::UnknownEndpoint {
                endpoint: endpoint.to_string(),
            })
    }

    pub fn contains(&self, endpoint: &str) -> bool {
        self.routes.contains_key(endpoint)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered endpoint identifiers, sorted
    pub fn endpoints(&self) -> Vec<&str> {
        let mut endpoints: Vec<_> = self.routes.keys().map(String::as_str).collect();
        endpoints.sort_unstable();
        endpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut routes = IndexMap::new();
        routes.insert("GetWorlds".to_string(), "/api/worlds".to_string());
        routes.insert("GetWorldById".to_string(), "/api/worlds/{worldId}".to_string());

        let table = RouteTable::from_config(&routes).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.endpoints(), vec!["GetWorldById", "GetWorlds"]);
        assert_eq!(table.get("GetWorlds").unwrap().as_str(), "/api/worlds");
    }

    #[test]
    fn test_unknown_endpoint() {
        let table = RouteTable::new();
        assert_eq!(
            table.get("Nope").unwrap_err(),
            ResolutionError::UnknownEndpoint {
                endpoint: "Nope".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_template_is_rejected_on_insert() {
        let result = RouteTable::new().route("Broken", "no-leading-slash");
        assert!(matches!(result, Err(ResolutionError::InvalidTemplate { .. })));
    }
}
