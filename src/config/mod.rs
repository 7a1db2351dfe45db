//! Configuration loading and management

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::core::error::ConfigError;
use crate::core::paging::{MAX_LIMIT, PagingDefaults};
use crate::links::resolver::LinkResolver;
use crate::links::routes::RouteTable;

/// Media type of hypermedia responses unless configured otherwise
pub const ION_MEDIA_TYPE: &str = "application/ion+json";

/// Service-wide hypermedia settings
///
/// # Example
/// ```yaml
/// paging:
///   offset: 0
///   limit: 25
/// base_url: https://api.example.com
/// media_type: application/ion+json
/// routes:
///   GetWorlds: /api/worlds
///   GetWorldById: /api/worlds/{worldId}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HateoasConfig {
    /// Paging defaults applied when a request omits offset or limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<PagingDefaults>,

    /// Prefix for absolute hrefs; hrefs are root-relative when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Content type of hypermedia responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Endpoint identifier -> route template
    #[serde(default)]
    pub routes: IndexMap<String, String>,
}

impl HateoasConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: None,
            message: e.to_string(),
        })
    }

    /// Merge several configurations
    ///
    /// Later configurations win: routes are overridden per endpoint, and any
    /// setting a later configuration specifies replaces the earlier one.
    pub fn merge(configs: Vec<HateoasConfig>) -> Self {
        let mut merged = Self::default();
        for config in configs {
            if config.paging.is_some() {
                merged.paging = config.paging;
            }
            if config.base_url.is_some() {
                merged.base_url = config.base_url;
            }
            if config.media_type.is_some() {
                merged.media_type = config.media_type;
            }
            for (endpoint, template) in config.routes {
                if let Some(previous) = merged.routes.insert(endpoint.clone(), template) {
                    tracing::debug!(endpoint = %endpoint, previous = %previous, "route overridden");
                }
            }
        }
        merged
    }

    /// Effective paging defaults
    pub fn paging(&self) -> PagingDefaults {
        self.paging.unwrap_or_default()
    }

    /// Effective response media type
    pub fn media_type(&self) -> &str {
        self.media_type.as_deref().unwrap_or(ION_MEDIA_TYPE)
    }

    /// Check that every setting is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let paging = self.paging();
        if !(1..=MAX_LIMIT).contains(&paging.limit) {
            return Err(ConfigError::InvalidValue {
                field: "paging.limit".to_string(),
                message: format!("must be between 1 and {}", MAX_LIMIT),
            });
        }

        let media_type = self.media_type();
        if !media_type.contains('/') || media_type.chars().any(|c| c.is_whitespace()) {
            return Err(ConfigError::InvalidValue {
                field: "media_type".to_string(),
                message: format!("'{}' is not a media type", media_type),
            });
        }

        self.resolver()?;
        Ok(())
    }

    /// Route table built from the `routes` section
    pub fn route_table(&self) -> Result<RouteTable, ConfigError> {
        RouteTable::from_config(&self.routes).map_err(|e| ConfigError::InvalidValue {
            field: "routes".to_string(),
            message: e.to_string(),
        })
    }

    /// Link resolver for these routes and base URL
    pub fn resolver(&self) -> Result<LinkResolver, ConfigError> {
        let routes = Arc::new(self.route_table()?);
        match &self.base_url {
            Some(base_url) => LinkResolver::with_base_url(routes, base_url).map_err(|e| {
                ConfigError::InvalidValue {
                    field: "base_url".to_string(),
                    message: e.to_string(),
                }
            }),
            None => Ok(LinkResolver::new(routes)),
        }
    }

    /// Create a default configuration for testing
    pub fn default_config() -> Self {
        let routes = [
            ("Root", "/"),
            ("GetWorlds", "/api/worlds"),
            ("GetWorldById", "/api/worlds/{worldId}"),
            ("GetResidents", "/api/worlds/{worldId}/residents"),
            ("CreateResident", "/api/worlds/{worldId}/residents"),
            ("Token", "/api/token"),
        ];
        Self {
            paging: Some(PagingDefaults::default()),
            base_url: None,
            media_type: Some(ION_MEDIA_TYPE.to_string()),
            routes: routes
                .into_iter()
                .map(|(endpoint, template)| (endpoint.to_string(), template.to_string()))
                .collect(),
        }
    }
}
