//! # hateoas-rs
//!
//! A hypermedia resource toolkit for REST APIs built on axum.
//!
//! ## Features
//!
//! - **Field Metadata**: Declare which fields of a resource are searchable or sortable
//! - **Search Filters**: Compile `filter=field op value` clauses into typed predicates
//! - **Sorting**: Multi-key, stable ordering validated against the field table
//! - **Bounded Paging**: Offset/limit windows with a hard ceiling and navigation links
//! - **Entity Tags**: Deterministic content hashes and `If-None-Match` handling
//! - **Late-Bound Links**: Resources name endpoints; hrefs are filled in just before serialization
//! - **Forms**: Describe how to create, edit or query a resource
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hateoas::prelude::*;
//!
//! #[derive(Serialize)]
//! #[serde(rename_all = "camelCase")]
//! struct WorldRest {
//!     #[serde(rename = "self")]
//!     self_link: Link,
//!     world_name: String,
//!     tenant_name: String,
//! }
//!
//! impl_searchable!(WorldRest, "worlds", {
//!     "worldName" => world_name: String [searchable, sortable],
//!     "tenantName" => tenant_name: String [searchable, sortable],
//! });
//! impl_hypermedia!(WorldRest { self_link });
//!
//! async fn list_worlds(
//!     State(state): State<AppState>,
//!     query: CollectionQuery,
//! ) -> Result<impl IntoResponse, HateoasError> {
//!     let plan = QueryPlan::compile::<WorldRest>(&query, state.config.paging())?;
//!     let page = store::execute(&state.worlds, &plan, &state.shutdown).await?;
//!     let body = PagedCollection::new(Link::to_collection("GetWorlds"), page.map(to_rest), plan.window);
//!     state.responder.ok(body)
//! }
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod links;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Field metadata and queries ===
    pub use crate::core::{
        descriptor::{FieldDescriptor, FieldSet, FieldSource, Searchable},
        error::{ConfigError, HateoasError, ResolutionError, ValidationError},
        etag::{EntityTag, Etaggable, Freshness, IfNoneMatch},
        field::{FieldValue, ValueKind},
        paging::{PagedResults, PagingDefaults, PagingOptions, PagingWindow},
        query::{CollectionQuery, QueryPlan},
        registry::FieldRegistry,
        search::{Filter, Operator, SearchCompiler},
        sort::{SortCompiler, SortDirection, SortPlan},
        store::{self, DataSource},
    };

    // === Macros ===
    pub use crate::{impl_field_source, impl_form_model, impl_hypermedia, impl_searchable};

    // === Links and forms ===
    pub use crate::links::{
        Form, FormField, FormFieldSpec, FormModel, Hypermedia, Link, LinkResolver, LinkWalker,
        PagedCollection, Resolved, RouteTable, relation,
    };

    // === Storage ===
    pub use crate::storage::{InMemoryDataSource, SqlDialect, SqlQuery};

    // === Config ===
    pub use crate::config::{HateoasConfig, ION_MEDIA_TYPE};

    // === Server ===
    pub use crate::server::{ConditionalRequest, HypermediaResponder, HypermediaResponse};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, FixedOffset, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use tokio_util::sync::CancellationToken;
    pub use uuid::Uuid;

    // === Axum ===
    pub use axum::{
        Router,
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
    };
}
