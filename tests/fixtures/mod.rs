//! Shared fixtures for integration tests
//!
//! Provides a small world catalogue (`WorldRecord` / `WorldRest`), the route
//! table the resources link into and an axum router serving them.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod fixtures;
//! use fixtures::*;
//! ```

#![allow(dead_code)]

use axum::Json;
use axum::http::Method;
use axum::response::Response;
use hateoas::prelude::*;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Records and resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldRecord {
    pub id: Uuid,
    pub world_name: String,
    pub tenant_name: String,
    pub population: i64,
    pub rating: Option<f64>,
    pub created_at: DateTime<FixedOffset>,
}

impl_field_source!(WorldRecord {
    world_name,
    tenant_name,
    population,
    rating,
    created_at,
});

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldRest {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub world_name: String,
    pub tenant_name: String,
    pub population: i64,
    pub rating: Option<f64>,
    pub created_at: DateTime<FixedOffset>,
    pub residents: Link,
}

impl_searchable!(WorldRest, "worlds", {
    "worldName" => world_name: String [searchable, sortable],
    "tenantName" => tenant_name: String [searchable, sortable],
    "population" => population: Integer [searchable, sortable],
    "rating" => rating: Decimal [searchable, sortable],
    "createdAt" => created_at: DateTimeOffset [searchable, sortable],
    "internalId" => id: Uuid,
});

impl_hypermedia!(WorldRest { self_link, residents });

impl Etaggable for WorldRest {}

impl From<WorldRecord> for WorldRest {
    fn from(record: WorldRecord) -> Self {
        Self {
            self_link: Link::to("GetWorldById").with_param("worldId", record.id),
            residents: Link::to_collection("GetResidents").with_param("worldId", record.id),
            world_name: record.world_name,
            tenant_name: record.tenant_name,
            population: record.population,
            rating: record.rating,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidentForm {
    pub name: String,
    pub passcode: String,
}

impl_form_model!(ResidentForm {
    "name" => "Name" [required, length(1, 100)],
    "passcode" => "Passcode" [required, secret],
});

#[derive(Debug, Clone, Serialize)]
pub struct ResidentRest {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub name: String,
}

impl_hypermedia!(ResidentRest { self_link });

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

pub const AMBER_ID: &str = "6f1c2b9e-3a41-4c55-9d1e-0b7a7e3f0a01";
pub const BRIGHT_ID: &str = "6f1c2b9e-3a41-4c55-9d1e-0b7a7e3f0a02";
pub const CINDER_ID: &str = "6f1c2b9e-3a41-4c55-9d1e-0b7a7e3f0a03";

pub fn world(
    id: &str,
    name: &str,
    tenant: &str,
    population: i64,
    rating: Option<f64>,
    created_at: &str,
) -> WorldRecord {
    WorldRecord {
        id: Uuid::parse_str(id).unwrap(),
        world_name: name.to_string(),
        tenant_name: tenant.to_string(),
        population,
        rating,
        created_at: DateTime::parse_from_rfc3339(created_at).unwrap(),
    }
}

/// Three worlds, two of them owned by tenant ADAMS
pub fn sample_worlds() -> Vec<WorldRecord> {
    vec![
        world(
            CINDER_ID,
            "Cinder Vale",
            "ADAMS",
            4_310,
            Some(4.5),
            "2025-01-09T08:15:00+00:00",
        ),
        world(
            AMBER_ID,
            "Amber Shore",
            "ADAMS",
            1_200,
            None,
            "2024-03-01T09:00:00+01:00",
        ),
        world(
            BRIGHT_ID,
            "Brightwater",
            "WASHINGTON",
            860,
            Some(3.0),
            "2024-05-17T14:30:00-05:00",
        ),
    ]
}

// ---------------------------------------------------------------------------
// Routes and server
// ---------------------------------------------------------------------------

pub fn route_table() -> RouteTable {
    RouteTable::from_config(&HateoasConfig::default_config().routes)
        .unwrap()
        .route(
            "GetResidentById",
            "/api/worlds/{worldId}/residents/{residentId}",
        )
        .unwrap()
}

pub fn resolver() -> LinkResolver {
    LinkResolver::new(Arc::new(route_table()))
}

#[derive(Clone)]
pub struct TestState {
    pub config: HateoasConfig,
    pub responder: HypermediaResponder,
    pub worlds: InMemoryDataSource<WorldRecord>,
    pub shutdown: CancellationToken,
}

/// State over the sample worlds; `overrides` is merged last
pub fn test_state(overrides: HateoasConfig) -> TestState {
    let config = HateoasConfig::merge(vec![
        HateoasConfig::default_config(),
        HateoasConfig::from_yaml_str(
            "routes:\n  GetResidentById: /api/worlds/{worldId}/residents/{residentId}\n",
        )
        .unwrap(),
        overrides,
    ]);
    TestState {
        responder: HypermediaResponder::from_config(&config).unwrap(),
        config,
        worlds: InMemoryDataSource::from_records(sample_worlds()),
        shutdown: CancellationToken::new(),
    }
}

pub fn router(state: TestState) -> Router {
    Router::new()
        .route("/api/worlds", get(list_worlds))
        .route("/api/worlds/{world_id}", get(get_world))
        .route("/api/worlds/{world_id}/residents", post(create_resident))
        .with_state(state)
}

async fn list_worlds(
    State(state): State<TestState>,
    query: CollectionQuery,
) -> Result<HypermediaResponse<PagedCollection<WorldRest>>, HateoasError> {
    let plan = QueryPlan::compile::<WorldRest>(&query, state.config.paging())?;
    let page = store::execute(&state.worlds, &plan, &state.shutdown).await?;
    let collection = PagedCollection::new(
        Link::to("GetWorlds"),
        page.map(WorldRest::from),
        plan.window,
    )
    .with_query_form(Form::query_for::<WorldRest>(Link::to_form(
        "GetWorlds",
        Method::GET,
        relation::QUERY_FORM,
    )));
    state.responder.ok(collection)
}

async fn get_world(
    State(state): State<TestState>,
    Path(world_id): Path<Uuid>,
    conditional: ConditionalRequest,
) -> Result<Response, HateoasError> {
    match state
        .worlds
        .find(|w| w.id == world_id)
        .map_err(HateoasError::Source)?
    {
        Some(world) => Ok(state
            .responder
            .conditional(&conditional, WorldRest::from(world))?
            .into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

async fn create_resident(
    State(state): State<TestState>,
    Path(world_id): Path<Uuid>,
    Json(form): Json<ResidentForm>,
) -> Result<HypermediaResponse<ResidentRest>, HateoasError> {
    let resident_id = Uuid::new_v4();
    let resident = ResidentRest {
        self_link: Link::to("GetResidentById")
            .with_param("worldId", world_id)
            .with_param("residentId", resident_id),
        name: form.name,
    };
    let location = Link::to("GetResidentById")
        .with_param("worldId", world_id)
        .with_param("residentId", resident_id);
    state.responder.created(location, resident)
}
