//! Route handlers of the world service

use axum::Json;
use axum::http::Method;
use axum::response::Response;
use hateoas::prelude::*;

use crate::resources::{
    PasswordGrantForm, ResidentForm, ResidentRecord, ResidentRest, RootResource, WorldRecord,
    WorldRest,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: HateoasConfig,
    pub responder: HypermediaResponder,
    pub worlds: InMemoryDataSource<WorldRecord>,
    pub residents: InMemoryDataSource<ResidentRecord>,
    pub shutdown: CancellationToken,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/worlds", get(list_worlds))
        .route("/api/worlds/{world_id}", get(get_world))
        .route(
            "/api/worlds/{world_id}/residents",
            get(list_residents).post(create_resident),
        )
        .route("/api/token", get(token_form))
        .with_state(state)
}

pub async fn root(
    State(state): State<AppState>,
) -> Result<HypermediaResponse<RootResource>, HateoasError> {
    state.responder.ok(RootResource {
        self_link: Link::to("Root"),
        worlds: Link::to_collection("GetWorlds"),
        token: Link::to_form("Token", Method::POST, relation::FORM),
    })
}

pub async fn list_worlds(
    State(state): State<AppState>,
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

pub async fn get_world(
    State(state): State<AppState>,
    Path(world_id): Path<Uuid>,
    conditional: ConditionalRequest,
) -> Result<Response, HateoasError> {
    let world = state
        .worlds
        .find(|w| w.id == world_id)
        .map_err(HateoasError::Source)?;

    match world {
        Some(world) => Ok(state
            .responder
            .conditional(&conditional, WorldRest::from(world))?
            .into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

pub async fn list_residents(
    State(state): State<AppState>,
    Path(world_id): Path<Uuid>,
    query: CollectionQuery,
) -> Result<HypermediaResponse<PagedCollection<ResidentRest>>, HateoasError> {
    let query = query.with_filter(format!("worldId eq {}", world_id));
    let plan = QueryPlan::compile::<ResidentRest>(&query, state.config.paging())?;
    let page = store::execute(&state.residents, &plan, &state.shutdown).await?;

    let collection = PagedCollection::new(
        Link::to("GetResidents").with_param("worldId", world_id),
        page.map(ResidentRest::from),
        plan.window,
    );
    state.responder.ok(collection)
}

pub async fn create_resident(
    State(state): State<AppState>,
    Path(world_id): Path<Uuid>,
    Json(form): Json<ResidentForm>,
) -> Result<HypermediaResponse<ResidentRest>, HateoasError> {
    let record = ResidentRecord {
        id: Uuid::new_v4(),
        world_id,
        name: form.name,
        role: form.role,
    };
    state
        .residents
        .insert(record.clone())
        .map_err(HateoasError::Source)?;
    tracing::info!(world = %world_id, resident = %record.id, "resident created");

    let location = Link::to("GetResidentById")
        .with_param("worldId", world_id)
        .with_param("residentId", record.id);
    state.responder.created(location, ResidentRest::from(record))
}

pub async fn token_form(
    State(state): State<AppState>,
) -> Result<HypermediaResponse<Form>, HateoasError> {
    let form = Form::from_model(
        &PasswordGrantForm::default(),
        Link::to_form("Token", Method::POST, relation::FORM),
    )?;
    state.responder.ok(form)
}
