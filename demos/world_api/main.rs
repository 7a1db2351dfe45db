//! World service demonstrating searchable, paged and cache-validated resources
//!
//! Routes:
//! - `GET  /`                                  entry point with links
//! - `GET  /api/worlds?filter=..&sort=..`      paged, searchable collection
//! - `GET  /api/worlds/{worldId}`              single world, honors `If-None-Match`
//! - `GET  /api/worlds/{worldId}/residents`    residents of a world
//! - `POST /api/worlds/{worldId}/residents`    create a resident (201 + Location)
//! - `GET  /api/token`                         password grant form
//!
//! Set `HATEOAS_CONFIG` to a YAML file to override the built-in routes and
//! paging defaults.

mod handlers;
mod resources;

use hateoas::prelude::*;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use handlers::AppState;
use resources::{ResidentRecord, WorldRecord};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hateoas=debug")),
        )
        .init();

    let config = load_config()?;
    config.validate()?;

    let state = AppState {
        responder: HypermediaResponder::from_config(&config)?,
        config,
        worlds: InMemoryDataSource::new(),
        residents: InMemoryDataSource::new(),
        shutdown: CancellationToken::new(),
    };
    populate_test_data(&state)?;

    let shutdown = state.shutdown.clone();
    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("world service listening on http://127.0.0.1:3000");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested, cancelling in-flight queries");
            }
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

/// Built-in routes, the demo-only resident route, then the optional file
fn load_config() -> Result<HateoasConfig> {
    let mut layers = vec![
        HateoasConfig::default_config(),
        HateoasConfig::from_yaml_str(
            "routes:\n  GetResidentById: /api/worlds/{worldId}/residents/{residentId}\n",
        )?,
    ];
    if let Ok(path) = std::env::var("HATEOAS_CONFIG") {
        tracing::info!(path = %path, "loading configuration file");
        layers.push(HateoasConfig::from_yaml_file(&path)?);
    }
    Ok(HateoasConfig::merge(layers))
}

fn populate_test_data(state: &AppState) -> Result<()> {
    let worlds = [
        ("Amber Shore", "ADAMS", "10.0.0.11", 1_200, "2024-03-01T09:00:00+01:00"),
        ("Brightwater", "WASHINGTON", "10.0.0.12", 860, "2024-05-17T14:30:00-05:00"),
        ("Cinder Vale", "ADAMS", "10.0.0.13", 4_310, "2025-01-09T08:15:00+00:00"),
        ("Dunmore", "JEFFERSON", "10.0.0.14", 95, "2025-06-22T20:45:00+09:00"),
    ];

    for (name, tenant, ip, population, created_at) in worlds {
        let world = WorldRecord {
            id: Uuid::new_v4(),
            world_name: name.to_string(),
            tenant_name: tenant.to_string(),
            server_ip: ip.to_string(),
            population,
            created_at: DateTime::parse_from_rfc3339(created_at)?,
        };
        state.residents.insert(ResidentRecord {
            id: Uuid::new_v4(),
            world_id: world.id,
            name: format!("Mayor of {}", name),
            role: "mayor".to_string(),
        })?;
        state.worlds.insert(world)?;
    }

    tracing::info!(worlds = state.worlds.len()?, "test data created");
    Ok(())
}
