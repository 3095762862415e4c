//! HTTP surface: the arrivals API plus the embedded browser bundle.

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use include_dir::{Dir, include_dir};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::aggregate::Aggregator;
use crate::config::StationConfig;
use crate::fetch::{ApiKey, BasicClient, HttpClient};

// Browser bundle, embedded at compile time
static ASSETS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/public");

/// Handles `GET /api/arrivals`: one aggregation cycle per request, no
/// caching. Source-level failures are already degraded inside the
/// aggregator; anything that still errors here is unexpected and maps to a
/// generic 500 without internal detail.
async fn get_arrivals<C: HttpClient + 'static>(
    State(aggregator): State<Arc<Aggregator<C>>>,
) -> Response {
    match aggregator.fetch_arrivals().await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            error!(error = %e, "Arrival aggregation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch arrivals" })),
            )
                .into_response()
        }
    }
}

async fn serve_embedded_file(path: String) -> impl IntoResponse {
    let path = if path.is_empty() || path == "/" {
        "index.html"
    } else {
        path.trim_start_matches('/')
    };

    match ASSETS_DIR.get_file(path) {
        Some(file) => {
            let mime_type = mime_guess::from_path(file.path()).first_or_octet_stream();
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime_type.as_ref())
                .body(Body::from(file.contents()))
                .unwrap()
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Builds the application router around an aggregator.
pub fn router<C: HttpClient + 'static>(aggregator: Arc<Aggregator<C>>) -> Router {
    Router::new()
        .route("/api/arrivals", get(get_arrivals))
        .with_state(aggregator)
        .route(
            "/{*path}",
            get(|Path(path): Path<String>| serve_embedded_file(path)),
        )
        .route("/", get(|| serve_embedded_file(String::new())))
}

async fn run(bind: &str, app: Router, station: &str) -> Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, station, "Arrival board listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Binds and serves the board. `MTA_API_KEY`, when set, is sent as an
/// `x-api-key` header on every upstream fetch.
pub async fn serve(bind: &str, config: StationConfig) -> Result<()> {
    let station = config.station.clone();

    match std::env::var("MTA_API_KEY") {
        Ok(key) if !key.is_empty() => {
            let client = ApiKey::mta(BasicClient::new(), key);
            let aggregator = Arc::new(Aggregator::new(client, config));
            run(bind, router(aggregator), &station).await
        }
        _ => {
            let aggregator = Arc::new(Aggregator::new(BasicClient::new(), config));
            run(bind, router(aggregator), &station).await
        }
    }
}
