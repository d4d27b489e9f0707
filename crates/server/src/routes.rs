use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use service::bank::{BankService, Body};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use configs::DEFAULT_MAX_BODY_BYTES;

use crate::dispatch::{dispatch, Route};
use crate::errors::{ApiError, Envelope};

#[derive(Clone)]
pub struct AppState {
    pub bank: BankService,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(bank: BankService) -> Self {
        Self { bank, max_body_bytes: DEFAULT_MAX_BODY_BYTES }
    }

    pub fn with_body_limit(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct EndpointQuery {
    #[serde(default)]
    endpoint: String,
}

pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health { status: "ok", backend: state.bank.storage().backend().as_str() })
}

/// Missing, malformed or non-object bodies all read as `{}`.
fn parse_body(bytes: &[u8]) -> Body {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

async fn handle(
    state: AppState,
    method: Method,
    endpoint: Result<String, ApiError>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    let result = match (endpoint, body) {
        (Err(e), _) => Err(e),
        (_, Err(rejection)) => Err(ApiError::from(rejection)),
        (Ok(endpoint), Ok(bytes)) => match Route::resolve(&method, &endpoint) {
            Ok(route) => dispatch(&state.bank, route, &parse_body(&bytes)).await,
            Err(e) => Err(e),
        },
    };
    match result {
        Ok(data) => Envelope::ok(data).into_response(),
        Err(e) => e.into_response(),
    }
}

/// A query string that does not yield one `endpoint` cannot be routed.
async fn api_by_query(
    State(state): State<AppState>,
    method: Method,
    query: Result<Query<EndpointQuery>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let endpoint = query.map(|Query(q)| q.endpoint).map_err(|rejection| {
        tracing::debug!(%rejection, "unreadable query string");
        ApiError::Unroutable
    });
    handle(state, method, endpoint, body).await
}

async fn api_by_path(
    State(state): State<AppState>,
    method: Method,
    endpoint: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let endpoint = endpoint.map(|Path(e)| e).map_err(|rejection| {
        tracing::debug!(%rejection, "undecodable endpoint path");
        ApiError::Unroutable
    });
    handle(state, method, endpoint, body).await
}

pub fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// `/api?endpoint=user/alice` and `/api/user/alice` reach the same dispatcher.
pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);
    Router::new()
        .route("/health", get(health))
        .route("/api", any(api_by_query))
        .route("/api/", any(api_by_query))
        .route("/api/*endpoint", any(api_by_path))
        .with_state(state)
        .layer(body_limit)
        .layer(build_cors())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
