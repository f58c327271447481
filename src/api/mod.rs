//! HTTP API: routing, auth, and the small status endpoints.

use axum::extract::State;
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use subtle::ConstantTimeEq;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::warn;

use crate::error::XueziError;
use crate::AppState;

mod characters;
mod suggest;

use characters::*;
use suggest::*;

/// Run a blocking closure on the spawn_blocking pool and map JoinError.
async fn blocking<T, F>(f: F) -> Result<T, XueziError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| XueziError::Internal(e.to_string()))
}

/// Auth middleware: checks Bearer token if XUEZI_API_KEY is configured.
async fn require_auth(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, XueziError> {
    let Some(ref expected) = state.api_key else {
        return Ok(next.run(req).await);
    };

    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        warn!(path = %req.uri().path(), "missing bearer token");
        return Err(XueziError::Unauthorized);
    };

    // constant-time comparison
    if token.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(next.run(req).await)
    } else {
        warn!(path = %req.uri().path(), "bad bearer token");
        Err(XueziError::Unauthorized)
    }
}

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/stats", get(stats));

    let protected = Router::new()
        .route("/suggest", get(suggest_word))
        .route("/add", post(add_word))
        .route("/characters", get(list_characters))
        .route(
            "/characters/{id}",
            get(get_character).delete(delete_character),
        )
        .route("/lookup/{character}", get(lookup_character))
        .route("/search", get(search_characters))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public
        .merge(protected)
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Chinese Learning API is running!",
        "name": "xuezi",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, XueziError> {
    let store = state.store.clone();
    let known = blocking(move || store.known_characters()).await??;
    let catalog_size = state.suggester.catalog().len();
    let remaining = state.suggester.remaining(&known);

    Ok(Json(serde_json::json!({
        "known": known.len(),
        "catalog": catalog_size,
        "remaining": remaining,
        "uptime_secs": state.started_at.elapsed().as_secs(),
    })))
}
