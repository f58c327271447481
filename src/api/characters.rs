//! Known-character CRUD handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::blocking;
use crate::db::{CharacterInput, CharacterRecord};
use crate::error::XueziError;
use crate::AppState;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 500;

pub(super) async fn add_word(
    State(state): State<AppState>,
    Json(input): Json<CharacterInput>,
) -> Result<(StatusCode, Json<CharacterRecord>), XueziError> {
    let store = state.store.clone();
    let rec = blocking(move || store.add(input)).await??;
    Ok((StatusCode::CREATED, Json(rec)))
}

#[derive(Deserialize)]
pub(super) struct ListQuery {
    offset: Option<usize>,
    limit: Option<usize>,
}

pub(super) async fn list_characters(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<CharacterRecord>>, XueziError> {
    let offset = q.offset.unwrap_or(0);
    let limit = q.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let store = state.store.clone();
    let records = blocking(move || store.list_all(offset, limit)).await??;
    Ok(Json(records))
}

pub(super) async fn get_character(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CharacterRecord>, XueziError> {
    let store = state.store.clone();
    let rec = blocking(move || store.get(id)).await??;
    rec.ok_or(XueziError::NotFound).map(Json)
}

pub(super) async fn delete_character(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CharacterRecord>, XueziError> {
    let store = state.store.clone();
    let rec = blocking(move || store.delete_by_id(id)).await??;
    rec.ok_or(XueziError::NotFound).map(Json)
}

pub(super) async fn lookup_character(
    State(state): State<AppState>,
    Path(character): Path<String>,
) -> Result<Json<CharacterRecord>, XueziError> {
    let store = state.store.clone();
    let rec = blocking(move || store.get_by_character(&character)).await??;
    rec.ok_or(XueziError::NotFound).map(Json)
}

#[derive(Deserialize)]
pub(super) struct SearchQuery {
    q: String,
}

/// Substring match, no paging. `q` is used verbatim; whitespace is a valid needle.
pub(super) async fn search_characters(
    State(state): State<AppState>,
    Query(sq): Query<SearchQuery>,
) -> Result<Json<Vec<CharacterRecord>>, XueziError> {
    if sq.q.is_empty() {
        return Err(XueziError::EmptyQuery);
    }
    let store = state.store.clone();
    let records = blocking(move || store.search(&sq.q)).await??;
    Ok(Json(records))
}
