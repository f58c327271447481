use axum::extract::State;
use axum::Json;
use tracing::debug;

use super::blocking;
use crate::catalog::CatalogEntry;
use crate::error::XueziError;
use crate::AppState;

/// GET /suggest — a catalog word that isn't in the store yet.
pub(super) async fn suggest_word(
    State(state): State<AppState>,
) -> Result<Json<CatalogEntry>, XueziError> {
    let store = state.store.clone();
    let known = blocking(move || store.known_characters()).await??;
    match state.suggester.suggest(&known) {
        Ok(entry) => Ok(Json(entry)),
        Err(e) => {
            debug!(known = known.len(), "nothing left to suggest");
            Err(e)
        }
    }
}
