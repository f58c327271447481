use axum::http::StatusCode;
use axum::Json;

#[derive(Debug, thiserror::Error)]
pub enum XueziError {
    #[error("character already known: {0}")]
    Duplicate(String),

    #[error("not found")]
    NotFound,

    #[error("no new words to suggest")]
    NoCandidates,

    #[error("query must not be empty")]
    EmptyQuery,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl XueziError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::NoCandidates => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Catalog(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Duplicate(_) | Self::EmptyQuery | Self::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl axum::response::IntoResponse for XueziError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
