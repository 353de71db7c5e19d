use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ragscope_core::RagError;
use tracing::{error, warn};

/// Engine error surfaced by a route handler.
#[derive(Debug)]
pub struct ApiError(pub RagError);

impl ApiError {
    /// HTTP status for the wrapped error.
    ///
    /// Rejected caller-supplied vectors are the client's fault (422); store
    /// and index failures are the server's (500).
    pub fn status(&self) -> StatusCode {
        match self.0 {
            RagError::Embedding(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            warn!(error = %self.0, status = status.as_u16(), "Request rejected");
        }
        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}
