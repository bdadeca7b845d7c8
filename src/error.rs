//! Crate-wide error type.
//!
//! Configuration errors (`SchemaNotObject`, `UnsupportedKind`, `UnsupportedLiteral`,
//! `InvalidContentType`) are authoring mistakes and are never retried. `Body` and `Json`
//! are the fatal body-read failures of a single request. Validation failures are not
//! errors at all; they travel inside [`crate::validate::ParseResult`].
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("the provided schema must be of kind object")]
    SchemaNotObject,

    #[error("unsupported schema kind for form data coercion: {0}")]
    UnsupportedKind(&'static str),

    #[error("unsupported literal type: {0}")]
    UnsupportedLiteral(&'static str),

    #[error("invalid content-type: {}", .0.as_deref().unwrap_or("<missing>"))]
    InvalidContentType(Option<String>),

    #[error("unknown form field `{0}`")]
    UnknownField(String),

    #[error("invalid schema definition: {0}")]
    InvalidSchema(String),

    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("at JSON path {path} → {message}")]
    Decode { path: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error stems from the incoming request rather than from how the
    /// schema or the handler was set up.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Body(_) | Self::Json(_))
    }

    fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "form handling misconfigured");
        }
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
