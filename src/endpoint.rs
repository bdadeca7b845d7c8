//! Guard for JSON endpoints: parse the body against a schema and only hand the
//! parsed output to the handler.
use std::future::Future;

use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::Settings;
use crate::error::Error;
use crate::schema::Schema;
use crate::validate::{flatten, safe_parse, ParseResult};
use crate::value::FormValue;

/// The body is read as JSON whatever the content type says. Invalid input answers
/// `422 {"success": false, "issues": ...}` and the handler is not called.
pub async fn with_validation<F, Fut, R>(schema: &Schema, request: Request, handler: F) -> Response
where
    F: FnOnce(FormValue) -> Fut,
    Fut: Future<Output = R>,
    R: IntoResponse,
{
    with_validation_using(&Settings::default(), schema, request, handler).await
}

pub async fn with_validation_using<F, Fut, R>(
    settings: &Settings,
    schema: &Schema,
    request: Request,
    handler: F,
) -> Response
where
    F: FnOnce(FormValue) -> Fut,
    Fut: Future<Output = R>,
    R: IntoResponse,
{
    let body = match to_bytes(request.into_body(), settings.body_limit).await {
        Ok(body) => body,
        Err(e) => return Error::Body(e.to_string()).into_response(),
    };
    let json: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(json) => json,
        Err(e) => return Error::from(e).into_response(),
    };

    match safe_parse(schema, &FormValue::from(json)) {
        ParseResult::Success { output } => handler(output).await.into_response(),
        ParseResult::Failure { issues } => {
            tracing::debug!(issues = issues.len(), "rejected request body");
            let body = json!({ "success": false, "issues": flatten(&issues) });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }
    }
}
