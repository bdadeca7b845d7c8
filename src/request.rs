//! Request bodies → candidate values → parse results.
//!
//! The content type picks the path before any byte is read: urlencoded and multipart
//! bodies go through the coercer, JSON bodies are taken as already typed. Anything
//! else is a configuration error. Reading the body is the only suspension point and
//! is not retried.
use axum::body::to_bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use serde::Serialize;

use crate::coerce::coerce_form_data;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::form_data::{FormData, FormDataEntry};
use crate::schema::Schema;
use crate::validate::{safe_parse, ParseResult};
use crate::value::{Blob, FormValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    UrlEncoded,
    Multipart,
    Json,
}

pub fn classify(content_type: Option<&str>) -> Result<BodyKind> {
    let ct = content_type.map(|ct| ct.trim().to_ascii_lowercase());
    match ct.as_deref() {
        Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => Ok(BodyKind::UrlEncoded),
        Some(ct) if ct.starts_with("multipart/form-data") => Ok(BodyKind::Multipart),
        Some(ct) if ct.starts_with("application/json") => Ok(BodyKind::Json),
        _ => Err(Error::InvalidContentType(content_type.map(str::to_owned))),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Form(FormData),
    Json(FormValue),
}

/// Candidate data next to the verdict on it. `data` is kept even when invalid so the
/// caller can send it back to the form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Validated {
    pub data: FormValue,
    pub result: ParseResult,
}

pub async fn read_submission(request: Request, settings: &Settings) -> Result<Submission> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let kind = classify(content_type.as_deref())?;
    tracing::debug!(?kind, content_type = content_type.as_deref(), "reading submission");

    match kind {
        BodyKind::UrlEncoded => {
            let body = to_bytes(request.into_body(), settings.body_limit)
                .await
                .map_err(|e| Error::Body(e.to_string()))?;
            Ok(Submission::Form(FormData::from_urlencoded(&body)))
        }
        BodyKind::Multipart => read_multipart(request).await.map(Submission::Form),
        BodyKind::Json => {
            let body = to_bytes(request.into_body(), settings.body_limit)
                .await
                .map_err(|e| Error::Body(e.to_string()))?;
            let json: serde_json::Value = serde_json::from_slice(&body)?;
            Ok(Submission::Json(json.into()))
        }
    }
}

async fn read_multipart(request: Request) -> Result<FormData> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| Error::Body(rejection.body_text()))?;

    let mut form = FormData::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| Error::Body(e.to_string()))? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let entry = if field.file_name().is_some() {
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().map(str::to_owned);
            let data = field.bytes().await.map_err(|e| Error::Body(e.to_string()))?;
            FormDataEntry::File(Blob { data, content_type, file_name })
        } else {
            FormDataEntry::Text(field.text().await.map_err(|e| Error::Body(e.to_string()))?)
        };
        form.append(name, entry);
    }
    Ok(form)
}

pub fn validate_form_data(schema: &Schema, form: &FormData) -> Result<Validated> {
    let data = coerce_form_data(schema, form)?;
    let result = safe_parse(schema, &data);
    Ok(Validated { data, result })
}

pub fn validate_json(schema: &Schema, data: FormValue) -> Validated {
    let result = safe_parse(schema, &data);
    Validated { data, result }
}

pub fn validate_submission(schema: &Schema, submission: Submission) -> Result<Validated> {
    match submission {
        Submission::Form(form) => validate_form_data(schema, &form),
        Submission::Json(data) => Ok(validate_json(schema, data)),
    }
}

pub async fn validate_request(schema: &Schema, request: Request, settings: &Settings) -> Result<Validated> {
    let submission = read_submission(request, settings).await?;
    validate_submission(schema, submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request(content_type: Option<&str>, body: impl Into<Body>) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(body.into()).unwrap()
    }

    fn schema() -> Schema {
        Schema::object([
            ("username", Schema::string()),
            ("tags", Schema::array(Schema::string())),
            ("subscribe", Schema::boolean()),
        ])
    }

    #[test]
    fn classification_is_by_prefix() {
        assert_eq!(classify(Some("application/json; charset=utf-8")).unwrap(), BodyKind::Json);
        assert_eq!(classify(Some("multipart/form-data; boundary=x")).unwrap(), BodyKind::Multipart);
        assert_eq!(classify(Some("Application/X-WWW-Form-Urlencoded")).unwrap(), BodyKind::UrlEncoded);
        assert!(matches!(classify(Some("text/plain")), Err(Error::InvalidContentType(Some(_)))));
        assert!(matches!(classify(None), Err(Error::InvalidContentType(None))));
    }

    #[tokio::test]
    async fn urlencoded_bodies_are_coerced() {
        let req = request(
            Some("application/x-www-form-urlencoded"),
            "username=ada&tags=a&tags=b&tags=c&subscribe=on",
        );
        let validated = validate_request(&schema(), req, &Settings::default()).await.unwrap();
        assert!(validated.result.is_success());
        assert_eq!(
            validated.data.to_json(),
            json!({"username": "ada", "tags": ["a", "b", "c"], "subscribe": true})
        );
    }

    #[tokio::test]
    async fn multipart_bodies_keep_files() {
        let body = concat!(
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"username\"\r\n\r\n",
            "ada\r\n",
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"tags\"\r\n\r\n",
            "x\r\n",
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"avatar\"; filename=\"a.png\"\r\n",
            "Content-Type: image/png\r\n\r\n",
            "PNGDATA\r\n",
            "--XYZ--\r\n",
        );
        let req = request(Some("multipart/form-data; boundary=XYZ"), body);
        let Submission::Form(form) = read_submission(req, &Settings::default()).await.unwrap() else {
            panic!("expected form data");
        };
        assert_eq!(form.get("username"), Some(&FormDataEntry::from("ada")));
        match form.get("avatar") {
            Some(FormDataEntry::File(blob)) => {
                assert_eq!(blob.file_name.as_deref(), Some("a.png"));
                assert_eq!(blob.content_type.as_deref(), Some("image/png"));
                assert_eq!(&blob.data[..], b"PNGDATA");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn json_content_type_never_takes_the_form_path() {
        // form-shaped body, JSON header: parsed as JSON and fails as JSON
        let req = request(Some("application/json"), "username=ada&subscribe=on");
        let err = validate_request(&schema(), req, &Settings::default()).await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));

        let req = request(Some("application/json"), r#"{"username": "ada", "tags": [], "subscribe": "on"}"#);
        let validated = validate_request(&schema(), req, &Settings::default()).await.unwrap();
        assert_eq!(validated.data.get("subscribe"), Some(&FormValue::from("on")));
        assert_eq!(validated.result.issues()[0].dot_path().as_deref(), Some("subscribe"));
    }

    #[tokio::test]
    async fn unknown_content_type_fails_before_reading() {
        let req = request(Some("text/csv"), "a,b");
        let err = validate_request(&schema(), req, &Settings::default()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidContentType(Some(ct)) if ct == "text/csv"));
        let req = request(None, "");
        assert!(matches!(
            read_submission(req, &Settings::default()).await,
            Err(Error::InvalidContentType(None))
        ));
    }

    #[tokio::test]
    async fn oversized_bodies_are_body_errors() {
        let settings = Settings { body_limit: 4, ..Settings::default() };
        let req = request(Some("application/json"), r#"{"username": "ada"}"#);
        assert!(matches!(read_submission(req, &settings).await, Err(Error::Body(_))));
    }
}
