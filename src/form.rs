//! A named form bound to one object schema.
//!
//! [`Form`] holds the current field values and per-field errors and notifies
//! subscribers after every change. The same controller serves both sides of a round
//! trip: [`Form::validate_action`] checks a submitted request on the server and
//! packages a failure for transport, [`Form::apply_action_data`] feeds that package
//! back into the store.
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Settings;
use crate::defaults::derive_default;
use crate::error::{Error, Result};
use crate::request::validate_request;
use crate::schema::Schema;
use crate::validate::{flatten, safe_parse, Issue, ParseResult};
use crate::value::FormValue;

/// Messages keyed by dotted field path.
pub type FieldErrors = IndexMap<String, Vec<String>>;

/// Error key for issues about the form value as a whole rather than one field.
pub const FORM_ERRORS_KEY: &str = "$form";

fn field_errors(issues: &[Issue]) -> FieldErrors {
    let flat = flatten(issues);
    let mut errors = FieldErrors::with_capacity(flat.nested.len() + 1);
    if !flat.root.is_empty() {
        errors.insert(FORM_ERRORS_KEY.to_owned(), flat.root);
    }
    errors.extend(flat.nested);
    errors
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormState {
    pub fields: FormValue,
    pub errors: FieldErrors,
}

/// Where the form is rendered. Field values returned by an action only replace the
/// store on the server; in the browser the user's own input wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Server,
    Browser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    Cancel,
    Proceed,
}

/// Result kind of the server round trip that followed a submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Success,
    Failure,
    Redirect,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&FormState) + Send>;

pub struct Form {
    name: String,
    schema: Schema,
    settings: Settings,
    state: FormState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Form {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self::with_settings(name, schema, Settings::default())
    }

    pub fn with_settings(name: impl Into<String>, schema: Schema, settings: Settings) -> Self {
        let state = FormState { fields: derive_default(&schema), errors: FieldErrors::new() };
        Self {
            name: name.into(),
            schema,
            settings,
            state,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn schema(&self) -> &Schema { &self.schema }

    pub fn state(&self) -> &FormState { &self.state }

    pub fn fields(&self) -> &FormValue { &self.state.fields }

    pub fn errors(&self) -> &FieldErrors { &self.state.errors }

    /// Registers `listener` and calls it once with the current state.
    pub fn subscribe(&mut self, mut listener: impl FnMut(&FormState) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        listener(&self.state);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<FormValue>) -> Result<()> {
        self.entry_schema(name)?;
        match &mut self.state.fields {
            FormValue::Object(fields) => {
                fields.insert(name.to_owned(), value.into());
            }
            other => {
                *other = FormValue::Object(IndexMap::from([(name.to_owned(), value.into())]));
            }
        }
        self.notify();
        Ok(())
    }

    pub fn set_errors(&mut self, errors: FieldErrors) {
        self.state.errors = errors;
        self.notify();
    }

    /// Fields back to the schema defaults, errors cleared.
    pub fn reset(&mut self) {
        self.state.fields = derive_default(&self.schema);
        self.state.errors.clear();
        self.notify();
    }

    fn entry_schema(&self, name: &str) -> Result<&Schema> {
        self.schema
            .entries()
            .ok_or(Error::SchemaNotObject)?
            .get(name)
            .ok_or_else(|| Error::UnknownField(name.to_owned()))
    }

    /// Checks one field against its entry schema and replaces that field's errors.
    /// Returns whether the field is valid.
    pub fn validate_field(&mut self, name: &str) -> Result<bool> {
        let schema = self.entry_schema(name)?;
        let value = self.state.fields.get(name).cloned().unwrap_or_default();
        let result = safe_parse(schema, &value);

        let nested = format!("{name}.");
        self.state.errors.retain(|key, _| key != name && !key.starts_with(&nested));
        let valid = result.is_success();
        let flat = flatten(result.issues());
        if !flat.root.is_empty() {
            self.state.errors.insert(name.to_owned(), flat.root);
        }
        for (path, messages) in flat.nested {
            self.state.errors.insert(format!("{name}.{path}"), messages);
        }
        tracing::trace!(form = %self.name, field = name, valid, "field validated");
        self.notify();
        Ok(valid)
    }

    /// Pre-submit check of the whole store. On failure the errors are stored and the
    /// submission should not be sent.
    pub fn submit(&mut self) -> Submit {
        match safe_parse(&self.schema, &self.state.fields) {
            ParseResult::Success { .. } => Submit::Proceed,
            ParseResult::Failure { issues } => {
                self.state.errors = field_errors(&issues);
                self.notify();
                Submit::Cancel
            }
        }
    }

    /// Called once the action answered. A successful action starts the form over.
    pub fn complete(&mut self, status: ActionStatus) {
        if status == ActionStatus::Success {
            self.state.fields = derive_default(&self.schema);
            self.notify();
        }
    }

    pub async fn validate_action(&self, request: Request) -> Result<ActionOutcome> {
        let validated = validate_request(&self.schema, request, &self.settings).await?;
        if !validated.result.is_success() {
            tracing::debug!(
                form = %self.name,
                issues = validated.result.issues().len(),
                "action rejected"
            );
        }
        Ok(ActionOutcome {
            form: self.name.clone(),
            transport_key: self.settings.transport_key.clone(),
            failure_status: self.settings.failure_status,
            data: validated.data,
            result: validated.result,
        })
    }

    /// Applies the part of an action payload addressed to this form. Returns `false`
    /// when the payload carries nothing for it.
    pub fn apply_action_data(&mut self, payload: &Value, side: Side) -> bool {
        let Some(changes) = payload
            .get(&self.settings.transport_key)
            .and_then(|forms| forms.get(&self.name))
        else {
            return false;
        };

        self.state.errors = match changes.get("errors") {
            None | Some(Value::Null) => FieldErrors::new(),
            Some(errors) => serde_json::from_value(errors.clone()).unwrap_or_else(|error| {
                tracing::warn!(form = %self.name, %error, "discarding malformed errors in action payload");
                FieldErrors::new()
            }),
        };
        if side == Side::Server {
            if let Some(fields) = changes.get("fields") {
                self.state.fields = fields.clone().into();
            }
        }
        self.notify();
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    form: String,
    transport_key: String,
    failure_status: u16,
    pub data: FormValue,
    pub result: ParseResult,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool { self.result.is_success() }

    /// `None` when the submission was valid.
    pub fn fail(&self) -> Option<ActionFailure> {
        if self.result.is_success() {
            return None;
        }
        let status = StatusCode::from_u16(self.failure_status).unwrap_or(StatusCode::BAD_REQUEST);
        let payload = json!({
            &self.transport_key: {
                &self.form: {
                    "fields": self.data.to_json(),
                    "errors": field_errors(self.result.issues()),
                }
            }
        });
        Some(ActionFailure { status, payload })
    }
}

/// A rejected action, ready to be returned from a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionFailure {
    pub status: StatusCode,
    pub payload: Value,
}

impl IntoResponse for ActionFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::action::Action;
    use axum::body::{to_bytes, Body};
    use axum::http::header::CONTENT_TYPE;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn signup() -> Schema {
        Schema::object([
            ("username", Schema::string().pipe([Action::min_length(3)])),
            ("age", Schema::number()),
            ("newsletter", Schema::boolean()),
        ])
    }

    fn post(body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/signup")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn starts_from_defaults_and_resets_to_them() {
        let mut form = Form::new("signup", signup());
        assert_eq!(form.fields().to_json(), json!({"username": "", "age": 0.0, "newsletter": false}));
        form.set_field("username", "ada").unwrap();
        form.set_errors(FieldErrors::from([("age".to_string(), vec!["bad".to_string()])]));
        form.reset();
        assert_eq!(form.fields().get("username"), Some(&FormValue::from("")));
        assert!(form.errors().is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut form = Form::new("signup", signup());
        assert!(matches!(form.set_field("colour", "red"), Err(Error::UnknownField(f)) if f == "colour"));
        let mut scalar = Form::new("x", Schema::string());
        assert!(matches!(scalar.validate_field("a"), Err(Error::SchemaNotObject)));
    }

    #[test]
    fn subscribers_see_every_change_until_unsubscribed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut form = Form::new("signup", signup());
        let sink = Arc::clone(&seen);
        let id = form.subscribe(move |state| {
            sink.lock().unwrap().push(state.fields.get("username").cloned());
        });
        form.set_field("username", "ada").unwrap();
        assert!(form.unsubscribe(id));
        assert!(!form.unsubscribe(id));
        form.set_field("username", "bob").unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some(FormValue::from("")), Some(FormValue::from("ada"))]
        );
    }

    #[test]
    fn field_validation_replaces_only_that_field() {
        let mut form = Form::new("signup", signup());
        form.set_errors(FieldErrors::from([("age".to_string(), vec!["keep".to_string()])]));
        form.set_field("username", "ab").unwrap();
        assert!(!form.validate_field("username").unwrap());
        assert_eq!(form.errors()["username"], vec!["Invalid length"]);
        assert_eq!(form.errors()["age"], vec!["keep"]);

        form.set_field("username", "abc").unwrap();
        assert!(form.validate_field("username").unwrap());
        assert!(!form.errors().contains_key("username"));
    }

    #[test]
    fn submit_cancels_on_invalid_store_and_completion_resets() {
        let mut form = Form::new("signup", signup());
        assert_eq!(form.submit(), Submit::Cancel);
        assert_eq!(form.errors()["username"], vec!["Invalid length"]);

        form.set_field("username", "ada").unwrap();
        assert_eq!(form.submit(), Submit::Proceed);
        form.complete(ActionStatus::Failure);
        assert_eq!(form.fields().get("username"), Some(&FormValue::from("ada")));
        form.complete(ActionStatus::Success);
        assert_eq!(form.fields().get("username"), Some(&FormValue::from("")));
    }

    #[test]
    fn whole_value_issues_are_kept_under_the_form_key() {
        let mut form = Form::new("signup", signup());
        let payload = json!({"_forms": {"signup": {"fields": "oops"}}});
        assert!(form.apply_action_data(&payload, Side::Server));
        assert_eq!(form.fields(), &FormValue::from("oops"));
        assert_eq!(form.submit(), Submit::Cancel);
        assert_eq!(form.errors()[FORM_ERRORS_KEY], vec!["Invalid type"]);
        assert_eq!(form.errors().len(), 1);
    }

    #[test]
    fn malformed_payload_errors_clear_the_store() {
        let mut form = Form::new("signup", signup());
        form.set_errors(FieldErrors::from([("age".to_string(), vec!["stale".to_string()])]));
        let payload = json!({"_forms": {"signup": {"errors": {"age": "not a list"}}}});
        assert!(form.apply_action_data(&payload, Side::Browser));
        assert!(form.errors().is_empty());
    }

    #[tokio::test]
    async fn failed_actions_round_trip_to_the_store() {
        let server = Form::new("signup", signup());
        let outcome = server.validate_action(post("username=ab&age=42&newsletter=on")).await.unwrap();
        assert!(!outcome.is_success());
        let failure = outcome.fail().unwrap();
        assert_eq!(failure.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            failure.payload,
            json!({"_forms": {"signup": {
                "fields": {"username": "ab", "age": 42.0, "newsletter": true},
                "errors": {"username": ["Invalid length"]}
            }}})
        );

        let mut browser = Form::new("signup", signup());
        assert!(browser.apply_action_data(&failure.payload, Side::Browser));
        assert_eq!(browser.errors()["username"], vec!["Invalid length"]);
        assert_eq!(browser.fields().get("username"), Some(&FormValue::from("")));

        let mut rendered = Form::new("signup", signup());
        assert!(rendered.apply_action_data(&failure.payload, Side::Server));
        assert_eq!(rendered.fields().get("age"), Some(&FormValue::Number(42.0)));

        let mut other = Form::new("login", signup());
        assert!(!other.apply_action_data(&failure.payload, Side::Server));

        let response = failure.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["_forms"]["signup"]["errors"]["username"][0], "Invalid length");
    }

    #[tokio::test]
    async fn valid_actions_have_nothing_to_fail() {
        let settings = Settings { failure_status: 422, ..Settings::default() };
        let form = Form::with_settings("signup", signup(), settings);
        let outcome = form.validate_action(post("username=ada&age=7&newsletter=off")).await.unwrap();
        assert!(outcome.is_success());
        assert!(outcome.fail().is_none());
        assert_eq!(outcome.data.get("newsletter"), Some(&FormValue::Bool(false)));
    }
}
