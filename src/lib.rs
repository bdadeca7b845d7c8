//! Schema-driven form handling.
//!
//! A [`Schema`] describes a form once. From it the crate derives the initial field
//! values ([`derive_default`]), turns raw submitted text into typed values
//! ([`coerce_form_data`]), validates them ([`safe_parse`]) and reshapes the resulting
//! issues into a tree that mirrors the value ([`format_issues`]). [`Form`] and
//! [`endpoint::with_validation`] wire those steps into axum request handling.
pub mod cli;
pub mod coerce;
pub mod config;
pub mod defaults;
pub mod endpoint;
pub mod error;
pub mod form;
pub mod form_data;
pub mod format;
pub mod introspect;
pub mod path_de;
pub mod request;
pub mod schema;
pub mod validate;
pub mod value;

pub use coerce::{coerce_entry, coerce_form_data};
pub use config::Settings;
pub use defaults::derive_default;
pub use error::{Error, Result};
pub use form::{ActionFailure, ActionOutcome, ActionStatus, Form, FormState, Side, Submit};
pub use form_data::{FormData, FormDataEntry};
pub use format::{format_issues, IssueTree};
pub use introspect::{Introspector, SchemaConfig};
pub use request::{validate_request, Validated};
pub use schema::{Schema, SchemaKind};
pub use validate::{flatten, safe_parse, Issue, ParseResult};
pub use value::FormValue;
