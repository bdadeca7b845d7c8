//! Serde form of a schema tree, for schemas kept in JSON files.
//!
//! ```json
//! { "kind": "object", "entries": {
//!     "email": { "kind": "string", "pipe": [{ "type": "email" }] },
//!     "tags":  { "kind": "array", "item": { "kind": "string" } },
//!     "age":   { "kind": "optional", "wrapped": { "kind": "number" } }
//! } }
//! ```
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::{Action, Check, EnumValue, Literal, Schema, SchemaKind};
use crate::error::{Error, Result};
use crate::value::{FormValue, Symbol};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaDef {
    Any,
    String {
        #[serde(default)]
        pipe: Vec<ActionDef>,
    },
    Number {
        #[serde(default)]
        pipe: Vec<ActionDef>,
    },
    Boolean,
    Bigint,
    Symbol,
    Date,
    Blob,
    Nan,
    Void,
    Never,
    Array {
        item: Box<SchemaDef>,
        #[serde(default)]
        pipe: Vec<ActionDef>,
    },
    Object { entries: IndexMap<String, SchemaDef> },
    Map { key: Box<SchemaDef>, value: Box<SchemaDef> },
    Set { value: Box<SchemaDef> },
    Record { key: Box<SchemaDef>, value: Box<SchemaDef> },
    Tuple { items: Vec<SchemaDef> },
    Union { options: Vec<SchemaDef> },
    Enum { values: Vec<String> },
    NativeEnum { members: IndexMap<String, EnumValue> },
    Literal {
        literal: Value,
        /// Marks a string literal as a bigint (`"9007199254740993"`) or a symbol description.
        #[serde(default)]
        as_type: Option<LiteralType>,
    },
    Optional {
        wrapped: Box<SchemaDef>,
        #[serde(default)]
        default: Option<Value>,
    },
    Nullable {
        wrapped: Box<SchemaDef>,
        #[serde(default)]
        default: Option<Value>,
    },
    Nullish {
        wrapped: Box<SchemaDef>,
        #[serde(default)]
        default: Option<Value>,
    },
    NonOptional { wrapped: Box<SchemaDef> },
    NonNullable { wrapped: Box<SchemaDef> },
    NonNullish { wrapped: Box<SchemaDef> },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralType {
    Bigint,
    Symbol,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDef {
    MinLength { requirement: usize, message: Option<String> },
    MaxLength { requirement: usize, message: Option<String> },
    Length { requirement: usize, message: Option<String> },
    MinValue { requirement: f64, message: Option<String> },
    MaxValue { requirement: f64, message: Option<String> },
    Integer { message: Option<String> },
    Email { message: Option<String> },
    Regex { pattern: String, message: Option<String> },
}

impl TryFrom<ActionDef> for Action {
    type Error = Error;

    fn try_from(def: ActionDef) -> Result<Self> {
        let (check, message) = match def {
            ActionDef::MinLength { requirement, message } => (Check::MinLength(requirement), message),
            ActionDef::MaxLength { requirement, message } => (Check::MaxLength(requirement), message),
            ActionDef::Length { requirement, message } => (Check::Length(requirement), message),
            ActionDef::MinValue { requirement, message } => (Check::MinValue(requirement), message),
            ActionDef::MaxValue { requirement, message } => (Check::MaxValue(requirement), message),
            ActionDef::Integer { message } => (Check::Integer, message),
            ActionDef::Email { message } => (Check::Email, message),
            ActionDef::Regex { pattern, message } => {
                let re = Regex::new(&pattern)
                    .map_err(|e| Error::InvalidSchema(format!("bad regex `{pattern}`: {e}")))?;
                (Check::Regex(re), message)
            }
        };
        Ok(Action { check, message })
    }
}

fn boxed(def: Box<SchemaDef>) -> Result<Schema> {
    Schema::try_from(*def)
}

fn actions(pipe: Vec<ActionDef>) -> Result<Vec<Action>> {
    pipe.into_iter().map(Action::try_from).collect()
}

fn literal(value: Value, as_type: Option<LiteralType>) -> Result<Literal> {
    match (value, as_type) {
        (Value::String(s), Some(LiteralType::Bigint)) => crate::coerce::bigint_from_text(&s)
            .map(Literal::BigInt)
            .ok_or_else(|| Error::InvalidSchema(format!("bad bigint literal `{s}`"))),
        (Value::String(s), Some(LiteralType::Symbol)) => Ok(Literal::Symbol(Symbol::new(Some(s)))),
        (Value::String(s), None) => Ok(Literal::String(s)),
        (Value::Bool(b), None) => Ok(Literal::Boolean(b)),
        (Value::Number(n), None) => n
            .as_f64()
            .map(Literal::Number)
            .ok_or_else(|| Error::InvalidSchema(format!("bad number literal `{n}`"))),
        (Value::Null, _) => Err(Error::UnsupportedLiteral("null")),
        (Value::Array(_), _) | (Value::Object(_), _) => Err(Error::UnsupportedLiteral("object")),
        (other, Some(_)) => Err(Error::InvalidSchema(format!(
            "`as_type` needs a string literal, got {other}"
        ))),
    }
}

impl TryFrom<SchemaDef> for Schema {
    type Error = Error;

    fn try_from(def: SchemaDef) -> Result<Self> {
        let schema = match def {
            SchemaDef::Any => Schema::any(),
            SchemaDef::String { pipe } => Schema::with_pipe(SchemaKind::String, actions(pipe)?),
            SchemaDef::Number { pipe } => Schema::with_pipe(SchemaKind::Number, actions(pipe)?),
            SchemaDef::Boolean => Schema::boolean(),
            SchemaDef::Bigint => Schema::bigint(),
            SchemaDef::Symbol => Schema::symbol(),
            SchemaDef::Date => Schema::date(),
            SchemaDef::Blob => Schema::blob(),
            SchemaDef::Nan => Schema::nan(),
            SchemaDef::Void => Schema::void(),
            SchemaDef::Never => Schema::never(),
            SchemaDef::Array { item, pipe } => {
                Schema::with_pipe(SchemaKind::Array { item: boxed(item)? }, actions(pipe)?)
            }
            SchemaDef::Object { entries } => {
                let entries = entries
                    .into_iter()
                    .map(|(k, d)| Ok((k, Schema::try_from(d)?)))
                    .collect::<Result<IndexMap<_, _>>>()?;
                Schema::new(SchemaKind::Object { entries })
            }
            SchemaDef::Map { key, value } => Schema::map(boxed(key)?, boxed(value)?),
            SchemaDef::Set { value } => Schema::set(boxed(value)?),
            SchemaDef::Record { key, value } => Schema::record(boxed(key)?, boxed(value)?),
            SchemaDef::Tuple { items } => Schema::tuple(
                items.into_iter().map(Schema::try_from).collect::<Result<Vec<_>>>()?,
            ),
            SchemaDef::Union { options } => Schema::union(
                options.into_iter().map(Schema::try_from).collect::<Result<Vec<_>>>()?,
            ),
            SchemaDef::Enum { values } => Schema::enumeration(values),
            SchemaDef::NativeEnum { members } => Schema::new(SchemaKind::NativeEnum { members }),
            SchemaDef::Literal { literal: value, as_type } => Schema::literal(literal(value, as_type)?),
            SchemaDef::Optional { wrapped, default } => Schema::new(SchemaKind::Optional {
                wrapped: boxed(wrapped)?,
                default: default.map(FormValue::from),
            }),
            SchemaDef::Nullable { wrapped, default } => Schema::new(SchemaKind::Nullable {
                wrapped: boxed(wrapped)?,
                default: default.map(FormValue::from),
            }),
            SchemaDef::Nullish { wrapped, default } => Schema::new(SchemaKind::Nullish {
                wrapped: boxed(wrapped)?,
                default: default.map(FormValue::from),
            }),
            SchemaDef::NonOptional { wrapped } => boxed(wrapped)?.non_optional(),
            SchemaDef::NonNullable { wrapped } => boxed(wrapped)?.non_nullable(),
            SchemaDef::NonNullish { wrapped } => boxed(wrapped)?.non_nullish(),
        };
        Ok(schema)
    }
}

impl Schema {
    /// Parse a JSON schema definition, reporting decode failures with their JSON path.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let def: SchemaDef = crate::path_de::from_slice_with_path(bytes)?;
        Schema::try_from(def)
    }
}
