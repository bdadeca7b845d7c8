//! Schema nodes: immutable, shared descriptors of a value's expected shape.
//!
//! A [`Schema`] is a cheap handle onto a node. Every node carries a [`SchemaId`]
//! computed from its structure when it is built (kind, payload, children's ids,
//! pipe), so two structurally identical trees share an id and resolve to the same
//! cached config in [`crate::introspect::Introspector`].
//!
//! Kinds form a closed set; everything that dispatches on them matches
//! exhaustively.
pub mod action;
pub mod def;

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::value::{FormValue, Symbol};

pub use action::{Action, Check};
pub use def::SchemaDef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u64);

/// Fixed value a `literal` node accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    BigInt(BigInt),
    Boolean(bool),
    Number(f64),
    String(String),
    Symbol(Symbol),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::BigInt(_) => "bigint",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
        }
    }

    pub fn to_value(&self) -> FormValue {
        match self {
            Self::BigInt(i) => FormValue::BigInt(i.clone()),
            Self::Boolean(b) => FormValue::Bool(*b),
            Self::Number(n) => FormValue::Number(*n),
            Self::String(s) => FormValue::String(s.clone()),
            Self::Symbol(sym) => FormValue::Symbol(sym.clone()),
        }
    }
}

/// Value side of a native enumeration member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    Number(f64),
    String(String),
}

impl EnumValue {
    pub fn to_value(&self) -> FormValue {
        match self {
            Self::Number(n) => FormValue::Number(*n),
            Self::String(s) => FormValue::String(s.clone()),
        }
    }

    pub fn matches(&self, value: &FormValue) -> bool {
        match (self, value) {
            (Self::Number(a), FormValue::Number(b)) => a == b,
            (Self::String(a), FormValue::String(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SchemaKind {
    Any,
    String,
    Number,
    Boolean,
    BigInt,
    Symbol,
    Date,
    Blob,
    NaN,
    Void,
    Never,
    Array { item: Schema },
    Object { entries: IndexMap<String, Schema> },
    Map { key: Schema, value: Schema },
    Set { value: Schema },
    Record { key: Schema, value: Schema },
    Tuple { items: Vec<Schema> },
    Union { options: Vec<Schema> },
    Enum { values: Vec<String> },
    NativeEnum { members: IndexMap<String, EnumValue> },
    Literal { literal: Literal },
    Optional { wrapped: Schema, default: Option<FormValue> },
    Nullable { wrapped: Schema, default: Option<FormValue> },
    Nullish { wrapped: Schema, default: Option<FormValue> },
    NonOptional { wrapped: Schema },
    NonNullable { wrapped: Schema },
    NonNullish { wrapped: Schema },
}

impl SchemaKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::BigInt => "bigint",
            Self::Symbol => "symbol",
            Self::Date => "date",
            Self::Blob => "blob",
            Self::NaN => "nan",
            Self::Void => "void",
            Self::Never => "never",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
            Self::Map { .. } => "map",
            Self::Set { .. } => "set",
            Self::Record { .. } => "record",
            Self::Tuple { .. } => "tuple",
            Self::Union { .. } => "union",
            Self::Enum { .. } => "enum",
            Self::NativeEnum { .. } => "native_enum",
            Self::Literal { .. } => "literal",
            Self::Optional { .. } => "optional",
            Self::Nullable { .. } => "nullable",
            Self::Nullish { .. } => "nullish",
            Self::NonOptional { .. } => "non_optional",
            Self::NonNullable { .. } => "non_nullable",
            Self::NonNullish { .. } => "non_nullish",
        }
    }

    /// The single child of a modifier kind.
    pub fn wrapped(&self) -> Option<&Schema> {
        match self {
            Self::Optional { wrapped, .. }
            | Self::Nullable { wrapped, .. }
            | Self::Nullish { wrapped, .. }
            | Self::NonOptional { wrapped }
            | Self::NonNullable { wrapped }
            | Self::NonNullish { wrapped } => Some(wrapped),
            _ => None,
        }
    }

    fn fingerprint(&self, pipe: &[Action]) -> SchemaId {
        let mut h = DefaultHasher::new();
        self.name().hash(&mut h);
        match self {
            Self::Array { item } => item.id().hash(&mut h),
            Self::Object { entries } => {
                for (key, schema) in entries {
                    key.hash(&mut h);
                    schema.id().hash(&mut h);
                }
            }
            Self::Map { key, value } | Self::Record { key, value } => {
                key.id().hash(&mut h);
                value.id().hash(&mut h);
            }
            Self::Set { value } => value.id().hash(&mut h),
            Self::Tuple { items: xs } | Self::Union { options: xs } => {
                xs.len().hash(&mut h);
                for x in xs { x.id().hash(&mut h); }
            }
            Self::Enum { values } => values.hash(&mut h),
            Self::NativeEnum { members } => format!("{members:?}").hash(&mut h),
            Self::Literal { literal } => format!("{literal:?}").hash(&mut h),
            Self::Optional { wrapped, default }
            | Self::Nullable { wrapped, default }
            | Self::Nullish { wrapped, default } => {
                wrapped.id().hash(&mut h);
                format!("{default:?}").hash(&mut h);
            }
            Self::NonOptional { wrapped }
            | Self::NonNullable { wrapped }
            | Self::NonNullish { wrapped } => wrapped.id().hash(&mut h),
            _ => {}
        }
        for action in pipe {
            format!("{action:?}").hash(&mut h);
        }
        SchemaId(h.finish())
    }
}

#[derive(Debug)]
struct SchemaNode {
    id: SchemaId,
    kind: SchemaKind,
    pipe: Vec<Action>,
}

#[derive(Clone)]
pub struct Schema(Arc<SchemaNode>);

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self::with_pipe(kind, Vec::new())
    }

    pub fn with_pipe(kind: SchemaKind, pipe: Vec<Action>) -> Self {
        let id = kind.fingerprint(&pipe);
        Self(Arc::new(SchemaNode { id, kind, pipe }))
    }

    pub fn id(&self) -> SchemaId { self.0.id }

    pub fn kind(&self) -> &SchemaKind { &self.0.kind }

    pub fn pipe_actions(&self) -> &[Action] { &self.0.pipe }

    /// Same node with `actions` appended to its pipe.
    pub fn pipe(&self, actions: impl IntoIterator<Item = Action>) -> Self {
        let mut pipe = self.0.pipe.clone();
        pipe.extend(actions);
        Self::with_pipe(self.0.kind.clone(), pipe)
    }

    /// Declared entries when this node is literally an object.
    pub fn entries(&self) -> Option<&IndexMap<String, Schema>> {
        match self.kind() {
            SchemaKind::Object { entries } => Some(entries),
            _ => None,
        }
    }
}

// constructors

impl Schema {
    pub fn any() -> Self { Self::new(SchemaKind::Any) }
    pub fn string() -> Self { Self::new(SchemaKind::String) }
    pub fn number() -> Self { Self::new(SchemaKind::Number) }
    pub fn boolean() -> Self { Self::new(SchemaKind::Boolean) }
    pub fn bigint() -> Self { Self::new(SchemaKind::BigInt) }
    pub fn symbol() -> Self { Self::new(SchemaKind::Symbol) }
    pub fn date() -> Self { Self::new(SchemaKind::Date) }
    pub fn blob() -> Self { Self::new(SchemaKind::Blob) }
    pub fn nan() -> Self { Self::new(SchemaKind::NaN) }
    pub fn void() -> Self { Self::new(SchemaKind::Void) }
    pub fn never() -> Self { Self::new(SchemaKind::Never) }

    pub fn array(item: Schema) -> Self { Self::new(SchemaKind::Array { item }) }
    pub fn set(value: Schema) -> Self { Self::new(SchemaKind::Set { value }) }
    pub fn map(key: Schema, value: Schema) -> Self { Self::new(SchemaKind::Map { key, value }) }
    pub fn record(key: Schema, value: Schema) -> Self { Self::new(SchemaKind::Record { key, value }) }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Schema)>) -> Self {
        let entries = entries.into_iter().map(|(k, s)| (k.into(), s)).collect();
        Self::new(SchemaKind::Object { entries })
    }

    pub fn tuple(items: impl IntoIterator<Item = Schema>) -> Self {
        Self::new(SchemaKind::Tuple { items: items.into_iter().collect() })
    }

    pub fn union(options: impl IntoIterator<Item = Schema>) -> Self {
        Self::new(SchemaKind::Union { options: options.into_iter().collect() })
    }

    pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(SchemaKind::Enum { values: values.into_iter().map(Into::into).collect() })
    }

    pub fn native_enum<K: Into<String>>(members: impl IntoIterator<Item = (K, EnumValue)>) -> Self {
        let members = members.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::new(SchemaKind::NativeEnum { members })
    }

    pub fn literal(literal: Literal) -> Self { Self::new(SchemaKind::Literal { literal }) }

    pub fn optional(self) -> Self {
        Self::new(SchemaKind::Optional { wrapped: self, default: None })
    }

    pub fn optional_with(self, default: impl Into<FormValue>) -> Self {
        Self::new(SchemaKind::Optional { wrapped: self, default: Some(default.into()) })
    }

    pub fn nullable(self) -> Self {
        Self::new(SchemaKind::Nullable { wrapped: self, default: None })
    }

    pub fn nullable_with(self, default: impl Into<FormValue>) -> Self {
        Self::new(SchemaKind::Nullable { wrapped: self, default: Some(default.into()) })
    }

    pub fn nullish(self) -> Self {
        Self::new(SchemaKind::Nullish { wrapped: self, default: None })
    }

    pub fn nullish_with(self, default: impl Into<FormValue>) -> Self {
        Self::new(SchemaKind::Nullish { wrapped: self, default: Some(default.into()) })
    }

    pub fn non_optional(self) -> Self { Self::new(SchemaKind::NonOptional { wrapped: self }) }
    pub fn non_nullable(self) -> Self { Self::new(SchemaKind::NonNullable { wrapped: self }) }
    pub fn non_nullish(self) -> Self { Self::new(SchemaKind::NonNullish { wrapped: self }) }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("kind", &self.0.kind)
            .field("pipe", &self.0.pipe)
            .finish()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Schema {}
