//! Validation engine: checks a [`FormValue`] against a [`Schema`] and reports every
//! issue with the path that locates it.
//!
//! Semantics follow the usual runtime-schema rules:
//! - `optional` admits absent, `nullable` admits null, `nullish` admits both, and a
//!   declared default replaces the admitted value in the output;
//! - objects read missing keys as absent and drop undeclared keys;
//! - tuples require their exact arity;
//! - a union takes the first option that parses;
//! - pipe actions run only after the type check passes, and all their failures are
//!   collected.
pub mod issue;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::schema::{Schema, SchemaKind};
use crate::value::FormValue;

pub use issue::{flatten, FlatErrors, Issue, PathItem, PathKey, PathSchema};

static UNDEFINED: FormValue = FormValue::Undefined;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult {
    Success { output: FormValue },
    Failure { issues: Vec<Issue> },
}

impl ParseResult {
    pub fn is_success(&self) -> bool { matches!(self, Self::Success { .. }) }

    pub fn output(&self) -> Option<&FormValue> {
        match self {
            Self::Success { output } => Some(output),
            Self::Failure { .. } => None,
        }
    }

    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::Success { .. } => &[],
            Self::Failure { issues } => issues,
        }
    }

    pub fn into_result(self) -> Result<FormValue, Vec<Issue>> {
        match self {
            Self::Success { output } => Ok(output),
            Self::Failure { issues } => Err(issues),
        }
    }
}

impl Serialize for ParseResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ParseResult", 2)?;
        match self {
            Self::Success { output } => {
                s.serialize_field("success", &true)?;
                s.serialize_field("output", output)?;
            }
            Self::Failure { issues } => {
                s.serialize_field("success", &false)?;
                s.serialize_field("issues", issues)?;
            }
        }
        s.end()
    }
}

pub fn safe_parse(schema: &Schema, input: &FormValue) -> ParseResult {
    let mut cx = Context::default();
    let output = cx.parse(schema, input);
    if cx.issues.is_empty() {
        ParseResult::Success { output }
    } else {
        ParseResult::Failure { issues: cx.issues }
    }
}

#[derive(Default)]
struct Context {
    path: Vec<PathItem>,
    issues: Vec<Issue>,
}

impl Context {
    fn report(&mut self, reason: &'static str, validation: &'static str, message: String, input: &FormValue) {
        self.issues.push(Issue {
            reason,
            validation,
            message,
            input: input.clone(),
            path: if self.path.is_empty() { None } else { Some(self.path.clone()) },
        });
    }

    fn type_issue(&mut self, validation: &'static str, input: &FormValue) -> FormValue {
        self.report("type", validation, "Invalid type".into(), input);
        input.clone()
    }

    fn nested<T>(&mut self, step: PathItem, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(step);
        let out = f(self);
        self.path.pop();
        out
    }

    fn run_pipe(&mut self, schema: &Schema, output: FormValue) -> FormValue {
        let reason = schema.kind().name();
        for action in schema.pipe_actions() {
            if !action.accepts(&output) {
                self.report(reason, action.name(), action.message(), &output);
            }
        }
        output
    }

    /// Leaf kinds: pipe when the predicate holds, type issue otherwise.
    fn leaf(&mut self, schema: &Schema, input: &FormValue, ok: bool) -> FormValue {
        if ok {
            self.run_pipe(schema, input.clone())
        } else {
            self.type_issue(schema.kind().name(), input)
        }
    }

    fn parse(&mut self, schema: &Schema, input: &FormValue) -> FormValue {
        use FormValue as V;

        match schema.kind() {
            SchemaKind::Optional { wrapped, default } => match input {
                V::Undefined => default.clone().unwrap_or(V::Undefined),
                _ => self.parse(wrapped, input),
            },
            SchemaKind::Nullable { wrapped, default } => match input {
                V::Null => default.clone().unwrap_or(V::Null),
                _ => self.parse(wrapped, input),
            },
            SchemaKind::Nullish { wrapped, default } => match input {
                V::Undefined | V::Null => default.clone().unwrap_or_else(|| input.clone()),
                _ => self.parse(wrapped, input),
            },
            SchemaKind::NonOptional { wrapped } => match input {
                V::Undefined => self.type_issue("non_optional", input),
                _ => self.parse(wrapped, input),
            },
            SchemaKind::NonNullable { wrapped } => match input {
                V::Null => self.type_issue("non_nullable", input),
                _ => self.parse(wrapped, input),
            },
            SchemaKind::NonNullish { wrapped } => match input {
                V::Undefined | V::Null => self.type_issue("non_nullish", input),
                _ => self.parse(wrapped, input),
            },

            SchemaKind::Any => self.run_pipe(schema, input.clone()),
            SchemaKind::Never => self.type_issue("never", input),
            SchemaKind::String => self.leaf(schema, input, matches!(input, V::String(_))),
            SchemaKind::Number => self.leaf(schema, input, matches!(input, V::Number(n) if !n.is_nan())),
            SchemaKind::NaN => self.leaf(schema, input, matches!(input, V::Number(n) if n.is_nan())),
            SchemaKind::Boolean => self.leaf(schema, input, matches!(input, V::Bool(_))),
            SchemaKind::BigInt => self.leaf(schema, input, matches!(input, V::BigInt(_))),
            SchemaKind::Symbol => self.leaf(schema, input, matches!(input, V::Symbol(_))),
            SchemaKind::Date => self.leaf(schema, input, matches!(input, V::Date(Some(_)))),
            SchemaKind::Blob => self.leaf(schema, input, matches!(input, V::Blob(_))),
            SchemaKind::Void => self.leaf(schema, input, input.is_undefined()),
            SchemaKind::Enum { values } => {
                let ok = input.as_str().is_some_and(|s| values.iter().any(|v| v == s));
                self.leaf(schema, input, ok)
            }
            SchemaKind::NativeEnum { members } => {
                let ok = members.values().any(|m| m.matches(input));
                self.leaf(schema, input, ok)
            }
            SchemaKind::Literal { literal } => {
                let ok = literal.to_value() == *input;
                self.leaf(schema, input, ok)
            }

            SchemaKind::Array { item } => match input {
                V::Array(xs) => {
                    let out = xs
                        .iter()
                        .enumerate()
                        .map(|(i, x)| self.nested(PathItem::new(PathSchema::Array, i), |cx| cx.parse(item, x)))
                        .collect();
                    self.run_pipe(schema, V::Array(out))
                }
                _ => self.type_issue("array", input),
            },
            SchemaKind::Tuple { items } => match input {
                V::Array(xs) if xs.len() == items.len() => {
                    let out = items
                        .iter()
                        .zip(xs)
                        .enumerate()
                        .map(|(i, (s, x))| self.nested(PathItem::new(PathSchema::Tuple, i), |cx| cx.parse(s, x)))
                        .collect();
                    self.run_pipe(schema, V::Array(out))
                }
                _ => self.type_issue("tuple", input),
            },
            SchemaKind::Set { value } => match input {
                V::Set(xs) => {
                    let out = xs
                        .iter()
                        .enumerate()
                        .map(|(i, x)| self.nested(PathItem::new(PathSchema::Set, i), |cx| cx.parse(value, x)))
                        .collect();
                    self.run_pipe(schema, V::Set(out))
                }
                _ => self.type_issue("set", input),
            },
            SchemaKind::Map { key, value } => match input {
                V::Map(pairs) => {
                    let out = pairs
                        .iter()
                        .map(|(k, v)| {
                            self.nested(PathItem::new(PathSchema::Map, k.to_string()), |cx| {
                                (cx.parse(key, k), cx.parse(value, v))
                            })
                        })
                        .collect();
                    self.run_pipe(schema, V::Map(out))
                }
                _ => self.type_issue("map", input),
            },
            SchemaKind::Record { key, value } => match input {
                V::Object(map) => {
                    let mut out = IndexMap::with_capacity(map.len());
                    for (k, v) in map {
                        let parsed = self.nested(PathItem::new(PathSchema::Record, k.as_str()), |cx| {
                            cx.parse(key, &V::String(k.clone()));
                            cx.parse(value, v)
                        });
                        out.insert(k.clone(), parsed);
                    }
                    self.run_pipe(schema, V::Object(out))
                }
                _ => self.type_issue("record", input),
            },
            SchemaKind::Object { entries } => match input {
                V::Object(map) => {
                    let mut out = IndexMap::with_capacity(entries.len());
                    for (k, field) in entries {
                        let present = map.get(k);
                        let parsed = self.nested(PathItem::new(PathSchema::Object, k.as_str()), |cx| {
                            cx.parse(field, present.unwrap_or(&UNDEFINED))
                        });
                        if present.is_some() || !parsed.is_undefined() {
                            out.insert(k.clone(), parsed);
                        }
                    }
                    self.run_pipe(schema, V::Object(out))
                }
                _ => self.type_issue("object", input),
            },
            SchemaKind::Union { options } => {
                for option in options {
                    let mut scratch = Context { path: self.path.clone(), issues: Vec::new() };
                    let out = scratch.parse(option, input);
                    if scratch.issues.is_empty() {
                        return self.run_pipe(schema, out);
                    }
                }
                self.type_issue("union", input)
            }
        }
    }
}
