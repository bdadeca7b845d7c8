//! Modifier unwrapping with a process-lifetime memo table.
//!
//! Schema trees are built once and never mutated, so a resolved [`SchemaConfig`] is
//! valid for as long as its [`SchemaId`] is. Entries are never evicted.
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::schema::{Schema, SchemaId, SchemaKind};
use crate::value::FormValue;

/// A schema node with its modifier chain peeled off.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaConfig {
    /// The first node in the chain that is not a modifier.
    pub schema: Schema,
    pub optional: bool,
    pub nullable: bool,
    /// Only ever set when `optional` is.
    pub optional_default: Option<FormValue>,
    /// Only ever set when `nullable` is.
    pub nullable_default: Option<FormValue>,
}

#[derive(Default)]
pub struct Introspector {
    cache: RwLock<HashMap<SchemaId, Arc<SchemaConfig>>>,
}

static GLOBAL: Lazy<Introspector> = Lazy::new(Introspector::new);

impl Introspector {
    pub fn new() -> Self { Self::default() }

    /// Shared table used by the free functions of this crate.
    pub fn global() -> &'static Introspector { &GLOBAL }

    pub fn resolve(&self, schema: &Schema) -> Arc<SchemaConfig> {
        let id = schema.id();
        if let Some(hit) = self.cache.read().unwrap_or_else(PoisonError::into_inner).get(&id) {
            return Arc::clone(hit);
        }
        tracing::trace!(kind = schema.kind().name(), "introspector cache miss");
        let config = Arc::new(unwrap_modifiers(schema));
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(id).or_insert(config))
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Resolve through the global table.
pub fn resolve(schema: &Schema) -> Arc<SchemaConfig> {
    Introspector::global().resolve(schema)
}

/// One axis (optional or nullable). The flag is decided by the first modifier that
/// touches the axis, the default by the first one that declares a default. A default
/// only survives when the flag ends up set.
#[derive(Default)]
struct Axis {
    flag: Option<bool>,
    default: Option<FormValue>,
}

impl Axis {
    fn set(&mut self, on: bool, default: Option<&FormValue>) {
        self.flag.get_or_insert(on);
        if self.default.is_none() {
            self.default = default.cloned();
        }
    }

    fn finish(self) -> (bool, Option<FormValue>) {
        let on = self.flag.unwrap_or(false);
        (on, self.default.filter(|_| on))
    }
}

fn unwrap_modifiers(schema: &Schema) -> SchemaConfig {
    let mut current = schema;
    let mut optional = Axis::default();
    let mut nullable = Axis::default();

    while let Some(wrapped) = current.kind().wrapped() {
        match current.kind() {
            SchemaKind::Optional { default, .. } => optional.set(true, default.as_ref()),
            SchemaKind::NonOptional { .. } => optional.set(false, None),
            SchemaKind::Nullable { default, .. } => nullable.set(true, default.as_ref()),
            SchemaKind::NonNullable { .. } => nullable.set(false, None),
            SchemaKind::Nullish { default, .. } => {
                optional.set(true, default.as_ref());
                nullable.set(true, default.as_ref());
            }
            SchemaKind::NonNullish { .. } => {
                optional.set(false, None);
                nullable.set(false, None);
            }
            _ => {}
        }
        current = wrapped;
    }

    let (optional, optional_default) = optional.finish();
    let (nullable, nullable_default) = nullable.finish();
    SchemaConfig {
        schema: current.clone(),
        optional,
        nullable,
        optional_default,
        nullable_default,
    }
}
