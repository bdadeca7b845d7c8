//! Initial values for untouched forms.
use chrono::Utc;
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::introspect::Introspector;
use crate::schema::{Schema, SchemaKind};
use crate::value::{Blob, FormValue, Symbol};

/// Value a fresh form governed by `schema` starts with.
pub fn derive_default(schema: &Schema) -> FormValue {
    derive_default_with(Introspector::global(), schema)
}

pub fn derive_default_with(introspector: &Introspector, schema: &Schema) -> FormValue {
    let config = introspector.resolve(schema);

    if config.nullable {
        return config.nullable_default.clone().unwrap_or(FormValue::Null);
    }
    if config.optional {
        return config.optional_default.clone().unwrap_or(FormValue::Undefined);
    }

    match config.schema.kind() {
        SchemaKind::String => FormValue::String(String::new()),
        SchemaKind::Number => FormValue::Number(0.0),
        SchemaKind::Boolean => FormValue::Bool(false),
        SchemaKind::Array { .. } => FormValue::Array(Vec::new()),
        SchemaKind::Object { entries } => {
            let fields: IndexMap<String, FormValue> = entries
                .iter()
                .filter(|(_, field)| !matches!(field.kind(), SchemaKind::Never))
                .map(|(key, field)| (key.clone(), derive_default_with(introspector, field)))
                .collect();
            FormValue::Object(fields)
        }
        SchemaKind::Map { .. } => FormValue::Map(Vec::new()),
        SchemaKind::Set { .. } => FormValue::Set(Vec::new()),
        SchemaKind::Record { .. } => FormValue::Object(IndexMap::new()),
        SchemaKind::BigInt => FormValue::BigInt(BigInt::default()),
        SchemaKind::Symbol => FormValue::Symbol(Symbol::new(None)),
        SchemaKind::Date => FormValue::Date(Some(Utc::now())),
        // First alternative, not the best match.
        SchemaKind::Union { options } => options
            .first()
            .map(|first| derive_default_with(introspector, first))
            .unwrap_or_default(),
        SchemaKind::Blob => FormValue::Blob(Blob::default()),
        SchemaKind::Enum { values } => values
            .first()
            .map(|v| FormValue::String(v.clone()))
            .unwrap_or_default(),
        SchemaKind::Literal { literal } => literal.to_value(),
        SchemaKind::NaN => FormValue::Number(f64::NAN),
        SchemaKind::Tuple { items } => FormValue::Array(
            items.iter().map(|item| derive_default_with(introspector, item)).collect(),
        ),
        SchemaKind::Void => FormValue::Undefined,
        SchemaKind::NativeEnum { members } => members
            .values()
            .next()
            .map(|v| v.to_value())
            .unwrap_or_default(),
        SchemaKind::Any | SchemaKind::Never => FormValue::Undefined,
        // resolved configs never carry a modifier as their base
        SchemaKind::Optional { .. }
        | SchemaKind::Nullable { .. }
        | SchemaKind::Nullish { .. }
        | SchemaKind::NonOptional { .. }
        | SchemaKind::NonNullable { .. }
        | SchemaKind::NonNullish { .. } => FormValue::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumValue, Literal};
    use pretty_assertions::assert_eq;

    #[test]
    fn object_keys_match_declaration_minus_never() {
        let schema = Schema::object([
            ("name", Schema::string()),
            ("secret", Schema::never()),
            ("age", Schema::number()),
            ("admin", Schema::boolean()),
            ("tags", Schema::array(Schema::string())),
        ]);
        let value = derive_default(&schema);
        let keys: Vec<_> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "age", "admin", "tags"]);
        assert_eq!(value.get("name"), Some(&FormValue::from("")));
        assert_eq!(value.get("age"), Some(&FormValue::Number(0.0)));
        assert_eq!(value.get("admin"), Some(&FormValue::Bool(false)));
        assert_eq!(value.get("tags"), Some(&FormValue::Array(vec![])));
    }

    #[test]
    fn nested_modifier_defaults_reach_the_form() {
        assert_eq!(derive_default(&Schema::string().optional_with("x").optional()), FormValue::from("x"));
        assert_eq!(derive_default(&Schema::number().nullable_with(5.0).nullable()), FormValue::Number(5.0));
        assert_eq!(derive_default(&Schema::string().optional().optional()), FormValue::Undefined);
    }

    #[test]
    fn tuple_default_has_declared_arity() {
        let schema = Schema::tuple([Schema::string(), Schema::number(), Schema::bigint()]);
        assert_eq!(
            derive_default(&schema),
            FormValue::Array(vec![FormValue::from(""), FormValue::Number(0.0), FormValue::BigInt(BigInt::default())])
        );
    }

    #[test]
    fn nullable_beats_optional_and_defaults_apply() {
        assert_eq!(derive_default(&Schema::string().nullable()), FormValue::Null);
        assert_eq!(derive_default(&Schema::string().optional()), FormValue::Undefined);
        assert_eq!(derive_default(&Schema::string().optional_with("x")), FormValue::from("x"));
        assert_eq!(derive_default(&Schema::number().nullish_with(5.0)), FormValue::Number(5.0));
        assert_eq!(
            derive_default(&Schema::string().optional_with("x").nullable()),
            FormValue::Null
        );
    }

    #[test]
    fn union_takes_first_alternative() {
        let schema = Schema::union([Schema::number(), Schema::string()]);
        assert_eq!(derive_default(&schema), FormValue::Number(0.0));
        assert_eq!(derive_default(&Schema::union([])), FormValue::Undefined);
    }

    #[test]
    fn enum_literal_and_native_enum_pick_declared_values() {
        assert_eq!(derive_default(&Schema::enumeration(["red", "green"])), FormValue::from("red"));
        assert_eq!(
            derive_default(&Schema::literal(Literal::Number(42.0))),
            FormValue::Number(42.0)
        );
        let native = Schema::native_enum([
            ("Low", EnumValue::Number(1.0)),
            ("High", EnumValue::Number(2.0)),
        ]);
        assert_eq!(derive_default(&native), FormValue::Number(1.0));
    }

    #[test]
    fn special_kinds() {
        assert!(matches!(derive_default(&Schema::nan()), FormValue::Number(n) if n.is_nan()));
        assert!(matches!(derive_default(&Schema::date()), FormValue::Date(Some(_))));
        assert!(matches!(derive_default(&Schema::symbol()), FormValue::Symbol(_)));
        assert_eq!(derive_default(&Schema::void()), FormValue::Undefined);
        assert_eq!(derive_default(&Schema::any()), FormValue::Undefined);
        assert_eq!(derive_default(&Schema::blob()), FormValue::Blob(Blob::default()));
        assert_eq!(derive_default(&Schema::record(Schema::string(), Schema::number())), FormValue::Object(IndexMap::new()));
        assert_eq!(derive_default(&Schema::map(Schema::string(), Schema::number())), FormValue::Map(vec![]));
        assert_eq!(derive_default(&Schema::set(Schema::string())), FormValue::Set(vec![]));
    }
}
