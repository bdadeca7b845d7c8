//! Form-data coercion: raw submitted text → the primitive its schema kind implies.
//!
//! The set of coercible kinds is a closed allow-list. A text value meeting any other
//! kind is an authoring error and fails loudly rather than passing the raw text on.
//! Files and missing values are never coerced.
mod literal;
mod native_enum;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::error::{Error, Result};
use crate::form_data::{FormData, FormDataEntry};
use crate::introspect::Introspector;
use crate::schema::{Schema, SchemaKind};
use crate::value::{FormValue, Symbol};

const TRUTHY: [&str; 3] = ["on", "true", "yes"];

/// Coerce every declared field of an object schema from `form`.
///
/// The schema itself must be an `object` node; modifiers around it are not unwrapped.
pub fn coerce_form_data(schema: &Schema, form: &FormData) -> Result<FormValue> {
    coerce_form_data_with(Introspector::global(), schema, form)
}

pub fn coerce_form_data_with(
    introspector: &Introspector,
    schema: &Schema,
    form: &FormData,
) -> Result<FormValue> {
    let entries = schema.entries().ok_or(Error::SchemaNotObject)?;

    let mut output = IndexMap::with_capacity(entries.len());
    for (key, field) in entries {
        let config = introspector.resolve(field);
        let value = match config.schema.kind() {
            SchemaKind::Array { item } => {
                let items = form
                    .get_all(key)
                    .map(|entry| coerce_entry_with(introspector, item, Some(entry)))
                    .collect::<Result<Vec<_>>>()?;
                FormValue::Array(items)
            }
            _ => coerce_entry_with(introspector, &config.schema, form.get(key))?,
        };
        tracing::trace!(field = %key, kind = config.schema.kind().name(), "coerced form field");
        output.insert(key.clone(), value);
    }
    Ok(FormValue::Object(output))
}

/// Coerce one submitted entry against `schema` (modifiers are unwrapped first).
pub fn coerce_entry(schema: &Schema, entry: Option<&FormDataEntry>) -> Result<FormValue> {
    coerce_entry_with(Introspector::global(), schema, entry)
}

pub fn coerce_entry_with(
    introspector: &Introspector,
    schema: &Schema,
    entry: Option<&FormDataEntry>,
) -> Result<FormValue> {
    let text = match entry {
        None => return Ok(FormValue::Null),
        Some(FormDataEntry::File(blob)) => return Ok(FormValue::Blob(blob.clone())),
        Some(FormDataEntry::Text(text)) => text.as_str(),
    };

    let config = introspector.resolve(schema);
    let value = match config.schema.kind() {
        SchemaKind::Any => FormValue::String(String::new()),
        SchemaKind::String | SchemaKind::Enum { .. } => FormValue::String(text.to_owned()),
        SchemaKind::Number => FormValue::Number(parse_number(text)),
        SchemaKind::Boolean => FormValue::Bool(is_truthy(text)),
        SchemaKind::Symbol => FormValue::Symbol(Symbol::new(Some(text.to_owned()))),
        SchemaKind::Date => FormValue::Date(parse_date(text)),
        SchemaKind::BigInt => parse_bigint(text),
        SchemaKind::Literal { literal } => literal::coerce(literal, text),
        SchemaKind::NativeEnum { members } => native_enum::coerce(members, text),
        other @ (SchemaKind::Blob
        | SchemaKind::NaN
        | SchemaKind::Void
        | SchemaKind::Never
        | SchemaKind::Array { .. }
        | SchemaKind::Object { .. }
        | SchemaKind::Map { .. }
        | SchemaKind::Set { .. }
        | SchemaKind::Record { .. }
        | SchemaKind::Tuple { .. }
        | SchemaKind::Union { .. }
        | SchemaKind::Optional { .. }
        | SchemaKind::Nullable { .. }
        | SchemaKind::Nullish { .. }
        | SchemaKind::NonOptional { .. }
        | SchemaKind::NonNullable { .. }
        | SchemaKind::NonNullish { .. }) => return Err(Error::UnsupportedKind(other.name())),
    };
    Ok(value)
}

/// Case-insensitive membership in the accepted truthy set; everything else is false.
pub(crate) fn is_truthy(text: &str) -> bool {
    let lowered = text.to_lowercase();
    TRUTHY.contains(&lowered.as_str())
}

/// Numeric reading of form text: surrounding whitespace is ignored, blank reads as
/// zero, `Infinity` and `0x` hex are understood, anything else unparseable is NaN.
pub(crate) fn parse_number(text: &str) -> f64 {
    let t = text.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map(|n| n as f64).unwrap_or(f64::NAN);
    }
    // reject the spellings Rust accepts but forms never mean ("inf", "NaN", ...)
    if t.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Integer text becomes a bigint; unparseable text stays text for the validator to reject.
pub(crate) fn parse_bigint(text: &str) -> FormValue {
    match bigint_from_text(text) {
        Some(i) => FormValue::BigInt(i),
        None => FormValue::String(text.to_owned()),
    }
}

/// Arbitrary-precision integer text: blank is zero, decimal takes an optional sign,
/// `0x` / `0o` / `0b` prefixes take unsigned digits in that radix.
pub(crate) fn bigint_from_text(text: &str) -> Option<BigInt> {
    let t = text.trim();
    if t.is_empty() {
        return Some(BigInt::default());
    }
    if t.contains('_') {
        return None;
    }
    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        let head = t.get(..2).filter(|head| head.eq_ignore_ascii_case(prefix));
        if head.is_some() {
            let digits = &t[2..];
            if digits.starts_with(['+', '-']) {
                return None;
            }
            return BigInt::parse_bytes(digits.as_bytes(), radix);
        }
    }
    t.parse::<BigInt>().ok()
}

/// RFC 3339, or the shapes `<input type="date">` and `datetime-local` submit (as UTC).
pub(crate) fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let t = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
