use indexmap::IndexMap;

use crate::schema::EnumValue;
use crate::value::FormValue;

/// Resolve submitted text against a native enumeration.
///
/// A member name resolves to its value, following one alias hop when that value is
/// itself a member name (the reverse mapping numeric enums carry). Text equal to a
/// member value is kept. Anything else is absent; the validator reports it.
pub(super) fn coerce(members: &IndexMap<String, EnumValue>, text: &str) -> FormValue {
    if let Some(value) = members.get(text) {
        return match value {
            EnumValue::Number(_) => value.to_value(),
            EnumValue::String(alias) => members
                .get(alias.as_str())
                .map(EnumValue::to_value)
                .unwrap_or_else(|| value.to_value()),
        };
    }

    let by_value = members.values().find(|v| match v {
        EnumValue::String(s) => s == text,
        EnumValue::Number(n) => text.trim().parse::<f64>().is_ok_and(|x| x == *n),
    });
    match by_value {
        Some(EnumValue::String(_)) => FormValue::String(text.to_owned()),
        Some(number) => number.to_value(),
        None => {
            tracing::warn!(text, "value matches no enum member, leaving field absent");
            FormValue::Undefined
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric() -> IndexMap<String, EnumValue> {
        // enum Level { Low = 0, High = 1 } with its reverse mapping
        [
            ("Low", EnumValue::Number(0.0)),
            ("High", EnumValue::Number(1.0)),
            ("0", EnumValue::String("Low".into())),
            ("1", EnumValue::String("High".into())),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn string_backed() -> IndexMap<String, EnumValue> {
        [("Admin", EnumValue::String("admin".into())), ("User", EnumValue::String("user".into()))]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn numeric_names_and_reverse_keys_resolve_to_numbers() {
        assert_eq!(coerce(&numeric(), "High"), FormValue::Number(1.0));
        assert_eq!(coerce(&numeric(), "0"), FormValue::Number(0.0));
    }

    #[test]
    fn string_backed_names_and_values() {
        assert_eq!(coerce(&string_backed(), "Admin"), FormValue::from("admin"));
        assert_eq!(coerce(&string_backed(), "user"), FormValue::from("user"));
    }

    #[test]
    fn unknown_text_is_absent() {
        assert_eq!(coerce(&string_backed(), "root"), FormValue::Undefined);
        assert_eq!(coerce(&numeric(), "7"), FormValue::Undefined);
    }

    #[test]
    fn numeric_values_without_reverse_mapping() {
        let members: IndexMap<String, EnumValue> =
            [("Five".to_string(), EnumValue::Number(5.0))].into_iter().collect();
        assert_eq!(coerce(&members, "5"), FormValue::Number(5.0));
    }
}
