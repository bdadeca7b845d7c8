use crate::schema::Literal;
use crate::value::{FormValue, Symbol};

/// Coerce text to the runtime type of the literal's own value.
pub(super) fn coerce(literal: &Literal, text: &str) -> FormValue {
    match literal {
        Literal::BigInt(_) => super::parse_bigint(text),
        Literal::Boolean(_) => FormValue::Bool(super::is_truthy(text)),
        Literal::Number(_) => FormValue::Number(super::parse_number(text)),
        Literal::String(_) => FormValue::String(text.to_owned()),
        Literal::Symbol(_) => FormValue::Symbol(Symbol::new(Some(text.to_owned()))),
    }
}
