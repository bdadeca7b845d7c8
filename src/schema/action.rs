use once_cell::sync::Lazy;
use regex::Regex;

use crate::value::FormValue;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w+\-]+(?:\.[\w+\-]+)*@[\dA-Za-z\-]+(?:\.[\dA-Za-z\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

#[derive(Debug, Clone)]
pub enum Check {
    MinLength(usize),
    MaxLength(usize),
    Length(usize),
    MinValue(f64),
    MaxValue(f64),
    Integer,
    Email,
    Regex(Regex),
}

/// A refinement run after a node's type check passes.
#[derive(Debug, Clone)]
pub struct Action {
    pub check: Check,
    pub message: Option<String>,
}

impl Action {
    pub fn min_length(n: usize) -> Self { Check::MinLength(n).into() }
    pub fn max_length(n: usize) -> Self { Check::MaxLength(n).into() }
    pub fn length(n: usize) -> Self { Check::Length(n).into() }
    pub fn min_value(n: f64) -> Self { Check::MinValue(n).into() }
    pub fn max_value(n: f64) -> Self { Check::MaxValue(n).into() }
    pub fn integer() -> Self { Check::Integer.into() }
    pub fn email() -> Self { Check::Email.into() }
    pub fn regex(re: Regex) -> Self { Check::Regex(re).into() }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Validation identifier reported on failing issues.
    pub fn name(&self) -> &'static str {
        match self.check {
            Check::MinLength(_) => "min_length",
            Check::MaxLength(_) => "max_length",
            Check::Length(_) => "length",
            Check::MinValue(_) => "min_value",
            Check::MaxValue(_) => "max_value",
            Check::Integer => "integer",
            Check::Email => "email",
            Check::Regex(_) => "regex",
        }
    }

    pub fn message(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        match self.check {
            Check::MinLength(_) | Check::MaxLength(_) | Check::Length(_) => "Invalid length",
            Check::MinValue(_) | Check::MaxValue(_) => "Invalid value",
            Check::Integer => "Invalid integer",
            Check::Email => "Invalid email",
            Check::Regex(_) => "Invalid regex",
        }
        .to_string()
    }

    /// True when `value` satisfies the check. Checks that do not apply to the
    /// value's shape pass.
    pub fn accepts(&self, value: &FormValue) -> bool {
        let len = match value {
            FormValue::String(s) => Some(s.chars().count()),
            FormValue::Array(xs) | FormValue::Set(xs) => Some(xs.len()),
            FormValue::Map(pairs) => Some(pairs.len()),
            _ => None,
        };
        match (&self.check, value) {
            (Check::MinLength(n), _) => len.is_none_or(|len| len >= *n),
            (Check::MaxLength(n), _) => len.is_none_or(|len| len <= *n),
            (Check::Length(n), _) => len.is_none_or(|len| len == *n),
            (Check::MinValue(min), FormValue::Number(x)) => x >= min,
            (Check::MaxValue(max), FormValue::Number(x)) => x <= max,
            (Check::Integer, FormValue::Number(x)) => x.is_finite() && x.fract() == 0.0,
            (Check::Email, FormValue::String(s)) => EMAIL.is_match(s),
            (Check::Regex(re), FormValue::String(s)) => re.is_match(s),
            _ => true,
        }
    }
}

impl From<Check> for Action {
    fn from(check: Check) -> Self {
        Self { check, message: None }
    }
}
