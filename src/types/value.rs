use std::borrow::Cow;
use std::fmt;

/// Attribute values carried by records and table rows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// A UTF-8 string.
    String(String),
}

impl Value {
    /// The string form used by rule comparisons.
    ///
    /// Floats keep their decimal point (`5.0`, not `5`) and write exponents
    /// with a sign and at least two digits (`1e+16`, `2.5e-07`). Booleans
    /// render as `true`/`false`, strings are returned unchanged.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s),
            Value::Int(v) => Cow::Owned(v.to_string()),
            Value::Float(v) => Cow::Owned(float_text(*v)),
            Value::Bool(v) => Cow::Owned(v.to_string()),
        }
    }

    /// `true` for strings that are empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::String(s) if s.trim().is_empty())
    }

    /// Interpret the value as a whole number: integers, integral floats and
    /// numeric strings qualify.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => {
                let i = *v as i64;
                (i as f64 == *v).then_some(i)
            }
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| Value::Float(s.parse::<f64>().ok()?).as_integer())
            }
            Value::Float(_) | Value::Bool(_) => None,
        }
    }
}

fn float_text(v: f64) -> String {
    let text = format!("{v:?}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => write!(f, "\"{v}\""),
            other => f.write_str(&other.as_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(42_i64), Value::Int(42));
        assert_eq!(Value::from(7_i32), Value::Int(7));
        assert_eq!(Value::from(2.5_f64), Value::Float(2.5));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_owned()));
        assert_eq!(
            Value::from("owned".to_owned()),
            Value::String("owned".to_owned())
        );
    }

    #[test]
    fn text_form() {
        assert_eq!(Value::Int(42).as_text(), "42");
        assert_eq!(Value::Float(5.0).as_text(), "5.0");
        assert_eq!(Value::Float(2.25).as_text(), "2.25");
        assert_eq!(Value::Float(1e15).as_text(), "1000000000000000.0");
        assert_eq!(Value::Float(1e16).as_text(), "1e+16");
        assert_eq!(Value::Float(1.5e300).as_text(), "1.5e+300");
        assert_eq!(Value::Float(-2.5e-7).as_text(), "-2.5e-07");
        assert_eq!(Value::Float(0.0001).as_text(), "0.0001");
        assert_eq!(Value::Bool(false).as_text(), "false");
        assert_eq!(Value::from("abc").as_text(), "abc");
    }

    #[test]
    fn display_quotes_strings() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::String("hello".into()).to_string(), "\"hello\"");
    }

    #[test]
    fn blank_detection() {
        assert!(Value::from("").is_blank());
        assert!(Value::from("  \t").is_blank());
        assert!(!Value::from("x").is_blank());
        assert!(!Value::Int(0).is_blank());
    }

    #[test]
    fn integer_interpretation() {
        assert_eq!(Value::Int(12).as_integer(), Some(12));
        assert_eq!(Value::Float(12.0).as_integer(), Some(12));
        assert_eq!(Value::Float(12.5).as_integer(), None);
        assert_eq!(Value::from(" 34 ").as_integer(), Some(34));
        assert_eq!(Value::from("34.0").as_integer(), Some(34));
        assert_eq!(Value::from("abc").as_integer(), None);
        assert_eq!(Value::Bool(true).as_integer(), None);
        assert_eq!(Value::Float(f64::NAN).as_integer(), None);
    }
}
