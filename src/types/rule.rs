use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};

use super::error::{ConfigError, EvalError};
use super::record::Record;
use crate::parse::RuleSyntaxError;

/// Identifier of a rule within a [`RuleSet`](super::RuleSet).
pub type RuleId = u32;

const REL_TOL: f64 = 1e-9;
const ABS_TOL: f64 = 0.0;

/// Comparison applied by a [`Rule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    In,
    GreaterEqual,
    GreaterThan,
    LessEqual,
    LessThan,
    Regex,
}

impl FromStr for Operator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "=" | "==" | "equals" | "equal" => Ok(Operator::Equal),
            "in" => Ok(Operator::In),
            ">=" | "ge" => Ok(Operator::GreaterEqual),
            ">" | "gt" => Ok(Operator::GreaterThan),
            "<=" | "le" => Ok(Operator::LessEqual),
            "<" | "lt" => Ok(Operator::LessThan),
            "re" | "regex" => Ok(Operator::Regex),
            _ => Err(ConfigError::UnknownOperator {
                operator: s.trim().to_owned(),
            }),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Equal => "equal",
            Operator::In => "in",
            Operator::GreaterEqual => "ge",
            Operator::GreaterThan => "gt",
            Operator::LessEqual => "le",
            Operator::LessThan => "lt",
            Operator::Regex => "regex",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
enum Literal {
    /// Trimmed, upper-cased comparison text.
    Text(String),
    Pattern(Regex),
}

/// A single predicate comparing one record attribute against a literal.
///
/// For `equal`, `ge`, `gt`, `le` and `lt`, both sides are compared as numbers
/// when both parse as floats (equality is tolerant to a relative error of
/// `1e-9`), and as case-insensitive strings otherwise. `in` is a
/// case-insensitive substring test; `regex` is a case-insensitive search.
#[derive(Debug, Clone)]
pub struct Rule {
    attribute: String,
    operator: Operator,
    literal: Literal,
    name: String,
    comment: String,
}

impl Rule {
    /// Build a rule from its table spelling.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownOperator`] for an unrecognised operator
    /// and [`ConfigError::InvalidPattern`] when a regex operator is given a
    /// pattern that does not compile.
    pub fn new(
        value: &str,
        attribute: &str,
        operator: &str,
        name: &str,
        comment: &str,
    ) -> Result<Self, ConfigError> {
        Self::with_operator(value, attribute, operator.parse()?, name, comment)
    }

    /// Build a rule from an already-resolved [`Operator`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] when `operator` is
    /// [`Operator::Regex`] and `value` is not a valid pattern.
    pub fn with_operator(
        value: &str,
        attribute: &str,
        operator: Operator,
        name: &str,
        comment: &str,
    ) -> Result<Self, ConfigError> {
        let value = value.trim();
        let literal = if operator == Operator::Regex {
            let pattern = RegexBuilder::new(value)
                .case_insensitive(true)
                .build()
                .map_err(|e| RuleSyntaxError::new(value, e.to_string()))?;
            Literal::Pattern(pattern)
        } else {
            Literal::Text(value.to_uppercase())
        };
        Ok(Self {
            attribute: attribute.trim().to_owned(),
            operator,
            literal,
            name: name.trim().to_owned(),
            comment: comment.trim().to_owned(),
        })
    }

    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The comparison literal: the normalised text, or the pattern source for
    /// regex rules.
    #[must_use]
    pub fn value(&self) -> &str {
        match &self.literal {
            Literal::Text(text) => text,
            Literal::Pattern(pattern) => pattern.as_str(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Test this rule against a record.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::MissingAttribute`] when the record has no value
    /// for the rule's attribute.
    pub fn apply(&self, record: &Record) -> Result<bool, EvalError> {
        let raw = record
            .get(&self.attribute)
            .ok_or_else(|| EvalError::MissingAttribute {
                rule: self.name.clone(),
                attribute: self.attribute.clone(),
            })?
            .as_text();
        let raw = raw.trim();

        let text = match &self.literal {
            Literal::Pattern(pattern) => return Ok(pattern.is_match(raw)),
            Literal::Text(text) => text,
        };
        let value = raw.to_uppercase();

        if self.operator == Operator::In {
            return Ok(value.contains(text.as_str()));
        }

        Ok(match (as_number(&value), as_number(text)) {
            (Some(a), Some(b)) => match self.operator {
                Operator::Equal => is_close(a, b),
                Operator::GreaterEqual => a >= b,
                Operator::GreaterThan => a > b,
                Operator::LessEqual => a <= b,
                Operator::LessThan => a < b,
                Operator::In | Operator::Regex => false,
            },
            _ => {
                let (a, b) = (value.as_str(), text.as_str());
                match self.operator {
                    Operator::Equal => a == b,
                    Operator::GreaterEqual => a >= b,
                    Operator::GreaterThan => a > b,
                    Operator::LessEqual => a <= b,
                    Operator::LessThan => a < b,
                    Operator::In | Operator::Regex => false,
                }
            }
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {} \"{}\")",
            self.name,
            self.attribute,
            self.operator,
            self.value()
        )
    }
}

fn as_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// Tolerant float equality: `|a - b| <= max(rel_tol * max(|a|, |b|), abs_tol)`.
fn is_close(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= f64::max(REL_TOL * a.abs().max(b.abs()), ABS_TOL)
}
