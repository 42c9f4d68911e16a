use std::fmt;

/// A ruleset expression that does not conform to the boolean grammar.
///
/// Carries the offending expression and the underlying parser diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSyntaxError {
    expression: String,
    message: String,
}

impl RuleSyntaxError {
    pub(crate) fn new(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// The expression (or regex pattern) that failed to parse.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The parser diagnostic.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RuleSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid ruleset expression \"{}\": {}",
            self.expression, self.message
        )
    }
}

impl std::error::Error for RuleSyntaxError {}
