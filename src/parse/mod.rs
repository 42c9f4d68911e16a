//! Parser for ruleset expressions.
//!
//! The accepted grammar is
//!
//! ```text
//! expr := [ "not" ] term ( ( "and" | "or" ) [ "not" ] term )*
//! term := integer | "(" expr ")"
//! ```
//!
//! `and` binds tighter than `or`, and `not` applies to the term that follows
//! it. Integers are base-10 rule ids; no other tokens are legal.

mod error;
mod grammar;

pub use error::RuleSyntaxError;

use crate::Expr;

/// Parse a ruleset expression such as `not (12 or 34)` into an [`Expr`] tree.
///
/// Leading and trailing whitespace is ignored.
///
/// # Errors
///
/// Returns [`RuleSyntaxError`] if the input is empty or does not conform to
/// the grammar.
pub fn parse(input: &str) -> Result<Expr, RuleSyntaxError> {
    use winnow::Parser;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RuleSyntaxError::new(input, "empty expression"));
    }
    grammar::expression
        .parse(trimmed)
        .map_err(|e| RuleSyntaxError::new(trimmed, e.to_string()))
}
