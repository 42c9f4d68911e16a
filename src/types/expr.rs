use std::collections::BTreeSet;
use std::fmt;
use std::ops::Not;

use super::rule::RuleId;

/// Boolean expression tree over rule ids.
///
/// Produced by [`parse()`](crate::parse::parse) from strings such as
/// `not (12 or 34)`, or built directly with [`Expr::rule`], [`Expr::and`],
/// [`Expr::or`] and the `!` operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Rule(RuleId),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    #[must_use]
    pub fn rule(id: RuleId) -> Expr {
        Expr::Rule(id)
    }

    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }

    /// Every rule id referenced anywhere in the tree, in ascending order.
    #[must_use]
    pub fn rule_ids(&self) -> BTreeSet<RuleId> {
        let mut ids = BTreeSet::new();
        collect_rule_ids(self, &mut ids);
        ids
    }
}

fn collect_rule_ids(expr: &Expr, out: &mut BTreeSet<RuleId>) {
    match expr {
        Expr::Rule(id) => {
            out.insert(*id);
        }
        Expr::And(a, b) | Expr::Or(a, b) => {
            collect_rule_ids(a, out);
            collect_rule_ids(b, out);
        }
        Expr::Not(inner) => collect_rule_ids(inner, out),
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Rule(id) => write!(f, "{id}"),
            Expr::Not(inner) if matches!(inner.as_ref(), Expr::Not(_)) => {
                write!(f, "not ({inner})")
            }
            Expr::Not(inner) => write!(f, "not {inner}"),
            Expr::And(a, b) => write!(f, "({a} and {b})"),
            Expr::Or(a, b) => write!(f, "({a} or {b})"),
        }
    }
}

/// A parsed ruleset expression ready for repeated evaluation.
///
/// Keeps the source text it was compiled from so that errors and reports can
/// refer to the expression exactly as it appeared in the key table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExpr {
    source: String,
    tree: Expr,
}

impl CompiledExpr {
    pub(crate) fn new(source: impl Into<String>, tree: Expr) -> Self {
        Self {
            source: source.into(),
            tree,
        }
    }

    /// The expression text, trimmed.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn tree(&self) -> &Expr {
        &self.tree
    }

    #[must_use]
    pub fn rule_ids(&self) -> BTreeSet<RuleId> {
        self.tree.rule_ids()
    }
}

impl fmt::Display for CompiledExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
