use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::error::{ConfigError, EvalError};
use super::expr::CompiledExpr;
use super::record::{Record, Row};
use super::rule::{Rule, RuleId};
use crate::parse::RuleSyntaxError;

/// Maximum number of compiled expressions kept by [`RuleSet::test`].
pub(crate) const EXPRESSION_CACHE_CAPACITY: usize = 1024;

/// Builder for constructing a [`RuleSet`] programmatically.
///
/// # Example
///
/// ```
/// use clavis::{Record, Rule, RuleSetBuilder};
///
/// let rules = RuleSetBuilder::new()
///     .rule(1, Rule::new("tree", "form", "in", "treed", "").unwrap())
///     .rule(2, Rule::new("10", "height", "ge", "tall", "").unwrap())
///     .build()
///     .unwrap();
///
/// let record = Record::new().set("form", "Tree mallee").set("height", 12_i64);
/// assert!(rules.test("1 and 2", &record).unwrap());
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<(RuleId, Rule)>,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule under `id`.
    #[must_use]
    pub fn rule(mut self, id: RuleId, rule: Rule) -> Self {
        self.rules.push((id, rule));
        self
    }

    /// Assemble the rules into an immutable `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateRule`] if an id was registered twice,
    /// or [`ConfigError::InvalidRuleId`] for id 0.
    pub fn build(self) -> Result<RuleSet, ConfigError> {
        crate::compile::assemble_rules(self.rules)
    }
}

/// Numbered rules plus the compiler/evaluator for boolean expressions that
/// reference them.
///
/// Immutable once built apart from a bounded internal cache of compiled
/// expressions; safe to share behind `Arc` across threads.
#[derive(Debug)]
pub struct RuleSet {
    pub(crate) rules: BTreeMap<RuleId, Rule>,
    cache: RwLock<HashMap<String, Arc<CompiledExpr>>>,
}

impl RuleSet {
    pub(crate) fn from_map(rules: BTreeMap<RuleId, Rule>) -> Self {
        Self {
            rules,
            cache: RwLock::default(),
        }
    }

    #[must_use]
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::new()
    }

    /// Build a rule set from rule-table rows with the fields `ID`,
    /// `ATTRIBUTE`, `OPERATOR`, `VALUE`, `NAME` and optional `COMMENTS`
    /// (matched case-insensitively).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Row`] identifying the first offending row.
    pub fn from_rows(rows: &[Row]) -> Result<Self, ConfigError> {
        crate::compile::build_rules(rows)
    }

    #[must_use]
    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: RuleId) -> bool {
        self.rules.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().map(|(id, rule)| (*id, rule))
    }

    /// Parse an expression into a reusable compiled form.
    ///
    /// Rule ids are not resolved here: a reference to an absent rule only
    /// fails when evaluation reaches it.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSyntaxError`] if the expression is malformed.
    pub fn compile(&self, expr: &str) -> Result<CompiledExpr, RuleSyntaxError> {
        compile_expression(expr)
    }

    /// Evaluate a compiled expression against a record, short-circuiting
    /// `and`/`or`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UndefinedRule`] when evaluation reaches a rule id
    /// absent from this set, or [`EvalError::MissingAttribute`] when a rule's
    /// attribute is missing from the record.
    pub fn evaluate(&self, expr: &CompiledExpr, record: &Record) -> Result<bool, EvalError> {
        crate::evaluate::eval_expr(expr.tree(), self, record, expr.source())
    }

    /// Compile (or fetch from the cache) and evaluate `expr` against `record`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Syntax`] for a malformed expression, otherwise the
    /// errors of [`evaluate`](Self::evaluate).
    pub fn test(&self, expr: &str, record: &Record) -> Result<bool, EvalError> {
        let compiled = self.cached(expr)?;
        self.evaluate(&compiled, record)
    }

    /// Rule ids referenced by `expr` that are not defined in this set.
    #[must_use]
    pub fn undefined_in(&self, expr: &CompiledExpr) -> Vec<RuleId> {
        expr.rule_ids()
            .into_iter()
            .filter(|id| !self.contains(*id))
            .collect()
    }

    fn cached(&self, expr: &str) -> Result<Arc<CompiledExpr>, RuleSyntaxError> {
        let key = expr.trim();
        if let Some(hit) = self.cache.read().get(key) {
            return Ok(Arc::clone(hit));
        }
        let compiled = Arc::new(compile_expression(key)?);

        let mut cache = self.cache.write();
        // Evict an arbitrary entry once full
        if cache.len() >= EXPRESSION_CACHE_CAPACITY
            && !cache.contains_key(key)
            && let Some(evicted) = cache.keys().next().cloned()
        {
            cache.remove(&evicted);
        }
        cache.insert(key.to_owned(), Arc::clone(&compiled));
        Ok(compiled)
    }
}

pub(crate) fn compile_expression(expr: &str) -> Result<CompiledExpr, RuleSyntaxError> {
    let tree = crate::parse::parse(expr)?;
    Ok(CompiledExpr::new(expr.trim(), tree))
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleSet({} rules)", self.rules.len())
    }
}
