use std::fmt;

use tracing::debug;

use super::classification::Classification;
use super::config::KeyConfig;
use super::couplet::CoupletId;
use super::error::{ClassifyError, ConfigError};
use super::graph::DecisionGraph;
use super::record::{Record, Row};
use super::rule::RuleId;
use super::ruleset::RuleSet;

/// An edge whose expression names a rule absent from the rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndefinedReference {
    pub input: CoupletId,
    pub output: CoupletId,
    pub expression: String,
    pub rule: RuleId,
}

/// A classification key: a [`RuleSet`] and the [`DecisionGraph`] whose edges
/// reference it. Immutable and thread-safe; designed to live behind `Arc`.
#[derive(Debug)]
pub struct Key {
    rules: RuleSet,
    graph: DecisionGraph,
    config: KeyConfig,
}

impl Key {
    #[must_use]
    pub fn new(rules: RuleSet, graph: DecisionGraph, config: KeyConfig) -> Self {
        Self {
            rules,
            graph,
            config,
        }
    }

    /// Build both the rule set and the decision graph from their tables.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] met in either table; no partially
    /// built key is returned.
    pub fn from_rows(
        rule_rows: &[Row],
        key_rows: &[Row],
        config: KeyConfig,
    ) -> Result<Self, ConfigError> {
        let rules = RuleSet::from_rows(rule_rows)?;
        let graph = DecisionGraph::from_rows(key_rows, &config)?;
        Ok(Self::new(rules, graph, config))
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    #[must_use]
    pub fn graph(&self) -> &DecisionGraph {
        &self.graph
    }

    #[must_use]
    pub fn config(&self) -> &KeyConfig {
        &self.config
    }

    /// Classify one record.
    ///
    /// # Errors
    ///
    /// See [`DecisionGraph::classify`].
    pub fn classify(&self, record: &Record) -> Result<Classification, ClassifyError> {
        self.graph.classify(&self.rules, record, &self.config)
    }

    /// Lazily classify a sequence of records, yielding one outcome per record
    /// in input order. A failure never stops the iteration.
    pub fn classify_iter<'a, I>(
        &'a self,
        records: I,
    ) -> impl Iterator<Item = Result<Classification, ClassifyError>> + 'a
    where
        I: IntoIterator<Item = &'a Record>,
        I::IntoIter: 'a,
    {
        records.into_iter().map(move |record| {
            let outcome = self.classify(record);
            if let Err(err) = &outcome {
                debug!(error = %err, "record could not be classified");
            }
            outcome
        })
    }

    /// Classify every record, collecting the outcomes in input order.
    #[must_use]
    pub fn classify_all(&self, records: &[Record]) -> Vec<Result<Classification, ClassifyError>> {
        self.classify_iter(records).collect()
    }

    /// Edges referencing rule ids that the rule set does not define. Edges
    /// with malformed expressions are skipped.
    #[must_use]
    pub fn undefined_references(&self) -> Vec<UndefinedReference> {
        self.graph
            .edges()
            .filter_map(|edge| Some((edge, edge.compiled().ok()?)))
            .flat_map(|(edge, expr)| {
                self.rules
                    .undefined_in(expr)
                    .into_iter()
                    .map(move |rule| UndefinedReference {
                        input: edge.input().id().clone(),
                        output: edge.output().id().clone(),
                        expression: edge.expression().to_owned(),
                        rule,
                    })
            })
            .collect()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({}, {})", self.rules, self.graph)
    }
}
