use std::collections::HashMap;
use std::fmt;

use super::classification::Classification;
use super::config::KeyConfig;
use super::couplet::{Couplet, CoupletId, CoupletKind};
use super::error::{ClassifyError, ConfigError};
use super::expr::CompiledExpr;
use super::record::{Record, Row};
use super::ruleset::RuleSet;
use crate::parse::RuleSyntaxError;

/// An edge as declared, before couplet ids are resolved.
#[derive(Debug, Clone)]
pub(crate) struct PendingEdge {
    pub(crate) input: CoupletId,
    pub(crate) expression: String,
    pub(crate) output: Couplet,
}

/// A resolved edge. The expression is compiled when the graph is built; a
/// syntax error is kept and reported when the edge is first evaluated.
#[derive(Debug, Clone)]
pub(crate) struct Edge {
    pub(crate) from: usize,
    pub(crate) to: usize,
    pub(crate) expression: String,
    pub(crate) compiled: Result<CompiledExpr, RuleSyntaxError>,
}

/// Builder for constructing a [`DecisionGraph`] edge by edge.
///
/// ```
/// use clavis::{Couplet, CoupletKind, DecisionGraph};
///
/// let graph = DecisionGraph::builder("Demo key")
///     .edge(0, "1", Couplet::new(1, CoupletKind::Couplet, "Woody"))
///     .edge(0, "not 1", Couplet::new(90, CoupletKind::Class, "Grassland"))
///     .edge(1, "2", Couplet::new(91, CoupletKind::Class, "Forest"))
///     .build(true)
///     .unwrap();
/// assert_eq!(graph.node_count(), 4);
/// ```
#[derive(Debug)]
pub struct DecisionGraphBuilder {
    description: String,
    edges: Vec<PendingEdge>,
}

impl DecisionGraphBuilder {
    /// Add an edge from `input` to `output`, guarded by `expression`.
    #[must_use]
    pub fn edge(
        mut self,
        input: impl Into<CoupletId>,
        expression: &str,
        output: Couplet,
    ) -> Self {
        self.edges.push(PendingEdge {
            input: input.into(),
            expression: expression.to_owned(),
            output,
        });
        self
    }

    /// Resolve and validate the edges.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if an input couplet is undefined, a couplet
    /// id is reused with a different kind, a class has outgoing edges, or
    /// (when `check_cycles` is set) the key contains a cycle.
    pub fn build(self, check_cycles: bool) -> Result<DecisionGraph, ConfigError> {
        crate::compile::assemble_graph(&self.description, self.edges, check_cycles, |_, e| e)
    }
}

/// Directed graph of couplets joined by rule-guarded edges, with the root
/// (id 0) at index 0.
#[derive(Debug, Clone)]
pub struct DecisionGraph {
    pub(crate) couplets: Vec<Couplet>,
    pub(crate) index: HashMap<CoupletId, usize>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) outgoing: Vec<Vec<usize>>,
}

/// Borrowed view of one edge of a [`DecisionGraph`].
#[derive(Debug, Clone, Copy)]
pub struct EdgeRef<'a> {
    graph: &'a DecisionGraph,
    edge: &'a Edge,
}

impl<'a> EdgeRef<'a> {
    #[must_use]
    pub fn input(&self) -> &'a Couplet {
        &self.graph.couplets[self.edge.from]
    }

    #[must_use]
    pub fn output(&self) -> &'a Couplet {
        &self.graph.couplets[self.edge.to]
    }

    /// The guarding expression, trimmed.
    #[must_use]
    pub fn expression(&self) -> &'a str {
        &self.edge.expression
    }

    /// The compiled guard, or the syntax error it failed with.
    pub fn compiled(&self) -> Result<&'a CompiledExpr, &'a RuleSyntaxError> {
        self.edge.compiled.as_ref()
    }
}

impl DecisionGraph {
    #[must_use]
    pub fn builder(description: impl Into<String>) -> DecisionGraphBuilder {
        DecisionGraphBuilder {
            description: description.into(),
            edges: Vec::new(),
        }
    }

    /// Build a graph from key-table rows with the fields `INPUT_COUPLET`,
    /// `RULES`, `OUTPUT_COUPLET` or `OUTPUT_CLASS`, `OUTPUT_NAME` and
    /// optional `COMMENTS` (matched case-insensitively).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Row`] identifying the offending row, or
    /// [`ConfigError::CyclicKey`] if the key loops back on itself.
    pub fn from_rows(rows: &[Row], config: &KeyConfig) -> Result<Self, ConfigError> {
        crate::compile::build_graph(rows, config)
    }

    /// The root couplet.
    #[must_use]
    pub fn root(&self) -> &Couplet {
        &self.couplets[0]
    }

    /// The key description, carried as the root's name.
    #[must_use]
    pub fn description(&self) -> &str {
        self.root().name()
    }

    #[must_use]
    pub fn couplet(&self, id: &CoupletId) -> Option<&Couplet> {
        self.index.get(id).map(|&i| &self.couplets[i])
    }

    /// All couplets, root first, then in order of first declaration.
    pub fn couplets(&self) -> impl Iterator<Item = &Couplet> {
        self.couplets.iter()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.couplets.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges in declaration order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'_>> {
        self.edges.iter().map(|edge| EdgeRef { graph: self, edge })
    }

    /// Outgoing edges of a couplet, in declaration order. Empty for unknown
    /// ids and for classes.
    pub fn children(&self, id: &CoupletId) -> impl Iterator<Item = EdgeRef<'_>> {
        self.index
            .get(id)
            .map(|&i| self.outgoing[i].as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&e| EdgeRef {
                graph: self,
                edge: &self.edges[e],
            })
    }

    /// Re-derive key-table rows from the edges.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Row> {
        self.edges()
            .map(|edge| {
                let output = edge.output();
                let target = match output.kind() {
                    CoupletKind::Class => "OUTPUT_CLASS",
                    CoupletKind::Couplet | CoupletKind::Root => "OUTPUT_COUPLET",
                };
                Record::new()
                    .set("INPUT_COUPLET", edge.input().id().to_value())
                    .set("RULES", edge.expression())
                    .set(target, output.id().to_value())
                    .set("OUTPUT_NAME", output.name())
                    .set("COMMENTS", output.comment())
            })
            .collect()
    }

    /// Walk `record` from the root to a class.
    ///
    /// At each couplet every outgoing expression is evaluated; exactly one
    /// must match. The walk is bounded by `config.max_steps()`, or twice the
    /// number of couplets.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::NoMatch`] when nothing matches,
    /// [`ClassifyError::AmbiguousMatch`] when several edges match,
    /// [`ClassifyError::TraversalLimit`] when the bound is exhausted, and
    /// [`ClassifyError::Eval`] when an expression cannot be evaluated.
    pub fn classify(
        &self,
        rules: &RuleSet,
        record: &Record,
        config: &KeyConfig,
    ) -> Result<Classification, ClassifyError> {
        crate::evaluate::classify(self, rules, record, config)
    }
}

impl fmt::Display for DecisionGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DecisionGraph(\"{}\", {} couplets, {} edges)",
            self.description(),
            self.couplets.len(),
            self.edges.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> DecisionGraph {
        DecisionGraph::builder("Demo")
            .edge(0, "1", Couplet::new(1, CoupletKind::Couplet, "Woody"))
            .edge(0, "not 1", Couplet::new(90, CoupletKind::Class, "Grassland"))
            .edge(1, "2", Couplet::new(91, CoupletKind::Class, "Forest").with_comment("tall"))
            .edge(1, "not 2", Couplet::new(92, CoupletKind::Class, "Shrubland"))
            .build(true)
            .unwrap()
    }

    #[test]
    fn structure() {
        let g = graph();
        assert_eq!(g.node_count(), 5);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.root().kind(), CoupletKind::Root);
        assert_eq!(g.description(), "Demo");
        assert_eq!(g.couplet(&CoupletId::Int(91)).unwrap().name(), "Forest");
        assert!(g.couplet(&CoupletId::Int(5)).is_none());
        assert_eq!(g.to_string(), "DecisionGraph(\"Demo\", 5 couplets, 4 edges)");
    }

    #[test]
    fn children_in_declaration_order() {
        let g = graph();
        let exprs: Vec<&str> = g.children(&CoupletId::Int(1)).map(|e| e.expression()).collect();
        assert_eq!(exprs, vec!["2", "not 2"]);
        assert_eq!(g.children(&CoupletId::Int(91)).count(), 0);
        assert_eq!(g.children(&CoupletId::Int(12345)).count(), 0);
    }

    #[test]
    fn syntax_errors_are_kept_on_the_edge() {
        let g = DecisionGraph::builder("Demo")
            .edge(0, "1 not 2", Couplet::new(9, CoupletKind::Class, "Bad"))
            .build(true)
            .unwrap();
        let edge = g.edges().next().unwrap();
        assert_eq!(edge.expression(), "1 not 2");
        assert!(edge.compiled().is_err());
    }

    #[test]
    fn to_rows_uses_target_column_by_kind() {
        let g = graph();
        let rows = g.to_rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].get("OUTPUT_COUPLET"), Some(&crate::Value::Int(1)));
        assert_eq!(rows[0].get("OUTPUT_CLASS"), None);
        assert_eq!(rows[2].get("OUTPUT_CLASS"), Some(&crate::Value::Int(91)));
        assert_eq!(rows[2].get("COMMENTS"), Some(&crate::Value::from("tall")));
        assert_eq!(rows[3].get("RULES"), Some(&crate::Value::from("not 2")));
    }
}
