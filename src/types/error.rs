use thiserror::Error;

use super::couplet::{Couplet, CoupletId, CoupletKind};
use super::record::Record;
use super::rule::RuleId;
use super::value::Value;
use crate::parse::RuleSyntaxError;

/// Malformed rule or key definitions, detected while building a
/// [`RuleSet`](super::RuleSet) or [`DecisionGraph`](super::DecisionGraph).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{table} table row {row} {content}: {source}")]
    Row {
        table: &'static str,
        row: usize,
        content: String,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("missing mandatory field '{field}'")]
    MissingField { field: &'static str },

    #[error("exactly one of OUTPUT_COUPLET or OUTPUT_CLASS is required")]
    InvalidOutputTarget,

    #[error("unknown operator '{operator}'")]
    UnknownOperator { operator: String },

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] RuleSyntaxError),

    #[error("rule id must be a positive integer, got {value}")]
    InvalidRuleId { value: Value },

    #[error("duplicate rule id {id}")]
    DuplicateRule { id: RuleId },

    #[error("invalid couplet id {value}")]
    InvalidCoupletId { value: Value },

    #[error("input couplet {id} is neither the root nor the output of any row")]
    UndefinedInputCouplet { id: CoupletId },

    #[error("couplet {id} is declared as both {first} and {second}")]
    ConflictingCouplet {
        id: CoupletId,
        first: CoupletKind,
        second: CoupletKind,
    },

    #[error("class {id} cannot have outgoing rule sets")]
    ClassHasBranches { id: CoupletId },

    #[error("cycle in key: {}", join_ids(.path))]
    CyclicKey { path: Vec<CoupletId> },

    #[error("couplet {id} cannot be reached from the root")]
    UnreachableCouplet { id: CoupletId },
}

/// Failures while evaluating a ruleset expression against a record.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error(transparent)]
    Syntax(#[from] RuleSyntaxError),

    #[error("undefined rule {id} referenced in \"{expression}\"")]
    UndefinedRule { id: RuleId, expression: String },

    #[error("record has no attribute '{attribute}' required by rule '{rule}'")]
    MissingAttribute { rule: String, attribute: String },
}

/// Failure to classify a single record.
///
/// Every variant carries the record, the identifier value (when an
/// identifier field is configured), and the couplets visited so far.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(
        "unable to classify record{}: no rule set matched at couplet {} (visited {})",
        fmt_record_id(.record_id),
        last_id(.path),
        join_couplets(.path)
    )]
    NoMatch {
        record: Box<Record>,
        record_id: Option<Value>,
        path: Vec<Couplet>,
    },

    #[error(
        "record{} matches multiple rule sets for couplet {} (\"{}\")",
        fmt_record_id(.record_id),
        couplet_id(.couplet),
        join_expressions(.expressions)
    )]
    AmbiguousMatch {
        record: Box<Record>,
        record_id: Option<Value>,
        path: Vec<Couplet>,
        couplet: Couplet,
        expressions: Vec<String>,
    },

    #[error(
        "unable to classify record{}: no class reached within {limit} steps (visited {})",
        fmt_record_id(.record_id),
        join_couplets(.path)
    )]
    TraversalLimit {
        record: Box<Record>,
        record_id: Option<Value>,
        path: Vec<Couplet>,
        limit: usize,
    },

    #[error(
        "unable to classify record{} at couplet {}: {source}",
        fmt_record_id(.record_id),
        last_id(.path)
    )]
    Eval {
        record: Box<Record>,
        record_id: Option<Value>,
        path: Vec<Couplet>,
        #[source]
        source: EvalError,
    },
}

impl ClassifyError {
    /// The record that failed to classify.
    #[must_use]
    pub fn record(&self) -> &Record {
        match self {
            ClassifyError::NoMatch { record, .. }
            | ClassifyError::AmbiguousMatch { record, .. }
            | ClassifyError::TraversalLimit { record, .. }
            | ClassifyError::Eval { record, .. } => record,
        }
    }

    /// The couplets visited before the failure, root first.
    #[must_use]
    pub fn path(&self) -> &[Couplet] {
        match self {
            ClassifyError::NoMatch { path, .. }
            | ClassifyError::AmbiguousMatch { path, .. }
            | ClassifyError::TraversalLimit { path, .. }
            | ClassifyError::Eval { path, .. } => path,
        }
    }

    /// The record identifier value, when an identifier field is configured.
    #[must_use]
    pub fn record_id(&self) -> Option<&Value> {
        match self {
            ClassifyError::NoMatch { record_id, .. }
            | ClassifyError::AmbiguousMatch { record_id, .. }
            | ClassifyError::TraversalLimit { record_id, .. }
            | ClassifyError::Eval { record_id, .. } => record_id.as_ref(),
        }
    }
}

fn fmt_record_id(id: &Option<Value>) -> String {
    id.as_ref().map(|v| format!(" {v}")).unwrap_or_default()
}

fn couplet_id(couplet: &Couplet) -> String {
    couplet.id().to_string()
}

fn join_expressions(expressions: &[String]) -> String {
    expressions.join("\", \"")
}

fn last_id(path: &[Couplet]) -> String {
    path.last().map(|c| c.id().to_string()).unwrap_or_default()
}

fn join_couplets(path: &[Couplet]) -> String {
    path.iter()
        .map(|c| c.id().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn join_ids(path: &[CoupletId]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
