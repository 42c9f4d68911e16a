mod classification;
mod config;
mod couplet;
mod error;
mod expr;
mod graph;
mod key;
mod record;
mod rule;
mod ruleset;
mod value;

pub use classification::{Classification, Step};
pub use config::KeyConfig;
pub use couplet::{Couplet, CoupletId, CoupletKind, ROOT_ID};
pub use error::{ClassifyError, ConfigError, EvalError};
pub use expr::{CompiledExpr, Expr};
pub(crate) use graph::{Edge, PendingEdge};
pub use graph::{DecisionGraph, DecisionGraphBuilder, EdgeRef};
pub use key::{Key, UndefinedReference};
pub use record::{Record, Row};
pub use rule::{Operator, Rule, RuleId};
pub(crate) use ruleset::compile_expression;
pub use ruleset::{RuleSet, RuleSetBuilder};
pub use value::Value;
