//! Classify attribute records by walking a dichotomous key.
//!
//! A [`RuleSet`] holds numbered [`Rule`]s and compiles boolean expressions
//! such as `not (12 or 34)` that reference them. A [`DecisionGraph`] links
//! [`Couplet`]s with edges guarded by those expressions. A [`Key`] pairs the
//! two and walks a [`Record`] from the root to a terminal class.
//!
//! ```
//! use clavis::{Key, KeyConfig, Record};
//!
//! let rules = vec![Record::new()
//!     .set("id", 1_i64)
//!     .set("attribute", "A")
//!     .set("operator", "in")
//!     .set("value", "X")
//!     .set("name", "r1")];
//! let key_rows = vec![Record::new()
//!     .set("input_couplet", 0_i64)
//!     .set("rules", "1")
//!     .set("output_class", 99_i64)
//!     .set("output_name", "LeafX")];
//!
//! let key = Key::from_rows(&rules, &key_rows, KeyConfig::new("Demo key")).unwrap();
//! let outcome = key.classify(&Record::new().set("A", "contains X here")).unwrap();
//! assert_eq!(outcome.result().name(), "LeafX");
//! ```

mod compile;
mod error;
mod evaluate;
pub mod parse;
mod types;

pub use error::ClavisError;
pub use parse::RuleSyntaxError;
pub use types::{
    Classification, ClassifyError, CompiledExpr, ConfigError, Couplet, CoupletId, CoupletKind,
    DecisionGraph, DecisionGraphBuilder, EdgeRef, EvalError, Expr, Key, KeyConfig, Operator,
    ROOT_ID, Record, Row, Rule, RuleId, RuleSet, RuleSetBuilder, Step, UndefinedReference, Value,
};
