use thiserror::Error;

use crate::parse::RuleSyntaxError;
use crate::{ClassifyError, ConfigError, EvalError};

/// Unified error type covering construction, expression syntax, evaluation,
/// and classification failures.
///
/// Returned by convenience methods like [`Key::from_rows()`](crate::Key::from_rows)
/// when callers do not need to distinguish the stage that failed.
#[derive(Debug, Error)]
pub enum ClavisError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Syntax(#[from] RuleSyntaxError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),
}
