use std::fmt;

use super::couplet::Couplet;
use super::value::Value;

/// One couplet visited while classifying a record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    index: usize,
    couplet: Couplet,
    record_id: Option<Value>,
}

impl Step {
    pub(crate) fn new(index: usize, couplet: Couplet, record_id: Option<Value>) -> Self {
        Self {
            index,
            couplet,
            record_id,
        }
    }

    /// Zero-based position in the path; the root is step 0.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn couplet(&self) -> &Couplet {
        &self.couplet
    }

    #[must_use]
    pub fn record_id(&self) -> Option<&Value> {
        self.record_id.as_ref()
    }
}

/// Successful classification: the class reached and the path taken.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct Classification {
    result: Couplet,
    steps: Vec<Step>,
    record_id: Option<Value>,
}

impl Classification {
    pub(crate) fn new(result: Couplet, path: Vec<Couplet>, record_id: Option<Value>) -> Self {
        let steps = path
            .into_iter()
            .enumerate()
            .map(|(i, c)| Step::new(i, c, record_id.clone()))
            .collect();
        Self {
            result,
            steps,
            record_id,
        }
    }

    /// The terminal class couplet.
    #[must_use]
    pub fn result(&self) -> &Couplet {
        &self.result
    }

    /// Visited couplets from the root to the result, inclusive.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn record_id(&self) -> Option<&Value> {
        self.record_id.as_ref()
    }

    /// Consume into `(result, steps)`.
    #[must_use]
    pub fn into_parts(self) -> (Couplet, Vec<Step>) {
        (self.result, self.steps)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = &self.record_id {
            write!(f, "{id}: ")?;
        }
        write!(f, "{} via [", self.result.name())?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", step.couplet.id())?;
        }
        f.write_str("]")
    }
}
