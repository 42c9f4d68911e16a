use std::fmt;
use std::hash::{Hash, Hasher};

use super::value::Value;

/// Identity of a couplet.
///
/// Keys normally number their couplets, but textual ids are accepted.
/// [`CoupletId::from_value`] normalises numeric strings and integral floats
/// to [`CoupletId::Int`] so that `5`, `5.0` and `"5"` name the same couplet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum CoupletId {
    Int(i64),
    Text(String),
}

/// The root couplet's id.
pub const ROOT_ID: CoupletId = CoupletId::Int(0);

impl CoupletId {
    /// Interpret a table value as a couplet id. Returns `None` for booleans,
    /// non-integral floats and blank strings.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(i) = value.as_integer() {
            return Some(CoupletId::Int(i));
        }
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(CoupletId::Text(s.trim().to_owned())),
            _ => None,
        }
    }

    /// The id as a table value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            CoupletId::Int(i) => Value::Int(*i),
            CoupletId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<i64> for CoupletId {
    fn from(v: i64) -> Self {
        CoupletId::Int(v)
    }
}

impl From<i32> for CoupletId {
    fn from(v: i32) -> Self {
        CoupletId::Int(i64::from(v))
    }
}

impl From<&str> for CoupletId {
    fn from(v: &str) -> Self {
        CoupletId::Text(v.to_owned())
    }
}

impl From<String> for CoupletId {
    fn from(v: String) -> Self {
        CoupletId::Text(v)
    }
}

impl fmt::Display for CoupletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoupletId::Int(v) => write!(f, "{v}"),
            CoupletId::Text(v) => f.write_str(v),
        }
    }
}

/// Role of a couplet in the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CoupletKind {
    Root,
    Couplet,
    /// Terminal: classification stops here.
    Class,
}

impl fmt::Display for CoupletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoupletKind::Root => f.write_str("root"),
            CoupletKind::Couplet => f.write_str("couplet"),
            CoupletKind::Class => f.write_str("class"),
        }
    }
}

/// A node of the decision graph.
///
/// Couplets compare and hash by id alone.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Couplet {
    id: CoupletId,
    kind: CoupletKind,
    name: String,
    comment: String,
}

impl Couplet {
    #[must_use]
    pub fn new(id: impl Into<CoupletId>, kind: CoupletKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            comment: String::new(),
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    #[must_use]
    pub fn id(&self) -> &CoupletId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> CoupletKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.kind == CoupletKind::Class
    }
}

impl PartialEq for Couplet {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Couplet {}

impl Hash for Couplet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Couplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.id, self.name)
    }
}
