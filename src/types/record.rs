use std::collections::HashMap;
use std::fmt;

use super::Value;

/// A named-attribute mapping: one record to classify, or one row of a rule
/// or key table.
///
/// Attribute names are matched case-insensitively and ignore surrounding
/// whitespace; internally they are stored upper-cased.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(from = "HashMap<String, Value>", into = "HashMap<String, Value>")
)]
pub struct Record {
    values: HashMap<String, Value>,
}

/// A row of a rule or key table. Rows and records share one representation.
pub type Row = Record;

fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any existing value under the same name.
    #[must_use]
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Insert an attribute (mutable reference version).
    pub fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(normalize(name), value);
    }

    /// Look up an attribute by name, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&normalize(name))
    }

    /// Like [`get`](Self::get), but treats blank strings as absent.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.get(name).filter(|v| !v.is_blank())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(NAME, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k.as_ref(), v.into());
        }
        record
    }
}

impl From<HashMap<String, Value>> for Record {
    fn from(map: HashMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl From<Record> for HashMap<String, Value> {
    fn from(record: Record) -> Self {
        record.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.values.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        f.write_str("{")?;
        for (i, (k, v)) in entries.into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
    }
}
