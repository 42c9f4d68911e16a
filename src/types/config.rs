/// Settings for building a key and classifying records with it.
///
/// ```
/// use clavis::KeyConfig;
///
/// let config = KeyConfig::new("Vegetation key")
///     .with_id_field("site_id")
///     .with_max_steps(64);
/// assert_eq!(config.id_field(), Some("site_id"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KeyConfig {
    description: String,
    id_field: Option<String>,
    check_cycles: bool,
    max_steps: Option<usize>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            description: "Key".to_owned(),
            id_field: None,
            check_cycles: true,
            max_steps: None,
        }
    }
}

impl KeyConfig {
    /// Default settings with the given key description, used as the root
    /// couplet's name.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Attribute holding each record's identifier. Its value is attached to
    /// the result, every step, and any classification error.
    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    /// Enable or disable the acyclicity check at construction time.
    #[must_use]
    pub fn with_cycle_check(mut self, enabled: bool) -> Self {
        self.check_cycles = enabled;
        self
    }

    /// Override the traversal bound, which defaults to twice the number of
    /// couplets in the key.
    #[must_use]
    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = Some(steps);
        self
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn id_field(&self) -> Option<&str> {
        self.id_field.as_deref()
    }

    #[must_use]
    pub fn check_cycles(&self) -> bool {
        self.check_cycles
    }

    #[must_use]
    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }
}
