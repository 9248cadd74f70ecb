//! Text rendering configuration.

/// Configuration for the pretty text rendering.
///
/// Immutable once constructed and cheap to clone, so one instance can be
/// shared read-only across any number of editing sessions.
#[derive(Debug, Clone)]
pub struct TextOptions {
    /// The indent written per nesting level of the pretty form.
    pub indent: String,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
        }
    }
}

impl TextOptions {
    /// Creates options with the default two-space indent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indent string used for each nesting level.
    #[must_use]
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_indent_is_two_spaces() {
        assert_eq!(TextOptions::default().indent, "  ");
    }

    #[test]
    fn builder_pattern() {
        let options = TextOptions::new().indent("\t");
        assert_eq!(options.indent, "\t");
    }
}
