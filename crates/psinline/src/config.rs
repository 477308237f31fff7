//
// config.rs
//
// Configuration for inline value search
//

/// How much of the document is searched for variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopePolicy {
    /// Search from the first line of the document
    Document,
    /// Search from the start of the innermost function containing the
    /// stopped location, or from the document start outside any function
    #[default]
    CurrentFunction,
}

impl ScopePolicy {
    /// Parse the `startLocation` setting. Unrecognised values fall back to
    /// the default.
    pub fn from_setting(value: &str) -> Self {
        match value {
            "document" => ScopePolicy::Document,
            "currentFunction" => ScopePolicy::CurrentFunction,
            other => {
                log::warn!(
                    "Unrecognised startLocation '{}', using currentFunction",
                    other
                );
                ScopePolicy::default()
            }
        }
    }
}

/// Inline values configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineValuesConfig {
    /// Where the variable search starts
    pub start_location: ScopePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = InlineValuesConfig::default();
        assert_eq!(config.start_location, ScopePolicy::CurrentFunction);
    }

    #[test]
    fn test_from_setting() {
        assert_eq!(ScopePolicy::from_setting("document"), ScopePolicy::Document);
        assert_eq!(
            ScopePolicy::from_setting("currentFunction"),
            ScopePolicy::CurrentFunction
        );
    }

    #[test]
    fn test_from_setting_unknown_falls_back() {
        assert_eq!(ScopePolicy::from_setting(""), ScopePolicy::CurrentFunction);
        assert_eq!(ScopePolicy::from_setting("Document"), ScopePolicy::CurrentFunction);
        assert_eq!(ScopePolicy::from_setting("file"), ScopePolicy::CurrentFunction);
    }
}
