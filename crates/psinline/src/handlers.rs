//
// handlers.rs
//
// Copyright (C) 2024-2026 Posit Software, PBC. All rights reserved.
// Modifications copyright (C) 2026 Jonathan Marc Bearak
//

use tower_lsp::lsp_types::*;

use crate::config::ScopePolicy;
use crate::outline::document_outline;
use crate::scope::{ScopeResolver, SymbolSource};
use crate::state::{Document, WorldState};
use crate::variable_scanner::{is_comment_line, scan_line};

/// A variable the debugger should evaluate and show inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    pub range: Range,
    pub name: String,
    /// Always false: PowerShell variable names are case-insensitive.
    pub case_sensitive: bool,
}

impl From<VariableReference> for InlineValue {
    fn from(reference: VariableReference) -> Self {
        InlineValue::VariableLookup(InlineValueVariableLookup {
            range: reference.range,
            variable_name: Some(reference.name),
            case_sensitive_lookup: reference.case_sensitive,
        })
    }
}

/// Collect the variable references visible at `stopped`.
///
/// Lines from the scope start line through the stopped location's end line
/// are scanned, skipping comment lines and lines of functions that do not
/// contain the stopped location. Results are ordered by line, then by column.
pub async fn provide_inline_values<S: SymbolSource>(
    resolver: &ScopeResolver<S>,
    uri: &Url,
    doc: &Document,
    stopped: &Range,
    policy: ScopePolicy,
) -> Vec<VariableReference> {
    let start_line = resolver.start_line(uri, policy, stopped).await;
    let excluded = resolver.excluded_lines(uri, stopped, start_line).await;
    log::trace!(
        "Inline values for {}: lines {}..={}, {} excluded",
        uri,
        start_line,
        stopped.end.line,
        excluded.len()
    );

    let mut references = Vec::new();
    for line in start_line..=stopped.end.line {
        if excluded.contains(&line) {
            continue;
        }
        let Some(text) = doc.line_text(line as usize) else {
            break;
        };
        if is_comment_line(&text) {
            continue;
        }

        references.extend(scan_line(&text).into_iter().map(|m| VariableReference {
            range: Range {
                start: Position::new(line, m.start),
                end: Position::new(line, m.end),
            },
            name: m.name,
            case_sensitive: false,
        }));
    }

    log::trace!("Found {} variable references in {}", references.len(), uri);
    references
}

pub fn document_symbol(state: &WorldState, uri: &Url) -> Option<DocumentSymbolResponse> {
    let doc = state.get_document(uri)?;
    Some(DocumentSymbolResponse::Nested(document_outline(&doc.text())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::OutlineSymbolSource;
    use crate::scope::FunctionCache;
    use std::sync::Arc;

    fn uri() -> Url {
        Url::parse("file:///workspace/script.ps1").unwrap()
    }

    fn stopped(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> Range {
        Range {
            start: Position::new(start_line, start_char),
            end: Position::new(end_line, end_char),
        }
    }

    /// Run the full pipeline with the built-in outline as symbol source.
    async fn run(text: &str, stopped: Range, policy: ScopePolicy) -> Vec<(u32, u32, u32, String)> {
        let doc = Document::new(text, None);
        let source = OutlineSymbolSource::new(uri(), text.to_string());
        let resolver = ScopeResolver::new(source, Arc::new(FunctionCache::new()));
        provide_inline_values(&resolver, &uri(), &doc, &stopped, policy)
            .await
            .into_iter()
            .map(|r| {
                assert!(!r.case_sensitive);
                assert_eq!(r.range.start.line, r.range.end.line);
                (r.range.start.line, r.range.start.character, r.range.end.character, r.name)
            })
            .collect()
    }

    fn refs(expected: &[(u32, u32, &str)]) -> Vec<(u32, u32, u32, String)> {
        expected
            .iter()
            .map(|(line, start, name)| (*line, *start, start + name.len() as u32, name.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_variables_below_stopped_location_ignored() {
        let text = "\n$a;\n$b\n$a,$b # Stopped location\n$a+$b\n$a/$b\n$a*$b\n";
        let result = run(text, stopped(3, 0, 3, 6), ScopePolicy::CurrentFunction).await;
        assert_eq!(
            result,
            refs(&[(1, 0, "$a"), (2, 0, "$b"), (3, 0, "$a"), (3, 3, "$b")])
        );
    }

    #[tokio::test]
    async fn test_comment_lines_skipped() {
        let text = "$a = 1\n  # $commented = 2\n$b = 3\n";
        let result = run(text, stopped(2, 0, 2, 6), ScopePolicy::Document).await;
        assert_eq!(result, refs(&[(0, 0, "$a"), (2, 0, "$b")]));
    }

    #[tokio::test]
    async fn test_current_function_scope() {
        let text = "\n$a;\nfunction test1 {\n    function test2 {\n        $b\n    }\n    $a # Stopped location\n}\n$notfound\n";
        let result = run(text, stopped(6, 4, 6, 7), ScopePolicy::CurrentFunction).await;
        assert_eq!(result, refs(&[(6, 4, "$a")]));
    }

    #[tokio::test]
    async fn test_nested_function_scope() {
        let text = "\n$a;\nfunction test1 {\n    $a\n    function test2 {\n        $b # Stopped location\n    }\n}\n$notfound\n";
        let result = run(text, stopped(5, 8, 5, 11), ScopePolicy::CurrentFunction).await;
        assert_eq!(result, refs(&[(5, 8, "$b")]));
    }

    #[tokio::test]
    async fn test_outside_functions_scans_from_document_start() {
        let text = "\n$a;\nfunction test1 {\n    function test2 {\n        $b\n    }\n    $a\n}\n$b # Stopped location\n$notfound\n";
        let result = run(text, stopped(8, 0, 8, 3), ScopePolicy::CurrentFunction).await;
        assert_eq!(result, refs(&[(1, 0, "$a"), (8, 0, "$b")]));
    }

    #[tokio::test]
    async fn test_document_policy_still_excludes_other_functions() {
        let text = "\n$a;\nfunction test1 {\n    $x\n    function test2 {\n        $b\n    }\n    $a # Stopped location\n}\n";
        let result = run(text, stopped(7, 4, 7, 7), ScopePolicy::Document).await;
        assert_eq!(
            result,
            refs(&[(1, 0, "$a"), (3, 4, "$x"), (7, 4, "$a")])
        );
    }

    #[tokio::test]
    async fn test_stopped_location_past_end_of_document() {
        let text = "$a\n$b";
        let result = run(text, stopped(10, 0, 10, 1), ScopePolicy::Document).await;
        assert_eq!(result, refs(&[(0, 0, "$a"), (1, 0, "$b")]));
    }

    #[tokio::test]
    async fn test_braced_range_uses_canonical_length() {
        let text = "@{key = ${special var}}";
        let result = run(text, stopped(0, 0, 0, 0), ScopePolicy::Document).await;
        assert_eq!(result, vec![(0, 8, 20, "$special var".to_string())]);
    }

    #[tokio::test]
    async fn test_carriage_return_line_endings() {
        let text = "function f {\r$x\r}\r$y";
        let result = run(text, stopped(3, 0, 3, 2), ScopePolicy::CurrentFunction).await;
        assert_eq!(result, refs(&[(3, 0, "$y")]));
    }

    #[tokio::test]
    async fn test_crlf_line_endings_inside_function() {
        let text = "$a\r\nfunction f {\r\n    $b\r\n}\r\n";
        let result = run(text, stopped(2, 4, 2, 6), ScopePolicy::CurrentFunction).await;
        assert_eq!(result, refs(&[(2, 4, "$b")]));
    }

    #[tokio::test]
    async fn test_function_keyword_as_argument_excludes_nothing() {
        let text = "Write-Host function test\nif ($x) {\n    $y\n}\n$z";
        let result = run(text, stopped(4, 0, 4, 2), ScopePolicy::CurrentFunction).await;
        assert_eq!(result, refs(&[(1, 4, "$x"), (2, 4, "$y"), (4, 0, "$z")]));
    }

    #[test]
    fn test_variable_reference_into_inline_value() {
        let reference = VariableReference {
            range: stopped(2, 4, 2, 6),
            name: "$a".to_string(),
            case_sensitive: false,
        };
        match InlineValue::from(reference) {
            InlineValue::VariableLookup(lookup) => {
                assert_eq!(lookup.variable_name.as_deref(), Some("$a"));
                assert!(!lookup.case_sensitive_lookup);
                assert_eq!(lookup.range.start, Position::new(2, 4));
            }
            other => panic!("unexpected inline value: {:?}", other),
        }
    }

    #[test]
    fn test_document_symbol_nested() {
        let mut state = WorldState::new();
        state.open_document(uri(), "function outer {\n    function inner { }\n}\n", None);
        let Some(DocumentSymbolResponse::Nested(symbols)) = document_symbol(&state, &uri()) else {
            panic!("expected nested symbols");
        };
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "outer");
        assert_eq!(symbols[0].children.as_ref().unwrap()[0].name, "inner");
    }

    #[test]
    fn test_document_symbol_unknown_document() {
        let state = WorldState::new();
        assert!(document_symbol(&state, &uri()).is_none());
    }
}
