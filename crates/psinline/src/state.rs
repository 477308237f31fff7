//
// state.rs
//
// Open documents, configuration and session caches shared by the server
//

use std::collections::HashMap;
use std::sync::Arc;

use ropey::Rope;
use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};

use crate::config::InlineValuesConfig;
use crate::scope::FunctionCache;
use crate::utf16::{is_line_break, utf16_offset_to_char_offset};

/// An open document
#[derive(Clone)]
pub struct Document {
    pub contents: Rope,
    pub version: Option<i32>,
    pub revision: u64,
}

impl Document {
    pub fn new(text: &str, version: Option<i32>) -> Self {
        Self {
            contents: Rope::from_str(text),
            version,
            revision: 0,
        }
    }

    pub fn apply_change(&mut self, change: TextDocumentContentChangeEvent) {
        if let Some(range) = change.range {
            let start_idx = self.char_index(range.start.line as usize, range.start.character as usize);
            let end_idx = self.char_index(range.end.line as usize, range.end.character as usize);

            self.contents.remove(start_idx..end_idx.max(start_idx));
            self.contents.insert(start_idx, &change.text);
        } else {
            // Full document sync
            self.contents = Rope::from_str(&change.text);
        }

        self.revision += 1;
    }

    /// Char index in the rope of an LSP position, clamped to the document.
    fn char_index(&self, line: usize, utf16_char: usize) -> usize {
        if line >= self.contents.len_lines() {
            return self.contents.len_chars();
        }
        let line_text = self.contents.line(line).to_string();
        let char_offset = utf16_offset_to_char_offset(&line_text, utf16_char);
        self.contents.line_to_char(line) + char_offset
    }

    pub fn line_count(&self) -> usize {
        self.contents.len_lines()
    }

    /// Text of line `idx` without its line terminator.
    pub fn line_text(&self, idx: usize) -> Option<String> {
        let line = self.contents.get_line(idx)?.to_string();
        Some(line.trim_end_matches(is_line_break).to_string())
    }

    pub fn text(&self) -> String {
        self.contents.to_string()
    }
}

pub struct WorldState {
    pub documents: HashMap<Url, Document>,
    pub config: InlineValuesConfig,
    /// Function symbols per document for the current debug session.
    /// Shared by `Arc` so requests can use it without holding the state lock.
    pub function_cache: Arc<FunctionCache>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldState {
    pub fn new() -> Self {
        let config = InlineValuesConfig::default();
        log::info!("Initializing with start_location: {:?}", config.start_location);

        Self {
            documents: HashMap::new(),
            config,
            function_cache: Arc::new(FunctionCache::new()),
        }
    }

    pub fn open_document(&mut self, uri: Url, text: &str, version: Option<i32>) {
        self.documents.insert(uri, Document::new(text, version));
    }

    pub fn close_document(&mut self, uri: &Url) {
        self.documents.remove(uri);
    }

    pub fn apply_change(&mut self, uri: &Url, change: TextDocumentContentChangeEvent) {
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.apply_change(change);
        }
    }

    pub fn get_document(&self, uri: &Url) -> Option<&Document> {
        self.documents.get(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::{Position, Range};

    fn edit(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range {
                start: Position::new(start.0, start.1),
                end: Position::new(end.0, end.1),
            }),
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_document_apply_change_ascii() {
        let mut doc = Document::new("$hello = 'world'", None);
        doc.apply_change(edit((0, 1), (0, 6), "greeting"));
        assert_eq!(doc.text(), "$greeting = 'world'");
        assert_eq!(doc.revision, 1);
    }

    #[test]
    fn test_document_apply_change_utf16_emoji() {
        // 🎉 is 2 UTF-16 code units
        let mut doc = Document::new("a🎉b", None);
        doc.apply_change(edit((0, 3), (0, 3), "x"));
        assert_eq!(doc.text(), "a🎉xb");
    }

    #[test]
    fn test_document_apply_change_multiline() {
        let mut doc = Document::new("function f {\n    $a\n}\n", None);
        doc.apply_change(edit((1, 4), (2, 0), "$b\n"));
        assert_eq!(doc.text(), "function f {\n    $b\n}\n");
    }

    #[test]
    fn test_document_apply_change_at_end() {
        let mut doc = Document::new("$a\n", None);
        doc.apply_change(edit((1, 0), (1, 0), "$b"));
        assert_eq!(doc.text(), "$a\n$b");
    }

    #[test]
    fn test_document_full_sync() {
        let mut doc = Document::new("$a", Some(1));
        doc.apply_change(TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "$b\n$c".to_string(),
        });
        assert_eq!(doc.text(), "$b\n$c");
    }

    #[test]
    fn test_line_text_strips_terminators() {
        let doc = Document::new("$a\r\n$b\n$c", None);
        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.line_text(0).as_deref(), Some("$a"));
        assert_eq!(doc.line_text(1).as_deref(), Some("$b"));
        assert_eq!(doc.line_text(2).as_deref(), Some("$c"));
        assert_eq!(doc.line_text(3), None);
    }

    #[test]
    fn test_line_text_other_terminators() {
        let doc = Document::new("$a\r$b\u{2028}$c\u{000C}$d", None);
        assert_eq!(doc.line_count(), 4);
        assert_eq!(doc.line_text(0).as_deref(), Some("$a"));
        assert_eq!(doc.line_text(1).as_deref(), Some("$b"));
        assert_eq!(doc.line_text(2).as_deref(), Some("$c"));
        assert_eq!(doc.line_text(3).as_deref(), Some("$d"));
    }

    #[test]
    fn test_world_state_documents() {
        let uri = Url::parse("file:///workspace/a.ps1").unwrap();
        let mut state = WorldState::new();
        state.open_document(uri.clone(), "$a", Some(1));
        state.apply_change(&uri, edit((0, 2), (0, 2), "bc"));
        assert_eq!(state.get_document(&uri).unwrap().text(), "$abc");

        state.close_document(&uri);
        assert!(state.get_document(&uri).is_none());
    }
}
