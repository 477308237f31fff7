//
// outline.rs
//
// Function outline of a PowerShell document, derived from its text
//

use async_trait::async_trait;
use ropey::Rope;
use tower_lsp::lsp_types::{DocumentSymbol, Position, Range, SymbolKind, Url};

use crate::scope::SymbolSource;
use crate::utf16::is_line_break;

/// Keywords that introduce a named script block.
const FUNCTION_KEYWORDS: &[&str] = &["function", "filter", "workflow"];

/// Symbol source backed by a snapshot of one document's text. The rope is
/// only flattened to a string when the source is actually queried.
///
/// Queries for any other URI return `Ok(None)`.
pub struct OutlineSymbolSource {
    uri: Url,
    text: Rope,
}

impl OutlineSymbolSource {
    pub fn new(uri: Url, text: impl Into<Rope>) -> Self {
        Self {
            uri,
            text: text.into(),
        }
    }
}

#[async_trait]
impl SymbolSource for OutlineSymbolSource {
    async fn document_symbols(&self, uri: &Url) -> anyhow::Result<Option<Vec<DocumentSymbol>>> {
        if uri != &self.uri {
            return Ok(None);
        }
        Ok(Some(document_outline(&self.text.to_string())))
    }
}

/// A function header seen but whose body has not opened yet.
struct PendingFunction {
    name: String,
    start: Position,
    name_range: Range,
}

/// One open `{`, with the function it belongs to (if any) and the
/// functions completed inside it.
struct Frame {
    function: Option<PendingFunction>,
    children: Vec<DocumentSymbol>,
}

/// Saved cursor state for backtracking.
#[derive(Clone, Copy)]
struct Mark {
    idx: usize,
    line: u32,
    col: u32,
}

/// Character cursor that tracks LSP positions (UTF-16 columns). Lines break
/// where `ropey` breaks them, so positions agree with the document store.
struct Cursor {
    chars: Vec<char>,
    idx: usize,
    line: u32,
    col: u32,
}

impl Cursor {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            idx: 0,
            line: 0,
            col: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.idx + n).copied()
    }

    fn prev(&self) -> Option<char> {
        self.idx.checked_sub(1).and_then(|i| self.chars.get(i)).copied()
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.col)
    }

    fn mark(&self) -> Mark {
        Mark {
            idx: self.idx,
            line: self.line,
            col: self.col,
        }
    }

    fn reset(&mut self, mark: Mark) {
        self.idx = mark.idx;
        self.line = mark.line;
        self.col = mark.col;
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        let crlf = ch == '\r' && self.peek_at(1) == Some('\n');
        self.idx += 1;
        if is_line_break(ch) && !crlf {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += ch.len_utf16() as u32;
        }
        Some(ch)
    }

    fn bump_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let mut taken = String::new();
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            taken.push(ch);
            self.bump();
        }
        taken
    }

    fn skip_line_comment(&mut self) {
        self.bump_while(|ch| !is_line_break(ch));
    }

    fn skip_block_comment(&mut self) {
        // <#
        self.bump();
        self.bump();
        while let Some(ch) = self.bump() {
            if ch == '#' && self.peek() == Some('>') {
                self.bump();
                return;
            }
        }
    }

    /// `'...'`; a doubled quote reads as a close followed by a new open.
    fn skip_single_quoted(&mut self) {
        self.bump();
        while let Some(ch) = self.bump() {
            if ch == '\'' {
                return;
            }
        }
    }

    fn skip_double_quoted(&mut self) {
        self.bump();
        while let Some(ch) = self.bump() {
            match ch {
                '`' => {
                    self.bump();
                }
                '"' => return,
                _ => {}
            }
        }
    }

    /// Whether a here-string header (`@'` or `@"` followed only by
    /// whitespace to the end of the line) starts at the cursor.
    fn at_here_string(&self) -> Option<char> {
        let quote = self.peek_at(1).filter(|q| *q == '\'' || *q == '"')?;
        if self.peek() != Some('@') {
            return None;
        }
        let mut n = 2;
        loop {
            match self.peek_at(n) {
                Some(ch) if is_line_break(ch) => return Some(quote),
                Some(' ') | Some('\t') => n += 1,
                _ => return None,
            }
        }
    }

    /// Skip to the terminator line, which starts with the quote and `@`.
    fn skip_here_string(&mut self, quote: char) {
        self.bump_while(|ch| !is_line_break(ch));
        while let Some(ch) = self.bump() {
            if is_line_break(ch) && self.peek() == Some(quote) && self.peek_at(1) == Some('@') {
                self.bump();
                self.bump();
                return;
            }
        }
    }

    /// Skip whitespace, line breaks, comments and line continuations.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('#') => self.skip_line_comment(),
                Some('<') if self.peek_at(1) == Some('#') => self.skip_block_comment(),
                Some('`') if self.peek_at(1).is_some_and(is_line_break) => {
                    self.bump();
                    self.bump();
                }
                _ => return,
            }
        }
    }

    /// Skip a balanced `(...)` starting at the cursor. Returns false when the
    /// text ends first.
    fn skip_parenthesized(&mut self) -> bool {
        let mut depth = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                '(' => {
                    depth += 1;
                    self.bump();
                }
                ')' => {
                    self.bump();
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return true;
                    }
                }
                '#' => self.skip_line_comment(),
                '<' if self.peek_at(1) == Some('#') => self.skip_block_comment(),
                '\'' => self.skip_single_quoted(),
                '"' => self.skip_double_quoted(),
                '`' => {
                    self.bump();
                    self.bump();
                }
                _ => {
                    self.bump();
                }
            }
        }
        false
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-'
}

/// Characters that, directly before a keyword, mean it is part of a
/// variable, member, parameter or drive path rather than a definition.
fn blocks_keyword(prev: Option<char>) -> bool {
    matches!(prev, Some('$' | '.' | ':' | '-' | '@' | '`'))
}

fn is_name_terminator(ch: char) -> bool {
    ch.is_whitespace() || ch == '{' || ch == '(' || ch == ';'
}

/// Build the nested function outline of a document.
///
/// Ranges run from the defining keyword to just past the matching `}`;
/// selection ranges cover the name. Braces inside comments, strings and
/// here-strings are ignored. Functions whose body never closes are dropped,
/// but completed functions nested inside them are kept.
pub fn document_outline(text: &str) -> Vec<DocumentSymbol> {
    let mut cursor = Cursor::new(text);
    let mut frames: Vec<Frame> = Vec::new();
    let mut roots: Vec<DocumentSymbol> = Vec::new();
    let mut pending: Option<PendingFunction> = None;

    while let Some(ch) = cursor.peek() {
        match ch {
            '#' => cursor.skip_line_comment(),
            '<' if cursor.peek_at(1) == Some('#') => cursor.skip_block_comment(),
            '@' => match cursor.at_here_string() {
                Some(quote) => cursor.skip_here_string(quote),
                None => {
                    cursor.bump();
                }
            },
            '\'' => cursor.skip_single_quoted(),
            '"' => cursor.skip_double_quoted(),
            '`' => {
                cursor.bump();
                cursor.bump();
            }
            '{' => {
                cursor.bump();
                frames.push(Frame {
                    function: pending.take(),
                    children: Vec::new(),
                });
            }
            '}' => {
                cursor.bump();
                if let Some(frame) = frames.pop() {
                    let end = cursor.position();
                    let target = match frames.last_mut() {
                        Some(parent) => &mut parent.children,
                        None => &mut roots,
                    };
                    close_frame(frame, end, target);
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let blocked = blocks_keyword(cursor.prev());
                let start = cursor.position();
                let word = cursor.bump_while(is_word_char);
                if blocked || !is_function_keyword(&word) {
                    continue;
                }
                if let Some(function) = read_function_header(&mut cursor, start) {
                    pending = Some(function);
                }
            }
            _ => {
                cursor.bump();
            }
        }
    }

    // Unterminated blocks: keep what completed inside them
    while let Some(frame) = frames.pop() {
        match frames.last_mut() {
            Some(parent) => parent.children.extend(frame.children),
            None => roots.extend(frame.children),
        }
    }

    roots
}

fn is_function_keyword(word: &str) -> bool {
    FUNCTION_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(word))
}

/// Read the header after a function keyword: a name on the same line,
/// separated by spaces or tabs, then an optional parameter list, then the
/// opening `{` of the body. Comments and line breaks may come between them.
///
/// On success the cursor is left on the `{`. Anything else after the name
/// means the keyword was an ordinary word; the cursor then goes back to just
/// past the name.
fn read_function_header(cursor: &mut Cursor, start: Position) -> Option<PendingFunction> {
    let gap = cursor.bump_while(|ch| ch == ' ' || ch == '\t');
    if gap.is_empty() {
        return None;
    }

    let name_start = cursor.position();
    let name = cursor.bump_while(|ch| !is_name_terminator(ch));
    if name.is_empty() {
        return None;
    }
    let name_range = Range {
        start: name_start,
        end: cursor.position(),
    };

    let after_name = cursor.mark();
    cursor.skip_trivia();
    if cursor.peek() == Some('(') {
        if !cursor.skip_parenthesized() {
            cursor.reset(after_name);
            return None;
        }
        cursor.skip_trivia();
    }
    if cursor.peek() != Some('{') {
        cursor.reset(after_name);
        return None;
    }

    Some(PendingFunction {
        name,
        start,
        name_range,
    })
}

#[allow(deprecated)]
fn close_frame(frame: Frame, end: Position, target: &mut Vec<DocumentSymbol>) {
    match frame.function {
        Some(function) => target.push(DocumentSymbol {
            name: function.name,
            detail: None,
            kind: SymbolKind::FUNCTION,
            tags: None,
            deprecated: None,
            range: Range {
                start: function.start,
                end,
            },
            selection_range: function.name_range,
            children: if frame.children.is_empty() {
                None
            } else {
                Some(frame.children)
            },
        }),
        None => target.extend(frame.children),
    }
}
