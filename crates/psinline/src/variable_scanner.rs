//
// variable_scanner.rs
//
// Lexical scan of a single line for PowerShell variable references
//

use std::sync::OnceLock;

use regex::Regex;

use crate::reserved_words::{is_known_constant, is_scope_modifier};
use crate::utf16::{byte_offset_to_utf16_column, utf16_len};

/// Lead character of every variable reference.
pub const SIGIL: char = '$';

/// Escape marker inside `${...}` names.
const ESCAPE: char = '`';

/// Line comment marker.
const COMMENT: char = '#';

/// A variable reference found on one line.
///
/// Columns are UTF-16 code units. `end` is `start` plus the length of the
/// canonical name, so for `${...}` references the range covers the sigil and
/// the unescaped name rather than the full braced source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableMatch {
    pub start: u32,
    pub end: u32,
    /// Canonical name including the sigil, with scope modifier removed.
    pub name: String,
}

/// Raw form of a reference before normalization.
#[derive(Debug, PartialEq, Eq)]
enum RawVariable<'a> {
    /// `${...}` with escapes already removed from the body
    Braced(String),
    /// `$name` or `$scope:name`, sigil excluded
    Bare(&'a str),
}

impl RawVariable<'_> {
    fn body(&self) -> &str {
        match self {
            RawVariable::Braced(body) => body,
            RawVariable::Bare(body) => body,
        }
    }
}

/// Pattern for the part of a bare reference that follows the sigil.
///
/// The scoped alternative comes first so that `$script:x` is not read as
/// `$script` followed by a stray `:x`.
fn bare_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        const IDENT: &str = r"[\p{Lu}\p{Ll}\p{Lt}\p{Lm}\p{Lo}\p{Nd}_?]";
        Regex::new(&format!(r"^(?:[A-Za-z]+:{IDENT}+|{IDENT}+)")).unwrap()
    })
}

/// Returns true when the line is a `#` comment once leading whitespace is
/// trimmed. Block comments and markers inside strings are not recognised.
pub fn is_comment_line(text: &str) -> bool {
    text.trim_start().starts_with(COMMENT)
}

/// Scan one line for variable references, left to right, non-overlapping.
///
/// Recognised forms are `${name}` (with backtick escapes), `$scope:name` and
/// `$name`. Scoped references with an unknown scope word and the automatic
/// constants `$true`, `$false` and `$null` are dropped.
///
/// # Examples
///
/// ```
/// use psinline::variable_scanner::scan_line;
///
/// let found = scan_line("$false $true $null $123");
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].name, "$123");
/// assert_eq!(found[0].start, 19);
/// ```
pub fn scan_line(line: &str) -> Vec<VariableMatch> {
    let mut matches = Vec::new();
    let mut pos = 0;

    while let Some(offset) = line[pos..].find(SIGIL) {
        let start = pos + offset;
        let after_sigil = start + SIGIL.len_utf8();

        let Some((raw, end)) = lex_variable(line, after_sigil) else {
            pos = after_sigil;
            continue;
        };
        pos = end;

        let Some(name) = canonical_name(&raw) else {
            log::trace!("Discarding non-variable token at byte {}: {:?}", start, raw);
            continue;
        };

        let start_col = byte_offset_to_utf16_column(line, start);
        let end_col = start_col + utf16_len(&name);
        matches.push(VariableMatch {
            start: start_col,
            end: end_col,
            name,
        });
    }

    matches
}

/// Lex the reference whose sigil ends at `from`. Returns the raw variable and
/// the byte offset just past its source text.
fn lex_variable(line: &str, from: usize) -> Option<(RawVariable<'_>, usize)> {
    let rest = &line[from..];
    if let Some(body) = rest.strip_prefix('{') {
        let (name, consumed) = lex_braced_body(body)?;
        return Some((RawVariable::Braced(name), from + 1 + consumed));
    }

    let m = bare_name_pattern().find(rest)?;
    Some((RawVariable::Bare(m.as_str()), from + m.end()))
}

/// Read a `${...}` body up to the first unescaped `}`.
///
/// A backtick makes the following character literal and is itself removed,
/// so `` `} `` contributes `}` and ``` `` ``` contributes one backtick.
/// Returns `None` when the line ends before the closing brace.
fn lex_braced_body(body: &str) -> Option<(String, usize)> {
    let mut name = String::new();
    let mut chars = body.char_indices();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            ESCAPE => {
                let (_, escaped) = chars.next()?;
                name.push(escaped);
            }
            '}' => return Some((name, idx + 1)),
            _ => name.push(ch),
        }
    }

    None
}

/// Normalize a raw reference to `$name`, or `None` when it should not be
/// reported.
fn canonical_name(raw: &RawVariable<'_>) -> Option<String> {
    let body = raw.body();
    let base = match body.split_once(':') {
        Some((scope, base)) => {
            if !is_scope_modifier(scope) {
                return None;
            }
            base
        }
        None => body,
    };

    if base.is_empty() || is_known_constant(base) {
        return None;
    }

    Some(format!("{SIGIL}{base}"))
}
