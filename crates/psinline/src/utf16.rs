/// Convert a byte offset within `line` to a UTF-16 column, which is what LSP
/// `Position.character` counts. Offsets past the end clamp to the line length.
pub fn byte_offset_to_utf16_column(line: &str, byte_offset: usize) -> u32 {
    let mut utf16_count = 0u32;
    for (byte_idx, ch) in line.char_indices() {
        if byte_idx >= byte_offset {
            return utf16_count;
        }
        utf16_count += ch.len_utf16() as u32;
    }
    utf16_count
}

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> u32 {
    text.chars().map(|ch| ch.len_utf16() as u32).sum()
}

/// Convert a UTF-16 column (from an LSP position) to a char offset within the
/// given line, for indexing into a `Rope`.
pub fn utf16_offset_to_char_offset(line_text: &str, utf16_offset: usize) -> usize {
    let mut utf16_count = 0;
    let mut char_count = 0;

    for ch in line_text.chars() {
        if utf16_count >= utf16_offset {
            return char_count;
        }
        utf16_count += ch.len_utf16();
        char_count += 1;
    }
    char_count
}

/// Whether `ch` ends a line the way `ropey::Rope` counts lines: LF, CR,
/// VT, FF, NEL and the Unicode line and paragraph separators. CRLF is one
/// break; callers treat the CR of a CRLF pair as part of the line.
pub fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}
