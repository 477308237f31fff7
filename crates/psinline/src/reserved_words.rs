/// Reserved names for PowerShell variable references.
///
/// This module holds the two fixed word lists the variable scanner consults:
/// automatic constants that look like variables but never need a lookup, and
/// the scope modifiers that may prefix a variable name (`$script:x`).

/// Automatic constants written with the `$` sigil. Matched case-insensitively.
pub const KNOWN_CONSTANTS: &[&str] = &["true", "false", "null"];

/// Scope modifiers accepted before a colon in a variable name.
pub const SCOPE_MODIFIERS: &[&str] = &["global", "local", "script", "private", "using", "variable"];

/// Check whether `name` (without sigil) is an automatic constant.
///
/// The check is case-insensitive, as PowerShell itself is.
///
/// # Examples
///
/// ```
/// use psinline::reserved_words::is_known_constant;
///
/// assert!(is_known_constant("true"));
/// assert!(is_known_constant("NULL"));
/// assert!(!is_known_constant("truee"));
/// ```
pub fn is_known_constant(name: &str) -> bool {
    KNOWN_CONSTANTS
        .iter()
        .any(|constant| constant.eq_ignore_ascii_case(name))
}

/// Check whether `word` is a recognised scope modifier (case-insensitive).
pub fn is_scope_modifier(word: &str) -> bool {
    SCOPE_MODIFIERS
        .iter()
        .any(|modifier| modifier.eq_ignore_ascii_case(word))
}
