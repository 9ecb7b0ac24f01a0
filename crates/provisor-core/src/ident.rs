//! Account identifier validation and quoting
//!
//! Only principal names pass through here. Credentials and other values are
//! never validated or escaped by this module.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::reserved::is_reserved;

/// Longest identifier Oracle accepts unquoted.
pub const MAX_IDENTIFIER_LEN: usize = 30;

static UNQUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_$#]{0,29}$").expect("static identifier pattern")
});

/// Strips a single matching pair of `'` or `"` wrapping the whole name.
pub fn strip_quotes(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
            return &name[1..name.len() - 1];
        }
    }
    name
}

/// Decides whether `name` must be quoted before it is embedded in a
/// statement.
///
/// A name already wrapped in quotes is judged on its inner text. Empty
/// names, names longer than [`MAX_IDENTIFIER_LEN`], names not starting with
/// a letter, names with characters outside `[A-Za-z0-9_$#]` and reserved
/// words all need quoting.
pub fn needs_quoting(name: &str) -> bool {
    let name = strip_quotes(name);

    let len = name.chars().count();
    if len == 0 || len > MAX_IDENTIFIER_LEN {
        return true;
    }

    match name.chars().next() {
        Some(c) if c.is_alphabetic() => {}
        _ => return true,
    }

    if !UNQUOTED.is_match(name) {
        return true;
    }

    is_reserved(&name.to_uppercase())
}

/// Wraps `name` in double quotes.
///
/// Embedded `"` characters are not escaped; such names cannot be expressed
/// as a single quoted identifier.
pub fn double_quote(name: &str) -> String {
    format!("\"{name}\"")
}

/// A principal name together with its quoting decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    raw: String,
    needs_quoting: bool,
    rendered: String,
}

impl Identifier {
    /// Resolve `raw` into the form that is safe to place in a statement.
    pub fn resolve(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let needs_quoting = needs_quoting(&raw);

        let rendered = if !needs_quoting || is_double_quoted(&raw) {
            raw.clone()
        } else {
            double_quote(&raw)
        };

        Self {
            raw,
            needs_quoting,
            rendered,
        }
    }

    /// The name exactly as supplied.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Upper-cased name with any caller-supplied quotes removed.
    pub fn normalized(&self) -> String {
        strip_quotes(&self.raw).to_uppercase()
    }

    pub fn needs_quoting(&self) -> bool {
        self.needs_quoting
    }

    /// The form embedded into generated statements.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// Whether both identifiers name the same database principal.
    ///
    /// Bare names are folded to upper case by the server, so they compare
    /// case-insensitively. Anything quoted compares on its rendered text.
    pub fn same_principal(&self, other: &Identifier) -> bool {
        if self.is_bare() && other.is_bare() {
            self.rendered.eq_ignore_ascii_case(&other.rendered)
        } else {
            self.rendered == other.rendered
        }
    }

    fn is_bare(&self) -> bool {
        !self.needs_quoting && strip_quotes(&self.rendered) == self.rendered
    }
}

fn is_double_quoted(name: &str) -> bool {
    name.len() >= 2 && name.starts_with('"') && name.ends_with('"')
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reserved::ORACLE_RESERVED_WORDS;

    #[test]
    fn test_plain_names_stay_unquoted() {
        for name in ["admin", "A", "scott", "app_user$1", "X#Y", "a23456789012345678901234567890"] {
            assert!(!needs_quoting(name), "{name} should not need quoting");
        }
    }

    #[test]
    fn test_empty_long_and_non_letter_names_need_quoting() {
        assert!(needs_quoting(""));
        assert!(needs_quoting("a234567890123456789012345678901"));
        for name in ["1admin", "_admin", "$admin", "#x", " admin", "-x"] {
            assert!(needs_quoting(name), "{name} should need quoting");
        }
    }

    #[test]
    fn test_pattern_violations_need_quoting() {
        for name in ["user[2]admin", "my-user", "a b", "dot.name", "ädmin", "adminé"] {
            assert!(needs_quoting(name), "{name} should need quoting");
        }
    }

    #[test]
    fn test_reserved_words_need_quoting_in_any_case() {
        for word in ORACLE_RESERVED_WORDS {
            assert!(needs_quoting(word), "{word}");
            assert!(needs_quoting(&word.to_lowercase()), "{word} lowercase");
        }
    }

    #[test]
    fn test_pre_quoted_names_are_judged_on_inner_text() {
        assert!(!needs_quoting("\"admin\""));
        assert!(!needs_quoting("'admin'"));
        assert!(needs_quoting("\"select\""));
        assert!(needs_quoting("\"user[2]admin\""));
        assert!(needs_quoting("\"\""));
        // mismatched delimiters are not stripped
        assert!(needs_quoting("\"admin'"));
        // a lone quote is not a wrapped pair
        assert!(needs_quoting("\""));
    }

    #[test]
    fn test_double_quote_round_trip_reproduces_decision() {
        for name in ["admin", "select", "user[2]admin", "", "9lives", "Scott_Tiger"] {
            let quoted = double_quote(name);
            assert_eq!(strip_quotes(&quoted), name);
            assert_eq!(needs_quoting(&quoted), needs_quoting(name), "{name}");
        }
    }

    #[test]
    fn test_double_quote_does_not_escape() {
        assert_eq!(double_quote("select"), "\"select\"");
        assert_eq!(double_quote("a\"b"), "\"a\"b\"");
    }

    #[test]
    fn test_resolve_plain_name() {
        let ident = Identifier::resolve("admin");
        assert!(!ident.needs_quoting());
        assert_eq!(ident.rendered(), "admin");
        assert_eq!(ident.normalized(), "ADMIN");
        assert_eq!(ident.to_string(), "admin");
    }

    #[test]
    fn test_resolve_reserved_name() {
        let ident = Identifier::resolve("select");
        assert!(ident.needs_quoting());
        assert_eq!(ident.rendered(), "\"select\"");
        assert_eq!(ident.raw(), "select");
    }

    #[test]
    fn test_resolve_keeps_caller_quotes() {
        let ident = Identifier::resolve("\"user[2]admin\"");
        assert!(ident.needs_quoting());
        assert_eq!(ident.rendered(), "\"user[2]admin\"");
        assert_eq!(ident.normalized(), "USER[2]ADMIN");
    }

    #[test]
    fn test_resolve_preserves_raw_text() {
        // not required: verbatim, caller quotes included
        let ident = Identifier::resolve("'admin'");
        assert!(!ident.needs_quoting());
        assert_eq!(ident.rendered(), "'admin'");

        // required: the whole raw value is wrapped
        let ident = Identifier::resolve("'select'");
        assert!(ident.needs_quoting());
        assert_eq!(ident.rendered(), "\"'select'\"");

        for raw in ["admin", "select", "'select'", "'user[2]admin'", "9lives", ""] {
            let ident = Identifier::resolve(raw);
            if ident.needs_quoting() {
                assert_eq!(ident.rendered(), double_quote(raw), "{raw:?}");
                assert_eq!(&ident.rendered()[1..ident.rendered().len() - 1], raw);
            } else {
                assert_eq!(ident.rendered(), raw, "{raw:?}");
            }
        }
    }

    #[test]
    fn test_same_principal() {
        let admin = Identifier::resolve("admin");
        assert!(admin.same_principal(&Identifier::resolve("ADMIN")));
        assert!(!admin.same_principal(&Identifier::resolve("\"admin\"")));
        assert!(!admin.same_principal(&Identifier::resolve("admin2")));

        let special = Identifier::resolve("user[2]admin");
        assert!(special.same_principal(&Identifier::resolve("\"user[2]admin\"")));
        assert!(!special.same_principal(&Identifier::resolve("USER[2]ADMIN")));
    }

    #[test]
    fn test_resolve_keeps_case_sensitive_quoted_name() {
        let ident = Identifier::resolve("\"admin\"");
        assert!(!ident.needs_quoting());
        assert_eq!(ident.rendered(), "\"admin\"");
    }
}
