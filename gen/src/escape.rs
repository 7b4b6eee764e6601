//! Minimal shell quoting.
//!
//! Words are left bare when they only contain characters that are never
//! special to the shell and quoted as lightly as possible otherwise.

use std::sync::LazyLock;

use regex::Regex;

static SAFE_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_@%+=:,./-]+$").expect("static regex must compile"));

fn is_safe(s: &str) -> bool {
    SAFE_WORD_RE.is_match(s)
}

/// Quotes `s` as one Bash or Zsh word.
///
/// # Examples
///
/// ```
/// use completion_schema_gen::escape::escape;
///
/// assert_eq!(escape("--output-type"), "--output-type");
/// assert_eq!(escape("two words"), "'two words'");
/// assert_eq!(escape("it's"), "\"it's\"");
/// assert_eq!(escape("it's $HOME"), "\"it's \\$HOME\"");
/// assert_eq!(escape("it's!"), "'it'\"'\"'s!'");
/// assert_eq!(escape(""), "''");
/// ```
pub fn escape(s: &str) -> String {
    if is_safe(s) {
        return s.to_string();
    }
    if !s.contains('\'') {
        return format!("'{s}'");
    }
    // `!` would trigger history expansion inside double quotes.
    if !s.contains('!') {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('"');
        for c in s.chars() {
            if matches!(c, '\\' | '$' | '`' | '"') {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
        return out;
    }
    format!("'{}'", s.replace('\'', r#"'"'"'"#))
}

/// Quotes `s` as one Fish word.
///
/// # Examples
///
/// ```
/// use completion_schema_gen::escape::escape_fish;
///
/// assert_eq!(escape_fish("--verbose"), "--verbose");
/// assert_eq!(escape_fish("two words"), "'two words'");
/// assert_eq!(escape_fish("it's"), "\"it's\"");
/// assert_eq!(escape_fish("it's $x"), r"'it\'s $x'");
/// ```
pub fn escape_fish(s: &str) -> String {
    if is_safe(s) {
        return s.to_string();
    }
    if !s.contains('\'') && !s.contains('\\') {
        return format!("'{s}'");
    }
    if !s.contains(['"', '$', '\\']) {
        return format!("\"{s}\"");
    }
    format!("'{}'", s.replace('\\', r"\\").replace('\'', r"\'"))
}

/// Quotes every word and joins them with spaces.
pub fn escape_words<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| escape(w.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fish counterpart of [`escape_words`].
pub fn escape_fish_words<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| escape_fish(w.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turns `s` into a shell identifier fragment (`my-app` → `my_app`).
pub fn sanitize_identifier(s: &str) -> String {
    let mut out: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_characters_stay_bare() {
        assert_eq!(escape("a_b@c%d+e=f:g,h./i-j"), "a_b@c%d+e=f:g,h./i-j");
        assert_eq!(escape_fish("a=b"), "a=b");
    }

    #[test]
    fn test_special_characters_quoted() {
        assert_eq!(escape("*.txt"), "'*.txt'");
        assert_eq!(escape("$HOME"), "'$HOME'");
        assert_eq!(escape_fish("*.txt"), "'*.txt'");
    }

    #[test]
    fn test_double_quote_escapes() {
        assert_eq!(escape(r#"it's "x" `y` \z"#), r#""it's \"x\" \`y\` \\z""#);
    }

    #[test]
    fn test_fish_backslash() {
        assert_eq!(escape_fish(r"a\b"), r"'a\\b'");
        assert_eq!(escape_fish(r#"a"b's"#), r#"'a"b\'s'"#);
    }

    #[test]
    fn test_escape_words() {
        assert_eq!(escape_words(["-t", "a b"]), "-t 'a b'");
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("my-app"), "my_app");
        assert_eq!(sanitize_identifier("7z"), "_7z");
        assert_eq!(sanitize_identifier(""), "_");
    }
}
