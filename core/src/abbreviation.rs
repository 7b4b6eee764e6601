//! Unique-prefix abbreviations for long options and subcommands.

use std::collections::HashMap;

/// Minimum abbreviation length for option strings (dashes included).
pub const MIN_OPTION_ABBREVIATION: usize = 3;

/// Minimum abbreviation length for subcommand names.
pub const MIN_COMMAND_ABBREVIATION: usize = 1;

/// Abbreviations of a set of words.
///
/// A prefix of a word is a valid abbreviation if it is at least `min_len`
/// characters long and is not a prefix of any other word of the set. The
/// full word is always included, last.
///
/// # Examples
///
/// ```
/// use completion_schema_core::Abbreviations;
///
/// let abbrevs = Abbreviations::new(["start", "stop", "status"], 1);
/// assert_eq!(abbrevs.get("start").unwrap(), ["star", "start"]);
/// assert_eq!(abbrevs.get("stop").unwrap(), ["sto", "stop"]);
/// assert_eq!(abbrevs.resolve("stat"), Some("status"));
/// assert_eq!(abbrevs.resolve("st"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Abbreviations {
    words: Vec<(String, Vec<String>)>,
    lookup: HashMap<String, String>,
}

impl Abbreviations {
    /// Computes the abbreviations of `words`; duplicates are ignored.
    pub fn new<I, S>(words: I, min_len: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for word in words {
            let word = word.into();
            if !unique.contains(&word) {
                unique.push(word);
            }
        }

        let mut result = Self::default();
        for word in &unique {
            let mut list = Vec::new();
            for (len, (end, _)) in word.char_indices().skip(1).enumerate() {
                // `len + 1` characters end before byte offset `end`.
                if len + 1 < min_len {
                    continue;
                }
                let candidate = &word[..end];
                let ambiguous = unique
                    .iter()
                    .any(|other| other != word && other.starts_with(candidate));
                if !ambiguous {
                    list.push(candidate.to_string());
                }
            }
            list.push(word.clone());
            result.words.push((word.clone(), list));
        }

        // Exact spellings win over abbreviations of longer words.
        for (word, list) in &result.words {
            for abbrev in list {
                result
                    .lookup
                    .entry(abbrev.clone())
                    .or_insert_with(|| word.clone());
            }
        }
        for (word, _) in &result.words {
            result.lookup.insert(word.clone(), word.clone());
        }
        result
    }

    /// Returns the abbreviations of `word`, shortest first.
    pub fn get(&self, word: &str) -> Option<&[String]> {
        self.words
            .iter()
            .find(|(w, _)| w == word)
            .map(|(_, list)| list.as_slice())
    }

    /// Maps an abbreviation (or full word) back to its word.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.lookup.get(prefix).map(String::as_str)
    }

    /// Iterates over `(word, abbreviations)` in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.words.iter().map(|(w, l)| (w.as_str(), l.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_minimum_length() {
        let abbrevs = Abbreviations::new(["--verbose", "--version"], MIN_OPTION_ABBREVIATION);
        assert_eq!(abbrevs.get("--verbose").unwrap(), ["--verb", "--verbo", "--verbos", "--verbose"]);
        assert_eq!(abbrevs.get("--version").unwrap(), ["--vers", "--versi", "--versio", "--version"]);
    }

    #[test]
    fn test_single_word_all_prefixes() {
        let abbrevs = Abbreviations::new(["--all"], MIN_OPTION_ABBREVIATION);
        assert_eq!(abbrevs.get("--all").unwrap(), ["--a", "--al", "--all"]);
    }

    #[test]
    fn test_word_prefix_of_other_word() {
        let abbrevs = Abbreviations::new(["st", "start"], 1);
        assert_eq!(abbrevs.get("st").unwrap(), ["st"]);
        assert_eq!(abbrevs.get("start").unwrap(), ["sta", "star", "start"]);
        assert_eq!(abbrevs.resolve("st"), Some("st"));
    }

    #[test]
    fn test_duplicates_ignored() {
        let abbrevs = Abbreviations::new(["add", "add"], 1);
        assert_eq!(abbrevs.iter().count(), 1);
        assert_eq!(abbrevs.get("add").unwrap(), ["a", "ad", "add"]);
    }

    #[test]
    fn test_multibyte_words() {
        let abbrevs = Abbreviations::new(["über", "ufo"], 1);
        assert_eq!(abbrevs.get("über").unwrap(), ["ü", "üb", "übe", "über"]);
        assert_eq!(abbrevs.get("ufo").unwrap(), ["u", "uf", "ufo"]);
    }
}
