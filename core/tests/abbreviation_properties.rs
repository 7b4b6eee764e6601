//! Property-based tests for abbreviation generation.

use completion_schema_core::{Abbreviations, MIN_COMMAND_ABBREVIATION, MIN_OPTION_ABBREVIATION};
use proptest::prelude::*;

fn command_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::string::string_regex(r"[a-d][a-d0-9-]{0,6}").expect("valid regex for command names"),
        1..12,
    )
}

fn long_options() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::string::string_regex(r"--[a-c][a-c-]{0,5}").expect("valid regex for long options"),
        1..12,
    )
}

fn check_abbreviations(words: &[String], min_len: usize) -> Result<(), TestCaseError> {
    let abbrevs = Abbreviations::new(words.iter().cloned(), min_len);

    for word in words {
        let list = abbrevs.get(word).expect("every word has an entry");
        prop_assert_eq!(list.last(), Some(word));

        for abbrev in list {
            prop_assert!(word.starts_with(abbrev.as_str()));
            if abbrev != word {
                prop_assert!(abbrev.chars().count() >= min_len);
                // Unique: no other word shares the prefix.
                prop_assert!(
                    words
                        .iter()
                        .filter(|other| other.starts_with(abbrev.as_str()))
                        .all(|other| other == word)
                );
                prop_assert_eq!(abbrevs.resolve(abbrev), Some(word.as_str()));
            }
        }
        prop_assert_eq!(abbrevs.resolve(word), Some(word.as_str()));
    }
    Ok(())
}

proptest! {
    /// Every abbreviation is a unique prefix resolving back to its word.
    #[test]
    fn prop_command_abbreviations_are_unique(words in command_names()) {
        check_abbreviations(&words, MIN_COMMAND_ABBREVIATION)?;
    }

    #[test]
    fn prop_option_abbreviations_are_unique(words in long_options()) {
        check_abbreviations(&words, MIN_OPTION_ABBREVIATION)?;
    }

    /// Abbreviations are shortest first and grow one character at a time.
    #[test]
    fn prop_abbreviations_are_contiguous(words in command_names()) {
        let abbrevs = Abbreviations::new(words.iter().cloned(), MIN_COMMAND_ABBREVIATION);
        for (_, list) in abbrevs.iter() {
            for pair in list.windows(2) {
                prop_assert_eq!(pair[0].chars().count() + 1, pair[1].chars().count());
            }
        }
    }

    /// Adding a word never makes an abbreviation of another word resolve to it.
    #[test]
    fn prop_prefix_never_hijacked(words in command_names(), extra in "[a-d]{1,4}") {
        let mut all = words.clone();
        all.push(extra.clone());
        let abbrevs = Abbreviations::new(all.iter().cloned(), MIN_COMMAND_ABBREVIATION);
        for word in &words {
            prop_assert_eq!(abbrevs.resolve(word), Some(word.as_str()));
        }
        prop_assert_eq!(abbrevs.resolve(&extra), Some(extra.as_str()));
    }
}
