//! Keyword tables for the query grammar.
//!
//! The grammar is keyword-sensitive but positional: a word matching one of
//! these tables is only treated as a keyword where the grammar allows that
//! role. The tables themselves are plain data, built once into an immutable
//! [`KeywordConfig`] and passed explicitly into the normalizer and grammar
//! engine - there is no ambient global keyword state, so parsing stays a pure
//! function of `(input, config)`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Option keywords: each introduces a clause carrying a free-form payload.
///
/// Multi-word spellings (`id by`, `added since`, ...) are folded into these
/// hyphenated forms by the normalizer before the grammar runs.
pub const OPTION_WORDS: &[&str] = &[
    "by",
    "not-by",
    "id-by",
    "except-by",
    "from",
    "in-prj",
    "with",
    "rank",
    "per",
    "on",
    "since",
    "until",
    "added-on",
    "added-since",
    "added-until",
    "sort-by",
    "quality-grade",
    "has-photos",
    "has-sounds",
    "per-page",
];

/// Macro keywords: single words standing for canned query shortcuts.
///
/// The query records macros in order; expanding them into concrete clauses is
/// the caller's concern.
pub const MACRO_WORDS: &[&str] = &[
    "my", "home", "rg", "nid", "oldest", "newest", "reverse", "faves", "spp", "species", "unseen",
];

/// Group keywords: each expands to a fixed, named list of taxon ids via the
/// [`GroupExpander`](crate::resolve::GroupExpander) collaborator.
pub const GROUP_WORDS: &[&str] = &[
    "unknown",
    "waspsonly",
    "mothsonly",
    "herps",
    "lichenish",
    "nonflowering",
    "nonvascular",
    "inverts",
    "seaslugs",
    "allfish",
];

/// The ancestor-scope keyword, valid only immediately after a taxon name
/// clause (`prunella in animalia`). Deliberately not an option keyword.
pub const ANCESTOR_WORD: &str = "in";

/// Two-word keyword phrases: leading word mapped to the second words that
/// complete a compound keyword. `id by`, `idby`, and `id-by` all normalize to
/// the single `id-by` token.
const COMPOUND_TABLE: &[(&str, &[&str])] = &[
    ("id", &["by"]),
    ("not", &["by"]),
    ("except", &["by"]),
    ("sort", &["by"]),
    ("in", &["prj"]),
    ("added", &["on", "since", "until"]),
    ("has", &["photos", "sounds"]),
    ("quality", &["grade"]),
    ("per", &["page"]),
];

/// Immutable keyword configuration consulted by the normalizer and the
/// grammar engine.
///
/// Built once at startup (usually via [`KeywordConfig::default`]) and shared
/// read-only between callers; all lookups are ASCII-case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordConfig {
    option_words: BTreeSet<String>,
    macro_words: BTreeSet<String>,
    group_words: BTreeSet<String>,
    compounds: BTreeMap<String, BTreeSet<String>>,
}

impl KeywordConfig {
    /// Build a configuration from caller-supplied tables.
    ///
    /// All words are stored lowercased; compound second-word sets are keyed
    /// by their lowercased leading word.
    pub fn new<'a>(
        option_words: impl IntoIterator<Item = &'a str>,
        macro_words: impl IntoIterator<Item = &'a str>,
        group_words: impl IntoIterator<Item = &'a str>,
        compounds: impl IntoIterator<Item = (&'a str, &'a [&'a str])>,
    ) -> Self {
        fn lowered<'a>(words: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
            words.into_iter().map(|w| w.to_ascii_lowercase()).collect()
        }

        Self {
            option_words: lowered(option_words),
            macro_words: lowered(macro_words),
            group_words: lowered(group_words),
            compounds: compounds
                .into_iter()
                .map(|(first, seconds)| (first.to_ascii_lowercase(), lowered(seconds.iter().copied())))
                .collect(),
        }
    }

    /// The standard tables.
    pub fn standard() -> Self {
        Self::new(
            OPTION_WORDS.iter().copied(),
            MACRO_WORDS.iter().copied(),
            GROUP_WORDS.iter().copied(),
            COMPOUND_TABLE.iter().copied(),
        )
    }

    /// Does `word` name an option keyword?
    pub fn is_option_keyword(&self, word: &str) -> bool {
        self.option_words.contains(&word.to_ascii_lowercase())
    }

    /// Does `word` name a macro keyword?
    pub fn is_macro_keyword(&self, word: &str) -> bool {
        self.macro_words.contains(&word.to_ascii_lowercase())
    }

    /// Does `word` name a group keyword?
    pub fn is_group_keyword(&self, word: &str) -> bool {
        self.group_words.contains(&word.to_ascii_lowercase())
    }

    /// Is `word` the ancestor-scope keyword `in`?
    pub fn is_ancestor_keyword(&self, word: &str) -> bool {
        word.eq_ignore_ascii_case(ANCESTOR_WORD)
    }

    /// Does `word` match any keyword role at all?
    ///
    /// Used by the grammar engine to terminate maximal payload runs; whether
    /// the word actually *acts* as a keyword is still decided by position.
    pub fn is_any_keyword(&self, word: &str) -> bool {
        self.is_option_keyword(word) || self.is_macro_keyword(word) || self.is_group_keyword(word)
    }

    /// Canonical compound for an adjacent word pair, if the pair is in the
    /// table: `("id", "by")` yields `Some("id-by")`.
    pub fn compound_of(&self, first: &str, second: &str) -> Option<String> {
        let first = first.to_ascii_lowercase();
        let second = second.to_ascii_lowercase();
        let seconds = self.compounds.get(&first)?;
        seconds
            .contains(&second)
            .then(|| format!("{first}-{second}"))
    }

    /// Canonical compound for a single word spelled hyphenated (`id-by`) or
    /// fused (`idby`), if any table entry matches.
    pub fn compound_of_single(&self, word: &str) -> Option<String> {
        let word = word.to_ascii_lowercase();
        for (first, seconds) in &self.compounds {
            for second in seconds {
                if word == format!("{first}-{second}") || word == format!("{first}{second}") {
                    return Some(format!("{first}-{second}"));
                }
            }
        }
        None
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tables() {
        let config = KeywordConfig::standard();

        assert!(config.is_option_keyword("by"));
        assert!(config.is_option_keyword("id-by"));
        assert!(config.is_option_keyword("ADDED-SINCE"));
        assert!(config.is_macro_keyword("my"));
        assert!(config.is_group_keyword("herps"));
        assert!(config.is_ancestor_keyword("In"));

        assert!(!config.is_option_keyword("in"));
        assert!(!config.is_option_keyword("prunella"));
        assert!(!config.is_macro_keyword("by"));
    }

    #[test]
    fn test_compound_of_pair() {
        let config = KeywordConfig::standard();

        assert_eq!(config.compound_of("id", "by"), Some("id-by".to_string()));
        assert_eq!(config.compound_of("Added", "Since"), Some("added-since".to_string()));
        assert_eq!(config.compound_of("id", "prj"), None);
        assert_eq!(config.compound_of("by", "id"), None);
    }

    #[test]
    fn test_compound_of_single() {
        let config = KeywordConfig::standard();

        assert_eq!(config.compound_of_single("idby"), Some("id-by".to_string()));
        assert_eq!(config.compound_of_single("id-by"), Some("id-by".to_string()));
        assert_eq!(config.compound_of_single("inprj"), Some("in-prj".to_string()));
        assert_eq!(config.compound_of_single("addedon"), Some("added-on".to_string()));
        assert_eq!(config.compound_of_single("id"), None);
        assert_eq!(config.compound_of_single("by"), None);
    }

    #[test]
    fn test_custom_tables() {
        let config = KeywordConfig::new(
            ["near"],
            ["mine"],
            ["bugs"],
            [("near", ["to"].as_slice())],
        );

        assert!(config.is_option_keyword("near"));
        assert!(config.is_macro_keyword("mine"));
        assert!(config.is_group_keyword("bugs"));
        assert!(!config.is_option_keyword("by"));
        assert_eq!(config.compound_of("near", "to"), Some("near-to".to_string()));
    }
}
