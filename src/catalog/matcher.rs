//! Author Matcher
//!
//! Case-insensitive, unanchored, literal substring match. The query is
//! never interpreted as a pattern language: `.*`, `[`, `(` and friends are
//! plain characters.

use memchr::memmem::Finder;

#[derive(Clone, Debug)]
pub struct AuthorMatcher {
    needle: Finder<'static>,
    match_all: bool,
}

impl AuthorMatcher {
    /// Build the predicate for `query`. Never fails.
    pub fn new(query: &str) -> Self {
        let folded = fold(query);
        AuthorMatcher {
            match_all: folded.is_empty(),
            needle: Finder::new(folded.as_bytes()).into_owned(),
        }
    }

    pub fn matches(&self, author: &str) -> bool {
        if self.match_all {
            return true;
        }
        let folded = fold(author);
        self.needle.find(folded.as_bytes()).is_some()
    }
}

/// Lowercase one char at a time, with no final-sigma context, so a letter
/// folds the same wherever it sits.
fn fold(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_case_insensitive() {
        let m = AuthorMatcher::new("сто");
        assert!(m.matches("Толстой Л.Н."));
        assert!(!m.matches("Пушкин А.С."));
    }

    #[test]
    fn test_mixed_case_query() {
        let m = AuthorMatcher::new("тОЛСТОЙ");
        assert!(m.matches("Толстой Л.Н."));
    }

    #[test]
    fn test_not_anchored() {
        let m = AuthorMatcher::new("л.н.");
        assert!(m.matches("Толстой Л.Н."));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let m = AuthorMatcher::new("");
        assert!(m.matches("Толстой Л.Н."));
        assert!(m.matches(""));
    }

    #[test]
    fn test_no_fuzzy_matching() {
        let m = AuthorMatcher::new("Толстый");
        assert!(!m.matches("Толстой Л.Н."));
    }

    #[test]
    fn test_pattern_metacharacters_are_literal() {
        for query in [".*", "[", "(Толстой", "Л.Н.)", "+", "\\", "a{1000}", "^Т"] {
            let m = AuthorMatcher::new(query);
            assert!(!m.matches("Толстой Л.Н."), "query {:?} matched", query);
        }
        assert!(AuthorMatcher::new("(x)").matches("prefix (X) suffix"));
    }

    #[test]
    fn test_query_longer_than_author() {
        let m = AuthorMatcher::new("Толстой Л.Н. и другие");
        assert!(!m.matches("Толстой Л.Н."));
    }

    #[test]
    fn test_ascii_case_folding() {
        let m = AuthorMatcher::new("tolstoy");
        assert!(m.matches("Leo TOLSTOY"));
    }

    #[test]
    fn test_fold_ignores_word_position() {
        assert!(AuthorMatcher::new("ΟΣ").matches("ΟΣΑ"));
        assert!(AuthorMatcher::new("σ").matches("ΑΣ"));
        assert!(AuthorMatcher::new("ΟΣΑ").matches("Ο ΟΣΑ"));
    }
}
