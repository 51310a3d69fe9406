//! Search terms, match ranges and the single-step search primitive.
//!
//! All offsets are **character offsets** (Unicode scalar values), matching the rest of the crate.
//! The navigation core never matches text itself: it repeatedly asks a [`SearchPrimitive`] for
//! "the next match at or after offset N" and caches the answers. [`RegexSearch`] is the
//! `regex`-backed primitive used by the in-memory host and the tests.

use crate::NavError;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// A located occurrence of the search term, as a half-open character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchRange {
    /// Inclusive start character offset.
    pub start: usize,
    /// Exclusive end character offset.
    pub end: usize,
}

impl MatchRange {
    /// Sentinel for "no prior selection": both offsets at the maximum value, so any caret offset
    /// counts as having moved away from it.
    pub const NONE: MatchRange = MatchRange {
        start: usize::MAX,
        end: usize::MAX,
    };

    /// The result a [`SearchPrimitive`] reports once no further match exists.
    pub const TERMINAL: MatchRange = MatchRange { start: 0, end: 0 };

    /// Create a new range.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of the range in characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns `true` for a search result signalling "end of document, no match".
    pub fn is_terminal(&self) -> bool {
        self.end == 0
    }

    /// Returns `true` for [`MatchRange::NONE`].
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// Inclusive containment test used for caret tracking: a caret sitting on either endpoint
    /// is still "on" the match.
    pub fn touches(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// Options that control how search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub case_sensitive: bool,
    /// If `true`, matches only whole words (alphanumeric and `_`).
    pub whole_word: bool,
    /// If `true`, treats the query as a regex pattern.
    pub regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
            regex: false,
        }
    }
}

/// The search configuration a match cache was built for.
///
/// Two fingerprints that do not [`differ`](SearchFingerprint::differs_from) produce the same
/// match list over the same text, so a cache built for one is valid for the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFingerprint {
    /// The search term.
    pub term: String,
    /// Case-sensitive matching.
    pub case_sensitive: bool,
    /// Whole-word matching.
    pub whole_word: bool,
    /// Regex matching.
    pub regex: bool,
}

impl SearchFingerprint {
    /// Create a fingerprint for `term` with the given options.
    pub fn new(term: impl Into<String>, options: SearchOptions) -> Self {
        Self {
            term: term.into(),
            case_sensitive: options.case_sensitive,
            whole_word: options.whole_word,
            regex: options.regex,
        }
    }

    /// The flag triple of this fingerprint.
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            case_sensitive: self.case_sensitive,
            whole_word: self.whole_word,
            regex: self.regex,
        }
    }

    /// Compare `other_term` with this fingerprint's term under this fingerprint's case rule.
    pub fn term_differs(&self, other_term: &str) -> bool {
        terms_differ(self.case_sensitive, &self.term, other_term)
    }

    /// Returns `true` when a cache built for `previous` cannot be reused for `self`.
    ///
    /// The term comparison follows `self`'s case sensitivity.
    pub fn differs_from(&self, previous: &SearchFingerprint) -> bool {
        self.regex != previous.regex
            || self.case_sensitive != previous.case_sensitive
            || self.whole_word != previous.whole_word
            || self.term_differs(&previous.term)
    }
}

/// Compare two search terms, ignoring case unless `case_sensitive`.
pub fn terms_differ(case_sensitive: bool, a: &str, b: &str) -> bool {
    if case_sensitive {
        a != b
    } else {
        a.chars()
            .flat_map(char::to_lowercase)
            .ne(b.chars().flat_map(char::to_lowercase))
    }
}

/// A single forward search step, provided by the host.
pub trait SearchPrimitive {
    /// Find the first match of `fingerprint` in `text` starting at or after `from` (char offset).
    ///
    /// Returns [`MatchRange::TERMINAL`] (end offset 0) when there is no further match.
    fn search(
        &mut self,
        text: &str,
        from: usize,
        fingerprint: &SearchFingerprint,
    ) -> Result<MatchRange, NavError>;

    /// Called before a full scan over `text`; every `search` call until [`end_scan`] receives
    /// this same text.
    ///
    /// [`end_scan`]: SearchPrimitive::end_scan
    fn begin_scan(&mut self, _text: &str) {}

    /// Called after a full scan finished (or failed).
    fn end_scan(&mut self) {}
}

#[derive(Debug)]
pub(crate) struct CharIndex {
    char_to_byte: Vec<usize>,
    text_len: usize,
}

impl CharIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(text.len());
        Self {
            char_to_byte,
            text_len: text.len(),
        }
    }

    pub(crate) fn char_count(&self) -> usize {
        self.char_to_byte.len().saturating_sub(1)
    }

    pub(crate) fn char_to_byte(&self, char_offset: usize) -> usize {
        let clamped = char_offset.min(self.char_count());
        self.char_to_byte
            .get(clamped)
            .copied()
            .unwrap_or(self.text_len)
    }

    pub(crate) fn byte_to_char(&self, byte_offset: usize) -> usize {
        let clamped = byte_offset.min(self.text_len);
        match self.char_to_byte.binary_search(&clamped) {
            Ok(idx) | Err(idx) => idx,
        }
    }

    pub(crate) fn char_at(&self, text: &str, char_offset: usize) -> Option<char> {
        if char_offset >= self.char_count() {
            return None;
        }
        let start = self.char_to_byte[char_offset];
        let end = self.char_to_byte[char_offset + 1];
        text.get(start..end)?.chars().next()
    }
}

fn compile_search_regex(fingerprint: &SearchFingerprint) -> Result<Regex, NavError> {
    let pattern = if fingerprint.regex {
        fingerprint.term.clone()
    } else {
        regex::escape(&fingerprint.term)
    };

    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(!fingerprint.case_sensitive)
        .multi_line(true)
        .build()?)
}

pub(crate) fn is_word_char(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

fn is_whole_word(text: &str, index: &CharIndex, m: MatchRange) -> bool {
    if m.is_empty() {
        return false;
    }

    let before = if m.start == 0 {
        None
    } else {
        index.char_at(text, m.start - 1)
    };
    let after = index.char_at(text, m.end);

    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// `regex`-backed [`SearchPrimitive`].
///
/// The compiled regex is cached per fingerprint. During a scan the char index of the scanned
/// text is built once and reused by every step.
#[derive(Debug, Default)]
pub struct RegexSearch {
    compiled: Option<(SearchFingerprint, Regex)>,
    scan_index: Option<CharIndex>,
}

impl RegexSearch {
    /// Create a search primitive with empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    fn regex_for(&mut self, fingerprint: &SearchFingerprint) -> Result<Regex, NavError> {
        if let Some((cached, re)) = &self.compiled
            && cached == fingerprint
        {
            return Ok(re.clone());
        }
        let re = compile_search_regex(fingerprint)?;
        self.compiled = Some((fingerprint.clone(), re.clone()));
        Ok(re)
    }
}

impl SearchPrimitive for RegexSearch {
    fn search(
        &mut self,
        text: &str,
        from: usize,
        fingerprint: &SearchFingerprint,
    ) -> Result<MatchRange, NavError> {
        if fingerprint.term.is_empty() {
            return Ok(MatchRange::TERMINAL);
        }

        let re = self.regex_for(fingerprint)?;
        let whole_word = fingerprint.whole_word;
        let owned;
        let index = match &self.scan_index {
            Some(index) => index,
            None => {
                owned = CharIndex::new(text);
                &owned
            }
        };

        let mut start_char = from.min(index.char_count());
        loop {
            let start_byte = index.char_to_byte(start_char);
            let Some(m) = re.find_at(text, start_byte) else {
                return Ok(MatchRange::TERMINAL);
            };

            let candidate = MatchRange::new(index.byte_to_char(m.start()), index.byte_to_char(m.end()));

            if candidate.is_empty() {
                if candidate.end >= index.char_count() {
                    return Ok(MatchRange::TERMINAL);
                }
                start_char = candidate.end + 1;
                continue;
            }

            if whole_word && !is_whole_word(text, index, candidate) {
                start_char = candidate.start + 1;
                continue;
            }

            return Ok(candidate);
        }
    }

    fn begin_scan(&mut self, text: &str) {
        self.scan_index = Some(CharIndex::new(text));
    }

    fn end_scan(&mut self) {
        self.scan_index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(term: &str, case_sensitive: bool, whole_word: bool, regex: bool) -> SearchFingerprint {
        SearchFingerprint::new(
            term,
            SearchOptions {
                case_sensitive,
                whole_word,
                regex,
            },
        )
    }

    #[test]
    fn test_regex_search_steps_and_terminates() {
        let mut search = RegexSearch::new();
        let fingerprint = fp("ab", true, false, false);
        let text = "ababab";

        assert_eq!(search.search(text, 0, &fingerprint).unwrap(), MatchRange::new(0, 2));
        assert_eq!(search.search(text, 2, &fingerprint).unwrap(), MatchRange::new(2, 4));
        assert_eq!(search.search(text, 5, &fingerprint).unwrap(), MatchRange::TERMINAL);
    }

    #[test]
    fn test_regex_search_uses_char_offsets() {
        let mut search = RegexSearch::new();
        let fingerprint = fp("b", true, false, false);
        assert_eq!(
            search.search("a👋b", 0, &fingerprint).unwrap(),
            MatchRange::new(2, 3)
        );
    }

    #[test]
    fn test_whole_word_skips_embedded_occurrences() {
        let mut search = RegexSearch::new();
        let fingerprint = fp("foo", true, true, false);
        let text = "foobar foo barfoo foo";
        assert_eq!(search.search(text, 0, &fingerprint).unwrap(), MatchRange::new(7, 10));
        assert_eq!(search.search(text, 10, &fingerprint).unwrap(), MatchRange::new(18, 21));
    }

    #[test]
    fn test_invalid_regex_is_reported() {
        let mut search = RegexSearch::new();
        let err = search.search("abc", 0, &fp("(", true, false, true)).unwrap_err();
        assert!(matches!(err, NavError::InvalidRegex(_)));
    }

    #[test]
    fn test_fingerprint_difference_follows_case_rule() {
        let previous = fp("Foo", true, false, false);
        assert!(!fp("foo", false, false, false).term_differs("FOO"));
        assert!(fp("foo", true, false, false).differs_from(&previous));
        // Flags changed: always differs.
        assert!(fp("Foo", false, false, false).differs_from(&previous));
        assert!(!fp("Foo", true, false, false).differs_from(&previous));
        assert!(fp("Foo", true, true, false).differs_from(&previous));
    }
}
