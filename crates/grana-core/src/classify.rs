// Keyword classification of free text into closed category sets.
//
// Matching is a case-insensitive substring search with no stemming. Short
// keywords must match a whole word so "bico" does not fire on "bicicleta".
// Tables are ordered: the first bucket with any matching keyword wins.

use crate::category::Category;

/// Keywords up to this many characters only match whole words.
const SHORT_KEYWORD_CHARS: usize = 4;

/// An ordered table of `(bucket, keywords)` pairs. Keywords must be
/// lowercase.
#[derive(Debug)]
pub struct KeywordTable<C: 'static> {
    buckets: &'static [(C, &'static [&'static str])],
}

impl<C: Copy> KeywordTable<C> {
    pub const fn new(buckets: &'static [(C, &'static [&'static str])]) -> Self {
        Self { buckets }
    }

    pub fn buckets(&self) -> &'static [(C, &'static [&'static str])] {
        self.buckets
    }
}

/// Return the first bucket whose keyword list has an entry contained in
/// `text`, or `None`.
pub fn classify<C: Copy>(text: &str, table: &KeywordTable<C>) -> Option<C> {
    let haystack = text.to_lowercase();
    if haystack.trim().is_empty() {
        return None;
    }
    table
        .buckets
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| matches_keyword(&haystack, k)))
        .map(|(bucket, _)| *bucket)
}

fn matches_keyword(haystack: &str, keyword: &str) -> bool {
    if keyword.chars().count() > SHORT_KEYWORD_CHARS {
        return haystack.contains(keyword);
    }
    haystack.match_indices(keyword).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + keyword.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Normalize a category from the model's explicit field and the record's
/// description.
///
/// Order: description keywords, explicit-field keywords, exact canonical
/// name of the explicit field, then `C::OTHER`.
pub fn normalize<C: Category>(explicit: Option<&str>, description: Option<&str>) -> C {
    let table = C::keywords();
    description
        .and_then(|d| classify(d, table))
        .or_else(|| explicit.and_then(|e| classify(e, table)))
        .or_else(|| explicit.and_then(C::from_canonical))
        .unwrap_or(C::OTHER)
}
