use crate::tokenizer::{has_orphan_minus, is_valid_term, split_into_words};
use crate::{Error, Result};
use std::collections::{BTreeSet, HashSet};

/// Terms dropped from both documents and queries. Fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct StopWords(HashSet<String>);

impl StopWords {
    /// Build from any collection. Empty or invalid words are rejected.
    pub fn new<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();
        for word in words {
            let word = word.as_ref();
            if word.is_empty() {
                return Err(Error::invalid("empty stop word"));
            }
            if !is_valid_term(word) {
                return Err(Error::invalid(format!("stop word {word:?} contains forbidden characters")));
            }
            set.insert(word.to_string());
        }
        Ok(Self(set))
    }

    /// Build from space-separated text.
    pub fn parse(text: &str) -> Result<Self> {
        Self::new(split_into_words(text))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One classified query token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTerm<'a> {
    Required(&'a str),
    Excluded(&'a str),
}

impl<'a> QueryTerm<'a> {
    pub fn term(&self) -> &'a str {
        match *self {
            QueryTerm::Required(t) | QueryTerm::Excluded(t) => t,
        }
    }
}

/// Validate a single query token and strip its exclusion marker.
pub fn parse_query_token(token: &str) -> Result<QueryTerm<'_>> {
    if token.is_empty() {
        return Err(Error::invalid("query word is empty"));
    }
    let (term, excluded) = match token.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    if term.is_empty() || term.starts_with('-') || !is_valid_term(term) {
        return Err(Error::invalid(format!("query word {token:?} is invalid")));
    }
    Ok(if excluded { QueryTerm::Excluded(term) } else { QueryTerm::Required(term) })
}

/// Structured query: deduplicated required and excluded terms, stop words removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub required: BTreeSet<String>,
    pub excluded: BTreeSet<String>,
}

impl ParsedQuery {
    pub fn parse(text: &str, stop_words: &StopWords) -> Result<Self> {
        if has_orphan_minus(text) {
            return Err(Error::invalid(format!("query {text:?} has a minus not followed by a word")));
        }
        let mut query = ParsedQuery::default();
        for token in split_into_words(text) {
            let parsed = parse_query_token(token)?;
            if stop_words.contains(parsed.term()) {
                continue;
            }
            match parsed {
                QueryTerm::Required(t) => query.required.insert(t.to_string()),
                QueryTerm::Excluded(t) => query.excluded.insert(t.to_string()),
            };
        }
        Ok(query)
    }
}
