use crate::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // A minus that opens a token and is followed by a space or the end of the text.
    static ref ORPHAN_MINUS: Regex = Regex::new(r"(?:^| )-(?: |$)").expect("valid regex");
}

/// Split text into space-delimited words. Runs of spaces collapse; empty input yields nothing.
pub fn split_into_words(text: &str) -> impl Iterator<Item = &str> + Clone + '_ {
    text.split(' ').filter(|w| !w.is_empty())
}

/// A term is valid when it contains no control character (code points 0..=31).
pub fn is_valid_term(term: &str) -> bool {
    !term.chars().any(|c| c < ' ')
}

pub fn has_orphan_minus(text: &str) -> bool {
    ORPHAN_MINUS.is_match(text)
}

/// Split document text into validated words.
pub fn tokenize(text: &str) -> Result<Vec<&str>> {
    split_into_words(text)
        .map(|word| {
            if is_valid_term(word) {
                Ok(word)
            } else {
                Err(Error::invalid(format!("word {word:?} contains forbidden characters")))
            }
        })
        .collect()
}
