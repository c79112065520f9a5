use crate::DocId;
use serde::{Deserialize, Serialize};

pub type Rating = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

/// One ranked search hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub relevance: f64,
    pub rating: Rating,
}

impl Document {
    pub fn new(id: DocId, relevance: f64, rating: Rating) -> Self {
        Self { id, relevance, rating }
    }
}

/// Stored per-document metadata. Immutable once indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub rating: Rating,
    pub status: DocumentStatus,
    /// Stored (non-stop) terms in document order, repetitions kept.
    pub terms: Vec<String>,
    /// Position in insertion order; never reused.
    pub(crate) seq: u64,
}

/// Integer mean truncated toward zero; 0 for no ratings.
pub fn average_rating(ratings: &[Rating]) -> Rating {
    if ratings.is_empty() {
        return 0;
    }
    let sum: i64 = ratings.iter().map(|&r| r as i64).sum();
    (sum / ratings.len() as i64) as Rating
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_truncates_toward_zero() {
        assert_eq!(average_rating(&[5, 3, 10]), 6);
        assert_eq!(average_rating(&[-10, -15, -20]), -15);
        assert_eq!(average_rating(&[1, 0, 0]), 0);
        assert_eq!(average_rating(&[-1, -2]), -1);
        assert_eq!(average_rating(&[]), 0);
    }

    #[test]
    fn mean_does_not_overflow() {
        assert_eq!(average_rating(&[i32::MAX, i32::MAX]), i32::MAX);
    }
}
