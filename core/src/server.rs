use crate::config::SearchConfig;
use crate::document::{average_rating, Document, DocumentStatus, Rating};
use crate::index::{DocId, InvertedIndex};
use crate::query::{ParsedQuery, StopWords};
use crate::tokenizer::tokenize;
use crate::{ranker, Error, Execution, Result};
use parking_lot::{RwLock, RwLockReadGuard};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Thread-safe TF-IDF search index.
///
/// Searches and matches take a shared read lock on the index; adds and removals
/// take the write lock, so a mutation never overlaps a search.
pub struct SearchServer {
    stop_words: StopWords,
    config: SearchConfig,
    shard_count: usize,
    index: RwLock<InvertedIndex>,
}

impl Default for SearchServer {
    fn default() -> Self {
        Self::with_config(StopWords::default(), SearchConfig::default())
    }
}

impl SearchServer {
    /// Server whose stop words are the space-separated words of `stop_words`.
    pub fn new(stop_words: &str) -> Result<Self> {
        Ok(Self::with_config(StopWords::parse(stop_words)?, SearchConfig::default()))
    }

    pub fn from_stop_words<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::with_config(StopWords::new(stop_words)?, SearchConfig::default()))
    }

    pub fn with_config(stop_words: StopWords, config: SearchConfig) -> Self {
        let shard_count = config.shards();
        tracing::info!(stop_words = stop_words.len(), shard_count, max_results = config.max_results, "search server created");
        Self { stop_words, config, shard_count, index: RwLock::new(InvertedIndex::new(shard_count)) }
    }

    /// Shared access to the index. A rayon worker already holding the lock may
    /// steal another search; a plain `read` would then queue behind a waiting writer.
    fn read(&self) -> RwLockReadGuard<'_, InvertedIndex> {
        self.index.read_recursive()
    }

    pub fn config(&self) -> &SearchConfig { &self.config }

    pub fn stop_words(&self) -> &StopWords { &self.stop_words }

    pub fn parse_query(&self, raw_query: &str) -> Result<ParsedQuery> {
        ParsedQuery::parse(raw_query, &self.stop_words)
    }

    /// Index a document. All validation happens before the index is touched.
    pub fn add_document(&self, id: DocId, text: &str, status: DocumentStatus, ratings: &[Rating]) -> Result<()> {
        if id < 0 {
            return Err(Error::invalid(format!("document id {id} is negative")));
        }
        let terms: Vec<String> = tokenize(text)?
            .into_iter()
            .filter(|w| !self.stop_words.contains(w))
            .map(str::to_string)
            .collect();
        let rating = average_rating(ratings);

        let mut index = self.index.write();
        if index.contains(id) {
            return Err(Error::invalid(format!("document id {id} already exists")));
        }
        tracing::debug!(id, terms = terms.len(), rating, ?status, "adding document");
        index.insert(id, terms, status, rating);
        Ok(())
    }

    /// Top documents with status [`DocumentStatus::Actual`].
    pub fn find_top_documents(&self, mode: Execution, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_with_status(mode, raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_with_status(
        &self,
        mode: Execution,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_by(mode, raw_query, |_, doc_status, _| doc_status == status)
    }

    /// Top documents accepted by `predicate(id, status, rating)`.
    pub fn find_top_documents_by<P>(&self, mode: Execution, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, Rating) -> bool + Sync,
    {
        let query = self.parse_query(raw_query)?;
        let index = self.read();
        let matched = ranker::find_all_documents(&index, &query, &predicate, mode, self.shard_count);
        Ok(ranker::rank(matched, self.config.max_results, self.config.relevance_epsilon))
    }

    /// Required query terms present in document `id`, sorted; empty if any
    /// excluded term is present. The document's status is returned either way.
    pub fn match_document(&self, mode: Execution, raw_query: &str, id: DocId) -> Result<(Vec<String>, DocumentStatus)> {
        let query = self.parse_query(raw_query)?;
        let index = self.read();
        let status = index.document(id).ok_or(Error::NotFound(id))?.status;
        let in_doc = |term: &String| index.document_has_term(id, term);

        let matched = match mode {
            Execution::Sequential => {
                if query.excluded.iter().any(in_doc) {
                    return Ok((Vec::new(), status));
                }
                query.required.iter().filter(|&t| in_doc(t)).cloned().collect()
            }
            Execution::Parallel => {
                if query.excluded.par_iter().any(in_doc) {
                    return Ok((Vec::new(), status));
                }
                let mut words: Vec<String> = query.required.par_iter().filter(|&t| in_doc(t)).cloned().collect();
                words.sort_unstable();
                words
            }
        };
        Ok((matched, status))
    }

    /// Remove a document. Absent ids are a no-op; returns whether anything was removed.
    ///
    /// [`Execution::Parallel`] holds the write lock while it waits on the rayon
    /// pool, so it must not be called while pool workers are themselves blocked
    /// on this server.
    pub fn remove_document(&self, mode: Execution, id: DocId) -> bool {
        let removed = self.index.write().remove(id, mode);
        if removed {
            tracing::debug!(id, ?mode, "removed document");
        }
        removed
    }

    /// Remove every document whose set of stored terms equals that of a document
    /// with a lower id. Returns the removed ids in ascending order.
    pub fn remove_duplicates(&self) -> Vec<DocId> {
        let mut index = self.index.write();
        let mut seen: HashMap<Vec<&str>, DocId> = HashMap::new();
        let mut duplicates = Vec::new();
        for (&id, freqs) in &index.forward {
            let terms: Vec<&str> = freqs.keys().map(String::as_str).collect();
            if seen.contains_key(&terms) {
                duplicates.push(id);
            } else {
                seen.insert(terms, id);
            }
        }
        drop(seen);
        for &id in &duplicates {
            tracing::info!(id, "found duplicate document, removing");
            index.remove(id, Execution::Sequential);
        }
        duplicates
    }

    /// Term -> normalized frequency for `id`; empty if the document is absent.
    pub fn word_frequencies(&self, id: DocId) -> BTreeMap<String, f64> {
        self.read().term_frequencies(id).cloned().unwrap_or_default()
    }

    pub fn document_count(&self) -> usize {
        self.read().num_docs()
    }

    /// Live ids in insertion order.
    pub fn document_ids(&self) -> Vec<DocId> {
        self.read().ids().collect()
    }

    /// Distinct stored terms of `id`.
    pub fn term_set(&self, id: DocId) -> BTreeSet<String> {
        self.read().term_frequencies(id).map(|f| f.keys().cloned().collect()).unwrap_or_default()
    }
}

impl<'a> IntoIterator for &'a SearchServer {
    type Item = DocId;
    type IntoIter = std::vec::IntoIter<DocId>;

    fn into_iter(self) -> Self::IntoIter {
        self.document_ids().into_iter()
    }
}
