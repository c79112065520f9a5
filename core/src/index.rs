use crate::concurrent_map::ConcurrentMap;
use crate::document::{DocumentRecord, DocumentStatus, Rating};
use crate::Execution;
use parking_lot::MappedRwLockReadGuard;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type DocId = i32;

/// Document -> normalized frequency, for one term.
pub type Postings = BTreeMap<DocId, f64>;

/// Forward and inverted indexes plus per-document metadata.
///
/// The inverted index interns terms into `TermId`s and keeps postings in a
/// [`ConcurrentMap`] sharded by term id, so postings of different terms can be
/// erased concurrently. Everything else is mutated only through `&mut self`.
/// A term leaves the dictionary together with its last posting, and its id goes
/// back on the free list.
pub struct InvertedIndex {
    pub(crate) dictionary: HashMap<String, TermId>,
    free_terms: Vec<TermId>,
    next_term: TermId,
    pub(crate) postings: ConcurrentMap<TermId, Postings>,
    pub(crate) forward: BTreeMap<DocId, BTreeMap<String, f64>>,
    pub(crate) docs: BTreeMap<DocId, DocumentRecord>,
    /// Insertion sequence -> live id.
    pub(crate) order: BTreeMap<u64, DocId>,
    next_seq: u64,
}

impl InvertedIndex {
    pub fn new(shard_count: usize) -> Self {
        Self {
            dictionary: HashMap::new(),
            free_terms: Vec::new(),
            next_term: 0,
            postings: ConcurrentMap::new(shard_count),
            forward: BTreeMap::new(),
            docs: BTreeMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn contains(&self, id: DocId) -> bool { self.docs.contains_key(&id) }

    pub fn document(&self, id: DocId) -> Option<&DocumentRecord> { self.docs.get(&id) }

    /// Live ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = DocId> + '_ { self.order.values().copied() }

    pub fn term_frequencies(&self, id: DocId) -> Option<&BTreeMap<String, f64>> { self.forward.get(&id) }

    /// Postings for `term`, or `None` if no live document contains it.
    pub fn postings(&self, term: &str) -> Option<MappedRwLockReadGuard<'_, Postings>> {
        let tid = self.dictionary.get(term)?;
        self.postings.get(tid)
    }

    pub fn doc_frequency(&self, term: &str) -> usize {
        self.postings(term).map_or(0, |p| p.len())
    }

    /// `ln(N / df)`. Callers only ask about terms with at least one posting.
    pub fn inverse_document_freq(&self, doc_frequency: usize) -> f64 {
        (self.num_docs() as f64 / doc_frequency as f64).ln()
    }

    pub fn document_has_term(&self, id: DocId, term: &str) -> bool {
        self.forward.get(&id).is_some_and(|freqs| freqs.contains_key(term))
    }

    fn intern(&mut self, term: &str) -> TermId {
        if let Some(&tid) = self.dictionary.get(term) {
            return tid;
        }
        // Live terms never outnumber the id space: each one needs a posting.
        let tid = self.free_terms.pop().unwrap_or_else(|| {
            let tid = self.next_term;
            self.next_term += 1;
            tid
        });
        self.dictionary.insert(term.to_string(), tid);
        tid
    }

    /// Store a validated document. The caller has already checked the id and
    /// dropped stop words; `terms` may be empty.
    pub(crate) fn insert(&mut self, id: DocId, terms: Vec<String>, status: DocumentStatus, rating: Rating) {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for term in &terms {
            *counts.entry(term.as_str()).or_insert(0) += 1;
        }
        let total = terms.len() as f64;
        let mut freqs = BTreeMap::new();
        for (term, count) in counts {
            let tf = count as f64 / total;
            let tid = self.intern(term);
            self.postings.access(tid).insert(id, tf);
            freqs.insert(term.to_string(), tf);
        }
        self.forward.insert(id, freqs);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.docs.insert(id, DocumentRecord { rating, status, terms, seq });
        self.order.insert(seq, id);
    }

    /// Erase a document from every structure. Returns false if it was absent.
    pub(crate) fn remove(&mut self, id: DocId, mode: Execution) -> bool {
        let Some(freqs) = self.forward.remove(&id) else {
            return false;
        };
        let terms: Vec<(&str, TermId)> = freqs
            .keys()
            .filter_map(|t| self.dictionary.get(t).map(|&tid| (t.as_str(), tid)))
            .collect();
        let postings = &self.postings;
        let evict = |&(_, tid): &(&str, TermId)| {
            postings.update_or_evict(&tid, |bucket| {
                bucket.remove(&id);
                bucket.is_empty()
            })
        };
        let emptied: Vec<&(&str, TermId)> = match mode {
            Execution::Sequential => terms.iter().filter(|&entry| evict(entry)).collect(),
            Execution::Parallel => terms.par_iter().filter(|&entry| evict(entry)).collect(),
        };
        for &(term, tid) in emptied {
            self.dictionary.remove(term);
            self.free_terms.push(tid);
        }
        if let Some(record) = self.docs.remove(&id) {
            self.order.remove(&record.seq);
        }
        true
    }
}
