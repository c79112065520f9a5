use crate::concurrent_map::ConcurrentMap;
use crate::document::{Document, DocumentStatus, Rating};
use crate::index::{DocId, InvertedIndex};
use crate::query::ParsedQuery;
use crate::Execution;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Relevance of every document that matches `query` and passes `predicate`, unsorted.
///
/// Both modes sum a document's contributions in required-term order, so they
/// produce bit-identical relevance values.
pub fn find_all_documents<P>(
    index: &InvertedIndex,
    query: &ParsedQuery,
    predicate: &P,
    mode: Execution,
    shard_count: usize,
) -> Vec<Document>
where
    P: Fn(DocId, DocumentStatus, Rating) -> bool + Sync,
{
    let relevance = match mode {
        Execution::Sequential => accumulate_sequential(index, query, predicate),
        Execution::Parallel => accumulate_parallel(index, query, predicate, shard_count),
    };
    relevance
        .into_iter()
        .filter_map(|(id, relevance)| index.document(id).map(|doc| Document::new(id, relevance, doc.rating)))
        .collect()
}

fn accumulate_sequential<P>(index: &InvertedIndex, query: &ParsedQuery, predicate: &P) -> BTreeMap<DocId, f64>
where
    P: Fn(DocId, DocumentStatus, Rating) -> bool,
{
    let mut relevance: BTreeMap<DocId, f64> = BTreeMap::new();
    for term in &query.required {
        let Some(postings) = index.postings(term) else { continue };
        let idf = index.inverse_document_freq(postings.len());
        for (&id, &tf) in postings.iter() {
            if accepts(index, id, predicate) {
                *relevance.entry(id).or_insert(0.0) += tf * idf;
            }
        }
    }
    for term in &query.excluded {
        let Some(postings) = index.postings(term) else { continue };
        for id in postings.keys() {
            relevance.remove(id);
        }
    }
    relevance
}

fn accumulate_parallel<P>(
    index: &InvertedIndex,
    query: &ParsedQuery,
    predicate: &P,
    shard_count: usize,
) -> BTreeMap<DocId, f64>
where
    P: Fn(DocId, DocumentStatus, Rating) -> bool + Sync,
{
    // Per document: (position of the required term, contribution).
    let partials: ConcurrentMap<DocId, Vec<(usize, f64)>> = ConcurrentMap::new(shard_count);
    let required: Vec<&String> = query.required.iter().collect();
    required.par_iter().enumerate().for_each(|(ordinal, term)| {
        let Some(postings) = index.postings(term) else { return };
        let idf = index.inverse_document_freq(postings.len());
        for (&id, &tf) in postings.iter() {
            if accepts(index, id, predicate) {
                partials.access(id).push((ordinal, tf * idf));
            }
        }
    });
    query.excluded.par_iter().for_each(|term| {
        let Some(postings) = index.postings(term) else { return };
        for id in postings.keys() {
            partials.remove(id);
        }
    });
    tracing::debug!(shards = partials.shard_count(), candidates = partials.len(), "parallel accumulation done");
    partials
        .drain()
        .into_iter()
        .map(|(id, mut parts)| {
            parts.sort_unstable_by_key(|&(ordinal, _)| ordinal);
            (id, parts.into_iter().fold(0.0, |acc, (_, c)| acc + c))
        })
        .collect()
}

fn accepts<P>(index: &InvertedIndex, id: DocId, predicate: &P) -> bool
where
    P: Fn(DocId, DocumentStatus, Rating) -> bool,
{
    index.document(id).is_some_and(|doc| predicate(id, doc.status, doc.rating))
}

/// Order by relevance descending; documents whose relevance is within `epsilon`
/// of the first document of their run are ordered by rating descending instead.
/// Then keep at most `max_results`.
pub fn rank(mut docs: Vec<Document>, max_results: usize, epsilon: f64) -> Vec<Document> {
    docs.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    let mut start = 0;
    while start < docs.len() {
        let head = docs[start].relevance;
        let end = docs[start + 1..]
            .iter()
            .position(|d| (head - d.relevance).abs() >= epsilon)
            .map_or(docs.len(), |offset| start + 1 + offset);
        docs[start..end].sort_by(|a, b| b.rating.cmp(&a.rating));
        start = end;
    }
    docs.truncate(max_results);
    docs
}
