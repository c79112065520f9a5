use rayon::prelude::*;
use search_core::{DocumentStatus, Execution, SearchServer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const STABLE: &[(i32, &str)] = &[
    (1, "white cat fashionable collar"),
    (2, "fluffy cat fluffy tail"),
    (3, "groomed dog expressive eyes"),
    (4, "groomed starling evgeny"),
];
const CHURN_WORDS: &[&str] = &["cat", "dog", "rat", "starling", "churn", "tail"];

fn churn_text(i: i32) -> String {
    let a = CHURN_WORDS[i as usize % CHURN_WORDS.len()];
    let b = CHURN_WORDS[(i as usize / 2) % CHURN_WORDS.len()];
    format!("{a} {b} churn{i}")
}

fn stable_server() -> Arc<SearchServer> {
    let server = SearchServer::default();
    for &(id, text) in STABLE {
        server.add_document(id, text, DocumentStatus::Actual, &[id]).unwrap();
    }
    Arc::new(server)
}

#[test]
fn searches_never_observe_partial_writes() {
    let server = stable_server();
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let server = Arc::clone(&server);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for round in 0..200 {
                let mode = if round % 2 == 0 { Execution::Parallel } else { Execution::Sequential };
                for id in 100..110 {
                    server.add_document(id, &churn_text(id + round), DocumentStatus::Actual, &[]).unwrap();
                }
                for id in 100..110 {
                    assert!(server.remove_document(mode, id));
                }
            }
            // leave a known tail behind
            for id in 100..105 {
                server.add_document(id, &churn_text(id), DocumentStatus::Actual, &[]).unwrap();
            }
            done.store(true, Ordering::Release);
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let server = Arc::clone(&server);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut searches = 0;
                while !done.load(Ordering::Acquire) || searches < 50 {
                    for query in ["cat dog", "groomed -starling", "rat churn tail", "fluffy -churn"] {
                        let found = server.find_top_documents(Execution::Parallel, query).unwrap();
                        assert!(found.len() <= 5);
                        for doc in &found {
                            let stable = STABLE.iter().any(|&(id, _)| id == doc.id);
                            assert!(stable || (100..110).contains(&doc.id), "unknown id {}", doc.id);
                            assert!(doc.relevance.is_finite());
                        }
                    }
                    // only stable documents mention these words
                    let found = server.find_top_documents(Execution::Parallel, "fluffy groomed").unwrap();
                    let mut ids: Vec<_> = found.iter().map(|d| d.id).collect();
                    ids.sort_unstable();
                    assert_eq!(ids, [2, 3, 4]);
                    searches += 1;
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(server.document_count(), STABLE.len() + 5);
    assert_eq!(server.document_ids(), [1, 2, 3, 4, 100, 101, 102, 103, 104]);
    assert_index_mirrored(&server);
}

#[test]
fn nested_parallel_searches_make_progress_with_a_writer() {
    let server = stable_server();
    let writer = {
        let server = Arc::clone(&server);
        thread::spawn(move || {
            for id in 200..400 {
                server.add_document(id, &churn_text(id), DocumentStatus::Actual, &[]).unwrap();
                server.remove_document(Execution::Sequential, id);
            }
        })
    };
    (0..64).into_par_iter().for_each(|i| {
        let query = CHURN_WORDS[i % CHURN_WORDS.len()];
        let found = server.find_top_documents(Execution::Parallel, query).unwrap();
        assert!(found.len() <= 5);
        for doc in &found {
            let _ = server.match_document(Execution::Parallel, query, doc.id);
        }
    });
    writer.join().unwrap();
    assert_eq!(server.document_count(), STABLE.len());
    assert_index_mirrored(&server);
}

/// Every stored term of every live document is found by a search for that term,
/// and a search never returns a document that does not store the term.
fn assert_index_mirrored(server: &SearchServer) {
    let ids = server.document_ids();
    assert_eq!(ids.len(), server.document_count());
    let mut vocabulary: Vec<String> = CHURN_WORDS.iter().map(|w| w.to_string()).collect();
    for &id in &ids {
        vocabulary.extend(server.term_set(id));
    }
    for &id in &ids {
        let freqs = server.word_frequencies(id);
        for term in &vocabulary {
            let found = server.find_top_documents_by(Execution::Sequential, term, |d, _, _| d == id).unwrap();
            assert_eq!(found.len(), usize::from(freqs.contains_key(term)), "id {id} term {term}");
        }
    }
}
