//! In-memory TF-IDF document index.
//!
//! Documents are split on spaces, stop words are dropped, and every stored term
//! is recorded twice: in a forward index (document -> term frequencies) and in an
//! inverted index (term -> document frequencies). Queries are bags of required
//! terms plus `-excluded` terms, ranked by TF-IDF relevance and then by rating.
//!
//! Every search, match and removal takes an [`Execution`] mode. Parallel searches
//! accumulate relevance in a [`ConcurrentMap`] sharded by document id; parallel
//! removal erases postings per term from an inverted index sharded the same way.

pub mod batch;
pub mod concurrent_map;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod query;
pub mod ranker;
pub mod server;
pub mod tokenizer;

pub use batch::{process_queries, process_queries_joined};
pub use concurrent_map::ConcurrentMap;
pub use config::SearchConfig;
pub use document::{Document, DocumentStatus, Rating};
pub use error::{Error, Result};
pub use index::{DocId, TermId};
pub use query::{ParsedQuery, StopWords};
pub use server::SearchServer;

/// How a single call distributes its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// Single-threaded and fully deterministic.
    #[default]
    Sequential,
    /// Fans out over the rayon pool; results match [`Execution::Sequential`].
    Parallel,
}
