use crate::{Document, Execution, Result, SearchServer};
use rayon::prelude::*;

/// Run many queries concurrently; one result list per query, in input order.
pub fn process_queries<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    queries
        .par_iter()
        .map(|q| server.find_top_documents(Execution::Sequential, q.as_ref()))
        .collect()
}

/// Like [`process_queries`], flattened into one list that keeps query order.
pub fn process_queries_joined<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    Ok(process_queries(server, queries)?.into_iter().flatten().collect())
}
