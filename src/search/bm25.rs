use crate::dataset::{Corpus, Queries};
use crate::error::Result;
use crate::eval::Results;
use crate::search::elastic::{ElasticClient, SearchHits};
use std::collections::HashMap;
use std::time::Duration;

/// BM25 retrieval baseline backed by an Elasticsearch index.
///
/// Elasticsearch does the ranking; this type drives index (re)creation, corpus
/// indexing and batched multi-search, and turns hits into a run.
pub struct BM25Search {
    es: ElasticClient,
    initialize: bool,
    sleep_for: Duration,
}

impl BM25Search {
    /// Wrap a client. When `initialize` is set the index is dropped and recreated
    /// here, and [`search`](Self::search) indexes the corpus before querying.
    pub async fn connect(es: ElasticClient, initialize: bool, sleep_for: Duration) -> Result<Self> {
        let bm25 = Self {
            es,
            initialize,
            sleep_for,
        };
        if initialize {
            bm25.initialize_index().await?;
        }
        Ok(bm25)
    }

    /// Delete and recreate the index, pausing in between so the delete settles.
    pub async fn initialize_index(&self) -> Result<()> {
        self.es.delete_index().await?;
        tokio::time::sleep(self.sleep_for).await;
        self.es.create_index().await
    }

    pub async fn index(&self, corpus: &Corpus) -> Result<()> {
        self.es.bulk_add(corpus).await
    }

    /// Retrieve the top `top_k` documents for every query.
    ///
    /// Queries go out in batches of the client's batch size. One extra hit is
    /// requested per query because a document sharing the query's id is dropped
    /// (datasets such as quora and arguana put queries in the corpus).
    pub async fn search(&self, corpus: &Corpus, queries: &Queries, top_k: usize) -> Result<Results> {
        if self.initialize {
            self.index(corpus).await?;
            // Let the refresh become visible to searches
            tokio::time::sleep(self.sleep_for).await;
        }

        let mut query_ids: Vec<&String> = queries.keys().collect();
        query_ids.sort();

        let batch_size = self.es.options().batch_size;
        let mut results = Results::with_capacity(query_ids.len());

        for (batch_idx, batch) in query_ids.chunks(batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|id| queries[*id].as_str()).collect();
            let hits = self.es.lexical_msearch(&texts, top_k + 1, 0).await?;

            for (query_id, query_hits) in batch.iter().zip(hits) {
                results.insert((*query_id).clone(), collect_scores(query_id, query_hits, top_k));
            }
            log::debug!(
                "Batch {} done: {}/{} queries",
                batch_idx + 1,
                results.len(),
                query_ids.len()
            );
        }

        log::info!("Retrieved results for {} queries", results.len());
        Ok(results)
    }
}

/// Document id -> score for one query, without the query's own id, at most `top_k` entries.
pub fn collect_scores(query_id: &str, hits: SearchHits, top_k: usize) -> HashMap<String, f64> {
    hits.hits
        .into_iter()
        .filter(|hit| hit.id != query_id)
        .take(top_k)
        .map(|hit| (hit.id, hit.score))
        .collect()
}
