//! BM25 baseline retrieval over Elasticsearch.

pub mod bm25;
pub mod elastic;

pub use bm25::{collect_scores, BM25Search};
pub use elastic::{ElasticClient, ElasticOptions, Hit, SearchHits};
