//! Elasticsearch REST client for BM25 indexing and multi-search.

use crate::dataset::{Corpus, Document};
use crate::error::{BenchError, Result};
use crate::progress::count_bar;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use url::Url;

/// Built-in Elasticsearch language analyzers.
pub const SUPPORTED_LANGUAGES: [&str; 35] = [
    "arabic",
    "armenian",
    "basque",
    "bengali",
    "brazilian",
    "bulgarian",
    "catalan",
    "cjk",
    "czech",
    "danish",
    "dutch",
    "english",
    "estonian",
    "finnish",
    "french",
    "galician",
    "german",
    "greek",
    "hindi",
    "hungarian",
    "indonesian",
    "irish",
    "italian",
    "latvian",
    "lithuanian",
    "norwegian",
    "persian",
    "portuguese",
    "romanian",
    "russian",
    "sorani",
    "spanish",
    "swedish",
    "turkish",
    "thai",
];

/// Elasticsearch refuses `from + size` beyond `index.max_result_window` (10000 by default).
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// Connection and index settings for [`ElasticClient`].
#[derive(Debug, Clone)]
pub struct ElasticOptions {
    pub hostname: String,
    pub index_name: String,
    pub language: String,
    pub title_key: String,
    pub text_key: String,
    /// Documents per bulk request
    pub batch_size: usize,
    pub number_of_shards: usize,
}

impl ElasticOptions {
    /// Options for `index_name` with the stock defaults (local node, english analyzer).
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            hostname: "http://localhost:9200".to_string(),
            index_name: index_name.into(),
            language: "english".to_string(),
            title_key: "title".to_string(),
            text_key: "txt".to_string(),
            batch_size: 128,
            number_of_shards: 1,
        }
    }
}

/// A scored document returned by a search.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub score: f64,
}

/// Hits of one query in a multi-search, with the response metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHits {
    pub total: u64,
    pub took: u64,
    pub hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct MsearchResponse {
    responses: Vec<MsearchItem>,
}

#[derive(Deserialize)]
struct MsearchItem {
    #[serde(default)]
    took: u64,
    hits: Option<HitsEnvelope>,
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
struct TotalHits {
    value: u64,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f64>,
}

#[derive(Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
}

/// Minimal Elasticsearch REST client for one index.
///
/// Covers what the BM25 baseline needs: index lifecycle, bulk indexing and
/// lexical multi-search over a title and a text field.
pub struct ElasticClient {
    client: Client,
    base_url: Url,
    options: ElasticOptions,
}

impl ElasticClient {
    pub fn new(options: ElasticOptions) -> Result<Self> {
        let client = Client::builder().build()?;
        Self::with_client(client, options)
    }

    pub fn with_client(client: Client, options: ElasticOptions) -> Result<Self> {
        if !SUPPORTED_LANGUAGES.contains(&options.language.as_str()) {
            return Err(BenchError::InvalidInput(format!(
                "unsupported analyzer language: {}",
                options.language
            )));
        }
        if options.batch_size == 0 {
            return Err(BenchError::InvalidInput("batch_size must be greater than 0".to_string()));
        }
        if options.index_name.is_empty() {
            return Err(BenchError::InvalidInput("index name must not be empty".to_string()));
        }

        // Trailing slash so joins append to any path prefix instead of replacing it
        let mut host = options.hostname.clone();
        if !host.ends_with('/') {
            host.push('/');
        }
        let base_url = Url::parse(&host)
            .map_err(|e| BenchError::InvalidInput(format!("invalid Elasticsearch URL {}: {}", options.hostname, e)))?;

        Ok(Self {
            client,
            base_url,
            options,
        })
    }

    pub fn options(&self) -> &ElasticOptions {
        &self.options
    }

    pub fn index_name(&self) -> &str {
        &self.options.index_name
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| BenchError::InvalidInput(format!("invalid Elasticsearch path {}: {}", path, e)))
    }

    async fn error_from(response: reqwest::Response, action: &str) -> BenchError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        BenchError::Elasticsearch(format!("{} failed with {}: {}", action, status, body))
    }

    pub async fn index_exists(&self) -> Result<bool> {
        let response = self
            .client
            .head(self.endpoint(self.index_name())?)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::error_from(response, "index exists check").await),
        }
    }

    /// Delete the index if it exists.
    pub async fn delete_index(&self) -> Result<()> {
        if !self.index_exists().await? {
            log::info!("Index {} does not exist, skipping delete", self.index_name());
            return Ok(());
        }

        let response = self
            .client
            .delete(self.endpoint(self.index_name())?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response, "delete index").await);
        }

        log::info!("Index {} deleted", self.index_name());
        Ok(())
    }

    /// Index settings and mappings: language analyzer as default and on both fields.
    pub fn index_settings(&self) -> serde_json::Value {
        let language = &self.options.language;
        let mut properties = serde_json::Map::new();
        for key in [&self.options.title_key, &self.options.text_key] {
            properties.insert(key.clone(), json!({ "type": "text", "analyzer": language }));
        }

        json!({
            "settings": {
                "number_of_shards": self.options.number_of_shards,
                "analysis": {
                    "analyzer": {
                        "default": { "type": language }
                    }
                }
            },
            "mappings": {
                "properties": properties
            }
        })
    }

    /// Create the index unless it already exists.
    pub async fn create_index(&self) -> Result<()> {
        if self.index_exists().await? {
            log::info!("Index {} already exists, skipping create", self.index_name());
            return Ok(());
        }

        let response = self
            .client
            .put(self.endpoint(self.index_name())?)
            .json(&self.index_settings())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response, "create index").await);
        }

        log::info!("Index {} created ({} analyzer)", self.index_name(), self.options.language);
        Ok(())
    }

    /// NDJSON bulk body indexing each document under its id.
    pub fn bulk_body(&self, docs: &[(&String, &Document)]) -> Result<String> {
        let mut body = String::new();
        for (id, doc) in docs {
            let meta = json!({ "index": { "_index": self.index_name(), "_id": id } });
            let mut source = serde_json::Map::new();
            source.insert(self.options.title_key.clone(), json!(doc.title));
            source.insert(self.options.text_key.clone(), json!(doc.text));

            body.push_str(&serde_json::to_string(&meta)?);
            body.push('\n');
            body.push_str(&serde_json::to_string(&source)?);
            body.push('\n');
        }
        Ok(body)
    }

    /// Index the whole corpus in bulk requests of `batch_size` documents.
    pub async fn bulk_add(&self, corpus: &Corpus) -> Result<()> {
        let mut docs: Vec<(&String, &Document)> = corpus.iter().collect();
        docs.sort_by(|a, b| a.0.cmp(b.0));

        let url = self.endpoint("_bulk?refresh=true")?;
        let pb = count_bar(docs.len() as u64, "Indexing");

        for batch in docs.chunks(self.options.batch_size) {
            let response = self
                .client
                .post(url.clone())
                .header("Content-Type", "application/x-ndjson")
                .body(self.bulk_body(batch)?)
                .send()
                .await?;
            if !response.status().is_success() {
                pb.abandon();
                return Err(Self::error_from(response, "bulk index").await);
            }

            let result: BulkResponse = response.json().await?;
            if result.errors {
                log::warn!("Bulk request into {} reported item errors", self.index_name());
            }
            pb.inc(batch.len() as u64);
        }

        pb.finish_and_clear();
        log::info!("Indexed {} documents into {}", docs.len(), self.index_name());
        Ok(())
    }

    /// NDJSON multi-search body: a header line and a `multi_match` query per query text.
    pub fn msearch_body(&self, queries: &[&str], top_hits: usize, skip: usize) -> Result<String> {
        let header = json!({ "index": self.index_name(), "search_type": "dfs_query_then_fetch" });
        let header = serde_json::to_string(&header)?;

        let mut body = String::new();
        for query in queries {
            let request = json!({
                "_source": false,
                "query": {
                    "multi_match": {
                        "query": query,
                        "type": "best_fields",
                        "fields": [self.options.title_key, self.options.text_key],
                        "tie_breaker": 0.5
                    }
                },
                "size": skip + top_hits
            });
            body.push_str(&header);
            body.push('\n');
            body.push_str(&serde_json::to_string(&request)?);
            body.push('\n');
        }
        Ok(body)
    }

    /// Run one `_msearch` request for `queries`, returning hits after the first `skip`.
    pub async fn lexical_msearch(
        &self,
        queries: &[&str],
        top_hits: usize,
        skip: usize,
    ) -> Result<Vec<SearchHits>> {
        if skip + top_hits > MAX_RESULT_WINDOW {
            return Err(BenchError::InvalidInput(format!(
                "Elasticsearch window too large (max {}), got {}",
                MAX_RESULT_WINDOW,
                skip + top_hits
            )));
        }
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.endpoint("_msearch")?)
            .header("Content-Type", "application/x-ndjson")
            .body(self.msearch_body(queries, top_hits, skip)?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response, "msearch").await);
        }

        let body = response.text().await?;
        let results = parse_msearch_response(&body, skip)?;
        if results.len() != queries.len() {
            return Err(BenchError::Elasticsearch(format!(
                "msearch returned {} responses for {} queries",
                results.len(),
                queries.len()
            )));
        }
        Ok(results)
    }
}

/// Parse an `_msearch` response body, dropping the first `skip` hits of each response.
pub fn parse_msearch_response(body: &str, skip: usize) -> Result<Vec<SearchHits>> {
    let response: MsearchResponse = serde_json::from_str(body)?;

    response
        .responses
        .into_iter()
        .map(|item| {
            if let Some(error) = item.error {
                return Err(BenchError::Elasticsearch(format!("search failed: {}", error)));
            }
            let envelope = item
                .hits
                .ok_or_else(|| BenchError::Elasticsearch("search response without hits".to_string()))?;
            let total = envelope
                .total
                .map(|t| t.value)
                .unwrap_or(envelope.hits.len() as u64);
            let hits = envelope
                .hits
                .into_iter()
                .skip(skip)
                .map(|hit| Hit {
                    id: hit.id,
                    score: hit.score.unwrap_or(0.0),
                })
                .collect();
            Ok(SearchHits {
                total,
                took: item.took,
                hits,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_client, serve};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use axum::Router;

    fn client_for(hostname: String) -> ElasticClient {
        let mut options = ElasticOptions::new("scifact");
        options.hostname = hostname;
        ElasticClient::with_client(local_client(), options).unwrap()
    }

    #[test]
    fn test_rejects_unknown_language() {
        let mut options = ElasticOptions::new("scifact");
        options.language = "latin".to_string();
        assert!(ElasticClient::with_client(local_client(), options).is_err());
    }

    #[test]
    fn test_index_settings() {
        let es = client_for("http://localhost:9200".to_string());
        let settings = es.index_settings();
        assert_eq!(settings["settings"]["analysis"]["analyzer"]["default"]["type"], "english");
        assert_eq!(settings["settings"]["number_of_shards"], 1);
        assert_eq!(settings["mappings"]["properties"]["title"]["analyzer"], "english");
        assert_eq!(settings["mappings"]["properties"]["txt"]["type"], "text");
    }

    #[test]
    fn test_bulk_body() {
        let es = client_for("http://localhost:9200".to_string());
        let id = "d1".to_string();
        let doc = Document {
            title: "Aspirin".to_string(),
            text: "Reduces fever.".to_string(),
        };
        let body = es.bulk_body(&[(&id, &doc)]).unwrap();
        let lines: Vec<serde_json::Value> = body
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["index"]["_index"], "scifact");
        assert_eq!(lines[0]["index"]["_id"], "d1");
        assert_eq!(lines[1]["title"], "Aspirin");
        assert_eq!(lines[1]["txt"], "Reduces fever.");
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_msearch_body() {
        let es = client_for("http://localhost:9200".to_string());
        let body = es.msearch_body(&["fever", "aspirin dose"], 11, 0).unwrap();
        let lines: Vec<serde_json::Value> = body
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["search_type"], "dfs_query_then_fetch");
        assert_eq!(lines[1]["size"], 11);
        assert_eq!(lines[1]["_source"], false);
        assert_eq!(lines[1]["query"]["multi_match"]["query"], "fever");
        assert_eq!(lines[1]["query"]["multi_match"]["fields"][1], "txt");
        assert_eq!(lines[3]["query"]["multi_match"]["query"], "aspirin dose");
    }

    #[test]
    fn test_parse_msearch_response() {
        let body = r#"{"took": 5, "responses": [
            {"took": 3, "hits": {"total": {"value": 42, "relation": "eq"},
              "hits": [{"_id": "d1", "_score": 9.5}, {"_id": "d2", "_score": 4.0}, {"_id": "d3", "_score": 1.25}]}},
            {"took": 1, "hits": {"total": {"value": 0, "relation": "eq"}, "hits": []}}
        ]}"#;

        let parsed = parse_msearch_response(body, 1).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].total, 42);
        assert_eq!(parsed[0].took, 3);
        assert_eq!(
            parsed[0].hits,
            vec![
                Hit { id: "d2".to_string(), score: 4.0 },
                Hit { id: "d3".to_string(), score: 1.25 },
            ]
        );
        assert!(parsed[1].hits.is_empty());
    }

    #[test]
    fn test_parse_msearch_error_item() {
        let body = r#"{"responses": [{"error": {"type": "index_not_found_exception"}, "status": 404}]}"#;
        let err = parse_msearch_response(body, 0).unwrap_err();
        assert!(err.to_string().contains("index_not_found_exception"));
    }

    #[tokio::test]
    async fn test_window_too_large() {
        let es = client_for("http://127.0.0.1:9".to_string());
        let err = es.lexical_msearch(&["q"], 10_000, 1).await.unwrap_err();
        assert!(matches!(err, BenchError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_index_exists_and_delete_missing() {
        let router = Router::new().route("/scifact", get(|| async { AxumStatus::NOT_FOUND }));
        let addr = serve(router).await;
        let es = client_for(format!("http://{}", addr));

        assert!(!es.index_exists().await.unwrap());
        es.delete_index().await.unwrap();
    }

    #[tokio::test]
    async fn test_lexical_msearch_against_mock() {
        let router = Router::new().route(
            "/_msearch",
            post(|body: String| async move {
                // Two header/body pairs expected
                assert_eq!(body.lines().count(), 4);
                r#"{"responses": [
                    {"took": 2, "hits": {"total": {"value": 1}, "hits": [{"_id": "d1", "_score": 3.5}]}},
                    {"took": 2, "hits": {"total": {"value": 0}, "hits": []}}
                ]}"#
            }),
        );
        let addr = serve(router).await;
        let es = client_for(format!("http://{}", addr));

        let results = es.lexical_msearch(&["fever", "dose"], 10, 0).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].hits[0].id, "d1");
        assert_eq!(results[0].hits[0].score, 3.5);
        assert!(results[1].hits.is_empty());
    }
}
