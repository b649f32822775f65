use thiserror::Error;

/// Main error type for beirbench
#[derive(Error, Debug)]
pub enum BenchError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors, e.g. a malformed results file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tab-separated reader errors
    #[error("TSV error: {0}")]
    Tsv(#[from] csv::Error),

    /// Network errors talking to a remote host
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP error {status} for {url}")]
    Http { status: u16, url: String },

    /// Zip archive errors
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parse errors (qrels rows, measure strings)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Errors reported by the relevance evaluator
    #[error("Evaluator error: {0}")]
    Evaluator(String),

    /// Averaging over zero evaluated queries
    #[error("Division by zero: no queries were evaluated")]
    EmptyEvaluation,

    /// Elasticsearch API errors
    #[error("Elasticsearch error: {0}")]
    Elasticsearch(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using BenchError
pub type Result<T> = std::result::Result<T, BenchError>;
