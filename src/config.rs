use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::search::elastic::SUPPORTED_LANGUAGES;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub eval: EvalConfig,
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,
}

/// Local directory layout
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Where datasets are downloaded and extracted (`{dataset_dir}/{name}/...`).
    #[serde(default = "default_dataset_dir")]
    pub dataset_dir: PathBuf,
    /// Where run files are written (`{results_dir}/{name}.json`).
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset_dir: default_dataset_dir(),
            results_dir: default_results_dir(),
        }
    }
}

/// Dataset archive source
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Evaluation defaults
#[derive(Debug, Clone, Deserialize)]
pub struct EvalConfig {
    #[serde(default = "default_k_values")]
    pub k_values: Vec<usize>,
    #[serde(default = "default_split")]
    pub split: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            k_values: default_k_values(),
            split: default_split(),
        }
    }
}

/// Elasticsearch connection and indexing settings for the BM25 baseline
#[derive(Debug, Clone, Deserialize)]
pub struct ElasticsearchConfig {
    #[serde(default = "default_es_hostname")]
    pub hostname: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_title_key")]
    pub title_key: String,
    #[serde(default = "default_text_key")]
    pub text_key: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_number_of_shards")]
    pub number_of_shards: usize,
    #[serde(default = "default_sleep_for_secs")]
    pub sleep_for_secs: u64,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            hostname: default_es_hostname(),
            language: default_language(),
            title_key: default_title_key(),
            text_key: default_text_key(),
            batch_size: default_batch_size(),
            number_of_shards: default_number_of_shards(),
            sleep_for_secs: default_sleep_for_secs(),
        }
    }
}

fn default_dataset_dir() -> PathBuf {
    PathBuf::from("dataset")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_base_url() -> String {
    "https://public.ukp.informatik.tu-darmstadt.de/thakur/BEIR/datasets".to_string()
}

fn default_k_values() -> Vec<usize> {
    vec![10, 100]
}

fn default_split() -> String {
    "test".to_string()
}

fn default_es_hostname() -> String {
    "http://localhost:9200".to_string()
}

fn default_language() -> String {
    "english".to_string()
}

fn default_title_key() -> String {
    "title".to_string()
}

fn default_text_key() -> String {
    "txt".to_string()
}

fn default_batch_size() -> usize {
    128
}

fn default_number_of_shards() -> usize {
    1
}

fn default_sleep_for_secs() -> u64 {
    2
}

impl Config {
    /// Load configuration
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in BEIRBENCH_CONFIG environment variable (must exist)
    /// 2. ./config.toml in current directory, if present
    /// 3. Built-in defaults
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config = match std::env::var("BEIRBENCH_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let path = PathBuf::from("config.toml");
                if path.is_file() {
                    Self::from_file(&path)?
                } else {
                    log::debug!("No config.toml found, using built-in defaults");
                    Config::default()
                }
            }
        };

        config.validate()?;

        Ok(config)
    }

    /// Read and parse a TOML config file without validating it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.eval.k_values.is_empty() {
            anyhow::bail!("eval.k_values must not be empty");
        }

        if self.eval.k_values.contains(&0) {
            anyhow::bail!("eval.k_values must be positive integers");
        }

        if self.eval.split.trim().is_empty() {
            anyhow::bail!("eval.split must not be empty");
        }

        url::Url::parse(&self.download.base_url)
            .with_context(|| format!("download.base_url is not a valid URL: {}", self.download.base_url))?;

        url::Url::parse(&self.elasticsearch.hostname).with_context(|| {
            format!(
                "elasticsearch.hostname is not a valid URL: {}",
                self.elasticsearch.hostname
            )
        })?;

        if !SUPPORTED_LANGUAGES.contains(&self.elasticsearch.language.as_str()) {
            anyhow::bail!(
                "elasticsearch.language '{}' is not a built-in Elasticsearch analyzer",
                self.elasticsearch.language
            );
        }

        if self.elasticsearch.batch_size == 0 {
            anyhow::bail!("elasticsearch.batch_size must be greater than 0");
        }

        if self.elasticsearch.number_of_shards == 0 {
            anyhow::bail!("elasticsearch.number_of_shards must be greater than 0");
        }

        Ok(())
    }

    /// Directory holding `{dataset_dir}/{name}`
    pub fn dataset_dir(&self) -> &Path {
        &self.paths.dataset_dir
    }

    /// Path of the run file for a dataset: `{results_dir}/{name}.json`
    pub fn results_path(&self, dataset: &str) -> PathBuf {
        self.paths.results_dir.join(format!("{}.json", dataset))
    }

    /// Path of the judgments file for a dataset split: `{dataset_dir}/{name}/qrels/{split}.tsv`
    pub fn qrels_path(&self, dataset: &str, split: &str) -> PathBuf {
        self.paths
            .dataset_dir
            .join(dataset)
            .join("qrels")
            .join(format!("{}.tsv", split))
    }
}
