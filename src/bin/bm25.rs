use anyhow::{Context, Result};
use beirbench::dataset;
use beirbench::eval::save_results;
use beirbench::search::{BM25Search, ElasticClient, ElasticOptions};
use beirbench::Config;
use clap::{ArgAction, Parser};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "bm25")]
#[command(about = "Run the Elasticsearch BM25 baseline on a BEIR dataset and save the run file")]
struct Args {
    /// Dataset to be used
    #[arg(long, default_value = "scifact")]
    dataset: String,

    /// Number of top results to return per query
    #[arg(long = "top_k", default_value_t = 10)]
    top_k: usize,

    /// Whether to re-index the dataset into Elasticsearch
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    init: bool,

    /// Batch size for indexing and multi-search (default: elasticsearch.batch_size from config)
    #[arg(long = "batch_size")]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();
    if args.top_k == 0 {
        anyhow::bail!("--top_k must be greater than 0");
    }

    let config = Config::load()?;
    let es_config = &config.elasticsearch;

    let folder = config.dataset_dir().join(&args.dataset);
    let data = dataset::load(&folder, "corpus.jsonl", "queries.jsonl", "qrels", &config.eval.split)
        .with_context(|| format!("Failed to load dataset from {}", folder.display()))?;

    let options = ElasticOptions {
        hostname: es_config.hostname.clone(),
        // Elasticsearch index names must be lowercase
        index_name: args.dataset.to_lowercase(),
        language: es_config.language.clone(),
        title_key: es_config.title_key.clone(),
        text_key: es_config.text_key.clone(),
        batch_size: args.batch_size.unwrap_or(es_config.batch_size),
        number_of_shards: es_config.number_of_shards,
    };
    let es = ElasticClient::new(options)?;
    let bm25 = BM25Search::connect(es, args.init, Duration::from_secs(es_config.sleep_for_secs))
        .await
        .context("Failed to prepare Elasticsearch index")?;

    log::info!("Begin search");
    let start = Instant::now();
    let results = bm25.search(&data.corpus, &data.queries, args.top_k).await?;
    log::info!("End search ({:?})", start.elapsed());

    let results_path = config.results_path(&args.dataset);
    save_results(&results, &results_path)
        .with_context(|| format!("Failed to save results to {}", results_path.display()))?;

    Ok(())
}
