use anyhow::{Context, Result};
use beirbench::dataset::DatasetFetcher;
use beirbench::Config;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "download")]
#[command(about = "Download and unzip a BEIR dataset archive")]
struct Args {
    /// Dataset name, e.g. scifact or nfcorpus
    dataset_name: String,

    /// Target directory (default: paths.dataset_dir from config, i.e. dataset/)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();
    let config = Config::load()?;

    let out_dir = args
        .out_dir
        .unwrap_or_else(|| config.dataset_dir().to_path_buf());
    let fetcher = DatasetFetcher::new(config.download.base_url.clone())?;

    let path = fetcher
        .fetch(&args.dataset_name, &out_dir)
        .await
        .with_context(|| format!("Failed to fetch dataset {}", args.dataset_name))?;

    log::info!("Dataset {} ready", args.dataset_name);
    println!("{}", path.display());

    Ok(())
}
