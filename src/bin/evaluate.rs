//! Evaluation CLI: score `results/{dataset}.json` against `dataset/{dataset}/qrels/{split}.tsv`
//! and print NDCG, MAP, Recall and P at each cutoff.

use anyhow::Context;
use beirbench::{eval, Config};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "evaluate")]
#[command(about = "Benchmark a run file against BEIR relevance judgments")]
struct Args {
    /// Name of dataset to benchmark
    #[arg(long, default_value = "scifact")]
    dataset: String,

    /// List of top-k cutoffs (default: eval.k_values from config, i.e. 10 100)
    #[arg(long = "topk_list", num_args = 1..)]
    topk_list: Option<Vec<usize>>,

    /// Qrels split to evaluate against (default: eval.split from config, i.e. test)
    #[arg(long)]
    split: Option<String>,

    /// Print the report as JSON instead of `LABEL: value` lines
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();
    let config = Config::load()?;

    let k_values = args.topk_list.unwrap_or_else(|| config.eval.k_values.clone());
    let split = args.split.unwrap_or_else(|| config.eval.split.clone());
    let result_path = config.results_path(&args.dataset);
    let qrels_path = config.qrels_path(&args.dataset, &split);

    let report = eval::evaluate(&result_path, &qrels_path, &k_values).with_context(|| {
        format!(
            "Failed to evaluate {} against {}",
            result_path.display(),
            qrels_path.display()
        )
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in report.to_lines() {
            println!("{}", line);
        }
    }

    Ok(())
}
