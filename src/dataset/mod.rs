//! Benchmark datasets: remote archive fetcher and BEIR folder loader.

pub mod download;
pub mod loader;

pub use download::{dataset_url, download_and_unzip, unzip, DatasetFetcher};
pub use loader::{load, Corpus, Dataset, Document, Queries};
