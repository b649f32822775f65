//! Dataset fetcher: download `{base_url}/{name}.zip` and extract it next to the archive.

use crate::error::{BenchError, Result};
use crate::progress::bytes_bar;
use reqwest::Client;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

/// Build the archive URL for a dataset: `{base_url}/{dataset_name}.zip`.
///
/// Dataset names are used as file names, so empty names and names containing
/// path separators or `..` are rejected.
pub fn dataset_url(base_url: &str, dataset_name: &str) -> Result<Url> {
    if dataset_name.trim().is_empty()
        || dataset_name.contains(['/', '\\'])
        || dataset_name.contains("..")
    {
        return Err(BenchError::InvalidInput(format!(
            "invalid dataset name: {:?}",
            dataset_name
        )));
    }

    let url = format!("{}/{}.zip", base_url.trim_end_matches('/'), dataset_name);
    Url::parse(&url).map_err(|e| BenchError::InvalidInput(format!("invalid dataset URL {}: {}", url, e)))
}

/// Downloads benchmark archives from a fixed base URL.
pub struct DatasetFetcher {
    client: Client,
    base_url: String,
}

impl DatasetFetcher {
    /// Create a fetcher. No request timeout is set: large archives take as long as they take.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Download and extract `dataset_name` into `out_dir`; returns `{out_dir}/{dataset_name}`.
    pub async fn fetch(&self, dataset_name: &str, out_dir: &Path) -> Result<PathBuf> {
        let url = dataset_url(&self.base_url, dataset_name)?;
        download_and_unzip(&self.client, &url, out_dir).await
    }
}

/// Download a zip archive into `out_dir` (skipped when the file is already there),
/// extract it in place, and return the path named after the archive without `.zip`.
pub async fn download_and_unzip(client: &Client, url: &Url, out_dir: &Path) -> Result<PathBuf> {
    let file_name = url
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| BenchError::InvalidInput(format!("URL has no file name: {}", url)))?
        .to_string();

    tokio::fs::create_dir_all(out_dir).await?;
    let zip_path = out_dir.join(&file_name);

    if zip_path.is_file() {
        log::info!("{} already exists, skipping download", zip_path.display());
    } else {
        log::info!("Downloading {} to {}", url, zip_path.display());
        let bytes = download_url(client, url, &zip_path).await?;
        log::info!("Downloaded {} bytes", bytes);
    }

    let archive = zip_path.clone();
    let dest = out_dir.to_path_buf();
    let extracted = tokio::task::spawn_blocking(move || unzip(&archive, &dest))
        .await
        .map_err(|e| BenchError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
    log::info!("Extracted {} files into {}", extracted, out_dir.display());

    let stem = file_name.strip_suffix(".zip").unwrap_or(&file_name);
    Ok(out_dir.join(stem))
}

/// Stream `url` into `dest`, returning the number of bytes written.
pub async fn download_url(client: &Client, url: &Url, dest: &Path) -> Result<u64> {
    let mut response = client.get(url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(BenchError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let pb = bytes_bar(response.content_length(), format!("Downloading {}", url));
    let mut file = tokio::fs::File::create(dest).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    pb.finish_and_clear();

    Ok(written)
}

/// Extract every entry of `zip_path` under `out_dir`. Entries that would land
/// outside `out_dir` are skipped. Returns the number of files written.
pub fn unzip(zip_path: &Path, out_dir: &Path) -> Result<usize> {
    let mut archive = zip::ZipArchive::new(BufReader::new(File::open(zip_path)?))?;
    let mut extracted = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let relative = match entry.enclosed_name() {
            Some(path) => path,
            None => {
                log::warn!("Skipping archive entry outside target directory: {}", entry.name());
                continue;
            }
        };
        let target = out_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
        extracted += 1;
    }

    Ok(extracted)
}
