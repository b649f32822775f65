//! Progress bars for long-running downloads and indexing.

use indicatif::{ProgressBar, ProgressStyle};

/// Counted progress bar, e.g. documents indexed.
pub fn count_bar(len: u64, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template("{msg} [{bar:40}] {pos}/{len}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb
}

/// Byte progress bar; a spinner when the total size is unknown.
pub fn bytes_bar(total: Option<u64>, message: String) -> ProgressBar {
    let pb = match total {
        Some(len) => {
            let pb = ProgressBar::new(len);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {bytes}/{total_bytes} ({eta})")
            {
                pb.set_style(style);
            }
            pb
        }
        None => ProgressBar::new_spinner(),
    };
    pb.set_message(message);
    pb
}
