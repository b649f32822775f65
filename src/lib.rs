pub mod config;
pub mod error;
pub mod dataset;
pub mod eval;
pub mod progress;
pub mod search;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{BenchError, Result};
pub use eval::{evaluate, EvalReport};
