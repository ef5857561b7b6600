//! Error types for configuration and benchmark runs.
//!
//! The taxonomy is deliberately narrow: a bad configuration is rejected before
//! any worker thread exists, output files can fail to write, and a worker
//! thread that panicked is reported when the pool is joined. Nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// A configuration that cannot drive a run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("chunk size must be at least 1")]
    EmptyChunk,

    #[error("chunk count must be at least 1")]
    NoChunks,

    #[error("chunk size {chunk_size} is smaller than worker count {worker_count}")]
    ChunkSmallerThanPool {
        chunk_size: usize,
        worker_count: usize,
    },

    #[error("chunk size {chunk_size} is not divisible by worker count {worker_count}")]
    UnevenSubsets {
        chunk_size: usize,
        worker_count: usize,
    },

    #[error("probability of a heavy task must lie in [0, 1], got {0}")]
    InvalidProbability(f64),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of a benchmark run or of writing its output.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{count} worker thread(s) panicked")]
    WorkerPanicked { count: usize },

    #[error("dataset has {actual} tasks per chunk, configuration expects {expected}")]
    ChunkSizeMismatch { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize run summary: {0}")]
    Json(#[from] serde_json::Error),
}
