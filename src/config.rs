//! Benchmark configuration.

use crate::PinningStrategy;
use crate::dataset::Distribution;
use crate::error::ConfigError;
use crate::task::{DEFAULT_HEAVY_ITERATIONS, DEFAULT_LIGHT_ITERATIONS, Workload};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_WORKER_COUNT: usize = 4;
pub const DEFAULT_CHUNK_SIZE: usize = 8_000;
pub const DEFAULT_CHUNK_COUNT: usize = 100;
pub const DEFAULT_PROBABILITY_HEAVY: f64 = 0.15;

const _: () = assert!(DEFAULT_CHUNK_SIZE >= DEFAULT_WORKER_COUNT);
const _: () = assert!(DEFAULT_CHUNK_SIZE % DEFAULT_WORKER_COUNT == 0);

/// Every option the benchmark recognizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Number of persistent worker threads.
    pub worker_count: usize,
    /// Tasks per chunk. Must be divisible by `worker_count`.
    pub chunk_size: usize,
    /// Chunks per run.
    pub chunk_count: usize,
    pub light_iterations: usize,
    pub heavy_iterations: usize,
    pub probability_heavy: f64,
    /// Collect per-chunk timings and write the CSV report.
    pub measure_chunks: bool,
    pub distribution: Distribution,
    pub seed: u64,
    pub pinning: PinningStrategy,
    pub csv_path: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_count: DEFAULT_CHUNK_COUNT,
            light_iterations: DEFAULT_LIGHT_ITERATIONS,
            heavy_iterations: DEFAULT_HEAVY_ITERATIONS,
            probability_heavy: DEFAULT_PROBABILITY_HEAVY,
            measure_chunks: false,
            distribution: Distribution::Stacked,
            seed: 0,
            pinning: PinningStrategy::None,
            csv_path: PathBuf::from("timings.csv"),
        }
    }
}

impl BenchConfig {
    /// Loads a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rejects configurations the worker pool cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::EmptyChunk);
        }
        if self.chunk_count == 0 {
            return Err(ConfigError::NoChunks);
        }
        if self.chunk_size < self.worker_count {
            return Err(ConfigError::ChunkSmallerThanPool {
                chunk_size: self.chunk_size,
                worker_count: self.worker_count,
            });
        }
        if self.chunk_size % self.worker_count != 0 {
            return Err(ConfigError::UnevenSubsets {
                chunk_size: self.chunk_size,
                worker_count: self.worker_count,
            });
        }
        if !(0.0..=1.0).contains(&self.probability_heavy) {
            return Err(ConfigError::InvalidProbability(self.probability_heavy));
        }
        Ok(())
    }

    pub fn workload(&self) -> Workload {
        Workload {
            light_iterations: self.light_iterations,
            heavy_iterations: self.heavy_iterations,
        }
    }
}
