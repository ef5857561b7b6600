//! Dataset generation.
//!
//! A dataset is an ordered list of equally sized chunks. Chunks are shared
//! read-only with the worker threads, so each one is an `Arc<[Task]>`.

use crate::config::BenchConfig;
use crate::error::{BenchError, ConfigError};
use crate::task::{Task, Workload};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::sync::Arc;

/// One fixed-size batch of tasks.
pub type Chunk = Arc<[Task]>;

/// How heavy tasks are spread through each chunk.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Each task is heavy with independent probability.
    Random,
    /// A deterministic accumulator makes every chunk hit the target fraction exactly.
    Even,
    /// Even, then each chunk is partitioned so all heavy tasks sit at its tail.
    #[default]
    Stacked,
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Distribution::Random => "random",
            Distribution::Even => "even",
            Distribution::Stacked => "stacked",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    chunks: Vec<Chunk>,
    chunk_size: usize,
}

impl Dataset {
    /// Generates `chunk_count` chunks of `chunk_size` tasks using the configured
    /// distribution and seed.
    ///
    /// The configuration is validated first, so an out-of-range probability
    /// is reported as an error instead of reaching the RNG.
    pub fn generate(config: &BenchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let chunks = (0..config.chunk_count)
            .map(|_| {
                let mut tasks = match config.distribution {
                    Distribution::Random => {
                        random_chunk(&mut rng, config.chunk_size, config.probability_heavy)
                    }
                    Distribution::Even | Distribution::Stacked => {
                        even_chunk(&mut rng, config.chunk_size, config.probability_heavy)
                    }
                };
                if config.distribution == Distribution::Stacked {
                    // Stable sort on the flag: light first, heavy at the tail.
                    tasks.sort_by_key(|task| task.is_heavy);
                }
                Chunk::from(tasks)
            })
            .collect();

        Ok(Dataset {
            chunks,
            chunk_size: config.chunk_size,
        })
    }

    /// Builds a dataset from explicit chunks, which must all have the same length.
    pub fn from_chunks(chunks: Vec<Vec<Task>>) -> Result<Self, BenchError> {
        let chunk_size = chunks.first().map_or(0, Vec::len);
        if let Some(bad) = chunks.iter().find(|chunk| chunk.len() != chunk_size) {
            return Err(BenchError::ChunkSizeMismatch {
                expected: chunk_size,
                actual: bad.len(),
            });
        }
        Ok(Dataset {
            chunks: chunks.into_iter().map(Chunk::from).collect(),
            chunk_size,
        })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn heavy_count(&self) -> usize {
        self.tasks().filter(|task| task.is_heavy).count()
    }

    /// Sum of every task's result computed on the calling thread. Wraps like
    /// the workers' accumulators, so it is comparable to any pool's total.
    pub fn serial_sum(&self, workload: &Workload) -> u32 {
        self.tasks()
            .fold(0u32, |acc, task| acc.wrapping_add(task.process(workload)))
    }

    fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.chunks.iter().flat_map(|chunk| chunk.iter())
    }
}

fn random_chunk(rng: &mut SmallRng, chunk_size: usize, probability_heavy: f64) -> Vec<Task> {
    (0..chunk_size)
        .map(|_| Task::new(rng.random_range(0.0..TAU), rng.random_bool(probability_heavy)))
        .collect()
}

fn even_chunk(rng: &mut SmallRng, chunk_size: usize, probability_heavy: f64) -> Vec<Task> {
    let mut acc = 0.0;
    (0..chunk_size)
        .map(|_| {
            acc += probability_heavy;
            let is_heavy = acc >= 1.0;
            if is_heavy {
                acc -= 1.0;
            }
            Task::new(rng.random_range(0.0..TAU), is_heavy)
        })
        .collect()
}
