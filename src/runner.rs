//! The benchmark loop.
//!
//! A run builds one worker pool, feeds it every chunk of the dataset in order
//! (dispatch, then barrier, then an optional timing sample), and finally kills
//! and joins every worker. Threads are created once per run, never per chunk.

use crate::config::BenchConfig;
use crate::dataset::{Chunk, Dataset};
use crate::error::BenchError;
use crate::preassigned::PreassignedControl;
use crate::queued::QueuedControl;
use crate::timing::ChunkTimingInfo;
use crate::worker::{Controller, WorkerOptions, WorkerPool};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// How a chunk is spread over the pool.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Static equal contiguous subsets, one per worker.
    Preassigned,
    /// Workers pull single tasks from a shared cursor.
    Queued,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Preassigned, Strategy::Queued];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Preassigned => "preassigned",
            Strategy::Queued => "queued",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A controller that knows how to hand one chunk to its pool.
///
/// Dispatch issues exactly one job per worker and always wakes it, so the
/// barrier that follows cannot wait on a worker that was never started.
pub trait Dispatch: Controller + Sized {
    fn dispatch(pool: &WorkerPool<Self>, chunk: &Chunk);
}

impl<C: Dispatch> WorkerPool<C> {
    /// Runs one full round: dispatch `chunk`, then wait for every worker.
    pub fn process_chunk(&self, chunk: &Chunk) -> Result<(), BenchError> {
        C::dispatch(self, chunk);
        self.wait_for_all_done()
    }
}

/// Outcome of running one strategy over a dataset.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub strategy: Strategy,
    pub chunk_count: usize,
    /// Wall time from pool creation until the last chunk's barrier released.
    pub elapsed: Duration,
    /// Sum of every worker's accumulation. Wraps on overflow.
    pub result: u32,
    pub per_worker_results: Vec<u32>,
    /// One record per chunk, in run order. Empty unless measuring.
    pub timings: Vec<ChunkTimingInfo>,
}

/// Runs `strategy` over every chunk of `dataset`.
///
/// The configuration is validated, and the dataset checked against it, before
/// any thread is spawned.
pub fn run_strategy(
    strategy: Strategy,
    dataset: &Dataset,
    config: &BenchConfig,
) -> Result<RunReport, BenchError> {
    config.validate()?;
    if dataset.chunk_size() != config.chunk_size {
        return Err(BenchError::ChunkSizeMismatch {
            expected: config.chunk_size,
            actual: dataset.chunk_size(),
        });
    }

    let report = match strategy {
        Strategy::Preassigned => run_with(
            strategy,
            PreassignedControl::new(config.worker_count),
            dataset,
            config,
        )?,
        Strategy::Queued => run_with(
            strategy,
            QueuedControl::new(config.worker_count),
            dataset,
            config,
        )?,
    };

    info!(
        strategy = %strategy,
        elapsed_ms = report.elapsed.as_secs_f64() * 1000.0,
        result = report.result,
        "run complete"
    );
    Ok(report)
}

fn run_with<C: Dispatch>(
    strategy: Strategy,
    controller: C,
    dataset: &Dataset,
    config: &BenchConfig,
) -> Result<RunReport, BenchError> {
    let options = WorkerOptions {
        workload: config.workload(),
        measure: config.measure_chunks,
        pinning: config.pinning,
    };
    let mut timings = Vec::with_capacity(if config.measure_chunks {
        dataset.chunk_count()
    } else {
        0
    });

    let total_start = Instant::now();
    let pool = WorkerPool::new(controller, options)?;

    for (index, chunk) in dataset.chunks().iter().enumerate() {
        let chunk_start = Instant::now();
        pool.process_chunk(chunk)?;

        if config.measure_chunks {
            let info = ChunkTimingInfo::capture(pool.slots(), chunk_start.elapsed());
            debug!(
                chunk = index,
                chunk_ms = info.total_chunk_time.as_secs_f64() * 1000.0,
                heavy = info.total_heavy(),
                "chunk complete"
            );
            timings.push(info);
        }
    }

    let elapsed = total_start.elapsed();
    let per_worker_results = pool.results();
    pool.shutdown()
        .map_err(|count| BenchError::WorkerPanicked { count })?;

    let result = per_worker_results
        .iter()
        .fold(0u32, |acc, &r| acc.wrapping_add(r));

    Ok(RunReport {
        strategy,
        chunk_count: dataset.chunk_count(),
        elapsed,
        result,
        per_worker_results,
        timings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Distribution;

    fn small_config() -> BenchConfig {
        BenchConfig {
            worker_count: 4,
            chunk_size: 64,
            chunk_count: 4,
            light_iterations: 5,
            heavy_iterations: 50,
            distribution: Distribution::Random,
            measure_chunks: true,
            ..BenchConfig::default()
        }
    }

    #[test]
    fn test_both_strategies_match_serial_sum() {
        let config = small_config();
        let dataset = Dataset::generate(&config).unwrap();
        let expected = dataset.serial_sum(&config.workload());

        for strategy in Strategy::ALL {
            let report = run_strategy(strategy, &dataset, &config).unwrap();
            assert_eq!(report.result, expected, "{} diverged", strategy);
            assert_eq!(report.timings.len(), 4);
            assert_eq!(report.per_worker_results.len(), 4);
        }
    }

    #[test]
    fn test_unmeasured_run_collects_no_timings() {
        let config = BenchConfig {
            measure_chunks: false,
            ..small_config()
        };
        let dataset = Dataset::generate(&config).unwrap();
        let report = run_strategy(Strategy::Queued, &dataset, &config).unwrap();
        assert!(report.timings.is_empty());
    }

    #[test]
    fn test_rejects_dataset_of_wrong_shape() {
        let config = small_config();
        let other = Dataset::generate(&BenchConfig {
            chunk_size: 32,
            ..small_config()
        })
        .unwrap();
        assert!(matches!(
            run_strategy(Strategy::Preassigned, &other, &config),
            Err(BenchError::ChunkSizeMismatch {
                expected: 64,
                actual: 32
            })
        ));
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::Preassigned.to_string(), "preassigned");
        assert_eq!(
            serde_json::to_string(&Strategy::Queued).unwrap(),
            "\"queued\""
        );
    }
}
