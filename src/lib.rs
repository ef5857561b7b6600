//! # chunkbench - Static vs Dynamic Work Distribution Benchmark
//!
//! A micro-benchmark harness that pushes a large synthetic CPU-bound workload
//! through a fixed pool of long-lived worker threads using two strategies,
//! and measures throughput and per-worker idle time.
//!
//! ## Architecture
//!
//! - **Tasks**: a seed value and a heavy/light flag; heavy tasks cost ten
//!   times as many iterations, which is the source of load imbalance.
//! - **Dataset**: an ordered list of equally sized chunks, generated with a
//!   random, even, or stacked heavy-task distribution.
//! - **Workers**: persistent OS threads parked on a condition variable until
//!   the owning thread hands them a job.
//! - **Controllers**: the master side of each strategy. *Preassigned* gives
//!   every worker an equal contiguous subset of the chunk; *Queued* exposes the
//!   whole chunk through a shared cursor that workers pull from one task at a
//!   time. Both finish each chunk on the same completion barrier.
//! - **Timing**: per-chunk active time and heavy-item counts per worker, with
//!   idle time derived from the chunk's wall time.
//!
//! ## Example
//!
//! ```no_run
//! use chunkbench::{BenchConfig, Dataset, Strategy, run_strategy};
//!
//! let config = BenchConfig::default();
//! let dataset = Dataset::generate(&config).unwrap();
//!
//! for strategy in Strategy::ALL {
//!     let report = run_strategy(strategy, &dataset, &config).unwrap();
//!     println!("{}: {:?}, result {}", strategy, report.elapsed, report.result);
//! }
//! ```

pub mod barrier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod preassigned;
pub mod queued;
pub mod report;
pub mod runner;
pub mod sync;
pub mod task;
pub mod timing;
pub mod worker;

use serde::{Deserialize, Serialize};

/// Strategy for pinning worker threads to CPU cores.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PinningStrategy {
    /// No pinning (standard OS scheduling).
    #[default]
    None,
    /// Linear pinning (worker i -> logical processor i, wrapping).
    Linear,
}

pub use barrier::DoneBarrier;
pub use config::BenchConfig;
pub use dataset::{Chunk, Dataset, Distribution};
pub use error::{BenchError, ConfigError};
pub use preassigned::PreassignedControl;
pub use queued::QueuedControl;
pub use report::{RunSummary, write_csv};
pub use runner::{RunReport, Strategy, run_strategy};
pub use task::{Task, Workload};
pub use timing::ChunkTimingInfo;
pub use worker::{Controller, WorkerPool};
