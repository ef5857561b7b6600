//! Static partitioning.
//!
//! Each chunk is cut into `worker_count` equal contiguous subsets and worker
//! `i` always receives subset `i`. There is no shared cursor, so workers never
//! contend while processing, and nothing rebalances: a subset full of heavy
//! tasks keeps its worker busy while the others sit idle.

use crate::barrier::DoneBarrier;
use crate::dataset::Chunk;
use crate::runner::Dispatch;
use crate::worker::{Controller, Tally, WorkerPool};
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

/// One worker's contiguous share of a chunk.
#[derive(Debug, Clone)]
pub struct Subset {
    chunk: Chunk,
    range: Range<usize>,
}

impl Subset {
    pub fn new(chunk: Chunk, range: Range<usize>) -> Self {
        debug_assert!(range.end <= chunk.len());
        Subset { chunk, range }
    }
}

/// Master control for the preassigned strategy: only the completion barrier
/// is shared.
#[derive(Debug)]
pub struct PreassignedControl {
    barrier: DoneBarrier,
}

impl PreassignedControl {
    pub fn new(worker_count: usize) -> Self {
        PreassignedControl {
            barrier: DoneBarrier::new(worker_count),
        }
    }
}

impl Controller for PreassignedControl {
    type Job = Subset;

    fn execute(&self, job: Subset, tally: &mut Tally) {
        for task in &job.chunk[job.range] {
            tally.record(task);
        }
    }

    fn barrier(&self) -> &DoneBarrier {
        &self.barrier
    }
}

/// Range of subset `index` when a chunk of `chunk_len` tasks is split across
/// `worker_count` workers.
pub fn subset_range(chunk_len: usize, worker_count: usize, index: usize) -> Range<usize> {
    let subset_size = chunk_len / worker_count;
    index * subset_size..(index + 1) * subset_size
}

impl Dispatch for PreassignedControl {
    fn dispatch(pool: &WorkerPool<Self>, chunk: &Chunk) {
        let worker_count = pool.size();
        debug_assert_eq!(chunk.len() % worker_count, 0);
        debug!(tasks = chunk.len(), workers = worker_count, "dispatching subsets");

        for (index, worker) in pool.workers().iter().enumerate() {
            let range = subset_range(chunk.len(), worker_count, index);
            worker.set_job(Subset::new(Arc::clone(chunk), range));
        }
    }
}
