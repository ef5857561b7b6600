//! Completion barrier between the owning thread and its workers.

use crate::error::BenchError;
use crate::sync::Gate;
use std::time::Duration;

#[derive(Debug, Default)]
struct Round {
    done: usize,
    abandoned: usize,
}

/// Counts `signal_done` calls for one dispatch round.
///
/// Workers call [`signal_done`](DoneBarrier::signal_done) once per job. The
/// owning thread calls [`wait_for_all_done`](DoneBarrier::wait_for_all_done)
/// exactly once per round; it returns after `worker_count` signals and resets
/// the count to zero before the next round can be dispatched.
///
/// A worker that panics mid-job calls [`abandon`](DoneBarrier::abandon)
/// instead, which releases the owner with an error rather than leaving it
/// parked forever.
#[derive(Debug)]
pub struct DoneBarrier {
    round: Gate<Round>,
    worker_count: usize,
}

impl DoneBarrier {
    pub fn new(worker_count: usize) -> Self {
        DoneBarrier {
            round: Gate::new(Round::default()),
            worker_count,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Records one worker's completion, waking the owner on the last one.
    pub fn signal_done(&self) {
        let worker_count = self.worker_count;
        self.round.update_and_notify_if(|round| {
            round.done += 1;
            debug_assert!(
                round.done <= worker_count,
                "more completions than workers in one round"
            );
            round.done == worker_count
        });
    }

    /// Records that a worker died without finishing its job.
    pub fn abandon(&self) {
        self.round.update(|round| round.abandoned += 1);
    }

    /// Blocks until every worker has signalled, then resets the count.
    ///
    /// Calling this without a matching dispatch never returns.
    pub fn wait_for_all_done(&self) -> Result<(), BenchError> {
        let worker_count = self.worker_count;
        self.round.wait_until(
            |round| round.done == worker_count || round.abandoned > 0,
            |round| Self::release(round),
        )
    }

    /// Bounded form of [`wait_for_all_done`](Self::wait_for_all_done).
    ///
    /// Returns `Ok(false)`, leaving the count untouched, if the round did not
    /// complete within `timeout`.
    pub fn wait_for_all_done_timeout(&self, timeout: Duration) -> Result<bool, BenchError> {
        let worker_count = self.worker_count;
        self.round
            .wait_until_for(
                |round| round.done == worker_count || round.abandoned > 0,
                timeout,
                |round| Self::release(round),
            )
            .map_or(Ok(false), |released| released.map(|()| true))
    }

    /// Number of completions recorded in the current round.
    pub fn done_count(&self) -> usize {
        self.round.with(|round| round.done)
    }

    fn release(round: &mut Round) -> Result<(), BenchError> {
        if round.abandoned > 0 {
            return Err(BenchError::WorkerPanicked {
                count: round.abandoned,
            });
        }
        round.done = 0;
        Ok(())
    }
}
