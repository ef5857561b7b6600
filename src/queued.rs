//! Dynamic pull from a shared cursor.
//!
//! The whole chunk is installed behind a mutex-protected cursor and every
//! worker pulls one task at a time until the cursor runs off the end. A
//! worker that draws a heavy task just pulls less often while the others keep
//! draining the chunk, so imbalance corrects itself at single-task
//! granularity, paid for with one lock acquisition per task.

use crate::barrier::DoneBarrier;
use crate::dataset::Chunk;
use crate::runner::Dispatch;
use crate::task::Task;
use crate::worker::{Controller, Tally, WorkerPool};
use crossbeam::utils::CachePadded;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct Cursor {
    chunk: Option<Chunk>,
    idx: usize,
}

/// Master control for the queued strategy.
#[derive(Debug)]
pub struct QueuedControl {
    barrier: DoneBarrier,
    // Hammered by every worker; keep it off the barrier's cache line.
    cursor: CachePadded<Mutex<Cursor>>,
}

/// Tells a worker to start pulling from the current chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartWork;

impl QueuedControl {
    pub fn new(worker_count: usize) -> Self {
        QueuedControl {
            barrier: DoneBarrier::new(worker_count),
            cursor: CachePadded::new(Mutex::new(Cursor::default())),
        }
    }

    /// Installs the next chunk and rewinds the cursor.
    ///
    /// Must only be called while no worker is pulling, i.e. before a round is
    /// dispatched.
    pub fn set_chunk(&self, chunk: Chunk) {
        let mut cursor = self.cursor.lock();
        cursor.chunk = Some(chunk);
        cursor.idx = 0;
    }

    /// Takes the next task, or `None` once the chunk is exhausted.
    ///
    /// The cursor only advances on success, so every index in the chunk is
    /// handed out exactly once and never one past the end.
    pub fn get_task(&self) -> Option<Task> {
        let mut cursor = self.cursor.lock();
        let idx = cursor.idx;
        let task = match &cursor.chunk {
            Some(chunk) if idx < chunk.len() => chunk[idx],
            _ => return None,
        };
        cursor.idx = idx + 1;
        Some(task)
    }

    /// Number of tasks handed out from the current chunk.
    pub fn cursor_position(&self) -> usize {
        self.cursor.lock().idx
    }
}

impl Controller for QueuedControl {
    type Job = StartWork;

    fn execute(&self, _job: StartWork, tally: &mut Tally) {
        while let Some(task) = self.get_task() {
            tally.record(&task);
        }
    }

    fn barrier(&self) -> &DoneBarrier {
        &self.barrier
    }
}

impl Dispatch for QueuedControl {
    fn dispatch(pool: &WorkerPool<Self>, chunk: &Chunk) {
        debug!(tasks = chunk.len(), "dispatching shared chunk");
        pool.controller().set_chunk(Arc::clone(chunk));
        for worker in pool.workers() {
            worker.set_job(StartWork);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(len: usize) -> Chunk {
        (0..len).map(|i| Task::new(i as f64, false)).collect()
    }

    #[test]
    fn test_get_task_before_any_chunk() {
        let control = QueuedControl::new(1);
        assert!(control.get_task().is_none());
        assert_eq!(control.cursor_position(), 0);
    }

    #[test]
    fn test_exhaustion_boundary() {
        let control = QueuedControl::new(1);
        control.set_chunk(chunk(3));

        for expected in 0..3 {
            assert_eq!(control.get_task().map(|t| t.value), Some(expected as f64));
        }
        // The slot at index == len must never be read.
        assert!(control.get_task().is_none());
        assert!(control.get_task().is_none());
        assert_eq!(control.cursor_position(), 3);
    }

    #[test]
    fn test_set_chunk_rewinds_cursor() {
        let control = QueuedControl::new(1);
        control.set_chunk(chunk(2));
        while control.get_task().is_some() {}

        control.set_chunk(chunk(5));
        assert_eq!(control.cursor_position(), 0);
        assert_eq!(control.get_task().map(|t| t.value), Some(0.0));
    }
}
