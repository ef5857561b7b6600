//! Per-chunk timing records.

use crate::worker::WorkerSlot;
use std::time::Duration;

/// What each worker did during one chunk.
///
/// Captured once, right after the chunk's barrier releases, and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkTimingInfo {
    pub time_spent_working: Vec<Duration>,
    pub heavy_items: Vec<usize>,
    /// Wall time the owning thread spent dispatching and waiting on the barrier.
    pub total_chunk_time: Duration,
}

impl ChunkTimingInfo {
    /// Samples every worker slot. Only valid after the barrier has released.
    pub fn capture<S>(slots: &[S], total_chunk_time: Duration) -> Self
    where
        S: std::ops::Deref<Target = WorkerSlot>,
    {
        ChunkTimingInfo {
            time_spent_working: slots.iter().map(|slot| slot.work_time()).collect(),
            heavy_items: slots.iter().map(|slot| slot.heavy_items()).collect(),
            total_chunk_time,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.time_spent_working.len()
    }

    /// Seconds worker `worker` spent parked or waiting during this chunk.
    ///
    /// Derived as chunk time minus active time, so the two always add up to
    /// the chunk time exactly.
    pub fn idle_seconds(&self, worker: usize) -> f64 {
        self.total_chunk_time.as_secs_f64() - self.time_spent_working[worker].as_secs_f64()
    }

    pub fn total_idle_seconds(&self) -> f64 {
        (0..self.worker_count()).map(|i| self.idle_seconds(i)).sum()
    }

    pub fn total_work_seconds(&self) -> f64 {
        self.time_spent_working.iter().map(Duration::as_secs_f64).sum()
    }

    pub fn total_heavy(&self) -> usize {
        self.heavy_items.iter().sum()
    }
}
