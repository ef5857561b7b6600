//! Persistent worker threads.
//!
//! Each worker owns one OS thread that parks on its mailbox until the owning
//! thread hands it a job or tells it to die. A job runs to completion, the
//! worker publishes its results to its cache-padded slot, then signals the
//! controller's completion barrier. Threads live for the whole run; none are
//! created or destroyed per chunk.

use crate::PinningStrategy;
use crate::barrier::DoneBarrier;
use crate::sync::Gate;
use crate::task::{Task, Workload};
use crossbeam::utils::CachePadded;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The master side of a strategy, shared by the owning thread and every worker.
///
/// The pool holds it behind an `Arc` that each worker clones, so the
/// controller outlives every thread it governs.
pub trait Controller: Send + Sync + 'static {
    /// The unit of work handed to one worker per round.
    type Job: Send + 'static;

    /// Runs `job` on the calling worker thread, folding each task into `tally`.
    fn execute(&self, job: Self::Job, tally: &mut Tally);

    fn barrier(&self) -> &DoneBarrier;
}

/// Running results of one worker.
#[derive(Debug, Clone, Copy)]
pub struct Tally {
    workload: Workload,
    measure: bool,
    /// Sum of every result this worker produced. Wraps on overflow.
    pub accumulation: u32,
    /// Heavy tasks processed in the current job. Only counted when measuring.
    pub heavy_items: usize,
}

impl Tally {
    pub fn new(workload: Workload, measure: bool) -> Self {
        Tally {
            workload,
            measure,
            accumulation: 0,
            heavy_items: 0,
        }
    }

    /// Processes `task` and folds its result in.
    #[inline]
    pub fn record(&mut self, task: &Task) {
        self.accumulation = self.accumulation.wrapping_add(task.process(&self.workload));
        if self.measure {
            self.heavy_items += usize::from(task.is_heavy);
        }
    }
}

/// One worker's published results.
///
/// Written only by its worker thread, read by the owning thread after the
/// barrier has released, so relaxed atomics are enough: the barrier's mutex
/// orders the accesses.
#[derive(Debug, Default)]
pub struct WorkerSlot {
    accumulation: AtomicU32,
    work_nanos: AtomicU64,
    heavy_items: AtomicUsize,
}

impl WorkerSlot {
    fn publish(&self, tally: &Tally, work_time: Option<Duration>) {
        self.accumulation.store(tally.accumulation, Ordering::Relaxed);
        if let Some(work_time) = work_time {
            let nanos = u64::try_from(work_time.as_nanos()).unwrap_or(u64::MAX);
            self.work_nanos.store(nanos, Ordering::Relaxed);
            self.heavy_items.store(tally.heavy_items, Ordering::Relaxed);
        }
    }

    pub fn accumulation(&self) -> u32 {
        self.accumulation.load(Ordering::Relaxed)
    }

    /// Active time of the last job. Zero until a measured job completes.
    pub fn work_time(&self) -> Duration {
        Duration::from_nanos(self.work_nanos.load(Ordering::Relaxed))
    }

    pub fn heavy_items(&self) -> usize {
        self.heavy_items.load(Ordering::Relaxed)
    }
}

/// Result slots for a whole pool, one cache line (or more) per worker so that
/// neighbouring workers never write to the same line.
pub type WorkerSlots = Arc<[CachePadded<WorkerSlot>]>;

#[derive(Debug)]
struct Mailbox<J> {
    job: Option<J>,
    running: bool,
    dying: bool,
}

/// Per-worker options fixed for the lifetime of the pool.
#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    pub workload: Workload,
    /// Time each job and count its heavy tasks.
    pub measure: bool,
    pub pinning: PinningStrategy,
}

/// A worker thread parked on its mailbox.
pub struct Worker<C: Controller> {
    id: usize,
    mailbox: Arc<Gate<Mailbox<C::Job>>>,
    handle: Option<JoinHandle<()>>,
}

impl<C: Controller> Worker<C> {
    /// Spawns the worker thread. It parks immediately.
    pub fn spawn(
        id: usize,
        controller: Arc<C>,
        slots: WorkerSlots,
        options: WorkerOptions,
    ) -> std::io::Result<Self> {
        let mailbox = Arc::new(Gate::new(Mailbox {
            job: None,
            running: false,
            dying: false,
        }));
        let thread_mailbox = Arc::clone(&mailbox);

        let handle = thread::Builder::new()
            .name(format!("chunkbench-worker-{}", id))
            .spawn(move || {
                if options.pinning == PinningStrategy::Linear {
                    pin_to_core(id);
                }
                Self::run_loop(id, &*controller, &thread_mailbox, &slots[id], options);
            })?;

        Ok(Worker {
            id,
            mailbox,
            handle: Some(handle),
        })
    }

    fn run_loop(
        id: usize,
        controller: &C,
        mailbox: &Gate<Mailbox<C::Job>>,
        slot: &WorkerSlot,
        options: WorkerOptions,
    ) {
        debug!(worker = id, "worker parked");
        let _sentinel = Sentinel {
            barrier: controller.barrier(),
        };
        let mut accumulation = 0u32;

        loop {
            let job = mailbox.wait_until(
                |mail| mail.job.is_some() || mail.dying,
                |mail| {
                    if mail.dying {
                        return None;
                    }
                    mail.running = true;
                    mail.job.take()
                },
            );
            let Some(job) = job else {
                break;
            };

            let started = options.measure.then(Instant::now);
            let mut tally = Tally::new(options.workload, options.measure);
            tally.accumulation = accumulation;

            controller.execute(job, &mut tally);

            accumulation = tally.accumulation;
            slot.publish(&tally, started.map(|start| start.elapsed()));
            mailbox.with(|mail| mail.running = false);
            controller.barrier().signal_done();
        }

        debug!(worker = id, "worker exiting");
    }

    /// Hands the worker its next job and wakes it.
    ///
    /// # Panics
    ///
    /// If the worker still holds or is running a previous job. The owning
    /// thread must wait on the barrier between rounds.
    pub fn set_job(&self, job: C::Job) {
        self.mailbox.update(|mail| {
            assert!(
                mail.job.is_none() && !mail.running,
                "worker {} received a job before finishing the previous one",
                self.id
            );
            mail.job = Some(job);
        });
    }

    /// Asks the worker to exit once it is parked.
    pub fn kill(&self) {
        self.mailbox.update(|mail| mail.dying = true);
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Kills the worker and waits for its thread to finish.
    pub fn join(mut self) -> thread::Result<()> {
        self.kill();
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

impl<C: Controller> Drop for Worker<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.kill();
            let _ = handle.join();
        }
    }
}

/// Releases the owning thread if the worker unwinds mid-job.
struct Sentinel<'a> {
    barrier: &'a DoneBarrier,
}

impl Drop for Sentinel<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.barrier.abandon();
        }
    }
}

fn pin_to_core(id: usize) {
    match core_affinity::get_core_ids() {
        Some(core_ids) if !core_ids.is_empty() => {
            let core = core_ids[id % core_ids.len()];
            if !core_affinity::set_for_current(core) {
                warn!(worker = id, core = core.id, "failed to pin worker");
            }
        }
        _ => warn!(worker = id, "core ids unavailable, worker not pinned"),
    }
}

/// A fixed set of workers sharing one controller and one slot array.
pub struct WorkerPool<C: Controller> {
    controller: Arc<C>,
    workers: Vec<Worker<C>>,
    slots: WorkerSlots,
}

impl<C: Controller> WorkerPool<C> {
    /// Spawns one worker per barrier participant.
    pub fn new(controller: C, options: WorkerOptions) -> std::io::Result<Self> {
        let controller = Arc::new(controller);
        let worker_count = controller.barrier().worker_count();
        let slots: WorkerSlots = (0..worker_count)
            .map(|_| CachePadded::new(WorkerSlot::default()))
            .collect();

        let workers = (0..worker_count)
            .map(|id| Worker::spawn(id, Arc::clone(&controller), Arc::clone(&slots), options))
            .collect::<std::io::Result<Vec<_>>>()?;

        debug!(workers = worker_count, "worker pool started");
        Ok(WorkerPool {
            controller,
            workers,
            slots,
        })
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// The handle every worker thread holds a clone of.
    pub fn shared_controller(&self) -> &Arc<C> {
        &self.controller
    }

    pub fn workers(&self) -> &[Worker<C>] {
        &self.workers
    }

    pub fn slots(&self) -> &[CachePadded<WorkerSlot>] {
        &self.slots
    }

    /// Returns the number of worker threads in the pool.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Blocks until every worker has finished the current round.
    pub fn wait_for_all_done(&self) -> Result<(), crate::error::BenchError> {
        self.controller.barrier().wait_for_all_done()
    }

    /// Each worker's running accumulation, in worker order.
    pub fn results(&self) -> Vec<u32> {
        self.slots.iter().map(|slot| slot.accumulation()).collect()
    }

    /// Kills every worker, then joins them all.
    ///
    /// Returns Ok if all workers shut down cleanly, or Err with the number
    /// of workers that panicked.
    pub fn shutdown(self) -> Result<(), usize> {
        for worker in &self.workers {
            worker.kill();
        }

        let mut failed_count = 0;
        for worker in self.workers {
            let worker_id = worker.id();
            if worker.join().is_err() {
                failed_count += 1;
                warn!(worker = worker_id, "worker panicked during execution");
            }
        }

        if failed_count > 0 {
            Err(failed_count)
        } else {
            Ok(())
        }
    }
}
