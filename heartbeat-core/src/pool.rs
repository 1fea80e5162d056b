use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::config::ExecutorConfig;
use crate::stats::ExecutorStats;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    queue_cv: Condvar,
    shutdown: Mutex<bool>,
    /// Counts worker threads that have not yet exited their loop. Decremented
    /// exactly once per worker, right before that worker's `worker_loop`
    /// returns; `await_termination` waits for this to reach zero.
    remaining: Mutex<usize>,
    remaining_cv: Condvar,
}

/// The executor's worker pool: a fixed-size set of OS threads pulling jobs
/// off a shared queue. "Lightweight workers" are realized here as plain OS
/// threads.
///
/// Every job dispatched through [`Self::dispatch`] runs with a **freshly
/// initialized** `WorkerContext` installed by the job closure itself. A
/// promoted task never inherits the forking worker's context.
pub(crate) struct Pool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<std::thread::JoinHandle<()>>>,
    stats: Arc<ExecutorStats>,
}

impl Pool {
    pub(crate) fn new(config: Arc<ExecutorConfig>, stats: Arc<ExecutorStats>) -> Arc<Self> {
        let worker_count = config.worker_count();
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            queue_cv: Condvar::new(),
            shutdown: Mutex::new(false),
            remaining: Mutex::new(worker_count),
            remaining_cv: Condvar::new(),
        });

        let pool = Arc::new(Self {
            shared,
            workers: Mutex::new(Vec::new()),
            stats,
        });

        let mut workers = pool.workers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for index in 0..worker_count {
            workers.push(pool.spawn_worker(index));
        }
        drop(workers);

        pool
    }

    fn spawn_worker(self: &Arc<Self>, index: usize) -> std::thread::JoinHandle<()> {
        let pool = Arc::clone(self);
        self.stats.record_worker_spawned();
        std::thread::Builder::new()
            .name(format!("heartbeat-worker-{index}"))
            .spawn(move || pool.worker_loop())
            .expect("failed to spawn heartbeat worker thread")
    }

    fn worker_loop(self: Arc<Self>) {
        tracing::debug!("heartbeat worker thread starting");
        loop {
            let job = {
                let mut queue = self
                    .shared
                    .queue
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                loop {
                    if let Some(job) = queue.pop_front() {
                        break Some(job);
                    }
                    if *self
                        .shared
                        .shutdown
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                    {
                        break None;
                    }
                    queue = self
                        .shared
                        .queue_cv
                        .wait(queue)
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                }
            };

            let Some(job) = job else {
                break;
            };

            job();
        }

        let mut remaining = self
            .shared
            .remaining
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *remaining -= 1;
        if *remaining == 0 {
            self.shared.remaining_cv.notify_all();
        }
        drop(remaining);
        tracing::debug!("heartbeat worker thread exiting");
    }

    /// Whether [`Self::shutdown`] has been called on this pool.
    pub(crate) fn is_shutdown(&self) -> bool {
        *self
            .shared
            .shutdown
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Queues `job` for execution on whichever worker becomes free first.
    pub(crate) fn dispatch(&self, job: Job) {
        let mut queue = self
            .shared
            .queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        queue.push_back(job);
        drop(queue);
        self.shared.queue_cv.notify_one();
    }

    /// Rejects further dispatch and wakes every parked worker so they can
    /// observe the shutdown flag, drain the remaining queue, and exit.
    pub(crate) fn shutdown(&self) {
        *self
            .shared
            .shutdown
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = true;
        self.shared.queue_cv.notify_all();
    }

    /// Blocks up to `timeout` for every worker thread to exit. Returns
    /// whether the pool quiesced within the deadline.
    pub(crate) fn await_termination(&self, timeout: Duration) -> bool {
        let guard = self
            .shared
            .remaining
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let (guard, _timed_out) = self
            .shared
            .remaining_cv
            .wait_timeout_while(guard, timeout, |remaining| *remaining != 0)
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let quiesced = *guard == 0;
        drop(guard);

        if quiesced {
            let mut workers = self
                .workers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            for worker in workers.drain(..) {
                let _ = worker.join();
            }
        }

        quiesced
    }
}
