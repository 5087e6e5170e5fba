use std::sync::{Mutex, mpsc};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::WrapError;

/// swc recursion on deeply nested JSX needs more than the default stack.
const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// A result tagged with the worker that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed<R> {
    pub worker: usize,
    pub result: R,
}

/// A fixed set of long-lived workers fed from a bounded queue.
///
/// Workers pull the next task as soon as they finish the previous one, so a
/// single slow file never holds back a batch. At most `size` tasks run at
/// once and at most `size` more wait in the queue.
pub struct WorkerPool {
    pool: ThreadPool,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self, WrapError> {
        let size = size.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(size)
            .stack_size(WORKER_STACK_SIZE)
            .thread_name(|i| format!("twrap-worker-{}", i))
            .build()
            .map_err(|e| {
                WrapError::Configuration(format!("failed to start worker pool: {}", e))
            })?;
        Ok(Self { pool, size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `work` over every task and collect the results in completion
    /// order. `work` receives the worker index in `0..size`.
    ///
    /// Tasks are pulled lazily from `tasks` on the calling thread. `work`
    /// must not panic; a panicking worker stops taking tasks.
    pub fn run<T, R, I, F>(&self, tasks: I, work: F) -> Vec<Completed<R>>
    where
        I: IntoIterator<Item = T>,
        T: Send,
        R: Send,
        F: Fn(usize, T) -> R + Sync,
    {
        let (task_tx, task_rx) = mpsc::sync_channel::<T>(self.size);
        let task_rx = Mutex::new(task_rx);
        let (result_tx, result_rx) = mpsc::channel::<Completed<R>>();
        let work = &work;
        let task_rx = &task_rx;

        self.pool.in_place_scope(|scope| {
            for _ in 0..self.size {
                let result_tx = result_tx.clone();
                scope.spawn(move |_| {
                    let worker = rayon::current_thread_index().unwrap_or(0);
                    loop {
                        let next = match task_rx.lock() {
                            Ok(rx) => rx.recv(),
                            Err(_) => break,
                        };
                        let Ok(task) = next else {
                            break;
                        };
                        let result = work(worker, task);
                        if result_tx.send(Completed { worker, result }).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            for task in tasks {
                if task_tx.send(task).is_err() {
                    break;
                }
            }
            drop(task_tx);
        });

        result_rx.into_iter().collect()
    }
}
