use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{LossError, Result};

/// Where the parallel kernel runs.
///
/// `run` submits work and returns only once every unit of it has finished,
/// so anything written by the work is safe to read afterwards. A worker
/// panic is reported as `LossError::Execution` rather than unwinding into
/// the caller.
pub struct ExecutionContext {
    pool: Option<ThreadPool>,
}

impl ExecutionContext {
    /// Uses rayon's global pool.
    pub fn global() -> ExecutionContext {
        ExecutionContext { pool: None }
    }

    /// Builds a dedicated pool with `threads` workers.
    pub fn with_threads(threads: usize) -> Result<ExecutionContext> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("mce-worker-{i}"))
            .build()
            .map_err(|e| LossError::Execution(e.to_string()))?;
        Ok(ExecutionContext { pool: Some(pool) })
    }

    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    pub fn run<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        }));
        outcome.map_err(|payload| LossError::Execution(panic_message(payload.as_ref())))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
