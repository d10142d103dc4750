//! Task executor for voxelizer work, built on rayon's thread pool.
//!
//! The executor only tracks how many submitted tasks are still unfinished;
//! task results travel back to the orchestrator over channels the caller
//! owns. Use `rayon::ThreadPoolBuilder` before first use to configure the
//! pool size.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Cooperative cancellation flag shared between the orchestrator and its
/// in-flight tasks. Cancelled tasks bail out at the next check point; an
/// abandoned frame is never published.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::Relaxed);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Relaxed)
  }

  /// Clear the flag for the next run.
  pub fn reset(&self) {
    self.0.store(false, Ordering::Relaxed);
  }
}

/// Fire-and-forget work submission with a bounded completion wait.
pub struct TaskExecutor {
  state: Arc<(Mutex<usize>, Condvar)>,
}

impl TaskExecutor {
  pub fn new() -> Self {
    Self {
      state: Arc::new((Mutex::new(0), Condvar::new())),
    }
  }

  /// Queue one unit of work on rayon's pool (non-blocking).
  pub fn submit<F>(&self, work: F)
  where
    F: FnOnce() + Send + 'static,
  {
    {
      let mut pending = self.state.0.lock().unwrap();
      *pending += 1;
    }
    let state = Arc::clone(&self.state);
    rayon::spawn(move || {
      work();
      let (lock, cvar) = &*state;
      let mut pending = lock.lock().unwrap();
      *pending -= 1;
      if *pending == 0 {
        cvar.notify_all();
      }
    });
  }

  /// Block until every submitted task finished or `timeout` elapsed.
  /// Returns true when nothing remains pending.
  pub fn wait(&self, timeout: Duration) -> bool {
    let (lock, cvar) = &*self.state;
    let pending = lock.lock().unwrap();
    let (pending, _) = cvar
      .wait_timeout_while(pending, timeout, |pending| *pending > 0)
      .unwrap();
    *pending == 0
  }

  /// Number of tasks queued or running.
  pub fn pending_count(&self) -> usize {
    *self.state.0.lock().unwrap()
  }

  /// Worker threads in the underlying pool.
  pub fn num_threads(&self) -> usize {
    rayon::current_num_threads()
  }
}

impl Default for TaskExecutor {
  fn default() -> Self {
    Self::new()
  }
}

// =============================================================================
// Tests
// =============================================================================
