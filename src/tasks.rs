//! Detached task execution
//!
//! Batched retrains and hot-lead notifications run through a [`TaskRunner`]
//! so the code that schedules them does not change between synchronous
//! execution (tests, CLI) and background execution (server).

use std::thread;

use tracing::error;

/// A unit of detached work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait TaskRunner: Send + Sync {
    /// Runs `task`; the caller never waits on its result.
    fn spawn(&self, name: &'static str, task: Task);
}

/// Runs every task to completion on the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineRunner;

impl TaskRunner for InlineRunner {
    fn spawn(&self, _name: &'static str, task: Task) {
        task();
    }
}

/// Runs tasks off the calling thread.
///
/// Inside a tokio runtime tasks go to the blocking pool; elsewhere each
/// task gets its own OS thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct BackgroundRunner;

impl TaskRunner for BackgroundRunner {
    fn spawn(&self, name: &'static str, task: Task) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(task);
            }
            Err(_) => {
                let spawned = thread::Builder::new()
                    .name(format!("leadscore-{}", name))
                    .spawn(task);
                if let Err(e) = spawned {
                    error!(task = name, error = %e, "failed to spawn background task");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_inline_runner_runs_before_returning() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        InlineRunner.spawn("count", Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_background_runner_without_runtime() {
        let (tx, rx) = mpsc::channel();
        BackgroundRunner.spawn("send", Box::new(move || {
            tx.send(7).unwrap();
        }));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
    }

    #[tokio::test]
    async fn test_background_runner_inside_runtime() {
        let (tx, rx) = mpsc::channel();
        BackgroundRunner.spawn("send", Box::new(move || {
            tx.send(9).unwrap();
        }));
        let value = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, 9);
    }
}
