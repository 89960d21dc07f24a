//! Bounded lock acquisition
//!
//! A tenant lock is never waited on indefinitely. Poisoned locks are
//! recovered: every store mutation is durable before its in-memory update,
//! so a panic mid-operation cannot leave the table ahead of storage.

use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use crate::storage::{StorageError, StorageResult};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

pub(crate) fn acquire<'a, T: ?Sized>(
    mutex: &'a Mutex<T>,
    resource: &str,
    timeout: Duration,
) -> StorageResult<MutexGuard<'a, T>> {
    let started = Instant::now();
    loop {
        match mutex.try_lock() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                if started.elapsed() >= timeout {
                    return Err(StorageError::lock_timeout(
                        resource,
                        timeout.as_millis() as u64,
                    ));
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageErrorCode;

    #[test]
    fn test_free_lock_is_acquired() {
        let mutex = Mutex::new(5);
        let guard = acquire(&mutex, "counter", Duration::from_millis(10)).unwrap();
        assert_eq!(*guard, 5);
    }

    #[test]
    fn test_held_lock_times_out() {
        let mutex = Mutex::new(5);
        let _held = mutex.lock().unwrap();
        let err = acquire(&mutex, "counter", Duration::from_millis(20)).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::LockTimeout);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let mutex = std::sync::Arc::new(Mutex::new(5));
        let clone = std::sync::Arc::clone(&mutex);
        let _ = thread::spawn(move || {
            let _guard = clone.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(mutex.is_poisoned());
        assert_eq!(*acquire(&mutex, "counter", Duration::from_millis(10)).unwrap(), 5);
    }
}
