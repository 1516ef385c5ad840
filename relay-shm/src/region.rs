//! Named region with lock/wait/notify semantics
//!
//! [`Region`] is the contract the pipeline is written against: scoped
//! exclusive access to a fixed-size byte buffer plus a monotonic
//! timestamp tag, a producer-signal wait, and a wake-all notification.
//! [`SharedRegion`] is the process-local reference implementation
//! (mutex + condition variable over an owned allocation); an OS-backed
//! mapping can be substituted behind the same trait.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

use crate::cancel::CancelToken;

/// How often a blocked wait rechecks the cancellation token. Bounds
/// shutdown latency when no producer ever signals again.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of waiting for the next producer notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    NewFrame,
    Cancelled,
}

/// Exclusive view of a region's bytes and timestamp tag, valid for the
/// duration of one `with_lock` scope.
pub struct RegionData<'a> {
    bytes: &'a mut [u8],
    timestamp: &'a mut Option<i64>,
}

impl RegionData<'_> {
    pub fn bytes(&self) -> &[u8] {
        self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.bytes
    }

    /// Timestamp of the last stamped frame, microseconds since the Unix
    /// epoch; `None` until first stamped.
    pub fn timestamp(&self) -> Option<i64> {
        *self.timestamp
    }

    pub fn set_timestamp(&mut self, micros: i64) {
        *self.timestamp = Some(micros);
    }
}

/// The region contract: a named byte block for inter-process frame
/// exchange with per-region mutual exclusion and producer signaling.
pub trait Region: Send + Sync {
    fn name(&self) -> &str;

    /// Byte size fixed at creation.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` under the region's exclusive lock.
    fn with_lock<T>(&self, f: impl FnOnce(&mut RegionData<'_>) -> T) -> T
    where
        Self: Sized;

    /// Block until the producer signals new data or the token is
    /// cancelled, whichever comes first.
    fn wait(&self, cancel: &CancelToken) -> WaitOutcome;

    /// Wake all waiters; called after new data has been published.
    fn notify_all(&self);
}

struct RegionState {
    bytes: Vec<u8>,
    timestamp: Option<i64>,
}

struct Inner {
    name: String,
    state: Mutex<RegionState>,
    // Notification generation, guarded separately so waiters do not
    // contend with the data lock.
    generation: Mutex<u64>,
    available: Condvar,
}

/// Process-local reference implementation of [`Region`]. Cloning yields
/// another handle to the same block.
#[derive(Clone)]
pub struct SharedRegion {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SharedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegion")
            .field("name", &self.inner.name)
            .field("len", &self.len())
            .finish()
    }
}

// Handles compare by identity: equal iff they refer to the same block.
impl PartialEq for SharedRegion {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for SharedRegion {}

impl SharedRegion {
    pub(crate) fn new(name: &str, len: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.to_string(),
                state: Mutex::new(RegionState {
                    bytes: vec![0u8; len],
                    timestamp: None,
                }),
                generation: Mutex::new(0),
                available: Condvar::new(),
            }),
        }
    }
}

impl Region for SharedRegion {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn len(&self) -> usize {
        self.inner.state.lock().bytes.len()
    }

    fn with_lock<T>(&self, f: impl FnOnce(&mut RegionData<'_>) -> T) -> T {
        let mut state = self.inner.state.lock();
        let RegionState { bytes, timestamp } = &mut *state;
        let mut data = RegionData { bytes, timestamp };
        f(&mut data)
    }

    fn wait(&self, cancel: &CancelToken) -> WaitOutcome {
        let mut generation = self.inner.generation.lock();
        let seen = *generation;
        while *generation == seen {
            if cancel.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
            self.inner
                .available
                .wait_for(&mut generation, WAIT_POLL_INTERVAL);
        }
        WaitOutcome::NewFrame
    }

    fn notify_all(&self) {
        {
            let mut generation = self.inner.generation.lock();
            *generation = generation.wrapping_add(1);
        }
        self.inner.available.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_lock_scopes_bytes_and_timestamp() {
        let region = SharedRegion::new("test.region", 16);
        assert_eq!(region.len(), 16);
        assert_eq!(region.name(), "test.region");

        region.with_lock(|data| {
            assert_eq!(data.timestamp(), None);
            data.bytes_mut().fill(0xAB);
            data.set_timestamp(1_000_000);
        });

        region.with_lock(|data| {
            assert!(data.bytes().iter().all(|&b| b == 0xAB));
            assert_eq!(data.timestamp(), Some(1_000_000));
        });
    }

    #[test]
    fn test_wait_wakes_on_notify() {
        let region = SharedRegion::new("test.notify", 4);
        let waiter = region.clone();

        let handle = thread::spawn(move || waiter.wait(&CancelToken::new()));
        // give the waiter time to block, then publish
        thread::sleep(Duration::from_millis(20));
        region.notify_all();
        assert_eq!(handle.join().unwrap(), WaitOutcome::NewFrame);
    }

    #[test]
    fn test_wait_interrupted_by_cancel() {
        let region = SharedRegion::new("test.cancel", 4);
        let cancel = CancelToken::new();
        let waiter_cancel = cancel.clone();

        let handle = thread::spawn(move || region.wait(&waiter_cancel));
        thread::sleep(Duration::from_millis(20));
        cancel.cancel();
        assert_eq!(handle.join().unwrap(), WaitOutcome::Cancelled);
    }

    #[test]
    fn test_notify_before_wait_is_not_lost_forever() {
        // a wait that starts after a notification must still return once
        // the next notification arrives
        let region = SharedRegion::new("test.late", 4);
        region.notify_all();

        let waiter = region.clone();
        let handle = thread::spawn(move || waiter.wait(&CancelToken::new()));
        thread::sleep(Duration::from_millis(20));
        region.notify_all();
        assert_eq!(handle.join().unwrap(), WaitOutcome::NewFrame);
    }
}
