use std::sync::Arc;

use portable_atomic::{AtomicU64, Ordering};

/// Supplies the worker id encoded into each id.
///
/// Read once per request, outside the generator lock. Implemented for plain
/// `u64` (a fixed id) and for [`SharedWorkerId`].
pub trait WorkerIdSource {
    fn worker_id(&self) -> u64;
}

impl WorkerIdSource for u64 {
    fn worker_id(&self) -> u64 {
        *self
    }
}

/// A worker id that can be reassigned while generators are running.
///
/// Clones share one value. A lease renewer (for example one backed by an
/// allocator in the remote store) calls [`SharedWorkerId::set`]. The
/// generator then waits for a tick it has not issued from yet, and the next
/// id carries the new worker id with its sequence restarted.
///
/// # Example
///
/// ```
/// use kvbits::snowflake::{SharedWorkerId, WorkerIdSource};
///
/// let lease = SharedWorkerId::new(3);
/// let seen_by_generator = lease.clone();
/// lease.set(9);
/// assert_eq!(seen_by_generator.worker_id(), 9);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SharedWorkerId {
    value: Arc<AtomicU64>,
}

impl SharedWorkerId {
    pub fn new(worker_id: u64) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(worker_id)),
        }
    }

    pub fn set(&self, worker_id: u64) {
        self.value.store(worker_id, Ordering::Release);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }
}

impl WorkerIdSource for SharedWorkerId {
    fn worker_id(&self) -> u64 {
        self.get()
    }
}
