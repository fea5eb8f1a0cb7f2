use std::{collections::VecDeque, sync::Arc};

use crate::mutex::{Mutex, lock_unpoisoned};

/// A source of work items drained by a [`PollingTask`].
///
/// `poll` must not block: it returns the next item or `None` when nothing is
/// available right now. Remote-store queues implement this over their
/// client; [`MemoryQueue`] is the in-process implementation.
///
/// [`PollingTask`]: crate::polling::PollingTask
pub trait WorkQueue {
    type Item;

    fn poll(&self) -> Option<Self::Item>;
}

impl<Q: WorkQueue + ?Sized> WorkQueue for Arc<Q> {
    type Item = Q::Item;

    fn poll(&self) -> Option<Self::Item> {
        (**self).poll()
    }
}

/// A FIFO queue guarded by a mutex.
#[derive(Debug)]
pub struct MemoryQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> Default for MemoryQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, item: T) {
        lock_unpoisoned(&self.items).push_back(item);
    }

    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> FromIterator<T> for MemoryQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().collect()),
        }
    }
}

impl<T> WorkQueue for MemoryQueue<T> {
    type Item = T;

    fn poll(&self) -> Option<T> {
        lock_unpoisoned(&self.items).pop_front()
    }
}
