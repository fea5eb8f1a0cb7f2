use core::fmt;
use std::sync::Arc;

use portable_atomic::{AtomicU64, Ordering};

use crate::{
    bytes::ByteSeq,
    mutex::{Mutex, lock_unpoisoned},
};

/// Receives keyspace notifications.
pub trait NotificationListener: Send + Sync {
    /// A key matching the subscription changed.
    fn on_key_changed(&self, key: &ByteSeq);

    /// The subscription became active, initially or after a reconnect.
    /// Changes made while unsubscribed were not observed.
    fn on_subscribed(&self);
}

/// Handle for removing a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A pub/sub channel delivering key-change events.
///
/// A remote-store client implements this over its subscription connection;
/// [`LocalNotifier`] is the in-process implementation.
pub trait NotificationSource: Send + Sync {
    /// Registers `listener` for keys matching `pattern`. A pattern ending in
    /// `*` matches by prefix; any other pattern matches one key exactly.
    fn subscribe(&self, pattern: ByteSeq, listener: Arc<dyn NotificationListener>)
    -> SubscriptionId;

    /// Returns `false` if `id` was not subscribed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

struct Subscription {
    id: SubscriptionId,
    pattern: ByteSeq,
    listener: Arc<dyn NotificationListener>,
}

/// In-process [`NotificationSource`].
///
/// Listeners run on the publishing thread, outside any internal lock, and
/// `on_subscribed` fires as soon as `subscribe` registers a listener.
#[derive(Default)]
pub struct LocalNotifier {
    next_id: AtomicU64,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl fmt::Debug for LocalNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalNotifier")
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

impl LocalNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscription_count(&self) -> usize {
        lock_unpoisoned(&self.subscriptions).len()
    }

    /// Delivers a change of `key` to matching listeners. Returns how many
    /// were notified.
    pub fn publish_key_changed(&self, key: &ByteSeq) -> usize {
        let listeners = self.listeners(|pattern| matches(pattern, key));
        for listener in &listeners {
            listener.on_key_changed(key);
        }
        listeners.len()
    }

    /// Tells every listener its subscription was re-established.
    pub fn publish_resubscribed(&self) -> usize {
        let listeners = self.listeners(|_| true);
        for listener in &listeners {
            listener.on_subscribed();
        }
        listeners.len()
    }

    fn listeners(&self, filter: impl Fn(&ByteSeq) -> bool) -> Vec<Arc<dyn NotificationListener>> {
        lock_unpoisoned(&self.subscriptions)
            .iter()
            .filter(|sub| filter(&sub.pattern))
            .map(|sub| Arc::clone(&sub.listener))
            .collect()
    }
}

impl NotificationSource for LocalNotifier {
    fn subscribe(
        &self,
        pattern: ByteSeq,
        listener: Arc<dyn NotificationListener>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock_unpoisoned(&self.subscriptions).push(Subscription {
            id,
            pattern,
            listener: Arc::clone(&listener),
        });
        listener.on_subscribed();
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = lock_unpoisoned(&self.subscriptions);
        let before = subscriptions.len();
        subscriptions.retain(|sub| sub.id != id);
        subscriptions.len() != before
    }
}

fn matches(pattern: &ByteSeq, key: &ByteSeq) -> bool {
    let len = pattern.len();
    if len > 0 && pattern.get(len - 1) == Ok(b'*') {
        let prefix = len - 1;
        prefix <= key.len()
            && key
                .sub_seq(0, prefix)
                .is_ok_and(|head| pattern.sub_seq(0, prefix).is_ok_and(|p| p == head))
    } else {
        pattern == key
    }
}
