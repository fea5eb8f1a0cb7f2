use core::fmt;
use std::sync::Arc;

use portable_atomic::{AtomicBool, Ordering};

use crate::{
    bytes::ByteSeq,
    mutex::{Mutex, lock_unpoisoned},
    polling::{
        Consumer, Executor, NotificationListener, NotificationSource, PollingTask,
        SubscriptionId, WorkQueue,
    },
};

/// Listener that turns notifications into scheduled drains.
struct Trigger<Q, C> {
    task: Arc<PollingTask<Q, C>>,
    executor: Arc<dyn Executor>,
    active: AtomicBool,
}

impl<Q, C> Trigger<Q, C>
where
    Q: WorkQueue + Send + Sync + 'static,
    C: Consumer<Q::Item> + Send + Sync + 'static,
{
    fn fire(&self) {
        if !self.active.load(Ordering::Acquire) || !self.task.signal_ready() {
            return;
        }
        let task = Arc::clone(&self.task);
        self.executor.execute(Box::new(move || {
            task.run();
        }));
    }
}

impl<Q, C> NotificationListener for Trigger<Q, C>
where
    Q: WorkQueue + Send + Sync + 'static,
    C: Consumer<Q::Item> + Send + Sync + 'static,
{
    fn on_key_changed(&self, _key: &ByteSeq) {
        self.fire();
    }

    fn on_subscribed(&self) {
        self.fire();
    }
}

/// Drains a [`PollingTask`] whenever a watched key changes.
///
/// Every key-change event, and every (re)subscription, signals the task; a
/// successful signal submits one drain to the executor. [`stop`] (or
/// dropping the watcher) unsubscribes and forces the task back to
/// `Waiting`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use kvbits::{
///     BoxError,
///     bytes::ByteSeq,
///     polling::{InlineExecutor, KeyspaceWatcher, LocalNotifier, MemoryQueue, PollingTask},
/// };
///
/// let queue = Arc::new(MemoryQueue::new());
/// let task = Arc::new(PollingTask::new(Arc::clone(&queue), |job: String| -> Result<(), BoxError> {
///     println!("{job}");
///     Ok(())
/// }));
/// let notifier = Arc::new(LocalNotifier::new());
/// let watcher = KeyspaceWatcher::start(
///     Arc::clone(&task),
///     notifier.clone(),
///     Arc::new(InlineExecutor),
///     ByteSeq::from("__keyspace@0__:jobs"),
/// );
///
/// queue.push("send-email".to_owned());
/// notifier.publish_key_changed(&ByteSeq::from("__keyspace@0__:jobs"));
/// assert!(queue.is_empty());
/// watcher.stop();
/// ```
///
/// [`stop`]: KeyspaceWatcher::stop
pub struct KeyspaceWatcher<Q, C>
where
    Q: WorkQueue + Send + Sync + 'static,
    C: Consumer<Q::Item> + Send + Sync + 'static,
{
    trigger: Arc<Trigger<Q, C>>,
    source: Arc<dyn NotificationSource>,
    pattern: ByteSeq,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl<Q, C> fmt::Debug for KeyspaceWatcher<Q, C>
where
    Q: WorkQueue + Send + Sync + 'static,
    C: Consumer<Q::Item> + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyspaceWatcher")
            .field("pattern", &self.pattern)
            .field("task", &self.trigger.task)
            .finish_non_exhaustive()
    }
}

impl<Q, C> KeyspaceWatcher<Q, C>
where
    Q: WorkQueue + Send + Sync + 'static,
    C: Consumer<Q::Item> + Send + Sync + 'static,
{
    /// Subscribes to `pattern` on `source`. The subscription callback itself
    /// counts as a signal, so items already queued are drained.
    pub fn start(
        task: Arc<PollingTask<Q, C>>,
        source: Arc<dyn NotificationSource>,
        executor: Arc<dyn Executor>,
        pattern: ByteSeq,
    ) -> Self {
        let trigger = Arc::new(Trigger {
            task,
            executor,
            active: AtomicBool::new(true),
        });
        let listener: Arc<dyn NotificationListener> = trigger.clone();
        let id = source.subscribe(pattern.clone(), listener);
        #[cfg(feature = "tracing")]
        tracing::debug!(%id, %pattern, "keyspace watcher started");
        Self {
            trigger,
            source,
            pattern,
            subscription: Mutex::new(Some(id)),
        }
    }

    pub fn task(&self) -> &Arc<PollingTask<Q, C>> {
        &self.trigger.task
    }

    pub fn pattern(&self) -> &ByteSeq {
        &self.pattern
    }

    pub fn is_active(&self) -> bool {
        self.trigger.active.load(Ordering::Acquire)
    }

    /// Unsubscribes and forces the task to `Waiting`. A drain already in
    /// progress finishes normally. Idempotent.
    pub fn stop(&self) {
        self.trigger.active.store(false, Ordering::Release);
        let Some(id) = lock_unpoisoned(&self.subscription).take() else {
            return;
        };
        self.source.unsubscribe(id);
        self.trigger.task.signal_waiting();
        #[cfg(feature = "tracing")]
        tracing::debug!(%id, pattern = %self.pattern, "keyspace watcher stopped");
    }
}

impl<Q, C> Drop for KeyspaceWatcher<Q, C>
where
    Q: WorkQueue + Send + Sync + 'static,
    C: Consumer<Q::Item> + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}
