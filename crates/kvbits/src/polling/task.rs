use core::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use portable_atomic::{AtomicBool, AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::BoxError,
    polling::{Consumer, StateCell, TaskState, WorkQueue},
};

/// Callback invoked with every consumer failure.
pub type FailureHook = Box<dyn Fn(&BoxError) + Send + Sync>;

/// Turns "something changed" signals into non-overlapping drains of a
/// [`WorkQueue`].
///
/// A ready signal moves the task from `Waiting` to `Ready` and tells the
/// caller to submit [`PollingTask::run`] to an executor. Signals that arrive
/// while a drain is pending or running are coalesced: a signal during a drain
/// makes that drain poll once more before it returns, so an item enqueued
/// just as the drain finished is not stranded.
///
/// The task never blocks and holds no lock while consuming.
///
/// # Example
///
/// ```
/// use kvbits::{BoxError, polling::{MemoryQueue, PollingTask}};
///
/// let queue: MemoryQueue<u32> = [1, 2, 3].into_iter().collect();
/// let task = PollingTask::new(queue, |n: u32| -> Result<(), BoxError> {
///     println!("got {n}");
///     Ok(())
/// });
///
/// assert!(task.signal_ready());
/// assert_eq!(task.run(), 3);
/// assert_eq!(task.state().as_str(), "waiting");
/// ```
pub struct PollingTask<Q, C> {
    state: StateCell,
    rearmed: AtomicBool,
    failures: AtomicU64,
    queue: Q,
    consumer: C,
    on_failure: Option<FailureHook>,
}

impl<Q, C> fmt::Debug for PollingTask<Q, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingTask")
            .field("state", &self.state())
            .field("failures", &self.failures())
            .finish_non_exhaustive()
    }
}

impl<Q, C> PollingTask<Q, C> {
    pub fn new(queue: Q, consumer: C) -> Self {
        Self {
            state: StateCell::new(TaskState::Waiting),
            rearmed: AtomicBool::new(false),
            failures: AtomicU64::new(0),
            queue,
            consumer,
            on_failure: None,
        }
    }

    /// Installs a callback that sees every consumer error and panic.
    #[must_use]
    pub fn with_failure_hook(mut self, hook: impl Fn(&BoxError) + Send + Sync + 'static) -> Self {
        self.on_failure = Some(Box::new(hook));
        self
    }

    /// Requests a drain.
    ///
    /// Returns `true` when the caller must submit [`PollingTask::run`] to an
    /// executor. Returns `false` when a drain is already pending or running;
    /// a running drain will poll the queue again before finishing.
    pub fn signal_ready(&self) -> bool {
        match self.state.transition(TaskState::Waiting, TaskState::Ready) {
            Ok(()) => true,
            Err(TaskState::Running) => {
                self.rearmed.store(true, Ordering::Release);
                // The drain may have finished before it could see the flag.
                self.state
                    .transition(TaskState::Waiting, TaskState::Ready)
                    .is_ok()
            }
            Err(_) => false,
        }
    }

    /// Forces the task back to `Waiting`. An in-flight drain keeps running.
    pub fn signal_waiting(&self) {
        self.state.store(TaskState::Waiting);
    }

    pub fn state(&self) -> TaskState {
        self.state.load()
    }

    /// Consumer errors and panics seen so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }
}

impl<Q, C> PollingTask<Q, C>
where
    Q: WorkQueue,
    C: Consumer<Q::Item>,
{
    /// Drains the queue if a drain was requested.
    ///
    /// Returns immediately with `0` unless the task is `Ready`. Otherwise
    /// polls until the queue reports `None`, handing each item to the
    /// consumer, and returns the number of items taken. A consumer error or
    /// panic affects only its own item.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self), ret))]
    pub fn run(&self) -> usize {
        if self
            .state
            .transition(TaskState::Ready, TaskState::Running)
            .is_err()
        {
            return 0;
        }

        let mut finish = Finish {
            task: self,
            done: false,
        };
        let mut drained = 0;
        loop {
            self.rearmed.store(false, Ordering::Release);
            while let Some(item) = self.queue.poll() {
                drained += 1;
                self.consume(item);
            }
            if !finish.rearm() {
                break;
            }
        }
        drained
    }

    fn consume(&self, item: Q::Item) {
        let failure = match catch_unwind(AssertUnwindSafe(|| self.consumer.accept(item))) {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err,
            Err(panic) => panic_error(&*panic),
        };
        self.failures.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %failure, "consumer failed; continuing drain");
        if let Some(hook) = &self.on_failure {
            hook(&failure);
        }
    }
}

/// Leaves `Running` when the drain ends, including by unwinding out of
/// `WorkQueue::poll`.
struct Finish<'a, Q, C> {
    task: &'a PollingTask<Q, C>,
    done: bool,
}

impl<Q, C> Finish<'_, Q, C> {
    /// Called with the queue empty. Returns `true` if a signal arrived during
    /// the drain and the drain reclaimed the task to poll again.
    fn rearm(&mut self) -> bool {
        let state = &self.task.state;
        // Fails if forced to `Waiting` meanwhile.
        let again = state.transition(TaskState::Running, TaskState::Waiting).is_ok()
            && self.task.rearmed.swap(false, Ordering::AcqRel)
            && state
                .transition(TaskState::Waiting, TaskState::Running)
                .is_ok();
        self.done = !again;
        again
    }
}

impl<Q, C> Drop for Finish<'_, Q, C> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let _ = self
            .task
            .state
            .transition(TaskState::Running, TaskState::Waiting);
    }
}

fn panic_error(payload: &(dyn std::any::Any + Send)) -> BoxError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
    format!("consumer panicked: {message}").into()
}
