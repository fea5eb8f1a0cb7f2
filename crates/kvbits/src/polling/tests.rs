use core::time::Duration;
use std::{
    sync::{
        Arc, Mutex, OnceLock, Weak,
        atomic::{AtomicUsize, Ordering},
    },
    thread::scope,
    time::Instant,
};

use crate::{
    bytes::ByteSeq,
    error::BoxError,
    polling::{
        Consumer, InlineExecutor, KeyspaceWatcher, LocalNotifier, MemoryQueue, PollingTask,
        TaskState, ThreadExecutor, WorkQueue,
    },
};

const KEY: &str = "__keyspace@0__:jobs";

#[derive(Clone, Default)]
struct Recorder {
    seen: Arc<Mutex<Vec<u32>>>,
}

impl Recorder {
    fn seen(&self) -> Vec<u32> {
        self.seen.lock().unwrap().clone()
    }
}

impl Consumer<u32> for Recorder {
    fn accept(&self, item: u32) -> Result<(), BoxError> {
        self.seen.lock().unwrap().push(item);
        Ok(())
    }
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    done()
}

#[test]
fn state_names() {
    assert_eq!(TaskState::Waiting.as_str(), "waiting");
    assert_eq!(TaskState::Ready.as_str(), "ready");
    assert_eq!(TaskState::Running.to_string(), "running");
}

#[test]
fn repeated_signals_coalesce_into_one_drain() {
    let recorder = Recorder::default();
    let queue: MemoryQueue<u32> = [7].into_iter().collect();
    let task = PollingTask::new(queue, recorder.clone());

    assert!(task.signal_ready());
    assert!(!task.signal_ready());
    assert_eq!(task.state(), TaskState::Ready);

    assert_eq!(task.run(), 1);
    assert_eq!(task.run(), 0);
    assert_eq!(recorder.seen(), [7]);
}

#[test]
fn drain_consumes_in_order_and_returns_to_waiting() {
    let recorder = Recorder::default();
    let queue: MemoryQueue<u32> = [1, 2, 3].into_iter().collect();
    let task = PollingTask::new(queue, recorder.clone());

    assert!(task.signal_ready());
    assert_eq!(task.run(), 3);
    assert_eq!(recorder.seen(), [1, 2, 3]);
    assert!(task.queue().is_empty());
    assert_eq!(task.state().as_str(), "waiting");
}

#[test]
fn run_without_signal_is_a_no_op() {
    let recorder = Recorder::default();
    let queue: MemoryQueue<u32> = [1].into_iter().collect();
    let task = PollingTask::new(queue, recorder.clone());

    assert_eq!(task.run(), 0);
    assert_eq!(task.queue().len(), 1);

    assert!(task.signal_ready());
    task.signal_waiting();
    assert_eq!(task.run(), 0);
    assert!(recorder.seen().is_empty());
}

#[test]
fn consumer_error_is_isolated() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hooked = Arc::new(Mutex::new(Vec::new()));
    let queue: MemoryQueue<u32> = [1, 2, 3].into_iter().collect();
    let task = PollingTask::new(queue, {
        let seen = Arc::clone(&seen);
        move |n: u32| -> Result<(), BoxError> {
            seen.lock().unwrap().push(n);
            if n == 2 {
                return Err(format!("cannot process {n}").into());
            }
            Ok(())
        }
    })
    .with_failure_hook({
        let hooked = Arc::clone(&hooked);
        move |err| hooked.lock().unwrap().push(err.to_string())
    });

    assert!(task.signal_ready());
    assert_eq!(task.run(), 3);
    assert_eq!(*seen.lock().unwrap(), [1, 2, 3]);
    assert_eq!(task.failures(), 1);
    assert_eq!(*hooked.lock().unwrap(), ["cannot process 2"]);
    assert_eq!(task.state(), TaskState::Waiting);
}

#[test]
fn consumer_panic_is_isolated() {
    let recorder = Recorder::default();
    let queue: MemoryQueue<u32> = [1, 2, 3].into_iter().collect();
    let task = PollingTask::new(queue, {
        let recorder = recorder.clone();
        move |n: u32| -> Result<(), BoxError> {
            assert_ne!(n, 2, "refusing item");
            recorder.accept(n)
        }
    });

    assert!(task.signal_ready());
    assert_eq!(task.run(), 3);
    assert_eq!(recorder.seen(), [1, 3]);
    assert_eq!(task.failures(), 1);
    assert_eq!(task.state(), TaskState::Waiting);
}

/// Enqueues one more item, and signals, right after the drain first sees an
/// empty queue.
struct LateArrival {
    items: MemoryQueue<u32>,
    late: Mutex<Option<u32>>,
    task: OnceLock<Weak<PollingTask<Arc<LateArrival>, Recorder>>>,
    signalled: Mutex<Option<bool>>,
}

impl WorkQueue for LateArrival {
    type Item = u32;

    fn poll(&self) -> Option<u32> {
        if let Some(item) = self.items.poll() {
            return Some(item);
        }
        if let Some(late) = self.late.lock().unwrap().take() {
            self.items.push(late);
            let task = self.task.get().and_then(Weak::upgrade).unwrap();
            *self.signalled.lock().unwrap() = Some(task.signal_ready());
        }
        None
    }
}

#[test]
fn signal_during_drain_polls_again() {
    let queue = Arc::new(LateArrival {
        items: [1].into_iter().collect(),
        late: Mutex::new(Some(2)),
        task: OnceLock::new(),
        signalled: Mutex::new(None),
    });
    let recorder = Recorder::default();
    let task = Arc::new(PollingTask::new(Arc::clone(&queue), recorder.clone()));
    assert!(queue.task.set(Arc::downgrade(&task)).is_ok());

    assert!(task.signal_ready());
    assert_eq!(task.run(), 2);
    assert_eq!(*queue.signalled.lock().unwrap(), Some(false));
    assert_eq!(recorder.seen(), [1, 2]);
    assert_eq!(task.state(), TaskState::Waiting);
}

#[test]
fn concurrent_producers_lose_nothing_and_never_overlap() {
    const PRODUCERS: u32 = 4;
    const PER_PRODUCER: u32 = 1_000;

    let in_flight = Arc::new(AtomicUsize::new(0));
    let overlapped = Arc::new(AtomicUsize::new(0));
    let consumed = Arc::new(AtomicUsize::new(0));
    let queue = Arc::new(MemoryQueue::new());
    let task = Arc::new(PollingTask::new(Arc::clone(&queue), {
        let in_flight = Arc::clone(&in_flight);
        let overlapped = Arc::clone(&overlapped);
        let consumed = Arc::clone(&consumed);
        move |_: u32| -> Result<(), BoxError> {
            if in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                overlapped.fetch_add(1, Ordering::SeqCst);
            }
            consumed.fetch_add(1, Ordering::SeqCst);
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }));
    let notifier = Arc::new(LocalNotifier::new());
    let watcher = KeyspaceWatcher::start(
        Arc::clone(&task),
        notifier.clone(),
        Arc::new(ThreadExecutor),
        ByteSeq::from(KEY),
    );

    scope(|s| {
        for p in 0..PRODUCERS {
            let queue = &queue;
            let notifier = &notifier;
            s.spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.push(p * PER_PRODUCER + i);
                    notifier.publish_key_changed(&ByteSeq::from(KEY));
                }
            });
        }
    });

    let total = (PRODUCERS * PER_PRODUCER) as usize;
    assert!(wait_until(Duration::from_secs(10), || {
        consumed.load(Ordering::SeqCst) == total
    }));
    assert!(queue.is_empty());
    assert_eq!(overlapped.load(Ordering::SeqCst), 0);
    watcher.stop();
}

#[test]
fn watcher_drains_on_subscribe_and_on_key_change() {
    let recorder = Recorder::default();
    let queue = Arc::new(MemoryQueue::from_iter([1_u32, 2]));
    let task = Arc::new(PollingTask::new(Arc::clone(&queue), recorder.clone()));
    let notifier = Arc::new(LocalNotifier::new());

    let watcher = KeyspaceWatcher::start(
        Arc::clone(&task),
        notifier.clone(),
        Arc::new(InlineExecutor),
        ByteSeq::from(KEY),
    );
    assert!(watcher.is_active());
    assert_eq!(recorder.seen(), [1, 2]);

    queue.push(3);
    assert_eq!(notifier.publish_key_changed(&ByteSeq::from("__keyspace@0__:other")), 0);
    assert_eq!(queue.len(), 1);

    assert_eq!(notifier.publish_key_changed(&ByteSeq::from(KEY)), 1);
    assert_eq!(recorder.seen(), [1, 2, 3]);

    queue.push(4);
    assert_eq!(notifier.publish_resubscribed(), 1);
    assert_eq!(recorder.seen(), [1, 2, 3, 4]);
    assert_eq!(task.state(), TaskState::Waiting);
}

#[test]
fn stopped_watcher_ignores_events() {
    let recorder = Recorder::default();
    let queue = Arc::new(MemoryQueue::<u32>::new());
    let task = Arc::new(PollingTask::new(Arc::clone(&queue), recorder.clone()));
    let notifier = Arc::new(LocalNotifier::new());
    let watcher = KeyspaceWatcher::start(
        Arc::clone(&task),
        notifier.clone(),
        Arc::new(InlineExecutor),
        ByteSeq::from("__keyspace@0__:*"),
    );
    assert_eq!(notifier.subscription_count(), 1);

    queue.push(1);
    notifier.publish_key_changed(&ByteSeq::from(KEY));
    assert_eq!(recorder.seen(), [1]);

    watcher.stop();
    watcher.stop();
    assert!(!watcher.is_active());
    assert_eq!(notifier.subscription_count(), 0);
    assert_eq!(task.state(), TaskState::Waiting);

    queue.push(2);
    assert_eq!(notifier.publish_key_changed(&ByteSeq::from(KEY)), 0);
    assert_eq!(recorder.seen(), [1]);
    assert_eq!(queue.len(), 1);
}

#[test]
fn dropping_watcher_unsubscribes() {
    let queue = Arc::new(MemoryQueue::<u32>::new());
    let task = Arc::new(PollingTask::new(queue, Recorder::default()));
    let notifier = Arc::new(LocalNotifier::new());
    {
        let _watcher = KeyspaceWatcher::start(
            task,
            notifier.clone(),
            Arc::new(InlineExecutor),
            ByteSeq::from(KEY),
        );
        assert_eq!(notifier.subscription_count(), 1);
    }
    assert_eq!(notifier.subscription_count(), 0);
}

#[cfg(feature = "async-tokio")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tokio_executor_runs_drains_on_blocking_pool() {
    use crate::polling::TokioExecutor;

    let recorder = Recorder::default();
    let queue = Arc::new(MemoryQueue::<u32>::new());
    let task = Arc::new(PollingTask::new(Arc::clone(&queue), recorder.clone()));
    let notifier = Arc::new(LocalNotifier::new());
    let watcher = KeyspaceWatcher::start(
        Arc::clone(&task),
        notifier.clone(),
        Arc::new(TokioExecutor::try_current().unwrap()),
        ByteSeq::from(KEY),
    );

    for n in 0..10 {
        queue.push(n);
        notifier.publish_key_changed(&ByteSeq::from(KEY));
    }

    let start = Instant::now();
    while recorder.seen().len() < 10 && start.elapsed() < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(recorder.seen(), (0..10).collect::<Vec<_>>());
    watcher.stop();
}
