use core::fmt;

use portable_atomic::{AtomicU8, Ordering};

/// Lifecycle of a [`PollingTask`].
///
/// ```text
///            signal_ready            run
///  Waiting ───────────────▶ Ready ───────▶ Running
///     ▲                                      │
///     └──────────── drain finished ──────────┘
/// ```
///
/// [`PollingTask`]: crate::polling::PollingTask
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskState {
    /// Idle; the next ready signal schedules a drain.
    Waiting = 0,
    /// A drain has been handed to an executor but has not started.
    Ready = 1,
    /// A drain is in progress.
    Running = 2,
}

impl TaskState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Ready => "ready",
            Self::Running => "running",
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Ready,
            2 => Self::Running,
            _ => Self::Waiting,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The task state word.
#[derive(Debug)]
pub(crate) struct StateCell {
    #[cfg(feature = "cache-padded")]
    raw: crossbeam_utils::CachePadded<AtomicU8>,
    #[cfg(not(feature = "cache-padded"))]
    raw: AtomicU8,
}

impl StateCell {
    pub(crate) fn new(state: TaskState) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            raw: crossbeam_utils::CachePadded::new(AtomicU8::new(state as u8)),
            #[cfg(not(feature = "cache-padded"))]
            raw: AtomicU8::new(state as u8),
        }
    }

    pub(crate) fn load(&self) -> TaskState {
        TaskState::from_u8(self.raw.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: TaskState) {
        self.raw.store(state as u8, Ordering::Release);
    }

    /// Moves `from -> to`; returns the observed state on failure.
    pub(crate) fn transition(&self, from: TaskState, to: TaskState) -> Result<(), TaskState> {
        self.raw
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(drop)
            .map_err(TaskState::from_u8)
    }
}
