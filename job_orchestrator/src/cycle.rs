//! Refresh cycles and the view state they publish.
//!
//! Every refresh takes a token from the tracker. Only the holder of the most
//! recent token may publish, so a slow cycle finishing after a newer one has
//! started is dropped instead of overwriting fresher data.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleToken(u64);

impl CycleToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct CycleTracker {
    latest: AtomicU64,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> CycleToken {
        CycleToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> CycleToken {
        CycleToken(self.latest.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, token: CycleToken) -> bool {
        self.latest() == token
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready {
        records: Vec<T>,
        refreshed_at: DateTime<Utc>,
    },
    Failed {
        message: String,
    },
}

impl<T> ViewState<T> {
    /// Empty unless Ready
    pub fn records(&self) -> &[T] {
        match self {
            ViewState::Ready { records, .. } => records.as_slice(),
            _ => &[],
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewState::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Latest published view, shared between a session and its readers
#[derive(Debug)]
pub struct ViewStore<T> {
    tracker: CycleTracker,
    state: RwLock<Arc<ViewState<T>>>,
}

impl<T> Default for ViewStore<T> {
    fn default() -> Self {
        Self {
            tracker: CycleTracker::new(),
            state: RwLock::new(Arc::new(ViewState::Idle)),
        }
    }
}

impl<T> ViewStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a cycle and moves the view to Loading
    pub fn begin(&self) -> CycleToken {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let token = self.tracker.next();
        *state = Arc::new(ViewState::Loading);
        debug!("Cycle {} started", token.value());
        token
    }

    /// Publishes `records` if `token` is still the latest cycle
    pub fn commit(&self, token: CycleToken, records: Vec<T>, refreshed_at: DateTime<Utc>) -> bool {
        self.publish(
            token,
            ViewState::Ready {
                records,
                refreshed_at,
            },
        )
    }

    /// Publishes a failure if `token` is still the latest cycle
    pub fn fail(&self, token: CycleToken, message: impl Into<String>) -> bool {
        self.publish(
            token,
            ViewState::Failed {
                message: message.into(),
            },
        )
    }

    pub fn snapshot(&self) -> Arc<ViewState<T>> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn publish(&self, token: CycleToken, next: ViewState<T>) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if !self.tracker.is_current(token) {
            debug!(
                "Dropping stale cycle {} (latest is {})",
                token.value(),
                self.tracker.latest().value()
            );
            return false;
        }
        *state = Arc::new(next);
        true
    }
}
