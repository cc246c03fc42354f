//! Observable holder for a `RequestState`.
//!
//! # Design
//! The current snapshot lives in a `tokio::sync::watch` channel so async view
//! loops can `subscribe()` and await the latest value. Synchronous observers
//! are kept alongside and are called with every transition, in the order the
//! transitions were applied.
//!
//! Each write pushes its resulting snapshot onto a queue while still holding
//! the queue lock, so queue order is write order. Whoever finds the queue idle
//! drains it, calling observers with no lock held. A write made from inside an
//! observer (an observer that dismisses errors, say) is queued and delivered
//! after the current notification finishes.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::error::RequestError;
use crate::state::RequestState;

/// Callback invoked with each new snapshot.
pub type ObserverFn<T> = Arc<dyn Fn(&RequestState<T>) + Send + Sync>;

/// Handle returned by [`StateStore::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

pub struct StateStore<T> {
    tx: watch::Sender<RequestState<T>>,
    observers: Mutex<Vec<(ObserverId, ObserverFn<T>)>>,
    pending: Mutex<VecDeque<RequestState<T>>>,
    draining: AtomicBool,
    next_id: AtomicU64,
}

impl<T: Clone> StateStore<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RequestState::idle());
        Self {
            tx,
            observers: Mutex::new(Vec::new()),
            pending: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
            next_id: AtomicU64::new(0),
        }
    }

    /// Clone of the current snapshot.
    pub fn snapshot(&self) -> RequestState<T> {
        self.tx.borrow().clone()
    }

    /// Receiver that always yields the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.tx.subscribe()
    }

    pub fn observe(&self, observer: ObserverFn<T>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_observers().push((id, observer));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        let mut observers = self.lock_observers();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Replace the whole snapshot.
    pub(crate) fn replace(&self, state: RequestState<T>) {
        self.apply(move |current| {
            *current = state;
            true
        });
    }

    /// Set an error without touching `loading` or `result`.
    pub(crate) fn set_error(&self, error: RequestError) {
        self.apply(move |current| {
            current.error = Some(error);
            true
        });
    }

    /// Drop the error, leaving `loading` and `result` as they are. A no-op
    /// (and no notification) when there is no error. Safe to call from an
    /// observer.
    pub fn clear_error(&self) {
        self.apply(|current| current.error.take().is_some());
    }

    fn apply(&self, modify: impl FnOnce(&mut RequestState<T>) -> bool) {
        {
            let mut pending = self.lock_pending();
            if !self.tx.send_if_modified(modify) {
                return;
            }
            pending.push_back(self.snapshot());
        }
        self.drain();
    }

    fn drain(&self) {
        loop {
            if self
                .draining
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                // The active drainer will pick up what we queued.
                return;
            }
            loop {
                let next = self.lock_pending().pop_front();
                let Some(state) = next else { break };
                let observers: Vec<ObserverFn<T>> = self
                    .lock_observers()
                    .iter()
                    .map(|(_, observer)| Arc::clone(observer))
                    .collect();
                for observer in &observers {
                    observer(&state);
                }
            }
            self.draining.store(false, Ordering::Release);
            if self.lock_pending().is_empty() {
                return;
            }
        }
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<(ObserverId, ObserverFn<T>)>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, VecDeque<RequestState<T>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for StateStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer that logs every transition through `tracing`.
pub fn tracing_observer<T: Debug + 'static>() -> ObserverFn<T> {
    Arc::new(|state: &RequestState<T>| {
        if let Some(error) = &state.error {
            tracing::debug!(target: "req_state::state", code = %error.code, "error: {}", error.message);
        } else if state.loading {
            tracing::debug!(target: "req_state::state", "loading");
        } else {
            tracing::debug!(target: "req_state::state", "result: {:?}", state.result);
        }
    })
}
