//! ReadinessGate - a single-fire barrier for asynchronously opening stores.
//!
//! A gate starts `Pending` and is signaled exactly once, by the store's open
//! completion. Every waiter carries its own deadline: a waiter that gives up
//! does not change the gate, so other waiters keep waiting and the gate
//! still transitions when the open completes.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rowmap_core::{OpenCallback, StoreError};

/// How an asynchronous open completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    Open,
    OpenFailed(String),
}

/// Observable state of a gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateState {
    Pending,
    Signaled(Readiness),
}

/// Blocks callers until a backing store has finished opening.
#[derive(Debug)]
pub struct ReadinessGate {
    state: Mutex<GateState>,
    signaled: Condvar,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Pending),
            signaled: Condvar::new(),
        }
    }

    // The state is a plain enum, so a panicking holder cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state of the gate.
    pub fn state(&self) -> GateState {
        self.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.lock(), GateState::Pending)
    }

    /// Signal the gate and release every waiter.
    ///
    /// Only the first signal has any effect; returns whether this call was
    /// the one that transitioned the gate.
    pub fn signal(&self, readiness: Readiness) -> bool {
        let mut state = self.lock();
        if !matches!(*state, GateState::Pending) {
            return false;
        }
        *state = GateState::Signaled(readiness);
        self.signaled.notify_all();
        true
    }

    /// Block until the gate is signaled or `timeout` elapses.
    ///
    /// Returns `None` if the deadline passed while the gate was still
    /// pending.
    pub fn wait(&self, timeout: Duration) -> Option<Readiness> {
        let state = self.lock();
        let (state, _) = self
            .signaled
            .wait_timeout_while(state, timeout, |state| matches!(state, GateState::Pending))
            .unwrap_or_else(PoisonError::into_inner);

        match &*state {
            GateState::Pending => None,
            GateState::Signaled(readiness) => Some(readiness.clone()),
        }
    }

    /// An open-completion callback that signals this gate.
    pub fn open_callback(self: &Arc<Self>) -> OpenCallback {
        let gate = Arc::clone(self);
        Box::new(move |result: Result<(), StoreError>| {
            let readiness = match result {
                Ok(()) => Readiness::Open,
                Err(e) => Readiness::OpenFailed(e.to_string()),
            };
            gate.signal(readiness);
        })
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
