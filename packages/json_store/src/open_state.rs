//! Open tracking for stores that become usable asynchronously.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use rowmap_core::{OpenCallback, StoreError};

/// Whether a store has finished opening. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub(crate) struct OpenFlag(Arc<AtomicBool>);

impl OpenFlag {
    pub(crate) fn opened() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub(crate) fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Fail with `NotOpen` until the store has opened.
    pub(crate) fn check(&self) -> Result<(), StoreError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StoreError::NotOpen)
        }
    }

    /// Run `work` on a background thread, mark the store open if it
    /// succeeds, then report the outcome through `on_complete`.
    ///
    /// If the thread cannot be spawned, `on_complete` still fires, with
    /// `OpenFailed`.
    pub(crate) fn open_in_background<F>(&self, name: &str, work: F, on_complete: OpenCallback)
    where
        F: FnOnce() -> Result<(), StoreError> + Send + 'static,
    {
        let thread_name = format!("rowmap-open-{}", name);
        self.open_with(name, work, on_complete, move |task| {
            thread::Builder::new().name(thread_name).spawn(task).map(drop)
        });
    }

    fn open_with<F, S>(&self, name: &str, work: F, on_complete: OpenCallback, spawn: S)
    where
        F: FnOnce() -> Result<(), StoreError> + Send + 'static,
        S: FnOnce(Box<dyn FnOnce() + Send>) -> io::Result<()>,
    {
        // Whichever side runs first takes the callback, so it fires once
        let callback = Arc::new(Mutex::new(Some(on_complete)));
        let in_thread = Arc::clone(&callback);
        let flag = self.clone();
        let store = name.to_string();

        let spawned = spawn(Box::new(move || {
            let result = work();
            match &result {
                Ok(()) => {
                    flag.0.store(true, Ordering::Release);
                    tracing::debug!(%store, "store opened");
                }
                Err(e) => tracing::warn!(%store, error = %e, "store failed to open"),
            }
            if let Some(on_complete) = take_callback(&in_thread) {
                on_complete(result);
            }
        }));

        if let Err(e) = spawned {
            tracing::error!(store = %name, error = %e, "could not spawn open thread");
            if let Some(on_complete) = take_callback(&callback) {
                on_complete(Err(StoreError::OpenFailed {
                    message: format!("cannot spawn open thread: {}", e),
                }));
            }
        }
    }
}

fn take_callback(slot: &Mutex<Option<OpenCallback>>) -> Option<OpenCallback> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}
