//! In-memory backing store.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;
use std::time::Duration;

use rowmap_core::{BackingStore, FieldPath, OpenCallback, SelectionFilter, StoreError, Value};

use crate::identity::{default_identity, ensure_identity};
use crate::open_state::OpenFlag;

#[derive(Clone, Copy, Debug)]
enum Opening {
    Immediate,
    After(Duration),
    FailAfter(Duration),
}

/// A backing store that keeps values in memory, in insertion order.
///
/// Saving a value whose identity matches a stored value replaces it in
/// place. Values without an identity are assigned a v4 UUID.
///
/// # Example
///
/// ```rust
/// use rowmap_json_store::InMemoryStore;
/// use rowmap_core::{BackingStore, Value};
///
/// let store = InMemoryStore::new();
/// store.save(Value::from(std::collections::BTreeMap::from([
///     ("id".to_string(), Value::from(1)),
/// ]))).unwrap();
///
/// assert_eq!(store.read_all().unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    identity: FieldPath,
    rows: RwLock<Vec<(String, Value)>>,
    open: OpenFlag,
    opening: Opening,
}

impl InMemoryStore {
    /// Create an empty store that is usable immediately.
    pub fn new() -> Self {
        Self {
            identity: default_identity(),
            rows: RwLock::new(Vec::new()),
            open: OpenFlag::opened(),
            opening: Opening::Immediate,
        }
    }

    /// Create a store that opens asynchronously, `delay` after `open` is
    /// called. Every operation fails with `NotOpen` until then.
    pub fn deferred(delay: Duration) -> Self {
        Self {
            open: OpenFlag::default(),
            opening: Opening::After(delay),
            ..Self::new()
        }
    }

    /// Create a store whose asynchronous open reports failure after `delay`.
    pub fn failing_open(delay: Duration) -> Self {
        Self {
            open: OpenFlag::default(),
            opening: Opening::FailAfter(delay),
            ..Self::new()
        }
    }

    /// Use `identity` instead of `id` as the identity field.
    #[must_use]
    pub fn with_identity(mut self, identity: FieldPath) -> Self {
        self.identity = identity;
        self
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_rows(&self) -> Result<RwLockReadGuard<'_, Vec<(String, Value)>>, StoreError> {
        self.open.check()?;
        self.rows.read().map_err(|_| poisoned())
    }

    fn write_rows(&self) -> Result<RwLockWriteGuard<'_, Vec<(String, Value)>>, StoreError> {
        self.open.check()?;
        self.rows.write().map_err(|_| poisoned())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Other {
        message: "in-memory store lock poisoned".to_string(),
    }
}

fn upsert(rows: &mut Vec<(String, Value)>, id: String, value: Value) {
    match rows.iter_mut().find(|(existing, _)| *existing == id) {
        Some(slot) => slot.1 = value,
        None => rows.push((id, value)),
    }
}

impl BackingStore for InMemoryStore {
    fn save(&self, mut value: Value) -> Result<(), StoreError> {
        self.open.check()?;
        let id = ensure_identity(&self.identity, &mut value)?;
        upsert(&mut *self.write_rows()?, id, value);
        Ok(())
    }

    fn save_all(&self, values: Vec<Value>) -> Result<(), StoreError> {
        self.open.check()?;
        let mut identified = Vec::with_capacity(values.len());
        for mut value in values {
            let id = ensure_identity(&self.identity, &mut value)?;
            identified.push((id, value));
        }

        let mut rows = self.write_rows()?;
        for (id, value) in identified {
            upsert(&mut rows, id, value);
        }
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .read_rows()?
            .iter()
            .map(|(_, value)| value.clone())
            .collect())
    }

    fn read_with_filter(&self, filter: &SelectionFilter) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .read_rows()?
            .iter()
            .filter(|(_, value)| filter.matches(value))
            .map(|(_, value)| value.clone())
            .collect())
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.write_rows()?.retain(|(existing, _)| existing != id);
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.write_rows()?.clear();
        Ok(())
    }

    fn identity_field(&self) -> Option<FieldPath> {
        Some(self.identity.clone())
    }

    fn opens_asynchronously(&self) -> bool {
        !matches!(self.opening, Opening::Immediate)
    }

    fn open(&self, on_complete: OpenCallback) {
        match self.opening {
            Opening::Immediate => on_complete(Ok(())),
            Opening::After(delay) => self.open.open_in_background(
                "memory",
                move || {
                    thread::sleep(delay);
                    Ok(())
                },
                on_complete,
            ),
            Opening::FailAfter(delay) => self.open.open_in_background(
                "memory",
                move || {
                    thread::sleep(delay);
                    Err(StoreError::OpenFailed {
                        message: "in-memory store configured to fail".to_string(),
                    })
                },
                on_complete,
            ),
        }
    }
}
