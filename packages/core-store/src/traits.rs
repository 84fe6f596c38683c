//! Core traits: BackingStore, RowCodec.

use std::sync::Arc;

use crate::{Error, FieldPath, FlatRecord, SelectionFilter, StoreError, TypeDescriptor, Value};

/// Completion callback handed to [`BackingStore::open`].
///
/// Called exactly once, from whatever thread finishes the open.
pub type OpenCallback = Box<dyn FnOnce(Result<(), StoreError>) + Send + 'static>;

/// A key-value store of structured objects for one or more collections.
///
/// Implementations own all locking and transaction discipline; callers may
/// invoke any method concurrently from multiple threads.
///
/// # Object Safety
///
/// This trait is object-safe: the router holds `Arc<dyn BackingStore>`.
pub trait BackingStore: Send + Sync {
    /// Persist one value, replacing any value with the same identity.
    fn save(&self, value: Value) -> Result<(), StoreError>;

    /// Persist a batch of values.
    ///
    /// Default implementation saves each value in turn. Stores that can do
    /// better (one transaction, one fsync) should override it.
    fn save_all(&self, values: Vec<Value>) -> Result<(), StoreError> {
        for value in values {
            self.save(value)?;
        }
        Ok(())
    }

    /// Every stored value, in the store's own read order.
    fn read_all(&self) -> Result<Vec<Value>, StoreError>;

    /// Stored values matching `filter`, in the store's own read order.
    fn read_with_filter(&self, filter: &SelectionFilter) -> Result<Vec<Value>, StoreError>;

    /// Remove the value whose identity is `id`. Removing an absent id is
    /// not an error.
    fn remove(&self, id: &str) -> Result<(), StoreError>;

    /// Remove every stored value.
    fn reset(&self) -> Result<(), StoreError>;

    /// The field [`remove`](Self::remove) matches ids against, when the
    /// store keys values by a field of their own.
    fn identity_field(&self) -> Option<FieldPath> {
        None
    }

    /// Whether the store must be opened with [`open`](Self::open) before
    /// use and reports completion through the callback.
    fn opens_asynchronously(&self) -> bool {
        false
    }

    /// Begin opening the store; `on_complete` fires when it is usable (or
    /// has failed to become usable).
    ///
    /// The default, for stores that are usable on construction, completes
    /// immediately.
    fn open(&self, on_complete: OpenCallback) {
        on_complete(Ok(()));
    }
}

impl<T: BackingStore + ?Sized> BackingStore for Arc<T> {
    fn save(&self, value: Value) -> Result<(), StoreError> {
        self.as_ref().save(value)
    }

    fn save_all(&self, values: Vec<Value>) -> Result<(), StoreError> {
        self.as_ref().save_all(values)
    }

    fn read_all(&self) -> Result<Vec<Value>, StoreError> {
        self.as_ref().read_all()
    }

    fn read_with_filter(&self, filter: &SelectionFilter) -> Result<Vec<Value>, StoreError> {
        self.as_ref().read_with_filter(filter)
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.as_ref().remove(id)
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.as_ref().reset()
    }

    fn identity_field(&self) -> Option<FieldPath> {
        self.as_ref().identity_field()
    }

    fn opens_asynchronously(&self) -> bool {
        self.as_ref().opens_asynchronously()
    }

    fn open(&self, on_complete: OpenCallback) {
        self.as_ref().open(on_complete)
    }
}

/// Translation between table rows and structured values.
///
/// The router is generic over this trait so that hosts can substitute their
/// own row representation. [`PathCodec`](crate::PathCodec) is the default.
pub trait RowCodec: Send + Sync {
    /// Build a structured value from a row.
    fn to_value(&self, row: &FlatRecord, descriptor: Option<&TypeDescriptor>)
        -> Result<Value, Error>;

    /// Encode a structured value as a row.
    fn to_row(&self, value: &Value, descriptor: Option<&TypeDescriptor>)
        -> Result<FlatRecord, Error>;

    /// Overwrite fields of `target` with the columns of `patch`.
    fn merge(
        &self,
        target: &mut Value,
        patch: &FlatRecord,
        descriptor: Option<&TypeDescriptor>,
    ) -> Result<(), Error>;
}

impl<T: RowCodec + ?Sized> RowCodec for Box<T> {
    fn to_value(
        &self,
        row: &FlatRecord,
        descriptor: Option<&TypeDescriptor>,
    ) -> Result<Value, Error> {
        self.as_ref().to_value(row, descriptor)
    }

    fn to_row(
        &self,
        value: &Value,
        descriptor: Option<&TypeDescriptor>,
    ) -> Result<FlatRecord, Error> {
        self.as_ref().to_row(value, descriptor)
    }

    fn merge(
        &self,
        target: &mut Value,
        patch: &FlatRecord,
        descriptor: Option<&TypeDescriptor>,
    ) -> Result<(), Error> {
        self.as_ref().merge(target, patch, descriptor)
    }
}
