//! Registration: which locators each named backing store serves.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rowmap_core::{BackingStore, ResourceLocator, TypeDescriptor};

/// One locator served by a store, with the type of object it holds.
#[derive(Clone, Debug)]
pub struct LocatorBinding {
    pub locator: ResourceLocator,
    pub descriptor: Option<Arc<TypeDescriptor>>,
}

impl LocatorBinding {
    /// A locator whose objects have no declared type.
    pub fn untyped(locator: impl Into<ResourceLocator>) -> Self {
        Self {
            locator: locator.into(),
            descriptor: None,
        }
    }

    /// A locator holding objects described by `descriptor`.
    pub fn typed(locator: impl Into<ResourceLocator>, descriptor: impl Into<Arc<TypeDescriptor>>) -> Self {
        Self {
            locator: locator.into(),
            descriptor: Some(descriptor.into()),
        }
    }
}

/// The registration descriptor a router is built from: store name to the
/// locators that store serves.
///
/// # Example
///
/// ```rust
/// use rowmap_router::{LocatorBinding, Registration};
/// use rowmap_core::{ScalarKind, TypeDescriptor};
///
/// let contact = TypeDescriptor::new()
///     .with_scalar("id", ScalarKind::Int)
///     .with_identity("id");
///
/// let registration = Registration::new()
///     .store("people", [LocatorBinding::typed("content://people/contacts", contact)])
///     .store_locators("scratch", ["content://scratch/notes"]);
///
/// assert_eq!(registration.len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Registration {
    stores: BTreeMap<String, Vec<LocatorBinding>>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bindings` to the store named `name`, after any bindings
    /// already registered to it.
    #[must_use]
    pub fn store(
        mut self,
        name: impl Into<String>,
        bindings: impl IntoIterator<Item = LocatorBinding>,
    ) -> Self {
        self.stores.entry(name.into()).or_default().extend(bindings);
        self
    }

    /// Register untyped `locators` to the store named `name`.
    #[must_use]
    pub fn store_locators<L: Into<ResourceLocator>>(
        self,
        name: impl Into<String>,
        locators: impl IntoIterator<Item = L>,
    ) -> Self {
        self.store(name, locators.into_iter().map(LocatorBinding::untyped))
    }

    /// Number of store names.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LocatorBinding])> {
        self.stores
            .iter()
            .map(|(name, bindings)| (name.as_str(), bindings.as_slice()))
    }
}

/// Obtains a backing store by name during registration.
pub trait StoreProvider {
    /// The store called `name`, or `None` if there is none.
    fn resolve(&self, name: &str) -> Option<Arc<dyn BackingStore>>;
}

impl StoreProvider for HashMap<String, Arc<dyn BackingStore>> {
    fn resolve(&self, name: &str) -> Option<Arc<dyn BackingStore>> {
        self.get(name).cloned()
    }
}

impl StoreProvider for BTreeMap<String, Arc<dyn BackingStore>> {
    fn resolve(&self, name: &str) -> Option<Arc<dyn BackingStore>> {
        self.get(name).cloned()
    }
}
