//! StoreRouter - tabular requests routed to backing stores by locator.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rowmap_core::{
    BackingStore, Error, FieldPath, FlatRecord, PathCodec, ResourceLocator, RowCodec,
    TypeDescriptor, Value,
};
use rowmap_serde::FilterBuilder;

use crate::config::RouterConfig;
use crate::cursor::{JsonRowCursor, RowCursor};
use crate::gate::{Readiness, ReadinessGate};
use crate::registry::{LocatorBinding, Registration, StoreProvider};

/// Media type reported for every locator.
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Success indicator returned by `update` and `delete`.
const SUCCESS: usize = 1;

struct RegisteredStore {
    store_name: String,
    descriptor: Option<Arc<TypeDescriptor>>,
    store: Option<Arc<dyn BackingStore>>,
    gate: Option<Arc<ReadinessGate>>,
}

impl std::fmt::Debug for RegisteredStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredStore")
            .field("store_name", &self.store_name)
            .field("descriptor", &self.descriptor)
            .field("resolved", &self.store.is_some())
            .field("gate", &self.gate.as_ref().map(|gate| gate.state()))
            .finish()
    }
}

/// Routes insert/query/update/delete requests to the backing store
/// registered for each locator.
///
/// The locator table is built once in the constructor and never changes,
/// so a router can be shared across threads behind an `Arc` without further
/// locking. Every operation first waits, up to
/// [`RouterConfig::open_timeout`], for the store to finish opening.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// use rowmap_core::{BackingStore, FlatRecord, ResourceLocator, ScalarKind, TypeDescriptor};
/// use rowmap_json_store::InMemoryStore;
/// use rowmap_router::{LocatorBinding, Registration, RouterConfig, StoreRouter};
///
/// let contact = TypeDescriptor::new()
///     .with_scalar("id", ScalarKind::Int)
///     .with_scalar("name", ScalarKind::String)
///     .with_identity("id");
/// let locator = ResourceLocator::new("content://people/contacts");
///
/// let mut stores: HashMap<String, Arc<dyn BackingStore>> = HashMap::new();
/// stores.insert("people".to_string(), Arc::new(InMemoryStore::new()));
///
/// let registration = Registration::new()
///     .store("people", [LocatorBinding::typed(locator.clone(), contact)]);
/// let router = StoreRouter::new(registration, &stores, RouterConfig::default()).unwrap();
///
/// let row: FlatRecord = [("id", "1"), ("name", "Ada")].into_iter().collect();
/// router.insert(&locator, &row).unwrap();
///
/// assert_eq!(router.query(&locator, "", &[]).unwrap(), vec![row]);
/// ```
#[derive(Debug)]
pub struct StoreRouter<C = PathCodec> {
    stores: HashMap<ResourceLocator, RegisteredStore>,
    codec: C,
    config: RouterConfig,
}

impl StoreRouter<PathCodec> {
    /// Build a router over `registration`, using dotted-path columns.
    pub fn new(
        registration: Registration,
        provider: &dyn StoreProvider,
        config: RouterConfig,
    ) -> Result<Self, Error> {
        Self::with_codec(registration, provider, config, PathCodec)
    }
}

impl<C: RowCodec> StoreRouter<C> {
    /// Build a router over `registration` that translates rows with `codec`.
    ///
    /// Each store name is resolved through `provider`. A store that opens
    /// asynchronously gets one gate shared by all of its locators, and is
    /// opened here with a callback that signals the gate. A name the
    /// provider cannot resolve is kept, so operations on its locators fail
    /// with `StoreUnavailable`.
    ///
    /// # Errors
    ///
    /// `DuplicateLocator` if a locator appears twice, `IdentityMismatch` if
    /// a descriptor's identity differs from its store's identity field, or
    /// the descriptor's own validation error. No store is opened when
    /// registration fails.
    pub fn with_codec(
        registration: Registration,
        provider: &dyn StoreProvider,
        config: RouterConfig,
        codec: C,
    ) -> Result<Self, Error> {
        let mut seen = BTreeSet::new();
        for (_, bindings) in registration.iter() {
            for binding in bindings {
                if !seen.insert(&binding.locator) {
                    return Err(Error::DuplicateLocator(binding.locator.clone()));
                }
                if let Some(descriptor) = &binding.descriptor {
                    descriptor.validate()?;
                }
            }
        }

        let resolved = registration
            .iter()
            .map(|(name, bindings)| {
                let store = provider.resolve(name);
                if let Some(store) = &store {
                    for binding in bindings {
                        check_identity(binding, &**store)?;
                    }
                }
                Ok::<_, Error>((name, bindings, store))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let mut stores = HashMap::with_capacity(seen.len());
        for (name, bindings, store) in resolved {
            let gate = match &store {
                Some(store) if store.opens_asynchronously() => {
                    let gate = Arc::new(ReadinessGate::new());
                    tracing::debug!(store = name, "opening store asynchronously");
                    store.open(gate.open_callback());
                    Some(gate)
                }
                Some(_) => None,
                None => {
                    tracing::warn!(store = name, "no backing store with this name");
                    None
                }
            };

            for binding in bindings {
                tracing::debug!(store = name, locator = %binding.locator, "registered locator");
                stores.insert(
                    binding.locator.clone(),
                    RegisteredStore {
                        store_name: name.to_string(),
                        descriptor: binding.descriptor.clone(),
                        store: store.clone(),
                        gate: gate.clone(),
                    },
                );
            }
        }

        Ok(Self {
            stores,
            codec,
            config,
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Registered locators, sorted.
    pub fn locators(&self) -> Vec<&ResourceLocator> {
        let mut locators: Vec<_> = self.stores.keys().collect();
        locators.sort();
        locators
    }

    /// Name of the store serving `locator`.
    pub fn store_name(&self, locator: &ResourceLocator) -> Result<&str, Error> {
        Ok(&self.registered(locator)?.store_name)
    }

    fn registered(&self, locator: &ResourceLocator) -> Result<&RegisteredStore, Error> {
        self.stores
            .get(locator)
            .ok_or_else(|| Error::UnknownLocator(locator.clone()))
    }

    fn await_ready(&self, locator: &ResourceLocator, registered: &RegisteredStore) -> Result<(), Error> {
        let Some(gate) = &registered.gate else {
            return Ok(());
        };

        let timeout = self.config.open_timeout;
        match gate.wait(timeout) {
            Some(Readiness::Open) => Ok(()),
            Some(Readiness::OpenFailed(message)) => {
                // The store call itself reports the failure
                tracing::warn!(%locator, %message, "store opened with failure, proceeding");
                Ok(())
            }
            None => {
                tracing::error!(%locator, waited_ms = timeout.as_millis() as u64, "store open timed out");
                Err(Error::Timeout {
                    locator: locator.clone(),
                    waited: timeout,
                })
            }
        }
    }

    /// Resolve `locator`, wait for its store, and return the store handle.
    fn resolve(
        &self,
        locator: &ResourceLocator,
    ) -> Result<(&RegisteredStore, &Arc<dyn BackingStore>), Error> {
        let registered = self.registered(locator)?;
        self.await_ready(locator, registered)?;
        let store = registered
            .store
            .as_ref()
            .ok_or_else(|| Error::StoreUnavailable(locator.clone()))?;
        Ok((registered, store))
    }

    fn read(
        &self,
        store: &Arc<dyn BackingStore>,
        selection: &str,
        args: &[Option<String>],
    ) -> Result<Vec<Value>, Error> {
        if selection.trim().is_empty() {
            return Ok(store.read_all()?);
        }
        let filter = FilterBuilder::build(selection, args)?;
        Ok(store.read_with_filter(&filter)?)
    }

    /// The descriptor registered for `locator`, once its store is ready.
    pub fn descriptor(&self, locator: &ResourceLocator) -> Result<Option<Arc<TypeDescriptor>>, Error> {
        let registered = self.registered(locator)?;
        self.await_ready(locator, registered)?;
        Ok(registered.descriptor.clone())
    }

    /// Media type of the rows served for `locator`.
    pub fn content_type(&self, locator: &ResourceLocator) -> Result<&'static str, Error> {
        self.registered(locator)?;
        Ok(CONTENT_TYPE)
    }

    /// Build an object from `row` and save it. Returns `locator`.
    pub fn insert(&self, locator: &ResourceLocator, row: &FlatRecord) -> Result<ResourceLocator, Error> {
        let (registered, store) = self.resolve(locator)?;
        let value = self.codec.to_value(row, registered.descriptor.as_deref())?;
        store.save(value)?;
        tracing::debug!(%locator, "inserted row");
        Ok(locator.clone())
    }

    /// Build an object from every row and save them in one batch.
    ///
    /// All rows are translated before anything is saved; a translation or
    /// store failure fails the whole call. Returns the number of rows.
    pub fn bulk_insert(&self, locator: &ResourceLocator, rows: &[FlatRecord]) -> Result<usize, Error> {
        let (registered, store) = self.resolve(locator)?;
        let values = rows
            .iter()
            .map(|row| self.codec.to_value(row, registered.descriptor.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;
        store.save_all(values)?;
        tracing::debug!(%locator, count = rows.len(), "bulk inserted rows");
        Ok(rows.len())
    }

    /// Rows matching `selection` (every row if it is empty), in the store's
    /// read order.
    pub fn query(
        &self,
        locator: &ResourceLocator,
        selection: &str,
        args: &[Option<String>],
    ) -> Result<Vec<FlatRecord>, Error> {
        let (registered, store) = self.resolve(locator)?;
        self.read(store, selection, args)?
            .iter()
            .map(|value| self.codec.to_row(value, registered.descriptor.as_deref()))
            .collect()
    }

    /// [`query`](Self::query) wrapped in a [`RowCursor`].
    pub fn query_cursor(
        &self,
        locator: &ResourceLocator,
        selection: &str,
        args: &[Option<String>],
    ) -> Result<RowCursor, Error> {
        self.query(locator, selection, args).map(RowCursor::new)
    }

    /// Matching objects untranslated, one JSON document per row.
    pub fn query_json(
        &self,
        locator: &ResourceLocator,
        selection: &str,
        args: &[Option<String>],
    ) -> Result<JsonRowCursor, Error> {
        let (_, store) = self.resolve(locator)?;
        self.read(store, selection, args).map(JsonRowCursor::new)
    }

    /// Overwrite the fields named by `patch` on every matching object, then
    /// save the whole matched list.
    ///
    /// Returns 1 as a success flag, not a count of changed rows.
    pub fn update(
        &self,
        locator: &ResourceLocator,
        patch: &FlatRecord,
        selection: &str,
        args: &[Option<String>],
    ) -> Result<usize, Error> {
        let (registered, store) = self.resolve(locator)?;
        let mut values = self.read(store, selection, args)?;
        for value in &mut values {
            self.codec
                .merge(value, patch, registered.descriptor.as_deref())?;
        }

        tracing::debug!(%locator, matched = values.len(), "updating rows");
        store.save_all(values)?;
        Ok(SUCCESS)
    }

    /// Remove matching objects by identity.
    ///
    /// With no bound argument (`args` empty or its first entry `None`) the
    /// whole collection is reset instead, whatever `selection` says.
    /// Returns 1 as a success flag.
    pub fn delete(
        &self,
        locator: &ResourceLocator,
        selection: &str,
        args: &[Option<String>],
    ) -> Result<usize, Error> {
        let (registered, store) = self.resolve(locator)?;

        if args.first().map_or(true, Option::is_none) {
            tracing::debug!(%locator, "resetting collection");
            store.reset()?;
            return Ok(SUCCESS);
        }

        let ids = self
            .read(store, selection, args)?
            .iter()
            .map(|value| {
                registered
                    .descriptor
                    .as_ref()
                    .and_then(|descriptor| descriptor.identity_of(value))
                    .ok_or_else(|| Error::MissingIdentity {
                        locator: locator.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(%locator, matched = ids.len(), "deleting rows");
        for id in &ids {
            store.remove(id)?;
        }
        Ok(SUCCESS)
    }
}

/// Removal goes through the descriptor's identity, so the store must key
/// values by the same field.
fn check_identity(binding: &LocatorBinding, store: &dyn BackingStore) -> Result<(), Error> {
    let Some(declared) = binding
        .descriptor
        .as_ref()
        .and_then(|descriptor| descriptor.identity.as_deref())
    else {
        return Ok(());
    };
    let Some(keyed_by) = store.identity_field() else {
        return Ok(());
    };

    if FieldPath::parse(declared)? != keyed_by {
        return Err(Error::IdentityMismatch {
            locator: binding.locator.clone(),
            descriptor: declared.to_string(),
            store: keyed_by.to_key(),
        });
    }
    Ok(())
}
