//! Shell configuration file.
//!
//! ```json
//! {
//!   "router": { "open_timeout_ms": 5000 },
//!   "types": {
//!     "contact": {
//!       "identity": "id",
//!       "fields": { "id": "int", "name": "string", "address": { "city": "string" } }
//!     }
//!   },
//!   "stores": {
//!     "people": {
//!       "type": "memory",
//!       "locators": [{ "locator": "content://people/contacts", "type": "contact" }]
//!     },
//!     "archive": {
//!       "type": "local",
//!       "path": "/var/lib/rowmap/archive",
//!       "locators": [{ "locator": "content://archive/contacts", "type": "contact" }]
//!     }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use rowmap_core::{BackingStore, FieldPath, ResourceLocator, TypeDescriptor};
use rowmap_json_store::{InMemoryStore, LocalJsonStore};
use rowmap_router::{LocatorBinding, Registration, RouterConfig, StoreRouter};

use crate::error::ShellError;

/// Locator served when no configuration file is given.
pub const SCRATCH_LOCATOR: &str = "content://rowmap/scratch";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub router: RouterConfig,
    pub types: BTreeMap<String, TypeDescriptor>,
    pub stores: BTreeMap<String, StoreConfig>,
}

/// A locator and the name of the type it holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    pub locator: ResourceLocator,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

/// Backing store definition, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// In-memory store, usable immediately.
    Memory {
        #[serde(default)]
        identity: Option<String>,
        locators: Vec<LocatorConfig>,
    },
    /// In-memory store that finishes opening `delay_ms` after startup.
    Deferred {
        delay_ms: u64,
        #[serde(default)]
        identity: Option<String>,
        locators: Vec<LocatorConfig>,
    },
    /// JSON files under `path`.
    Local {
        path: PathBuf,
        #[serde(default)]
        identity: Option<String>,
        locators: Vec<LocatorConfig>,
    },
}

impl StoreConfig {
    pub fn locators(&self) -> &[LocatorConfig] {
        match self {
            StoreConfig::Memory { locators, .. }
            | StoreConfig::Deferred { locators, .. }
            | StoreConfig::Local { locators, .. } => locators,
        }
    }

    fn identity(&self) -> Option<&str> {
        match self {
            StoreConfig::Memory { identity, .. }
            | StoreConfig::Deferred { identity, .. }
            | StoreConfig::Local { identity, .. } => identity.as_deref(),
        }
    }

    /// Build the store, keyed by its configured identity or else by
    /// `declared`, the identity its locators' type declares.
    fn build(&self, name: &str, declared: Option<&str>) -> Result<Arc<dyn BackingStore>, ShellError> {
        let identity = self
            .identity()
            .or(declared)
            .map(FieldPath::parse)
            .transpose()
            .map_err(|source| ShellError::InvalidIdentity {
                store: name.to_string(),
                source,
            })?;

        let store: Arc<dyn BackingStore> = match self {
            StoreConfig::Memory { .. } => {
                let store = InMemoryStore::new();
                Arc::new(match identity {
                    Some(identity) => store.with_identity(identity),
                    None => store,
                })
            }
            StoreConfig::Deferred { delay_ms, .. } => {
                let store = InMemoryStore::deferred(Duration::from_millis(*delay_ms));
                Arc::new(match identity {
                    Some(identity) => store.with_identity(identity),
                    None => store,
                })
            }
            StoreConfig::Local { path, .. } => {
                let store = LocalJsonStore::new(expand_home(path));
                Arc::new(match identity {
                    Some(identity) => store.with_identity(identity),
                    None => store,
                })
            }
        };
        Ok(store)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

impl ShellConfig {
    /// A single untyped in-memory store at [`SCRATCH_LOCATOR`].
    pub fn scratch() -> Self {
        let mut stores = BTreeMap::new();
        stores.insert(
            "scratch".to_string(),
            StoreConfig::Memory {
                identity: None,
                locators: vec![LocatorConfig {
                    locator: ResourceLocator::new(SCRATCH_LOCATOR),
                    type_name: None,
                }],
            },
        );
        Self {
            router: RouterConfig::default(),
            types: BTreeMap::new(),
            stores,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ShellError> {
        let text = std::fs::read_to_string(path).map_err(|source| ShellError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ShellError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Construct every store and the router over them.
    pub fn build_router(&self) -> Result<StoreRouter, ShellError> {
        let types: BTreeMap<&str, Arc<TypeDescriptor>> = self
            .types
            .iter()
            .map(|(name, descriptor)| (name.as_str(), Arc::new(descriptor.clone())))
            .collect();

        let mut provider: HashMap<String, Arc<dyn BackingStore>> = HashMap::new();
        let mut registration = Registration::new();

        for (name, store) in &self.stores {
            let mut bindings = Vec::with_capacity(store.locators().len());
            for locator in store.locators() {
                let descriptor = match &locator.type_name {
                    Some(type_name) => Some(types.get(type_name.as_str()).cloned().ok_or_else(
                        || ShellError::UnknownType {
                            locator: locator.locator.to_string(),
                            type_name: type_name.clone(),
                        },
                    )?),
                    None => None,
                };
                bindings.push(LocatorBinding {
                    locator: locator.locator.clone(),
                    descriptor,
                });
            }

            let declared = bindings
                .iter()
                .find_map(|binding| binding.descriptor.as_ref()?.identity.clone());
            provider.insert(name.clone(), store.build(name, declared.as_deref())?);
            registration = registration.store(name.as_str(), bindings);
        }

        Ok(StoreRouter::new(registration, &provider, self.router.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_core::ScalarKind;

    const CONFIG: &str = r#"{
        "router": { "open_timeout_ms": 1000 },
        "types": {
            "contact": {
                "identity": "id",
                "fields": { "id": "int", "name": "string", "address": { "city": "string" } }
            }
        },
        "stores": {
            "people": {
                "type": "memory",
                "locators": [{ "locator": "content://people/contacts", "type": "contact" }]
            },
            "slow": {
                "type": "deferred",
                "delay_ms": 5,
                "locators": [{ "locator": "content://slow/notes" }]
            }
        }
    }"#;

    #[test]
    fn parses_tagged_stores() {
        let config = ShellConfig::parse(CONFIG).unwrap();
        assert_eq!(config.router.open_timeout, Duration::from_secs(1));
        assert!(matches!(config.stores["people"], StoreConfig::Memory { .. }));
        assert!(matches!(
            config.stores["slow"],
            StoreConfig::Deferred { delay_ms: 5, .. }
        ));
        assert_eq!(
            config.types["contact"].scalar_kind_at(&FieldPath::parse("address.city").unwrap()),
            Some(ScalarKind::String)
        );
    }

    #[test]
    fn builds_router() {
        let router = ShellConfig::parse(CONFIG).unwrap().build_router().unwrap();
        let locators: Vec<&str> = router.locators().iter().map(|l| l.as_str()).collect();
        assert_eq!(locators, vec!["content://people/contacts", "content://slow/notes"]);

        let contacts = ResourceLocator::new("content://people/contacts");
        assert!(router.descriptor(&contacts).unwrap().is_some());
    }

    #[test]
    fn unknown_type_is_reported() {
        let config = ShellConfig::parse(
            r#"{ "stores": { "s": { "type": "memory",
                 "locators": [{ "locator": "content://s/x", "type": "missing" }] } } }"#,
        )
        .unwrap();
        assert!(matches!(
            config.build_router(),
            Err(ShellError::UnknownType { .. })
        ));
    }

    #[test]
    fn unknown_store_type_rejected() {
        assert!(matches!(
            ShellConfig::parse(r#"{ "stores": { "s": { "type": "http", "locators": [] } } }"#),
            Err(ShellError::ParseConfig(_))
        ));
    }

    #[test]
    fn store_identity_follows_type() {
        let config = ShellConfig::parse(
            r#"{
                "types": { "item": { "identity": "key", "fields": { "key": "string", "name": "string" } } },
                "stores": { "s": { "type": "memory", "locators": [{ "locator": "content://s/items", "type": "item" }] } }
            }"#,
        )
        .unwrap();
        let router = config.build_router().unwrap();
        let items = ResourceLocator::new("content://s/items");

        let row: rowmap_core::FlatRecord = [("key", "k1"), ("name", "a")].into_iter().collect();
        router.insert(&items, &row).unwrap();
        router.delete(&items, "key = ?", &[Some("k1".to_string())]).unwrap();
        assert!(router.query(&items, "", &[]).unwrap().is_empty());
    }

    #[test]
    fn conflicting_store_identity_rejected() {
        let config = ShellConfig::parse(
            r#"{
                "types": { "item": { "identity": "key", "fields": { "key": "string" } } },
                "stores": { "s": { "type": "memory", "identity": "id",
                    "locators": [{ "locator": "content://s/items", "type": "item" }] } }
            }"#,
        )
        .unwrap();
        assert!(matches!(
            config.build_router(),
            Err(ShellError::Router(rowmap_core::Error::IdentityMismatch { .. }))
        ));
    }

    #[test]
    fn scratch_config() {
        let router = ShellConfig::scratch().build_router().unwrap();
        assert_eq!(router.locators().len(), 1);
    }
}
