//! Async facade over [`StoreRouter`].
//!
//! Router operations block on readiness gates, so each call runs on the
//! blocking thread pool rather than on an async worker.

use std::sync::Arc;

use rowmap_core::{Error, FlatRecord, PathCodec, ResourceLocator, RowCodec, StoreError};

use crate::router::StoreRouter;

/// A cheaply cloneable async handle to a [`StoreRouter`].
#[derive(Debug)]
pub struct AsyncStoreRouter<C = PathCodec> {
    inner: Arc<StoreRouter<C>>,
}

impl<C> Clone for AsyncStoreRouter<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: RowCodec + 'static> AsyncStoreRouter<C> {
    pub fn new(router: StoreRouter<C>) -> Self {
        Self {
            inner: Arc::new(router),
        }
    }

    /// The wrapped router, for synchronous calls.
    pub fn router(&self) -> &StoreRouter<C> {
        &self.inner
    }

    async fn run<T, F>(&self, op: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&StoreRouter<C>) -> Result<T, Error> + Send + 'static,
    {
        let router = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&router))
            .await
            .map_err(|e| {
                Error::Store(StoreError::Other {
                    message: format!("router task failed: {}", e),
                })
            })?
    }

    pub async fn insert(&self, locator: ResourceLocator, row: FlatRecord) -> Result<ResourceLocator, Error> {
        self.run(move |router| router.insert(&locator, &row)).await
    }

    pub async fn bulk_insert(&self, locator: ResourceLocator, rows: Vec<FlatRecord>) -> Result<usize, Error> {
        self.run(move |router| router.bulk_insert(&locator, &rows)).await
    }

    pub async fn query(
        &self,
        locator: ResourceLocator,
        selection: String,
        args: Vec<Option<String>>,
    ) -> Result<Vec<FlatRecord>, Error> {
        self.run(move |router| router.query(&locator, &selection, &args))
            .await
    }

    pub async fn update(
        &self,
        locator: ResourceLocator,
        patch: FlatRecord,
        selection: String,
        args: Vec<Option<String>>,
    ) -> Result<usize, Error> {
        self.run(move |router| router.update(&locator, &patch, &selection, &args))
            .await
    }

    pub async fn delete(
        &self,
        locator: ResourceLocator,
        selection: String,
        args: Vec<Option<String>>,
    ) -> Result<usize, Error> {
        self.run(move |router| router.delete(&locator, &selection, &args))
            .await
    }
}
