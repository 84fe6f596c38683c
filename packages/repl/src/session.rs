//! Shell session state: the router and the locator commands act on.

use rowmap_core::{Error, ResourceLocator};
use rowmap_router::StoreRouter;

pub struct Session {
    router: StoreRouter,
    current: Option<ResourceLocator>,
}

impl Session {
    /// Start a session on the first registered locator, if any.
    pub fn new(router: StoreRouter) -> Self {
        let current = router.locators().first().map(|l| (*l).clone());
        Self { router, current }
    }

    pub fn router(&self) -> &StoreRouter {
        &self.router
    }

    pub fn current(&self) -> Option<&ResourceLocator> {
        self.current.as_ref()
    }

    /// Switch to `locator`, which must be registered.
    pub fn use_locator(&mut self, locator: &str) -> Result<&ResourceLocator, Error> {
        let locator = ResourceLocator::new(locator);
        self.router.content_type(&locator)?;
        Ok(self.current.insert(locator))
    }

    /// Registered locators as strings, for completion.
    pub fn locator_names(&self) -> Vec<String> {
        self.router
            .locators()
            .into_iter()
            .map(|l| l.to_string())
            .collect()
    }
}
