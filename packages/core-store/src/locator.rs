//! Resource locators naming one logical collection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque, comparable identifier (typically a URI such as
/// `content://org.example.provider/Contact`).
///
/// The router never interprets the text; two locators are the same
/// collection exactly when their strings are equal.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceLocator(String);

impl ResourceLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        ResourceLocator(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceLocator {
    fn from(s: &str) -> Self {
        ResourceLocator::new(s)
    }
}

impl From<String> for ResourceLocator {
    fn from(s: String) -> Self {
        ResourceLocator(s)
    }
}

impl AsRef<str> for ResourceLocator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
