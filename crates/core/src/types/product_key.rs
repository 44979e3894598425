//! Product references that may point at the built-in demo catalog.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Prefix that marks a built-in demo product.
pub const DEMO_PREFIX: &str = "demo-";

/// Error returned for text that is neither a demo slug nor a product UUID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("not a product reference: {0}")]
pub struct ProductKeyError(pub String);

/// A product as the shopper sees it: either a catalog row or a demo item.
///
/// Demo products live only in code and in the guest's session; they are
/// never written to the remote cart or wishlist tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProductKey {
    Catalog(ProductId),
    Demo(String),
}

impl ProductKey {
    /// Parse `demo-…` slugs and product UUIDs.
    ///
    /// # Errors
    ///
    /// Returns [`ProductKeyError`] for any other text.
    pub fn parse(s: &str) -> Result<Self, ProductKeyError> {
        let s = s.trim();
        if s.starts_with(DEMO_PREFIX) && s.len() > DEMO_PREFIX.len() {
            return Ok(Self::Demo(s.to_owned()));
        }
        s.parse::<ProductId>()
            .map(Self::Catalog)
            .map_err(|_| ProductKeyError(s.to_owned()))
    }

    #[must_use]
    pub const fn is_demo(&self) -> bool {
        matches!(self, Self::Demo(_))
    }

    /// Catalog ID, if this is a persisted product.
    #[must_use]
    pub const fn catalog_id(&self) -> Option<ProductId> {
        match self {
            Self::Catalog(id) => Some(*id),
            Self::Demo(_) => None,
        }
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog(id) => write!(f, "{id}"),
            Self::Demo(slug) => f.write_str(slug),
        }
    }
}

impl From<ProductId> for ProductKey {
    fn from(id: ProductId) -> Self {
        Self::Catalog(id)
    }
}

impl TryFrom<String> for ProductKey {
    type Error = ProductKeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ProductKey> for String {
    fn from(key: ProductKey) -> Self {
        key.to_string()
    }
}

impl std::str::FromStr for ProductKey {
    type Err = ProductKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
