//! Cache types for product reads.
//!
//! Products are identical for every visitor, so they are cached on the shared
//! client rather than on a per-request handle.

use std::sync::Arc;

use headless_demo_core::ProductId;

use super::types::Product;

/// Cache key for product reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
}
