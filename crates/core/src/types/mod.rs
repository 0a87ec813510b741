//! Core types for the headless demo storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;
pub mod tokens;

pub use id::*;
pub use price::MultiCurrencyPrice;
pub use status::*;
pub use tokens::{AccessToken, RefreshToken, TokenBundle, TokenBundleError, TokenRole};
